use crate::functions::{self, Histogram};

/// How candidate splits are scored; the lowest score wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Fraction of examples misclassified when each branch predicts its majority label.
    TrainingError,
    /// Gini impurity of the branches, weighted by branch size.
    Gini,
    /// Entropy of the branches, weighted by branch size.
    Entropy,
}

impl Default for Criterion {
    fn default() -> Self {
        Self::TrainingError
    }
}

impl Criterion {
    pub(crate) fn score(self, left: &Histogram, right: &Histogram) -> f64 {
        let n_left = total(left);
        let n_right = total(right);
        let n = (n_left + n_right) as f64;
        if n == 0.0 {
            return 0.0;
        }

        match self {
            Self::TrainingError => {
                let correct = majority_count(left) + majority_count(right);
                1.0 - correct as f64 / n
            }
            Self::Gini => (n_left as f64 * gini(left) + n_right as f64 * gini(right)) / n,
            Self::Entropy => {
                (n_left as f64 * entropy(left) + n_right as f64 * entropy(right)) / n
            }
        }
    }
}

fn total(histogram: &Histogram) -> usize {
    histogram.values().sum()
}

fn majority_count(histogram: &Histogram) -> usize {
    functions::max_count(histogram).map_or(0, |(_, count)| count)
}

fn gini(histogram: &Histogram) -> f64 {
    let n = total(histogram);
    if n == 0 {
        return 0.0;
    }
    1.0 - histogram
        .values()
        .map(|&count| (count as f64 / n as f64).powi(2))
        .sum::<f64>()
}

fn entropy(histogram: &Histogram) -> f64 {
    let n = total(histogram);
    if n == 0 {
        return 0.0;
    }
    histogram
        .values()
        .map(|&count| {
            let p = count as f64 / n as f64;
            -p * p.log2()
        })
        .sum()
}
