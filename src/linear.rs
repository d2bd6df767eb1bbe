use crate::classifier::ClassifierError;
use crate::dataset::Example;
use std::collections::BTreeMap;

/// Weights keyed by feature index plus a bias term.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct LinearModel {
    pub(crate) weights: BTreeMap<usize, f64>,
    pub(crate) bias: f64,
}

impl LinearModel {
    pub(crate) fn zeros(features: impl Iterator<Item = usize>) -> Self {
        Self {
            weights: features.map(|i| (i, 0.0)).collect(),
            bias: 0.0,
        }
    }

    /// Returns `w · x + b`.
    pub(crate) fn score(&self, example: &Example) -> Result<f64, ClassifierError> {
        example.features().try_fold(self.bias, |sum, (index, x)| {
            let w = self
                .weights
                .get(&index)
                .ok_or(ClassifierError::UnknownFeature { index })?;
            Ok(sum + w * x)
        })
    }

    /// Adds `scale * x` to the weights of the example's features and `scale` to the bias.
    pub(crate) fn step(&mut self, example: &Example, scale: f64) {
        for (index, x) in example.features() {
            if let Some(w) = self.weights.get_mut(&index) {
                *w += scale * x;
            }
        }
        self.bias += scale;
    }

    /// Adds `factor * other` to this model.
    pub(crate) fn accumulate(&mut self, other: &Self, factor: f64) {
        for (w, v) in self.weights.values_mut().zip(other.weights.values()) {
            *w += factor * v;
        }
        self.bias += factor * other.bias;
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        for w in self.weights.values_mut() {
            *w *= factor;
        }
        self.bias *= factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_and_step() -> Result<(), anyhow::Error> {
        let mut model = LinearModel::zeros(0..3);
        let example = Example::new(1.0).with_feature(0, 2.0).with_feature(2, -1.0);

        model.step(&example, 0.5);
        assert_eq!(model.weights.values().copied().collect::<Vec<_>>(), vec![1.0, 0.0, -0.5]);
        assert_eq!(model.bias, 0.5);
        assert_eq!(model.score(&example)?, 0.5 + 2.0 + 0.5);

        let unknown = Example::new(1.0).with_feature(7, 1.0);
        assert_eq!(
            model.score(&unknown),
            Err(ClassifierError::UnknownFeature { index: 7 })
        );
        Ok(())
    }

    #[test]
    fn accumulate_then_scale_averages() {
        let mut a = LinearModel::zeros(0..2);
        a.weights.insert(0, 2.0);
        a.bias = 1.0;
        let mut b = LinearModel::zeros(0..2);
        b.weights.insert(1, 4.0);
        b.bias = 3.0;

        let mut sum = LinearModel::zeros(0..2);
        sum.accumulate(&a, 1.0);
        sum.accumulate(&b, 1.0);
        sum.scale(0.5);
        assert_eq!(sum.weights.values().copied().collect::<Vec<_>>(), vec![1.0, 2.0]);
        assert_eq!(sum.bias, 2.0);
    }
}
