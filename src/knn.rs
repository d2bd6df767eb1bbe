use crate::classifier::{Classifier, ClassifierError};
use crate::dataset::{DataSet, Example};
use crate::functions;
use std::cmp::Ordering;
use std::num::NonZeroUsize;

/// k-nearest neighbours by Euclidean distance.
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    k: NonZeroUsize,
    examples: Option<Vec<Example>>,
}

impl KnnClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of neighbours that vote.
    ///
    /// The default value is `3`.
    pub fn set_k(&mut self, k: NonZeroUsize) -> &mut Self {
        self.k = k;
        self
    }

    pub fn k(&self) -> NonZeroUsize {
        self.k
    }

    /// Returns the labels of the (at most) `k` closest training examples, nearest first.
    ///
    /// Examples at equal distance keep their training order.
    pub fn neighbours(&self, example: &Example) -> Result<Vec<f64>, ClassifierError> {
        let examples = self.examples.as_ref().ok_or(ClassifierError::NotTrained)?;
        if examples.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }

        let mut distances = examples
            .iter()
            .map(|e| (distance(e, example), e.label()))
            .collect::<Vec<_>>();
        distances.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        Ok(distances
            .into_iter()
            .take(self.k.get())
            .map(|(_, label)| label)
            .collect())
    }

    fn vote(&self, example: &Example) -> Result<(f64, f64), ClassifierError> {
        let neighbours = self.neighbours(example)?;
        let (label, count) = functions::most_frequent(neighbours.iter().copied())
            .ok_or(ClassifierError::EmptyTrainingSet)?;
        Ok((label, count as f64 / neighbours.len() as f64))
    }
}

impl Default for KnnClassifier {
    fn default() -> Self {
        Self {
            k: NonZeroUsize::new(3).expect("unreachable"),
            examples: None,
        }
    }
}

impl Classifier for KnnClassifier {
    fn train(&mut self, data: &DataSet) -> Result<(), ClassifierError> {
        self.examples = Some(data.examples().to_vec());
        Ok(())
    }

    fn classify(&self, example: &Example) -> Result<f64, ClassifierError> {
        self.vote(example).map(|(label, _)| label)
    }

    /// Fraction of the neighbours that voted for the predicted label.
    fn confidence(&self, example: &Example) -> Result<f64, ClassifierError> {
        self.vote(example).map(|(_, fraction)| fraction)
    }
}

/// Euclidean distance over the union of both examples' features.
pub fn distance(a: &Example, b: &Example) -> f64 {
    let mut indices = a
        .feature_indices()
        .chain(b.feature_indices())
        .collect::<Vec<_>>();
    indices.sort_unstable();
    indices.dedup();
    indices
        .into_iter()
        .map(|i| (a.feature(i) - b.feature(i)).powi(2))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataSetBuilder;

    fn line() -> Result<DataSet, anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        let rows = [(0.0, 1.0), (1.0, 1.0), (2.0, 2.0), (5.0, 2.0), (6.0, 2.0), (7.0, 3.0)];
        for &(x, y) in &rows {
            builder.add_row(&[x], y)?;
        }
        Ok(builder.build())
    }

    #[test]
    fn majority_of_nearest() -> Result<(), anyhow::Error> {
        let mut classifier = KnnClassifier::new();
        classifier.train(&line()?)?;

        let near_start = Example::from_dense(0.0, &[0.5]);
        assert_eq!(classifier.neighbours(&near_start)?, vec![1.0, 1.0, 2.0]);
        assert_eq!(classifier.classify(&near_start)?, 1.0);
        assert!((classifier.confidence(&near_start)? - 2.0 / 3.0).abs() < 1e-12);

        let near_end = Example::from_dense(0.0, &[6.0]);
        assert_eq!(classifier.classify(&near_end)?, 2.0);
        Ok(())
    }

    #[test]
    fn ties_go_to_lowest_label() -> Result<(), anyhow::Error> {
        let mut classifier = KnnClassifier::new();
        classifier.set_k(NonZeroUsize::new(2).expect("unreachable"));
        classifier.train(&line()?)?;

        // x = 2 and x = 5 are both 1.5 away.
        let between = Example::from_dense(0.0, &[3.5]);
        assert_eq!(classifier.neighbours(&between)?, vec![2.0, 2.0]);

        let example = Example::from_dense(0.0, &[1.5]);
        assert_eq!(classifier.neighbours(&example)?, vec![1.0, 2.0]);
        assert_eq!(classifier.classify(&example)?, 1.0);
        assert_eq!(classifier.confidence(&example)?, 0.5);
        Ok(())
    }

    #[test]
    fn k_larger_than_training_set() -> Result<(), anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.add_row(&[0.0], 4.0)?;
        let mut classifier = KnnClassifier::new();
        classifier.train(&builder.build())?;

        let example = Example::from_dense(0.0, &[9.0]);
        assert_eq!(classifier.classify(&example)?, 4.0);
        assert_eq!(classifier.confidence(&example)?, 1.0);
        Ok(())
    }

    #[test]
    fn untrained_and_empty() -> Result<(), anyhow::Error> {
        let mut classifier = KnnClassifier::new();
        let example = Example::new(0.0);
        assert_eq!(classifier.classify(&example), Err(ClassifierError::NotTrained));

        classifier.train(&DataSet::default())?;
        assert_eq!(
            classifier.confidence(&example),
            Err(ClassifierError::EmptyTrainingSet)
        );
        Ok(())
    }

    #[test]
    fn distance_uses_union_of_features() {
        let a = Example::new(0.0).with_feature(0, 3.0);
        let b = Example::new(0.0).with_feature(1, 4.0);
        assert_eq!(distance(&a, &b), 5.0);
        assert_eq!(distance(&a, &a), 0.0);
    }
}
