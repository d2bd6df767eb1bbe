use crate::classifier::{Classifier, ClassifierError};
use crate::dataset::{DataSet, Example};
use crate::functions::{self, Histogram};
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, BTreeSet};

/// Naive Bayes options.
#[derive(Debug, Clone)]
pub struct NaiveBayesOptions {
    lambda: f64,
    positive_features_only: bool,
}

impl NaiveBayesOptions {
    /// Sets the smoothing added to every feature count.
    ///
    /// The default value is `0.01`.
    pub fn lambda(&mut self, lambda: f64) -> &mut Self {
        self.lambda = lambda;
        self
    }

    /// Scores only the features present in an example instead of every known feature.
    pub fn positive_features_only(&mut self) -> &mut Self {
        self.positive_features_only = true;
        self
    }
}

impl Default for NaiveBayesOptions {
    fn default() -> Self {
        Self {
            lambda: 0.01,
            positive_features_only: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Counts {
    examples: usize,
    labels: Histogram,
    features: BTreeSet<usize>,
    // label -> feature index -> number of examples with that label where the feature is present.
    present: BTreeMap<OrderedFloat<f64>, BTreeMap<usize, usize>>,
}

/// Bernoulli naive Bayes over feature presence (a feature is present when it is non-zero).
#[derive(Debug, Clone, Default)]
pub struct NaiveBayesClassifier {
    options: NaiveBayesOptions,
    counts: Option<Counts>,
}

impl NaiveBayesClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options_mut(&mut self) -> &mut NaiveBayesOptions {
        &mut self.options
    }

    /// Returns the smoothed `p(feature present | label)`.
    pub fn feature_probability(&self, index: usize, label: f64) -> Result<f64, ClassifierError> {
        let counts = self.counts()?;
        if !counts.features.contains(&index) {
            return Err(ClassifierError::UnknownFeature { index });
        }
        Ok(self.smoothed(counts, index, label))
    }

    /// Returns `log10(p(label) * p(example | label))`.
    pub fn log_probability(&self, example: &Example, label: f64) -> Result<f64, ClassifierError> {
        let counts = self.counts()?;
        if counts.examples == 0 {
            return Err(ClassifierError::EmptyTrainingSet);
        }
        if let Some(index) = example
            .feature_indices()
            .find(|i| !counts.features.contains(i))
        {
            return Err(ClassifierError::UnknownFeature { index });
        }

        let label_count = counts.labels.get(&OrderedFloat(label)).copied().unwrap_or(0);
        let mut log_probability = (label_count as f64 / counts.examples as f64).log10();

        if self.options.positive_features_only {
            for (index, _) in example.features().filter(|&(_, x)| x != 0.0) {
                log_probability += self.smoothed(counts, index, label).log10();
            }
        } else {
            for &index in &counts.features {
                let p = self.smoothed(counts, index, label);
                log_probability += if example.feature(index) != 0.0 {
                    p.log10()
                } else {
                    (1.0 - p).log10()
                };
            }
        }
        Ok(log_probability)
    }

    fn counts(&self) -> Result<&Counts, ClassifierError> {
        self.counts.as_ref().ok_or(ClassifierError::NotTrained)
    }

    fn smoothed(&self, counts: &Counts, index: usize, label: f64) -> f64 {
        let label = OrderedFloat(label);
        let label_count = counts.labels.get(&label).copied().unwrap_or(0);
        let present = counts
            .present
            .get(&label)
            .and_then(|features| features.get(&index))
            .copied()
            .unwrap_or(0);
        let lambda = self.options.lambda;
        (present as f64 + lambda) / (label_count as f64 + 2.0 * lambda)
    }

    fn predict(&self, example: &Example) -> Result<(f64, f64), ClassifierError> {
        let counts = self.counts()?;
        let mut scores = BTreeMap::new();
        for label in counts.labels.keys() {
            scores.insert(*label, self.log_probability(example, label.0)?);
        }
        functions::argmax(&scores).ok_or(ClassifierError::EmptyTrainingSet)
    }
}

impl Classifier for NaiveBayesClassifier {
    fn train(&mut self, data: &DataSet) -> Result<(), ClassifierError> {
        let mut present: BTreeMap<_, BTreeMap<_, _>> = BTreeMap::new();
        for example in data.examples() {
            let features = present.entry(OrderedFloat(example.label())).or_default();
            for (index, _) in example.features().filter(|&(_, x)| x != 0.0) {
                *features.entry(index).or_default() += 1;
            }
        }

        self.counts = Some(Counts {
            examples: data.len(),
            labels: functions::histogram(data.examples().iter().map(|e| e.label())),
            features: data.feature_indices().collect(),
            present,
        });
        Ok(())
    }

    /// Returns the label with the highest log probability, the lowest label on ties.
    fn classify(&self, example: &Example) -> Result<f64, ClassifierError> {
        self.predict(example).map(|(label, _)| label)
    }

    /// Returns the log probability of the predicted label.
    fn confidence(&self, example: &Example) -> Result<f64, ClassifierError> {
        self.predict(example).map(|(_, log_probability)| log_probability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataSetBuilder;

    fn data() -> Result<DataSet, anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.add_row(&[1.0, 0.0], 1.0)?;
        builder.add_row(&[1.0, 1.0], 1.0)?;
        builder.add_row(&[0.0, 1.0], -1.0)?;
        Ok(builder.build())
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-12, "{} != {}", actual, expected);
    }

    #[test]
    fn smoothed_feature_probabilities() -> Result<(), anyhow::Error> {
        let mut classifier = NaiveBayesClassifier::new();
        classifier.options_mut().lambda(1.0);
        classifier.train(&data()?)?;

        assert_eq!(classifier.feature_probability(0, 1.0)?, 0.75);
        assert_eq!(classifier.feature_probability(1, 1.0)?, 0.5);
        assert_close(classifier.feature_probability(0, -1.0)?, 1.0 / 3.0);
        assert_eq!(
            classifier.feature_probability(2, 1.0),
            Err(ClassifierError::UnknownFeature { index: 2 })
        );
        Ok(())
    }

    #[test]
    fn all_features_mode_counts_absences() -> Result<(), anyhow::Error> {
        let mut classifier = NaiveBayesClassifier::new();
        classifier.options_mut().lambda(1.0);
        classifier.train(&data()?)?;

        let example = Example::from_dense(0.0, &[0.0, 1.0]);
        assert_close(classifier.log_probability(&example, 1.0)?, (1.0f64 / 12.0).log10());
        assert_close(classifier.log_probability(&example, -1.0)?, (4.0f64 / 27.0).log10());
        assert_eq!(classifier.classify(&example)?, -1.0);
        assert_close(classifier.confidence(&example)?, (4.0f64 / 27.0).log10());
        Ok(())
    }

    #[test]
    fn positive_features_mode_ignores_absences() -> Result<(), anyhow::Error> {
        let mut classifier = NaiveBayesClassifier::new();
        classifier.options_mut().lambda(1.0).positive_features_only();
        classifier.train(&data()?)?;

        let example = Example::from_dense(0.0, &[0.0, 1.0]);
        assert_close(classifier.log_probability(&example, 1.0)?, (1.0f64 / 3.0).log10());
        assert_close(classifier.log_probability(&example, -1.0)?, (2.0f64 / 9.0).log10());
        assert_eq!(classifier.classify(&example)?, 1.0);
        Ok(())
    }

    #[test]
    fn untrained_and_empty() -> Result<(), anyhow::Error> {
        let mut classifier = NaiveBayesClassifier::new();
        let example = Example::new(0.0);
        assert_eq!(classifier.classify(&example), Err(ClassifierError::NotTrained));

        classifier.train(&DataSet::default())?;
        assert_eq!(
            classifier.log_probability(&example, 1.0),
            Err(ClassifierError::EmptyTrainingSet)
        );
        assert_eq!(
            classifier.classify(&example),
            Err(ClassifierError::EmptyTrainingSet)
        );
        Ok(())
    }
}
