use crate::dataset::{DataSet, Example};
use crate::functions;
use std::collections::BTreeMap;

/// Transforms data sets before training and testing.
///
/// Statistics are learned from the training set only and then applied unchanged to test sets.
pub trait DataPreprocessor {
    fn preprocess_train(&mut self, data: &DataSet) -> DataSet;

    fn preprocess_test(&self, data: &DataSet) -> DataSet;
}

/// Scales every example to unit Euclidean length.
#[derive(Debug, Clone, Default)]
pub struct ExampleNormalizer;

impl ExampleNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(example: &Example) -> Example {
        let length = example.features().map(|(_, x)| x * x).sum::<f64>().sqrt();
        if length == 0.0 {
            return example.clone();
        }
        example.map_features(|_, x| x / length)
    }

    fn apply(data: &DataSet) -> DataSet {
        data.with_examples(data.examples().iter().map(Self::normalize).collect())
    }
}

impl DataPreprocessor for ExampleNormalizer {
    fn preprocess_train(&mut self, data: &DataSet) -> DataSet {
        Self::apply(data)
    }

    fn preprocess_test(&self, data: &DataSet) -> DataSet {
        Self::apply(data)
    }
}

/// Centers every feature on its training mean and scales it by its training standard deviation.
#[derive(Debug, Clone, Default)]
pub struct FeatureNormalizer {
    // feature index -> (mean, standard deviation)
    stats: BTreeMap<usize, (f64, f64)>,
}

impl FeatureNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mean(&self, index: usize) -> Option<f64> {
        self.stats.get(&index).map(|&(mean, _)| mean)
    }

    pub fn standard_deviation(&self, index: usize) -> Option<f64> {
        self.stats.get(&index).map(|&(_, std)| std)
    }

    fn normalize(&self, example: &Example) -> Example {
        let mut features = example.features().collect::<BTreeMap<_, _>>();
        for (&index, &(mean, std)) in &self.stats {
            let centered = example.feature(index) - mean;
            let value = if std == 0.0 { centered } else { centered / std };
            features.insert(index, value);
        }
        example.with_dense_features(features)
    }

    fn apply(&self, data: &DataSet) -> DataSet {
        let examples = data
            .examples()
            .iter()
            .map(|example| self.normalize(example))
            .collect();
        data.with_examples(examples)
    }
}

impl DataPreprocessor for FeatureNormalizer {
    fn preprocess_train(&mut self, data: &DataSet) -> DataSet {
        self.stats.clear();
        if !data.is_empty() {
            for index in data.feature_indices() {
                let values = data
                    .examples()
                    .iter()
                    .map(|e| e.feature(index))
                    .collect::<Vec<_>>();
                let mean = functions::mean(values.iter().copied());
                let variance = functions::mean(values.iter().map(|x| (x - mean).powi(2)));
                self.stats.insert(index, (mean, variance.sqrt()));
            }
        }
        self.apply(data)
    }

    /// Features the training set did not have are left unchanged.
    fn preprocess_test(&self, data: &DataSet) -> DataSet {
        self.apply(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataSetBuilder;

    fn features(data: &DataSet) -> Vec<Vec<f64>> {
        data.examples()
            .iter()
            .map(|e| e.features().map(|(_, x)| x).collect())
            .collect()
    }

    #[test]
    fn example_normalizer_scales_to_unit_length() -> Result<(), anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.add_row(&[3.0, 4.0], 1.0)?;
        builder.add_row(&[0.0, 0.0], -1.0)?;
        let data = builder.build();

        let mut normalizer = ExampleNormalizer::new();
        let train = normalizer.preprocess_train(&data);
        assert_eq!(features(&train), vec![vec![0.6, 0.8], vec![0.0, 0.0]]);
        assert_eq!(train.examples()[0].label(), 1.0);

        // The input is not modified.
        assert_eq!(features(&data)[0], vec![3.0, 4.0]);
        assert_eq!(features(&normalizer.preprocess_test(&data)), features(&train));
        Ok(())
    }

    #[test]
    fn feature_normalizer_uses_training_statistics() -> Result<(), anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.add_row(&[1.0, 5.0], 1.0)?;
        builder.add_row(&[3.0, 5.0], -1.0)?;
        let train = builder.build();

        let mut normalizer = FeatureNormalizer::new();
        let normalized = normalizer.preprocess_train(&train);
        assert_eq!(normalizer.mean(0), Some(2.0));
        assert_eq!(normalizer.standard_deviation(0), Some(1.0));
        assert_eq!(normalizer.standard_deviation(1), Some(0.0));
        assert_eq!(features(&normalized), vec![vec![-1.0, 0.0], vec![1.0, 0.0]]);

        let mut builder = DataSetBuilder::new();
        builder.add_row(&[4.0, 7.0], 1.0)?;
        let test = normalizer.preprocess_test(&builder.build());
        assert_eq!(features(&test), vec![vec![2.0, 2.0]]);
        Ok(())
    }

    #[test]
    fn absent_features_are_centered_too() -> Result<(), anyhow::Error> {
        let mut builder = DataSetBuilder::new();
        builder.set_feature_names(&["a"])?;
        builder.add_example(Example::new(1.0).with_feature(0, 2.0))?;
        builder.add_example(Example::new(1.0))?;
        let data = builder.build();

        let mut normalizer = FeatureNormalizer::new();
        let normalized = normalizer.preprocess_train(&data);
        assert_eq!(normalized.examples()[1].get(0), Some(-1.0));
        Ok(())
    }

    #[test]
    fn empty_training_set_learns_nothing() {
        let mut normalizer = FeatureNormalizer::new();
        let normalized = normalizer.preprocess_train(&DataSet::default());
        assert!(normalized.is_empty());
        assert_eq!(normalizer.mean(0), None);
    }
}
