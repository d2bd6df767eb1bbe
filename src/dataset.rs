use crate::functions;
use std::collections::BTreeMap;
use thiserror::Error;

/// A labeled feature vector.
///
/// Features are sparse: an index that was never set is absent, and
/// [`Example::feature`] reads it as `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    label: f64,
    features: BTreeMap<usize, f64>,
}

impl Example {
    /// Makes an example with the given label and no features.
    pub fn new(label: f64) -> Self {
        Self {
            label,
            features: BTreeMap::new(),
        }
    }

    /// Makes an example whose `i`-th feature is `features[i]`.
    pub fn from_dense(label: f64, features: &[f64]) -> Self {
        Self {
            label,
            features: features.iter().copied().enumerate().collect(),
        }
    }

    /// Sets the feature at `index`, replacing any previous value.
    pub fn with_feature(mut self, index: usize, value: f64) -> Self {
        self.features.insert(index, value);
        self
    }

    pub fn label(&self) -> f64 {
        self.label
    }

    /// Returns the value at `index`, or `0.0` if the feature is absent.
    pub fn feature(&self, index: usize) -> f64 {
        self.get(index).unwrap_or(0.0)
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.features.get(&index).copied()
    }

    /// Iterates over the indices of the present features in ascending order.
    pub fn feature_indices<'a>(&'a self) -> impl 'a + Iterator<Item = usize> {
        self.features.keys().copied()
    }

    /// Iterates over `(index, value)` pairs of the present features in ascending index order.
    pub fn features<'a>(&'a self) -> impl 'a + Iterator<Item = (usize, f64)> {
        self.features.iter().map(|(&i, &x)| (i, x))
    }

    /// Returns `true` if both examples have the same value for every feature either of them has.
    pub fn equal_features(&self, other: &Self) -> bool {
        self.feature_indices()
            .chain(other.feature_indices())
            .all(|i| self.feature(i) == other.feature(i))
    }

    pub(crate) fn relabeled(&self, label: f64) -> Self {
        Self {
            label,
            features: self.features.clone(),
        }
    }

    pub(crate) fn map_features<F>(&self, f: F) -> Self
    where
        F: Fn(usize, f64) -> f64,
    {
        Self {
            label: self.label,
            features: self.features().map(|(i, x)| (i, f(i, x))).collect(),
        }
    }

    pub(crate) fn with_dense_features<I>(&self, features: I) -> Self
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        Self {
            label: self.label,
            features: features.into_iter().collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct DataSetBuilder {
    feature_names: BTreeMap<usize, String>,
    examples: Vec<Example>,
}

impl DataSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names features `0..names.len()`.
    pub fn set_feature_names(&mut self, names: &[&str]) -> Result<(), DataSetError> {
        if let Some(index) = self
            .examples
            .iter()
            .flat_map(|e| e.feature_indices())
            .find(|&i| i >= names.len())
        {
            return Err(DataSetError::UnknownFeature { index });
        }

        self.feature_names = names
            .iter()
            .enumerate()
            .map(|(i, name)| (i, (*name).to_owned()))
            .collect();
        Ok(())
    }

    pub fn add_feature(&mut self, index: usize, name: &str) {
        self.feature_names.insert(index, name.to_owned());
    }

    /// Adds a dense row.
    ///
    /// If no feature has been named yet, the features are named `f0`, `f1`, ... after this row.
    pub fn add_row(&mut self, features: &[f64], label: f64) -> Result<(), DataSetError> {
        if self.feature_names.is_empty() {
            self.feature_names = (0..features.len()).map(|i| (i, format!("f{}", i))).collect();
        }

        if self.feature_names.len() != features.len() {
            return Err(DataSetError::ColumnSizeMismatch);
        }

        self.add_example(Example::from_dense(label, features))
    }

    pub fn add_example(&mut self, example: Example) -> Result<(), DataSetError> {
        if !example.label().is_finite() {
            return Err(DataSetError::NonFiniteLabel);
        }

        for (index, value) in example.features() {
            if !self.feature_names.contains_key(&index) {
                return Err(DataSetError::UnknownFeature { index });
            }
            if !value.is_finite() {
                return Err(DataSetError::NonFiniteFeature { index });
            }
        }

        self.examples.push(example);
        Ok(())
    }

    pub fn build(&self) -> DataSet {
        DataSet {
            examples: self.examples.clone(),
            feature_names: self.feature_names.clone(),
        }
    }
}

/// An ordered collection of examples plus the names of their features.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    examples: Vec<Example>,
    feature_names: BTreeMap<usize, String>,
}

impl DataSet {
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn feature_names(&self) -> &BTreeMap<usize, String> {
        &self.feature_names
    }

    /// Iterates over every feature index known to this data set in ascending order.
    pub fn feature_indices<'a>(&'a self) -> impl 'a + Iterator<Item = usize> + Clone {
        self.feature_names.keys().copied()
    }

    pub fn features_len(&self) -> usize {
        self.feature_names.len()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Returns the distinct labels in ascending order.
    pub fn labels(&self) -> Vec<f64> {
        functions::histogram(self.examples.iter().map(|e| e.label()))
            .into_iter()
            .map(|(label, _)| label.0)
            .collect()
    }

    /// Copies this data set, relabeling `positive` examples as `1.0` and everything else as `-1.0`.
    pub fn one_vs_rest(&self, positive: f64) -> Self {
        let examples = self
            .examples
            .iter()
            .map(|e| e.relabeled(if e.label() == positive { 1.0 } else { -1.0 }))
            .collect();
        self.with_examples(examples)
    }

    /// Keeps only the `positive` and `negative` examples, relabeled as `1.0` and `-1.0`.
    pub fn one_vs_one(&self, positive: f64, negative: f64) -> Self {
        let examples = self
            .examples
            .iter()
            .filter_map(|e| {
                if e.label() == positive {
                    Some(e.relabeled(1.0))
                } else if e.label() == negative {
                    Some(e.relabeled(-1.0))
                } else {
                    None
                }
            })
            .collect();
        self.with_examples(examples)
    }

    pub(crate) fn with_examples(&self, examples: Vec<Example>) -> Self {
        Self {
            examples,
            feature_names: self.feature_names.clone(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DataSetError {
    #[error("some of rows have a different column count from the named features")]
    ColumnSizeMismatch,

    #[error("label is not a finite number")]
    NonFiniteLabel,

    #[error("feature {index} is not a finite number")]
    NonFiniteFeature { index: usize },

    #[error("feature {index} has no name in the data set")]
    UnknownFeature { index: usize },
}
