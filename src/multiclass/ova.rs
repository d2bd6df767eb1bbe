use super::core::{best, vote, Member, MulticlassOptions};
use crate::classifier::{Classifier, ClassifierError, ClassifierFactory};
use crate::dataset::{DataSet, Example};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

/// One-vs-all: one binary member per label, trained to separate that label from the rest.
pub struct OvaClassifier<F> {
    factory: F,
    options: MulticlassOptions,
    members: Option<Vec<(f64, Member)>>,
}

impl<F: ClassifierFactory> OvaClassifier<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            options: MulticlassOptions::default(),
            members: None,
        }
    }

    pub fn options_mut(&mut self) -> &mut MulticlassOptions {
        &mut self.options
    }

    /// Returns each label's member confidence, negated when the member votes against the label.
    pub fn scores(
        &self,
        example: &Example,
    ) -> Result<BTreeMap<OrderedFloat<f64>, f64>, ClassifierError> {
        let members = self.members.as_ref().ok_or(ClassifierError::NotTrained)?;
        members
            .iter()
            .map(|(label, member)| Ok((OrderedFloat(*label), vote(member, example)?)))
            .collect()
    }
}

impl<F: ClassifierFactory> Classifier for OvaClassifier<F> {
    fn train(&mut self, data: &DataSet) -> Result<(), ClassifierError> {
        let labels = data.labels();
        let tasks = labels
            .iter()
            .map(|&label| (format!("{} vs rest", label), data.one_vs_rest(label)))
            .collect();
        let members = self.options.train_members("ova", &self.factory, tasks)?;
        self.members = Some(labels.into_iter().zip(members).collect());
        Ok(())
    }

    /// Returns the label with the highest score, the lowest label on ties.
    fn classify(&self, example: &Example) -> Result<f64, ClassifierError> {
        best(&self.scores(example)?).map(|(label, _)| label)
    }

    /// Returns the score of the predicted label.
    fn confidence(&self, example: &Example) -> Result<f64, ClassifierError> {
        best(&self.scores(example)?).map(|(_, score)| score)
    }
}
