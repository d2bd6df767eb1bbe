use super::core::{best, vote, Member, MulticlassOptions};
use crate::classifier::{Classifier, ClassifierError, ClassifierFactory};
use crate::dataset::{DataSet, Example};
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Pair {
    positive: f64,
    negative: f64,
}

/// All-vs-all: one binary member per pair of labels.
pub struct AvaClassifier<F> {
    factory: F,
    options: MulticlassOptions,
    labels: Vec<f64>,
    members: Option<Vec<(Pair, Member)>>,
}

impl<F: ClassifierFactory> AvaClassifier<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            options: MulticlassOptions::default(),
            labels: Vec::new(),
            members: None,
        }
    }

    pub fn options_mut(&mut self) -> &mut MulticlassOptions {
        &mut self.options
    }

    /// Returns each label's total vote.
    ///
    /// The member for labels `i < j` adds its classification times its confidence to `i`
    /// and subtracts the same amount from `j`.
    pub fn scores(
        &self,
        example: &Example,
    ) -> Result<BTreeMap<OrderedFloat<f64>, f64>, ClassifierError> {
        let members = self.members.as_ref().ok_or(ClassifierError::NotTrained)?;
        let mut scores = self
            .labels
            .iter()
            .map(|&label| (OrderedFloat(label), 0.0))
            .collect::<BTreeMap<_, _>>();
        for (pair, member) in members {
            let weight = vote(member, example)?;
            *scores.entry(OrderedFloat(pair.positive)).or_default() += weight;
            *scores.entry(OrderedFloat(pair.negative)).or_default() -= weight;
        }
        Ok(scores)
    }
}

impl<F: ClassifierFactory> Classifier for AvaClassifier<F> {
    fn train(&mut self, data: &DataSet) -> Result<(), ClassifierError> {
        let labels = data.labels();
        let mut pairs = Vec::new();
        for (i, &positive) in labels.iter().enumerate() {
            for &negative in &labels[i + 1..] {
                pairs.push(Pair { positive, negative });
            }
        }

        let tasks = pairs
            .iter()
            .map(|pair| {
                let task = format!("{} vs {}", pair.positive, pair.negative);
                (task, data.one_vs_one(pair.positive, pair.negative))
            })
            .collect();
        let members = self.options.train_members("ava", &self.factory, tasks)?;

        self.members = Some(pairs.into_iter().zip(members).collect());
        self.labels = labels;
        Ok(())
    }

    /// Returns the label with the highest total vote, the lowest label on ties.
    fn classify(&self, example: &Example) -> Result<f64, ClassifierError> {
        best(&self.scores(example)?).map(|(label, _)| label)
    }

    /// Returns the total vote of the predicted label.
    fn confidence(&self, example: &Example) -> Result<f64, ClassifierError> {
        best(&self.scores(example)?).map(|(_, score)| score)
    }
}
