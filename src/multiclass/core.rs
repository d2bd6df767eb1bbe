use crate::classifier::{Classifier, ClassifierError, ClassifierFactory};
use crate::dataset::{DataSet, Example};
use crate::functions;
use crate::report;
use ordered_float::OrderedFloat;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::collections::BTreeMap;

pub(crate) type Member = Box<dyn Classifier + Send>;

/// Options shared by the multiclass wrappers.
#[derive(Debug, Clone, Default)]
pub struct MulticlassOptions {
    parallel: bool,
    verbose: bool,
}

impl MulticlassOptions {
    /// Makes a `MulticlassOptions` instance with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trains the binary member classifiers in parallel.
    ///
    /// This library use `rayon` for parallel execution.
    /// Please see [the rayon document](https://docs.rs/rayon) if you want to configure the behavior
    /// (e.g., the number of worker threads).
    pub fn parallel(&mut self) -> &mut Self {
        self.parallel = true;
        self
    }

    /// Prints each binary task before its member classifier is trained.
    pub fn verbose(&mut self) -> &mut Self {
        self.verbose = true;
        self
    }

    /// Trains one fresh member per `(task name, binary data set)`, keeping the task order.
    pub(crate) fn train_members<F: ClassifierFactory>(
        &self,
        model: &str,
        factory: &F,
        tasks: Vec<(String, DataSet)>,
    ) -> Result<Vec<Member>, ClassifierError> {
        let train = |(task, data): (String, DataSet)| -> Result<Member, ClassifierError> {
            if self.verbose {
                report::member(model, &task, data.len());
            }
            let mut member = factory.make();
            member.train(&data)?;
            Ok(member)
        };

        if self.parallel {
            tasks.into_par_iter().map(train).collect()
        } else {
            tasks.into_iter().map(train).collect()
        }
    }
}

/// Returns the best-scoring label and its score, the lowest label on ties.
pub(crate) fn best(
    scores: &BTreeMap<OrderedFloat<f64>, f64>,
) -> Result<(f64, f64), ClassifierError> {
    functions::argmax(scores).ok_or(ClassifierError::EmptyTrainingSet)
}

/// A member's vote: its classification weighted by its confidence.
pub(crate) fn vote(member: &Member, example: &Example) -> Result<f64, ClassifierError> {
    Ok(member.classify(example)? * member.confidence(example)?)
}
