use crate::dataset::{DataSet, Example};
use crate::decision_tree::DecisionTreeClassifier;
use crate::gradient_descent::{GradientDescentClassifier, Loss, Regularization};
use crate::perceptron::{AveragePerceptronClassifier, PerceptronClassifier};
use thiserror::Error;

/// A model that learns from a labeled data set and predicts labels for new examples.
pub trait Classifier {
    /// Trains this classifier, discarding anything learned before.
    fn train(&mut self, data: &DataSet) -> Result<(), ClassifierError>;

    /// Predicts the label of `example`.
    fn classify(&self, example: &Example) -> Result<f64, ClassifierError>;

    /// Returns how sure the classifier is about `classify(example)`; larger means surer.
    fn confidence(&self, example: &Example) -> Result<f64, ClassifierError>;
}

/// Makes fresh, untrained classifiers for the multiclass wrappers.
pub trait ClassifierFactory: Sync {
    fn make(&self) -> Box<dyn Classifier + Send>;
}

/// Binary classifiers that can be built from a handful of hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClassifierKind {
    /// A decision tree; a negative limit grows the full tree.
    DecisionTree { depth_limit: i64 },
    Perceptron { iterations: usize },
    AveragePerceptron { iterations: usize },
    GradientDescent {
        loss: Loss,
        regularization: Regularization,
        iterations: usize,
    },
}

impl ClassifierFactory for ClassifierKind {
    fn make(&self) -> Box<dyn Classifier + Send> {
        match *self {
            Self::DecisionTree { depth_limit } => {
                let mut classifier = DecisionTreeClassifier::new();
                classifier.set_depth_limit(depth_limit);
                Box::new(classifier)
            }
            Self::Perceptron { iterations } => {
                let mut classifier = PerceptronClassifier::new();
                classifier.options_mut().iterations(iterations);
                Box::new(classifier)
            }
            Self::AveragePerceptron { iterations } => {
                let mut classifier = AveragePerceptronClassifier::new();
                classifier.options_mut().iterations(iterations);
                Box::new(classifier)
            }
            Self::GradientDescent {
                loss,
                regularization,
                iterations,
            } => {
                let mut classifier = GradientDescentClassifier::new();
                classifier
                    .options_mut()
                    .loss(loss)
                    .regularization(regularization)
                    .iterations(iterations);
                Box::new(classifier)
            }
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("feature {index} has value {value}, but only the left (0) and right (1) branch values are allowed")]
    InvalidFeatureValue { index: usize, value: f64 },

    #[error("feature {index} was not seen during training")]
    UnknownFeature { index: usize },

    #[error("classifier has not been trained")]
    NotTrained,

    #[error("classifier was trained on an empty data set")]
    EmptyTrainingSet,

    #[error("expected weights of shape {expected:?}, got {actual:?}")]
    WeightShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}
