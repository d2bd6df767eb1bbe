//! Classic binary and multiclass classifiers over sparse, labeled feature vectors.
pub use self::classifier::{Classifier, ClassifierError, ClassifierFactory, ClassifierKind};
pub use self::criterion::Criterion;
pub use self::dataset::{DataSet, DataSetBuilder, DataSetError, Example};
pub use self::decision_tree::{
    Children, DecisionTreeClassifier, DecisionTreeOptions, Node, DEFAULT_LABEL, LEFT_BRANCH,
    RIGHT_BRANCH,
};
pub use self::gradient_descent::{
    GradientDescentClassifier, GradientDescentOptions, Loss, Regularization,
};
pub use self::knn::KnnClassifier;
pub use self::multiclass::{AvaClassifier, MulticlassOptions, OvaClassifier};
pub use self::naive_bayes::{NaiveBayesClassifier, NaiveBayesOptions};
pub use self::neural_network::{Activation, NeuralNetworkClassifier, NeuralNetworkOptions};
pub use self::perceptron::{AveragePerceptronClassifier, PerceptronClassifier, PerceptronOptions};
pub use self::preprocess::{DataPreprocessor, ExampleNormalizer, FeatureNormalizer};

mod classifier;
mod criterion;
mod dataset;
mod decision_tree;
mod functions;
mod gradient_descent;
mod knn;
mod linear;
mod multiclass;
mod naive_bayes;
mod neural_network;
mod perceptron;
mod preprocess;
mod report;
