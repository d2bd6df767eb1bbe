use crate::classifier::{Classifier, ClassifierError};
use crate::dataset::{DataSet, Example};
use crate::functions;
use crate::linear::LinearModel;
use crate::report;
use rand::seq::SliceRandom;
use std::fmt;

/// Surrogate loss minimized by [`GradientDescentClassifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    /// `exp(-y y')`
    Exponential,
    /// `max(0, 1 - y y')`
    Hinge,
    /// `(y - y')^2`
    Squared,
}

impl Default for Loss {
    fn default() -> Self {
        Self::Exponential
    }
}

impl Loss {
    pub fn value(self, label: f64, prediction: f64) -> f64 {
        match self {
            Self::Exponential => (-label * prediction).exp(),
            Self::Hinge => (1.0 - label * prediction).max(0.0),
            Self::Squared => (label - prediction).powi(2),
        }
    }

    /// Direction in which the prediction should move to reduce the loss.
    pub fn descent(self, label: f64, prediction: f64) -> f64 {
        match self {
            Self::Exponential => label * (-label * prediction).exp(),
            Self::Hinge => {
                if label * prediction < 1.0 {
                    label
                } else {
                    0.0
                }
            }
            Self::Squared => label - prediction,
        }
    }
}

/// Weight penalty added to the loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regularization {
    None,
    L1,
    L2,
    L3,
}

impl Default for Regularization {
    fn default() -> Self {
        Self::None
    }
}

impl Regularization {
    /// Derivative of the penalty at `weight`.
    pub fn gradient(self, weight: f64) -> f64 {
        match self {
            Self::None => 0.0,
            Self::L1 => {
                if weight >= 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Self::L2 => weight,
            Self::L3 => weight.powi(2),
        }
    }

    /// Penalty of a whole weight vector, before scaling by `lambda`.
    pub fn penalty(self, weights: impl Iterator<Item = f64>) -> f64 {
        match self {
            Self::None => 0.0,
            Self::L1 => weights.map(f64::abs).sum(),
            Self::L2 => weights.map(|w| w * w).sum::<f64>() / 2.0,
            Self::L3 => weights.map(|w| w.abs().powi(3)).sum::<f64>() / 3.0,
        }
    }
}

/// Gradient descent options.
#[derive(Debug, Clone)]
pub struct GradientDescentOptions {
    loss: Loss,
    regularization: Regularization,
    lambda: f64,
    eta: f64,
    iterations: usize,
    seed: Option<u64>,
    verbose: bool,
}

impl GradientDescentOptions {
    /// Makes a `GradientDescentOptions` instance with the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default value is `Loss::Exponential`.
    pub fn loss(&mut self, loss: Loss) -> &mut Self {
        self.loss = loss;
        self
    }

    /// The default value is `Regularization::None`.
    pub fn regularization(&mut self, regularization: Regularization) -> &mut Self {
        self.regularization = regularization;
        self
    }

    /// Sets the regularization strength.
    ///
    /// The default value is `0.01`.
    pub fn lambda(&mut self, lambda: f64) -> &mut Self {
        self.lambda = lambda;
        self
    }

    /// Sets the learning rate.
    ///
    /// The default value is `0.01`.
    pub fn eta(&mut self, eta: f64) -> &mut Self {
        self.eta = eta;
        self
    }

    /// Sets the number of passes over the training data.
    ///
    /// The default value is `10`.
    pub fn iterations(&mut self, iterations: usize) -> &mut Self {
        self.iterations = iterations;
        self
    }

    /// Sets the random generator seed used to shuffle the examples before each pass.
    ///
    /// The default value is random.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Prints the total loss after each pass.
    pub fn verbose(&mut self) -> &mut Self {
        self.verbose = true;
        self
    }

    fn train(&self, data: &DataSet) -> Result<LinearModel, ClassifierError> {
        let mut rng = functions::rng(self.seed);
        let mut examples = data.examples().iter().collect::<Vec<_>>();
        let mut model = LinearModel::zeros(data.feature_indices());

        for epoch in 1..=self.iterations {
            examples.shuffle(&mut rng);
            let mut loss = 0.0;
            for example in &examples {
                let label = example.label();
                let prediction = model.score(example)?;
                loss += self.loss.value(label, prediction);

                let descent = self.loss.descent(label, prediction);
                for (index, x) in example.features() {
                    if let Some(w) = model.weights.get_mut(&index) {
                        *w += self.eta * (x * descent - self.penalty_gradient(*w));
                    }
                }
                model.bias += self.eta * (descent - self.penalty_gradient(model.bias));
            }

            if self.verbose {
                let penalty = self.lambda
                    * self
                        .regularization
                        .penalty(model.weights.values().copied());
                report::epoch("gradient descent", epoch, "LOSS", loss + penalty);
            }
        }
        Ok(model)
    }

    fn penalty_gradient(&self, weight: f64) -> f64 {
        self.lambda * self.regularization.gradient(weight)
    }
}

impl Default for GradientDescentOptions {
    fn default() -> Self {
        Self {
            loss: Loss::default(),
            regularization: Regularization::default(),
            lambda: 0.01,
            eta: 0.01,
            iterations: 10,
            seed: None,
            verbose: false,
        }
    }
}

/// Linear classifier trained by stochastic gradient descent on a surrogate loss.
#[derive(Debug, Clone, Default)]
pub struct GradientDescentClassifier {
    options: GradientDescentOptions,
    model: Option<LinearModel>,
}

impl GradientDescentClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options_mut(&mut self) -> &mut GradientDescentOptions {
        &mut self.options
    }

    /// Returns `w · x + b`.
    fn score(&self, example: &Example) -> Result<f64, ClassifierError> {
        self.model
            .as_ref()
            .ok_or(ClassifierError::NotTrained)?
            .score(example)
    }
}

impl Classifier for GradientDescentClassifier {
    fn train(&mut self, data: &DataSet) -> Result<(), ClassifierError> {
        self.model = Some(self.options.train(data)?);
        Ok(())
    }

    fn classify(&self, example: &Example) -> Result<f64, ClassifierError> {
        let score = self.score(example)?;
        Ok(if score > 0.0 {
            1.0
        } else if score < 0.0 {
            -1.0
        } else {
            0.0
        })
    }

    fn confidence(&self, example: &Example) -> Result<f64, ClassifierError> {
        self.score(example).map(f64::abs)
    }
}

impl fmt::Display for GradientDescentClassifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(model) = &self.model {
            for (index, weight) in &model.weights {
                write!(f, "{}:{} ", index, weight)?;
            }
            write!(f, "b:{}", model.bias)?;
        }
        Ok(())
    }
}
