use crate::classifier::{Classifier, ClassifierError};
use crate::dataset::{DataSet, Example};
use crate::functions;
use crate::linear::LinearModel;
use crate::report;
use rand::seq::SliceRandom;
use std::fmt;

/// Perceptron training options, shared by both perceptron variants.
#[derive(Debug, Clone)]
pub struct PerceptronOptions {
    iterations: usize,
    seed: Option<u64>,
    verbose: bool,
}

impl PerceptronOptions {
    /// Makes a `PerceptronOptions` instance with the default settings.
    pub fn new() -> Self {
        Self::default()
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

    /// Prints the number of mistakes made in each pass.
    pub fn verbose(&mut self) -> &mut Self {
        self.verbose = true;
        self
    }

    fn train(
        &self,
        model_name: &str,
        data: &DataSet,
        averaged: bool,
    ) -> Result<LinearModel, ClassifierError> {
        let mut rng = functions::rng(self.seed);
        let mut examples = data.examples().iter().collect::<Vec<_>>();
        let mut model = LinearModel::zeros(data.feature_indices());

        // Running sum of every intermediate model, weighted by how many examples it survived.
        let mut sum = LinearModel::zeros(data.feature_indices());
        let mut survived = 0;
        let mut seen = 0;

        for epoch in 1..=self.iterations {
            examples.shuffle(&mut rng);
            let mut mistakes = 0;
            for example in &examples {
                let label = example.label();
                if sign(model.score(example)?) * label <= 0.0 {
                    if averaged {
                        sum.accumulate(&model, survived as f64);
                        survived = 0;
                    }
                    model.step(example, label);
                    mistakes += 1;
                }
                survived += 1;
                seen += 1;
            }

            if self.verbose {
                report::epoch(model_name, epoch, "MISTAKES", mistakes as f64);
            }
        }

        if !averaged {
            return Ok(model);
        }

        sum.accumulate(&model, survived as f64);
        if seen > 0 {
            sum.scale(1.0 / seen as f64);
        }
        Ok(sum)
    }
}

impl Default for PerceptronOptions {
    fn default() -> Self {
        Self {
            iterations: 10,
            seed: None,
            verbose: false,
        }
    }
}

/// Classic mistake-driven perceptron over `±1` labels.
#[derive(Debug, Clone, Default)]
pub struct PerceptronClassifier {
    options: PerceptronOptions,
    model: Option<LinearModel>,
}

impl PerceptronClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options_mut(&mut self) -> &mut PerceptronOptions {
        &mut self.options
    }
}

impl Classifier for PerceptronClassifier {
    fn train(&mut self, data: &DataSet) -> Result<(), ClassifierError> {
        self.model = Some(self.options.train("perceptron", data, false)?);
        Ok(())
    }

    fn classify(&self, example: &Example) -> Result<f64, ClassifierError> {
        score(&self.model, example).map(sign)
    }

    fn confidence(&self, example: &Example) -> Result<f64, ClassifierError> {
        score(&self.model, example).map(f64::abs)
    }
}

impl fmt::Display for PerceptronClassifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_model(&self.model, f)
    }
}

/// Perceptron that predicts with the average of every weight vector it went through during training.
#[derive(Debug, Clone, Default)]
pub struct AveragePerceptronClassifier {
    options: PerceptronOptions,
    model: Option<LinearModel>,
}

impl AveragePerceptronClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options_mut(&mut self) -> &mut PerceptronOptions {
        &mut self.options
    }
}

impl Classifier for AveragePerceptronClassifier {
    fn train(&mut self, data: &DataSet) -> Result<(), ClassifierError> {
        self.model = Some(self.options.train("avg perceptron", data, true)?);
        Ok(())
    }

    fn classify(&self, example: &Example) -> Result<f64, ClassifierError> {
        score(&self.model, example).map(sign)
    }

    fn confidence(&self, example: &Example) -> Result<f64, ClassifierError> {
        score(&self.model, example).map(f64::abs)
    }
}

impl fmt::Display for AveragePerceptronClassifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_model(&self.model, f)
    }
}

fn score(model: &Option<LinearModel>, example: &Example) -> Result<f64, ClassifierError> {
    model
        .as_ref()
        .ok_or(ClassifierError::NotTrained)?
        .score(example)
}

fn sign(score: f64) -> f64 {
    if score < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn fmt_model(model: &Option<LinearModel>, f: &mut fmt::Formatter) -> fmt::Result {
    if let Some(model) = model {
        for (index, weight) in &model.weights {
            write!(f, "{}:{:.6} ", index, weight)?;
        }
        write!(f, "{:.6}", model.bias)?;
    }
    Ok(())
}
