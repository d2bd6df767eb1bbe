use crate::classifier::{Classifier, ClassifierError};
use crate::dataset::{DataSet, Example};
use crate::functions;
use crate::report;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::num::NonZeroUsize;

const MIN_RANDOM_WEIGHT: f64 = -0.1;
const MAX_RANDOM_WEIGHT: f64 = 0.1;

/// Activation used by both the hidden and the output layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Outputs in `(-1, 1)`; trained against the `±1` labels.
    Tanh,
    /// Outputs in `(0, 1)`; trained against `1` for positive labels and `0` otherwise.
    Sigmoid,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Tanh
    }
}

impl Activation {
    fn eval(self, x: f64) -> f64 {
        match self {
            Self::Tanh => x.tanh(),
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        }
    }

    /// Derivative expressed in terms of the activation's output `y`.
    fn diff(self, y: f64) -> f64 {
        match self {
            Self::Tanh => 1.0 - y * y,
            Self::Sigmoid => y * (1.0 - y),
        }
    }

    fn target(self, label: f64) -> f64 {
        match self {
            Self::Tanh => label,
            Self::Sigmoid => {
                if label > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    fn threshold(self) -> f64 {
        match self {
            Self::Tanh => 0.0,
            Self::Sigmoid => 0.5,
        }
    }
}

/// Two-layer network options.
#[derive(Debug, Clone)]
pub struct NeuralNetworkOptions {
    activation: Activation,
    eta: f64,
    iterations: usize,
    include_bias: bool,
    initial_weights: Option<(Vec<Vec<f64>>, Vec<f64>)>,
    seed: Option<u64>,
    verbose: bool,
}

impl NeuralNetworkOptions {
    /// The default value is `Activation::Tanh`.
    pub fn activation(&mut self, activation: Activation) -> &mut Self {
        self.activation = activation;
        self
    }

    /// Sets the learning rate.
    ///
    /// The default value is `0.1`.
    pub fn eta(&mut self, eta: f64) -> &mut Self {
        self.eta = eta;
        self
    }

    /// Sets the number of passes over the training data.
    ///
    /// The default value is `200`.
    pub fn iterations(&mut self, iterations: usize) -> &mut Self {
        self.iterations = iterations;
        self
    }

    /// Feeds a constant `1` into the bias weights of both layers.
    ///
    /// The default value is `true`. Without it the bias weights still exist but never contribute.
    pub fn include_bias(&mut self, include_bias: bool) -> &mut Self {
        self.include_bias = include_bias;
        self
    }

    /// Starts training from the given weights instead of random ones.
    ///
    /// `hidden[i]` holds the weights into hidden node `i`, one per feature followed by the bias
    /// weight. `output` holds one weight per hidden node followed by the bias weight.
    pub fn initial_weights(&mut self, hidden: Vec<Vec<f64>>, output: Vec<f64>) -> &mut Self {
        self.initial_weights = Some((hidden, output));
        self
    }

    /// Sets the random generator seed used for the initial weights and for shuffling.
    ///
    /// The default value is random.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Prints the summed squared error after each pass.
    pub fn verbose(&mut self) -> &mut Self {
        self.verbose = true;
        self
    }

    fn bias_input(&self) -> f64 {
        if self.include_bias {
            1.0
        } else {
            0.0
        }
    }
}

impl Default for NeuralNetworkOptions {
    fn default() -> Self {
        Self {
            activation: Activation::default(),
            eta: 0.1,
            iterations: 200,
            include_bias: true,
            initial_weights: None,
            seed: None,
            verbose: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Network {
    features: Vec<usize>,
    hidden: Vec<Vec<f64>>,
    output: Vec<f64>,
}

/// Values computed by a forward pass.
struct Forward {
    inputs: Vec<f64>,
    hidden: Vec<f64>,
    output: f64,
}

impl Network {
    /// Builds the dense input vector, with the bias input appended.
    fn inputs(&self, example: &Example, bias: f64) -> Result<Vec<f64>, ClassifierError> {
        if let Some(index) = example
            .feature_indices()
            .find(|i| self.features.binary_search(i).is_err())
        {
            return Err(ClassifierError::UnknownFeature { index });
        }

        let mut inputs = self
            .features
            .iter()
            .map(|&i| example.feature(i))
            .collect::<Vec<_>>();
        inputs.push(bias);
        Ok(inputs)
    }

    fn forward(
        &self,
        activation: Activation,
        example: &Example,
        bias: f64,
    ) -> Result<Forward, ClassifierError> {
        let inputs = self.inputs(example, bias)?;
        let mut hidden = self
            .hidden
            .iter()
            .map(|weights| activation.eval(dot(weights, &inputs)))
            .collect::<Vec<_>>();
        hidden.push(bias);
        let output = activation.eval(dot(&self.output, &hidden));
        Ok(Forward {
            inputs,
            hidden,
            output,
        })
    }

    /// One step of backpropagation on the squared error against `target`.
    fn backward(&mut self, activation: Activation, eta: f64, forward: &Forward, target: f64) {
        let output_delta = (target - forward.output) * activation.diff(forward.output);

        // Hidden deltas use the output weights from before this step.
        let hidden_deltas = self
            .output
            .iter()
            .zip(&forward.hidden)
            .map(|(v, &h)| activation.diff(h) * v * output_delta)
            .collect::<Vec<_>>();

        for (v, &h) in self.output.iter_mut().zip(&forward.hidden) {
            *v += eta * h * output_delta;
        }
        for (weights, delta) in self.hidden.iter_mut().zip(hidden_deltas) {
            for (w, &x) in weights.iter_mut().zip(&forward.inputs) {
                *w += eta * x * delta;
            }
        }
    }
}

fn dot(weights: &[f64], xs: &[f64]) -> f64 {
    weights.iter().zip(xs).map(|(w, x)| w * x).sum()
}

/// Network with one hidden layer and a single output node, trained by backpropagation.
#[derive(Debug, Clone)]
pub struct NeuralNetworkClassifier {
    hidden_nodes: NonZeroUsize,
    options: NeuralNetworkOptions,
    network: Option<Network>,
}

impl NeuralNetworkClassifier {
    pub fn new(hidden_nodes: NonZeroUsize) -> Self {
        Self {
            hidden_nodes,
            options: NeuralNetworkOptions::default(),
            network: None,
        }
    }

    pub fn options_mut(&mut self) -> &mut NeuralNetworkOptions {
        &mut self.options
    }

    pub fn hidden_nodes(&self) -> NonZeroUsize {
        self.hidden_nodes
    }

    /// Weights into each hidden node, bias weight last.
    pub fn hidden_weights(&self) -> Option<&[Vec<f64>]> {
        self.network.as_ref().map(|n| n.hidden.as_slice())
    }

    /// Weights into the output node, bias weight last.
    pub fn output_weights(&self) -> Option<&[f64]> {
        self.network.as_ref().map(|n| n.output.as_slice())
    }

    /// Raw value of the output node.
    pub fn output(&self, example: &Example) -> Result<f64, ClassifierError> {
        let network = self.network.as_ref().ok_or(ClassifierError::NotTrained)?;
        network
            .forward(self.options.activation, example, self.options.bias_input())
            .map(|forward| forward.output)
    }

    fn initial_network<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        features: Vec<usize>,
    ) -> Result<Network, ClassifierError> {
        let hidden_nodes = self.hidden_nodes.get();
        let expected = (hidden_nodes, features.len() + 1);

        if let Some((hidden, output)) = &self.options.initial_weights {
            let columns = hidden
                .iter()
                .map(|row| row.len())
                .find(|&len| len != expected.1)
                .unwrap_or(expected.1);
            let actual = (hidden.len(), columns);
            if actual != expected {
                return Err(ClassifierError::WeightShapeMismatch { expected, actual });
            }
            if output.len() != hidden_nodes + 1 {
                return Err(ClassifierError::WeightShapeMismatch {
                    expected: (1, hidden_nodes + 1),
                    actual: (1, output.len()),
                });
            }
            return Ok(Network {
                features,
                hidden: hidden.clone(),
                output: output.clone(),
            });
        }

        let mut random_weight = || rng.gen_range(MIN_RANDOM_WEIGHT, MAX_RANDOM_WEIGHT);
        let hidden = (0..hidden_nodes)
            .map(|_| (0..expected.1).map(|_| random_weight()).collect())
            .collect();
        let output = (0..=hidden_nodes).map(|_| random_weight()).collect();
        Ok(Network {
            features,
            hidden,
            output,
        })
    }
}

impl Classifier for NeuralNetworkClassifier {
    fn train(&mut self, data: &DataSet) -> Result<(), ClassifierError> {
        let mut rng = functions::rng(self.options.seed);
        let mut network = self.initial_network(&mut rng, data.feature_indices().collect())?;

        let activation = self.options.activation;
        let bias = self.options.bias_input();
        let mut examples = data.examples().iter().collect::<Vec<_>>();
        for epoch in 1..=self.options.iterations {
            examples.shuffle(&mut rng);
            let mut error = 0.0;
            for example in &examples {
                let target = activation.target(example.label());
                let forward = network.forward(activation, example, bias)?;
                error += (target - forward.output).powi(2);
                network.backward(activation, self.options.eta, &forward, target);
            }

            if self.options.verbose {
                report::epoch("two-layer nn", epoch, "ERROR", error);
            }
        }

        self.network = Some(network);
        Ok(())
    }

    fn classify(&self, example: &Example) -> Result<f64, ClassifierError> {
        let output = self.output(example)?;
        Ok(if output >= self.options.activation.threshold() {
            1.0
        } else {
            -1.0
        })
    }

    /// Distance of the output from the decision threshold.
    fn confidence(&self, example: &Example) -> Result<f64, ClassifierError> {
        let output = self.output(example)?;
        Ok((output - self.options.activation.threshold()).abs())
    }
}

impl fmt::Display for NeuralNetworkClassifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if let Some(network) = &self.network {
            writeln!(f, "hidden weights:")?;
            for weights in &network.hidden {
                fmt_weights(weights, f)?;
            }
            writeln!(f, "output weights:")?;
            fmt_weights(&network.output, f)?;
        }
        Ok(())
    }
}

fn fmt_weights(weights: &[f64], f: &mut fmt::Formatter) -> fmt::Result {
    let weights = weights
        .iter()
        .map(|w| format!("{:.6}", w))
        .collect::<Vec<_>>();
    writeln!(f, "[ {} ]", weights.join(", "))
}
