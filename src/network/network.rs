use log::debug;
use rand::Rng;

use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::layers::dense::Layer;
use crate::loss::mse::MseLoss;
use crate::math::matrix::Matrix;
use crate::network::config::NetworkConfig;
use crate::network::pass::{ForwardPass, Gradients};
use crate::network::snapshot::{validate_topology, ModelSnapshot};
use crate::train::epoch_stats::TrainReport;
use crate::train::loop_fn::train_loop;
use crate::train::train_config::TrainConfig;

/// Fully connected feedforward network trained with backpropagation.
///
/// Owns one [`Layer`] per transition between consecutive `layer_sizes`.
/// Parameters change only through [`Network::apply_gradients`] (and hence
/// training) or a successful [`Network::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layer_sizes: Vec<usize>,
    layers: Vec<Layer>,
    activation: ActivationFunction,
}

impl Network {
    /// Builds a network with uniform `[-1, 1]` parameters from the thread RNG.
    pub fn new(layer_sizes: &[usize], config: NetworkConfig) -> Result<Network> {
        Network::with_rng(layer_sizes, config, &mut rand::thread_rng())
    }

    /// Builds a network drawing its initial parameters from `rng`.
    pub fn with_rng<R: Rng + ?Sized>(layer_sizes: &[usize], config: NetworkConfig, rng: &mut R) -> Result<Network> {
        validate_topology(layer_sizes)?;

        let layers = layer_sizes
            .windows(2)
            .map(|pair| Layer::new(pair[1], pair[0], &mut *rng))
            .collect();
        debug!("built network {:?} with {:?} activation", layer_sizes, config.activation);

        Ok(Network {
            layer_sizes: layer_sizes.to_vec(),
            layers,
            activation: config.activation,
        })
    }

    /// Builds a network from text produced by [`Network::serialize`].
    pub fn from_json(text: &str, config: NetworkConfig) -> Result<Network> {
        let (layer_sizes, layers) = ModelSnapshot::from_json(text)?.into_layers()?;
        Ok(Network {
            layer_sizes,
            layers,
            activation: config.activation,
        })
    }

    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn weights(&self) -> impl Iterator<Item = &Matrix> {
        self.layers.iter().map(|layer| layer.weights())
    }

    pub fn biases(&self) -> impl Iterator<Item = &Matrix> {
        self.layers.iter().map(|layer| layer.biases())
    }

    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    pub fn input_size(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    /// Runs every layer on `input`, recording each `z` and `a`.
    ///
    /// `input` is a column `(input_size, 1)`; a single row `(1, input_size)`
    /// is accepted and reshaped to a column.
    pub fn forward(&self, input: &Matrix) -> Result<ForwardPass> {
        let mut current = as_column(input, self.input_size(), "forward")?;
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        let mut pre_activations = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let z = layer.pre_activation(&current)?;
            let a = z.map(|x| self.activation.function(x));
            activations.push(current);
            pre_activations.push(z);
            current = a;
        }
        activations.push(current);

        Ok(ForwardPass { activations, pre_activations })
    }

    /// Gradient of the MSE loss with respect to every weight and bias for one
    /// sample, in layer order.
    pub fn backward(&self, pass: &ForwardPass, target: &Matrix) -> Result<Gradients> {
        let depth = self.layers.len();
        if pass.activations.len() != depth + 1 || pass.pre_activations.len() != depth {
            return Err(NnError::InvalidConfiguration(format!(
                "forward pass has {} activations and {} pre-activations, network has {} layers",
                pass.activations.len(),
                pass.pre_activations.len(),
                depth
            )));
        }

        let target = as_column(target, self.output_size(), "backward")?;
        let output = as_column(&pass.activations[depth], self.output_size(), "backward")?;
        let sigma_prime = |z: &Matrix| z.map(|x| self.activation.derivative(x));

        let mut delta = MseLoss::derivative(&output, &target)?
            .multiply_elementwise(&sigma_prime(&pass.pre_activations[depth - 1]))?;

        let mut weights = Vec::with_capacity(depth);
        let mut biases = Vec::with_capacity(depth);

        for l in (0..depth).rev() {
            // An activation stored as a flat row is reshaped before a^T.
            let input = as_column(&pass.activations[l], self.layer_sizes[l], "backward")?;
            let (w_grad, b_grad) = self.layers[l].compute_gradients(&delta, &input)?;

            if l > 0 {
                delta = self.layers[l]
                    .backpropagate(&delta)?
                    .multiply_elementwise(&sigma_prime(&pass.pre_activations[l - 1]))?;
            }

            weights.push(w_grad);
            biases.push(b_grad);
        }

        weights.reverse();
        biases.reverse();

        Ok(Gradients { weights, biases })
    }

    /// `W ← W − lr·∂W`, `b ← b − lr·∂b` for every layer. Either every layer is
    /// updated or, on a shape error, none is.
    pub fn apply_gradients(&mut self, gradients: &Gradients, learning_rate: f64) -> Result<()> {
        if gradients.weights.len() != self.layers.len() || gradients.biases.len() != self.layers.len() {
            return Err(NnError::InvalidConfiguration(format!(
                "got gradients for {} layers, network has {}",
                gradients.weights.len(),
                self.layers.len()
            )));
        }

        let updated = self
            .layers
            .iter()
            .zip(gradients.weights.iter().zip(&gradients.biases))
            .map(|(layer, (w_grad, b_grad))| {
                let mut next = layer.clone();
                next.apply_gradients(w_grad, b_grad, learning_rate)?;
                Ok(next)
            })
            .collect::<Result<Vec<_>>>()?;

        self.layers = updated;
        Ok(())
    }

    /// Forward pass only; returns the output column.
    pub fn predict(&self, input: &Matrix) -> Result<Matrix> {
        let mut pass = self.forward(input)?;
        Ok(pass.activations.pop().unwrap_or_default())
    }

    /// MSE loss of the current parameters on one sample.
    pub fn sample_loss(&self, input: &Matrix, target: &Matrix) -> Result<f64> {
        let output = self.predict(input)?;
        MseLoss::loss(&output, &as_column(target, self.output_size(), "loss")?)
    }

    /// Mean MSE over a non-empty dataset; does not touch the parameters.
    pub fn evaluate(&self, inputs: &[Matrix], targets: &[Matrix]) -> Result<f64> {
        if inputs.len() != targets.len() {
            return Err(NnError::InvalidConfiguration(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        if inputs.is_empty() {
            return Err(NnError::InvalidConfiguration("evaluation set is empty".into()));
        }

        let total = inputs
            .iter()
            .zip(targets)
            .map(|(input, target)| self.sample_loss(input, target))
            .sum::<Result<f64>>()?;
        Ok(total / inputs.len() as f64)
    }

    /// Trains with online SGD (`batch_size = None`) or parallel mini-batches.
    /// See [`train_loop`] for the full set of options.
    pub fn train(
        &mut self,
        inputs: &[Matrix],
        targets: &[Matrix],
        epochs: usize,
        learning_rate: f64,
        batch_size: Option<usize>,
    ) -> Result<TrainReport> {
        let config = TrainConfig::new(epochs, learning_rate).with_batch_size(batch_size);
        train_loop(self, inputs, targets, &config)
    }

    /// JSON text carrying `layers`, `weights` and `biases` at full precision.
    pub fn serialize(&self) -> Result<String> {
        ModelSnapshot {
            layers: self.layer_sizes.clone(),
            weights: self.weights().cloned().collect(),
            biases: self.biases().cloned().collect(),
        }
        .to_json()
    }

    /// Replaces topology and parameters with those in `text`. On any error
    /// the network is left exactly as it was.
    pub fn load(&mut self, text: &str) -> Result<()> {
        let (layer_sizes, layers) = ModelSnapshot::from_json(text)?.into_layers()?;
        debug!("loaded network {:?}", layer_sizes);
        self.layer_sizes = layer_sizes;
        self.layers = layers;
        Ok(())
    }

    /// Checks a sample's shapes and returns it as a column.
    pub(crate) fn input_column(&self, input: &Matrix) -> Result<Matrix> {
        as_column(input, self.input_size(), "input")
    }

    pub(crate) fn target_column(&self, target: &Matrix) -> Result<Matrix> {
        as_column(target, self.output_size(), "target")
    }
}

/// `m` as an `(expected_rows, 1)` column. A flat `(1, expected_rows)` row is
/// reshaped; any other shape is a mismatch.
fn as_column(m: &Matrix, expected_rows: usize, op: &'static str) -> Result<Matrix> {
    if m.shape() == (expected_rows, 1) {
        Ok(m.clone())
    } else if m.shape() == (1, expected_rows) {
        Ok(Matrix::from_column(&m.to_vec()))
    } else {
        Err(NnError::shape(op, m.shape(), (expected_rows, 1)))
    }
}
