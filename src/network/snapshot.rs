use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;

/// Serialized form of a network's topology and parameters.
///
/// ```json
/// { "layers": [2, 4, 1], "weights": [[[..]], ..], "biases": [[[..]], ..] }
/// ```
///
/// The activation function is not part of the snapshot; it belongs to the
/// network's construction config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub layers: Vec<usize>,
    pub weights: Vec<Matrix>,
    pub biases: Vec<Matrix>,
}

impl ModelSnapshot {
    pub fn from_json(text: &str) -> Result<ModelSnapshot> {
        serde_json::from_str(text).map_err(|e| NnError::UnknownKey(e.to_string()))
    }

    /// Fails on NaN or infinite parameters, which JSON would write as `null`.
    pub fn to_json(&self) -> Result<String> {
        for (layer, (weights, biases)) in self.weights.iter().zip(&self.biases).enumerate() {
            if !weights.data().iter().flatten().all(|x| x.is_finite()) {
                return Err(NnError::NonFiniteParameter { layer, param: "weights" });
            }
            if !biases.data().iter().flatten().all(|x| x.is_finite()) {
                return Err(NnError::NonFiniteParameter { layer, param: "biases" });
            }
        }
        Ok(serde_json::to_string(self)?)
    }

    /// Checks the topology and every parameter shape, then builds the layers.
    pub fn into_layers(self) -> Result<(Vec<usize>, Vec<Layer>)> {
        validate_topology(&self.layers)?;

        let transitions = self.layers.len() - 1;
        if self.weights.len() != transitions || self.biases.len() != transitions {
            return Err(NnError::InvalidConfiguration(format!(
                "{} layer sizes need {} weight and bias matrices, found {} and {}",
                self.layers.len(),
                transitions,
                self.weights.len(),
                self.biases.len()
            )));
        }

        let mut layers = Vec::with_capacity(transitions);
        for (l, (weights, biases)) in self.weights.into_iter().zip(self.biases).enumerate() {
            let expected_w = (self.layers[l + 1], self.layers[l]);
            let expected_b = (self.layers[l + 1], 1);
            if weights.shape() != expected_w {
                return Err(NnError::shape("load weights", weights.shape(), expected_w));
            }
            if biases.shape() != expected_b {
                return Err(NnError::shape("load biases", biases.shape(), expected_b));
            }
            layers.push(Layer { weights, biases });
        }

        Ok((self.layers, layers))
    }
}

/// At least two layer sizes, all positive.
pub fn validate_topology(layer_sizes: &[usize]) -> Result<()> {
    if layer_sizes.len() < 2 {
        return Err(NnError::InvalidConfiguration(format!(
            "a network needs at least an input and an output size, got {layer_sizes:?}"
        )));
    }
    if let Some(pos) = layer_sizes.iter().position(|&s| s == 0) {
        return Err(NnError::InvalidConfiguration(format!(
            "layer {pos} has size 0 in {layer_sizes:?}"
        )));
    }
    Ok(())
}
