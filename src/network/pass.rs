use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Everything the backward pass needs from a forward pass.
///
/// `activations[0]` is the input and `activations[l + 1]` the output of
/// layer `l`; `pre_activations[l]` is that layer's `z`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPass {
    pub activations: Vec<Matrix>,
    pub pre_activations: Vec<Matrix>,
}

impl ForwardPass {
    /// Final activation, i.e. the prediction.
    pub fn output(&self) -> Option<&Matrix> {
        self.activations.last()
    }
}

/// Per-layer loss gradients; index `j` matches the network's layer `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub weights: Vec<Matrix>,
    pub biases: Vec<Matrix>,
}

impl Gradients {
    /// Zero gradients shaped like the given `(weights, biases)` shapes.
    pub fn zeros<I>(shapes: I) -> Gradients
    where
        I: IntoIterator<Item = ((usize, usize), (usize, usize))>,
    {
        let (weights, biases) = shapes
            .into_iter()
            .map(|((wr, wc), (br, bc))| (Matrix::zeros(wr, wc), Matrix::zeros(br, bc)))
            .unzip();
        Gradients { weights, biases }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Elementwise `self += other`.
    pub fn accumulate(&mut self, other: &Gradients) -> Result<()> {
        for g in [&*self, other] {
            if g.weights.len() != g.biases.len() {
                return Err(NnError::InvalidConfiguration(format!(
                    "gradients hold {} weight and {} bias matrices",
                    g.weights.len(),
                    g.biases.len()
                )));
            }
        }
        if self.len() != other.len() {
            return Err(NnError::InvalidConfiguration(format!(
                "cannot accumulate gradients for {} layers into {} layers",
                other.len(),
                self.len()
            )));
        }

        let weights = self
            .weights
            .iter()
            .zip(&other.weights)
            .map(|(a, b)| add_same_shape(a, b))
            .collect::<Result<Vec<_>>>()?;
        let biases = self
            .biases
            .iter()
            .zip(&other.biases)
            .map(|(a, b)| add_same_shape(a, b))
            .collect::<Result<Vec<_>>>()?;

        self.weights = weights;
        self.biases = biases;
        Ok(())
    }

    pub fn scale(&self, k: f64) -> Gradients {
        Gradients {
            weights: self.weights.iter().map(|m| m.scalar_multiply(k)).collect(),
            biases: self.biases.iter().map(|m| m.scalar_multiply(k)).collect(),
        }
    }
}

fn add_same_shape(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.shape() != b.shape() {
        return Err(NnError::shape("accumulate", a.shape(), b.shape()));
    }
    a.add(b)
}
