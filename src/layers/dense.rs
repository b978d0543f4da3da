use rand::Rng;

use crate::error::Result;
use crate::math::matrix::Matrix;

/// One affine transform between two layers of neurons.
///
/// Uses column vectors: `weights` is `(size, input_size)`, `biases` is
/// `(size, 1)` and a sample flows through as `z = W · a + b`.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub(crate) weights: Matrix,
    pub(crate) biases: Matrix,
}

impl Layer {
    /// Uniform `[-1, 1]` weights and biases drawn from `rng`.
    pub fn new<R: Rng + ?Sized>(size: usize, input_size: usize, rng: &mut R) -> Layer {
        let mut weights = Matrix::zeros(size, input_size);
        let mut biases = Matrix::zeros(size, 1);
        weights.randomize_with(rng);
        biases.randomize_with(rng);

        Layer { weights, biases }
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn biases(&self) -> &Matrix {
        &self.biases
    }

    /// Pre-activation `z = W · input + b`.
    pub fn pre_activation(&self, input: &Matrix) -> Result<Matrix> {
        self.weights.dot(input)?.add(&self.biases)
    }

    /// Gradients for this layer given its error signal `delta` (∂L/∂z) and
    /// the activation that fed it. Returns `(weights_grad, biases_grad)`.
    pub fn compute_gradients(&self, delta: &Matrix, input: &Matrix) -> Result<(Matrix, Matrix)> {
        let weights_grad = delta.dot(&input.transpose())?;
        Ok((weights_grad, delta.clone()))
    }

    /// Propagates `delta` back through the weights: `Wᵀ · δ`.
    pub fn backpropagate(&self, delta: &Matrix) -> Result<Matrix> {
        self.weights.transpose().dot(delta)
    }

    /// Applies pre-computed gradients scaled by lr.
    ///
    /// Both subtractions are computed before either parameter is replaced,
    /// so a shape error leaves the layer untouched.
    pub fn apply_gradients(&mut self, weights_grad: &Matrix, biases_grad: &Matrix, lr: f64) -> Result<()> {
        let weights = self.weights.subtract(&weights_grad.scalar_multiply(lr))?;
        let biases = self.biases.subtract(&biases_grad.scalar_multiply(lr))?;
        self.weights = weights;
        self.biases = biases;
        Ok(())
    }
}
