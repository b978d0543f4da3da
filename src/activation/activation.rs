use std::f64::consts::E;

use crate::math::matrix::Matrix;

/// Elementwise nonlinearity applied after every layer's affine transform.
///
/// Each variant pairs a function with its derivative. The derivative is
/// always evaluated on the pre-activation `z`, never on the activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationFunction {
    Sigmoid,
    #[default]
    ReLU,
    Tanh,
    Identity,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::ReLU => relu(x),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Identity => x,
        }
    }

    /// Derivative at the pre-activation value `z`.
    pub fn derivative(&self, z: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => sigmoid_derivative(z),
            ActivationFunction::ReLU => relu_derivative(z),
            ActivationFunction::Tanh => {
                let t = z.tanh();
                1.0 - t * t
            }
            ActivationFunction::Identity => 1.0,
        }
    }
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + E.powf(-x))
}

pub fn sigmoid_derivative(z: f64) -> f64 {
    let s = sigmoid(z);
    s * (1.0 - s)
}

pub fn relu(x: f64) -> f64 {
    if x > 0.0 { x } else { 0.0 }
}

/// 1 for positive inputs, 0 otherwise (including exactly 0).
pub fn relu_derivative(z: f64) -> f64 {
    if z > 0.0 { 1.0 } else { 0.0 }
}

/// Row-wise softmax. Each row has its maximum subtracted before
/// exponentiation and is then normalized by its sum.
pub fn softmax(inputs: &Matrix) -> Matrix {
    let maxes: Vec<f64> = inputs
        .data()
        .iter()
        .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .collect();
    let exps = inputs.map_indexed(|i, _, x| (x - maxes[i]).exp());
    let sums: Vec<f64> = exps.data().iter().map(|row| row.iter().sum()).collect();

    exps.map_indexed(|i, _, e| e / sums[i])
}
