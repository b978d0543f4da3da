use crate::error::Result;
use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²) over every element.
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        let errors = predicted.subtract(expected)?;
        let n = (errors.rows() * errors.cols()) as f64;
        if n == 0.0 {
            return Ok(0.0);
        }
        Ok(errors.reduce(0.0, |acc, x| acc + x * x) / n)
    }

    /// Gradient `2/n · (predicted - expected)` where `n` is the row count,
    /// i.e. the output width for a column sample.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        let n = predicted.rows().max(1) as f64;
        Ok(predicted.subtract(expected)?.scalar_multiply(2.0 / n))
    }
}
