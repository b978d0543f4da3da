use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

/// Predictions are clipped to `[EPS, 1 - EPS]` before the logarithm.
const EPS: f64 = 1e-7;

/// Class targets for [`CrossEntropyLoss::categorical`], one per prediction row.
#[derive(Debug, Clone, PartialEq)]
pub enum Targets {
    /// True class index for each sample.
    Indices(Vec<usize>),
    /// One-hot (or soft) target row for each sample; same shape as the predictions.
    OneHot(Matrix),
}

/// Categorical cross-entropy over rows of class probabilities.
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// Returns one loss value per sample (row of `predictions`):
    /// `-Σ target[c] · ln(clip(p[c]))`, which reduces to `-ln(p_true)` for
    /// index or one-hot targets.
    pub fn categorical(predictions: &Matrix, targets: &Targets) -> Result<Vec<f64>> {
        let clipped = predictions.map(|p| p.clamp(EPS, 1.0 - EPS));

        match targets {
            Targets::Indices(indices) => {
                if indices.len() != clipped.rows() {
                    return Err(NnError::shape(
                        "categorical_cross_entropy",
                        clipped.shape(),
                        (indices.len(), 1),
                    ));
                }
                clipped
                    .data()
                    .iter()
                    .zip(indices)
                    .map(|(row, &class)| {
                        row.get(class).map(|p| -p.ln()).ok_or_else(|| {
                            NnError::UnknownKey(format!(
                                "class index {class} out of range for {} classes",
                                row.len()
                            ))
                        })
                    })
                    .collect()
            }
            Targets::OneHot(expected) => {
                if expected.shape() != clipped.shape() {
                    return Err(NnError::shape(
                        "categorical_cross_entropy",
                        clipped.shape(),
                        expected.shape(),
                    ));
                }
                Ok(clipped
                    .data()
                    .iter()
                    .zip(expected.data())
                    .map(|(row, target)| {
                        -row.iter().zip(target).map(|(p, t)| t * p.ln()).sum::<f64>()
                    })
                    .collect())
            }
        }
    }
}
