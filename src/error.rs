use thiserror::Error;

/// Errors raised by matrix algebra, network construction, training and
/// model (de)serialization.
#[derive(Debug, Error)]
pub enum NnError {
    /// Operand shapes violate the precondition of `op`.
    #[error("shape mismatch in {op}: left is {left:?}, right is {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    /// Nested data where some row has a different length than the first one.
    #[error("row {row} has {found} elements, expected {expected}")]
    RaggedRows {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Missing or malformed input data (model text, class indices).
    #[error("unknown key: {0}")]
    UnknownKey(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A weight or bias is NaN or infinite and cannot be written as JSON.
    #[error("layer {layer} {param} contain a non-finite value")]
    NonFiniteParameter {
        layer: usize,
        param: &'static str,
    },

    #[error("failed to serialize model: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NnError>;

impl NnError {
    pub(crate) fn shape(op: &'static str, left: (usize, usize), right: (usize, usize)) -> Self {
        NnError::ShapeMismatch { op, left, right }
    }
}
