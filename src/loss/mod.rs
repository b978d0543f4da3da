pub mod mse;
pub mod cross_entropy;

pub use mse::MseLoss;
pub use cross_entropy::{CrossEntropyLoss, Targets};
