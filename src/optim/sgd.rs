use crate::error::{NnError, Result};
use crate::network::network::Network;
use crate::network::pass::Gradients;

/// Vanilla gradient descent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    /// The learning rate must be finite and positive.
    pub fn new(learning_rate: f64) -> Result<Sgd> {
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(NnError::InvalidConfiguration(format!(
                "learning rate must be finite and positive, got {learning_rate}"
            )));
        }
        Ok(Sgd { learning_rate })
    }

    /// Applies one SGD update to every layer of `network`.
    pub fn step(&self, network: &mut Network, gradients: &Gradients) -> Result<()> {
        network.apply_gradients(gradients, self.learning_rate)
    }
}
