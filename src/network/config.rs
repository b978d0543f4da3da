use crate::activation::activation::ActivationFunction;

/// Construction-time settings for a [`Network`](crate::network::Network).
///
/// Resolved once when the network is built; the activation is fixed for the
/// network's lifetime and applies to every layer, output included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkConfig {
    pub activation: ActivationFunction,
}

impl NetworkConfig {
    pub fn new(activation: ActivationFunction) -> Self {
        NetworkConfig { activation }
    }
}
