pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use error::{NnError, Result};
pub use math::matrix::Matrix;
pub use activation::activation::{
    relu, relu_derivative, sigmoid, sigmoid_derivative, softmax, ActivationFunction,
};
pub use layers::dense::Layer;
pub use network::{ForwardPass, Gradients, ModelSnapshot, Network, NetworkConfig};
pub use loss::{CrossEntropyLoss, MseLoss, Targets};
pub use optim::sgd::Sgd;
pub use train::{train_loop, EpochStats, TrainConfig, TrainReport};
