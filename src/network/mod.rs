pub mod config;
pub mod network;
pub mod pass;
pub mod snapshot;

pub use config::NetworkConfig;
pub use network::Network;
pub use pass::{ForwardPass, Gradients};
pub use snapshot::ModelSnapshot;
