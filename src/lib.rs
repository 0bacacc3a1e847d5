pub mod activation;
pub mod error;
pub mod loss;
pub mod math;
pub mod network;

// Convenience re-exports
pub use activation::activation::Activation;
pub use error::{Error, Result};
pub use loss::mse::MseLoss;
pub use math::matrix::{Axis, Matrix};
pub use network::mlp::{Mlp, Sample};
