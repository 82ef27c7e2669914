//! Layers, losses, weight initialization and persisted network state.

pub mod init;
pub mod layers;
pub mod losses;
pub mod module;
pub mod parameter;
pub mod state;

pub use layers::{BatchNorm1d, Dropout, LayerNorm, Linear, LogSoftmax, Relu, Sequential, Sigmoid, Softmax, Tanh};
pub use losses::{bce_loss, cross_entropy, mse_loss, nll_loss, Reduction};
pub use module::Module;
pub use parameter::{ParamId, Parameter};
pub use state::NetworkState;
