//! Layers and containers implementing [`Module`](crate::nn::Module).

pub mod activation;
pub mod batchnorm;
pub mod dropout;
pub mod layernorm;
pub mod linear;
pub mod sequential;

pub use activation::{LogSoftmax, Relu, Sigmoid, Softmax, Tanh};
pub use batchnorm::BatchNorm1d;
pub use dropout::Dropout;
pub use layernorm::LayerNorm;
pub use linear::Linear;
pub use sequential::Sequential;
