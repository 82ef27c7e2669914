//! Reverse-mode automatic differentiation over dense `f64`/`f32` arrays,
//! with neural network layers, losses and optimizers built on top of it.
//!
//! A forward pass records operations into a [`Graph`] owned by the caller;
//! [`Graph::backward`] walks it in reverse and pushes gradients into the
//! bound [`Parameter`]s, which optimizers then update.

pub mod array;
pub mod autograd;
pub mod context;
pub mod error;
pub mod nn;
pub mod ops;
pub mod optim;
pub mod types;
pub mod utils;

pub use array::NdArray;
pub use autograd::{Graph, Mode, TensorId};
pub use context::{Context, ContextOptions};
pub use error::{GradflowError, GradflowError as Error, Result};
pub use nn::{Module, Parameter};
pub use types::DType;
