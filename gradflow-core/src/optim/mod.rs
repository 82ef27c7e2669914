//! Optimizers for training neural networks.
//!
//! This module provides the [`Optimizer`] trait with its supporting
//! [`ParamGroup`] and [`OptimizerState`], the SGD and Adam implementations,
//! gradient clipping helpers and learning-rate schedulers.

pub mod adam;
pub mod grad_clipping;
pub mod lr_scheduler;
pub mod optimizer_state;
pub mod optimizer_trait;
pub mod param_group;
pub mod sgd;

pub use adam::AdamOptimizer;
pub use grad_clipping::{clip_grad_norm_, clip_grad_value_};
pub use lr_scheduler::{ExponentialLr, LrScheduler, StepLr};
pub use optimizer_state::OptimizerState;
pub use optimizer_trait::Optimizer;
pub use param_group::ParamGroup;
pub use sgd::SgdOptimizer;
