//! Datasets, samplers and batched evaluation for gradflow models.
//!
//! [`TabularDataset`] holds aligned arrays, [`DataLoader`] cuts them into
//! [`Batch`]es in the order given by a [`Sampler`], and [`batch_forward`]
//! runs a [`Module`](gradflow_core::Module) over every batch in parallel.

pub mod batch_forward;
pub mod dataloader;
pub mod datasets;
pub mod samplers;

pub use batch_forward::{batch_forward, BatchOptions};
pub use dataloader::{Batch, DataLoader};
pub use datasets::{Dataset, TabularDataset};
pub use samplers::{RandomSampler, Sampler, SequentialSampler, SubsetRandomSampler};
