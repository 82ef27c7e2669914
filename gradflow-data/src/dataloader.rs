//! Batch iteration over a [`TabularDataset`].
//!
//! ```
//! use gradflow_core::NdArray;
//! use gradflow_data::{DataLoader, SequentialSampler, TabularDataset};
//!
//! let x = NdArray::new((0..10).map(f64::from).collect(), vec![5, 2]).unwrap();
//! let dataset = TabularDataset::new(vec![x]).unwrap();
//! let loader = DataLoader::new(&dataset, 2, &SequentialSampler, false).unwrap();
//! let sizes: Vec<usize> = loader.map(|b| b.unwrap().len()).collect();
//! assert_eq!(sizes, vec![2, 2, 1]);
//! ```

use crate::datasets::{Dataset, TabularDataset};
use crate::samplers::{Sampler, SequentialSampler};
use gradflow_core::{GradflowError, NdArray, Result};

/// Rows of a dataset gathered together, plus the model output once a
/// forward pass has run on them.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    indices: Vec<usize>,
    inputs: Vec<NdArray>,
    output: Option<NdArray>,
}

impl Batch {
    /// Dataset rows in this batch, in batch order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// One stacked array per dataset array.
    pub fn inputs(&self) -> &[NdArray] {
        &self.inputs
    }

    pub fn output(&self) -> Option<&NdArray> {
        self.output.as_ref()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub(crate) fn with_output(mut self, output: NdArray) -> Self {
        self.output = Some(output);
        self
    }
}

/// Iterator of [`Batch`]es in the order chosen by a sampler.
pub struct DataLoader<'a> {
    dataset: &'a TabularDataset,
    batch_size: usize,
    drop_last: bool,
    indices: Box<dyn Iterator<Item = usize> + Send + Sync>,
    remaining: usize,
}

impl<'a> DataLoader<'a> {
    /// With `drop_last`, a final batch smaller than `batch_size` is skipped.
    pub fn new<S: Sampler + ?Sized>(
        dataset: &'a TabularDataset,
        batch_size: usize,
        sampler: &S,
        drop_last: bool,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(GradflowError::ConfigurationError(
                "batch size must be positive".to_string(),
            ));
        }
        Ok(DataLoader {
            dataset,
            batch_size,
            drop_last,
            indices: sampler.iter(dataset.len()),
            remaining: sampler.len(dataset.len()),
        })
    }

    pub fn sequential(dataset: &'a TabularDataset, batch_size: usize, drop_last: bool) -> Result<Self> {
        Self::new(dataset, batch_size, &SequentialSampler, drop_last)
    }

    /// Batches still to be yielded.
    pub fn num_batches(&self) -> usize {
        if self.drop_last {
            self.remaining / self.batch_size
        } else {
            self.remaining.div_ceil(self.batch_size)
        }
    }
}

impl Iterator for DataLoader<'_> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let indices: Vec<usize> = self.indices.by_ref().take(self.batch_size).collect();
        self.remaining = self.remaining.saturating_sub(indices.len());
        if indices.is_empty() || (self.drop_last && indices.len() < self.batch_size) {
            return None;
        }
        Some(self.dataset.take(&indices).map(|inputs| Batch {
            indices,
            inputs,
            output: None,
        }))
    }
}

#[cfg(test)]
#[path = "dataloader_test.rs"]
mod tests;
