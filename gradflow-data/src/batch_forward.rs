use crate::dataloader::{Batch, DataLoader};
use crate::datasets::TabularDataset;
use crate::samplers::RandomSampler;
use gradflow_core::{Context, Graph, Mode, Module, Result, TensorId};
use rand::Rng;
use rayon::prelude::*;

/// How [`batch_forward`] splits and evaluates a dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    pub batch_size: usize,
    /// Visit rows in an order drawn from the context RNG.
    pub shuffle: bool,
    /// Drop a final batch smaller than `batch_size`.
    pub skip_last: bool,
    pub mode: Mode,
}

impl BatchOptions {
    /// Sequential, keeps the last batch, eval mode.
    pub fn new(batch_size: usize) -> Self {
        BatchOptions {
            batch_size,
            shuffle: false,
            skip_last: false,
            mode: Mode::Eval,
        }
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn skip_last(mut self, skip_last: bool) -> Self {
        self.skip_last = skip_last;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

/// Splits `dataset` into batches and runs `module` on each of them in
/// parallel, on the context's pool when it has one.
///
/// Every array of the dataset becomes one input of
/// [`Module::forward_many`]. Each batch records into its own graph, so
/// parameters are only read. Batches come back in sampling order, and the
/// result is the same for any number of worker threads as long as the forward
/// pass draws no random numbers (dropout in train mode does).
pub fn batch_forward<M: Module + ?Sized>(
    ctx: &Context,
    module: &M,
    dataset: &TabularDataset,
    options: &BatchOptions,
) -> Result<Vec<Batch>> {
    let loader = if options.shuffle {
        let seed = ctx.with_rng(|rng| rng.gen::<u64>());
        let sampler = RandomSampler::with_seed(false, None, seed);
        DataLoader::new(dataset, options.batch_size, &sampler, options.skip_last)?
    } else {
        DataLoader::sequential(dataset, options.batch_size, options.skip_last)?
    };
    let batches = loader.collect::<Result<Vec<_>>>()?;
    log::debug!(
        "batch_forward: {} batches of up to {} rows in {:?} mode",
        batches.len(),
        options.batch_size,
        options.mode
    );

    let mode = options.mode;
    ctx.install(|| {
        batches
            .into_par_iter()
            .map(|batch| -> Result<Batch> {
                let mut g = Graph::new(ctx, mode);
                let inputs: Vec<TensorId> = batch.inputs().iter().map(|a| g.constant(a.clone())).collect();
                let output = module.forward_many(&mut g, &inputs)?;
                let value = g.value(output)?.clone();
                Ok(batch.with_output(value))
            })
            .collect()
    })
}
