use super::traits::Sampler;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Visits indices in random order.
///
/// The sampler owns its generator, so every call to [`Sampler::iter`]
/// gives a new order, and a seeded sampler replays the same sequence of
/// orders.
#[derive(Debug)]
pub struct RandomSampler {
    replacement: bool,
    num_samples: Option<usize>,
    rng: Mutex<StdRng>,
}

impl RandomSampler {
    /// `num_samples` defaults to the dataset length. Without replacement it
    /// may not exceed the dataset length.
    pub fn new(replacement: bool, num_samples: Option<usize>) -> Self {
        Self::from_rng(replacement, num_samples, StdRng::from_entropy())
    }

    pub fn with_seed(replacement: bool, num_samples: Option<usize>, seed: u64) -> Self {
        Self::from_rng(replacement, num_samples, StdRng::seed_from_u64(seed))
    }

    fn from_rng(replacement: bool, num_samples: Option<usize>, rng: StdRng) -> Self {
        RandomSampler {
            replacement,
            num_samples,
            rng: Mutex::new(rng),
        }
    }
}

impl Sampler for RandomSampler {
    fn iter(&self, dataset_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync> {
        if dataset_len == 0 {
            return Box::new(std::iter::empty());
        }
        let num_samples = self.num_samples.unwrap_or(dataset_len);
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| {
            log::warn!("sampler rng lock was poisoned, recovering");
            poisoned.into_inner()
        });

        if self.replacement {
            let indices: Vec<usize> = (0..num_samples).map(|_| rng.gen_range(0..dataset_len)).collect();
            return Box::new(indices.into_iter());
        }
        if num_samples > dataset_len {
            log::warn!(
                "RandomSampler: {} samples requested from {} without replacement, yielding none",
                num_samples,
                dataset_len
            );
            return Box::new(std::iter::empty());
        }
        let mut indices: Vec<usize> = (0..dataset_len).collect();
        indices.shuffle(&mut *rng);
        indices.truncate(num_samples);
        Box::new(indices.into_iter())
    }

    fn len(&self, dataset_len: usize) -> usize {
        self.num_samples.unwrap_or(dataset_len)
    }
}

#[cfg(test)]
#[path = "random_sampler_test.rs"]
mod tests;
