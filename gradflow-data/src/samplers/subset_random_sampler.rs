use super::traits::Sampler;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;

/// Visits a fixed subset of indices in random order, for example a
/// validation split.
#[derive(Debug)]
pub struct SubsetRandomSampler {
    indices: Vec<usize>,
    rng: Mutex<StdRng>,
}

impl SubsetRandomSampler {
    pub fn new(indices: Vec<usize>) -> Self {
        SubsetRandomSampler {
            indices,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(indices: Vec<usize>, seed: u64) -> Self {
        SubsetRandomSampler {
            indices,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Sampler for SubsetRandomSampler {
    /// Ignores `dataset_len`; indices past the end surface as errors when
    /// the dataset is read.
    fn iter(&self, _dataset_len: usize) -> Box<dyn Iterator<Item = usize> + Send + Sync> {
        let mut indices = self.indices.clone();
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| {
            log::warn!("sampler rng lock was poisoned, recovering");
            poisoned.into_inner()
        });
        indices.shuffle(&mut *rng);
        Box::new(indices.into_iter())
    }

    fn len(&self, _dataset_len: usize) -> usize {
        self.indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset_is_permuted() {
        let sampler = SubsetRandomSampler::with_seed(vec![7, 2, 9, 4], 1);
        assert_eq!(sampler.len(100), 4);
        let mut seen: Vec<usize> = sampler.iter(100).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![2, 4, 7, 9]);
        assert_eq!(SubsetRandomSampler::new(vec![]).iter(10).count(), 0);
    }
}
