//! Process-level configuration shared by every graph: dtype policy, the
//! random stream used by stochastic operations and an optional worker pool.

use crate::array::NdArray;
use crate::error::{GradflowError, Result};
use crate::nn::parameter::Parameter;
use crate::types::DType;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, Uniform};
use std::sync::Mutex;

pub const SEED_ENV: &str = "GRADFLOW_SEED";
pub const THREADS_ENV: &str = "GRADFLOW_THREADS";

/// Options used to build a [`Context`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextOptions {
    /// Seed of the shared random stream. `None` draws one from entropy.
    pub seed: Option<u64>,
    pub dtype: DType,
    /// Size of a dedicated worker pool. `None` uses rayon's global pool.
    pub num_threads: Option<usize>,
}

impl ContextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Defaults overridden by `GRADFLOW_SEED` and `GRADFLOW_THREADS`.
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Ok(raw) = std::env::var(SEED_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => options.seed = Some(seed),
                Err(_) => log::warn!("ignoring {}={:?}: not an unsigned integer", SEED_ENV, raw),
            }
        }
        if let Ok(raw) = std::env::var(THREADS_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => options.num_threads = Some(n),
                _ => log::warn!("ignoring {}={:?}: expected a positive integer", THREADS_ENV, raw),
            }
        }
        options
    }
}

/// Factory and configuration root for arrays, parameters and graphs.
///
/// Every stochastic draw (dropout masks, random initialisation, shuffling)
/// is taken sequentially from one seeded stream, so a fixed seed reproduces a
/// whole training run.
pub struct Context {
    dtype: DType,
    seed: u64,
    rng: Mutex<StdRng>,
    pool: Option<rayon::ThreadPool>,
}

impl Context {
    pub fn new(options: ContextOptions) -> Result<Self> {
        let seed = options.seed.unwrap_or_else(rand::random);
        let pool = match options.num_threads {
            Some(0) => {
                return Err(GradflowError::ConfigurationError(
                    "num_threads must be positive".to_string(),
                ))
            }
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("gradflow-worker-{}", i))
                    .build()
                    .map_err(|e| GradflowError::ConfigurationError(format!("failed to build thread pool: {}", e)))?,
            ),
            None => None,
        };
        log::debug!(
            "context created: dtype={:?} seed={} threads={:?}",
            options.dtype,
            seed,
            options.num_threads
        );
        Ok(Context {
            dtype: options.dtype,
            seed,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            pool,
        })
    }

    /// `F64` context on the global pool with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Context {
            dtype: DType::F64,
            seed,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            pool: None,
        }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Runs `f` with exclusive access to the shared random stream.
    pub fn with_rng<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| {
            log::warn!("context rng lock was poisoned, recovering");
            poisoned.into_inner()
        });
        f(&mut rng)
    }

    pub fn pool(&self) -> Option<&rayon::ThreadPool> {
        self.pool.as_ref()
    }

    /// Runs `f` inside the dedicated pool when there is one, so parallel
    /// iterators in `f` use it instead of the global pool.
    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }

    pub fn scalar(&self, value: f64) -> NdArray {
        NdArray::full(&[], value, self.dtype)
    }

    pub fn zeros(&self, shape: &[usize]) -> NdArray {
        NdArray::full(shape, 0.0, self.dtype)
    }

    pub fn ones(&self, shape: &[usize]) -> NdArray {
        NdArray::full(shape, 1.0, self.dtype)
    }

    pub fn full(&self, shape: &[usize], value: f64) -> NdArray {
        NdArray::full(shape, value, self.dtype)
    }

    pub fn from_vec(&self, data: Vec<f64>, shape: &[usize]) -> Result<NdArray> {
        NdArray::with_dtype(data, shape.to_vec(), self.dtype)
    }

    /// Values drawn uniformly from `[low, high)`.
    pub fn rand_uniform(&self, shape: &[usize], low: f64, high: f64) -> Result<NdArray> {
        if !(low < high) {
            return Err(GradflowError::ConfigurationError(format!(
                "uniform range is empty: [{}, {})",
                low, high
            )));
        }
        let dist = Uniform::new(low, high);
        Ok(self.with_rng(|rng| NdArray::from_fn(shape, self.dtype, |_| dist.sample(rng))))
    }

    /// Values drawn from a normal distribution.
    pub fn randn(&self, shape: &[usize], mean: f64, std: f64) -> Result<NdArray> {
        let dist = Normal::new(mean, std)
            .map_err(|e| GradflowError::ConfigurationError(format!("invalid normal distribution: {}", e)))?;
        Ok(self.with_rng(|rng| NdArray::from_fn(shape, self.dtype, |_| dist.sample(rng))))
    }

    /// Inverted-dropout mask: each entry is `1 / keep` with probability
    /// `keep`, else `0`.
    pub fn dropout_mask(&self, shape: &[usize], keep: f64) -> NdArray {
        if keep <= 0.0 {
            return NdArray::full(shape, 0.0, self.dtype);
        }
        let scale = 1.0 / keep;
        self.with_rng(|rng| {
            NdArray::from_fn(shape, self.dtype, |_| if rng.gen::<f64>() < keep { scale } else { 0.0 })
        })
    }

    /// A random permutation of `0..n`.
    pub fn permutation(&self, n: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n).collect();
        self.with_rng(|rng| indices.shuffle(rng));
        indices
    }

    /// Wraps `value` (converted to the context dtype) into a named parameter.
    pub fn parameter(&self, name: impl Into<String>, value: NdArray) -> Parameter {
        Parameter::named(name, value.cast(self.dtype))
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::with_seed(rand::random())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("dtype", &self.dtype)
            .field("seed", &self.seed)
            .field("threads", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .finish()
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
