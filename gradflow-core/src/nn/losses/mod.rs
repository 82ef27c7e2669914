//! Loss functions recorded as graph operations.

pub mod bce;
pub mod mse;
pub mod nll;

pub use bce::bce_loss;
pub use mse::mse_loss;
pub use nll::{cross_entropy, nll_loss};

use crate::autograd::{Graph, TensorId};
use crate::error::{GradflowError, Result};
use std::str::FromStr;

/// How per-element losses are folded into the scalar result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    #[default]
    Mean,
    Sum,
}

impl Reduction {
    pub(crate) fn apply(self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId> {
        match self {
            Reduction::Mean => g.mean(x),
            Reduction::Sum => g.sum(x),
        }
    }
}

impl FromStr for Reduction {
    type Err = GradflowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(Reduction::Mean),
            "sum" => Ok(Reduction::Sum),
            _ => Err(GradflowError::UnsupportedOperation(format!("Unsupported reduction type: {}", s))),
        }
    }
}

/// Fails unless both tensors have the same shape.
fn check_same_shape(g: &Graph<'_>, input: TensorId, target: TensorId, operation: &str) -> Result<()> {
    let (a, b) = (g.shape(input)?, g.shape(target)?);
    if a != b {
        return Err(GradflowError::shape_mismatch(b, a, operation));
    }
    Ok(())
}
