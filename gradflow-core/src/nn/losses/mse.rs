use super::{check_same_shape, Reduction};
use crate::autograd::{Graph, TensorId};
use crate::error::Result;

/// Mean (or summed) squared error between `input` and `target`, which must
/// have the same shape.
pub fn mse_loss(g: &mut Graph<'_>, input: TensorId, target: TensorId, reduction: Reduction) -> Result<TensorId> {
    check_same_shape(g, input, target, "mse_loss")?;
    let diff = g.sub(input, target)?;
    let squared = g.sqr(diff)?;
    reduction.apply(g, squared)
}

#[cfg(test)]
#[path = "mse_test.rs"]
mod tests;
