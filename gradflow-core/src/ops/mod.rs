//! Graph operations.
//!
//! Every operation is a method on [`Graph`](crate::autograd::Graph) that
//! computes its forward value eagerly and records an [`Op`](crate::autograd::Op)
//! node. The matching backward rule lives in the same file and is reached
//! through `Op::back_functions`.

pub mod activation;
pub mod arithmetic;
pub mod comparison;
pub mod dropout;
pub mod linalg;
pub mod math_elem;
pub mod reduction;
pub mod stats;
pub mod view;

use crate::array::NdArray;
use crate::autograd::{BackFunction, Graph, TensorId};
use crate::error::Result;

/// Additive contribution for an operand that may have been broadcast: the
/// gradient is summed back down to the operand's shape.
pub(crate) fn unbroadcast(g: &Graph<'_>, target: TensorId, grad: NdArray) -> Result<BackFunction> {
    let shape = g.shape(target)?;
    Ok(BackFunction::additive(target, grad.reduce_to_shape(shape)?))
}
