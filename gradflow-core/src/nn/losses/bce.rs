use super::{check_same_shape, Reduction};
use crate::autograd::{Graph, TensorId};
use crate::error::Result;

/// Default clamp applied inside the logarithms of [`bce_loss`].
pub const BCE_EPS: f64 = 1e-12;

/// Binary cross entropy between probabilities `input` and 0/1 `target`:
/// `-(t * log(p) + (1 - t) * log(1 - p))`, with both logarithms clamped at
/// `eps` so saturated predictions stay finite.
pub fn bce_loss(
    g: &mut Graph<'_>,
    input: TensorId,
    target: TensorId,
    eps: f64,
    reduction: Reduction,
) -> Result<TensorId> {
    check_same_shape(g, input, target, "bce_loss")?;
    let log_p = g.log_eps(input, eps)?;
    let neg_p = g.neg(input)?;
    let one_minus_p = g.add_scalar(neg_p, 1.0)?;
    let log_q = g.log_eps(one_minus_p, eps)?;
    let neg_t = g.neg(target)?;
    let one_minus_t = g.add_scalar(neg_t, 1.0)?;

    let pos = g.mul(target, log_p)?;
    let neg = g.mul(one_minus_t, log_q)?;
    let total = g.add(pos, neg)?;
    let loss = g.neg(total)?;
    reduction.apply(g, loss)
}
