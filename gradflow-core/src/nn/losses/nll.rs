use super::Reduction;
use crate::array::NdArray;
use crate::autograd::{Graph, TensorId};
use crate::error::{GradflowError, Result};

/// Negative log-likelihood of the `targets` classes under `log_probs` of
/// shape `[batch, classes]`.
pub fn nll_loss(g: &mut Graph<'_>, log_probs: TensorId, targets: &[usize], reduction: Reduction) -> Result<TensorId> {
    let shape = g.shape(log_probs)?;
    if shape.len() != 2 || shape[0] != targets.len() {
        return Err(GradflowError::shape_mismatch(&[targets.len(), 0], shape, "nll_loss"));
    }
    let dtype = g.value(log_probs)?.dtype();
    let index = NdArray::from_elems(targets, &[targets.len(), 1], dtype)?;
    let picked = g.gather(log_probs, 1, &index)?;
    let loss = reduction.apply(g, picked)?;
    g.neg(loss)
}

/// `nll_loss(log_softmax(logits, 1), targets)`.
pub fn cross_entropy(g: &mut Graph<'_>, logits: TensorId, targets: &[usize], reduction: Reduction) -> Result<TensorId> {
    let log_probs = g.log_softmax(logits, 1)?;
    nll_loss(g, log_probs, targets, reduction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::utils::testing::{assert_gradients, create_test_array, grad_data};
    use approx::assert_relative_eq;

    #[test]
    fn test_nll_picks_target_log_probs() {
        let ctx = Context::with_seed(0);
        let mut g = Graph::train(&ctx);
        let lp = g.variable(create_test_array(vec![-0.1, -2.0, -3.0, -1.0, -0.5, -4.0], vec![2, 3]));
        let loss = nll_loss(&mut g, lp, &[0, 1], Reduction::Mean).unwrap();
        assert_relative_eq!(g.item(loss).unwrap(), 0.3, epsilon = 1e-12);
        g.backward(loss).unwrap();
        assert_eq!(grad_data(&g, lp), vec![-0.5, 0.0, 0.0, 0.0, -0.5, 0.0]);
    }

    #[test]
    fn test_nll_rejects_bad_targets() {
        let ctx = Context::with_seed(0);
        let mut g = Graph::train(&ctx);
        let lp = g.variable(ctx.zeros(&[2, 3]));
        assert!(nll_loss(&mut g, lp, &[0], Reduction::Mean).unwrap_err().is_shape_error());
        assert!(matches!(
            nll_loss(&mut g, lp, &[0, 3], Reduction::Mean),
            Err(GradflowError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_cross_entropy_gradient_is_softmax_minus_onehot() {
        let ctx = Context::with_seed(0);
        let mut g = Graph::train(&ctx);
        let logits = g.variable(create_test_array(vec![1.0, 2.0, 0.5], vec![1, 3]));
        let loss = cross_entropy(&mut g, logits, &[2], Reduction::Sum).unwrap();
        g.backward(loss).unwrap();
        let z: f64 = [1.0f64, 2.0, 0.5].iter().map(|v| v.exp()).sum();
        let expected = [1.0f64.exp() / z, 2.0f64.exp() / z, 0.5f64.exp() / z - 1.0];
        for (a, e) in grad_data(&g, logits).iter().zip(expected) {
            assert_relative_eq!(*a, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_cross_entropy_gradient_numerically() {
        let logits = create_test_array(vec![0.2, -1.0, 0.7, 1.5, 0.0, -0.3], vec![2, 3]);
        assert_gradients(&[logits], |g, xs| cross_entropy(g, xs[0], &[1, 0], Reduction::Mean));
    }
}
