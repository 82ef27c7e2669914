use crate::array::NdArray;
use crate::autograd::{BackFunction, Graph, Op, TensorId};
use crate::error::{GradflowError, Result};

impl Graph<'_> {
    /// Inverted dropout with drop probability `p`.
    ///
    /// In training mode a mask of `1 / (1 - p)` or `0` entries is drawn from
    /// the context RNG and kept in the node for the backward pass. In eval
    /// mode `x` is returned as is.
    pub fn dropout(&mut self, x: TensorId, p: f64) -> Result<TensorId> {
        if !(0.0..=1.0).contains(&p) {
            return Err(GradflowError::ConfigurationError(format!(
                "dropout probability must be in [0, 1], got {}",
                p
            )));
        }
        if !self.is_training() {
            return Ok(x);
        }
        let input = self.value(x)?;
        let mask = self.ctx().dropout_mask(input.shape(), 1.0 - p);
        let value = input.mul(&mask)?;
        Ok(self.record(value, Op::Dropout { input: x, mask }))
    }
}

pub(crate) fn dropout_backward(g: &Graph<'_>, x: TensorId, mask: &NdArray, grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    Ok(vec![BackFunction::additive(x, grad.mul(mask)?)])
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::utils::testing::{create_test_array, grad_data};

    use super::*;

    #[test]
    fn test_mask_is_replayed_in_backward() {
        let ctx = Context::with_seed(7);
        let mut g = Graph::train(&ctx);
        let x = g.variable(create_test_array((1..=64).map(f64::from).collect(), vec![8, 8]));
        let y = g.dropout(x, 0.5).unwrap();
        let s = g.sum(y).unwrap();
        g.backward(s).unwrap();

        let out = g.value(y).unwrap().data().to_vec();
        let grad = grad_data(&g, x);
        let input = g.value(x).unwrap().data().to_vec();
        let mut kept = 0;
        for i in 0..64 {
            if grad[i] == 0.0 {
                assert_eq!(out[i], 0.0);
            } else {
                assert_eq!(grad[i], 2.0);
                assert_eq!(out[i], input[i] * 2.0);
                kept += 1;
            }
        }
        assert!(kept > 0 && kept < 64);
    }

    #[test]
    fn test_same_seed_same_mask() {
        let draw = || {
            let ctx = Context::with_seed(3);
            let mut g = Graph::train(&ctx);
            let x = g.constant(NdArray::ones(&[20]));
            let y = g.dropout(x, 0.3).unwrap();
            g.value(y).unwrap().clone()
        };
        assert_eq!(draw(), draw());
    }

    #[test]
    fn test_eval_is_identity() {
        let ctx = Context::with_seed(0);
        let mut g = Graph::eval(&ctx);
        let x = g.variable(NdArray::ones(&[4]));
        let before = g.len();
        assert_eq!(g.dropout(x, 0.9).unwrap(), x);
        assert_eq!(g.len(), before);
    }

    #[test]
    fn test_probability_bounds() {
        let ctx = Context::with_seed(0);
        let mut g = Graph::train(&ctx);
        let x = g.variable(NdArray::ones(&[5]));
        let all = g.dropout(x, 1.0).unwrap();
        assert_eq!(g.value(all).unwrap().data(), &[0.0; 5]);
        let none = g.dropout(x, 0.0).unwrap();
        assert_eq!(g.value(none).unwrap().data(), &[1.0; 5]);
        assert!(matches!(g.dropout(x, 1.5), Err(GradflowError::ConfigurationError(_))));
        assert!(g.dropout(x, -0.1).is_err());
    }
}
