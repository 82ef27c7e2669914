use crate::array::NdArray;
use crate::autograd::{BackFunction, Compare, Graph, Op, TensorId};
use crate::error::Result;

impl Graph<'_> {
    /// Keeps `x` where `cmp(x, threshold)` holds and writes 0 elsewhere.
    pub fn compare_true(&mut self, x: TensorId, cmp: Compare, threshold: f64) -> Result<TensorId> {
        self.masked(x, |v| cmp.test(v, threshold))
    }

    /// Keeps `x` where `cmp(x, threshold)` fails and writes 0 elsewhere.
    pub fn compare_false(&mut self, x: TensorId, cmp: Compare, threshold: f64) -> Result<TensorId> {
        self.masked(x, |v| !cmp.test(v, threshold))
    }

    fn masked(&mut self, x: TensorId, keep: impl Fn(f64) -> bool) -> Result<TensorId> {
        let input = self.value(x)?;
        let mask = input.map(|v| if keep(v) { 1.0 } else { 0.0 });
        let value = input.mul(&mask)?;
        Ok(self.record(value, Op::Compare { input: x, mask }))
    }
}

pub(crate) fn compare_backward(g: &Graph<'_>, x: TensorId, mask: &NdArray, grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    Ok(vec![BackFunction::additive(x, grad.mul(mask)?)])
}
