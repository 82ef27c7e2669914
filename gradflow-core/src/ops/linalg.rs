use crate::array::NdArray;
use crate::autograd::{BackFunction, Graph, Op, TensorId};
use crate::error::Result;

impl Graph<'_> {
    /// Matrix product of `[m, k]` and `[k, n]`.
    pub fn matmul(&mut self, a: TensorId, b: TensorId) -> Result<TensorId> {
        let value = self.value(a)?.matmul(self.value(b)?)?;
        Ok(self.record(value, Op::MatMul(a, b)))
    }

    /// Batched vector-times-matrix product, see [`NdArray::bvtm`].
    pub fn bvtm(&mut self, vectors: TensorId, matrices: TensorId) -> Result<TensorId> {
        let value = self.value(vectors)?.bvtm(self.value(matrices)?)?;
        Ok(self.record(value, Op::Bvtm(vectors, matrices)))
    }
}

pub(crate) fn matmul_backward(g: &Graph<'_>, a: TensorId, b: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    let mut out = Vec::with_capacity(2);
    if g.needs_grad(a) {
        let bt = g.value(b)?.transpose2d()?;
        out.push(BackFunction::additive(a, grad.matmul(&bt)?));
    }
    if g.needs_grad(b) {
        let at = g.value(a)?.transpose2d()?;
        out.push(BackFunction::additive(b, at.matmul(grad)?));
    }
    Ok(out)
}

pub(crate) fn bvtm_backward(g: &Graph<'_>, a: TensorId, b: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    let (needs_a, needs_b) = (g.needs_grad(a), g.needs_grad(b));
    if !needs_a && !needs_b {
        return Ok(vec![]);
    }
    let (da, db) = g.value(a)?.bvtm_grads(g.value(b)?, grad)?;
    let mut out = Vec::with_capacity(2);
    if needs_a {
        out.push(BackFunction::additive(a, da));
    }
    if needs_b {
        out.push(BackFunction::additive(b, db));
    }
    Ok(out)
}
