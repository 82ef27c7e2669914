use crate::array::NdArray;
use crate::autograd::{BackFunction, Graph, Op, TensorId};
use crate::error::{GradflowError, Result};

impl Graph<'_> {
    /// Same values under a new shape with the same element count.
    pub fn reshape(&mut self, x: TensorId, shape: &[usize]) -> Result<TensorId> {
        let value = self.value(x)?.reshape(shape)?;
        Ok(self.record(value, Op::Reshape(x)))
    }

    /// Slice `start..end` along `axis`.
    pub fn narrow(&mut self, x: TensorId, axis: usize, start: usize, end: usize) -> Result<TensorId> {
        let value = self.value(x)?.narrow(axis, start, end)?;
        Ok(self.record(value, Op::Narrow { input: x, axis, start }))
    }

    /// Splits along `axis` at the given increasing start indices. A first
    /// index of 0 is implied; each piece runs to the next index or the end.
    pub fn split(&mut self, x: TensorId, axis: usize, indices: &[usize]) -> Result<Vec<TensorId>> {
        let size = self.value(x)?.dim(axis)?;
        let mut bounds = Vec::with_capacity(indices.len() + 2);
        bounds.push(0);
        bounds.extend(indices.iter().copied().filter(|&i| i != 0));
        bounds.push(size);
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GradflowError::UsageError(format!(
                "split indices {:?} must be increasing and below {}",
                indices, size
            )));
        }
        bounds
            .windows(2)
            .map(|w| self.narrow(x, axis, w[0], w[1]))
            .collect()
    }

    /// Concatenates along `axis`; every other dimension must agree.
    pub fn cat(&mut self, xs: &[TensorId], axis: usize) -> Result<TensorId> {
        let values = xs.iter().map(|&x| self.value(x)).collect::<Result<Vec<_>>>()?;
        let value = NdArray::cat(&values, axis)?;
        Ok(self.record(
            value,
            Op::Cat {
                inputs: xs.to_vec(),
                axis,
            },
        ))
    }

    /// Picks values along `axis` at integral positions held by `index`,
    /// which has the rank of `x` and its sizes off `axis`.
    pub fn gather(&mut self, x: TensorId, axis: usize, index: &NdArray) -> Result<TensorId> {
        let value = self.value(x)?.gather(axis, index)?;
        Ok(self.record(
            value,
            Op::Gather {
                input: x,
                axis,
                index: index.clone(),
            },
        ))
    }

    /// Inserts a new axis of size 1 at `axis`.
    pub fn stretch(&mut self, x: TensorId, axis: usize) -> Result<TensorId> {
        let value = self.value(x)?.insert_axis(axis)?;
        Ok(self.record(value, Op::Stretch(x)))
    }
}

/// Reshape and Stretch: the gradient takes the operand's shape back.
pub(crate) fn reshape_backward(g: &Graph<'_>, x: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    Ok(vec![BackFunction::additive(x, grad.reshape(g.shape(x)?)?)])
}

pub(crate) fn narrow_backward(
    g: &Graph<'_>,
    x: TensorId,
    axis: usize,
    start: usize,
    grad: &NdArray,
) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let grad = grad.clone();
    Ok(vec![BackFunction::updating(x, move |buffer| {
        buffer.narrow_add_(axis, start, &grad)
    })])
}

pub(crate) fn cat_backward(g: &Graph<'_>, xs: &[TensorId], axis: usize, grad: &NdArray) -> Result<Vec<BackFunction>> {
    let mut out = Vec::with_capacity(xs.len());
    let mut offset = 0;
    for &x in xs {
        let width = g.value(x)?.dim(axis)?;
        if g.needs_grad(x) {
            out.push(BackFunction::additive(x, grad.narrow(axis, offset, offset + width)?));
        }
        offset += width;
    }
    Ok(out)
}

pub(crate) fn gather_backward(
    g: &Graph<'_>,
    x: TensorId,
    axis: usize,
    index: &NdArray,
    grad: &NdArray,
) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let (index, grad) = (index.clone(), grad.clone());
    Ok(vec![BackFunction::updating(x, move |buffer| {
        buffer.scatter_add_(axis, &index, &grad)
    })])
}

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;
