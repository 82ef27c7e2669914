use crate::array::NdArray;
use crate::autograd::{BackFunction, Graph, Op, Reduce, TensorId};
use crate::error::{GradflowError, Result};

/// Layout of a grouped reduction over an input shape.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Group {
    /// Input shape with every reduced dimension set to 1.
    pub keep: Vec<usize>,
    /// Shape of the reduced output.
    pub out: Vec<usize>,
    /// Number of elements in each group.
    pub n: usize,
}

impl Group {
    pub(crate) fn resolve(shape: &[usize], reduce: &Reduce) -> Result<Group> {
        match reduce {
            Reduce::Axis(axis) => {
                if *axis >= shape.len() {
                    return Err(GradflowError::InvalidAxis {
                        axis: *axis,
                        rank: shape.len(),
                    });
                }
                let mut keep = shape.to_vec();
                keep[*axis] = 1;
                let mut out = shape.to_vec();
                out.remove(*axis);
                Ok(Group { keep, out, n: shape[*axis] })
            }
            Reduce::On(on) => {
                if on.len() > shape.len() || shape[shape.len() - on.len()..] != on[..] {
                    return Err(GradflowError::shape_mismatch(on, shape, "reduce on trailing dims"));
                }
                let lead = shape.len() - on.len();
                let mut keep = shape[..lead].to_vec();
                keep.extend(std::iter::repeat(1).take(on.len()));
                Ok(Group {
                    keep,
                    out: shape[..lead].to_vec(),
                    n: on.iter().product(),
                })
            }
        }
    }

    /// Per-group sums of `x`, shaped `keep`.
    pub(crate) fn sum(&self, x: &NdArray) -> Result<NdArray> {
        x.reduce_to_shape(&self.keep)
    }

    /// Per-group means of `x`, shaped `keep`.
    pub(crate) fn mean(&self, x: &NdArray) -> Result<NdArray> {
        Ok(self.sum(x)?.scale(1.0 / self.n as f64))
    }
}

impl Graph<'_> {
    /// Sum of every element, as a rank-0 tensor.
    pub fn sum(&mut self, x: TensorId) -> Result<TensorId> {
        let v = self.value(x)?;
        let value = NdArray::full(&[], v.sum_all(), v.dtype());
        Ok(self.record(value, Op::Sum(x)))
    }

    /// Sum along `axis`, which is removed.
    pub fn sum1d(&mut self, x: TensorId, axis: usize) -> Result<TensorId> {
        let value = self.value(x)?.sum_axis(axis, false)?;
        Ok(self.record(value, Op::Sum1d { input: x, axis }))
    }

    /// Mean along `axis`, which is removed.
    pub fn mean1d(&mut self, x: TensorId, axis: usize) -> Result<TensorId> {
        let value = self.value(x)?.mean_axis(axis, false)?;
        Ok(self.record(value, Op::Mean1d { input: x, axis }))
    }

    /// Mean over the trailing dimensions equal to `shape`; the leading
    /// dimensions remain.
    pub fn mean_on(&mut self, x: TensorId, shape: &[usize]) -> Result<TensorId> {
        let v = self.value(x)?;
        let group = Group::resolve(v.shape(), &Reduce::On(shape.to_vec()))?;
        let value = group.mean(v)?.reshape(&group.out)?;
        Ok(self.record(
            value,
            Op::MeanOn {
                input: x,
                shape: shape.to_vec(),
            },
        ))
    }

    /// Mean of every element, as a rank-0 tensor.
    pub fn mean(&mut self, x: TensorId) -> Result<TensorId> {
        let shape = self.shape(x)?.to_vec();
        self.mean_on(x, &shape)
    }
}

pub(crate) fn sum_backward(g: &Graph<'_>, x: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let v = g.value(x)?;
    let delta = NdArray::full(v.shape(), grad.item()?, v.dtype());
    Ok(vec![BackFunction::additive(x, delta)])
}

/// Shared by `Sum1d` (`scale = 1`) and `Mean1d` (`scale = 1/n`).
pub(crate) fn sum1d_backward(
    g: &Graph<'_>,
    x: TensorId,
    axis: usize,
    grad: &NdArray,
    scale: f64,
) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let shape = g.shape(x)?;
    let mut delta = grad.insert_axis(axis)?.broadcast_to(shape)?;
    if scale != 1.0 {
        delta.mul_scalar_(scale);
    }
    Ok(vec![BackFunction::additive(x, delta)])
}

pub(crate) fn mean_on_backward(g: &Graph<'_>, x: TensorId, on: &[usize], grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let shape = g.shape(x)?;
    let group = Group::resolve(shape, &Reduce::On(on.to_vec()))?;
    let delta = grad.reshape(&group.keep)?.broadcast_to(shape)?.scale(1.0 / group.n as f64);
    Ok(vec![BackFunction::additive(x, delta)])
}

#[cfg(test)]
#[path = "reduction_test.rs"]
mod tests;
