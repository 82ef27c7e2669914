use crate::array::NdArray;
use crate::autograd::{BackFunction, Graph, Op, TensorId};
use crate::error::Result;

fn sigmoid(v: f64) -> f64 {
    if v >= 0.0 {
        1.0 / (1.0 + (-v).exp())
    } else {
        let e = v.exp();
        e / (1.0 + e)
    }
}

impl Graph<'_> {
    pub fn sigmoid(&mut self, x: TensorId) -> Result<TensorId> {
        let value = self.value(x)?.map(sigmoid);
        Ok(self.record(value, Op::Sigmoid(x)))
    }

    pub fn tanh(&mut self, x: TensorId) -> Result<TensorId> {
        let value = self.value(x)?.map(f64::tanh);
        Ok(self.record(value, Op::Tanh(x)))
    }

    /// `max(x, threshold)`; the gradient passes where `x > threshold`.
    pub fn max(&mut self, x: TensorId, threshold: f64) -> Result<TensorId> {
        let value = self.value(x)?.map(|v| if v > threshold { v } else { threshold });
        Ok(self.record(value, Op::Max { input: x, threshold }))
    }

    pub fn relu(&mut self, x: TensorId) -> Result<TensorId> {
        self.max(x, 0.0)
    }

    /// Softmax along `axis`, computed with the lane maximum subtracted.
    pub fn softmax(&mut self, x: TensorId, axis: usize) -> Result<TensorId> {
        let value = self.value(x)?.map_lanes(axis, |lane| {
            let max = lane.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let mut total = 0.0;
            for v in lane.iter_mut() {
                *v = (*v - max).exp();
                total += *v;
            }
            for v in lane.iter_mut() {
                *v /= total;
            }
        })?;
        Ok(self.record(value, Op::Softmax { input: x, axis }))
    }

    /// Log of the softmax along `axis`, via log-sum-exp.
    pub fn log_softmax(&mut self, x: TensorId, axis: usize) -> Result<TensorId> {
        let value = self.value(x)?.map_lanes(axis, |lane| {
            let max = lane.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let lse = max + lane.iter().map(|v| (v - max).exp()).sum::<f64>().ln();
            for v in lane.iter_mut() {
                *v -= lse;
            }
        })?;
        Ok(self.record(value, Op::LogSoftmax { input: x, axis }))
    }
}

pub(crate) fn sigmoid_backward(g: &Graph<'_>, id: TensorId, x: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let delta = grad.zip_map(g.value(id)?, "sigmoid backward", |gr, y| gr * y * (1.0 - y))?;
    Ok(vec![BackFunction::additive(x, delta)])
}

pub(crate) fn tanh_backward(g: &Graph<'_>, id: TensorId, x: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let delta = grad.zip_map(g.value(id)?, "tanh backward", |gr, y| gr * (1.0 - y * y))?;
    Ok(vec![BackFunction::additive(x, delta)])
}

pub(crate) fn max_backward(g: &Graph<'_>, x: TensorId, threshold: f64, grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let delta = grad.zip_map(g.value(x)?, "max backward", |gr, v| if v > threshold { gr } else { 0.0 })?;
    Ok(vec![BackFunction::additive(x, delta)])
}

pub(crate) fn softmax_backward(
    g: &Graph<'_>,
    id: TensorId,
    x: TensorId,
    axis: usize,
    grad: &NdArray,
) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    // dx = y * (g - sum(g * y))
    let y = g.value(id)?;
    let gy = grad.mul(y)?;
    let dot = gy.sum_axis(axis, true)?;
    let delta = grad.sub(&dot)?.mul(y)?;
    Ok(vec![BackFunction::additive(x, delta)])
}

pub(crate) fn log_softmax_backward(
    g: &Graph<'_>,
    id: TensorId,
    x: TensorId,
    axis: usize,
    grad: &NdArray,
) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    // dx = g - softmax * sum(g)
    let softmax = g.value(id)?.map(f64::exp);
    let total = grad.sum_axis(axis, true)?;
    let delta = grad.sub(&softmax.mul(&total)?)?;
    Ok(vec![BackFunction::additive(x, delta)])
}

#[cfg(test)]
#[path = "activation_test.rs"]
mod tests;
