use crate::array::NdArray;
use crate::autograd::{BackFunction, Graph, Op, TensorId};
use crate::error::{GradflowError, Result};

impl Graph<'_> {
    pub fn exp(&mut self, x: TensorId) -> Result<TensorId> {
        let value = self.value(x)?.map(f64::exp);
        Ok(self.record(value, Op::Exp(x)))
    }

    /// Natural logarithm. Non-positive inputs give `-inf` or NaN.
    pub fn log(&mut self, x: TensorId) -> Result<TensorId> {
        let value = self.value(x)?.map(f64::ln);
        Ok(self.record(value, Op::Log { input: x, eps: None }))
    }

    /// `log(max(x, eps))`; the gradient is zero where `x` was clamped.
    pub fn log_eps(&mut self, x: TensorId, eps: f64) -> Result<TensorId> {
        if !(eps > 0.0) {
            return Err(GradflowError::ConfigurationError(format!("log epsilon must be positive, got {}", eps)));
        }
        let value = self.value(x)?.map(|v| v.max(eps).ln());
        Ok(self.record(value, Op::Log { input: x, eps: Some(eps) }))
    }

    pub fn sqrt(&mut self, x: TensorId) -> Result<TensorId> {
        let value = self.value(x)?.map(f64::sqrt);
        Ok(self.record(value, Op::Sqrt(x)))
    }

    /// Element-wise square.
    pub fn sqr(&mut self, x: TensorId) -> Result<TensorId> {
        let value = self.value(x)?.map(|v| v * v);
        Ok(self.record(value, Op::Sqr(x)))
    }
}

pub(crate) fn exp_backward(g: &Graph<'_>, id: TensorId, x: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let delta = grad.mul(g.value(id)?)?;
    Ok(vec![BackFunction::additive(x, delta)])
}

pub(crate) fn log_backward(g: &Graph<'_>, x: TensorId, eps: Option<f64>, grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let delta = match eps {
        Some(eps) => grad.zip_map(g.value(x)?, "log backward", |gr, v| if v > eps { gr / v } else { 0.0 })?,
        None => grad.zip_map(g.value(x)?, "log backward", |gr, v| gr / v)?,
    };
    Ok(vec![BackFunction::additive(x, delta)])
}

pub(crate) fn sqrt_backward(g: &Graph<'_>, id: TensorId, x: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let delta = grad.zip_map(g.value(id)?, "sqrt backward", |gr, y| gr * 0.5 / y)?;
    Ok(vec![BackFunction::additive(x, delta)])
}

pub(crate) fn sqr_backward(g: &Graph<'_>, x: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let delta = grad.zip_map(g.value(x)?, "sqr backward", |gr, v| 2.0 * v * gr)?;
    Ok(vec![BackFunction::additive(x, delta)])
}

#[cfg(test)]
#[path = "math_elem_test.rs"]
mod tests;
