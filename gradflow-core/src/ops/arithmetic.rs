use crate::array::NdArray;
use crate::autograd::{BackFunction, Graph, Op, TensorId};
use crate::error::Result;
use crate::ops::unbroadcast;

impl Graph<'_> {
    /// Element-wise `a + b` with broadcasting.
    pub fn add(&mut self, a: TensorId, b: TensorId) -> Result<TensorId> {
        let value = self.value(a)?.add(self.value(b)?)?;
        Ok(self.record(value, Op::Add(a, b)))
    }

    /// Element-wise `a - b` with broadcasting.
    pub fn sub(&mut self, a: TensorId, b: TensorId) -> Result<TensorId> {
        let value = self.value(a)?.sub(self.value(b)?)?;
        Ok(self.record(value, Op::Sub(a, b)))
    }

    /// Element-wise `a * b` with broadcasting.
    pub fn mul(&mut self, a: TensorId, b: TensorId) -> Result<TensorId> {
        let value = self.value(a)?.mul(self.value(b)?)?;
        Ok(self.record(value, Op::Mul(a, b)))
    }

    /// Element-wise `a / b` with broadcasting. Division by zero yields
    /// infinities or NaN as IEEE-754 prescribes.
    pub fn div(&mut self, a: TensorId, b: TensorId) -> Result<TensorId> {
        let value = self.value(a)?.div(self.value(b)?)?;
        Ok(self.record(value, Op::Div(a, b)))
    }

    pub fn neg(&mut self, x: TensorId) -> Result<TensorId> {
        let value = self.value(x)?.neg();
        Ok(self.record(value, Op::Neg(x)))
    }

    /// New node with the same value; gradients pass through unchanged.
    pub fn identity(&mut self, x: TensorId) -> Result<TensorId> {
        let value = self.value(x)?.clone();
        Ok(self.record(value, Op::Identity(x)))
    }

    /// Rank-0 constant in the dtype of `x`.
    fn scalar_like(&mut self, x: TensorId, value: f64) -> Result<TensorId> {
        let dtype = self.value(x)?.dtype();
        Ok(self.constant(NdArray::full(&[], value, dtype)))
    }

    pub fn add_scalar(&mut self, x: TensorId, value: f64) -> Result<TensorId> {
        let s = self.scalar_like(x, value)?;
        self.add(x, s)
    }

    pub fn sub_scalar(&mut self, x: TensorId, value: f64) -> Result<TensorId> {
        let s = self.scalar_like(x, value)?;
        self.sub(x, s)
    }

    pub fn mul_scalar(&mut self, x: TensorId, value: f64) -> Result<TensorId> {
        let s = self.scalar_like(x, value)?;
        self.mul(x, s)
    }

    pub fn div_scalar(&mut self, x: TensorId, value: f64) -> Result<TensorId> {
        let s = self.scalar_like(x, value)?;
        self.div(x, s)
    }
}

pub(crate) fn identity_backward(g: &Graph<'_>, x: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    Ok(if g.needs_grad(x) {
        vec![BackFunction::additive(x, grad.clone())]
    } else {
        vec![]
    })
}

pub(crate) fn neg_backward(g: &Graph<'_>, x: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    Ok(if g.needs_grad(x) {
        vec![BackFunction::additive(x, grad.neg())]
    } else {
        vec![]
    })
}

pub(crate) fn add_backward(g: &Graph<'_>, a: TensorId, b: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    let mut out = Vec::with_capacity(2);
    if g.needs_grad(a) {
        out.push(unbroadcast(g, a, grad.clone())?);
    }
    if g.needs_grad(b) {
        out.push(unbroadcast(g, b, grad.clone())?);
    }
    Ok(out)
}

pub(crate) fn sub_backward(g: &Graph<'_>, a: TensorId, b: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    let mut out = Vec::with_capacity(2);
    if g.needs_grad(a) {
        out.push(unbroadcast(g, a, grad.clone())?);
    }
    if g.needs_grad(b) {
        out.push(unbroadcast(g, b, grad.neg())?);
    }
    Ok(out)
}

pub(crate) fn mul_backward(g: &Graph<'_>, a: TensorId, b: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    let mut out = Vec::with_capacity(2);
    if g.needs_grad(a) {
        out.push(unbroadcast(g, a, grad.mul(g.value(b)?)?)?);
    }
    if g.needs_grad(b) {
        out.push(unbroadcast(g, b, grad.mul(g.value(a)?)?)?);
    }
    Ok(out)
}

pub(crate) fn div_backward(g: &Graph<'_>, a: TensorId, b: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
    let (av, bv) = (g.value(a)?, g.value(b)?);
    let mut out = Vec::with_capacity(2);
    if g.needs_grad(a) {
        out.push(unbroadcast(g, a, grad.div(bv)?)?);
    }
    if g.needs_grad(b) {
        // d(a/b)/db = -a / b^2
        let local = av.broadcast_zip(bv, |x, y| -x / (y * y))?;
        out.push(unbroadcast(g, b, grad.mul(&local)?)?);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "arithmetic_test.rs"]
mod tests;
