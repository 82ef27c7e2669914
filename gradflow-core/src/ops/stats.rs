//! Standard deviation and standardisation over an axis or trailing dims.
//!
//! For a group of `n` elements, `var = sum((x - mean)^2) / (n - ddof)` and
//! `std = sqrt(var + eps)`.

use crate::array::NdArray;
use crate::autograd::{BackFunction, Graph, Op, Reduce, TensorId};
use crate::error::{GradflowError, Result};
use crate::ops::reduction::Group;

/// Epsilon added to the variance by `std1d` and `std_on`.
pub const DEFAULT_STD_EPS: f64 = 1e-3;

/// Deviations from the mean and `sqrt(var + eps)` per group (shaped `keep`).
fn moments(x: &NdArray, group: &Group, ddof: usize, eps: f64, mean: Option<&NdArray>) -> Result<(NdArray, NdArray)> {
    let mu = match mean {
        Some(m) => m.reshape(&group.keep)?,
        None => group.mean(x)?,
    };
    let centered = x.sub(&mu)?;
    let denom = (group.n - ddof) as f64;
    let sigma = group
        .sum(&centered.map(|v| v * v))?
        .map(|ss| (ss / denom + eps).sqrt());
    Ok((centered, sigma))
}

fn check_ddof(group: &Group, ddof: usize) -> Result<()> {
    if ddof >= group.n {
        return Err(GradflowError::ConfigurationError(format!(
            "ddof {} leaves no degrees of freedom for groups of {} elements",
            ddof, group.n
        )));
    }
    Ok(())
}

impl Graph<'_> {
    /// Standard deviation along `axis` (removed), with `ddof = 0` and the
    /// default epsilon.
    pub fn std1d(&mut self, x: TensorId, axis: usize) -> Result<TensorId> {
        self.std_with(x, Reduce::Axis(axis), 0, DEFAULT_STD_EPS, None)
    }

    /// Standard deviation along `axis`. A supplied `mean` must have the
    /// output shape and receives a gradient as well.
    pub fn std1d_with(
        &mut self,
        x: TensorId,
        axis: usize,
        ddof: usize,
        eps: f64,
        mean: Option<TensorId>,
    ) -> Result<TensorId> {
        self.std_with(x, Reduce::Axis(axis), ddof, eps, mean)
    }

    /// Standard deviation over the trailing dimensions equal to `shape`.
    pub fn std_on(&mut self, x: TensorId, shape: &[usize]) -> Result<TensorId> {
        self.std_with(x, Reduce::On(shape.to_vec()), 0, DEFAULT_STD_EPS, None)
    }

    pub fn std_on_with(
        &mut self,
        x: TensorId,
        shape: &[usize],
        ddof: usize,
        eps: f64,
        mean: Option<TensorId>,
    ) -> Result<TensorId> {
        self.std_with(x, Reduce::On(shape.to_vec()), ddof, eps, mean)
    }

    fn std_with(&mut self, x: TensorId, reduce: Reduce, ddof: usize, eps: f64, mean: Option<TensorId>) -> Result<TensorId> {
        let xv = self.value(x)?;
        let group = Group::resolve(xv.shape(), &reduce)?;
        check_ddof(&group, ddof)?;
        let mean_value = match mean {
            Some(m) => {
                let mv = self.value(m)?;
                if mv.shape() != group.out.as_slice() {
                    return Err(GradflowError::shape_mismatch(&group.out, mv.shape(), "std mean"));
                }
                Some(mv)
            }
            None => None,
        };
        let (_, sigma) = moments(xv, &group, ddof, eps, mean_value)?;
        let value = sigma.reshape(&group.out)?;
        Ok(self.record(
            value,
            Op::Std {
                input: x,
                mean,
                reduce,
                ddof,
                eps,
            },
        ))
    }

    /// `(x - mean) / sqrt(var + eps)` along `axis`; the shape is unchanged.
    pub fn standardize1d(&mut self, x: TensorId, axis: usize, ddof: usize, eps: f64) -> Result<TensorId> {
        self.standardize_with(x, Reduce::Axis(axis), ddof, eps)
    }

    /// `(x - mean) / sqrt(var + eps)` over the trailing dimensions equal to
    /// `shape`; the shape is unchanged.
    pub fn standardize_on(&mut self, x: TensorId, shape: &[usize], ddof: usize, eps: f64) -> Result<TensorId> {
        self.standardize_with(x, Reduce::On(shape.to_vec()), ddof, eps)
    }

    fn standardize_with(&mut self, x: TensorId, reduce: Reduce, ddof: usize, eps: f64) -> Result<TensorId> {
        let xv = self.value(x)?;
        let group = Group::resolve(xv.shape(), &reduce)?;
        check_ddof(&group, ddof)?;
        let (centered, sigma) = moments(xv, &group, ddof, eps, None)?;
        let value = centered.div(&sigma)?;
        Ok(self.record(
            value,
            Op::Standardize {
                input: x,
                reduce,
                ddof,
                eps,
            },
        ))
    }
}

pub(crate) fn std_backward(
    g: &Graph<'_>,
    id: TensorId,
    x: TensorId,
    mean: Option<TensorId>,
    reduce: &Reduce,
    ddof: usize,
    grad: &NdArray,
) -> Result<Vec<BackFunction>> {
    let xv = g.value(x)?;
    let group = Group::resolve(xv.shape(), reduce)?;
    let mu = match mean {
        Some(m) => g.value(m)?.reshape(&group.keep)?,
        None => group.mean(xv)?,
    };
    let centered = xv.sub(&mu)?;
    // d std / d x_i = (x_i - mean) / ((n - ddof) * std). With the group's own
    // mean, the term through the mean sums to zero.
    let denom = (group.n - ddof) as f64;
    let std = g.value(id)?.reshape(&group.keep)?;
    let coef = grad
        .reshape(&group.keep)?
        .zip_map(&std, "std backward", |gr, s| gr / (denom * s))?;
    let dx = centered.mul(&coef)?;

    let mut out = Vec::with_capacity(2);
    if let Some(m) = mean {
        if g.needs_grad(m) {
            let dm = group.sum(&dx)?.neg().reshape(&group.out)?;
            out.push(BackFunction::additive(m, dm));
        }
    }
    if g.needs_grad(x) {
        out.push(BackFunction::additive(x, dx));
    }
    Ok(out)
}

pub(crate) fn standardize_backward(
    g: &Graph<'_>,
    id: TensorId,
    x: TensorId,
    reduce: &Reduce,
    ddof: usize,
    eps: f64,
    grad: &NdArray,
) -> Result<Vec<BackFunction>> {
    if !g.needs_grad(x) {
        return Ok(vec![]);
    }
    let xv = g.value(x)?;
    let group = Group::resolve(xv.shape(), reduce)?;
    let (_, sigma) = moments(xv, &group, ddof, eps, None)?;
    let y = g.value(id)?;
    // dx = (g - mean(g) - y * sum(g * y) / (n - ddof)) / sigma
    let mean_g = group.mean(grad)?;
    let dot = group.sum(&grad.mul(y)?)?.scale(1.0 / (group.n - ddof) as f64);
    let dx = grad.sub(&mean_g)?.sub(&y.mul(&dot)?)?.div(&sigma)?;
    Ok(vec![BackFunction::additive(x, dx)])
}

#[cfg(test)]
#[path = "stats_test.rs"]
mod tests;
