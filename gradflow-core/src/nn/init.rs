//! In-place weight initialization drawing from the context RNG.
//!
//! Weights are laid out `[fan_in, fan_out, ...]`, so for a rank-2 weight the
//! first dimension is the number of inputs.

use crate::array::NdArray;
use crate::context::Context;
use crate::error::{GradflowError, Result};
use crate::nn::parameter::Parameter;

/// Fills `param` with 0.
pub fn zeros_(param: &Parameter) {
    fill_inplace(param, 0.0)
}

/// Fills `param` with 1.
pub fn ones_(param: &Parameter) {
    fill_inplace(param, 1.0)
}

fn fill_inplace(param: &Parameter, value: f64) {
    let dtype = param.with_value(|v| v.dtype());
    let shape = param.shape();
    param.reset_value(NdArray::full(&shape, value, dtype));
}

/// Draws every entry from `U(low, high)`.
pub fn uniform_(ctx: &Context, param: &Parameter, low: f64, high: f64) -> Result<()> {
    let dtype = param.with_value(|v| v.dtype());
    let value = ctx.rand_uniform(&param.shape(), low, high)?.cast(dtype);
    param.reset_value(value);
    Ok(())
}

/// Draws every entry from `N(mean, std²)`.
pub fn normal_(ctx: &Context, param: &Parameter, mean: f64, std: f64) -> Result<()> {
    let dtype = param.with_value(|v| v.dtype());
    let value = ctx.randn(&param.shape(), mean, std)?.cast(dtype);
    param.reset_value(value);
    Ok(())
}

/// Returns `(fan_in, fan_out)` for a weight of rank 2 or more. Trailing
/// dimensions count as the receptive field.
pub fn compute_fans(shape: &[usize]) -> Result<(usize, usize)> {
    if shape.len() < 2 {
        return Err(GradflowError::UnsupportedOperation(format!(
            "fan computation needs rank >= 2, got shape {:?}",
            shape
        )));
    }
    let receptive: usize = shape[2..].iter().product();
    Ok((shape[0] * receptive, shape[1] * receptive))
}

/// Glorot uniform: `U(-a, a)` with `a = gain * sqrt(6 / (fan_in + fan_out))`.
pub fn xavier_uniform_(ctx: &Context, param: &Parameter, gain: f64) -> Result<()> {
    let (fan_in, fan_out) = compute_fans(&param.shape())?;
    let bound = gain * (6.0 / (fan_in + fan_out) as f64).sqrt();
    uniform_(ctx, param, -bound, bound)
}

/// He uniform for a leaky-ReLU slope `a`:
/// `U(-b, b)` with `b = sqrt(2 / (1 + a²)) * sqrt(3 / fan_in)`.
///
/// `a = sqrt(5)` gives the `1 / sqrt(fan_in)` bound used by [`Linear`](crate::nn::Linear).
pub fn kaiming_uniform_(ctx: &Context, param: &Parameter, a: f64) -> Result<()> {
    let (fan_in, _) = compute_fans(&param.shape())?;
    if fan_in == 0 {
        return Err(GradflowError::ConfigurationError(
            "kaiming init needs a non-empty fan in".to_string(),
        ));
    }
    let gain = (2.0 / (1.0 + a * a)).sqrt();
    let bound = gain * (3.0 / fan_in as f64).sqrt();
    uniform_(ctx, param, -bound, bound)
}

#[cfg(test)]
#[path = "init_test.rs"]
mod tests;
