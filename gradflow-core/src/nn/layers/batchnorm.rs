use crate::array::NdArray;
use crate::autograd::{Graph, TensorId};
use crate::context::Context;
use crate::error::{GradflowError, Result};
use crate::nn::module::Module;
use crate::nn::parameter::Parameter;

/// Batch normalization over the batch axis of `[batch, features]` inputs.
///
/// In training mode the batch mean and biased variance normalize the input
/// and the running statistics move towards the batch ones:
/// `running = (1 - momentum) * running + momentum * batch`, where the
/// variance fed to the running estimate is the unbiased one. In eval mode
/// the running statistics are used as constants.
#[derive(Debug)]
pub struct BatchNorm1d {
    num_features: usize,
    eps: f64,
    momentum: f64,
    gamma: Parameter,
    beta: Parameter,
    running_mean: Parameter,
    running_var: Parameter,
}

impl BatchNorm1d {
    pub const DEFAULT_EPS: f64 = 1e-5;
    pub const DEFAULT_MOMENTUM: f64 = 0.1;

    pub fn new(ctx: &Context, num_features: usize) -> Result<Self> {
        Self::with_options(ctx, num_features, Self::DEFAULT_EPS, Self::DEFAULT_MOMENTUM)
    }

    pub fn with_options(ctx: &Context, num_features: usize, eps: f64, momentum: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&momentum) {
            return Err(GradflowError::ConfigurationError(format!(
                "batch norm momentum must be in [0, 1], got {}",
                momentum
            )));
        }
        if eps < 0.0 {
            return Err(GradflowError::ConfigurationError(format!(
                "batch norm eps must be non-negative, got {}",
                eps
            )));
        }
        let running_mean = ctx.parameter("running_mean", ctx.zeros(&[num_features]));
        let running_var = ctx.parameter("running_var", ctx.ones(&[num_features]));
        running_mean.set_requires_grad(false);
        running_var.set_requires_grad(false);
        Ok(BatchNorm1d {
            num_features,
            eps,
            momentum,
            gamma: ctx.parameter("gamma", ctx.ones(&[num_features])),
            beta: ctx.parameter("beta", ctx.zeros(&[num_features])),
            running_mean,
            running_var,
        })
    }

    pub fn running_mean(&self) -> NdArray {
        self.running_mean.value()
    }

    pub fn running_var(&self) -> NdArray {
        self.running_var.value()
    }

    pub fn gamma(&self) -> &Parameter {
        &self.gamma
    }

    pub fn beta(&self) -> &Parameter {
        &self.beta
    }

    fn update_running(&self, mean: &NdArray, biased_var: &NdArray, n: usize) -> Result<()> {
        let m = self.momentum;
        let correction = n as f64 / (n - 1) as f64;
        self.running_mean.update(|running, _| {
            running.mul_scalar_(1.0 - m);
            running.axpy_(m, mean)
        })?;
        self.running_var.update(|running, _| {
            running.mul_scalar_(1.0 - m);
            running.axpy_(m * correction, biased_var)
        })
    }
}

impl Module for BatchNorm1d {
    fn forward(&self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId> {
        let shape = g.shape(x)?;
        if shape.len() != 2 || shape[1] != self.num_features {
            return Err(GradflowError::shape_mismatch(
                &[shape.first().copied().unwrap_or(0), self.num_features],
                shape,
                "BatchNorm1d forward",
            ));
        }
        let n = shape[0];
        let normed = if g.is_training() {
            if n < 2 {
                return Err(GradflowError::UsageError(
                    "BatchNorm1d needs more than one sample per batch in training mode".to_string(),
                ));
            }
            let mean = g.mean1d(x, 0)?;
            let centered = g.sub(x, mean)?;
            let squared = g.sqr(centered)?;
            let var = g.mean1d(squared, 0)?;
            let (mean_value, var_value) = (g.value(mean)?.clone(), g.value(var)?.clone());
            self.update_running(&mean_value, &var_value, n)?;
            let shifted = g.add_scalar(var, self.eps)?;
            let std = g.sqrt(shifted)?;
            g.div(centered, std)?
        } else {
            let mean = g.constant(self.running_mean.value());
            let std = g.constant(self.running_var.value().map(|v| (v + self.eps).sqrt()));
            let centered = g.sub(x, mean)?;
            g.div(centered, std)?
        };
        let gamma = g.param(&self.gamma);
        let beta = g.param(&self.beta);
        let scaled = g.mul(normed, gamma)?;
        g.add(scaled, beta)
    }

    fn named_parameters(&self) -> Vec<(String, Parameter)> {
        vec![
            ("gamma".to_string(), self.gamma.clone()),
            ("beta".to_string(), self.beta.clone()),
        ]
    }

    fn named_buffers(&self) -> Vec<(String, Parameter)> {
        vec![
            ("running_mean".to_string(), self.running_mean.clone()),
            ("running_var".to_string(), self.running_var.clone()),
        ]
    }
}

#[cfg(test)]
#[path = "batchnorm_test.rs"]
mod tests;
