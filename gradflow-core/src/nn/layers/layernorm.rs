use crate::autograd::{Graph, TensorId};
use crate::context::Context;
use crate::error::{GradflowError, Result};
use crate::nn::module::Module;
use crate::nn::parameter::Parameter;

/// Standardizes over the last axis, then applies `y * gamma + beta`.
#[derive(Debug)]
pub struct LayerNorm {
    size: usize,
    eps: f64,
    gamma: Parameter,
    beta: Parameter,
}

impl LayerNorm {
    pub const DEFAULT_EPS: f64 = 1e-5;

    pub fn new(ctx: &Context, size: usize) -> Self {
        Self::with_eps(ctx, size, Self::DEFAULT_EPS)
    }

    pub fn with_eps(ctx: &Context, size: usize, eps: f64) -> Self {
        LayerNorm {
            size,
            eps,
            gamma: ctx.parameter("gamma", ctx.ones(&[size])),
            beta: ctx.parameter("beta", ctx.zeros(&[size])),
        }
    }

    pub fn gamma(&self) -> &Parameter {
        &self.gamma
    }

    pub fn beta(&self) -> &Parameter {
        &self.beta
    }
}

impl Module for LayerNorm {
    fn forward(&self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId> {
        let shape = g.shape(x)?;
        if shape.last() != Some(&self.size) {
            return Err(GradflowError::shape_mismatch(&[self.size], shape, "LayerNorm forward"));
        }
        let axis = shape.len() - 1;
        let normed = g.standardize1d(x, axis, 0, self.eps)?;
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
}
