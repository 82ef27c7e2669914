use crate::autograd::{Graph, TensorId};
use crate::context::Context;
use crate::error::{GradflowError, Result};
use crate::nn::init;
use crate::nn::module::Module;
use crate::nn::parameter::Parameter;

/// Applies `y = x·W + b` to a batch `x` of shape `[batch, in_features]`.
///
/// `W` has shape `[in_features, out_features]` and is drawn with
/// `kaiming_uniform_(a = sqrt(5))`; `b` has shape `[out_features]` and is
/// drawn from `U(-1/sqrt(in), 1/sqrt(in))`.
#[derive(Debug)]
pub struct Linear {
    weight: Parameter,
    bias: Option<Parameter>,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    pub fn new(ctx: &Context, in_features: usize, out_features: usize) -> Result<Self> {
        Self::with_bias(ctx, in_features, out_features, true)
    }

    pub fn with_bias(ctx: &Context, in_features: usize, out_features: usize, bias: bool) -> Result<Self> {
        if in_features == 0 || out_features == 0 {
            return Err(GradflowError::ConfigurationError(format!(
                "Linear needs positive feature counts, got {} -> {}",
                in_features, out_features
            )));
        }
        let weight = ctx.parameter("weight", ctx.zeros(&[in_features, out_features]));
        init::kaiming_uniform_(ctx, &weight, 5.0f64.sqrt())?;
        let bias = if bias {
            let b = ctx.parameter("bias", ctx.zeros(&[out_features]));
            let bound = 1.0 / (in_features as f64).sqrt();
            init::uniform_(ctx, &b, -bound, bound)?;
            Some(b)
        } else {
            None
        };
        log::debug!("Linear {} -> {} created (bias: {})", in_features, out_features, bias.is_some());
        Ok(Linear {
            weight,
            bias,
            in_features,
            out_features,
        })
    }

    pub fn weight(&self) -> &Parameter {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Parameter> {
        self.bias.as_ref()
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn out_features(&self) -> usize {
        self.out_features
    }
}

impl Module for Linear {
    fn forward(&self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId> {
        let shape = g.shape(x)?;
        if shape.len() != 2 || shape[1] != self.in_features {
            return Err(GradflowError::shape_mismatch(
                &[shape.first().copied().unwrap_or(0), self.in_features],
                shape,
                "Linear forward",
            ));
        }
        let w = g.param(&self.weight);
        let y = g.matmul(x, w)?;
        match &self.bias {
            Some(bias) => {
                let b = g.param(bias);
                g.add(y, b)
            }
            None => Ok(y),
        }
    }

    fn named_parameters(&self) -> Vec<(String, Parameter)> {
        let mut params = vec![("weight".to_string(), self.weight.clone())];
        if let Some(b) = &self.bias {
            params.push(("bias".to_string(), b.clone()));
        }
        params
    }
}

#[cfg(test)]
#[path = "linear_test.rs"]
mod tests;
