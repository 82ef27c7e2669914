use crate::array::NdArray;
use crate::error::{GradflowError, Result};
use crate::nn::parameter::{ParamId, Parameter};
use crate::optim::optimizer_state::OptimizerState;
use crate::optim::optimizer_trait::Optimizer;
use crate::optim::param_group::ParamGroup;
use std::collections::HashMap;

/// Stochastic gradient descent with optional momentum, dampening, Nesterov
/// momentum and L2 weight decay.
///
/// For each parameter with a gradient, `d = grad + weight_decay * value`.
/// With momentum, `buf = momentum * buf + (1 - dampening) * d` (starting
/// from zero) and `d` becomes `buf`, or `d + momentum * buf` with Nesterov.
/// Finally `value -= lr * d`.
#[derive(Debug)]
pub struct SgdOptimizer {
    param_groups: Vec<ParamGroup>,
    momentum: f64,
    dampening: f64,
    nesterov: bool,
    momentum_buffers: HashMap<ParamId, NdArray>,
}

impl SgdOptimizer {
    /// Creates an optimizer with one group holding `params`.
    pub fn new(
        params: impl IntoIterator<Item = Parameter>,
        lr: f64,
        momentum: f64,
        weight_decay: f64,
        nesterov: bool,
    ) -> Result<Self> {
        if !(momentum >= 0.0) {
            return Err(GradflowError::ConfigurationError(format!(
                "momentum must be non-negative, got {}",
                momentum
            )));
        }
        if nesterov && momentum == 0.0 {
            return Err(GradflowError::ConfigurationError(
                "Nesterov momentum requires a positive momentum".to_string(),
            ));
        }
        let group = ParamGroup::new(params, lr)?.with_weight_decay(weight_decay)?;
        Ok(SgdOptimizer {
            param_groups: vec![group],
            momentum,
            dampening: 0.0,
            nesterov,
            momentum_buffers: HashMap::new(),
        })
    }

    pub fn with_dampening(mut self, dampening: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&dampening) {
            return Err(GradflowError::ConfigurationError(format!(
                "dampening must be in [0, 1], got {}",
                dampening
            )));
        }
        if self.nesterov && dampening != 0.0 {
            return Err(GradflowError::ConfigurationError(
                "Nesterov momentum requires zero dampening".to_string(),
            ));
        }
        self.dampening = dampening;
        Ok(self)
    }
}

impl Optimizer for SgdOptimizer {
    fn step(&mut self) -> Result<()> {
        let (momentum, dampening, nesterov) = (self.momentum, self.dampening, self.nesterov);
        let buffers = &mut self.momentum_buffers;
        let mut updated = 0;
        for group in &self.param_groups {
            let (lr, weight_decay) = (group.lr(), group.weight_decay());
            for param in group.params() {
                if !param.requires_grad() {
                    continue;
                }
                let applied = param.update(|value, grad| {
                    let Some(grad) = grad else {
                        return Ok(false);
                    };
                    let mut d = grad.clone();
                    if weight_decay != 0.0 {
                        d.axpy_(weight_decay, value)?;
                    }
                    if momentum != 0.0 {
                        let buf = buffers
                            .entry(param.id())
                            .or_insert_with(|| NdArray::zeros_like(value));
                        if buf.shape() != value.shape() {
                            return Err(GradflowError::UsageError(format!(
                                "momentum buffer of shape {:?} does not match parameter {} of shape {:?}",
                                buf.shape(),
                                param.name().unwrap_or_default(),
                                value.shape()
                            )));
                        }
                        buf.mul_scalar_(momentum);
                        buf.axpy_(1.0 - dampening, &d)?;
                        if nesterov {
                            d.axpy_(momentum, buf)?;
                        } else {
                            d = buf.clone();
                        }
                    }
                    value.axpy_(-lr, &d)?;
                    Ok(true)
                })?;
                if applied {
                    updated += 1;
                }
            }
        }
        log::trace!("SGD step updated {} parameters", updated);
        Ok(())
    }

    fn add_param_group(&mut self, param_group: ParamGroup) {
        self.param_groups.push(param_group);
    }

    fn param_groups(&self) -> &[ParamGroup] {
        &self.param_groups
    }

    fn param_groups_mut(&mut self) -> &mut [ParamGroup] {
        &mut self.param_groups
    }

    fn state_dict(&self) -> OptimizerState {
        OptimizerState::Sgd {
            momentum_buffers: self.momentum_buffers.clone(),
        }
    }

    fn load_state_dict(&mut self, state: &OptimizerState) -> Result<()> {
        match state {
            OptimizerState::Sgd { momentum_buffers } => {
                if self.momentum == 0.0 && !momentum_buffers.is_empty() {
                    log::warn!("Loading SGD state with momentum buffers, but optimizer momentum is 0.");
                }
                self.momentum_buffers = momentum_buffers.clone();
                Ok(())
            }
            OptimizerState::Empty => {
                self.momentum_buffers.clear();
                Ok(())
            }
            other => Err(GradflowError::UnsupportedOperation(format!(
                "cannot load {} state into SgdOptimizer",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
#[path = "sgd_test.rs"]
mod tests;
