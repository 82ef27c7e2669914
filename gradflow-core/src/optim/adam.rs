use crate::array::NdArray;
use crate::error::{GradflowError, Result};
use crate::nn::parameter::{ParamId, Parameter};
use crate::optim::optimizer_state::{AdamParamState, OptimizerState};
use crate::optim::optimizer_trait::Optimizer;
use crate::optim::param_group::ParamGroup;
use std::collections::HashMap;

/// Adam and AdamW.
///
/// With `t` the number of steps taken so far, counting only calls that found
/// at least one gradient, and per parameter:
/// `m = b1*m + (1-b1)*g`, `v = b2*v + (1-b2)*g²`, `m̂ = m/(1-b1^t)`,
/// `v̂ = v/(1-b2^t)` and `value -= lr * m̂ / (sqrt(v̂) + eps)`. AMSGrad
/// replaces `v̂` with its running maximum.
///
/// Weight decay is either L2 (added to `g`, Adam) or decoupled
/// (`value -= lr * wd * value` before the update, AdamW).
#[derive(Debug)]
pub struct AdamOptimizer {
    param_groups: Vec<ParamGroup>,
    beta1: f64,
    beta2: f64,
    eps: f64,
    amsgrad: bool,
    decoupled_weight_decay: bool,
    step_count: u64,
    state: HashMap<ParamId, AdamParamState>,
}

impl AdamOptimizer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: impl IntoIterator<Item = Parameter>,
        lr: f64,
        beta1: f64,
        beta2: f64,
        eps: f64,
        weight_decay: f64,
        amsgrad: bool,
    ) -> Result<Self> {
        if !(0.0..1.0).contains(&beta1) {
            return Err(GradflowError::ConfigurationError(format!(
                "Beta1 must be in [0, 1), got {}",
                beta1
            )));
        }
        if !(0.0..1.0).contains(&beta2) {
            return Err(GradflowError::ConfigurationError(format!(
                "Beta2 must be in [0, 1), got {}",
                beta2
            )));
        }
        if !(eps > 0.0) {
            return Err(GradflowError::ConfigurationError(format!(
                "Epsilon must be positive, got {}",
                eps
            )));
        }
        let group = ParamGroup::new(params, lr)?.with_weight_decay(weight_decay)?;
        Ok(AdamOptimizer {
            param_groups: vec![group],
            beta1,
            beta2,
            eps,
            amsgrad,
            decoupled_weight_decay: false,
            step_count: 0,
            state: HashMap::new(),
        })
    }

    /// Adam with the usual defaults: betas `(0.9, 0.999)`, eps `1e-8`.
    pub fn with_lr(params: impl IntoIterator<Item = Parameter>, lr: f64) -> Result<Self> {
        Self::new(params, lr, 0.9, 0.999, 1e-8, 0.0, false)
    }

    /// AdamW: same arguments as [`AdamOptimizer::new`], with decoupled
    /// weight decay.
    #[allow(clippy::too_many_arguments)]
    pub fn adamw(
        params: impl IntoIterator<Item = Parameter>,
        lr: f64,
        beta1: f64,
        beta2: f64,
        eps: f64,
        weight_decay: f64,
        amsgrad: bool,
    ) -> Result<Self> {
        let mut opt = Self::new(params, lr, beta1, beta2, eps, weight_decay, amsgrad)?;
        opt.decoupled_weight_decay = true;
        Ok(opt)
    }
}

impl Optimizer for AdamOptimizer {
    fn step(&mut self) -> Result<()> {
        let any_grad = self
            .param_groups
            .iter()
            .flat_map(|group| group.params())
            .any(|p| p.requires_grad() && p.has_grad());
        if !any_grad {
            return Ok(());
        }
        self.step_count += 1;
        let t = i32::try_from(self.step_count).unwrap_or(i32::MAX);
        let (b1, b2, eps, amsgrad, decoupled) =
            (self.beta1, self.beta2, self.eps, self.amsgrad, self.decoupled_weight_decay);
        let states = &mut self.state;
        for group in &self.param_groups {
            let (lr, weight_decay) = (group.lr(), group.weight_decay());
            for param in group.params() {
                if !param.requires_grad() {
                    continue;
                }
                param.update(|value, grad| {
                    let Some(grad) = grad else {
                        return Ok(());
                    };
                    let state = states.entry(param.id()).or_insert_with(|| AdamParamState {
                        m: NdArray::zeros_like(value),
                        v: NdArray::zeros_like(value),
                        v_max: amsgrad.then(|| NdArray::zeros_like(value)),
                    });
                    if state.m.shape() != value.shape() {
                        return Err(GradflowError::UsageError(format!(
                            "Adam state of shape {:?} does not match parameter {} of shape {:?}",
                            state.m.shape(),
                            param.name().unwrap_or_default(),
                            value.shape()
                        )));
                    }

                    let mut g = grad.clone();
                    if weight_decay != 0.0 {
                        if decoupled {
                            value.mul_scalar_(1.0 - lr * weight_decay);
                        } else {
                            g.axpy_(weight_decay, value)?;
                        }
                    }

                    state.m.mul_scalar_(b1);
                    state.m.axpy_(1.0 - b1, &g)?;
                    state.v.mul_scalar_(b2);
                    state.v.axpy_(1.0 - b2, &g.map(|x| x * x))?;

                    let m_hat = state.m.scale(1.0 / (1.0 - b1.powi(t)));
                    let mut v_hat = state.v.scale(1.0 / (1.0 - b2.powi(t)));
                    if let Some(v_max) = state.v_max.as_mut() {
                        *v_max = v_max.zip_map(&v_hat, "AMSGrad max", f64::max)?;
                        v_hat = v_max.clone();
                    }
                    let update = m_hat.zip_map(&v_hat, "Adam update", |m, v| m / (v.sqrt() + eps))?;
                    value.axpy_(-lr, &update)
                })?;
            }
        }
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
        OptimizerState::Adam {
            step: self.step_count,
            params: self.state.clone(),
        }
    }

    fn load_state_dict(&mut self, state: &OptimizerState) -> Result<()> {
        match state {
            OptimizerState::Adam { step, params } => {
                if params.values().any(|s| s.v_max.is_some() != self.amsgrad) {
                    log::warn!("Loading Adam state whose AMSGrad setting differs from this optimizer.");
                }
                self.step_count = *step;
                self.state = params.clone();
                Ok(())
            }
            OptimizerState::Empty => {
                self.step_count = 0;
                self.state.clear();
                Ok(())
            }
            other => Err(GradflowError::UnsupportedOperation(format!(
                "cannot load {} state into AdamOptimizer",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
#[path = "adam_test.rs"]
mod tests;
