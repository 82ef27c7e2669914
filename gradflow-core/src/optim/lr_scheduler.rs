use super::optimizer_trait::Optimizer;
use crate::error::{GradflowError, Result};

/// Adjusts the learning rates of an optimizer's parameter groups over the
/// course of training.
///
/// The scheduler owns its optimizer; reach it through
/// [`LrScheduler::optimizer_mut`] to step it.
pub trait LrScheduler<O: Optimizer> {
    /// Advances the schedule by one epoch.
    fn step(&mut self) -> Result<()>;

    /// Current learning rate of every group, in group order.
    fn get_last_lr(&self) -> Vec<f64> {
        self.optimizer().param_groups().iter().map(|pg| pg.lr()).collect()
    }

    fn optimizer(&self) -> &O;

    fn optimizer_mut(&mut self) -> &mut O;
}

/// Multiplies every learning rate by `gamma` once every `step_size` epochs.
#[derive(Debug)]
pub struct StepLr<O: Optimizer> {
    optimizer: O,
    step_size: usize,
    gamma: f64,
    last_epoch: usize,
}

impl<O: Optimizer> StepLr<O> {
    pub fn new(optimizer: O, step_size: usize, gamma: f64) -> Result<Self> {
        if step_size == 0 {
            return Err(GradflowError::ConfigurationError(
                "StepLr step_size cannot be zero".to_string(),
            ));
        }
        check_gamma(gamma)?;
        Ok(StepLr {
            optimizer,
            step_size,
            gamma,
            last_epoch: 0,
        })
    }

    pub fn last_epoch(&self) -> usize {
        self.last_epoch
    }

    pub fn into_optimizer(self) -> O {
        self.optimizer
    }
}

impl<O: Optimizer> LrScheduler<O> for StepLr<O> {
    fn step(&mut self) -> Result<()> {
        self.last_epoch += 1;
        if self.last_epoch % self.step_size == 0 {
            for pg in self.optimizer.param_groups_mut() {
                pg.set_lr(pg.lr() * self.gamma);
            }
            log::debug!("epoch {}: learning rates now {:?}", self.last_epoch, self.get_last_lr());
        }
        Ok(())
    }

    fn optimizer(&self) -> &O {
        &self.optimizer
    }

    fn optimizer_mut(&mut self) -> &mut O {
        &mut self.optimizer
    }
}

/// Multiplies every learning rate by `gamma` each epoch.
#[derive(Debug)]
pub struct ExponentialLr<O: Optimizer> {
    optimizer: O,
    gamma: f64,
    last_epoch: usize,
}

impl<O: Optimizer> ExponentialLr<O> {
    pub fn new(optimizer: O, gamma: f64) -> Result<Self> {
        check_gamma(gamma)?;
        Ok(ExponentialLr {
            optimizer,
            gamma,
            last_epoch: 0,
        })
    }

    pub fn last_epoch(&self) -> usize {
        self.last_epoch
    }

    pub fn into_optimizer(self) -> O {
        self.optimizer
    }
}

impl<O: Optimizer> LrScheduler<O> for ExponentialLr<O> {
    fn step(&mut self) -> Result<()> {
        self.last_epoch += 1;
        for pg in self.optimizer.param_groups_mut() {
            pg.set_lr(pg.lr() * self.gamma);
        }
        Ok(())
    }

    fn optimizer(&self) -> &O {
        &self.optimizer
    }

    fn optimizer_mut(&mut self) -> &mut O {
        &mut self.optimizer
    }
}

fn check_gamma(gamma: f64) -> Result<()> {
    if !(gamma > 0.0) || !gamma.is_finite() {
        return Err(GradflowError::ConfigurationError(format!(
            "scheduler gamma must be positive and finite, got {}",
            gamma
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "lr_scheduler_test.rs"]
mod tests;
