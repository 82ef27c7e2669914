use super::*;
use crate::array::NdArray;
use crate::nn::parameter::Parameter;
use crate::optim::param_group::ParamGroup;
use crate::optim::sgd::SgdOptimizer;
use approx::assert_relative_eq;

fn sgd(lr: f64) -> SgdOptimizer {
    SgdOptimizer::new(vec![Parameter::new(NdArray::zeros(&[1]))], lr, 0.0, 0.0, false).unwrap()
}

#[test]
fn test_step_lr_decays_every_step_size_epochs() {
    let mut scheduler = StepLr::new(sgd(1.0), 2, 0.5).unwrap();
    let mut lrs = Vec::new();
    for _ in 0..5 {
        scheduler.step().unwrap();
        lrs.push(scheduler.get_last_lr()[0]);
    }
    assert_eq!(lrs, vec![1.0, 0.5, 0.5, 0.25, 0.25]);
    assert_eq!(scheduler.last_epoch(), 5);
}

#[test]
fn test_step_lr_applies_to_every_group() {
    let mut opt = sgd(0.1);
    opt.add_param_group(ParamGroup::new(vec![Parameter::new(NdArray::zeros(&[2]))], 0.01).unwrap());
    let mut scheduler = StepLr::new(opt, 1, 0.1).unwrap();
    scheduler.step().unwrap();
    let lrs = scheduler.get_last_lr();
    assert_relative_eq!(lrs[0], 0.01, epsilon = 1e-15);
    assert_relative_eq!(lrs[1], 0.001, epsilon = 1e-15);
}

#[test]
fn test_exponential_lr() {
    let mut scheduler = ExponentialLr::new(sgd(0.2), 0.9).unwrap();
    for _ in 0..3 {
        scheduler.step().unwrap();
    }
    assert_relative_eq!(scheduler.get_last_lr()[0], 0.2 * 0.9f64.powi(3), epsilon = 1e-15);
    let opt = scheduler.into_optimizer();
    assert_relative_eq!(opt.param_groups()[0].lr(), 0.2 * 0.729, epsilon = 1e-15);
}

#[test]
fn test_scheduler_config_errors() {
    assert!(matches!(
        StepLr::new(sgd(0.1), 0, 0.5),
        Err(GradflowError::ConfigurationError(_))
    ));
    assert!(StepLr::new(sgd(0.1), 1, 0.0).is_err());
    assert!(ExponentialLr::new(sgd(0.1), -1.0).is_err());
    assert!(ExponentialLr::new(sgd(0.1), f64::NAN).is_err());
}

#[test]
fn test_optimizer_is_reachable_for_stepping() {
    let p = Parameter::new(NdArray::scalar(1.0));
    let opt = SgdOptimizer::new(vec![p.clone()], 0.5, 0.0, 0.0, false).unwrap();
    let mut scheduler = StepLr::new(opt, 1, 0.5).unwrap();
    p.set_grad(NdArray::scalar(1.0)).unwrap();
    scheduler.optimizer_mut().step().unwrap();
    scheduler.step().unwrap();
    scheduler.optimizer_mut().step().unwrap();
    assert_relative_eq!(p.value().item().unwrap(), 1.0 - 0.5 - 0.25, epsilon = 1e-12);
}
