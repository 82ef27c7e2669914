use super::*;
use crate::array::NdArray;
use crate::utils::testing::{check_array_near, create_test_array};
use approx::assert_relative_eq;

fn param_with_grad(grad: Vec<f64>) -> Parameter {
    let shape = vec![grad.len()];
    let p = Parameter::new(NdArray::zeros(&shape));
    p.set_grad(create_test_array(grad, shape)).unwrap();
    p
}

#[test]
fn test_clip_grad_value() {
    let p = param_with_grad(vec![-3.0, 0.5, 2.0]);
    let untouched = Parameter::new(NdArray::zeros(&[1]));
    clip_grad_value_(&[p.clone(), untouched.clone()], 1.0).unwrap();
    check_array_near(&p.grad().unwrap(), &[3], &[-1.0, 0.5, 1.0], 0.0);
    assert!(!untouched.has_grad());
    assert!(clip_grad_value_(&[p], -1.0).is_err());
}

#[test]
fn test_clip_grad_norm_scales_jointly() {
    let a = param_with_grad(vec![3.0]);
    let b = param_with_grad(vec![4.0]);
    let total = clip_grad_norm_(&[a.clone(), b.clone()], 1.0, 2.0).unwrap();
    assert_relative_eq!(total, 5.0);
    assert_relative_eq!(a.grad().unwrap().data()[0], 3.0 / (5.0 + 1e-6), epsilon = 1e-12);
    assert_relative_eq!(b.grad().unwrap().data()[0], 4.0 / (5.0 + 1e-6), epsilon = 1e-12);
}

#[test]
fn test_clip_grad_norm_below_threshold_is_untouched() {
    let a = param_with_grad(vec![0.3, 0.4]);
    let total = clip_grad_norm_(&[a.clone()], 1.0, 2.0).unwrap();
    assert_relative_eq!(total, 0.5, epsilon = 1e-12);
    assert_eq!(a.grad().unwrap().data(), &[0.3, 0.4]);
}

#[test]
fn test_clip_grad_norm_inf_and_l1() {
    let a = param_with_grad(vec![-5.0, 1.0]);
    let total = clip_grad_norm_(&[a.clone()], 10.0, f64::INFINITY).unwrap();
    assert_relative_eq!(total, 5.0);
    let total = clip_grad_norm_(&[a], 10.0, 1.0).unwrap();
    assert_relative_eq!(total, 6.0);
}

#[test]
fn test_clip_grad_norm_config_errors() {
    let a = param_with_grad(vec![1.0]);
    assert!(clip_grad_norm_(&[a.clone()], -1.0, 2.0).is_err());
    assert!(clip_grad_norm_(&[a], 1.0, 0.0).is_err());
    assert_eq!(clip_grad_norm_(&[], 1.0, 2.0).unwrap(), 0.0);
}
