use super::*;
use crate::types::DType;
use approx::assert_relative_eq;

fn param(shape: &[usize]) -> Parameter {
    Parameter::new(NdArray::zeros(shape))
}

#[test]
fn test_zeros_and_ones() {
    let p = param(&[2, 3]);
    ones_(&p);
    assert_eq!(p.value().data(), &[1.0; 6]);
    zeros_(&p);
    assert_eq!(p.value().data(), &[0.0; 6]);
}

#[test]
fn test_fill_keeps_dtype_and_drops_grad() {
    let p = Parameter::new(NdArray::full(&[2], 0.5, DType::F32));
    p.set_grad(NdArray::ones(&[2]).cast(DType::F32)).unwrap();
    ones_(&p);
    assert_eq!(p.value().dtype(), DType::F32);
    assert!(!p.has_grad());
}

#[test]
fn test_uniform_bounds_and_determinism() {
    let draw = || {
        let ctx = Context::with_seed(11);
        let p = param(&[50]);
        uniform_(&ctx, &p, -0.5, 0.25).unwrap();
        p.value()
    };
    let a = draw();
    assert!(a.data().iter().all(|&v| (-0.5..0.25).contains(&v)));
    assert_eq!(a, draw());
}

#[test]
fn test_compute_fans() {
    assert_eq!(compute_fans(&[4, 3]).unwrap(), (4, 3));
    assert_eq!(compute_fans(&[4, 3, 2, 2]).unwrap(), (16, 12));
    assert!(compute_fans(&[4]).is_err());
}

#[test]
fn test_xavier_and_kaiming_bounds() {
    let ctx = Context::with_seed(5);
    let p = param(&[10, 20]);
    xavier_uniform_(&ctx, &p, 1.0).unwrap();
    let bound = (6.0f64 / 30.0).sqrt();
    assert!(p.value().data().iter().all(|v| v.abs() <= bound));

    kaiming_uniform_(&ctx, &p, 5.0f64.sqrt()).unwrap();
    let bound = 1.0 / 10.0f64.sqrt();
    let values = p.value();
    assert!(values.data().iter().all(|v| v.abs() <= bound + 1e-12));
    assert!(values.data().iter().any(|v| v.abs() > bound / 2.0));
}

#[test]
fn test_normal_moments() {
    let ctx = Context::with_seed(9);
    let p = param(&[4000]);
    normal_(&ctx, &p, 1.0, 0.5).unwrap();
    let v = p.value();
    let mean = v.mean_all();
    let var = v.data().iter().map(|x| (x - mean).powi(2)).sum::<f64>() / v.numel() as f64;
    assert_relative_eq!(mean, 1.0, epsilon = 0.05);
    assert_relative_eq!(var.sqrt(), 0.5, epsilon = 0.05);
}
