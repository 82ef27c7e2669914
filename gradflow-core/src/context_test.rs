use super::*;

#[test]
fn test_same_seed_same_stream() {
    let a = Context::with_seed(7);
    let b = Context::with_seed(7);
    let x = a.rand_uniform(&[4], -1.0, 1.0).unwrap();
    let y = b.rand_uniform(&[4], -1.0, 1.0).unwrap();
    assert_eq!(x, y);
    assert!(x.data().iter().all(|v| (-1.0..1.0).contains(v)));
}

#[test]
fn test_draws_advance_the_stream() {
    let ctx = Context::with_seed(1);
    let first = ctx.randn(&[3], 0.0, 1.0).unwrap();
    let second = ctx.randn(&[3], 0.0, 1.0).unwrap();
    assert_ne!(first, second);
}

#[test]
fn test_invalid_distributions() {
    let ctx = Context::with_seed(0);
    assert!(matches!(
        ctx.rand_uniform(&[1], 1.0, 1.0),
        Err(GradflowError::ConfigurationError(_))
    ));
    assert!(matches!(ctx.randn(&[1], 0.0, -1.0), Err(GradflowError::ConfigurationError(_))));
}

#[test]
fn test_dtype_policy_applies_to_factories() {
    let ctx = Context::new(ContextOptions::new().seed(3).dtype(DType::F32)).unwrap();
    assert_eq!(ctx.dtype(), DType::F32);
    let a = ctx.from_vec(vec![0.1, 0.2], &[2]).unwrap();
    assert_eq!(a.dtype(), DType::F32);
    assert_eq!(a.data()[0], 0.1f32 as f64);
    let p = ctx.parameter("w", NdArray::new(vec![0.1], vec![1]).unwrap());
    assert_eq!(p.value().dtype(), DType::F32);
}

#[test]
fn test_dropout_mask_values() {
    let ctx = Context::with_seed(11);
    let mask = ctx.dropout_mask(&[1000], 0.5);
    assert!(mask.data().iter().all(|&v| v == 0.0 || v == 2.0));
    let kept = mask.data().iter().filter(|&&v| v > 0.0).count();
    assert!(kept > 400 && kept < 600, "kept {} of 1000", kept);

    let none = ctx.dropout_mask(&[5], 0.0);
    assert!(none.data().iter().all(|&v| v == 0.0));
}

#[test]
fn test_permutation_is_complete() {
    let ctx = Context::with_seed(5);
    let mut p = ctx.permutation(10);
    p.sort_unstable();
    assert_eq!(p, (0..10).collect::<Vec<_>>());
}

#[test]
fn test_dedicated_pool() {
    let ctx = Context::new(ContextOptions::new().seed(0).num_threads(2)).unwrap();
    assert_eq!(ctx.install(rayon::current_num_threads), 2);
    assert!(matches!(
        Context::new(ContextOptions::new().num_threads(0)),
        Err(GradflowError::ConfigurationError(_))
    ));
}
