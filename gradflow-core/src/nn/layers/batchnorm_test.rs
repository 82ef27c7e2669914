use super::*;
use crate::utils::testing::{assert_gradients, check_array_near, create_test_array};
use approx::assert_relative_eq;

fn batch() -> NdArray {
    create_test_array(vec![1.0, 10.0, 3.0, 20.0, 5.0, 60.0], vec![3, 2])
}

#[test]
fn test_train_normalizes_and_updates_running_stats() {
    let ctx = Context::with_seed(0);
    let bn = BatchNorm1d::with_options(&ctx, 2, 0.0, 0.5).unwrap();
    let mut g = Graph::train(&ctx);
    let x = g.variable(batch());
    let y = bn.forward(&mut g, x).unwrap();

    let v = g.value(y).unwrap();
    for f in 0..2 {
        let col: Vec<f64> = (0..3).map(|r| v.data()[r * 2 + f]).collect();
        let mean = col.iter().sum::<f64>() / 3.0;
        let var = col.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / 3.0;
        assert_relative_eq!(mean, 0.0, epsilon = 1e-12);
        assert_relative_eq!(var, 1.0, epsilon = 1e-9);
    }

    // Batch means [3, 30]; unbiased variances [4, 700].
    check_array_near(&bn.running_mean(), &[2], &[1.5, 15.0], 1e-12);
    check_array_near(&bn.running_var(), &[2], &[0.5 + 2.0, 0.5 + 350.0], 1e-9);
}

#[test]
fn test_eval_uses_running_stats_and_leaves_them() {
    let ctx = Context::with_seed(0);
    let bn = BatchNorm1d::with_options(&ctx, 2, 0.0, 0.1).unwrap();
    bn.running_mean.set_value(create_test_array(vec![1.0, 2.0], vec![2])).unwrap();
    bn.running_var.set_value(create_test_array(vec![4.0, 0.25], vec![2])).unwrap();

    let mut g = Graph::eval(&ctx);
    let x = g.constant(create_test_array(vec![3.0, 3.0], vec![1, 2]));
    let y = bn.forward(&mut g, x).unwrap();
    check_array_near(g.value(y).unwrap(), &[1, 2], &[1.0, 2.0], 1e-12);
    check_array_near(&bn.running_mean(), &[2], &[1.0, 2.0], 0.0);
}

#[test]
fn test_buffers_are_not_parameters() {
    let ctx = Context::with_seed(0);
    let bn = BatchNorm1d::new(&ctx, 3).unwrap();
    assert_eq!(bn.parameters().len(), 2);
    let names: Vec<String> = bn.named_buffers().into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["running_mean", "running_var"]);
    assert!(bn.buffers().iter().all(|b| !b.requires_grad()));
}

#[test]
fn test_train_rejects_single_sample_and_bad_config() {
    let ctx = Context::with_seed(0);
    let bn = BatchNorm1d::new(&ctx, 2).unwrap();
    let mut g = Graph::train(&ctx);
    let x = g.constant(create_test_array(vec![1.0, 2.0], vec![1, 2]));
    assert!(matches!(bn.forward(&mut g, x), Err(GradflowError::UsageError(_))));
    assert!(BatchNorm1d::with_options(&ctx, 2, 1e-5, 1.5).is_err());
}

#[test]
fn test_train_gradient_matches_standardize() {
    let ctx = Context::with_seed(0);
    let bn = BatchNorm1d::with_options(&ctx, 2, 1e-3, 0.1).unwrap();
    bn.gamma().set_value(create_test_array(vec![0.5, 2.0], vec![2])).unwrap();
    let weights = create_test_array(vec![0.3, -1.0, 2.0, 0.7, -0.4, 1.1], vec![3, 2]);

    let mut g = Graph::train(&ctx);
    let x = g.variable(batch());
    let w = g.constant(weights.clone());
    let y = bn.forward(&mut g, x).unwrap();
    let weighted = g.mul(y, w).unwrap();
    let s = g.sum(weighted).unwrap();
    g.backward(s).unwrap();
    let from_bn = g.grad(x).unwrap().unwrap().clone();

    let mut h = Graph::train(&ctx);
    let x = h.variable(batch());
    let w = h.constant(weights);
    let gamma = h.constant(bn.gamma().value());
    let normed = h.standardize1d(x, 0, 0, 1e-3).unwrap();
    let y = h.mul(normed, gamma).unwrap();
    let weighted = h.mul(y, w).unwrap();
    let s = h.sum(weighted).unwrap();
    h.backward(s).unwrap();
    assert!(h.grad(x).unwrap().unwrap().all_close(&from_bn, 1e-9));
}

#[test]
fn test_eval_gradient_numerically() {
    let ctx = Context::with_seed(0);
    let bn = BatchNorm1d::with_options(&ctx, 2, 1e-3, 0.1).unwrap();
    bn.running_var.set_value(create_test_array(vec![2.0, 0.5], vec![2])).unwrap();
    assert_gradients(&[batch()], |g, xs| bn.forward(g, xs[0]));
}
