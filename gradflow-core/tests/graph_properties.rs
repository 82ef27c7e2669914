use gradflow_core::utils::testing::{assert_gradients, check_array_near, grad_data};
use gradflow_core::{Context, GradflowError, Graph};

mod common;
use common::array;

#[test]
fn test_broadcast_gradient_is_reduced() {
    let ctx = Context::with_seed(0);
    let mut g = Graph::train(&ctx);
    let a = g.variable(array(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]));
    let b = g.variable(array(vec![10.0, 20.0, 30.0], vec![1, 3]));
    let c = g.add(a, b).unwrap();
    let w = g.constant(array(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]));
    let weighted = g.mul(c, w).unwrap();
    let s = g.sum(weighted).unwrap();
    g.backward(s).unwrap();
    check_array_near(g.grad(b).unwrap().unwrap(), &[1, 3], &[5.0, 7.0, 9.0], 1e-12);
    check_array_near(g.grad(a).unwrap().unwrap(), &[2, 3], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 1e-12);
}

#[test]
fn test_repeated_backward_accumulates_and_zero_grad_resets() {
    let ctx = Context::with_seed(0);
    let mut g = Graph::train(&ctx);
    let x = g.variable(array(vec![1.5, -2.0], vec![2]));
    let t = g.tanh(x).unwrap();
    let s = g.sum(t).unwrap();

    g.backward(s).unwrap();
    let first = grad_data(&g, x);
    g.zero_grads();
    g.zero_grads();
    assert!(g.grad(x).unwrap().is_none());

    g.backward(s).unwrap();
    assert_eq!(grad_data(&g, x), first);
    g.backward(s).unwrap();
    let doubled: Vec<f64> = first.iter().map(|v| v * 2.0).collect();
    assert_eq!(grad_data(&g, x), doubled);
}

#[test]
fn test_composite_expression_gradients() {
    let a = array(vec![0.2, -0.4, 0.9, 1.3, -0.7, 0.1], vec![2, 3]);
    let b = array(vec![0.5, -1.1, 0.3, 0.8, -0.2, 0.6], vec![3, 2]);
    assert_gradients(&[a, b], |g, xs| {
        let m = g.matmul(xs[0], xs[1])?;
        let s = g.sigmoid(m)?;
        let ls = g.log_softmax(s, 1)?;
        g.mean(ls)
    });
}

#[test]
fn test_standardize_and_div_gradients() {
    let x = array(vec![0.3, 1.7, -0.8, 2.2, 0.1, -1.4], vec![2, 3]);
    let y = array(vec![1.5, 2.5, 3.5, 0.7, 1.2, 2.9], vec![2, 3]);
    assert_gradients(&[x, y], |g, xs| {
        let z = g.standardize1d(xs[0], 1, 0, 1e-3)?;
        let q = g.div(z, xs[1])?;
        let r = g.sqrt(xs[1])?;
        let both = g.add(q, r)?;
        g.sum(both)
    });
}

#[test]
fn test_shape_errors_at_construction() {
    let ctx = Context::with_seed(0);
    let mut g = Graph::train(&ctx);
    let a = g.variable(array(vec![1.0, 2.0, 3.0], vec![3]));
    let b = g.variable(array(vec![1.0, 2.0], vec![2]));
    let before = g.len();
    assert!(g.add(a, b).unwrap_err().is_shape_error());
    assert!(g.matmul(a, b).unwrap_err().is_shape_error());
    assert_eq!(g.len(), before);

    assert!(matches!(g.backward(a), Err(GradflowError::BackwardNonScalar { .. })));
}
