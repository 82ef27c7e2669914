use crate::autograd::Graph;
use crate::context::Context;
use crate::error::GradflowError;
use crate::utils::testing::{assert_gradients, check_array_near, create_test_array, grad_data};
use approx::assert_relative_eq;

fn positive_input() -> crate::array::NdArray {
    create_test_array(vec![0.3, 1.7, 2.5, 0.9], vec![2, 2])
}

#[test]
fn test_forward_values() {
    let ctx = Context::with_seed(0);
    let mut g = Graph::eval(&ctx);
    let x = g.constant(create_test_array(vec![1.0, 4.0], vec![2]));
    let e = g.exp(x).unwrap();
    let l = g.log(x).unwrap();
    let s = g.sqrt(x).unwrap();
    let q = g.sqr(x).unwrap();
    check_array_near(g.value(e).unwrap(), &[2], &[1f64.exp(), 4f64.exp()], 1e-12);
    check_array_near(g.value(l).unwrap(), &[2], &[0.0, 4f64.ln()], 1e-12);
    check_array_near(g.value(s).unwrap(), &[2], &[1.0, 2.0], 1e-12);
    check_array_near(g.value(q).unwrap(), &[2], &[1.0, 16.0], 1e-12);
}

#[test]
fn test_log_eps_clamps_value_and_gradient() {
    let ctx = Context::with_seed(0);
    let mut g = Graph::train(&ctx);
    let x = g.variable(create_test_array(vec![0.0, 2.0], vec![2]));
    let y = g.log_eps(x, 1e-8).unwrap();
    assert_relative_eq!(g.value(y).unwrap().data()[0], 1e-8f64.ln());
    let s = g.sum(y).unwrap();
    g.backward(s).unwrap();
    assert_eq!(grad_data(&g, x), vec![0.0, 0.5]);

    assert!(matches!(g.log_eps(x, 0.0), Err(GradflowError::ConfigurationError(_))));
}

#[test]
fn test_unary_gradients_numerically() {
    assert_gradients(&[positive_input()], |g, xs| g.exp(xs[0]));
    assert_gradients(&[positive_input()], |g, xs| g.log(xs[0]));
    assert_gradients(&[positive_input()], |g, xs| g.sqrt(xs[0]));
    assert_gradients(&[create_test_array(vec![-1.5, 0.2, 3.0], vec![3])], |g, xs| g.sqr(xs[0]));
}
