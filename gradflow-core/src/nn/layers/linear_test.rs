use super::*;
use crate::array::NdArray;
use crate::utils::testing::{check_array_near, create_test_array};

#[test]
fn test_linear_forward_known_weights() {
    let ctx = Context::with_seed(0);
    let linear = Linear::new(&ctx, 3, 2).unwrap();
    linear
        .weight()
        .set_value(create_test_array(vec![1.0, 0.0, 0.0, 1.0, 1.0, -1.0], vec![3, 2]))
        .unwrap();
    linear.bias().unwrap().set_value(create_test_array(vec![0.5, -0.5], vec![2])).unwrap();

    let mut g = Graph::train(&ctx);
    let x = g.constant(create_test_array(vec![1.0, 2.0, 3.0, -1.0, 0.0, 1.0], vec![2, 3]));
    let y = linear.forward(&mut g, x).unwrap();
    check_array_near(g.value(y).unwrap(), &[2, 2], &[4.5, -1.5, 0.5, -1.5], 1e-12);
}

#[test]
fn test_linear_backward_reaches_parameters() {
    let ctx = Context::with_seed(1);
    let linear = Linear::new(&ctx, 3, 2).unwrap();
    let mut g = Graph::train(&ctx);
    let x = g.constant(create_test_array(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]));
    let y = linear.forward(&mut g, x).unwrap();
    let s = g.sum(y).unwrap();
    g.backward(s).unwrap();

    // dW = xᵀ·1: column sums of x repeated across outputs; db = batch size.
    let dw = linear.weight().grad().unwrap();
    check_array_near(&dw, &[3, 2], &[5.0, 5.0, 7.0, 7.0, 9.0, 9.0], 1e-12);
    let db = linear.bias().unwrap().grad().unwrap();
    check_array_near(&db, &[2], &[2.0, 2.0], 1e-12);
}

#[test]
fn test_linear_init_and_config() {
    let ctx = Context::with_seed(2);
    let linear = Linear::with_bias(&ctx, 16, 4, false).unwrap();
    assert!(linear.bias().is_none());
    assert_eq!(linear.named_parameters().len(), 1);
    let bound = 1.0 / 4.0;
    assert!(linear.weight().value().data().iter().all(|v| v.abs() <= bound));
    assert_eq!((linear.in_features(), linear.out_features()), (16, 4));
    assert!(Linear::new(&ctx, 0, 4).is_err());
}

#[test]
fn test_linear_rejects_wrong_input_shape() {
    let ctx = Context::with_seed(0);
    let linear = Linear::new(&ctx, 3, 2).unwrap();
    let mut g = Graph::eval(&ctx);
    let x = g.constant(NdArray::ones(&[2, 4]));
    assert!(linear.forward(&mut g, x).unwrap_err().is_shape_error());
}
