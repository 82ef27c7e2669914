use super::*;

fn arr(data: Vec<f64>, shape: Vec<usize>) -> NdArray {
    NdArray::new(data, shape).expect("Failed to create test array")
}

#[test]
fn test_leaves_and_accessors() {
    let ctx = Context::with_seed(0);
    let mut g = Graph::train(&ctx);
    let a = g.constant(arr(vec![1.0, 2.0], vec![2]));
    let b = g.variable(arr(vec![3.0, 4.0], vec![2]));

    assert_eq!(g.len(), 2);
    assert!(!g.requires_grad(a).unwrap());
    assert!(g.requires_grad(b).unwrap());
    assert_eq!(g.shape(b).unwrap(), &[2]);
    assert!(g.grad(b).unwrap().is_none());
    assert!(g.back_functions(b).unwrap().is_empty());
    assert!(matches!(g.value(TensorId(9)), Err(GradflowError::UnknownTensor(9))));
}

#[test]
fn test_requires_grad_propagates_to_results() {
    let ctx = Context::with_seed(0);
    let mut g = Graph::train(&ctx);
    let a = g.constant(arr(vec![1.0], vec![1]));
    let b = g.constant(arr(vec![2.0], vec![1]));
    let c = g.add(a, b).unwrap();
    assert!(!g.requires_grad(c).unwrap());

    g.set_requires_grad(a, true).unwrap();
    let d = g.add(a, b).unwrap();
    assert!(g.requires_grad(d).unwrap());
    assert_eq!(g.back_functions(d).unwrap(), vec![a, b]);
}

#[test]
fn test_set_value_checks_shape_reset_value_does_not() {
    let ctx = Context::with_seed(0);
    let mut g = Graph::train(&ctx);
    let x = g.variable(NdArray::zeros(&[2, 2]));
    assert!(g.set_value(x, NdArray::zeros(&[4])).unwrap_err().is_shape_error());
    g.set_value(x, NdArray::ones(&[2, 2])).unwrap();

    g.add_grad(x, NdArray::ones(&[2, 2])).unwrap();
    g.reset_value(x, NdArray::zeros(&[3])).unwrap();
    assert_eq!(g.shape(x).unwrap(), &[3]);
    assert!(g.grad(x).unwrap().is_none());
}

#[test]
fn test_grad_setters() {
    let ctx = Context::with_seed(0);
    let mut g = Graph::train(&ctx);
    let x = g.variable(NdArray::zeros(&[2]));
    g.add_grad(x, arr(vec![1.0, 2.0], vec![2])).unwrap();
    g.add_grad(x, arr(vec![1.0, 2.0], vec![2])).unwrap();
    assert_eq!(g.grad(x).unwrap().unwrap().data(), &[2.0, 4.0]);

    assert!(g.set_grad(x, NdArray::zeros(&[3])).unwrap_err().is_shape_error());
    g.set_grad(x, NdArray::ones(&[2])).unwrap();
    assert_eq!(g.grad(x).unwrap().unwrap().data(), &[1.0, 1.0]);

    g.zero_grad(x).unwrap();
    assert!(g.grad(x).unwrap().is_none(), "zero_grad leaves the gradient absent");
}

#[test]
fn test_set_requires_grad_keeps_existing_grad() {
    let ctx = Context::with_seed(0);
    let mut g = Graph::train(&ctx);
    let x = g.variable(NdArray::zeros(&[1]));
    g.add_grad(x, NdArray::ones(&[1])).unwrap();
    let same = g.set_requires_grad(x, false).unwrap();
    assert_eq!(same, x);
    assert!(g.grad(x).unwrap().is_some());
}

#[test]
fn test_param_binding_is_unique_per_graph() {
    let ctx = Context::with_seed(0);
    let p = ctx.parameter("w", arr(vec![1.0, 2.0], vec![2]));
    let mut g = Graph::train(&ctx);
    let first = g.param(&p);
    let second = g.param(&p);
    assert_eq!(first, second);
    assert_eq!(g.len(), 1);
    assert_eq!(g.name(first).unwrap(), Some("w"));
    assert_eq!(g.bound_param(first), Some(&p));

    let mut other = Graph::eval(&ctx);
    let c = other.constant(NdArray::zeros(&[1]));
    let bound = other.param(&p);
    assert_ne!(c, bound);
    assert_eq!(other.mode(), Mode::Eval);
}

#[test]
fn test_names_and_debug_output() {
    let ctx = Context::with_seed(0);
    let mut g = Graph::train(&ctx);
    let x = g.variable(NdArray::zeros(&[1]));
    g.set_name(x, "input").unwrap();
    let y = g.exp(x).unwrap();
    let text = format!("{:?}", g);
    assert!(text.contains("'input'"));
    assert!(text.contains("Exp"));
    assert_eq!(g.op(y).unwrap().name(), "Exp");
}
