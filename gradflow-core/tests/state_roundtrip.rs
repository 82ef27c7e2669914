use gradflow_core::nn::state::{load_state, save_state};
use gradflow_core::nn::{BatchNorm1d, Linear, NetworkState, Relu, Sequential};
use gradflow_core::{Context, GradflowError, Graph, Module};

mod common;
use common::array;

fn network(ctx: &Context) -> Sequential {
    Sequential::new()
        .add(Linear::new(ctx, 3, 4).unwrap())
        .add(BatchNorm1d::new(ctx, 4).unwrap())
        .add(Relu)
        .add(Linear::new(ctx, 4, 2).unwrap())
}

#[test]
fn test_state_round_trip_through_bytes() {
    let ctx = Context::with_seed(1);
    let source = network(&ctx);

    // Move the running statistics away from their initial values.
    let mut g = Graph::train(&ctx);
    let x = g.constant(array(vec![0.1, 0.2, 0.3, 1.0, -1.0, 0.5, 2.0, 0.0, -0.3], vec![3, 3]));
    source.forward(&mut g, x).unwrap();

    let mut bytes = Vec::new();
    save_state(&source, &mut bytes).unwrap();

    let target = network(&Context::with_seed(2));
    assert_ne!(target.state(), source.state());
    load_state(&target, bytes.as_slice()).unwrap();
    assert_eq!(target.state(), source.state());

    let names: Vec<String> = source.state().iter().map(|(n, _)| n.to_string()).collect();
    assert!(names.contains(&"1.running_mean".to_string()));
    assert!(names.contains(&"3.weight".to_string()));

    let mut ga = Graph::eval(&ctx);
    let mut gb = Graph::eval(&ctx);
    let probe = array(vec![0.5, -0.5, 1.5], vec![1, 3]);
    let xa = ga.constant(probe.clone());
    let xb = gb.constant(probe);
    let ya = source.forward(&mut ga, xa).unwrap();
    let yb = target.forward(&mut gb, xb).unwrap();
    assert_eq!(ga.value(ya).unwrap(), gb.value(yb).unwrap());
}

#[test]
fn test_state_file_round_trip() {
    let ctx = Context::with_seed(3);
    let model = network(&ctx);
    let path = std::env::temp_dir().join(format!("gradflow_state_{}.gfst", std::process::id()));
    model.state().save_file(&path).unwrap();
    let loaded = NetworkState::load_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, model.state());
}

#[test]
fn test_loading_into_a_different_architecture_fails() {
    let ctx = Context::with_seed(4);
    let model = network(&ctx);
    let other = Sequential::new().add(Linear::new(&ctx, 3, 5).unwrap());
    let result = other.load_state(&model.state());
    assert!(result.unwrap_err().is_shape_error());

    let empty = NetworkState::new();
    assert!(matches!(
        model.load_state(&empty),
        Err(GradflowError::SerializationError(_))
    ));
    assert!(matches!(
        NetworkState::read_from(&b"NOPE"[..]),
        Err(GradflowError::SerializationError(_))
    ));
}
