//! Assertion helpers shared by unit and integration tests.

use crate::array::NdArray;
use crate::autograd::grad_check::check_grad;
use crate::autograd::{Graph, TensorId};
use crate::context::Context;
use crate::error::GradflowError;

/// Step used by [`assert_gradients`] for central differences.
pub const GRAD_CHECK_EPSILON: f64 = 1e-6;
/// Relative tolerance used by [`assert_gradients`].
pub const GRAD_CHECK_TOLERANCE: f64 = 1e-4;

/// Checks that an array has the expected shape and data within `tolerance`.
/// Panics with the first differing index otherwise.
pub fn check_array_near(actual: &NdArray, expected_shape: &[usize], expected_data: &[f64], tolerance: f64) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");
    assert_eq!(actual.numel(), expected_data.len(), "Data length mismatch");
    for (i, (a, e)) in actual.data().iter().zip(expected_data.iter()).enumerate() {
        let diff = (a - e).abs();
        if !(diff <= tolerance) {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

pub fn create_test_array(data: Vec<f64>, shape: Vec<usize>) -> NdArray {
    NdArray::new(data, shape).expect("Failed to create test array")
}

/// Gradient data of `id`, panicking when it is absent.
pub fn grad_data(g: &Graph<'_>, id: TensorId) -> Vec<f64> {
    g.grad(id)
        .expect("unknown tensor")
        .unwrap_or_else(|| panic!("tensor {} has no gradient", id))
        .data()
        .to_vec()
}

/// Runs the finite-difference gradient check on `func` and panics with the
/// failure details when it does not pass.
pub fn assert_gradients<F>(inputs: &[NdArray], func: F)
where
    F: Fn(&mut Graph<'_>, &[TensorId]) -> Result<TensorId, GradflowError>,
{
    let ctx = Context::with_seed(0);
    if let Err(e) = check_grad(&ctx, func, inputs, None, GRAD_CHECK_EPSILON, GRAD_CHECK_TOLERANCE) {
        panic!("gradient check failed: {}", e);
    }
}
