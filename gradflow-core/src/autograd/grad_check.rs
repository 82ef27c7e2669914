use crate::array::NdArray;
use crate::autograd::graph::{Graph, Mode, TensorId};
use crate::context::Context;
use crate::error::GradflowError;
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug)]
pub enum GradCheckError {
    #[error("Gradient check failed for input {input_index}, element {element_index}: analytical {analytical_grad} != numerical {numerical_grad} (difference {difference})")]
    GradientMismatch {
        input_index: usize,
        element_index: usize,
        analytical_grad: f64,
        numerical_grad: f64,
        difference: f64,
    },
    #[error("Forward function execution failed during gradient check: {0}")]
    ForwardPassError(GradflowError),
    #[error("Backward pass execution failed during gradient check: {0}")]
    BackwardPassError(GradflowError),
    #[error("Input {input_index} has no gradient after the backward pass")]
    MissingAnalyticalGrad { input_index: usize },
    #[error("Numerical gradient is NaN or infinite for input {input_index}, element {element_index} (loss+ {loss_plus}, loss- {loss_minus})")]
    NumericalGradNaNOrInfinite {
        input_index: usize,
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },
    #[error("Output gradient shape {actual:?} does not match output shape {expected:?}")]
    OutputGradShape { expected: Vec<usize>, actual: Vec<usize> },
}

/// Compares the analytical gradient of `func` with central differences.
///
/// `func` builds its result from the input leaves inside a fresh eval-mode
/// graph. The scalar probed numerically is `sum(output * output_grad)`, with
/// `output_grad` defaulting to ones. An element passes when
/// `|analytical - numerical| <= tolerance * max(1, |analytical|, |numerical|)`.
pub fn check_grad<F>(
    ctx: &Context,
    func: F,
    inputs: &[NdArray],
    output_grad: Option<&NdArray>,
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError>
where
    F: Fn(&mut Graph<'_>, &[TensorId]) -> Result<TensorId, GradflowError>,
{
    let mut graph = Graph::new(ctx, Mode::Eval);
    let leaves: Vec<TensorId> = inputs.iter().map(|a| graph.variable(a.clone())).collect();
    let output = func(&mut graph, &leaves).map_err(GradCheckError::ForwardPassError)?;
    let out_value = graph.value(output).map_err(GradCheckError::ForwardPassError)?;
    let weights = match output_grad {
        Some(w) if w.shape() != out_value.shape() => {
            return Err(GradCheckError::OutputGradShape {
                expected: out_value.shape().to_vec(),
                actual: w.shape().to_vec(),
            })
        }
        Some(w) => w.clone(),
        None => NdArray::ones_like(out_value),
    };
    graph
        .backward_with(output, weights.clone())
        .map_err(GradCheckError::BackwardPassError)?;

    for (i, input) in inputs.iter().enumerate() {
        let analytical = graph
            .grad(leaves[i])
            .map_err(GradCheckError::BackwardPassError)?
            .cloned()
            .ok_or(GradCheckError::MissingAnalyticalGrad { input_index: i })?;

        for elem in 0..input.numel() {
            let loss_plus = perturbed_loss(ctx, &func, inputs, i, elem, epsilon, &weights)?;
            let loss_minus = perturbed_loss(ctx, &func, inputs, i, elem, -epsilon, &weights)?;
            let numerical = (loss_plus - loss_minus) / (2.0 * epsilon);
            if !numerical.is_finite() {
                return Err(GradCheckError::NumericalGradNaNOrInfinite {
                    input_index: i,
                    element_index: elem,
                    loss_plus,
                    loss_minus,
                });
            }
            let a = analytical.data()[elem];
            let difference = (a - numerical).abs();
            let scale = 1.0f64.max(a.abs()).max(numerical.abs());
            if !(difference <= tolerance * scale) {
                return Err(GradCheckError::GradientMismatch {
                    input_index: i,
                    element_index: elem,
                    analytical_grad: a,
                    numerical_grad: numerical,
                    difference,
                });
            }
        }
    }
    Ok(())
}

fn perturbed_loss<F>(
    ctx: &Context,
    func: &F,
    inputs: &[NdArray],
    input_index: usize,
    element_index: usize,
    delta: f64,
    weights: &NdArray,
) -> Result<f64, GradCheckError>
where
    F: Fn(&mut Graph<'_>, &[TensorId]) -> Result<TensorId, GradflowError>,
{
    let mut graph = Graph::new(ctx, Mode::Eval);
    let leaves: Vec<TensorId> = inputs
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let mut a = a.clone();
            if i == input_index {
                a.data_mut()[element_index] += delta;
            }
            graph.constant(a)
        })
        .collect();
    let output = func(&mut graph, &leaves).map_err(GradCheckError::ForwardPassError)?;
    let value = graph.value(output).map_err(GradCheckError::ForwardPassError)?;
    Ok(value.data().iter().zip(weights.data()).map(|(v, w)| v * w).sum())
}
