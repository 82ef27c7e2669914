use crate::array::NdArray;
use crate::autograd::back_function::BackFunction;
use crate::autograd::graph::{Graph, TensorId};
use crate::error::Result;
use crate::ops::{activation, arithmetic, comparison, dropout, linalg, math_elem, reduction, stats, view};

/// Which group a statistic is computed over.
#[derive(Debug, Clone, PartialEq)]
pub enum Reduce {
    /// One axis, removed from the output.
    Axis(usize),
    /// The trailing dimensions, which must equal the given shape. The output
    /// keeps only the leading dimensions.
    On(Vec<usize>),
}

/// Element-wise comparison used by the masking operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Compare {
    pub fn test(self, x: f64, threshold: f64) -> bool {
        match self {
            Compare::Lt => x < threshold,
            Compare::Le => x <= threshold,
            Compare::Gt => x > threshold,
            Compare::Ge => x >= threshold,
            Compare::Eq => x == threshold,
            Compare::Ne => x != threshold,
        }
    }
}

/// The operation that produced a node, with whatever the backward rule
/// needs beyond the operand values.
#[derive(Debug, Clone)]
pub enum Op {
    Leaf,
    Identity(TensorId),
    Add(TensorId, TensorId),
    Sub(TensorId, TensorId),
    Mul(TensorId, TensorId),
    Div(TensorId, TensorId),
    Neg(TensorId),
    Exp(TensorId),
    Log { input: TensorId, eps: Option<f64> },
    Sqrt(TensorId),
    Sqr(TensorId),
    Sigmoid(TensorId),
    Tanh(TensorId),
    Max { input: TensorId, threshold: f64 },
    Sum(TensorId),
    Sum1d { input: TensorId, axis: usize },
    Mean1d { input: TensorId, axis: usize },
    MeanOn { input: TensorId, shape: Vec<usize> },
    Std {
        input: TensorId,
        mean: Option<TensorId>,
        reduce: Reduce,
        ddof: usize,
        eps: f64,
    },
    Standardize {
        input: TensorId,
        reduce: Reduce,
        ddof: usize,
        eps: f64,
    },
    Softmax { input: TensorId, axis: usize },
    LogSoftmax { input: TensorId, axis: usize },
    Reshape(TensorId),
    Narrow { input: TensorId, axis: usize, start: usize },
    Cat { inputs: Vec<TensorId>, axis: usize },
    Gather { input: TensorId, axis: usize, index: NdArray },
    Stretch(TensorId),
    Dropout { input: TensorId, mask: NdArray },
    Compare { input: TensorId, mask: NdArray },
    MatMul(TensorId, TensorId),
    Bvtm(TensorId, TensorId),
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Leaf => "Leaf",
            Op::Identity(_) => "Identity",
            Op::Add(..) => "Add",
            Op::Sub(..) => "Sub",
            Op::Mul(..) => "Mul",
            Op::Div(..) => "Div",
            Op::Neg(_) => "Neg",
            Op::Exp(_) => "Exp",
            Op::Log { .. } => "Log",
            Op::Sqrt(_) => "Sqrt",
            Op::Sqr(_) => "Sqr",
            Op::Sigmoid(_) => "Sigmoid",
            Op::Tanh(_) => "Tanh",
            Op::Max { .. } => "Max",
            Op::Sum(_) => "Sum",
            Op::Sum1d { .. } => "Sum1d",
            Op::Mean1d { .. } => "Mean1d",
            Op::MeanOn { .. } => "MeanOn",
            Op::Std { reduce: Reduce::Axis(_), .. } => "Std1d",
            Op::Std { .. } => "StdOn",
            Op::Standardize { reduce: Reduce::Axis(_), .. } => "Standardize1d",
            Op::Standardize { .. } => "StandardizeOn",
            Op::Softmax { .. } => "Softmax",
            Op::LogSoftmax { .. } => "LogSoftmax",
            Op::Reshape(_) => "Reshape",
            Op::Narrow { .. } => "Narrow",
            Op::Cat { .. } => "Cat",
            Op::Gather { .. } => "Gather",
            Op::Stretch(_) => "Stretch",
            Op::Dropout { .. } => "Dropout",
            Op::Compare { .. } => "Compare",
            Op::MatMul(..) => "MatMul",
            Op::Bvtm(..) => "Bvtm",
        }
    }

    /// Operand ids in the order the backward rule addresses them.
    pub fn operands(&self) -> Vec<TensorId> {
        match self {
            Op::Leaf => vec![],
            Op::Add(a, b) | Op::Sub(a, b) | Op::Mul(a, b) | Op::Div(a, b) | Op::MatMul(a, b) | Op::Bvtm(a, b) => {
                vec![*a, *b]
            }
            Op::Identity(x)
            | Op::Neg(x)
            | Op::Exp(x)
            | Op::Sqrt(x)
            | Op::Sqr(x)
            | Op::Sigmoid(x)
            | Op::Tanh(x)
            | Op::Sum(x)
            | Op::Reshape(x)
            | Op::Stretch(x) => vec![*x],
            Op::Log { input, .. }
            | Op::Max { input, .. }
            | Op::Sum1d { input, .. }
            | Op::Mean1d { input, .. }
            | Op::MeanOn { input, .. }
            | Op::Standardize { input, .. }
            | Op::Softmax { input, .. }
            | Op::LogSoftmax { input, .. }
            | Op::Narrow { input, .. }
            | Op::Gather { input, .. }
            | Op::Dropout { input, .. }
            | Op::Compare { input, .. } => vec![*input],
            Op::Std { input, mean, .. } => match mean {
                Some(m) => vec![*input, *m],
                None => vec![*input],
            },
            Op::Cat { inputs, .. } => inputs.clone(),
        }
    }

    /// Evaluates the backward rule of node `id` given its adjoint `grad`.
    ///
    /// Only operands with `requires_grad` receive a back function.
    pub(crate) fn back_functions(&self, g: &Graph<'_>, id: TensorId, grad: &NdArray) -> Result<Vec<BackFunction>> {
        match self {
            Op::Leaf => Ok(vec![]),
            Op::Identity(x) => arithmetic::identity_backward(g, *x, grad),
            Op::Add(a, b) => arithmetic::add_backward(g, *a, *b, grad),
            Op::Sub(a, b) => arithmetic::sub_backward(g, *a, *b, grad),
            Op::Mul(a, b) => arithmetic::mul_backward(g, *a, *b, grad),
            Op::Div(a, b) => arithmetic::div_backward(g, *a, *b, grad),
            Op::Neg(x) => arithmetic::neg_backward(g, *x, grad),
            Op::Exp(x) => math_elem::exp_backward(g, id, *x, grad),
            Op::Log { input, eps } => math_elem::log_backward(g, *input, *eps, grad),
            Op::Sqrt(x) => math_elem::sqrt_backward(g, id, *x, grad),
            Op::Sqr(x) => math_elem::sqr_backward(g, *x, grad),
            Op::Sigmoid(x) => activation::sigmoid_backward(g, id, *x, grad),
            Op::Tanh(x) => activation::tanh_backward(g, id, *x, grad),
            Op::Max { input, threshold } => activation::max_backward(g, *input, *threshold, grad),
            Op::Sum(x) => reduction::sum_backward(g, *x, grad),
            Op::Sum1d { input, axis } => reduction::sum1d_backward(g, *input, *axis, grad, 1.0),
            Op::Mean1d { input, axis } => {
                let n = g.value(*input)?.dim(*axis)? as f64;
                reduction::sum1d_backward(g, *input, *axis, grad, 1.0 / n)
            }
            Op::MeanOn { input, shape } => reduction::mean_on_backward(g, *input, shape, grad),
            Op::Std {
                input, mean, reduce, ddof, ..
            } => stats::std_backward(g, id, *input, *mean, reduce, *ddof, grad),
            Op::Standardize {
                input, reduce, ddof, eps,
            } => stats::standardize_backward(g, id, *input, reduce, *ddof, *eps, grad),
            Op::Softmax { input, axis } => activation::softmax_backward(g, id, *input, *axis, grad),
            Op::LogSoftmax { input, axis } => activation::log_softmax_backward(g, id, *input, *axis, grad),
            Op::Reshape(x) | Op::Stretch(x) => view::reshape_backward(g, *x, grad),
            Op::Narrow { input, axis, start } => view::narrow_backward(g, *input, *axis, *start, grad),
            Op::Cat { inputs, axis } => view::cat_backward(g, inputs, *axis, grad),
            Op::Gather { input, axis, index } => view::gather_backward(g, *input, *axis, index, grad),
            Op::Dropout { input, mask } => dropout::dropout_backward(g, *input, mask, grad),
            Op::Compare { input, mask } => comparison::compare_backward(g, *input, mask, grad),
            Op::MatMul(a, b) => linalg::matmul_backward(g, *a, *b, grad),
            Op::Bvtm(a, b) => linalg::bvtm_backward(g, *a, *b, grad),
        }
    }
}
