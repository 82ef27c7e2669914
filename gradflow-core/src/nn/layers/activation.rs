//! Parameter-free activation modules wrapping the graph operations.

use crate::autograd::{Graph, TensorId};
use crate::error::Result;
use crate::nn::module::Module;

macro_rules! activation_module {
    ($(#[$doc:meta])* $name:ident, $method:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Module for $name {
            fn forward(&self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId> {
                g.$method(x)
            }
        }
    };
}

activation_module!(Sigmoid, sigmoid);
activation_module!(Tanh, tanh);
activation_module!(
    /// `max(x, 0)`.
    Relu,
    relu
);

/// Softmax along `axis`.
#[derive(Debug, Clone, Copy)]
pub struct Softmax {
    pub axis: usize,
}

impl Softmax {
    pub fn new(axis: usize) -> Self {
        Softmax { axis }
    }
}

impl Module for Softmax {
    fn forward(&self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId> {
        g.softmax(x, self.axis)
    }
}

/// Log-softmax along `axis`.
#[derive(Debug, Clone, Copy)]
pub struct LogSoftmax {
    pub axis: usize,
}

impl LogSoftmax {
    pub fn new(axis: usize) -> Self {
        LogSoftmax { axis }
    }
}

impl Module for LogSoftmax {
    fn forward(&self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId> {
        g.log_softmax(x, self.axis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::NdArray;
    use crate::context::Context;
    use approx::assert_relative_eq;

    #[test]
    fn test_activation_modules_match_ops() {
        let ctx = Context::with_seed(0);
        let mut g = Graph::eval(&ctx);
        let x = g.constant(NdArray::new(vec![-1.0, 0.0, 2.0], vec![1, 3]).unwrap());

        let r = Relu.forward(&mut g, x).unwrap();
        assert_eq!(g.value(r).unwrap().data(), &[0.0, 0.0, 2.0]);
        let s = Sigmoid.forward(&mut g, x).unwrap();
        assert_relative_eq!(g.value(s).unwrap().data()[1], 0.5);
        let t = Tanh.forward(&mut g, x).unwrap();
        assert_relative_eq!(g.value(t).unwrap().data()[2], 2.0f64.tanh());

        let p = Softmax::new(1).forward(&mut g, x).unwrap();
        assert_relative_eq!(g.value(p).unwrap().sum_all(), 1.0, epsilon = 1e-12);
        let lp = LogSoftmax::new(1).forward(&mut g, x).unwrap();
        let exp_sum: f64 = g.value(lp).unwrap().data().iter().map(|v| v.exp()).sum();
        assert_relative_eq!(exp_sum, 1.0, epsilon = 1e-12);
        assert!(Softmax::new(1).parameters().is_empty());
    }
}
