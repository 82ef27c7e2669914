use crate::autograd::{Graph, TensorId};
use crate::error::{GradflowError, Result};
use crate::nn::parameter::Parameter;
use crate::nn::state::NetworkState;
use std::collections::HashSet;
use std::fmt;

/// The base trait for layers and containers.
///
/// A module owns its [`Parameter`]s and buffers but no graph state: every
/// forward call records into the [`Graph`] it is given, and that graph's
/// [`Mode`](crate::autograd::Mode) decides train or eval behaviour.
pub trait Module: fmt::Debug + Send + Sync {
    /// Forward pass for the usual single input, single output case.
    fn forward(&self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId>;

    /// Forward pass over several inputs. The default accepts exactly one
    /// input and delegates to [`Module::forward`].
    fn forward_many(&self, g: &mut Graph<'_>, xs: &[TensorId]) -> Result<TensorId> {
        match xs {
            [x] => self.forward(g, *x),
            _ => Err(GradflowError::UnsupportedOperation(format!(
                "{:?} takes a single input, got {}",
                self,
                xs.len()
            ))),
        }
    }

    /// Direct sub-modules with the names used as prefixes in parameter and
    /// buffer names.
    fn named_children(&self) -> Vec<(String, &dyn Module)> {
        Vec::new()
    }

    /// Learnable parameters with hierarchical names such as `0.weight`.
    ///
    /// The default collects those of [`Module::named_children`]; layers that
    /// hold parameters themselves override it.
    fn named_parameters(&self) -> Vec<(String, Parameter)> {
        prefixed(self.named_children(), |m| m.named_parameters())
    }

    /// Learnable parameters, each listed once even when shared.
    fn parameters(&self) -> Vec<Parameter> {
        let mut seen = HashSet::new();
        self.named_parameters()
            .into_iter()
            .filter_map(|(_, p)| seen.insert(p.id()).then_some(p))
            .collect()
    }

    /// Non-learnable state that is persisted with the parameters, such as
    /// running statistics.
    fn named_buffers(&self) -> Vec<(String, Parameter)> {
        prefixed(self.named_children(), |m| m.named_buffers())
    }

    fn buffers(&self) -> Vec<Parameter> {
        self.named_buffers().into_iter().map(|(_, b)| b).collect()
    }

    /// Drops the gradient of every parameter.
    fn zero_grad(&self) {
        for p in self.parameters() {
            p.zero_grad();
        }
    }

    /// Snapshot of every parameter and buffer value, by name.
    fn state(&self) -> NetworkState {
        NetworkState::capture(self)
    }

    /// Restores values captured by [`Module::state`] into this module.
    fn load_state(&self, state: &NetworkState) -> Result<()> {
        state.restore(self)
    }
}

fn prefixed(
    children: Vec<(String, &dyn Module)>,
    collect: impl Fn(&dyn Module) -> Vec<(String, Parameter)>,
) -> Vec<(String, Parameter)> {
    children
        .into_iter()
        .flat_map(|(prefix, child)| {
            collect(child)
                .into_iter()
                .map(move |(name, p)| (format!("{}.{}", prefix, name), p))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::NdArray;
    use crate::context::Context;

    #[derive(Debug)]
    struct Scale {
        factor: Parameter,
    }

    impl Module for Scale {
        fn forward(&self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId> {
            let f = g.param(&self.factor);
            g.mul(x, f)
        }

        fn named_parameters(&self) -> Vec<(String, Parameter)> {
            vec![("factor".to_string(), self.factor.clone())]
        }
    }

    #[derive(Debug)]
    struct Pair {
        first: Scale,
        second: Scale,
    }

    impl Module for Pair {
        fn forward(&self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId> {
            let y = self.first.forward(g, x)?;
            self.second.forward(g, y)
        }

        fn named_children(&self) -> Vec<(String, &dyn Module)> {
            vec![("first".to_string(), &self.first), ("second".to_string(), &self.second)]
        }
    }

    fn scale(v: f64) -> Scale {
        Scale {
            factor: Parameter::new(NdArray::scalar(v)),
        }
    }

    #[test]
    fn test_nested_names_and_shared_parameters() {
        let shared = scale(2.0);
        let pair = Pair {
            second: Scale {
                factor: shared.factor.clone(),
            },
            first: shared,
        };
        let names: Vec<String> = pair.named_parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["first.factor", "second.factor"]);
        assert_eq!(pair.parameters().len(), 1);
        assert!(pair.buffers().is_empty());
    }

    #[test]
    fn test_forward_many_delegates_single_input() {
        let ctx = Context::with_seed(0);
        let mut g = Graph::train(&ctx);
        let m = scale(3.0);
        let x = g.constant(NdArray::ones(&[2]));
        let y = m.forward_many(&mut g, &[x]).unwrap();
        assert_eq!(g.value(y).unwrap().data(), &[3.0, 3.0]);
        assert!(matches!(
            m.forward_many(&mut g, &[x, x]),
            Err(GradflowError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_zero_grad_clears_parameters() {
        let ctx = Context::with_seed(0);
        let m = Pair {
            first: scale(2.0),
            second: scale(5.0),
        };
        let mut g = Graph::train(&ctx);
        let x = g.constant(NdArray::ones(&[1]));
        let y = m.forward(&mut g, x).unwrap();
        let s = g.sum(y).unwrap();
        g.backward(s).unwrap();
        assert_eq!(m.first.factor.grad().unwrap().item().unwrap(), 5.0);
        m.zero_grad();
        assert!(m.parameters().iter().all(|p| !p.has_grad()));
    }
}
