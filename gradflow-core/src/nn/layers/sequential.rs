use crate::autograd::{Graph, TensorId};
use crate::error::Result;
use crate::nn::module::Module;

/// Runs its modules one after the other. Children are named by position,
/// so parameters read `0.weight`, `0.bias`, `2.weight` and so on.
#[derive(Debug, Default)]
pub struct Sequential {
    modules: Vec<Box<dyn Module>>,
}

impl Sequential {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `module`, builder style.
    pub fn add(mut self, module: impl Module + 'static) -> Self {
        self.modules.push(Box::new(module));
        self
    }

    pub fn push(&mut self, module: Box<dyn Module>) {
        self.modules.push(module);
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl Module for Sequential {
    fn forward(&self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId> {
        self.modules.iter().try_fold(x, |current, module| module.forward(g, current))
    }

    fn named_children(&self) -> Vec<(String, &dyn Module)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, m)| (i.to_string(), m.as_ref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::nn::layers::{BatchNorm1d, Linear, Relu};

    #[test]
    fn test_sequential_chains_and_names() {
        let ctx = Context::with_seed(3);
        let model = Sequential::new()
            .add(Linear::new(&ctx, 4, 3).unwrap())
            .add(Relu)
            .add(BatchNorm1d::new(&ctx, 3).unwrap())
            .add(Linear::new(&ctx, 3, 1).unwrap());
        assert_eq!(model.len(), 4);

        let names: Vec<String> = model.named_parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["0.weight", "0.bias", "2.gamma", "2.beta", "3.weight", "3.bias"]);
        let buffers: Vec<String> = model.named_buffers().into_iter().map(|(n, _)| n).collect();
        assert_eq!(buffers, vec!["2.running_mean", "2.running_var"]);

        let mut g = Graph::eval(&ctx);
        let x = g.constant(ctx.ones(&[5, 4]));
        let y = model.forward(&mut g, x).unwrap();
        assert_eq!(g.shape(y).unwrap(), &[5, 1]);
    }

    #[test]
    fn test_empty_sequential_is_identity() {
        let ctx = Context::with_seed(0);
        let model = Sequential::new();
        assert!(model.is_empty());
        let mut g = Graph::eval(&ctx);
        let x = g.constant(ctx.ones(&[2]));
        assert_eq!(model.forward(&mut g, x).unwrap(), x);
    }
}
