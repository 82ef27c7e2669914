use crate::autograd::{Graph, TensorId};
use crate::error::{GradflowError, Result};
use crate::nn::module::Module;

/// Inverted dropout: active when the graph is in training mode, identity
/// otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Dropout {
    p: f64,
}

impl Dropout {
    pub fn new(p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(GradflowError::ConfigurationError(format!(
                "dropout probability must be in [0, 1], got {}",
                p
            )));
        }
        Ok(Dropout { p })
    }

    pub fn p(&self) -> f64 {
        self.p
    }
}

impl Module for Dropout {
    fn forward(&self, g: &mut Graph<'_>, x: TensorId) -> Result<TensorId> {
        g.dropout(x, self.p)
    }
}
