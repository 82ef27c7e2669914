use crate::error::{GradflowError, Result};
use crate::nn::parameter::Parameter;
use std::collections::HashSet;

/// A set of parameters sharing a learning rate and weight decay.
///
/// Several groups let one optimizer apply different settings to different
/// parts of a model.
#[derive(Clone, Debug)]
pub struct ParamGroup {
    params: Vec<Parameter>,
    lr: f64,
    weight_decay: f64,
}

impl ParamGroup {
    /// Creates a group without weight decay. Parameters listed more than
    /// once are kept once.
    pub fn new(params: impl IntoIterator<Item = Parameter>, lr: f64) -> Result<Self> {
        check_lr(lr)?;
        let mut seen = HashSet::new();
        let params = params.into_iter().filter(|p| seen.insert(p.id())).collect();
        Ok(ParamGroup {
            params,
            lr,
            weight_decay: 0.0,
        })
    }

    pub fn with_weight_decay(mut self, weight_decay: f64) -> Result<Self> {
        if !(weight_decay >= 0.0) {
            return Err(GradflowError::ConfigurationError(format!(
                "weight decay must be non-negative, got {}",
                weight_decay
            )));
        }
        self.weight_decay = weight_decay;
        Ok(self)
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn set_lr(&mut self, lr: f64) {
        self.lr = lr;
    }

    pub fn weight_decay(&self) -> f64 {
        self.weight_decay
    }
}

pub(crate) fn check_lr(lr: f64) -> Result<()> {
    if !(lr > 0.0) || !lr.is_finite() {
        return Err(GradflowError::ConfigurationError(format!(
            "learning rate must be positive and finite, got {}",
            lr
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::NdArray;

    #[test]
    fn test_group_dedups_and_validates() {
        let p = Parameter::new(NdArray::zeros(&[2]));
        let q = Parameter::new(NdArray::zeros(&[3]));
        let group = ParamGroup::new(vec![p.clone(), q, p], 0.1).unwrap();
        assert_eq!(group.params().len(), 2);
        assert_eq!(group.lr(), 0.1);

        assert!(ParamGroup::new(Vec::new(), 0.0).is_err());
        assert!(ParamGroup::new(Vec::new(), f64::NAN).is_err());
        assert!(group.clone().with_weight_decay(-1.0).is_err());
        assert_eq!(group.with_weight_decay(0.5).unwrap().weight_decay(), 0.5);
    }
}
