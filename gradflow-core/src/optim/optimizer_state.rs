use crate::array::NdArray;
use crate::nn::parameter::ParamId;
use std::collections::HashMap;

/// Per-parameter moments kept by Adam.
#[derive(Debug, Clone, PartialEq)]
pub struct AdamParamState {
    /// First moment estimate.
    pub m: NdArray,
    /// Second moment estimate.
    pub v: NdArray,
    /// Running maximum of the bias-corrected second moment (AMSGrad only).
    pub v_max: Option<NdArray>,
}

/// Snapshot of an optimizer's internal buffers.
///
/// Entries are keyed by [`ParamId`], so a snapshot can only be loaded back
/// into an optimizer tracking the same parameter handles.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OptimizerState {
    /// SGD momentum buffers.
    Sgd { momentum_buffers: HashMap<ParamId, NdArray> },
    /// Adam step count and moments.
    Adam {
        step: u64,
        params: HashMap<ParamId, AdamParamState>,
    },
    /// No state recorded yet.
    #[default]
    Empty,
}

impl OptimizerState {
    /// Name of the optimizer the state belongs to.
    pub fn kind(&self) -> &'static str {
        match self {
            OptimizerState::Sgd { .. } => "SGD",
            OptimizerState::Adam { .. } => "Adam",
            OptimizerState::Empty => "empty",
        }
    }
}
