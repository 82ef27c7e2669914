use super::optimizer_state::OptimizerState;
use super::param_group::ParamGroup;
use crate::error::Result;

/// Common interface of all optimizers.
///
/// Optimizers update the values of the parameters they track from the
/// gradients accumulated by backward passes.
pub trait Optimizer {
    /// Applies one update to every tracked parameter that has a gradient.
    /// Parameters without a gradient are left untouched, so a step before
    /// any backward pass changes nothing.
    fn step(&mut self) -> Result<()>;

    /// Drops the gradient of every tracked parameter.
    fn zero_grad(&mut self) {
        for group in self.param_groups() {
            for p in group.params() {
                p.zero_grad();
            }
        }
    }

    fn add_param_group(&mut self, param_group: ParamGroup);

    fn param_groups(&self) -> &[ParamGroup];

    /// Mutable access to the groups, used by learning-rate schedulers.
    fn param_groups_mut(&mut self) -> &mut [ParamGroup];

    /// Copy of the internal buffers (momentum, moments).
    fn state_dict(&self) -> OptimizerState;

    /// Replaces the internal buffers with `state`.
    fn load_state_dict(&mut self, state: &OptimizerState) -> Result<()>;
}
