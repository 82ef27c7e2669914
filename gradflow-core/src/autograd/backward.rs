use crate::array::NdArray;
use crate::autograd::back_function::accumulate;
use crate::autograd::graph::{Graph, TensorId};
use crate::error::{GradflowError, Result};
use std::collections::VecDeque;

impl Graph<'_> {
    /// Backpropagates from a one-element `root`, seeding its adjoint with 1.
    pub fn backward(&mut self, root: TensorId) -> Result<()> {
        let value = self.value(root)?;
        if value.numel() != 1 {
            return Err(GradflowError::BackwardNonScalar {
                shape: value.shape().to_vec(),
            });
        }
        let seed = NdArray::ones_like(value);
        self.propagate(root, seed)
    }

    /// Backpropagates from `root` with an explicit seed of the root's shape.
    pub fn backward_with(&mut self, root: TensorId, seed: NdArray) -> Result<()> {
        let shape = self.shape(root)?;
        if seed.shape() != shape {
            return Err(GradflowError::SeedShapeMismatch {
                expected: shape.to_vec(),
                actual: seed.shape().to_vec(),
            });
        }
        self.propagate(root, seed)
    }

    /// Reverse traversal driven by pending-consumer counts.
    ///
    /// A node is processed once every consumer reachable from `root` has
    /// contributed to its adjoint. Adjoints of this pass are collected
    /// separately and then added to the node gradients, and into the bound
    /// parameters for parameter leaves, so repeated passes accumulate.
    fn propagate(&mut self, root: TensorId, seed: NdArray) -> Result<()> {
        if !self.node(root)?.requires_grad {
            log::debug!("backward from {} skipped: root does not require grad", root);
            return Ok(());
        }

        let n = root.0 + 1;
        let mut pending = vec![0usize; n];
        let mut reached = vec![false; n];
        reached[root.0] = true;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for operand in self.nodes[id.0].op.operands() {
                if !self.nodes[operand.0].requires_grad {
                    continue;
                }
                pending[operand.0] += 1;
                if !reached[operand.0] {
                    reached[operand.0] = true;
                    stack.push(operand);
                }
            }
        }

        let mut adjoints: Vec<Option<NdArray>> = vec![None; n];
        adjoints[root.0] = Some(seed);
        let mut ready = VecDeque::from([root]);
        let mut order = Vec::new();
        while let Some(id) = ready.pop_front() {
            order.push(id);
            let node = &self.nodes[id.0];
            if let Some(grad) = adjoints[id.0].as_ref() {
                let back_functions = node.op.back_functions(self, id, grad)?;
                for bf in back_functions {
                    let target = &self.nodes[bf.target.0];
                    if !target.requires_grad {
                        continue;
                    }
                    accumulate(&mut adjoints[bf.target.0], &target.value, bf.contribution)?;
                }
            }
            for operand in node.op.operands() {
                if !self.nodes[operand.0].requires_grad {
                    continue;
                }
                pending[operand.0] -= 1;
                if pending[operand.0] == 0 {
                    ready.push_back(operand);
                }
            }
        }

        let mut pushed = 0;
        for id in order.iter() {
            let Some(adjoint) = adjoints[id.0].take() else {
                continue;
            };
            let node = &mut self.nodes[id.0];
            if let Some(param) = node.param.as_ref() {
                param.add_grad(adjoint.clone())?;
                pushed += 1;
            }
            match node.grad.as_mut() {
                Some(existing) => existing.add_(&adjoint)?,
                None => node.grad = Some(adjoint),
            }
        }
        log::debug!(
            "backward from {}: visited {} nodes, pushed {} parameter gradients",
            root,
            order.len(),
            pushed
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "backward_test.rs"]
mod tests;
