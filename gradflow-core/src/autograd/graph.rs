use crate::array::NdArray;
use crate::autograd::op::Op;
use crate::context::Context;
use crate::error::{GradflowError, Result};
use crate::nn::parameter::{ParamId, Parameter};
use std::collections::HashMap;
use std::fmt;

/// Handle of a node inside one [`Graph`].
///
/// Ids are indices into the graph's arena; an operand id is always smaller
/// than the id of the node consuming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(pub(crate) usize);

impl TensorId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Configuration of one forward call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Train,
    Eval,
}

#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) name: Option<String>,
    pub(crate) value: NdArray,
    pub(crate) grad: Option<NdArray>,
    pub(crate) requires_grad: bool,
    pub(crate) op: Op,
    pub(crate) param: Option<Parameter>,
}

/// Arena holding every tensor of one forward/backward cycle.
///
/// Operations are methods on the graph: each reads its operands, computes the
/// forward value eagerly and appends one node. Dropping the graph discards all
/// nodes; parameters bound into it keep their own state.
pub struct Graph<'c> {
    ctx: &'c Context,
    mode: Mode,
    pub(crate) nodes: Vec<Node>,
    bindings: HashMap<ParamId, TensorId>,
}

impl<'c> Graph<'c> {
    pub fn new(ctx: &'c Context, mode: Mode) -> Self {
        Graph {
            ctx,
            mode,
            nodes: Vec::new(),
            bindings: HashMap::new(),
        }
    }

    pub fn train(ctx: &'c Context) -> Self {
        Self::new(ctx, Mode::Train)
    }

    pub fn eval(ctx: &'c Context) -> Self {
        Self::new(ctx, Mode::Eval)
    }

    pub fn ctx(&self) -> &'c Context {
        self.ctx
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_training(&self) -> bool {
        self.mode == Mode::Train
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn node(&self, id: TensorId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(GradflowError::UnknownTensor(id.0))
    }

    fn node_mut(&mut self, id: TensorId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(GradflowError::UnknownTensor(id.0))
    }

    fn push(&mut self, node: Node) -> TensorId {
        let id = TensorId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Adds a leaf holding `value`.
    pub fn leaf(&mut self, value: NdArray, requires_grad: bool) -> TensorId {
        self.push(Node {
            name: None,
            value,
            grad: None,
            requires_grad,
            op: Op::Leaf,
            param: None,
        })
    }

    /// Leaf that never receives a gradient.
    pub fn constant(&mut self, value: NdArray) -> TensorId {
        self.leaf(value, false)
    }

    /// Leaf that collects a gradient.
    pub fn variable(&mut self, value: NdArray) -> TensorId {
        self.leaf(value, true)
    }

    /// Rank-0 constant in the context dtype.
    pub fn scalar(&mut self, value: f64) -> TensorId {
        let value = self.ctx.scalar(value);
        self.constant(value)
    }

    /// Binds `param` to a leaf of this graph. Binding the same parameter
    /// again returns the existing leaf, so shared weights fan out.
    pub fn param(&mut self, param: &Parameter) -> TensorId {
        if let Some(&id) = self.bindings.get(&param.id()) {
            return id;
        }
        let id = self.push(Node {
            name: param.name(),
            value: param.value(),
            grad: None,
            requires_grad: param.requires_grad(),
            op: Op::Leaf,
            param: Some(param.clone()),
        });
        self.bindings.insert(param.id(), id);
        id
    }

    /// The parameter bound to `id`, if any.
    pub fn bound_param(&self, id: TensorId) -> Option<&Parameter> {
        self.nodes.get(id.0).and_then(|n| n.param.as_ref())
    }

    /// Appends an operation node. It requires a gradient when any operand does.
    pub(crate) fn record(&mut self, value: NdArray, op: Op) -> TensorId {
        let requires_grad = op
            .operands()
            .iter()
            .any(|o| self.nodes.get(o.0).map_or(false, |n| n.requires_grad));
        self.push(Node {
            name: None,
            value,
            grad: None,
            requires_grad,
            op,
            param: None,
        })
    }

    pub fn value(&self, id: TensorId) -> Result<&NdArray> {
        Ok(&self.node(id)?.value)
    }

    pub fn shape(&self, id: TensorId) -> Result<&[usize]> {
        Ok(self.node(id)?.value.shape())
    }

    /// Value of a one-element tensor.
    pub fn item(&self, id: TensorId) -> Result<f64> {
        self.node(id)?.value.item()
    }

    /// Replaces a value with one of the same shape.
    pub fn set_value(&mut self, id: TensorId, value: NdArray) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.value.shape() != value.shape() {
            return Err(GradflowError::shape_mismatch(node.value.shape(), value.shape(), "set_value"));
        }
        node.value = value;
        Ok(())
    }

    /// Replaces a value with one of any shape; the gradient is dropped.
    pub fn reset_value(&mut self, id: TensorId, value: NdArray) -> Result<()> {
        let node = self.node_mut(id)?;
        node.value = value;
        node.grad = None;
        Ok(())
    }

    pub fn grad(&self, id: TensorId) -> Result<Option<&NdArray>> {
        Ok(self.node(id)?.grad.as_ref())
    }

    pub fn set_grad(&mut self, id: TensorId, grad: NdArray) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.value.shape() != grad.shape() {
            return Err(GradflowError::shape_mismatch(node.value.shape(), grad.shape(), "set_grad"));
        }
        node.grad = Some(grad);
        Ok(())
    }

    /// Moves `grad` in when the node has none, adds it in place otherwise.
    pub fn add_grad(&mut self, id: TensorId, grad: NdArray) -> Result<()> {
        let node = self.node_mut(id)?;
        if node.value.shape() != grad.shape() {
            return Err(GradflowError::shape_mismatch(node.value.shape(), grad.shape(), "add_grad"));
        }
        match node.grad.as_mut() {
            Some(existing) => existing.add_(&grad)?,
            None => node.grad = Some(grad),
        }
        Ok(())
    }

    /// Drops the gradient of one node to absent.
    pub fn zero_grad(&mut self, id: TensorId) -> Result<()> {
        self.node_mut(id)?.grad = None;
        Ok(())
    }

    /// Drops every node gradient in the graph.
    pub fn zero_grads(&mut self) {
        for node in self.nodes.iter_mut() {
            node.grad = None;
        }
    }

    pub fn requires_grad(&self, id: TensorId) -> Result<bool> {
        Ok(self.node(id)?.requires_grad)
    }

    pub(crate) fn needs_grad(&self, id: TensorId) -> bool {
        self.nodes.get(id.0).map_or(false, |n| n.requires_grad)
    }

    /// Toggles gradient tracking; an existing gradient is kept.
    ///
    /// Only affects operations recorded afterwards.
    pub fn set_requires_grad(&mut self, id: TensorId, requires_grad: bool) -> Result<TensorId> {
        self.node_mut(id)?.requires_grad = requires_grad;
        Ok(id)
    }

    /// Operand ids the node's backward step contributes to.
    pub fn back_functions(&self, id: TensorId) -> Result<Vec<TensorId>> {
        Ok(self.node(id)?.op.operands())
    }

    pub fn op(&self, id: TensorId) -> Result<&Op> {
        Ok(&self.node(id)?.op)
    }

    pub fn name(&self, id: TensorId) -> Result<Option<&str>> {
        Ok(self.node(id)?.name.as_deref())
    }

    pub fn set_name(&mut self, id: TensorId, name: impl Into<String>) -> Result<TensorId> {
        self.node_mut(id)?.name = Some(name.into());
        Ok(id)
    }
}

impl fmt::Debug for Graph<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph(mode={:?}, nodes={})", self.mode, self.nodes.len())?;
        for (i, node) in self.nodes.iter().enumerate() {
            writeln!(
                f,
                "  #{} {}{} shape={:?} requires_grad={} grad={}",
                i,
                node.op.name(),
                node.name.as_ref().map(|n| format!(" '{}'", n)).unwrap_or_default(),
                node.value.shape(),
                node.requires_grad,
                node.grad.is_some()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;
