use crate::array::NdArray;
use crate::error::{GradflowError, Result};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(0);

/// Stable identity of a parameter, shared by all its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(u64);

impl ParamId {
    fn next() -> Self {
        ParamId(NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct ParamData {
    name: Option<String>,
    value: NdArray,
    grad: Option<NdArray>,
    requires_grad: bool,
}

/// A learnable leaf that outlives any single computation graph.
///
/// `Parameter` is a cheap shared handle: clones point at the same value and
/// gradient. Graphs bind it to one leaf node per graph; after backward the
/// node's gradient is added into the parameter, and optimizers update the
/// value in place.
#[derive(Clone)]
pub struct Parameter {
    id: ParamId,
    inner: Arc<RwLock<ParamData>>,
}

impl Parameter {
    /// Creates a parameter with `requires_grad = true`.
    pub fn new(value: NdArray) -> Self {
        Parameter {
            id: ParamId::next(),
            inner: Arc::new(RwLock::new(ParamData {
                name: None,
                value,
                grad: None,
                requires_grad: true,
            })),
        }
    }

    pub fn named(name: impl Into<String>, value: NdArray) -> Self {
        let p = Parameter::new(value);
        p.write().name = Some(name.into());
        p
    }

    fn read(&self) -> RwLockReadGuard<'_, ParamData> {
        self.inner.read().unwrap_or_else(|poisoned| {
            log::warn!("parameter {:?} lock was poisoned, recovering", self.id);
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, ParamData> {
        self.inner.write().unwrap_or_else(|poisoned| {
            log::warn!("parameter {:?} lock was poisoned, recovering", self.id);
            poisoned.into_inner()
        })
    }

    pub fn id(&self) -> ParamId {
        self.id
    }

    pub fn name(&self) -> Option<String> {
        self.read().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) -> &Self {
        self.write().name = Some(name.into());
        self
    }

    /// Snapshot of the current value.
    pub fn value(&self) -> NdArray {
        self.read().value.clone()
    }

    /// Runs `f` against the value under a read guard, without copying.
    pub fn with_value<R>(&self, f: impl FnOnce(&NdArray) -> R) -> R {
        f(&self.read().value)
    }

    pub fn shape(&self) -> Vec<usize> {
        self.read().value.shape().to_vec()
    }

    pub fn numel(&self) -> usize {
        self.read().value.numel()
    }

    /// Replaces the value; the new array must have the same shape.
    pub fn set_value(&self, value: NdArray) -> Result<()> {
        let mut data = self.write();
        if data.value.shape() != value.shape() {
            return Err(GradflowError::shape_mismatch(data.value.shape(), value.shape(), "Parameter::set_value"));
        }
        data.value = value;
        Ok(())
    }

    /// Re-initialises the value with any shape and drops the gradient.
    pub fn reset_value(&self, value: NdArray) {
        let mut data = self.write();
        data.value = value;
        data.grad = None;
    }

    pub fn grad(&self) -> Option<NdArray> {
        self.read().grad.clone()
    }

    pub fn has_grad(&self) -> bool {
        self.read().grad.is_some()
    }

    pub fn set_grad(&self, grad: NdArray) -> Result<()> {
        let mut data = self.write();
        if data.value.shape() != grad.shape() {
            return Err(GradflowError::shape_mismatch(data.value.shape(), grad.shape(), "Parameter::set_grad"));
        }
        data.grad = Some(grad);
        Ok(())
    }

    /// Moves `grad` in when absent, adds it in place otherwise.
    pub fn add_grad(&self, grad: NdArray) -> Result<()> {
        let mut data = self.write();
        if data.value.shape() != grad.shape() {
            return Err(GradflowError::shape_mismatch(data.value.shape(), grad.shape(), "Parameter::add_grad"));
        }
        match data.grad.as_mut() {
            Some(existing) => existing.add_(&grad)?,
            None => data.grad = Some(grad),
        }
        Ok(())
    }

    /// Drops the gradient to absent.
    pub fn zero_grad(&self) {
        self.write().grad = None;
    }

    pub fn requires_grad(&self) -> bool {
        self.read().requires_grad
    }

    /// Toggles gradient tracking. An existing gradient is kept.
    pub fn set_requires_grad(&self, requires_grad: bool) -> &Self {
        self.write().requires_grad = requires_grad;
        self
    }

    /// Gives `f` the value mutably and the gradient read-only under one
    /// write guard. This is the update path used by optimizers.
    pub fn update<R>(&self, f: impl FnOnce(&mut NdArray, Option<&NdArray>) -> Result<R>) -> Result<R> {
        let mut guard = self.write();
        let data = &mut *guard;
        f(&mut data.value, data.grad.as_ref())
    }

    /// Gives `f` mutable access to an existing gradient. No-op when absent.
    pub fn update_grad(&self, f: impl FnOnce(&mut NdArray)) {
        if let Some(grad) = self.write().grad.as_mut() {
            f(grad);
        }
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.read();
        f.debug_struct("Parameter")
            .field("id", &self.id.0)
            .field("name", &data.name)
            .field("shape", &data.value.shape())
            .field("has_grad", &data.grad.is_some())
            .finish()
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Parameter {}

#[cfg(test)]
#[path = "parameter_test.rs"]
mod tests;
