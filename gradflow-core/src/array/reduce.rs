use super::broadcast::{axis_split, broadcast_index, broadcast_shapes, calculate_strides, index_to_coord, reduction_axes};
use super::NdArray;
use crate::error::{GradflowError, Result};

impl NdArray {
    /// Sum of every element.
    pub fn sum_all(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn mean_all(&self) -> f64 {
        if self.data.is_empty() {
            return f64::NAN;
        }
        self.sum_all() / self.data.len() as f64
    }

    /// Sums along `axis`. With `keep_dims` the axis stays with size 1.
    pub fn sum_axis(&self, axis: usize, keep_dims: bool) -> Result<NdArray> {
        self.check_axis(axis)?;
        let (outer, len, inner) = axis_split(&self.shape, axis);
        let mut out = vec![0.0; outer * inner];
        for o in 0..outer {
            for k in 0..len {
                let base = (o * len + k) * inner;
                let dst = &mut out[o * inner..(o + 1) * inner];
                for (d, &s) in dst.iter_mut().zip(&self.data[base..base + inner]) {
                    *d += s;
                }
            }
        }
        let mut shape = self.shape.clone();
        if keep_dims {
            shape[axis] = 1;
        } else {
            shape.remove(axis);
        }
        Ok(NdArray::from_parts(out, shape, self.dtype))
    }

    /// Mean along `axis`.
    pub fn mean_axis(&self, axis: usize, keep_dims: bool) -> Result<NdArray> {
        let n = self.dim(axis)? as f64;
        Ok(self.sum_axis(axis, keep_dims)?.scale(1.0 / n))
    }

    /// Maximum along `axis`, keeping the axis with size 1.
    pub fn max_axis(&self, axis: usize) -> Result<NdArray> {
        self.check_axis(axis)?;
        let (outer, len, inner) = axis_split(&self.shape, axis);
        let mut out = vec![f64::NEG_INFINITY; outer * inner];
        for o in 0..outer {
            for k in 0..len {
                let base = (o * len + k) * inner;
                for i in 0..inner {
                    let v = self.data[base + i];
                    let slot = &mut out[o * inner + i];
                    if v > *slot {
                        *slot = v;
                    }
                }
            }
        }
        let mut shape = self.shape.clone();
        shape[axis] = 1;
        Ok(NdArray::from_parts(out, shape, self.dtype))
    }

    /// Sums the array down to `target`, which must broadcast to `self.shape()`.
    ///
    /// This is the reduction applied to a gradient flowing back into an operand
    /// that was broadcast during the forward computation.
    pub fn reduce_to_shape(&self, target: &[usize]) -> Result<NdArray> {
        if self.shape == target {
            return Ok(self.clone());
        }
        let axes = reduction_axes(&self.shape, target)?;
        let mut reduced = self.clone();
        // Sum from the last axis so earlier axis indices stay valid.
        for &axis in axes.iter().rev() {
            reduced = reduced.sum_axis(axis, true)?;
        }
        let numel: usize = target.iter().product();
        if reduced.numel() != numel {
            return Err(GradflowError::shape_mismatch(target, &self.shape, "reduce_to_shape"));
        }
        reduced.shape = target.to_vec();
        Ok(reduced)
    }

    /// Expands the array to `target` under broadcasting rules.
    pub fn broadcast_to(&self, target: &[usize]) -> Result<NdArray> {
        if self.shape == target {
            return Ok(self.clone());
        }
        let out_shape = broadcast_shapes(&self.shape, target)?;
        if out_shape != target {
            return Err(GradflowError::BroadcastError {
                shape1: self.shape.clone(),
                shape2: target.to_vec(),
            });
        }
        let strides = calculate_strides(&self.shape);
        let numel: usize = target.iter().product();
        let mut coord = vec![0; target.len()];
        let mut data = Vec::with_capacity(numel);
        for i in 0..numel {
            index_to_coord(i, target, &mut coord);
            data.push(self.data[broadcast_index(&coord, &self.shape, &strides)]);
        }
        Ok(NdArray::from_parts(data, target.to_vec(), self.dtype))
    }

    /// Runs `f` on every lane along `axis`. A lane is copied into a scratch
    /// buffer, transformed in place, and written back into a new array.
    pub fn map_lanes(&self, axis: usize, mut f: impl FnMut(&mut [f64])) -> Result<NdArray> {
        self.check_axis(axis)?;
        let (outer, len, inner) = axis_split(&self.shape, axis);
        let mut out = self.data.clone();
        let mut lane = vec![0.0; len];
        for o in 0..outer {
            for i in 0..inner {
                for (k, slot) in lane.iter_mut().enumerate() {
                    *slot = out[(o * len + k) * inner + i];
                }
                f(&mut lane);
                for (k, &v) in lane.iter().enumerate() {
                    out[(o * len + k) * inner + i] = v;
                }
            }
        }
        Ok(NdArray::from_parts(out, self.shape.clone(), self.dtype))
    }
}
