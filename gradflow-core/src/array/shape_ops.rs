use super::broadcast::axis_split;
use super::NdArray;
use crate::error::{GradflowError, Result};

impl NdArray {
    /// Same data under a new shape with the same number of elements.
    pub fn reshape(&self, shape: &[usize]) -> Result<NdArray> {
        let numel: usize = shape.iter().product();
        if numel != self.numel() {
            return Err(GradflowError::shape_mismatch(&self.shape, shape, "reshape"));
        }
        Ok(NdArray {
            shape: shape.to_vec(),
            data: self.data.clone(),
            dtype: self.dtype,
        })
    }

    /// Inserts a new axis of size 1 at `axis` (`axis <= rank`).
    pub fn insert_axis(&self, axis: usize) -> Result<NdArray> {
        if axis > self.rank() {
            return Err(GradflowError::InvalidAxis { axis, rank: self.rank() });
        }
        let mut shape = self.shape.clone();
        shape.insert(axis, 1);
        self.reshape(&shape)
    }

    fn check_range(&self, axis: usize, start: usize, end: usize) -> Result<()> {
        self.check_axis(axis)?;
        let size = self.shape[axis];
        if start > end || end > size {
            return Err(GradflowError::IndexOutOfBounds { index: end.max(start), size });
        }
        Ok(())
    }

    /// Copies the slice `start..end` along `axis`.
    pub fn narrow(&self, axis: usize, start: usize, end: usize) -> Result<NdArray> {
        self.check_range(axis, start, end)?;
        let (outer, len, inner) = axis_split(&self.shape, axis);
        let width = end - start;
        let mut data = Vec::with_capacity(outer * width * inner);
        for o in 0..outer {
            let from = (o * len + start) * inner;
            data.extend_from_slice(&self.data[from..from + width * inner]);
        }
        let mut shape = self.shape.clone();
        shape[axis] = width;
        Ok(NdArray::from_parts(data, shape, self.dtype))
    }

    /// Adds `src` into the slice `start..start + src.dim(axis)` along `axis`.
    /// Every other dimension of `src` must match `self`.
    pub fn narrow_add_(&mut self, axis: usize, start: usize, src: &NdArray) -> Result<()> {
        if src.rank() != self.rank() {
            return Err(GradflowError::shape_mismatch(&self.shape, &src.shape, "narrow_add_"));
        }
        let width = src.dim(axis)?;
        self.check_range(axis, start, start + width)?;
        for d in 0..self.rank() {
            if d != axis && self.shape[d] != src.shape[d] {
                return Err(GradflowError::shape_mismatch(&self.shape, &src.shape, "narrow_add_"));
            }
        }
        let (outer, len, inner) = axis_split(&self.shape, axis);
        let dtype = self.dtype;
        for o in 0..outer {
            let dst_base = (o * len + start) * inner;
            let src_base = o * width * inner;
            for j in 0..width * inner {
                let slot = &mut self.data[dst_base + j];
                *slot = dtype.round(*slot + src.data[src_base + j]);
            }
        }
        Ok(())
    }

    /// Concatenates arrays along `axis`. All other dimensions must agree.
    pub fn cat(arrays: &[&NdArray], axis: usize) -> Result<NdArray> {
        let first = arrays
            .first()
            .ok_or_else(|| GradflowError::UsageError("cannot concatenate an empty list".to_string()))?;
        first.check_axis(axis)?;
        let mut total = 0;
        for a in arrays {
            if a.rank() != first.rank() {
                return Err(GradflowError::shape_mismatch(&first.shape, &a.shape, "cat"));
            }
            for d in 0..first.rank() {
                if d != axis && a.shape[d] != first.shape[d] {
                    return Err(GradflowError::shape_mismatch(&first.shape, &a.shape, "cat"));
                }
            }
            total += a.shape[axis];
        }
        let mut shape = first.shape.clone();
        shape[axis] = total;
        let (outer, _, inner) = axis_split(&shape, axis);
        let mut data = Vec::with_capacity(outer * total * inner);
        for o in 0..outer {
            for a in arrays {
                let width = a.shape[axis] * inner;
                data.extend_from_slice(&a.data[o * width..(o + 1) * width]);
            }
        }
        let dtype = arrays.iter().fold(first.dtype, |d, a| d.promote(a.dtype));
        Ok(NdArray::from_parts(data, shape, dtype))
    }

    /// Checks that `index` can address `self` along `axis` and returns the
    /// resolved integer indices.
    fn gather_indices(&self, axis: usize, index: &NdArray) -> Result<Vec<usize>> {
        self.check_axis(axis)?;
        if index.rank() != self.rank() {
            return Err(GradflowError::shape_mismatch(&self.shape, &index.shape, "gather"));
        }
        for d in 0..self.rank() {
            if d != axis && index.shape[d] != self.shape[d] {
                return Err(GradflowError::shape_mismatch(&self.shape, &index.shape, "gather"));
            }
        }
        let size = self.shape[axis];
        index
            .data
            .iter()
            .map(|&v| {
                let i = v as usize;
                if v < 0.0 || v.fract() != 0.0 || i >= size {
                    Err(GradflowError::IndexOutOfBounds { index: i, size })
                } else {
                    Ok(i)
                }
            })
            .collect()
    }

    /// `out[o, k, i] = self[o, index[o, k, i], i]` along `axis`; the output
    /// takes the shape of `index`.
    pub fn gather(&self, axis: usize, index: &NdArray) -> Result<NdArray> {
        let idx = self.gather_indices(axis, index)?;
        let (outer, len, inner) = axis_split(&self.shape, axis);
        let width = index.shape[axis];
        let mut data = Vec::with_capacity(idx.len());
        for o in 0..outer {
            for k in 0..width {
                for i in 0..inner {
                    let src = idx[(o * width + k) * inner + i];
                    data.push(self.data[(o * len + src) * inner + i]);
                }
            }
        }
        Ok(NdArray::from_parts(data, index.shape.clone(), self.dtype))
    }

    /// Inverse of `gather`: `self[o, index[o, k, i], i] += src[o, k, i]`.
    /// Repeated indices accumulate.
    pub fn scatter_add_(&mut self, axis: usize, index: &NdArray, src: &NdArray) -> Result<()> {
        if src.shape != index.shape {
            return Err(GradflowError::shape_mismatch(&index.shape, &src.shape, "scatter_add_"));
        }
        let idx = self.gather_indices(axis, index)?;
        let (outer, len, inner) = axis_split(&self.shape, axis);
        let width = index.shape[axis];
        let dtype = self.dtype;
        for o in 0..outer {
            for k in 0..width {
                for i in 0..inner {
                    let pos = (o * width + k) * inner + i;
                    let slot = &mut self.data[(o * len + idx[pos]) * inner + i];
                    *slot = dtype.round(*slot + src.data[pos]);
                }
            }
        }
        Ok(())
    }
}
