use super::NdArray;
use crate::error::{GradflowError, Result};

impl NdArray {
    /// Transpose of a rank-2 array.
    pub fn transpose2d(&self) -> Result<NdArray> {
        if self.rank() != 2 {
            return Err(GradflowError::UnsupportedOperation(format!(
                "transpose2d expects a rank-2 array, got shape {:?}",
                self.shape
            )));
        }
        let (rows, cols) = (self.shape[0], self.shape[1]);
        let mut data = vec![0.0; rows * cols];
        for r in 0..rows {
            for c in 0..cols {
                data[c * rows + r] = self.data[r * cols + c];
            }
        }
        Ok(NdArray::from_parts(data, vec![cols, rows], self.dtype))
    }

    /// Matrix product of `[m, k]` and `[k, n]`.
    pub fn matmul(&self, other: &NdArray) -> Result<NdArray> {
        if self.rank() != 2 || other.rank() != 2 || self.shape[1] != other.shape[0] {
            return Err(GradflowError::shape_mismatch(&self.shape, &other.shape, "matmul"));
        }
        let (m, k, n) = (self.shape[0], self.shape[1], other.shape[1]);
        let mut out = vec![0.0; m * n];
        // i-p-j loop order keeps the inner loop on contiguous rows of `other`.
        for i in 0..m {
            let row = &mut out[i * n..(i + 1) * n];
            for p in 0..k {
                let a = self.data[i * k + p];
                let b_row = &other.data[p * n..(p + 1) * n];
                for (o, &b) in row.iter_mut().zip(b_row) {
                    *o += a * b;
                }
            }
        }
        Ok(NdArray::from_parts(out, vec![m, n], self.dtype.promote(other.dtype)))
    }

    /// Batched vector-times-matrix product.
    ///
    /// `self` is a vector `[n]` or a batch of vectors `[b, n]`; `matrices` is a
    /// matrix `[n, m]` or a batch `[b, n, m]`. A unit batch on either
    /// side is paired with every entry of the other. The result is `[b, m]`.
    pub fn bvtm(&self, matrices: &NdArray) -> Result<NdArray> {
        let dims = BvtmDims::resolve(self, matrices)?;
        let mut out = vec![0.0; dims.batch * dims.m];
        for b in 0..dims.batch {
            let v = &self.data[dims.vec_offset(b)..dims.vec_offset(b) + dims.n];
            let mat = &matrices.data[dims.mat_offset(b)..dims.mat_offset(b) + dims.n * dims.m];
            let row = &mut out[b * dims.m..(b + 1) * dims.m];
            for (p, &a) in v.iter().enumerate() {
                for (o, &w) in row.iter_mut().zip(&mat[p * dims.m..(p + 1) * dims.m]) {
                    *o += a * w;
                }
            }
        }
        Ok(NdArray::from_parts(out, vec![dims.batch, dims.m], self.dtype.promote(matrices.dtype)))
    }

    /// Gradients of `bvtm` for both operands given the output gradient `grad`
    /// of shape `[b, m]`. Shared operands receive the sum over the batch.
    pub fn bvtm_grads(&self, matrices: &NdArray, grad: &NdArray) -> Result<(NdArray, NdArray)> {
        let dims = BvtmDims::resolve(self, matrices)?;
        if grad.shape != [dims.batch, dims.m] {
            return Err(GradflowError::shape_mismatch(&[dims.batch, dims.m], &grad.shape, "bvtm backward"));
        }
        let mut d_vec = vec![0.0; self.numel()];
        let mut d_mat = vec![0.0; matrices.numel()];
        for b in 0..dims.batch {
            let (vo, mo) = (dims.vec_offset(b), dims.mat_offset(b));
            let g = &grad.data[b * dims.m..(b + 1) * dims.m];
            for p in 0..dims.n {
                let mat_row = &matrices.data[mo + p * dims.m..mo + (p + 1) * dims.m];
                d_vec[vo + p] += mat_row.iter().zip(g).map(|(w, g)| w * g).sum::<f64>();
                let a = self.data[vo + p];
                for (d, &g) in d_mat[mo + p * dims.m..mo + (p + 1) * dims.m].iter_mut().zip(g) {
                    *d += a * g;
                }
            }
        }
        Ok((
            NdArray::from_parts(d_vec, self.shape.clone(), self.dtype),
            NdArray::from_parts(d_mat, matrices.shape.clone(), matrices.dtype),
        ))
    }
}

struct BvtmDims {
    batch: usize,
    vec_batch: usize,
    mat_batch: usize,
    n: usize,
    m: usize,
}

impl BvtmDims {
    fn resolve(vectors: &NdArray, matrices: &NdArray) -> Result<Self> {
        let (vec_batch, n) = match vectors.shape.as_slice() {
            [n] => (1, *n),
            [b, n] => (*b, *n),
            _ => return Err(GradflowError::shape_mismatch(&[0, 0], &vectors.shape, "bvtm")),
        };
        let (mat_batch, rows, m) = match matrices.shape.as_slice() {
            [r, m] => (1, *r, *m),
            [b, r, m] => (*b, *r, *m),
            _ => return Err(GradflowError::shape_mismatch(&[0, n, 0], &matrices.shape, "bvtm")),
        };
        if rows != n || (vec_batch != mat_batch && vec_batch != 1 && mat_batch != 1) {
            return Err(GradflowError::shape_mismatch(&vectors.shape, &matrices.shape, "bvtm"));
        }
        Ok(BvtmDims {
            batch: vec_batch.max(mat_batch),
            vec_batch,
            mat_batch,
            n,
            m,
        })
    }

    fn vec_offset(&self, b: usize) -> usize {
        if self.vec_batch == 1 {
            0
        } else {
            b * self.n
        }
    }

    fn mat_offset(&self, b: usize) -> usize {
        if self.mat_batch == 1 {
            0
        } else {
            b * self.n * self.m
        }
    }
}
