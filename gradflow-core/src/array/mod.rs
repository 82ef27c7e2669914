//! Dense row-major array primitive consumed by the autograd layer.
//!
//! `NdArray` owns a contiguous `Vec<f64>` and a shape. It offers exactly the
//! element-wise, broadcasting, reduction and remapping operations that the
//! graph operations need; it keeps no autograd metadata of its own.

use crate::error::{GradflowError, Result};
use crate::types::DType;
use num_traits::ToPrimitive;
use std::fmt;

pub mod broadcast;
mod linalg;
mod reduce;
mod shape_ops;

use broadcast::{broadcast_index, broadcast_shapes, calculate_strides, index_to_coord};

/// A dense N-dimensional array of floating point values.
#[derive(Clone, Debug, PartialEq)]
pub struct NdArray {
    shape: Vec<usize>,
    data: Vec<f64>,
    dtype: DType,
}

impl NdArray {
    /// Creates an `F64` array from row-major data.
    pub fn new(data: Vec<f64>, shape: Vec<usize>) -> Result<Self> {
        Self::with_dtype(data, shape, DType::F64)
    }

    /// Creates an array with an explicit dtype; `F32` rounds the data.
    pub fn with_dtype(data: Vec<f64>, shape: Vec<usize>, dtype: DType) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(GradflowError::TensorCreationError {
                data_len: data.len(),
                shape,
            });
        }
        Ok(Self::from_parts(data, shape, dtype))
    }

    /// Builds an array whose length has already been checked.
    pub(crate) fn from_parts(mut data: Vec<f64>, shape: Vec<usize>, dtype: DType) -> Self {
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        if dtype == DType::F32 {
            for v in data.iter_mut() {
                *v = dtype.round(*v);
            }
        }
        NdArray { shape, data, dtype }
    }

    /// Rank-0 array holding one value.
    pub fn scalar(value: f64) -> Self {
        NdArray {
            shape: vec![],
            data: vec![value],
            dtype: DType::F64,
        }
    }

    pub fn full(shape: &[usize], value: f64, dtype: DType) -> Self {
        let numel = shape.iter().product();
        Self::from_parts(vec![value; numel], shape.to_vec(), dtype)
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, 0.0, DType::F64)
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, 1.0, DType::F64)
    }

    pub fn zeros_like(other: &NdArray) -> Self {
        Self::full(&other.shape, 0.0, other.dtype)
    }

    pub fn ones_like(other: &NdArray) -> Self {
        Self::full(&other.shape, 1.0, other.dtype)
    }

    /// Builds an array by evaluating `f` at every linear index.
    pub fn from_fn(shape: &[usize], dtype: DType, f: impl FnMut(usize) -> f64) -> Self {
        let numel = shape.iter().product();
        Self::from_parts((0..numel).map(f).collect(), shape.to_vec(), dtype)
    }

    /// Converts any primitive numeric slice (labels, counts, raw `f32` buffers).
    pub fn from_elems<T: ToPrimitive + Copy>(data: &[T], shape: &[usize], dtype: DType) -> Result<Self> {
        let values = data
            .iter()
            .map(|v| {
                v.to_f64()
                    .ok_or_else(|| GradflowError::UsageError("value is not representable as f64".to_string()))
            })
            .collect::<Result<Vec<f64>>>()?;
        Self::with_dtype(values, shape.to_vec(), dtype)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Size of dimension `axis`.
    pub fn dim(&self, axis: usize) -> Result<usize> {
        self.shape.get(axis).copied().ok_or(GradflowError::InvalidAxis {
            axis,
            rank: self.rank(),
        })
    }

    pub(crate) fn check_axis(&self, axis: usize) -> Result<()> {
        if axis >= self.rank() {
            return Err(GradflowError::InvalidAxis {
                axis,
                rank: self.rank(),
            });
        }
        Ok(())
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Mutable access to the raw values. Writers are responsible for keeping
    /// `F32` arrays at single precision.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// True for rank-0 arrays and arrays holding exactly one element.
    pub fn is_scalar_like(&self) -> bool {
        self.data.len() == 1
    }

    /// The single value of a one-element array.
    pub fn item(&self) -> Result<f64> {
        if self.data.len() != 1 {
            return Err(GradflowError::shape_mismatch(&[], &self.shape, "item"));
        }
        Ok(self.data[0])
    }

    /// Value at the given coordinates.
    pub fn get(&self, coord: &[usize]) -> Result<f64> {
        if coord.len() != self.rank() {
            return Err(GradflowError::shape_mismatch(&self.shape, coord, "get"));
        }
        let mut index = 0;
        for (&c, &dim) in coord.iter().zip(self.shape.iter()) {
            if c >= dim {
                return Err(GradflowError::IndexOutOfBounds { index: c, size: dim });
            }
            index = index * dim + c;
        }
        Ok(self.data[index])
    }

    /// Converts to the given dtype.
    pub fn cast(&self, dtype: DType) -> NdArray {
        Self::from_parts(self.data.clone(), self.shape.clone(), dtype)
    }

    /// Applies `f` element-wise into a new array.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> NdArray {
        Self::from_parts(self.data.iter().map(|&x| f(x)).collect(), self.shape.clone(), self.dtype)
    }

    /// Applies `f` element-wise in place.
    pub fn map_inplace(&mut self, f: impl Fn(f64) -> f64) {
        let dtype = self.dtype;
        for v in self.data.iter_mut() {
            *v = dtype.round(f(*v));
        }
    }

    /// Combines two arrays of identical shape element-wise.
    pub fn zip_map(&self, other: &NdArray, op: &str, f: impl Fn(f64, f64) -> f64) -> Result<NdArray> {
        if self.shape != other.shape {
            return Err(GradflowError::shape_mismatch(&self.shape, &other.shape, op));
        }
        let data = self.data.iter().zip(other.data.iter()).map(|(&a, &b)| f(a, b)).collect();
        Ok(Self::from_parts(data, self.shape.clone(), self.dtype.promote(other.dtype)))
    }

    /// Combines two arrays element-wise under broadcasting rules.
    pub fn broadcast_zip(&self, other: &NdArray, f: impl Fn(f64, f64) -> f64) -> Result<NdArray> {
        let dtype = self.dtype.promote(other.dtype);
        if self.shape == other.shape {
            let data = self.data.iter().zip(other.data.iter()).map(|(&a, &b)| f(a, b)).collect();
            return Ok(Self::from_parts(data, self.shape.clone(), dtype));
        }
        let out_shape = broadcast_shapes(&self.shape, &other.shape)?;
        let numel: usize = out_shape.iter().product();
        let a_strides = calculate_strides(&self.shape);
        let b_strides = calculate_strides(&other.shape);
        let mut coord = vec![0; out_shape.len()];
        let mut data = Vec::with_capacity(numel);
        for i in 0..numel {
            index_to_coord(i, &out_shape, &mut coord);
            let a = self.data[broadcast_index(&coord, &self.shape, &a_strides)];
            let b = other.data[broadcast_index(&coord, &other.shape, &b_strides)];
            data.push(f(a, b));
        }
        Ok(Self::from_parts(data, out_shape, dtype))
    }

    pub fn add(&self, other: &NdArray) -> Result<NdArray> {
        self.broadcast_zip(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &NdArray) -> Result<NdArray> {
        self.broadcast_zip(other, |a, b| a - b)
    }

    pub fn mul(&self, other: &NdArray) -> Result<NdArray> {
        self.broadcast_zip(other, |a, b| a * b)
    }

    /// Element-wise division; division by zero follows IEEE-754.
    pub fn div(&self, other: &NdArray) -> Result<NdArray> {
        self.broadcast_zip(other, |a, b| a / b)
    }

    pub fn scale(&self, factor: f64) -> NdArray {
        self.map(|x| x * factor)
    }

    pub fn neg(&self) -> NdArray {
        self.map(|x| -x)
    }

    /// In-place `self += other`; shapes must be identical.
    pub fn add_(&mut self, other: &NdArray) -> Result<()> {
        if self.shape != other.shape {
            return Err(GradflowError::shape_mismatch(&self.shape, &other.shape, "add_"));
        }
        let dtype = self.dtype;
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a = dtype.round(*a + b);
        }
        Ok(())
    }

    /// In-place `self -= other`; shapes must be identical.
    pub fn sub_(&mut self, other: &NdArray) -> Result<()> {
        if self.shape != other.shape {
            return Err(GradflowError::shape_mismatch(&self.shape, &other.shape, "sub_"));
        }
        let dtype = self.dtype;
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a = dtype.round(*a - b);
        }
        Ok(())
    }

    /// In-place `self *= factor`.
    pub fn mul_scalar_(&mut self, factor: f64) {
        self.map_inplace(|x| x * factor);
    }

    /// In-place `self += alpha * other`; shapes must be identical.
    pub fn axpy_(&mut self, alpha: f64, other: &NdArray) -> Result<()> {
        if self.shape != other.shape {
            return Err(GradflowError::shape_mismatch(&self.shape, &other.shape, "axpy_"));
        }
        let dtype = self.dtype;
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a = dtype.round(*a + alpha * b);
        }
        Ok(())
    }

    pub fn fill_(&mut self, value: f64) {
        let v = self.dtype.round(value);
        self.data.iter_mut().for_each(|x| *x = v);
    }

    /// Euclidean norm of all elements.
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// True when shapes match and every pair of elements is within `tol`.
    pub fn all_close(&self, other: &NdArray, tol: f64) -> bool {
        self.shape == other.shape
            && self.data.iter().zip(other.data.iter()).all(|(a, b)| (a - b).abs() <= tol)
    }
}

impl fmt::Display for NdArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NdArray(shape={:?}, dtype={:?}, data=[", self.shape, self.dtype)?;
        const LIMIT: usize = 8;
        for (i, v) in self.data.iter().take(LIMIT).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.4}", v)?;
        }
        if self.data.len() > LIMIT {
            write!(f, ", ...")?;
        }
        write!(f, "])")
    }
}

#[cfg(test)]
#[path = "array_test.rs"]
mod tests;
