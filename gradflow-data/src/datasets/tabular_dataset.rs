use super::traits::Dataset;
use gradflow_core::{GradflowError, NdArray, Result};

/// Aligned arrays whose first dimension indexes the rows.
///
/// Typical use is one feature array and one target array. Row `i` of the
/// dataset is row `i` of every array.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    arrays: Vec<NdArray>,
    rows: usize,
}

impl TabularDataset {
    /// Fails when an array is rank 0 or the arrays disagree on the row count.
    /// An empty list gives an empty dataset.
    pub fn new(arrays: Vec<NdArray>) -> Result<Self> {
        let rows = match arrays.first() {
            None => 0,
            Some(first) => leading_dim(first)?,
        };
        for array in arrays.iter().skip(1) {
            let n = leading_dim(array)?;
            if n != rows {
                return Err(GradflowError::ShapeMismatch {
                    expected: vec![rows],
                    actual: vec![n],
                    operation: "TabularDataset::new".to_string(),
                });
            }
        }
        Ok(TabularDataset { arrays, rows })
    }

    pub fn arrays(&self) -> &[NdArray] {
        &self.arrays
    }

    /// Number of aligned arrays, one per model input.
    pub fn width(&self) -> usize {
        self.arrays.len()
    }

    /// Stacks the given rows of every array, in the order of `indices`.
    /// Each result keeps the trailing dimensions of its source array.
    pub fn take(&self, indices: &[usize]) -> Result<Vec<NdArray>> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.rows) {
            return Err(GradflowError::IndexOutOfBounds {
                index: bad,
                size: self.rows,
            });
        }
        self.arrays
            .iter()
            .map(|array| {
                let row_len: usize = array.shape()[1..].iter().product();
                let mut data = Vec::with_capacity(indices.len() * row_len);
                for &i in indices {
                    data.extend_from_slice(&array.data()[i * row_len..(i + 1) * row_len]);
                }
                let mut shape = array.shape().to_vec();
                shape[0] = indices.len();
                NdArray::with_dtype(data, shape, array.dtype())
            })
            .collect()
    }
}

impl Dataset for TabularDataset {
    /// One row of every array, with the leading dimension removed.
    type Item = Vec<NdArray>;

    fn get(&self, index: usize) -> Result<Self::Item> {
        self.take(&[index])?
            .into_iter()
            .map(|row| {
                let shape = row.shape()[1..].to_vec();
                row.reshape(&shape)
            })
            .collect()
    }

    fn len(&self) -> usize {
        self.rows
    }
}

fn leading_dim(array: &NdArray) -> Result<usize> {
    array
        .shape()
        .first()
        .copied()
        .ok_or_else(|| GradflowError::InvalidAxis { axis: 0, rank: 0 })
}

#[cfg(test)]
#[path = "tabular_dataset_test.rs"]
mod tests;
