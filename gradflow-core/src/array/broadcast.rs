use crate::error::{GradflowError, Result};
use std::cmp::max;

/// Calculates the row-major strides for a given shape.
///
/// Example:
/// shape = [2, 3] -> strides = [3, 1]
/// shape = [2, 2, 2] -> strides = [4, 2, 1]
pub fn calculate_strides(shape: &[usize]) -> Vec<usize> {
    if shape.is_empty() {
        return vec![];
    }
    let rank = shape.len();
    let mut strides = vec![1; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Determines the output shape resulting from broadcasting two input shapes.
///
/// Follows NumPy broadcasting rules:
/// 1. If the shapes have different ranks, prepend 1s to the shorter shape.
/// 2. Compare dimensions element-wise from right to left.
/// 3. Dimensions are compatible if they are equal, or one of them is 1.
/// 4. The resulting dimension is the larger of the two.
pub fn broadcast_shapes(shape_a: &[usize], shape_b: &[usize]) -> Result<Vec<usize>> {
    let rank_a = shape_a.len();
    let rank_b = shape_b.len();
    let max_rank = max(rank_a, rank_b);
    let mut result_shape = vec![0; max_rank];

    for i in 0..max_rank {
        let dim_a = shape_a.get(rank_a.wrapping_sub(1 + i)).copied().unwrap_or(1);
        let dim_b = shape_b.get(rank_b.wrapping_sub(1 + i)).copied().unwrap_or(1);

        result_shape[max_rank - 1 - i] = if dim_a == dim_b || dim_b == 1 {
            dim_a
        } else if dim_a == 1 {
            dim_b
        } else {
            return Err(GradflowError::BroadcastError {
                shape1: shape_a.to_vec(),
                shape2: shape_b.to_vec(),
            });
        };
    }
    Ok(result_shape)
}

/// Converts a linear row-major index into coordinates, writing them to `coord`.
pub fn index_to_coord(index: usize, shape: &[usize], coord: &mut [usize]) {
    let mut rem = index;
    for i in (0..shape.len()).rev() {
        let dim = shape[i];
        if dim == 0 {
            coord[i] = 0;
            continue;
        }
        coord[i] = rem % dim;
        rem /= dim;
    }
}

/// Linear index into an operand of `source_shape` for an output coordinate of a
/// broadcast result. Size-1 source dimensions always map to coordinate 0.
pub fn broadcast_index(target_coord: &[usize], source_shape: &[usize], source_strides: &[usize]) -> usize {
    let rank_diff = target_coord.len() - source_shape.len();
    let mut index = 0;
    for i in 0..source_shape.len() {
        if source_shape[i] != 1 {
            index += target_coord[rank_diff + i] * source_strides[i];
        }
    }
    index
}

/// Axes of `from` that must be summed to get back to `to`, assuming `to`
/// broadcasts to `from`. Leading axes missing from `to` are always reduced.
pub fn reduction_axes(from: &[usize], to: &[usize]) -> Result<Vec<usize>> {
    if to.len() > from.len() {
        return Err(GradflowError::shape_mismatch(to, from, "reduce_to_shape"));
    }
    let rank_diff = from.len() - to.len();
    let mut axes: Vec<usize> = (0..rank_diff).collect();
    for (i, &target_dim) in to.iter().enumerate() {
        let current_dim = from[rank_diff + i];
        if current_dim == target_dim {
            continue;
        }
        if target_dim == 1 {
            axes.push(rank_diff + i);
        } else {
            return Err(GradflowError::shape_mismatch(to, from, "reduce_to_shape"));
        }
    }
    Ok(axes)
}

/// Splits a shape around `axis` into `(outer, len, inner)` so that element
/// `(o, k, i)` lives at `(o * len + k) * inner + i`.
pub fn axis_split(shape: &[usize], axis: usize) -> (usize, usize, usize) {
    let outer = shape[..axis].iter().product();
    let len = shape[axis];
    let inner = shape[axis + 1..].iter().product();
    (outer, len, inner)
}

#[cfg(test)]
#[path = "broadcast_test.rs"]
mod tests;
