use crate::array::NdArray;
use crate::autograd::graph::TensorId;
use crate::error::{GradflowError, Result};
use std::fmt;

/// Closure given mutable access to an operand's gradient buffer.
pub type GradUpdater = Box<dyn FnOnce(&mut NdArray) -> Result<()> + Send>;

/// How a consumer's adjoint turns into a contribution to one operand.
pub enum Contribution {
    /// An array summed into the operand's gradient.
    Additive(NdArray),
    /// A write into the lazily zero-initialised gradient buffer. Used where
    /// the backward step is an index write (narrow, gather) rather than a sum
    /// of whole arrays.
    Updating(GradUpdater),
}

impl fmt::Debug for Contribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contribution::Additive(a) => write!(f, "Additive(shape={:?})", a.shape()),
            Contribution::Updating(_) => write!(f, "Updating(..)"),
        }
    }
}

/// A backward edge: the operand it targets and what it contributes.
///
/// A back function only names its target by id; it never owns the node.
#[derive(Debug)]
pub struct BackFunction {
    pub target: TensorId,
    pub contribution: Contribution,
}

impl BackFunction {
    pub fn additive(target: TensorId, delta: NdArray) -> Self {
        BackFunction {
            target,
            contribution: Contribution::Additive(delta),
        }
    }

    pub fn updating(target: TensorId, f: impl FnOnce(&mut NdArray) -> Result<()> + Send + 'static) -> Self {
        BackFunction {
            target,
            contribution: Contribution::Updating(Box::new(f)),
        }
    }
}

/// Folds a contribution into an optional gradient shaped like `like`.
///
/// An absent gradient takes ownership of an additive delta (no copy); a
/// present one is updated in place. Updating contributions see a zero-filled
/// buffer when the gradient was absent.
pub fn accumulate(grad: &mut Option<NdArray>, like: &NdArray, contribution: Contribution) -> Result<()> {
    match contribution {
        Contribution::Additive(delta) => {
            if delta.shape() != like.shape() {
                return Err(GradflowError::shape_mismatch(like.shape(), delta.shape(), "accumulate"));
            }
            match grad {
                Some(existing) => existing.add_(&delta)?,
                None if delta.dtype() != like.dtype() => *grad = Some(delta.cast(like.dtype())),
                None => *grad = Some(delta),
            }
        }
        Contribution::Updating(update) => {
            let buffer = grad.get_or_insert_with(|| NdArray::zeros_like(like));
            update(buffer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_moves_then_adds() {
        let like = NdArray::zeros(&[2]);
        let mut grad = None;
        accumulate(&mut grad, &like, Contribution::Additive(NdArray::ones(&[2]))).unwrap();
        assert_eq!(grad.as_ref().unwrap().data(), &[1.0, 1.0]);
        accumulate(&mut grad, &like, Contribution::Additive(NdArray::ones(&[2]))).unwrap();
        assert_eq!(grad.unwrap().data(), &[2.0, 2.0]);
    }

    #[test]
    fn test_accumulate_updating_starts_from_zero() {
        let like = NdArray::ones(&[3]);
        let mut grad = None;
        let contribution = BackFunction::updating(TensorId(0), |buf| {
            buf.data_mut()[1] += 5.0;
            Ok(())
        })
        .contribution;
        accumulate(&mut grad, &like, contribution).unwrap();
        assert_eq!(grad.unwrap().data(), &[0.0, 5.0, 0.0]);
    }

    #[test]
    fn test_accumulate_rejects_wrong_shape() {
        let like = NdArray::zeros(&[2, 2]);
        let mut grad = None;
        let err = accumulate(&mut grad, &like, Contribution::Additive(NdArray::ones(&[4]))).unwrap_err();
        assert!(err.is_shape_error());
        assert!(grad.is_none());
    }
}
