use crate::types::DType;
use thiserror::Error;

/// Error type for the gradflow framework.
///
/// Shape problems are reported when a node is constructed, never later during
/// backward. Seed problems are reported at the `backward` call boundary.
/// Usage errors are programmer mistakes and carry a descriptive message.
#[derive(Error, Debug)]
pub enum GradflowError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Cannot broadcast shapes: {shape1:?} and {shape2:?}")]
    BroadcastError {
        shape1: Vec<usize>,
        shape2: Vec<usize>,
    },

    #[error("Invalid axis {axis} for tensor of rank {rank}")]
    InvalidAxis { axis: usize, rank: usize },

    #[error("Index out of bounds: index {index} for dimension of size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Backward called on non-scalar tensor of shape {shape:?} without explicit gradient.")]
    BackwardNonScalar { shape: Vec<usize> },

    #[error("Seed gradient shape {actual:?} does not match root shape {expected:?}")]
    SeedShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Unknown tensor id {0} for this graph")]
    UnknownTensor(usize),

    #[error("Parameter {0} is not tracked here")]
    UnknownParameter(String),

    #[error("Usage error: {0}")]
    UsageError(String),

    #[error("Data type mismatch for operation '{operation}': expected {expected:?}, got {actual:?}")]
    DataTypeMismatch {
        expected: DType,
        actual: DType,
        operation: String,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand used across the crate.
pub type Result<T> = std::result::Result<T, GradflowError>;

impl GradflowError {
    pub(crate) fn shape_mismatch(expected: &[usize], actual: &[usize], operation: &str) -> Self {
        GradflowError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
            operation: operation.to_string(),
        }
    }

    /// True for every variant raised by incompatible shapes.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            GradflowError::ShapeMismatch { .. }
                | GradflowError::BroadcastError { .. }
                | GradflowError::InvalidAxis { .. }
                | GradflowError::IndexOutOfBounds { .. }
                | GradflowError::TensorCreationError { .. }
        )
    }
}
