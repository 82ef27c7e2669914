/// Floating point precision used to store array values.
///
/// Storage is always `f64`; an `F32` array rounds every value it produces to
/// single precision so computations observe `f32` results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DType {
    /// 32-bit floating-point values.
    F32,
    /// 64-bit floating-point values.
    #[default]
    F64,
}

impl DType {
    /// Rounds `x` to the precision of this dtype.
    #[inline]
    pub fn round(self, x: f64) -> f64 {
        match self {
            DType::F32 => x as f32 as f64,
            DType::F64 => x,
        }
    }

    /// Width of one element in the persisted format.
    pub fn size_of(self) -> usize {
        match self {
            DType::F32 => std::mem::size_of::<f32>(),
            DType::F64 => std::mem::size_of::<f64>(),
        }
    }

    /// Result dtype of a binary op: the wider of the two.
    pub fn promote(self, other: DType) -> DType {
        if self == DType::F64 || other == DType::F64 {
            DType::F64
        } else {
            DType::F32
        }
    }
}
