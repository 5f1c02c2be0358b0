//! The four element types this writer supports, and their on-disk encodings.

/// The element type of an array or dataset.
///
/// The four supported dtypes are `float64`, `float32`, `int64`, `int32`. All are stored
/// little-endian with no padding.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum DType {
    /// IEEE-754 double precision, 8 bytes.
    Float64,
    /// IEEE-754 single precision, 4 bytes.
    Float32,
    /// Two's-complement signed integer, 8 bytes.
    Int64,
    /// Two's-complement signed integer, 4 bytes.
    Int32,
}

impl DType {
    /// Size in bytes of one element of this type.
    pub fn element_size(self) -> usize {
        match self {
            DType::Float64 | DType::Int64 => 8,
            DType::Float32 | DType::Int32 => 4,
        }
    }

    /// Whether this dtype is an HDF5 floating-point class (class 1) as opposed to fixed-point
    /// (class 0).
    pub fn is_float(self) -> bool {
        matches!(self, DType::Float64 | DType::Float32)
    }
}

/// A single scalar value of one of the four supported dtypes.
///
/// Produced by [`crate::array::ArrayView::element_at`] and consumed by the layout writers, which
/// encode it to its dtype's native byte representation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Scalar {
    /// A `float64` value.
    F64(f64),
    /// A `float32` value.
    F32(f32),
    /// An `int64` value.
    I64(i64),
    /// An `int32` value.
    I32(i32),
}

impl Scalar {
    /// The dtype this scalar belongs to.
    pub fn dtype(self) -> DType {
        match self {
            Scalar::F64(_) => DType::Float64,
            Scalar::F32(_) => DType::Float32,
            Scalar::I64(_) => DType::Int64,
            Scalar::I32(_) => DType::Int32,
        }
    }

    /// Encodes this scalar as little-endian bytes, appending them to `out`.
    pub fn encode_le(self, out: &mut Vec<u8>) {
        match self {
            Scalar::F64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::I64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Scalar::I32(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    /// The fill value for `dtype`: `0` for integers, `+0.0` for floats.
    pub fn fill_value(dtype: DType) -> Scalar {
        match dtype {
            DType::Float64 => Scalar::F64(0.0),
            DType::Float32 => Scalar::F32(0.0),
            DType::Int64 => Scalar::I64(0),
            DType::Int32 => Scalar::I32(0),
        }
    }
}
