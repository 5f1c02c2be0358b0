//! The array abstraction this writer consumes.
//!
//! The real in-memory array container (`NDArray`/`DataCube` in the wider system) is an external
//! collaborator out of scope for this crate. The writer is expressed entirely against
//! [`ArrayView`], a narrow trait exposing only shape, dtype, and row-major flat element
//! iteration. [`NdArray`] is a minimal, dependency-free implementation of that trait provided so
//! the writer is usable and testable standalone.

use crate::dtype::{DType, Scalar};

/// An opaque source of shape, dtype, and flat element data.
///
/// Implementations need not be contiguous in memory or backed by any particular storage; the
/// writer only ever calls `element_at` in increasing `flat_index` order.
pub trait ArrayView {
    /// Dimension extents, outermost first.
    fn shape(&self) -> &[usize];

    /// The element type of every value this array yields.
    fn dtype(&self) -> DType;

    /// The element at `flat_index` in row-major order.
    ///
    /// `flat_index` is always `< self.len()`.
    fn element_at(&self, flat_index: usize) -> Scalar;

    /// Number of elements, i.e. the product of `shape()`.
    fn len(&self) -> usize {
        self.shape().iter().product()
    }

    /// Whether this array has zero elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A minimal, owned, row-major n-dimensional array.
///
/// An opaque source of shape, dtype, and flat iteration; it intentionally carries no indexing or
/// arithmetic beyond what the writer itself needs.
pub struct NdArray {
    shape: Vec<usize>,
    dtype: DType,
    data: NdArrayData,
}

enum NdArrayData {
    F64(Vec<f64>),
    F32(Vec<f32>),
    I64(Vec<i64>),
    I32(Vec<i32>),
}

impl NdArray {
    /// Builds an array of `float64` elements in row-major order.
    ///
    /// Panics if `data.len() != shape.iter().product()`.
    pub fn from_f64(shape: Vec<usize>, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>(), "data length must match shape");
        Self { shape, dtype: DType::Float64, data: NdArrayData::F64(data) }
    }

    /// Builds an array of `float32` elements in row-major order.
    pub fn from_f32(shape: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>(), "data length must match shape");
        Self { shape, dtype: DType::Float32, data: NdArrayData::F32(data) }
    }

    /// Builds an array of `int64` elements in row-major order.
    pub fn from_i64(shape: Vec<usize>, data: Vec<i64>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>(), "data length must match shape");
        Self { shape, dtype: DType::Int64, data: NdArrayData::I64(data) }
    }

    /// Builds an array of `int32` elements in row-major order.
    pub fn from_i32(shape: Vec<usize>, data: Vec<i32>) -> Self {
        assert_eq!(data.len(), shape.iter().product::<usize>(), "data length must match shape");
        Self { shape, dtype: DType::Int32, data: NdArrayData::I32(data) }
    }
}

impl ArrayView for NdArray {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn dtype(&self) -> DType {
        self.dtype
    }

    fn element_at(&self, flat_index: usize) -> Scalar {
        match &self.data {
            NdArrayData::F64(v) => Scalar::F64(v[flat_index]),
            NdArrayData::F32(v) => Scalar::F32(v[flat_index]),
            NdArrayData::I64(v) => Scalar::I64(v[flat_index]),
            NdArrayData::I32(v) => Scalar::I32(v[flat_index]),
        }
    }
}

/// A convenience wrapper for the common `(depth, rows, columns)` 3-D case.
pub struct DataCube {
    inner: NdArray,
}

impl DataCube {
    /// Builds a 3-D `float64` cube with shape `(depth, rows, columns)`.
    pub fn new(depth: usize, rows: usize, columns: usize, data: Vec<f64>) -> Self {
        Self { inner: NdArray::from_f64(vec![depth, rows, columns], data) }
    }

    /// The `(depth, rows, columns)` extents.
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.inner.shape[0], self.inner.shape[1], self.inner.shape[2])
    }

    /// Borrows the underlying 3-D array as an [`ArrayView`].
    pub fn as_array_view(&self) -> &dyn ArrayView {
        &self.inner
    }
}
