// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Dimensions of constant tensors.
//!
//! Exchange-format constants store their dims as signed 64-bit integers;
//! a constant with a negative dim cannot be materialised and is rejected
//! by [`Shape::from_onnx_dims`]. Weight layouts follow the usual
//! conventions: convolution filters are `[out, in / group, kh, kw]` and
//! fully-connected weights are `[out, in]`, so the layer width is always
//! the [`Shape::leading_dim`].

use crate::DType;
use std::fmt;

/// Concrete dims of a constant [`crate::Tensor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a shape from concrete dims.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let filters = Shape::new(vec![16, 3, 3, 3]);
    /// assert_eq!(filters.leading_dim(), Some(16));
    /// assert_eq!(filters.num_elements(), 432);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Rank-0 shape, as used by scalar constants such as `epsilon` tensors.
    pub fn scalar() -> Self {
        Self::default()
    }

    /// 1-D shape, as used by biases and per-channel statistics.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// 2-D `[out, in]` shape, as used by fully-connected weights.
    pub fn matrix(out: usize, inp: usize) -> Self {
        Self {
            dims: vec![out, inp],
        }
    }

    /// Converts exchange-format `int64` dims, rejecting negative entries.
    pub fn from_onnx_dims(dims: &[i64]) -> Option<Self> {
        dims.iter()
            .map(|&d| usize::try_from(d).ok())
            .collect::<Option<Vec<_>>>()
            .map(Self::new)
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Product of all dims; 1 for a scalar.
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// First dim: the output width of a filter or fully-connected weight.
    /// `None` for a scalar.
    pub fn leading_dim(&self) -> Option<usize> {
        self.dim(0)
    }

    /// Declared payload size in bytes, or `None` when the element size is
    /// unknown.
    pub fn size_bytes(&self, dtype: DType) -> Option<usize> {
        dtype
            .size_bytes()
            .and_then(|size| self.num_elements().checked_mul(size))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}
