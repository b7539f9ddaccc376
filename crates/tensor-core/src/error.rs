// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor access.

use crate::DType;

/// Errors that can occur while reading or writing a constant tensor.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// A raw buffer cannot be split evenly into elements of the declared type.
    #[error("buffer size mismatch: {actual} bytes is not a multiple of {element_size}")]
    BufferSizeMismatch { element_size: usize, actual: usize },

    /// The requested data type is not supported for this access.
    #[error("unsupported dtype {dtype} for {op}")]
    UnsupportedDType { op: &'static str, dtype: DType },

    /// Writing tensor data to the output sink failed.
    #[error("failed to write tensor data: {0}")]
    Io(#[from] std::io::Error),
}
