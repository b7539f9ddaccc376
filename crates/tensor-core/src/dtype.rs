// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Element data types of the exchange format.

use std::fmt;

/// Enumerates the element types a [`crate::Tensor`] can be declared with.
///
/// Only [`DType::F32`] payloads can be lowered into the weight stream; the
/// other variants exist so that the loader can describe a graph faithfully
/// and the lowering engine can reject what it cannot encode. Tags without a
/// dedicated variant are carried as [`DType::Other`], so a constant that no
/// node reads never stops a model from loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit IEEE 754 floating point.
    F32,
    /// 16-bit IEEE 754 floating point.
    F16,
    /// 16-bit brain floating point.
    BF16,
    /// 64-bit IEEE 754 floating point.
    F64,
    /// 8-bit signed integer.
    I8,
    /// 8-bit unsigned integer.
    U8,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer (shapes, indices).
    I64,
    /// Boolean stored as one byte.
    Bool,
    /// Any other exchange-format tag (strings, unsigned 16/32/64-bit
    /// integers, complex numbers), kept opaque.
    Other(i32),
}

impl DType {
    /// Maps an exchange-format element type tag to a `DType`.
    ///
    /// Tags without a dedicated variant map to [`DType::Other`].
    pub fn from_onnx(code: i32) -> Self {
        match code {
            1 => Self::F32,
            2 => Self::U8,
            3 => Self::I8,
            6 => Self::I32,
            7 => Self::I64,
            9 => Self::Bool,
            10 => Self::F16,
            11 => Self::F64,
            16 => Self::BF16,
            other => Self::Other(other),
        }
    }

    /// Returns `true` if this tag has a dedicated variant.
    pub fn is_modelled(self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Returns the exchange-format element type tag.
    pub fn onnx_code(self) -> i32 {
        match self {
            Self::F32 => 1,
            Self::U8 => 2,
            Self::I8 => 3,
            Self::I32 => 6,
            Self::I64 => 7,
            Self::Bool => 9,
            Self::F16 => 10,
            Self::F64 => 11,
            Self::BF16 => 16,
            Self::Other(code) => code,
        }
    }

    /// Returns the size of a single element in bytes, or `None` for
    /// opaque tags.
    pub fn size_bytes(self) -> Option<usize> {
        match self {
            Self::F64 | Self::I64 => Some(8),
            Self::F32 | Self::I32 => Some(4),
            Self::F16 | Self::BF16 => Some(2),
            Self::I8 | Self::U8 | Self::Bool => Some(1),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::F32 => "f32",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::F64 => "f64",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::Bool => "bool",
            Self::Other(code) => return write!(f, "type#{code}"),
        };
        f.write_str(label)
    }
}
