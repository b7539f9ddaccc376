// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Constant tensor type and storage-independent accessors.

use crate::{DType, Shape, TensorError};
use std::borrow::Cow;
use std::io::Write;

/// Size of one `f32` element on the weight stream.
const F32_BYTES: usize = 4;

/// Storage form of a constant tensor's payload.
///
/// Exporters either fill a typed list (`float_data`, `int64_data`) or dump
/// the little-endian bytes into `raw_data`. Both forms are kept as-is; the
/// accessors on [`Tensor`] decide how to read them.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    /// Typed `f32` list.
    Floats(Vec<f32>),
    /// Typed `i64` list.
    Int64s(Vec<i64>),
    /// Opaque little-endian byte buffer.
    Raw(Vec<u8>),
}

/// A constant tensor known at conversion time.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    dtype: DType,
    shape: Shape,
    data: TensorData,
}

impl Tensor {
    /// Creates a tensor from its parts without checking them against each other.
    pub fn new(dtype: DType, shape: Shape, data: TensorData) -> Self {
        Self { dtype, shape, data }
    }

    /// Creates an `f32` tensor backed by a typed list.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_f32(Shape::vector(3), vec![1.0, 2.0, 3.0]);
    /// assert_eq!(t.element_count().unwrap(), 3);
    /// ```
    pub fn from_f32(shape: Shape, values: Vec<f32>) -> Self {
        Self::new(DType::F32, shape, TensorData::Floats(values))
    }

    /// Creates an `i64` tensor backed by a typed list.
    pub fn from_i64(shape: Shape, values: Vec<i64>) -> Self {
        Self::new(DType::I64, shape, TensorData::Int64s(values))
    }

    /// Creates a tensor backed by a raw little-endian byte buffer.
    pub fn from_raw(dtype: DType, shape: Shape, bytes: Vec<u8>) -> Self {
        Self::new(dtype, shape, TensorData::Raw(bytes))
    }

    /// Returns the tensor's declared data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the payload in its original storage form.
    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Returns the number of `f32` elements in the payload.
    ///
    /// A raw buffer holds `len / 4` elements, a typed list holds its
    /// length. The declared shape is not consulted: the payload is what
    /// ends up on the weight stream.
    ///
    /// # Errors
    /// [`TensorError::UnsupportedDType`] for anything that is not `f32`,
    /// [`TensorError::BufferSizeMismatch`] for a raw buffer with a
    /// trailing partial element.
    pub fn element_count(&self) -> Result<usize, TensorError> {
        self.require_f32("element_count")?;
        match &self.data {
            TensorData::Floats(values) => Ok(values.len()),
            TensorData::Raw(bytes) => raw_len(bytes, F32_BYTES),
            TensorData::Int64s(_) => Err(TensorError::UnsupportedDType {
                op: "element_count",
                dtype: DType::I64,
            }),
        }
    }

    /// Returns the payload as `f32` values, decoding raw buffers.
    pub fn f32_values(&self) -> Result<Cow<'_, [f32]>, TensorError> {
        self.require_f32("f32_values")?;
        match &self.data {
            TensorData::Floats(values) => Ok(Cow::Borrowed(values)),
            TensorData::Raw(bytes) => {
                raw_len(bytes, F32_BYTES)?;
                Ok(Cow::Owned(
                    bytes
                        .chunks_exact(F32_BYTES)
                        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                        .collect(),
                ))
            }
            TensorData::Int64s(_) => Err(TensorError::UnsupportedDType {
                op: "f32_values",
                dtype: DType::I64,
            }),
        }
    }

    /// Returns the payload as `i64` values, decoding raw buffers.
    ///
    /// Used for shape operands; weights never go through this path.
    pub fn i64_values(&self) -> Result<Cow<'_, [i64]>, TensorError> {
        if self.dtype != DType::I64 {
            return Err(TensorError::UnsupportedDType {
                op: "i64_values",
                dtype: self.dtype,
            });
        }
        match &self.data {
            TensorData::Int64s(values) => Ok(Cow::Borrowed(values)),
            TensorData::Raw(bytes) => {
                raw_len(bytes, 8)?;
                Ok(Cow::Owned(
                    bytes
                        .chunks_exact(8)
                        .map(|c| {
                            let mut buf = [0u8; 8];
                            buf.copy_from_slice(c);
                            i64::from_le_bytes(buf)
                        })
                        .collect(),
                ))
            }
            TensorData::Floats(_) => Err(TensorError::UnsupportedDType {
                op: "i64_values",
                dtype: DType::F32,
            }),
        }
    }

    /// Appends the payload to `sink` as little-endian `f32`s.
    ///
    /// Raw buffers are copied byte-for-byte. Returns the number of bytes
    /// written, always `element_count() * 4`.
    pub fn write_f32_le<W: Write + ?Sized>(&self, sink: &mut W) -> Result<usize, TensorError> {
        let count = self.element_count()?;
        match &self.data {
            TensorData::Raw(bytes) => sink.write_all(&bytes[..count * F32_BYTES])?,
            TensorData::Floats(values) => {
                for v in values {
                    sink.write_all(&v.to_le_bytes())?;
                }
            }
            TensorData::Int64s(_) => unreachable!("element_count rejects i64 payloads"),
        }
        Ok(count * F32_BYTES)
    }

    /// Appends the payload to `sink` with `offset` added to every element.
    pub fn write_f32_le_offset<W: Write + ?Sized>(
        &self,
        sink: &mut W,
        offset: f32,
    ) -> Result<usize, TensorError> {
        let values = self.f32_values()?;
        for v in values.iter() {
            sink.write_all(&(v + offset).to_le_bytes())?;
        }
        Ok(values.len() * F32_BYTES)
    }

    fn require_f32(&self, op: &'static str) -> Result<(), TensorError> {
        if self.dtype == DType::F32 {
            Ok(())
        } else {
            Err(TensorError::UnsupportedDType {
                op,
                dtype: self.dtype,
            })
        }
    }
}

/// Number of whole elements in a raw buffer.
fn raw_len(bytes: &[u8], element_size: usize) -> Result<usize, TensorError> {
    if bytes.len() % element_size != 0 {
        return Err(TensorError::BufferSizeMismatch {
            element_size,
            actual: bytes.len(),
        });
    }
    Ok(bytes.len() / element_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_f32(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_element_count_typed() {
        let t = Tensor::from_f32(Shape::vector(4), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(t.element_count().unwrap(), 4);
    }

    #[test]
    fn test_element_count_raw() {
        let t = Tensor::from_raw(DType::F32, Shape::vector(3), raw_f32(&[1.0, 2.0, 3.0]));
        assert_eq!(t.element_count().unwrap(), 3);
    }

    #[test]
    fn test_element_count_rejects_non_f32() {
        let t = Tensor::from_i64(Shape::vector(2), vec![1, 2]);
        assert!(matches!(
            t.element_count(),
            Err(TensorError::UnsupportedDType { dtype: DType::I64, .. })
        ));

        let half = Tensor::from_raw(DType::F16, Shape::vector(2), vec![0; 4]);
        assert!(half.element_count().is_err());

        let opaque = Tensor::from_raw(DType::Other(5), Shape::vector(2), vec![0; 4]);
        assert!(matches!(
            opaque.element_count(),
            Err(TensorError::UnsupportedDType { dtype: DType::Other(5), .. })
        ));
        let mut sink = Vec::new();
        assert!(opaque.write_f32_le(&mut sink).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_element_count_partial_raw() {
        let t = Tensor::from_raw(DType::F32, Shape::vector(1), vec![0; 6]);
        assert!(matches!(
            t.element_count(),
            Err(TensorError::BufferSizeMismatch { actual: 6, .. })
        ));
    }

    #[test]
    fn test_write_typed_and_raw_agree() {
        let values = [0.5f32, -1.25, 3.0];
        let typed = Tensor::from_f32(Shape::vector(3), values.to_vec());
        let raw = Tensor::from_raw(DType::F32, Shape::vector(3), raw_f32(&values));

        let mut a = Vec::new();
        let mut b = Vec::new();
        assert_eq!(typed.write_f32_le(&mut a).unwrap(), 12);
        assert_eq!(raw.write_f32_le(&mut b).unwrap(), 12);
        assert_eq!(a, b);
        assert_eq!(a, raw_f32(&values));
    }

    #[test]
    fn test_write_with_offset() {
        let t = Tensor::from_raw(DType::F32, Shape::vector(2), raw_f32(&[1.0, 2.0]));
        let mut out = Vec::new();
        t.write_f32_le_offset(&mut out, 0.5).unwrap();
        assert_eq!(out, raw_f32(&[1.5, 2.5]));
    }

    #[test]
    fn test_f32_values_raw() {
        let t = Tensor::from_raw(DType::F32, Shape::vector(2), raw_f32(&[7.0, -7.0]));
        assert_eq!(t.f32_values().unwrap().as_ref(), &[7.0, -7.0]);
    }

    #[test]
    fn test_i64_values() {
        let typed = Tensor::from_i64(Shape::vector(2), vec![1, -1]);
        assert_eq!(typed.i64_values().unwrap().as_ref(), &[1, -1]);

        let bytes: Vec<u8> = [4i64, 64].iter().flat_map(|v| v.to_le_bytes()).collect();
        let raw = Tensor::from_raw(DType::I64, Shape::vector(2), bytes);
        assert_eq!(raw.i64_values().unwrap().as_ref(), &[4, 64]);

        let floats = Tensor::from_f32(Shape::vector(1), vec![1.0]);
        assert!(floats.i64_values().is_err());
    }
}
