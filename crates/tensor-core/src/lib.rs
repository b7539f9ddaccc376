// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Constant tensor types shared by the graph IR and the lowering engine.
//!
//! This crate provides:
//! - [`Tensor`]: a constant tensor whose payload is either a typed list
//!   or an opaque little-endian byte buffer.
//! - [`Shape`]: dimension descriptors.
//! - [`DType`]: element types of the exchange format, with their wire tags.
//!
//! The accessors on [`Tensor`] hide the storage form: callers ask for an
//! element count or stream the values as `f32` without caring whether the
//! exporter wrote `float_data` or `raw_data`.

mod dtype;
mod error;
mod shape;
mod tensor;

pub use dtype::DType;
pub use error::TensorError;
pub use shape::Shape;
pub use tensor::{Tensor, TensorData};
