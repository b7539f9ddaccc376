// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operator lowering table.
//!
//! Each exchange-format operator kind maps to one handler that produces
//! the target layer tag, its `key=value` parameters and the constant
//! payload to append to the weight file. Dispatch is an exhaustive match
//! on [`OpKind`], so adding a kind without a handler does not compile.
//!
//! Parameter keys follow ncnn conventions: a 2-D attribute's second
//! spatial value (width) goes under the base key and the first (height)
//! under `key + 10`.

mod batchnorm;
mod conv;
mod gemm;
mod misc;
mod pooling;
mod shape;

use crate::{LowerError, LowerOptions, WeightMap};
use model_ir::Node;
use std::borrow::Cow;
use std::fmt;
use std::io::Write;
use tensor_core::Tensor;

// ── Operator kinds ─────────────────────────────────────────────────

/// Operator kinds with a dedicated lowering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OpKind {
    AveragePool,
    MaxPool,
    GlobalAveragePool,
    GlobalMaxPool,
    BatchNormalization,
    Concat,
    Conv,
    Dropout,
    Gemm,
    Lrn,
    Relu,
    Reshape,
    Softmax,
    Transpose,
    /// Anything else; emitted verbatim under its own tag.
    Unknown(String),
}

impl OpKind {
    /// Classifies an operator type string.
    pub fn parse(op_type: &str) -> Self {
        match op_type {
            "AveragePool" => Self::AveragePool,
            "MaxPool" => Self::MaxPool,
            "GlobalAveragePool" => Self::GlobalAveragePool,
            "GlobalMaxPool" => Self::GlobalMaxPool,
            "BatchNormalization" => Self::BatchNormalization,
            "Concat" => Self::Concat,
            "Conv" => Self::Conv,
            "Dropout" => Self::Dropout,
            "Gemm" => Self::Gemm,
            "LRN" => Self::Lrn,
            "Relu" => Self::Relu,
            "Reshape" => Self::Reshape,
            "Softmax" => Self::Softmax,
            "Transpose" => Self::Transpose,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Returns `true` for kinds without a dedicated handler.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

// ── Lowered layer ──────────────────────────────────────────────────

/// A parameter value on a layer line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f32),
}

/// One `key=value` entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    pub key: u32,
    pub value: ParamValue,
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            ParamValue::Int(v) => write!(f, "{}={}", self.key, v),
            ParamValue::Float(v) => write!(f, "{}={:.6}", self.key, v),
        }
    }
}

/// Renders params the way they appear on a layer line, space separated.
#[cfg(test)]
pub(crate) fn render_params(params: &[Param]) -> String {
    params
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quantization tag preceding convolution weights: plain float32.
const FLOAT32_TAG: [u8; 4] = [0; 4];

/// One contiguous write to the weight file.
#[derive(Debug, Clone, Copy)]
pub enum PayloadWrite<'g> {
    /// 4-byte tag marking the following weights as unquantized.
    QuantizeTag,
    /// A constant's float values.
    Tensor(&'g Tensor),
    /// A constant's float values with `offset` added to each element.
    Offset { tensor: &'g Tensor, offset: f32 },
}

impl PayloadWrite<'_> {
    /// Appends this write to `sink`, returning the number of bytes written.
    pub fn write_to<W: Write + ?Sized>(
        &self,
        node: &Node,
        sink: &mut W,
    ) -> Result<usize, LowerError> {
        match self {
            Self::QuantizeTag => {
                sink.write_all(&FLOAT32_TAG)?;
                Ok(FLOAT32_TAG.len())
            }
            Self::Tensor(tensor) => tensor.write_f32_le(sink).map_err(LowerError::tensor(node)),
            Self::Offset { tensor, offset } => tensor
                .write_f32_le_offset(sink, *offset)
                .map_err(LowerError::tensor(node)),
        }
    }
}

/// An attribute the lowering did not consume, reported for unknown ops.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Diagnostic {
    pub node: String,
    pub op_type: String,
    pub attribute: String,
    pub value: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): unhandled attribute {} = {}",
            self.node, self.op_type, self.attribute, self.value
        )
    }
}

/// The result of lowering one node.
#[derive(Debug, Clone)]
pub struct LoweredOp<'g> {
    /// Target layer tag.
    pub layer_type: Cow<'g, str>,
    pub params: Vec<Param>,
    pub payload: Vec<PayloadWrite<'g>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'g> LoweredOp<'g> {
    pub(crate) fn new(layer_type: impl Into<Cow<'g, str>>) -> Self {
        Self {
            layer_type: layer_type.into(),
            params: Vec::new(),
            payload: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn int(&mut self, key: u32, value: i64) {
        self.params.push(Param {
            key,
            value: ParamValue::Int(value),
        });
    }

    pub(crate) fn float(&mut self, key: u32, value: f32) {
        self.params.push(Param {
            key,
            value: ParamValue::Float(value),
        });
    }

    /// Encodes a 1- or 2-element spatial list at `key` and `key + 10`.
    pub(crate) fn pair(&mut self, node: &Node, key: u32, attribute: &str) {
        match node.attr_ints(attribute) {
            [] => {}
            [v] => self.int(key, *v),
            [h, w] => {
                self.int(key, *w);
                self.int(key + 10, *h);
            }
            other => tracing::warn!(
                "node '{}': ignoring {}-element '{}' list {:?}",
                node.layer_name(),
                other.len(),
                attribute,
                other,
            ),
        }
    }

    /// Encodes a pad list. A 4-element `[top, left, bottom, right]` list
    /// keeps only its leading pair.
    pub(crate) fn pads(&mut self, node: &Node, key: u32) {
        match node.attr_ints("pads") {
            [top, left, bottom, right] => {
                self.int(key, *left);
                self.int(key + 10, *top);
                if (top, left) != (bottom, right) {
                    tracing::warn!(
                        "node '{}': asymmetric pads {:?} truncated to [{}, {}]",
                        node.layer_name(),
                        [top, left, bottom, right],
                        top,
                        left,
                    );
                }
            }
            _ => self.pair(node, key, "pads"),
        }
    }

    /// Total bytes the payload will append to the weight file.
    #[cfg(test)]
    pub(crate) fn payload_len(&self) -> Result<usize, tensor_core::TensorError> {
        self.payload.iter().try_fold(0, |acc, write| {
            let bytes = match write {
                PayloadWrite::QuantizeTag => FLOAT32_TAG.len(),
                PayloadWrite::Tensor(t) | PayloadWrite::Offset { tensor: t, .. } => {
                    t.element_count()? * std::mem::size_of::<f32>()
                }
            };
            Ok(acc + bytes)
        })
    }
}

/// Output width of a filter or fully-connected weight: its leading dim.
pub(crate) fn num_output(node: &Node, op: &'static str, weight: &Tensor) -> Result<i64, LowerError> {
    weight
        .shape()
        .leading_dim()
        .map(|n| n as i64)
        .ok_or_else(|| LowerError::UnsupportedAttributes {
            node: node.layer_name().to_string(),
            op,
            detail: "weight tensor has no dimensions".into(),
        })
}

// ── Dispatch ───────────────────────────────────────────────────────

/// Lowers one node according to its kind.
///
/// # Errors
/// Propagates handler errors; unknown kinds fail only when
/// `options.strict` is set.
pub fn lower_node<'g>(
    kind: &OpKind,
    node: &'g Node,
    weights: &WeightMap<'g>,
    options: &LowerOptions,
) -> Result<LoweredOp<'g>, LowerError> {
    match kind {
        OpKind::AveragePool | OpKind::MaxPool => Ok(pooling::lower_pool(node, kind)),
        OpKind::GlobalAveragePool | OpKind::GlobalMaxPool => {
            Ok(pooling::lower_global_pool(kind))
        }
        OpKind::BatchNormalization => batchnorm::lower(node, weights),
        OpKind::Concat | OpKind::Softmax => Ok(shape::lower_axis(node, kind)),
        OpKind::Conv => conv::lower(node, weights),
        OpKind::Dropout => Ok(LoweredOp::new("Dropout")),
        OpKind::Gemm => gemm::lower(node, weights),
        OpKind::Lrn => Ok(misc::lower_lrn(node)),
        OpKind::Relu => Ok(LoweredOp::new("ReLU")),
        OpKind::Reshape => shape::lower_reshape(node, weights, options),
        OpKind::Transpose => shape::lower_transpose(node),
        OpKind::Unknown(op_type) if options.strict => Err(LowerError::UnknownOperator {
            node: node.layer_name().to_string(),
            op_type: op_type.clone(),
        }),
        OpKind::Unknown(_) => Ok(misc::lower_unknown(node)),
    }
}

// ── Test helpers ───────────────────────────────────────────────────
