// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `BatchNormalization` → `BatchNorm`.
//!
//! Inputs are `(X, scale, B, mean, var)`. The payload order is scale,
//! mean, `var + epsilon`, bias.

use super::{LoweredOp, PayloadWrite};
use crate::{LowerError, WeightMap};
use model_ir::Node;

const DEFAULT_EPSILON: f32 = 1e-5;

pub(super) fn lower<'g>(node: &Node, weights: &WeightMap<'g>) -> Result<LoweredOp<'g>, LowerError> {
    let scale = weights.require(node, 1)?;
    let bias = weights.require(node, 2)?;
    let mean = weights.require(node, 3)?;
    let var = weights.require(node, 4)?;
    let epsilon = node.attr_float("epsilon", DEFAULT_EPSILON);

    let mut op = LoweredOp::new("BatchNorm");
    op.int(0, scale.element_count().map_err(LowerError::tensor(node))? as i64);
    op.payload.extend([
        PayloadWrite::Tensor(scale),
        PayloadWrite::Tensor(mean),
        PayloadWrite::Offset {
            tensor: var,
            offset: epsilon,
        },
        PayloadWrite::Tensor(bias),
    ]);
    Ok(op)
}
