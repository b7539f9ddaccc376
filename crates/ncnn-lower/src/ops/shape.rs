// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Layout operators: `Reshape`, `Transpose`, and the axis-carrying
//! `Concat` / `Softmax`.
//!
//! ncnn blobs drop the batch dimension, so axes shift down by one and
//! shapes are written innermost first.

use super::{Diagnostic, LoweredOp, OpKind};
use crate::{LowerError, LowerOptions, WeightMap};
use model_ir::Node;
use std::borrow::Cow;

/// Permutations of the non-batch axes of a rank-4 tensor.
const PERMUTE_4D: [([i64; 3], i64); 6] = [
    ([1, 2, 3], 0),
    ([1, 3, 2], 1),
    ([2, 1, 3], 2),
    ([2, 3, 1], 3),
    ([3, 1, 2], 4),
    ([3, 2, 1], 5),
];

/// Permutations of the non-batch axes of a rank-5 tensor.
const PERMUTE_5D: [([i64; 4], i64); 6] = [
    ([1, 2, 3, 4], 0),
    ([1, 3, 4, 2], 1),
    ([2, 1, 3, 4], 2),
    ([2, 3, 4, 1], 3),
    ([3, 4, 1, 2], 4),
    ([3, 4, 2, 1], 5),
];

pub(super) fn lower_axis<'g>(node: &Node, kind: &OpKind) -> LoweredOp<'g> {
    let layer_type = match kind {
        OpKind::Concat => "Concat",
        _ => "Softmax",
    };
    let mut op = LoweredOp::new(layer_type);
    op.int(0, node.attr_int("axis", 1) - 1);
    op
}

/// Where a reshape's target shape comes from.
enum ReshapeTarget<'g> {
    /// Dims from the `shape` attribute or a constant second input.
    Dims(Cow<'g, [i64]>),
    /// No usable target; the reason is reported as a diagnostic.
    Unresolved(String),
}

/// Target shape from the `shape` attribute, or from a constant second
/// input.
fn reshape_target<'g>(node: &Node, weights: &WeightMap<'g>) -> Result<ReshapeTarget<'g>, LowerError> {
    if node.attr("shape").is_some() {
        return Ok(ReshapeTarget::Dims(Cow::Owned(node.attr_ints("shape").to_vec())));
    }
    let Some(name) = node.input(1) else {
        return Ok(ReshapeTarget::Unresolved("no target shape".into()));
    };
    match weights.get(name) {
        Some(constant) => constant
            .i64_values()
            .map(ReshapeTarget::Dims)
            .map_err(LowerError::tensor(node)),
        None => Ok(ReshapeTarget::Unresolved(format!(
            "target shape '{name}' is not a constant"
        ))),
    }
}

/// Lowers a runtime `Reshape`.
///
/// A target that cannot be encoded (no constant shape, or a list length
/// outside 1..=5) still emits a `Reshape` layer, without params, and
/// reports a diagnostic. Under `strict` it is an error instead.
pub(super) fn lower_reshape<'g>(
    node: &Node,
    weights: &WeightMap<'g>,
    options: &LowerOptions,
) -> Result<LoweredOp<'g>, LowerError> {
    let mut op = LoweredOp::new("Reshape");
    let target = match reshape_target(node, weights)? {
        ReshapeTarget::Dims(dims) => dims,
        ReshapeTarget::Unresolved(detail) => return unencodable(node, op, detail, options),
    };
    match target.as_ref() {
        [w] => op.int(0, *w),
        [_, w] => op.int(0, *w),
        [_, h, w] => {
            op.int(0, *w);
            op.int(1, *h);
        }
        [_, c, h, w] => {
            op.int(0, *w);
            op.int(1, *h);
            op.int(2, *c);
        }
        [_, c, h, w0, w1] => {
            op.int(0, w0 * w1);
            op.int(1, *h);
            op.int(2, *c);
        }
        other => {
            let detail = format!("rank {} target {:?}", other.len(), other);
            return unencodable(node, op, detail, options);
        }
    }
    Ok(op)
}

fn unencodable<'g>(
    node: &Node,
    mut op: LoweredOp<'g>,
    detail: String,
    options: &LowerOptions,
) -> Result<LoweredOp<'g>, LowerError> {
    if options.strict {
        return Err(LowerError::UnsupportedReshape {
            node: node.layer_name().to_string(),
            detail,
        });
    }
    op.diagnostics.push(Diagnostic {
        node: node.layer_name().to_string(),
        op_type: node.op_type.clone(),
        attribute: "shape".into(),
        value: detail,
    });
    Ok(op)
}

fn permute_code(perm: &[i64]) -> Option<i64> {
    match perm {
        [0, rest @ ..] if rest.len() == 3 => PERMUTE_4D
            .iter()
            .find(|(p, _)| p.as_slice() == rest)
            .map(|(_, code)| *code),
        [0, rest @ ..] if rest.len() == 4 => PERMUTE_5D
            .iter()
            .find(|(p, _)| p.as_slice() == rest)
            .map(|(_, code)| *code),
        _ => None,
    }
}

pub(super) fn lower_transpose<'g>(node: &Node) -> Result<LoweredOp<'g>, LowerError> {
    let perm = node.attr_ints("perm");
    let code = permute_code(perm).ok_or_else(|| LowerError::UnsupportedPermutation {
        node: node.layer_name().to_string(),
        perm: perm.to_vec(),
    })?;
    let mut op = LoweredOp::new("Permute");
    op.int(0, code);
    Ok(op)
}
