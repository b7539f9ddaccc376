// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `LRN` and the pass-through for unrecognised operators.

use super::{Diagnostic, LoweredOp};
use model_ir::Node;

/// ncnn LRN region type 0: across channels.
const REGION_ACROSS_CHANNELS: i64 = 0;

pub(super) fn lower_lrn<'g>(node: &Node) -> LoweredOp<'g> {
    let bias = node.attr_float("bias", 1.0);
    if bias != 1.0 {
        tracing::warn!(
            "node '{}': LRN bias {} has no encoding, dropped",
            node.layer_name(),
            bias,
        );
    }
    let mut op = LoweredOp::new("LRN");
    op.int(0, REGION_ACROSS_CHANNELS);
    op.int(1, node.attr_int("size", 1));
    op.float(2, node.attr_float("alpha", 1.0));
    op.float(3, node.attr_float("beta", 0.5));
    op
}

/// Emits the operator under its own tag with no params, reporting every
/// attribute it carried.
pub(super) fn lower_unknown(node: &Node) -> LoweredOp<'_> {
    let mut op = LoweredOp::new(node.op_type.as_str());
    op.diagnostics = node
        .attributes
        .iter()
        .map(|(key, value)| Diagnostic {
            node: node.layer_name().to_string(),
            op_type: node.op_type.clone(),
            attribute: key.clone(),
            value: value.to_string(),
        })
        .collect();
    op
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::render_params;
    use model_ir::AttributeValue;

    #[test]
    fn test_lrn_params() {
        let node = Node::new("LRN")
            .with_attr("size", AttributeValue::Int(5))
            .with_attr("alpha", AttributeValue::Float(0.0001))
            .with_attr("beta", AttributeValue::Float(0.75));
        let op = lower_lrn(&node);
        assert_eq!(render_params(&op.params), "0=0 1=5 2=0.000100 3=0.750000");
    }

    #[test]
    fn test_lrn_defaults() {
        let op = lower_lrn(&Node::new("LRN"));
        assert_eq!(render_params(&op.params), "0=0 1=1 2=1.000000 3=0.500000");
    }

    #[test]
    fn test_unknown_reports_attributes() {
        let node = Node::new("Upsample")
            .with_name("up")
            .with_outputs(["y"])
            .with_attr("mode", AttributeValue::String("nearest".into()))
            .with_attr("scales", AttributeValue::Floats(vec![1.0, 2.0]));
        let op = lower_unknown(&node);
        assert_eq!(op.layer_type, "Upsample");
        assert!(op.params.is_empty());
        assert_eq!(op.diagnostics.len(), 2);
        assert_eq!(op.diagnostics[0].attribute, "mode");
        assert_eq!(op.diagnostics[0].value, "nearest");
        assert_eq!(op.diagnostics[1].node, "up");
    }
}
