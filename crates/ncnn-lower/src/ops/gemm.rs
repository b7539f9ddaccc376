// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `Gemm` → `InnerProduct`.
//!
//! Only the fully-connected form `Y = X · Bᵀ + C` with unit scaling and
//! a broadcast bias has an encoding.

use super::{num_output, LoweredOp, PayloadWrite};
use crate::{LowerError, WeightMap};
use model_ir::Node;

pub(super) fn lower<'g>(node: &Node, weights: &WeightMap<'g>) -> Result<LoweredOp<'g>, LowerError> {
    let alpha = node.attr_float("alpha", 1.0);
    let beta = node.attr_float("beta", 1.0);
    let trans_a = node.attr_int("transA", 0);
    let trans_b = node.attr_int("transB", 0);
    let broadcast = node.attr_int("broadcast", 0);

    if alpha != 1.0 || beta != 1.0 || trans_a != 0 || trans_b != 1 || broadcast != 1 {
        return Err(LowerError::UnsupportedAttributes {
            node: node.layer_name().to_string(),
            op: "Gemm",
            detail: format!(
                "alpha={alpha} beta={beta} transA={trans_a} transB={trans_b} broadcast={broadcast}"
            ),
        });
    }

    let weight = weights.require(node, 1)?;
    let bias = weights.require(node, 2)?;
    let num_output = num_output(node, "Gemm", weight)?;

    let mut op = LoweredOp::new("InnerProduct");
    op.int(0, num_output);
    op.int(1, 1);
    op.int(2, weight.element_count().map_err(LowerError::tensor(node))? as i64);
    op.payload.push(PayloadWrite::Tensor(weight));
    op.payload.push(PayloadWrite::Tensor(bias));
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{render_params, testing::single_node};
    use model_ir::{AttributeValue, Initializer};
    use tensor_core::{Shape, Tensor};

    fn gemm(attrs: &[(&str, AttributeValue)]) -> Node {
        let mut node = Node::new("Gemm")
            .with_name("fc")
            .with_inputs(["x", "B", "C"])
            .with_outputs(["y"]);
        for (k, v) in attrs {
            node = node.with_attr(*k, v.clone());
        }
        node
    }

    fn constants() -> Vec<Initializer> {
        vec![
            Initializer::new("B", Tensor::from_f32(Shape::matrix(10, 4), vec![0.1; 40])),
            Initializer::new("C", Tensor::from_f32(Shape::vector(10), vec![0.0; 10])),
        ]
    }

    #[test]
    fn test_fully_connected_gemm() {
        let graph = single_node(
            gemm(&[
                ("transB", AttributeValue::Int(1)),
                ("broadcast", AttributeValue::Int(1)),
            ]),
            constants(),
        );
        let weights = WeightMap::resolve(&graph);
        let op = lower(graph.node(0).unwrap(), &weights).unwrap();
        assert_eq!(op.layer_type, "InnerProduct");
        assert_eq!(render_params(&op.params), "0=10 1=1 2=40");
        assert_eq!(op.payload_len().unwrap(), (40 + 10) * 4);
    }

    #[test]
    fn test_scaled_gemm_rejected() {
        let graph = single_node(
            gemm(&[
                ("alpha", AttributeValue::Float(0.5)),
                ("transB", AttributeValue::Int(1)),
                ("broadcast", AttributeValue::Int(1)),
            ]),
            constants(),
        );
        let weights = WeightMap::resolve(&graph);
        let err = lower(graph.node(0).unwrap(), &weights).unwrap_err();
        assert!(matches!(err, LowerError::UnsupportedAttributes { op: "Gemm", .. }));
    }

    #[test]
    fn test_scalar_weight_rejected() {
        let graph = single_node(
            gemm(&[
                ("transB", AttributeValue::Int(1)),
                ("broadcast", AttributeValue::Int(1)),
            ]),
            vec![
                Initializer::new("B", Tensor::from_f32(Shape::scalar(), vec![0.1])),
                Initializer::new("C", Tensor::from_f32(Shape::vector(1), vec![0.0])),
            ],
        );
        let weights = WeightMap::resolve(&graph);
        let err = lower(graph.node(0).unwrap(), &weights).unwrap_err();
        assert!(matches!(
            err,
            LowerError::UnsupportedAttributes { op: "Gemm", ref detail, .. }
                if detail.contains("no dimensions")
        ));
    }

    #[test]
    fn test_untransposed_gemm_rejected() {
        let graph = single_node(gemm(&[("broadcast", AttributeValue::Int(1))]), constants());
        let weights = WeightMap::resolve(&graph);
        assert!(lower(graph.node(0).unwrap(), &weights).is_err());
    }
}
