// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `Conv` → `Convolution` / `ConvolutionDepthWise`.
//!
//! Inputs are `(X, W, B?)`. The filter count comes from the leading
//! dimension of `W`. Weights are written behind a float32 tag, then the
//! bias when present.

use super::{num_output, LoweredOp, PayloadWrite};
use crate::{LowerError, WeightMap};
use model_ir::Node;

pub(super) fn lower<'g>(node: &Node, weights: &WeightMap<'g>) -> Result<LoweredOp<'g>, LowerError> {
    let weight = weights.require(node, 1)?;
    let bias = match node.input(2) {
        Some(_) => Some(weights.require(node, 2)?),
        None => None,
    };
    let num_output = num_output(node, "Conv", weight)?;
    let group = node.attr_int("group", 1);

    let mut op = LoweredOp::new(if group > 1 {
        "ConvolutionDepthWise"
    } else {
        "Convolution"
    });
    op.int(0, num_output);
    op.pair(node, 1, "kernel_shape");
    op.pair(node, 2, "dilations");
    op.pair(node, 3, "strides");
    op.pads(node, 4);
    op.int(5, i64::from(bias.is_some()));
    op.int(6, weight.element_count().map_err(LowerError::tensor(node))? as i64);
    if group > 1 {
        op.int(7, group);
    }

    op.payload.push(PayloadWrite::QuantizeTag);
    op.payload.push(PayloadWrite::Tensor(weight));
    if let Some(bias) = bias {
        op.payload.push(PayloadWrite::Tensor(bias));
    }
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{render_params, testing::single_node};
    use model_ir::{AttributeValue, Initializer};
    use tensor_core::{Shape, Tensor};

    fn conv_node(inputs: &[&str]) -> Node {
        Node::new("Conv")
            .with_name("conv1")
            .with_inputs(inputs.iter().copied())
            .with_outputs(["y"])
            .with_attr("kernel_shape", AttributeValue::Ints(vec![3, 3]))
            .with_attr("dilations", AttributeValue::Ints(vec![1, 1]))
            .with_attr("strides", AttributeValue::Ints(vec![1, 1]))
            .with_attr("pads", AttributeValue::Ints(vec![1, 1, 1, 1]))
    }

    fn filters(out: usize, inp: usize) -> Initializer {
        let n = out * inp * 9;
        Initializer::new(
            "W",
            Tensor::from_f32(Shape::new(vec![out, inp, 3, 3]), vec![0.5; n]),
        )
    }

    #[test]
    fn test_conv_3x3_with_bias() {
        let graph = single_node(
            conv_node(&["x", "W", "B"]),
            vec![
                filters(16, 3),
                Initializer::new("B", Tensor::from_f32(Shape::vector(16), vec![0.0; 16])),
            ],
        );
        let weights = WeightMap::resolve(&graph);
        let op = lower(graph.node(0).unwrap(), &weights).unwrap();

        assert_eq!(op.layer_type, "Convolution");
        assert_eq!(
            render_params(&op.params),
            "0=16 1=3 11=3 2=1 12=1 3=1 13=1 4=1 14=1 5=1 6=432"
        );
        assert_eq!(op.payload.len(), 3);
        assert!(matches!(op.payload[0], PayloadWrite::QuantizeTag));
        assert_eq!(op.payload_len().unwrap(), 4 + 432 * 4 + 16 * 4);
    }

    #[test]
    fn test_conv_without_bias() {
        let graph = single_node(conv_node(&["x", "W"]), vec![filters(8, 1)]);
        let weights = WeightMap::resolve(&graph);
        let op = lower(graph.node(0).unwrap(), &weights).unwrap();
        assert!(render_params(&op.params).contains("5=0 6=72"));
        assert_eq!(op.payload.len(), 2);
    }

    #[test]
    fn test_grouped_conv_is_depthwise() {
        let node = conv_node(&["x", "W"]).with_attr("group", AttributeValue::Int(8));
        let graph = single_node(node, vec![filters(8, 1)]);
        let weights = WeightMap::resolve(&graph);
        let op = lower(graph.node(0).unwrap(), &weights).unwrap();
        assert_eq!(op.layer_type, "ConvolutionDepthWise");
        assert!(render_params(&op.params).ends_with("6=72 7=8"));
    }

    #[test]
    fn test_runtime_weight_is_rejected() {
        let graph = single_node(conv_node(&["x", "x"]), vec![]);
        let weights = WeightMap::resolve(&graph);
        assert!(matches!(
            lower(graph.node(0).unwrap(), &weights),
            Err(LowerError::MissingConstant { .. })
        ));
    }
}
