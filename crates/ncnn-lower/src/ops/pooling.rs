// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Windowed and global pooling → `Pooling`.

use super::{LoweredOp, OpKind};
use model_ir::Node;

const POOL_MAX: i64 = 0;
const POOL_AVG: i64 = 1;
/// ncnn pad mode 1: valid padding.
const PAD_MODE_VALID: i64 = 1;

fn pool_type(kind: &OpKind) -> i64 {
    match kind {
        OpKind::AveragePool | OpKind::GlobalAveragePool => POOL_AVG,
        _ => POOL_MAX,
    }
}

pub(super) fn lower_pool<'g>(node: &Node, kind: &OpKind) -> LoweredOp<'g> {
    let mut op = LoweredOp::new("Pooling");
    op.int(0, pool_type(kind));
    op.pair(node, 1, "kernel_shape");
    op.pair(node, 2, "strides");
    op.pads(node, 3);
    op.int(5, PAD_MODE_VALID);
    op
}

pub(super) fn lower_global_pool<'g>(kind: &OpKind) -> LoweredOp<'g> {
    let mut op = LoweredOp::new("Pooling");
    op.int(0, pool_type(kind));
    op.int(4, 1);
    op
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::render_params;
    use model_ir::AttributeValue;

    #[test]
    fn test_max_pool_2x2() {
        let node = Node::new("MaxPool")
            .with_attr("kernel_shape", AttributeValue::Ints(vec![2, 2]))
            .with_attr("strides", AttributeValue::Ints(vec![2, 2]))
            .with_attr("pads", AttributeValue::Ints(vec![0, 0, 0, 0]));
        let op = lower_pool(&node, &OpKind::MaxPool);
        assert_eq!(op.layer_type, "Pooling");
        assert_eq!(
            render_params(&op.params),
            "0=0 1=2 11=2 2=2 12=2 3=0 13=0 5=1"
        );
        assert!(op.payload.is_empty());
    }

    #[test]
    fn test_average_pool_rectangular() {
        let node = Node::new("AveragePool")
            .with_attr("kernel_shape", AttributeValue::Ints(vec![3, 5]))
            .with_attr("strides", AttributeValue::Ints(vec![1, 2]));
        let op = lower_pool(&node, &OpKind::AveragePool);
        assert_eq!(render_params(&op.params), "0=1 1=5 11=3 2=2 12=1 5=1");
    }

    #[test]
    fn test_global_pools() {
        let avg = lower_global_pool(&OpKind::GlobalAveragePool);
        assert_eq!(render_params(&avg.params), "0=1 4=1");
        let max = lower_global_pool(&OpKind::GlobalMaxPool);
        assert_eq!(render_params(&max.params), "0=0 4=1");
    }
}
