// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Weight resolution: which value names are compile-time constants.
//!
//! Every initializer is a constant. A `Reshape` whose single input is a
//! constant is folded away: its name and outputs become aliases of the same
//! constant and the node is marked elided, so no later pass sees it as a
//! layer or a runtime value.

use crate::ops::OpKind;
use crate::LowerError;
use model_ir::{graph::Validated, Graph, Node};
use std::collections::{HashMap, HashSet};
use tensor_core::Tensor;

/// Name → constant mapping for one lowering run.
#[derive(Debug)]
pub struct WeightMap<'g> {
    graph: &'g Graph<Validated>,
    /// Value name → index into `graph.initializers`.
    constants: HashMap<&'g str, usize>,
    /// Indices of reshape nodes folded into `constants`.
    elided: HashSet<usize>,
}

impl<'g> WeightMap<'g> {
    /// Builds the weight map for `graph`.
    ///
    /// Must complete before reference counting: constant edges are never
    /// runtime fan-out.
    pub fn resolve(graph: &'g Graph<Validated>) -> Self {
        let mut constants: HashMap<&'g str, usize> = graph
            .initializers
            .iter()
            .enumerate()
            .map(|(i, init)| (init.name.as_str(), i))
            .collect();
        let mut elided = HashSet::new();

        for (index, node) in graph.nodes.iter().enumerate() {
            if OpKind::parse(&node.op_type) != OpKind::Reshape || node.inputs.len() != 1 {
                continue;
            }
            let Some(&constant) = constants.get(node.inputs[0].as_str()) else {
                continue;
            };
            constants.insert(node.layer_name(), constant);
            for output in &node.outputs {
                constants.insert(output.as_str(), constant);
            }
            elided.insert(index);
            tracing::debug!(
                "folded constant reshape '{}' onto '{}'",
                node.layer_name(),
                graph.initializers[constant].name,
            );
        }

        Self {
            graph,
            constants,
            elided,
        }
    }

    /// Returns `true` if `name` resolves to a constant.
    pub fn is_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    /// Looks up a constant by value name.
    pub fn get(&self, name: &str) -> Option<&'g Tensor> {
        let graph = self.graph;
        self.constants
            .get(name)
            .map(|&i| &graph.initializers[i].tensor)
    }

    /// Resolves the constant feeding input slot `index` of `node`.
    ///
    /// # Errors
    /// [`LowerError::MissingConstant`] when the slot is empty or names a
    /// runtime value.
    pub fn require(&self, node: &Node, index: usize) -> Result<&'g Tensor, LowerError> {
        let name = node.input(index).ok_or_else(|| LowerError::MissingConstant {
            node: node.layer_name().to_string(),
            name: format!("<input #{index}>"),
        })?;
        self.get(name).ok_or_else(|| LowerError::MissingConstant {
            node: node.layer_name().to_string(),
            name: name.to_string(),
        })
    }

    /// Returns `true` if node `index` was folded into the weight map.
    pub fn is_elided(&self, index: usize) -> bool {
        self.elided.contains(&index)
    }

    /// Number of folded reshape nodes.
    pub fn num_elided(&self) -> usize {
        self.elided.len()
    }

    /// Number of names (initializers plus aliases) that resolve to a constant.
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::{Initializer, ValueInfo};
    use tensor_core::Shape;

    fn graph(nodes: Vec<Node>) -> Graph<Validated> {
        Graph::new(
            "t".into(),
            nodes,
            vec![Initializer::new(
                "w",
                Tensor::from_f32(Shape::vector(4), vec![1.0, 2.0, 3.0, 4.0]),
            )],
            vec![ValueInfo::named("x"), ValueInfo::named("w")],
            vec![],
        )
        .validate()
        .unwrap()
    }

    #[test]
    fn test_initializers_are_constants() {
        let g = graph(vec![Node::new("Relu").with_inputs(["x"]).with_outputs(["y"])]);
        let weights = WeightMap::resolve(&g);
        assert!(weights.is_constant("w"));
        assert!(!weights.is_constant("x"));
        assert!(!weights.is_constant("y"));
        assert_eq!(weights.len(), 1);
        assert_eq!(weights.num_elided(), 0);
    }

    #[test]
    fn test_constant_reshape_is_elided() {
        let g = graph(vec![
            Node::new("Reshape")
                .with_name("w_reshape")
                .with_inputs(["w"])
                .with_outputs(["w2"]),
            Node::new("Mul").with_inputs(["x", "w2"]).with_outputs(["y"]),
        ]);
        let weights = WeightMap::resolve(&g);

        assert!(weights.is_elided(0));
        assert!(!weights.is_elided(1));
        assert!(weights.is_constant("w_reshape"));
        assert!(weights.is_constant("w2"));
        assert!(std::ptr::eq(weights.get("w2").unwrap(), weights.get("w").unwrap()));
    }

    #[test]
    fn test_chained_constant_reshapes() {
        let g = graph(vec![
            Node::new("Reshape").with_inputs(["w"]).with_outputs(["w2"]),
            Node::new("Reshape").with_inputs(["w2"]).with_outputs(["w3"]),
            Node::new("Add").with_inputs(["x", "w3"]).with_outputs(["y"]),
        ]);
        let weights = WeightMap::resolve(&g);
        assert_eq!(weights.num_elided(), 2);
        assert!(std::ptr::eq(weights.get("w3").unwrap(), weights.get("w").unwrap()));
    }

    #[test]
    fn test_runtime_reshape_is_kept() {
        let g = graph(vec![
            Node::new("Reshape").with_inputs(["x"]).with_outputs(["x2"]),
            Node::new("Reshape").with_inputs(["x2", "w"]).with_outputs(["x3"]),
        ]);
        let weights = WeightMap::resolve(&g);
        assert_eq!(weights.num_elided(), 0);
        assert!(!weights.is_constant("x2"));
    }

    #[test]
    fn test_require_missing_constant() {
        let g = graph(vec![Node::new("Conv")
            .with_name("conv1")
            .with_inputs(["x", "x"])
            .with_outputs(["y"])]);
        let weights = WeightMap::resolve(&g);
        let node = g.node(0).unwrap();

        let err = weights.require(node, 1).unwrap_err();
        assert!(matches!(
            &err,
            LowerError::MissingConstant { node, name } if node == "conv1" && name == "x"
        ));
        assert!(matches!(
            weights.require(node, 2),
            Err(LowerError::MissingConstant { .. })
        ));
    }
}
