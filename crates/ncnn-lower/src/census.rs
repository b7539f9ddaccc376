// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reference counting over runtime values.
//!
//! The census walks the graph once before anything is written and fixes
//! the two numbers the param header declares up front: how many layers
//! will be emitted and how many distinct blob names they reference.

use crate::WeightMap;
use model_ir::{graph::Validated, Graph};
use std::collections::{BTreeMap, BTreeSet};

/// Consumer counts and header totals for one graph.
#[derive(Debug, Clone, Default)]
pub struct ValueCensus {
    /// Runtime values read by more than one consumer slot.
    fanned_out: BTreeMap<String, usize>,
    /// Every runtime value name that appears on an emitted layer line,
    /// before split renaming.
    value_names: BTreeSet<String>,
    /// Declared graph inputs that are not constants, in declaration order.
    runtime_inputs: Vec<String>,
    /// Nodes that will become layers.
    lowered_nodes: usize,
}

impl ValueCensus {
    /// Counts consumers of every runtime value in `graph`.
    ///
    /// Constant operands and elided reshapes are skipped, so the counts
    /// only reflect edges that will exist in the emitted graph.
    pub fn count(graph: &Graph<Validated>, weights: &WeightMap<'_>) -> Self {
        let mut consumers: BTreeMap<String, usize> = BTreeMap::new();
        let mut value_names = BTreeSet::new();
        let mut lowered_nodes = 0;

        for (index, node) in graph.nodes.iter().enumerate() {
            if weights.is_elided(index) {
                continue;
            }
            lowered_nodes += 1;
            for input in node.present_inputs() {
                if weights.is_constant(input) {
                    continue;
                }
                *consumers.entry(input.to_string()).or_insert(0) += 1;
                value_names.insert(input.to_string());
            }
            value_names.extend(node.outputs.iter().cloned());
        }

        let mut runtime_inputs: Vec<String> = Vec::new();
        for input in &graph.inputs {
            if weights.is_constant(&input.name) || runtime_inputs.contains(&input.name) {
                continue;
            }
            value_names.insert(input.name.clone());
            runtime_inputs.push(input.name.clone());
        }

        consumers.retain(|_, count| *count > 1);

        tracing::debug!(
            "census: {} layers, {} runtime inputs, {} fanned-out values",
            lowered_nodes,
            runtime_inputs.len(),
            consumers.len(),
        );

        Self {
            fanned_out: consumers,
            value_names,
            runtime_inputs,
            lowered_nodes,
        }
    }

    /// Consumer count of `name`, if it has more than one consumer.
    pub fn consumer_count(&self, name: &str) -> Option<usize> {
        self.fanned_out.get(name).copied()
    }

    /// Values that need a split layer, with their consumer counts.
    pub fn fanned_out(&self) -> impl Iterator<Item = (&str, usize)> {
        self.fanned_out.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Number of split layers that will be emitted.
    pub fn split_count(&self) -> usize {
        self.fanned_out.len()
    }

    /// Declared graph inputs that become `Input` layers.
    pub fn runtime_inputs(&self) -> &[String] {
        &self.runtime_inputs
    }

    /// Layers in the emitted graph: lowered nodes, input layers and
    /// split layers.
    pub fn layer_count(&self) -> usize {
        self.lowered_nodes + self.runtime_inputs.len() + self.fanned_out.len()
    }

    /// Distinct blob names in the emitted graph. Each split layer adds one
    /// name per consumer.
    pub fn value_count(&self) -> usize {
        self.value_names.len() + self.fanned_out.values().sum::<usize>()
    }
}
