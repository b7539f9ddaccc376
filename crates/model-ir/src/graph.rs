// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Exchange-format graph: ordered nodes, constants and declared inputs.
//!
//! # Type-State Pattern
//!
//! The graph transitions through states enforced at compile time:
//!
//! ```text
//! Graph<Loaded>     : decoded, not yet checked.
//!       │  .validate()
//!       ▼
//! Graph<Validated>  : every value name resolves, ready for lowering.
//! ```
//!
//! The lowering engine only accepts `Graph<Validated>`, so the invariant
//! "every runtime value is a declared input or the output of exactly one
//! node" holds by construction.

use crate::{Initializer, ModelError, Node, ValueInfo};
use std::collections::{HashMap, HashSet};
use std::fmt;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: graph has been loaded but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: graph has been validated and is ready for lowering.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for graph states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

// ── Graph ──────────────────────────────────────────────────────────

/// The complete model: nodes in source order plus the constant table.
#[derive(Debug, Clone)]
pub struct Graph<S: GraphState = Loaded> {
    /// Graph name as recorded by the exporter.
    pub name: String,
    /// Nodes in source order.
    pub nodes: Vec<Node>,
    /// Named constant tensors.
    pub initializers: Vec<Initializer>,
    /// Declared graph inputs. Exporters often list initializers here too.
    pub inputs: Vec<ValueInfo>,
    /// Declared graph outputs.
    pub outputs: Vec<ValueInfo>,
    /// State marker (zero-sized, compile-time only).
    _state: std::marker::PhantomData<S>,
}

// ── Loaded state ───────────────────────────────────────────────────

impl Graph<Loaded> {
    /// Creates a new graph in the `Loaded` state.
    pub fn new(
        name: String,
        nodes: Vec<Node>,
        initializers: Vec<Initializer>,
        inputs: Vec<ValueInfo>,
        outputs: Vec<ValueInfo>,
    ) -> Self {
        Self {
            name,
            nodes,
            initializers,
            inputs,
            outputs,
            _state: std::marker::PhantomData,
        }
    }

    /// Validates the graph and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - The graph has at least one node.
    /// - Every node has an operator kind and at least one output.
    /// - No value is produced twice (by two nodes, or by a node and a
    ///   declared input or constant).
    /// - Every non-empty node input names a constant, a declared input,
    ///   or some node's output.
    pub fn validate(self) -> Result<Graph<Validated>, ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidGraph("graph contains no nodes".into()));
        }

        let constants: HashSet<&str> = self.initializers.iter().map(|i| i.name.as_str()).collect();
        let declared: HashSet<&str> = self.inputs.iter().map(|v| v.name.as_str()).collect();

        // Producer of each node output, by node index.
        let mut producers: HashMap<&str, usize> = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if node.op_type.is_empty() {
                return Err(ModelError::InvalidNode {
                    node: format!("#{i}"),
                    detail: "missing operator kind".into(),
                });
            }
            if node.outputs.is_empty() || node.outputs.iter().any(|o| o.is_empty()) {
                return Err(ModelError::InvalidNode {
                    node: format!("#{i} ({})", node.op_type),
                    detail: "node must have named outputs".into(),
                });
            }
            for output in &node.outputs {
                let name = output.as_str();
                if let Some(prev) = producers.insert(name, i) {
                    return Err(ModelError::InvalidGraph(format!(
                        "value '{name}' is produced by both node #{prev} and node #{i}"
                    )));
                }
                if constants.contains(name) || declared.contains(name) {
                    return Err(ModelError::InvalidGraph(format!(
                        "value '{name}' is produced by node #{i} but is also a graph input or constant"
                    )));
                }
            }
        }

        for node in &self.nodes {
            for input in node.present_inputs() {
                if !constants.contains(input)
                    && !declared.contains(input)
                    && !producers.contains_key(input)
                {
                    return Err(ModelError::InvalidNode {
                        node: node.layer_name().to_string(),
                        detail: format!("input '{input}' is never defined"),
                    });
                }
            }
        }

        // Consumers appearing before their producer are legal but unusual.
        for (i, node) in self.nodes.iter().enumerate() {
            for input in node.present_inputs() {
                if let Some(&p) = producers.get(input) {
                    if p >= i {
                        tracing::warn!(
                            "node '{}' consumes '{}' before node #{} produces it",
                            node.layer_name(),
                            input,
                            p,
                        );
                    }
                }
            }
        }

        Ok(Graph {
            name: self.name,
            nodes: self.nodes,
            initializers: self.initializers,
            inputs: self.inputs,
            outputs: self.outputs,
            _state: std::marker::PhantomData,
        })
    }
}

// ── Validated state ────────────────────────────────────────────────

impl Graph<Validated> {
    /// Returns the number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns an iterator over the nodes in source order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns a reference to a node by index.
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Looks up a constant by name.
    pub fn initializer(&self, name: &str) -> Option<&Initializer> {
        self.initializers.iter().find(|i| i.name == name)
    }

    /// Total bytes of constant payload, by declared shape and dtype.
    ///
    /// Constants with an opaque element type are not counted.
    pub fn total_constant_bytes(&self) -> usize {
        self.initializers
            .iter()
            .filter_map(|i| i.tensor.shape().size_bytes(i.tensor.dtype()))
            .sum()
    }

    /// Returns a summary string describing the graph.
    pub fn summary(&self) -> String {
        format!(
            "Graph '{}': {} nodes, {} constants ({:.2} MB), {} declared inputs",
            self.name,
            self.num_nodes(),
            self.initializers.len(),
            self.total_constant_bytes() as f64 / (1024.0 * 1024.0),
            self.inputs.len(),
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for Graph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graph '{}' ({} nodes):", self.name, self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {}", node.summary())?;
        }
        Ok(())
    }
}
