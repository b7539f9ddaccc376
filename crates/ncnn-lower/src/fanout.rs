// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Fan-out materialization.
//!
//! ncnn blobs are single-consumer. A value read by `n > 1` consumers gets
//! a `Split` layer right after its producer with outputs
//! `<value>_splitncnn_0 .. <value>_splitncnn_{n-1}`. Consumers are handed
//! those names from the top down: the first consumer in source order
//! reads `_splitncnn_{n-1}`, the last reads `_splitncnn_0`.

use crate::ValueCensus;
use std::collections::HashMap;

/// Suffix joining a value name to its split index.
pub const SPLIT_SUFFIX: &str = "_splitncnn_";

/// Name of the `index`-th split output of `value`.
pub fn split_name(value: &str, index: usize) -> String {
    format!("{value}{SPLIT_SUFFIX}{index}")
}

/// A split layer ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLayer {
    pub name: String,
    pub input: String,
    pub outputs: Vec<String>,
}

/// Mutable per-run renaming state.
#[derive(Debug)]
pub struct FanOut {
    /// Consumers of each fanned-out value not yet renamed.
    remaining: HashMap<String, usize>,
    /// Values whose split layer has not been emitted yet.
    pending: HashMap<String, usize>,
    next_split: usize,
}

impl FanOut {
    /// Starts a renaming pass from a finished census.
    pub fn new(census: &ValueCensus) -> Self {
        let counts: HashMap<String, usize> = census
            .fanned_out()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        Self {
            remaining: counts.clone(),
            pending: counts,
            next_split: 0,
        }
    }

    /// Returns the name the next consumer of `name` must read.
    ///
    /// Values with a single consumer pass through unchanged.
    pub fn consume(&mut self, name: &str) -> String {
        match self.remaining.get_mut(name) {
            Some(count) if *count > 0 => {
                *count -= 1;
                split_name(name, *count)
            }
            _ => name.to_string(),
        }
    }

    /// Returns the split layer for `name` if it fans out, at most once.
    pub fn split_after(&mut self, name: &str) -> Option<SplitLayer> {
        let count = self.pending.remove(name)?;
        let layer = SplitLayer {
            name: format!("splitncnn_{}", self.next_split),
            input: name.to_string(),
            outputs: (0..count).map(|k| split_name(name, k)).collect(),
        };
        self.next_split += 1;
        Some(layer)
    }

    /// Split layers produced so far.
    pub fn splits_emitted(&self) -> usize {
        self.next_split
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WeightMap;
    use model_ir::{Graph, Node, ValueInfo};

    fn fan_out(nodes: Vec<Node>) -> FanOut {
        let graph = Graph::new("t".into(), nodes, vec![], vec![ValueInfo::named("x")], vec![])
            .validate()
            .unwrap();
        let weights = WeightMap::resolve(&graph);
        FanOut::new(&ValueCensus::count(&graph, &weights))
    }

    fn three_consumers() -> FanOut {
        fan_out(vec![
            Node::new("Relu").with_inputs(["x"]).with_outputs(["a"]),
            Node::new("Relu").with_inputs(["a"]).with_outputs(["b"]),
            Node::new("Relu").with_inputs(["a"]).with_outputs(["c"]),
            Node::new("Relu").with_inputs(["a"]).with_outputs(["d"]),
        ])
    }

    #[test]
    fn test_consumers_read_in_descending_order() {
        let mut f = three_consumers();
        assert_eq!(f.consume("a"), "a_splitncnn_2");
        assert_eq!(f.consume("a"), "a_splitncnn_1");
        assert_eq!(f.consume("a"), "a_splitncnn_0");
    }

    #[test]
    fn test_single_consumer_passes_through() {
        let mut f = three_consumers();
        assert_eq!(f.consume("x"), "x");
        assert_eq!(f.consume("b"), "b");
    }

    #[test]
    fn test_split_layer_emitted_once() {
        let mut f = three_consumers();
        let split = f.split_after("a").unwrap();
        assert_eq!(split.name, "splitncnn_0");
        assert_eq!(split.input, "a");
        assert_eq!(
            split.outputs,
            vec!["a_splitncnn_0", "a_splitncnn_1", "a_splitncnn_2"]
        );
        assert!(f.split_after("a").is_none());
        assert!(f.split_after("b").is_none());
        assert_eq!(f.splits_emitted(), 1);
    }

    #[test]
    fn test_split_index_increments() {
        let mut f = fan_out(vec![
            Node::new("Relu").with_inputs(["x"]).with_outputs(["a"]),
            Node::new("Add").with_inputs(["a", "a"]).with_outputs(["b"]),
            Node::new("Add").with_inputs(["b", "b"]).with_outputs(["c"]),
        ]);
        assert_eq!(f.split_after("a").unwrap().name, "splitncnn_0");
        assert_eq!(f.split_after("b").unwrap().name, "splitncnn_1");
    }
}
