// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The lowering pipeline: resolve weights, count references, then emit
//! every layer in one forward pass.

use crate::emitter::Emitter;
use crate::ops::{self, Diagnostic, OpKind};
use crate::{FanOut, LowerError, ValueCensus, WeightMap};
use model_ir::{graph::Validated, Graph};
use std::io::Write;

/// Knobs for one lowering run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LowerOptions {
    /// Fail on operators without a dedicated handler, and on reshape
    /// targets without an encoding, instead of passing them through.
    #[serde(default)]
    pub strict: bool,
}

/// Totals from a finished emission pass.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct LoweringStats {
    pub layer_count: usize,
    pub value_count: usize,
    pub split_count: usize,
    pub input_count: usize,
    pub elided_reshapes: usize,
    pub unknown_ops: usize,
    pub weight_bytes: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// A graph with its weight map and census computed, ready to emit.
#[derive(Debug)]
pub struct LoweringPlan<'g> {
    graph: &'g Graph<Validated>,
    weights: WeightMap<'g>,
    census: ValueCensus,
    options: LowerOptions,
}

impl<'g> LoweringPlan<'g> {
    /// Runs the analysis passes over `graph`.
    pub fn prepare(graph: &'g Graph<Validated>, options: LowerOptions) -> Self {
        let weights = WeightMap::resolve(graph);
        let census = ValueCensus::count(graph, &weights);
        tracing::info!(
            "planned '{}': {} layers, {} blobs ({} splits, {} folded reshapes)",
            graph.name,
            census.layer_count(),
            census.value_count(),
            census.split_count(),
            weights.num_elided(),
        );
        Self {
            graph,
            weights,
            census,
            options,
        }
    }

    pub fn weights(&self) -> &WeightMap<'g> {
        &self.weights
    }

    pub fn census(&self) -> &ValueCensus {
        &self.census
    }

    /// Layer count the header will declare.
    pub fn layer_count(&self) -> usize {
        self.census.layer_count()
    }

    /// Blob count the header will declare.
    pub fn value_count(&self) -> usize {
        self.census.value_count()
    }

    /// Writes the param text to `param` and the weight payload to `bin`.
    ///
    /// On error the sinks hold a partial artifact; callers writing to
    /// files should discard them.
    ///
    /// # Errors
    /// The first [`LowerError`] raised by a handler or a sink.
    pub fn emit<P: Write, B: Write>(&self, param: P, bin: B) -> Result<LoweringStats, LowerError> {
        let mut fanout = FanOut::new(&self.census);
        let mut emitter = Emitter::new(param, bin);
        let mut stats = LoweringStats {
            layer_count: self.census.layer_count(),
            value_count: self.census.value_count(),
            split_count: self.census.split_count(),
            input_count: self.census.runtime_inputs().len(),
            elided_reshapes: self.weights.num_elided(),
            ..LoweringStats::default()
        };

        emitter.header(stats.layer_count, stats.value_count)?;

        for input in self.census.runtime_inputs() {
            emitter.input(input)?;
            if let Some(split) = fanout.split_after(input) {
                emitter.split(&split)?;
            }
        }

        for (index, node) in self.graph.nodes.iter().enumerate() {
            if self.weights.is_elided(index) {
                continue;
            }
            let kind = OpKind::parse(&node.op_type);
            let lowered = ops::lower_node(&kind, node, &self.weights, &self.options)?;
            if kind.is_unknown() {
                stats.unknown_ops += 1;
                tracing::warn!(
                    "node '{}': no lowering for '{}', emitted verbatim",
                    node.layer_name(),
                    node.op_type,
                );
            }
            for diagnostic in &lowered.diagnostics {
                tracing::warn!("{diagnostic}");
            }

            let inputs: Vec<String> = node
                .present_inputs()
                .filter(|name| !self.weights.is_constant(name))
                .map(|name| fanout.consume(name))
                .collect();
            emitter.layer(
                &lowered.layer_type,
                node.layer_name(),
                &inputs,
                &node.outputs,
                &lowered.params,
            )?;
            emitter.payload(node, &lowered.payload)?;
            tracing::trace!("lowered {} → {}", node.summary(), lowered.layer_type);

            for output in &node.outputs {
                if let Some(split) = fanout.split_after(output) {
                    emitter.split(&split)?;
                }
            }
            stats.diagnostics.extend(lowered.diagnostics);
        }

        if emitter.layers_written() != stats.layer_count {
            return Err(LowerError::LayerCountMismatch {
                declared: stats.layer_count,
                emitted: emitter.layers_written(),
            });
        }
        stats.weight_bytes = emitter.weight_bytes();
        emitter.finish()?;

        tracing::info!(
            "emitted {} layers, {} weight bytes",
            stats.layer_count,
            stats.weight_bytes,
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::{Node, ValueInfo};

    fn graph(nodes: Vec<Node>) -> Graph<Validated> {
        Graph::new("t".into(), nodes, vec![], vec![ValueInfo::named("x")], vec![])
            .validate()
            .unwrap()
    }

    #[test]
    fn test_header_matches_census() {
        let g = graph(vec![
            Node::new("Relu").with_inputs(["x"]).with_outputs(["a"]),
            Node::new("Relu").with_inputs(["a"]).with_outputs(["b"]),
            Node::new("Relu").with_inputs(["a"]).with_outputs(["c"]),
        ]);
        let plan = LoweringPlan::prepare(&g, LowerOptions::default());
        let mut param = Vec::new();
        let mut bin = Vec::new();
        let stats = plan.emit(&mut param, &mut bin).unwrap();

        let text = String::from_utf8(param).unwrap();
        let header = text.lines().nth(1).unwrap();
        assert_eq!(header, format!("{} {}", plan.layer_count(), plan.value_count()));
        assert_eq!(text.lines().count() - 2, stats.layer_count);
        assert_eq!(stats.split_count, 1);
        assert!(bin.is_empty());
    }

    #[test]
    fn test_graph_input_fan_out_gets_split() {
        let g = graph(vec![
            Node::new("Relu").with_inputs(["x"]).with_outputs(["a"]),
            Node::new("Relu").with_inputs(["x"]).with_outputs(["b"]),
        ]);
        let mut param = Vec::new();
        LoweringPlan::prepare(&g, LowerOptions::default())
            .emit(&mut param, std::io::sink())
            .unwrap();
        let text = String::from_utf8(param).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[2].starts_with("Input"));
        assert!(lines[3].starts_with("Split"));
        assert!(lines[4].ends_with("x_splitncnn_1 a"));
        assert!(lines[5].ends_with("x_splitncnn_0 b"));
    }

    #[test]
    fn test_unknown_op_counted() {
        let g = graph(vec![Node::new("Sigmoid").with_inputs(["x"]).with_outputs(["y"])]);
        let stats = LoweringPlan::prepare(&g, LowerOptions::default())
            .emit(std::io::sink(), std::io::sink())
            .unwrap();
        assert_eq!(stats.unknown_ops, 1);
    }

    #[test]
    fn test_stats_serialise() {
        let g = graph(vec![Node::new("Relu").with_inputs(["x"]).with_outputs(["y"])]);
        let stats = LoweringPlan::prepare(&g, LowerOptions::default())
            .emit(std::io::sink(), std::io::sink())
            .unwrap();
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["layer_count"], 2);
        assert_eq!(json["value_count"], 2);
        assert!(json["diagnostics"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_options_from_json() {
        let options: LowerOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.strict);
        let strict: LowerOptions = serde_json::from_str(r#"{"strict": true}"#).unwrap();
        assert!(strict.strict);
    }
}
