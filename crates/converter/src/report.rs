// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Conversion report.
//!
//! [`ConversionReport`] is what the CLI prints after a run, either as a
//! human-readable summary or as JSON.

use model_ir::{graph::Validated, Graph};
use ncnn_lower::LoweringStats;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of one conversion.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversionReport {
    /// Graph name as recorded by the exporter.
    pub graph_name: String,
    /// Nodes in the source graph, including elided ones.
    pub source_nodes: usize,
    /// Constant tensors in the source graph.
    pub source_constants: usize,
    /// Param file written, if the run targeted files.
    pub param_path: Option<PathBuf>,
    /// Bin file written, if the run targeted files.
    pub bin_path: Option<PathBuf>,
    /// Time spent reading and validating the model.
    pub load_duration: Duration,
    /// Time spent lowering and writing.
    pub lower_duration: Duration,
    /// Totals from the emission pass.
    pub stats: LoweringStats,
}

impl ConversionReport {
    pub(crate) fn new(
        graph: &Graph<Validated>,
        stats: LoweringStats,
        load_duration: Duration,
        lower_duration: Duration,
    ) -> Self {
        Self {
            graph_name: graph.name.clone(),
            source_nodes: graph.num_nodes(),
            source_constants: graph.initializers.len(),
            param_path: None,
            bin_path: None,
            load_duration,
            lower_duration,
            stats,
        }
    }

    pub(crate) fn with_outputs(mut self, param: &Path, bin: &Path) -> Self {
        self.param_path = Some(param.to_path_buf());
        self.bin_path = Some(bin.to_path_buf());
        self
    }

    /// Returns a formatted summary string.
    pub fn summary(&self) -> String {
        let mut s = format!(
            "Converted '{}': {} nodes → {} layers, {} blobs\n\
             \x20 splits inserted: {}, constant reshapes folded: {}\n\
             \x20 weights: {:.2} MB, load {:.1} ms, lower {:.1} ms\n",
            self.graph_name,
            self.source_nodes,
            self.stats.layer_count,
            self.stats.value_count,
            self.stats.split_count,
            self.stats.elided_reshapes,
            self.stats.weight_bytes as f64 / (1024.0 * 1024.0),
            self.load_duration.as_secs_f64() * 1000.0,
            self.lower_duration.as_secs_f64() * 1000.0,
        );
        if self.stats.unknown_ops > 0 {
            s.push_str(&format!(
                "  {} operators passed through without lowering\n",
                self.stats.unknown_ops
            ));
        }
        for diagnostic in &self.stats.diagnostics {
            s.push_str(&format!("    {diagnostic}\n"));
        }
        s
    }
}
