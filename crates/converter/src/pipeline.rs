// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The conversion pipeline with type-state enforced ordering.
//!
//! ```text
//! Converter<Idle>
//!     │  .load()
//!     ▼
//! Converter<Loaded>
//!     │  .convert() / .convert_to(param, bin)
//!     ▼
//!   ConversionReport
//! ```

use crate::{ConversionReport, ConvertConfig, ConvertError};
use model_ir::{graph::Validated, Graph, GraphLoader};
use ncnn_lower::LoweringPlan;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

// ── Type-state markers ─────────────────────────────────────────

/// No model has been read yet.
#[derive(Debug)]
pub struct Idle;

/// A validated graph is held and ready to lower.
#[derive(Debug)]
pub struct Loaded {
    graph: Graph<Validated>,
    load_duration: Duration,
}

/// Sealed trait for converter states.
pub trait ConverterState: std::fmt::Debug {}
impl ConverterState for Idle {}
impl ConverterState for Loaded {}

// ── Converter ──────────────────────────────────────────────────

/// Converts one model according to a [`ConvertConfig`].
///
/// # Example
/// ```no_run
/// use converter::{ConvertConfig, Converter};
///
/// # fn example() -> Result<(), converter::ConvertError> {
/// let report = Converter::new(ConvertConfig::new("squeezenet.onnx"))
///     .load()?
///     .convert()?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Converter<S: ConverterState = Idle> {
    config: ConvertConfig,
    state: S,
}

// ── Idle → Loaded ──────────────────────────────────────────────

impl Converter<Idle> {
    /// Creates a converter from the given configuration.
    pub fn new(config: ConvertConfig) -> Self {
        tracing::info!("converter created for '{}'", config.model_path.display());
        Self {
            config,
            state: Idle,
        }
    }

    /// Reads and validates the model. Transitions to `Loaded`.
    pub fn load(self) -> Result<Converter<Loaded>, ConvertError> {
        let start = Instant::now();
        let graph = GraphLoader::load(&self.config.model_path)?;
        let load_duration = start.elapsed();
        tracing::info!("{} (loaded in {:?})", graph.summary(), load_duration);

        Ok(Converter {
            config: self.config,
            state: Loaded {
                graph,
                load_duration,
            },
        })
    }

    /// Skips loading and wraps an already validated graph.
    pub fn from_graph(config: ConvertConfig, graph: Graph<Validated>) -> Converter<Loaded> {
        Converter {
            config,
            state: Loaded {
                graph,
                load_duration: Duration::ZERO,
            },
        }
    }
}

// ── Loaded → report ────────────────────────────────────────────

impl Converter<Loaded> {
    /// Returns the loaded graph.
    pub fn graph(&self) -> &Graph<Validated> {
        &self.state.graph
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Runs the analysis passes without writing anything.
    pub fn plan(&self) -> LoweringPlan<'_> {
        LoweringPlan::prepare(&self.state.graph, self.config.lower_options())
    }

    /// Lowers into arbitrary sinks.
    pub fn convert_to<P: Write, B: Write>(
        &self,
        param: P,
        bin: B,
    ) -> Result<ConversionReport, ConvertError> {
        let start = Instant::now();
        let stats = self.plan().emit(param, bin)?;
        Ok(ConversionReport::new(
            &self.state.graph,
            stats,
            self.state.load_duration,
            start.elapsed(),
        ))
    }

    /// Lowers into the configured output files.
    ///
    /// Both files are removed again if either cannot be created or lowering
    /// fails, so a failed run never leaves a half-written pair behind.
    pub fn convert(&self) -> Result<ConversionReport, ConvertError> {
        let param_path = &self.config.param_path;
        let bin_path = &self.config.bin_path;
        let param = create(param_path)?;
        let bin = match create(bin_path) {
            Ok(bin) => bin,
            Err(e) => {
                drop(param);
                remove_partial(&[param_path.as_path()]);
                return Err(e);
            }
        };

        match self.convert_to(param, bin) {
            Ok(report) => {
                tracing::info!(
                    "wrote {} and {}",
                    param_path.display(),
                    bin_path.display(),
                );
                Ok(report.with_outputs(param_path, bin_path))
            }
            Err(e) => {
                remove_partial(&[param_path.as_path(), bin_path.as_path()]);
                Err(e)
            }
        }
    }
}

fn remove_partial(paths: &[&Path]) {
    for path in paths {
        if let Err(rm) = std::fs::remove_file(path) {
            tracing::warn!("cannot remove partial '{}': {rm}", path.display());
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, ConvertError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| ConvertError::Output {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_ir::{Node, ValueInfo};

    fn relu_graph() -> Graph<Validated> {
        Graph::new(
            "relu".into(),
            vec![Node::new("Relu").with_inputs(["x"]).with_outputs(["y"])],
            vec![],
            vec![ValueInfo::named("x")],
            vec![ValueInfo::named("y")],
        )
        .validate()
        .unwrap()
    }

    #[test]
    fn test_load_missing_file() {
        let result = Converter::new(ConvertConfig::new("/nonexistent/model.onnx")).load();
        assert!(matches!(result, Err(ConvertError::Model(_))));
    }

    #[test]
    fn test_convert_to_memory() {
        let converter = Converter::from_graph(ConvertConfig::default(), relu_graph());
        assert_eq!(converter.plan().layer_count(), 2);

        let mut param = Vec::new();
        let report = converter.convert_to(&mut param, std::io::sink()).unwrap();
        assert_eq!(report.stats.layer_count, 2);
        assert!(report.param_path.is_none());
        assert!(String::from_utf8(param).unwrap().starts_with("7767517\n2 2\n"));
    }

    #[test]
    fn test_strict_config_applies() {
        let graph = Graph::new(
            "t".into(),
            vec![Node::new("Sigmoid").with_inputs(["x"]).with_outputs(["y"])],
            vec![],
            vec![ValueInfo::named("x")],
            vec![],
        )
        .validate()
        .unwrap();
        let config = ConvertConfig {
            strict: true,
            ..ConvertConfig::default()
        };
        let converter = Converter::from_graph(config, graph);
        assert!(matches!(
            converter.convert_to(std::io::sink(), std::io::sink()),
            Err(ConvertError::Lower(_))
        ));
    }
}
