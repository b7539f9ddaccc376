// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `onnx2ncnn convert` command.
//!
//! Runs the full type-state pipeline:
//! ```text
//! Converter<Idle> → load → Converter<Loaded> → convert → ConversionReport
//! ```

use anyhow::Context;
use converter::{ConvertConfig, Converter};
use std::path::PathBuf;

/// Command-line values that take precedence over the config file.
pub struct Overrides {
    pub model: Option<PathBuf>,
    pub param: Option<PathBuf>,
    pub bin: Option<PathBuf>,
    pub strict: bool,
}

fn resolve_config(config: Option<PathBuf>, overrides: Overrides) -> anyhow::Result<ConvertConfig> {
    let mut resolved = match config {
        Some(path) => ConvertConfig::from_file(&path)?,
        None => {
            let model = overrides
                .model
                .clone()
                .context("a model path is required when no --config is given")?;
            ConvertConfig::new(model)
        }
    };
    if let Some(model) = overrides.model {
        resolved.model_path = model;
    }
    if let Some(param) = overrides.param {
        resolved.param_path = param;
    }
    if let Some(bin) = overrides.bin {
        resolved.bin_path = bin;
    }
    resolved.strict |= overrides.strict;
    Ok(resolved)
}

pub fn execute(config: Option<PathBuf>, overrides: Overrides, json: bool) -> anyhow::Result<()> {
    let config = resolve_config(config, overrides)?;
    let model = config.model_path.clone();

    let loaded = Converter::new(config)
        .load()
        .with_context(|| format!("failed to load model from '{}'", model.display()))?;
    let report = loaded
        .convert()
        .with_context(|| format!("failed to convert '{}'", model.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.summary());
        if let (Some(param), Some(bin)) = (&report.param_path, &report.bin_path) {
            println!("  → {}", param.display());
            println!("  → {}", bin.display());
        }
    }
    Ok(())
}
