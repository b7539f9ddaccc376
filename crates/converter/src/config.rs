// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Conversion configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! model_path = "./models/squeezenet.onnx"
//! param_path = "squeezenet.param"
//! bin_path = "squeezenet.bin"
//! strict = false
//! ```

use crate::ConvertError;
use ncnn_lower::LowerOptions;
use std::path::{Path, PathBuf};

/// Configuration for one conversion.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConvertConfig {
    /// Exchange-format model file (`.onnx`, or a `.json` manifest).
    pub model_path: PathBuf,
    /// Output layer description.
    #[serde(default = "default_param_path")]
    pub param_path: PathBuf,
    /// Output weight file.
    #[serde(default = "default_bin_path")]
    pub bin_path: PathBuf,
    /// Fail on operators and reshape targets without a dedicated lowering.
    #[serde(default)]
    pub strict: bool,
}

fn default_param_path() -> PathBuf {
    PathBuf::from("ncnn.param")
}

fn default_bin_path() -> PathBuf {
    PathBuf::from("ncnn.bin")
}

impl ConvertConfig {
    /// Creates a config for `model_path` with default output paths.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConvertError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConvertError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConvertError> {
        toml::from_str(toml_str)
            .map_err(|e| ConvertError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConvertError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConvertError::Config(format!("TOML serialise error: {e}")))
    }

    /// Lowering options derived from this config.
    pub fn lower_options(&self) -> LowerOptions {
        LowerOptions {
            strict: self.strict,
        }
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.onnx"),
            param_path: default_param_path(),
            bin_path: default_bin_path(),
            strict: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = ConvertConfig::default();
        assert_eq!(c.param_path, PathBuf::from("ncnn.param"));
        assert_eq!(c.bin_path, PathBuf::from("ncnn.bin"));
        assert!(!c.strict);
    }

    #[test]
    fn test_from_toml_minimal() {
        let c = ConvertConfig::from_toml(r#"model_path = "/tmp/net.onnx""#).unwrap();
        assert_eq!(c.model_path, PathBuf::from("/tmp/net.onnx"));
        assert_eq!(c.param_path, PathBuf::from("ncnn.param"));
        assert!(!c.lower_options().strict);
    }

    #[test]
    fn test_from_toml_full() {
        let toml = r#"
model_path = "/tmp/net.onnx"
param_path = "out/net.param"
bin_path = "out/net.bin"
strict = true
"#;
        let c = ConvertConfig::from_toml(toml).unwrap();
        assert_eq!(c.bin_path, PathBuf::from("out/net.bin"));
        assert!(c.lower_options().strict);
    }

    #[test]
    fn test_missing_model_path_rejected() {
        assert!(matches!(
            ConvertConfig::from_toml("strict = true"),
            Err(ConvertError::Config(_))
        ));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = ConvertConfig {
            strict: true,
            ..ConvertConfig::new("a.onnx")
        };
        let back = ConvertConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_from_file_missing() {
        let err = ConvertConfig::from_file(Path::new("/nonexistent/convert.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }
}
