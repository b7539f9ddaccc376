// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the conversion pipeline.

use std::path::PathBuf;

/// Errors that can occur during a conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The model could not be read, decoded or validated.
    #[error("model error: {0}")]
    Model(#[from] model_ir::ModelError),

    /// The graph could not be lowered.
    #[error("lowering error: {0}")]
    Lower(#[from] ncnn_lower::LowerError),

    /// An output artifact could not be created.
    #[error("cannot write '{}': {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
