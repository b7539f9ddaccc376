// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model loading and graph construction.

/// Errors that can occur when loading or validating a graph.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The model file could not be read.
    #[error("failed to read model: {0}")]
    Io(#[from] std::io::Error),

    /// The protobuf byte stream is truncated or corrupt.
    #[error("failed to decode model: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The JSON manifest is malformed.
    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),

    /// The model has no graph section.
    #[error("model contains no graph")]
    MissingGraph,

    /// A node is malformed (e.g., has no outputs).
    #[error("invalid node '{node}': {detail}")]
    InvalidNode { node: String, detail: String },

    /// The graph violates a structural invariant.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),
}
