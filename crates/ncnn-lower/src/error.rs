// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for graph lowering.

/// Errors that can occur while lowering a graph.
#[derive(Debug, thiserror::Error)]
pub enum LowerError {
    /// A node needs a constant operand that is not in the weight map.
    #[error("node '{node}': missing constant '{name}'")]
    MissingConstant { node: String, name: String },

    /// The node's attribute combination has no encoding in the target format.
    #[error("node '{node}' ({op}): unsupported attributes: {detail}")]
    UnsupportedAttributes {
        node: String,
        op: &'static str,
        detail: String,
    },

    /// A transpose permutation outside the permute table.
    #[error("node '{node}': unsupported permutation {perm:?}")]
    UnsupportedPermutation { node: String, perm: Vec<i64> },

    /// A reshape target that cannot be encoded.
    #[error("node '{node}': unsupported reshape: {detail}")]
    UnsupportedReshape { node: String, detail: String },

    /// An operator kind with no handler, in strict mode.
    #[error("node '{node}': unknown operator '{op_type}'")]
    UnknownOperator { node: String, op_type: String },

    /// The emission pass produced a different number of layers than the
    /// header declared.
    #[error("header declared {declared} layers but {emitted} were emitted")]
    LayerCountMismatch { declared: usize, emitted: usize },

    /// A constant tensor could not be read or written.
    #[error("tensor error in node '{node}': {source}")]
    Tensor {
        node: String,
        #[source]
        source: tensor_core::TensorError,
    },

    /// Writing the text artifact failed.
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl LowerError {
    /// Wraps a tensor error with the name of the node being lowered.
    pub(crate) fn tensor(node: &model_ir::Node) -> impl FnOnce(tensor_core::TensorError) -> Self + '_ {
        move |source| Self::Tensor {
            node: node.layer_name().to_string(),
            source,
        }
    }
}
