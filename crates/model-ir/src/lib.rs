// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-ir
//!
//! The in-memory form of an exchange-format (ONNX) graph, as consumed by the
//! lowering engine.
//!
//! - [`Node`]: one operator: kind, inputs, outputs and typed attributes.
//! - [`Initializer`]: a named constant [`tensor_core::Tensor`].
//! - [`Graph`]: nodes, initializers and declared inputs, with a
//!   **type-state pattern** (`Loaded` → `Validated`).
//! - [`GraphLoader`]: decodes a protobuf model file (or a JSON
//!   [`GraphManifest`]) into a validated graph.
//!
//! # Example
//! ```no_run
//! use model_ir::GraphLoader;
//! use std::path::Path;
//!
//! let graph = GraphLoader::load(Path::new("./squeezenet.onnx")).unwrap();
//! println!("{}", graph.summary());
//! for node in graph.iter_nodes() {
//!     println!("  {}", node.summary());
//! }
//! ```

mod error;
pub mod graph;
mod loader;
pub(crate) mod manifest;
mod node;
pub mod proto;

pub use error::ModelError;
pub use graph::Graph;
pub use loader::GraphLoader;
pub use manifest::GraphManifest;
pub use node::{AttributeValue, Initializer, Node, ValueInfo};
