// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON graph manifest.
//!
//! A hand-writable description of a graph, used for test fixtures and for
//! reproducing conversion issues without shipping a binary model.
//!
//! # Format
//! ```json
//! {
//!   "name": "tiny",
//!   "inputs": ["data"],
//!   "outputs": ["prob"],
//!   "initializers": [
//!     { "name": "w", "dims": [2, 4, 1, 1], "data": [0, 1, 2, 3, 4, 5, 6, 7] },
//!     { "name": "shape", "dtype": "i64", "dims": [2], "int64_data": [1, -1] }
//!   ],
//!   "nodes": [
//!     { "op_type": "Conv", "inputs": ["data", "w"], "outputs": ["conv"],
//!       "attributes": { "kernel_shape": [1, 1], "group": 1 } },
//!     { "op_type": "Relu", "name": "relu1", "inputs": ["conv"], "outputs": ["prob"] }
//!   ]
//! }
//! ```
//!
//! Attribute values map by JSON type: integers to `Int`, numbers with a
//! fraction or exponent to `Float`, strings to `String`, integer arrays to
//! `Ints` and other numeric arrays to `Floats`.

use crate::graph::Loaded;
use crate::{AttributeValue, Graph, Initializer, ModelError, Node, ValueInfo};
use std::collections::BTreeMap;
use tensor_core::{DType, Shape, Tensor};

/// Top-level graph manifest.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphManifest {
    /// Graph name.
    #[serde(default)]
    pub name: String,
    /// Declared input names (may include initializer names).
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Declared output names.
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Constant tensors.
    #[serde(default)]
    pub initializers: Vec<ManifestTensor>,
    /// Nodes in source order.
    pub nodes: Vec<ManifestNode>,
}

/// A constant tensor entry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestTensor {
    pub name: String,
    #[serde(default = "default_dtype")]
    pub dtype: DType,
    #[serde(default)]
    pub dims: Vec<usize>,
    /// `f32` payload.
    #[serde(default)]
    pub data: Vec<f32>,
    /// `i64` payload, for shape operands.
    #[serde(default)]
    pub int64_data: Vec<i64>,
}

fn default_dtype() -> DType {
    DType::F32
}

/// A node entry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestNode {
    pub op_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    /// Attributes; applied in key order.
    #[serde(default)]
    pub attributes: BTreeMap<String, ManifestAttribute>,
}

/// An attribute value as written in JSON.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ManifestAttribute {
    Int(i64),
    Float(f64),
    String(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
}

impl From<ManifestAttribute> for AttributeValue {
    fn from(attr: ManifestAttribute) -> Self {
        match attr {
            ManifestAttribute::Int(v) => Self::Int(v),
            ManifestAttribute::Float(v) => Self::Float(v as f32),
            ManifestAttribute::String(s) => Self::String(s),
            ManifestAttribute::Ints(vs) => Self::Ints(vs),
            ManifestAttribute::Floats(vs) => Self::Floats(vs.into_iter().map(|v| v as f32).collect()),
        }
    }
}

impl GraphManifest {
    /// Parses a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Builds an unvalidated [`Graph`] from this manifest.
    ///
    /// Constants declared with a dtype other than `f32` or `i64` carry no
    /// payload and fail only when a lowering reads them; structural checks
    /// are left to [`Graph::validate`].
    pub fn into_graph(self) -> Result<Graph<Loaded>, ModelError> {
        let initializers = self
            .initializers
            .into_iter()
            .map(ManifestTensor::into_initializer)
            .collect();

        let nodes = self
            .nodes
            .into_iter()
            .map(|n| Node {
                op_type: n.op_type,
                name: n.name,
                inputs: n.inputs,
                outputs: n.outputs,
                attributes: n
                    .attributes
                    .into_iter()
                    .map(|(k, v)| (k, v.into()))
                    .collect(),
            })
            .collect();

        Ok(Graph::new(
            self.name,
            nodes,
            initializers,
            self.inputs.into_iter().map(ValueInfo::named).collect(),
            self.outputs.into_iter().map(ValueInfo::named).collect(),
        ))
    }
}

impl ManifestTensor {
    fn into_initializer(self) -> Initializer {
        let shape = Shape::new(self.dims);
        let tensor = match self.dtype {
            DType::F32 => Tensor::from_f32(shape, self.data),
            DType::I64 => Tensor::from_i64(shape, self.int64_data),
            other => Tensor::from_raw(other, shape, Vec::new()),
        };
        Initializer::new(self.name, tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "name": "tiny",
        "inputs": ["data"],
        "outputs": ["prob"],
        "initializers": [
            { "name": "w", "dims": [2, 4, 1, 1], "data": [0, 1, 2, 3, 4, 5, 6, 7] },
            { "name": "shape", "dtype": "i64", "dims": [2], "int64_data": [1, -1] }
        ],
        "nodes": [
            { "op_type": "Conv", "inputs": ["data", "w"], "outputs": ["conv"],
              "attributes": { "kernel_shape": [1, 1], "group": 1, "epsilon": 1e-5,
                              "auto_pad": "NOTSET", "scales": [1.0, 2.5] } },
            { "op_type": "Relu", "name": "relu1", "inputs": ["conv"], "outputs": ["prob"] }
        ]
    }"#;

    #[test]
    fn test_parse_and_build() {
        let graph = GraphManifest::from_json(SAMPLE)
            .unwrap()
            .into_graph()
            .unwrap()
            .validate()
            .unwrap();

        assert_eq!(graph.num_nodes(), 2);
        let conv = graph.node(0).unwrap();
        assert_eq!(conv.attr("kernel_shape"), Some(&AttributeValue::Ints(vec![1, 1])));
        assert_eq!(conv.attr("group"), Some(&AttributeValue::Int(1)));
        assert_eq!(conv.attr("epsilon"), Some(&AttributeValue::Float(1e-5)));
        assert_eq!(
            conv.attr("auto_pad"),
            Some(&AttributeValue::String("NOTSET".into()))
        );
        assert_eq!(
            conv.attr("scales"),
            Some(&AttributeValue::Floats(vec![1.0, 2.5]))
        );

        let w = &graph.initializer("w").unwrap().tensor;
        assert_eq!(w.element_count().unwrap(), 8);
        let shape = &graph.initializer("shape").unwrap().tensor;
        assert_eq!(shape.i64_values().unwrap().as_ref(), &[1, -1]);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            GraphManifest::from_json("{ not json"),
            Err(ModelError::ManifestParse(_))
        ));
    }

    #[test]
    fn test_half_precision_constant_fails_on_read() {
        let json = r#"{
            "initializers": [{ "name": "h", "dtype": "f16", "dims": [1] }],
            "nodes": [{ "op_type": "Relu", "inputs": ["h"], "outputs": ["y"] }]
        }"#;
        let graph = GraphManifest::from_json(json).unwrap().into_graph().unwrap();
        let h = &graph.initializers[0].tensor;
        assert_eq!(h.dtype(), DType::F16);
        assert!(h.element_count().is_err());
    }
}
