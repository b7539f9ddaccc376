// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Graph loading from exchange-format protobuf files.
//!
//! The model file is memory-mapped and decoded in one go with `prost`; the
//! decoded messages are then converted into the crate's own [`Graph`]
//! types and validated. Files ending in `.json` are read as a
//! [`GraphManifest`] instead, which is convenient for hand-written graphs.

use crate::graph::{Loaded, Validated};
use crate::proto::{self, attribute_type};
use crate::{AttributeValue, Graph, GraphManifest, Initializer, ModelError, Node, ValueInfo};
use prost::Message;
use std::path::Path;
use tensor_core::{DType, Shape, Tensor, TensorData};

/// Loads a model from disk into a validated [`Graph`].
///
/// # Example
/// ```no_run
/// use model_ir::GraphLoader;
/// use std::path::Path;
///
/// let graph = GraphLoader::load(Path::new("./mobilenet.onnx")).unwrap();
/// println!("Loaded {} nodes", graph.num_nodes());
/// ```
pub struct GraphLoader;

impl GraphLoader {
    /// Loads and validates a graph from the given file.
    ///
    /// `.json` files are parsed as a [`GraphManifest`]; anything else is
    /// decoded as a protobuf model.
    pub fn load(path: &Path) -> Result<Graph<Validated>, ModelError> {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            return Self::from_json_file(path);
        }

        let file = std::fs::File::open(path)?;
        // Memory-map the file; the decoder copies what it keeps.
        let mmap = unsafe { memmap2::Mmap::map(&file) }?;
        tracing::info!(
            "loader: mapped {} ({:.2} MB)",
            path.display(),
            mmap.len() as f64 / (1024.0 * 1024.0),
        );
        Self::from_bytes(&mmap)
    }

    /// Decodes and validates a graph from an in-memory protobuf buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Graph<Validated>, ModelError> {
        let model = proto::ModelProto::decode(bytes)?;
        if !model.producer_name.is_empty() {
            tracing::debug!(
                "model produced by {} {} (ir_version {})",
                model.producer_name,
                model.producer_version,
                model.ir_version,
            );
        }
        Self::from_proto(model)?.validate()
    }

    /// Loads and validates a graph from a JSON manifest file.
    pub fn from_json_file(path: &Path) -> Result<Graph<Validated>, ModelError> {
        let content = std::fs::read_to_string(path)?;
        GraphManifest::from_json(&content)?.into_graph()?.validate()
    }

    /// Converts decoded protobuf messages into an unvalidated graph.
    pub fn from_proto(model: proto::ModelProto) -> Result<Graph<Loaded>, ModelError> {
        let graph = model.graph.ok_or(ModelError::MissingGraph)?;

        let nodes = graph.node.into_iter().map(convert_node).collect();
        let initializers = graph
            .initializer
            .into_iter()
            .map(convert_initializer)
            .collect::<Result<Vec<_>, _>>()?;
        let inputs = graph.input.into_iter().map(convert_value_info).collect();
        let outputs = graph.output.into_iter().map(convert_value_info).collect();

        Ok(Graph::new(graph.name, nodes, initializers, inputs, outputs))
    }
}

fn convert_node(node: proto::NodeProto) -> Node {
    if !node.domain.is_empty() {
        tracing::debug!("node '{}' uses operator domain '{}'", node.name, node.domain);
    }
    let attributes = node
        .attribute
        .into_iter()
        .map(|a| {
            let value = convert_attribute(&a);
            (a.name, value)
        })
        .collect();
    Node {
        op_type: node.op_type,
        name: (!node.name.is_empty()).then_some(node.name),
        inputs: node.input,
        outputs: node.output,
        attributes,
    }
}

fn convert_attribute(attr: &proto::AttributeProto) -> AttributeValue {
    match attr.r#type {
        attribute_type::FLOAT => AttributeValue::Float(attr.f),
        attribute_type::INT => AttributeValue::Int(attr.i),
        attribute_type::STRING => {
            AttributeValue::String(String::from_utf8_lossy(&attr.s).into_owned())
        }
        attribute_type::FLOATS => AttributeValue::Floats(attr.floats.clone()),
        attribute_type::INTS => AttributeValue::Ints(attr.ints.clone()),
        // Very old exporters leave the type unset; infer it from the
        // populated field.
        0 => {
            if !attr.ints.is_empty() {
                AttributeValue::Ints(attr.ints.clone())
            } else if !attr.floats.is_empty() {
                AttributeValue::Floats(attr.floats.clone())
            } else if !attr.s.is_empty() {
                AttributeValue::String(String::from_utf8_lossy(&attr.s).into_owned())
            } else if attr.f != 0.0 {
                AttributeValue::Float(attr.f)
            } else {
                AttributeValue::Int(attr.i)
            }
        }
        other => AttributeValue::Unsupported(other),
    }
}

fn convert_initializer(tp: proto::TensorProto) -> Result<Initializer, ModelError> {
    let dtype = DType::from_onnx(tp.data_type);
    if !dtype.is_modelled() {
        tracing::debug!(
            "initializer '{}' has element type {}; kept opaque",
            tp.name,
            tp.data_type,
        );
    }
    let shape = Shape::from_onnx_dims(&tp.dims).ok_or_else(|| {
        ModelError::InvalidGraph(format!("initializer '{}' has negative dims", tp.name))
    })?;

    let data = if !tp.raw_data.is_empty() {
        TensorData::Raw(tp.raw_data)
    } else {
        match dtype {
            DType::F32 => TensorData::Floats(tp.float_data),
            DType::I64 => TensorData::Int64s(tp.int64_data),
            // Typed storage for other element types is not kept.
            _ => TensorData::Raw(Vec::new()),
        }
    };

    Ok(Initializer::new(tp.name, Tensor::new(dtype, shape, data)))
}

fn convert_value_info(vi: proto::ValueInfoProto) -> ValueInfo {
    let tensor_type = vi.r#type.and_then(|t| t.tensor_type);
    let dtype = tensor_type
        .as_ref()
        .filter(|t| t.elem_type != 0)
        .map(|t| DType::from_onnx(t.elem_type));
    let dims = tensor_type
        .and_then(|t| t.shape)
        .map(|s| {
            s.dim
                .into_iter()
                .map(|d| match d.value {
                    Some(proto::tensor_shape_proto::dimension::Value::DimValue(v)) => v,
                    _ => -1,
                })
                .collect()
        })
        .unwrap_or_default();
    ValueInfo {
        name: vi.name,
        dtype,
        dims,
    }
}
