// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Nodes, attributes and named values of an exchange-format graph.
//!
//! A [`Node`] refers to the values it reads and writes by name only. Names
//! are resolved later: a name is either a constant ([`Initializer`]), a
//! declared graph input ([`ValueInfo`]), or the output of another node.

use std::fmt;
use tensor_core::{DType, Tensor};

/// A typed attribute value attached to a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Int(i64),
    Float(f32),
    String(String),
    Ints(Vec<i64>),
    Floats(Vec<f32>),
    /// An attribute kind the IR does not model (tensor, graph, strings…).
    /// Carries the exchange-format type code for diagnostics.
    Unsupported(i32),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:.6}"),
            Self::String(s) => f.write_str(s),
            Self::Ints(vs) => write_list(f, vs),
            Self::Floats(vs) => write_list(f, vs),
            Self::Unsupported(code) => write!(f, "<attribute type {code}>"),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{v}")?;
    }
    f.write_str("]")
}

/// A single operator in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Operator kind as written by the exporter (e.g. `"Conv"`).
    pub op_type: String,
    /// Optional node name. Exporters frequently leave it empty.
    pub name: Option<String>,
    /// Input value names in positional order. An empty string marks an
    /// omitted optional input.
    pub inputs: Vec<String>,
    /// Output value names in positional order.
    pub outputs: Vec<String>,
    /// Attributes in declaration order.
    pub attributes: Vec<(String, AttributeValue)>,
}

impl Node {
    /// Creates a node with no name, inputs, outputs or attributes.
    pub fn new(op_type: impl Into<String>) -> Self {
        Self {
            op_type: op_type.into(),
            name: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.push((key.into(), value));
        self
    }

    /// The name this node is known by in the output: its own name, or its
    /// first output when unnamed.
    pub fn layer_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.outputs.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// Input names with omitted optional inputs filtered out.
    pub fn present_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(String::as_str).filter(|s| !s.is_empty())
    }

    /// Returns the input at `index` if it is present.
    pub fn input(&self, index: usize) -> Option<&str> {
        self.inputs
            .get(index)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Looks up an attribute by name.
    pub fn attr(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Integer attribute, or `default` when absent or not an integer.
    pub fn attr_int(&self, key: &str, default: i64) -> i64 {
        match self.attr(key) {
            Some(AttributeValue::Int(v)) => *v,
            _ => default,
        }
    }

    /// Float attribute, or `default` when absent. Integer attributes are
    /// widened.
    pub fn attr_float(&self, key: &str, default: f32) -> f32 {
        match self.attr(key) {
            Some(AttributeValue::Float(v)) => *v,
            Some(AttributeValue::Int(v)) => *v as f32,
            _ => default,
        }
    }

    /// Integer-list attribute; empty when absent.
    pub fn attr_ints(&self, key: &str) -> &[i64] {
        match self.attr(key) {
            Some(AttributeValue::Ints(vs)) => vs,
            _ => &[],
        }
    }

    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "{} {} ({} in, {} out, {} attrs)",
            self.op_type,
            self.layer_name(),
            self.inputs.len(),
            self.outputs.len(),
            self.attributes.len(),
        )
    }
}

/// A named constant tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Initializer {
    pub name: String,
    pub tensor: Tensor,
}

impl Initializer {
    pub fn new(name: impl Into<String>, tensor: Tensor) -> Self {
        Self {
            name: name.into(),
            tensor,
        }
    }
}

/// A declared graph input or output.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueInfo {
    pub name: String,
    /// Element type, when declared and modelled.
    pub dtype: Option<DType>,
    /// Declared dims; `-1` stands for a symbolic or unknown dimension.
    pub dims: Vec<i64>,
}

impl ValueInfo {
    /// A value with no type information.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: None,
            dims: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conv() -> Node {
        Node::new("Conv")
            .with_inputs(["data", "w", "b"])
            .with_outputs(["conv1"])
            .with_attr("kernel_shape", AttributeValue::Ints(vec![3, 3]))
            .with_attr("group", AttributeValue::Int(1))
            .with_attr("alpha", AttributeValue::Float(0.5))
    }

    #[test]
    fn test_layer_name_defaults_to_first_output() {
        let node = conv();
        assert_eq!(node.layer_name(), "conv1");
        assert_eq!(node.clone().with_name("c1").layer_name(), "c1");
        assert_eq!(node.with_name("").layer_name(), "conv1");
    }

    #[test]
    fn test_attribute_accessors() {
        let node = conv();
        assert_eq!(node.attr_ints("kernel_shape"), &[3, 3]);
        assert!(node.attr_ints("pads").is_empty());
        assert_eq!(node.attr_int("group", 7), 1);
        assert_eq!(node.attr_int("missing", 7), 7);
        assert_eq!(node.attr_float("alpha", 1.0), 0.5);
        assert_eq!(node.attr_float("group", 0.0), 1.0);
        assert_eq!(node.attr_float("missing", 1e-5), 1e-5);
    }

    #[test]
    fn test_optional_inputs_skipped() {
        let node = Node::new("Dropout")
            .with_inputs(["x", "", "ratio"])
            .with_outputs(["y"]);
        let present: Vec<_> = node.present_inputs().collect();
        assert_eq!(present, ["x", "ratio"]);
        assert_eq!(node.input(1), None);
        assert_eq!(node.input(2), Some("ratio"));
        assert_eq!(node.input(9), None);
    }

    #[test]
    fn test_attribute_display() {
        assert_eq!(AttributeValue::Int(3).to_string(), "3");
        assert_eq!(AttributeValue::Float(0.75).to_string(), "0.750000");
        assert_eq!(AttributeValue::String("same".into()).to_string(), "same");
        assert_eq!(AttributeValue::Ints(vec![1, 2, 3]).to_string(), "[1,2,3]");
        assert_eq!(AttributeValue::Unsupported(5).to_string(), "<attribute type 5>");
    }

    #[test]
    fn test_summary() {
        let s = conv().summary();
        assert!(s.contains("Conv conv1"));
        assert!(s.contains("3 in"));
    }
}
