// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Writers for the two output artifacts.
//!
//! The param file is line oriented:
//!
//! ```text
//! 7767517
//! <layer_count> <value_count>
//! <type:16> <name:24> <n_in> <n_out> <inputs...> <outputs...> <k=v...>
//! ```
//!
//! The bin file is the concatenation of every layer's payload in the
//! order the layers appear in the param file.

use crate::fanout::SplitLayer;
use crate::ops::{Param, PayloadWrite};
use crate::LowerError;
use model_ir::Node;
use std::io::Write;

/// First line of every param file.
pub const MAGIC: u32 = 7767517;

/// Owns both sinks for the duration of one emission pass.
pub(crate) struct Emitter<P: Write, B: Write> {
    param: P,
    bin: B,
    layers_written: usize,
    weight_bytes: usize,
}

impl<P: Write, B: Write> Emitter<P, B> {
    pub(crate) fn new(param: P, bin: B) -> Self {
        Self {
            param,
            bin,
            layers_written: 0,
            weight_bytes: 0,
        }
    }

    pub(crate) fn header(&mut self, layer_count: usize, value_count: usize) -> Result<(), LowerError> {
        writeln!(self.param, "{MAGIC}")?;
        writeln!(self.param, "{layer_count} {value_count}")?;
        Ok(())
    }

    /// Writes one layer line.
    pub(crate) fn layer<I, O>(
        &mut self,
        layer_type: &str,
        name: &str,
        inputs: &[I],
        outputs: &[O],
        params: &[Param],
    ) -> Result<(), LowerError>
    where
        I: AsRef<str>,
        O: AsRef<str>,
    {
        write!(
            self.param,
            "{:<16} {:<24} {} {}",
            layer_type,
            name,
            inputs.len(),
            outputs.len()
        )?;
        for blob in inputs {
            write!(self.param, " {}", blob.as_ref())?;
        }
        for blob in outputs {
            write!(self.param, " {}", blob.as_ref())?;
        }
        for param in params {
            write!(self.param, " {param}")?;
        }
        writeln!(self.param)?;
        self.layers_written += 1;
        Ok(())
    }

    /// Writes an `Input` layer for a runtime graph input.
    pub(crate) fn input(&mut self, name: &str) -> Result<(), LowerError> {
        self.layer::<&str, &str>("Input", name, &[], &[name], &[])
    }

    pub(crate) fn split(&mut self, split: &SplitLayer) -> Result<(), LowerError> {
        self.layer("Split", &split.name, &[split.input.as_str()], &split.outputs, &[])
    }

    /// Appends a layer's payload to the bin sink.
    pub(crate) fn payload(&mut self, node: &Node, writes: &[PayloadWrite<'_>]) -> Result<(), LowerError> {
        for write in writes {
            self.weight_bytes += write.write_to(node, &mut self.bin)?;
        }
        Ok(())
    }

    pub(crate) fn layers_written(&self) -> usize {
        self.layers_written
    }

    pub(crate) fn weight_bytes(&self) -> usize {
        self.weight_bytes
    }

    /// Flushes both sinks.
    pub(crate) fn finish(mut self) -> Result<(), LowerError> {
        self.param.flush()?;
        self.bin.flush()?;
        Ok(())
    }
}
