// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # ncnn-lower
//!
//! Lowers a validated exchange-format graph into ncnn's two artifacts:
//! a line-oriented param text describing the layer graph and a flat
//! binary weight file.
//!
//! Lowering runs in three passes over the same graph:
//!
//! 1. [`WeightMap::resolve`] marks constants and folds constant reshapes.
//! 2. [`ValueCensus::count`] counts consumers of every runtime value so
//!    the header totals are known before the first layer is written.
//! 3. [`LoweringPlan::emit`] walks the nodes once, inserting `Split`
//!    layers for fanned-out values via [`FanOut`] and dispatching each
//!    node through the [`ops`] table.

mod census;
mod emitter;
mod error;
mod fanout;
pub mod ops;
mod plan;
mod weights;

pub use census::ValueCensus;
pub use emitter::MAGIC;
pub use error::LowerError;
pub use fanout::{split_name, FanOut, SplitLayer, SPLIT_SUFFIX};
pub use ops::{Diagnostic, LoweredOp, OpKind, Param, ParamValue, PayloadWrite};
pub use plan::{LowerOptions, LoweringPlan, LoweringStats};
pub use weights::WeightMap;

use model_ir::{graph::Validated, Graph};
use std::io::Write;

/// Lowers `graph` in one call.
///
/// # Errors
/// See [`LoweringPlan::emit`].
pub fn lower<P: Write, B: Write>(
    graph: &Graph<Validated>,
    options: LowerOptions,
    param: P,
    bin: B,
) -> Result<LoweringStats, LowerError> {
    LoweringPlan::prepare(graph, options).emit(param, bin)
}
