// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # converter
//!
//! Drives a complete conversion: read a model file, validate it, lower it
//! with [`ncnn_lower`], and write the param and bin artifacts.
//!
//! # Type-State Pipeline
//! ```text
//! Converter<Idle> → Converter<Loaded> → ConversionReport
//! ```
//! Transitions are compile-time checked.

mod config;
mod error;
mod pipeline;
mod report;

pub use config::ConvertConfig;
pub use error::ConvertError;
pub use pipeline::{Converter, ConverterState, Idle, Loaded};
pub use report::ConversionReport;
