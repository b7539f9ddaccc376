// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # onnx2ncnn
//!
//! Command-line interface for converting ONNX models to ncnn.
//!
//! ## Usage
//! ```bash
//! # Convert, writing ncnn.param / ncnn.bin in the current directory
//! onnx2ncnn convert squeezenet.onnx
//!
//! # Explicit output paths, fail on unsupported operators
//! onnx2ncnn convert squeezenet.onnx sq.param sq.bin --strict
//!
//! # Show what a conversion would do
//! onnx2ncnn inspect squeezenet.onnx
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "onnx2ncnn",
    about = "Convert ONNX models to ncnn param/bin files",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file; positional arguments override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a model into a param/bin pair.
    Convert {
        /// Model file (`.onnx`, or a `.json` graph manifest).
        model: Option<PathBuf>,

        /// Output param file [default: ncnn.param].
        param: Option<PathBuf>,

        /// Output bin file [default: ncnn.bin].
        bin: Option<PathBuf>,

        /// Fail on operators and reshape targets without a dedicated lowering.
        #[arg(long)]
        strict: bool,

        /// Print the conversion report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Inspect a model: nodes, constants, folded reshapes and fan-out.
    Inspect {
        /// Model file (`.onnx`, or a `.json` graph manifest).
        model: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert {
            model,
            param,
            bin,
            strict,
            json,
        } => commands::convert::execute(
            cli.config,
            commands::convert::Overrides {
                model,
                param,
                bin,
                strict,
            },
            json,
        ),
        Commands::Inspect { model } => commands::inspect::execute(model),
    }
}
