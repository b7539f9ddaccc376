// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `onnx2ncnn inspect` command: show what a conversion would do without
//! writing anything.

use super::truncate;
use ncnn_lower::{LowerOptions, LoweringPlan, OpKind};
use std::path::PathBuf;

pub fn execute(model: PathBuf) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             onnx2ncnn · Model Inspector              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let graph = model_ir::GraphLoader::load(&model).map_err(|e| {
        anyhow::anyhow!("failed to load model from '{}': {e}", model.display())
    })?;
    let plan = LoweringPlan::prepare(&graph, LowerOptions::default());

    // ── Summary ────────────────────────────────────────────────
    println!("  Graph: {}", graph.name);
    println!("  Nodes: {}", graph.num_nodes());
    println!(
        "  Constants: {} ({:.2} MB)",
        graph.initializers.len(),
        graph.total_constant_bytes() as f64 / (1024.0 * 1024.0),
    );
    println!("  Runtime inputs: {}", plan.census().runtime_inputs().join(", "));
    println!(
        "  Output: {} layers, {} blobs",
        plan.layer_count(),
        plan.value_count()
    );
    println!();

    // ── Per-Node Detail ────────────────────────────────────────
    println!(
        "  {:<5} {:<32} {:<20} {:>4} {:>4}  {}",
        "Idx", "Name", "Op", "In", "Out", "Lowering",
    );
    println!("  {}", "-".repeat(82));

    let mut unknown = 0;
    for (index, node) in graph.iter_nodes().enumerate() {
        let kind = OpKind::parse(&node.op_type);
        let lowering = if plan.weights().is_elided(index) {
            "folded"
        } else if kind.is_unknown() {
            unknown += 1;
            "pass-through"
        } else {
            "lowered"
        };
        println!(
            "  {:<5} {:<32} {:<20} {:>4} {:>4}  {}",
            index,
            truncate(node.layer_name(), 32),
            truncate(&node.op_type, 20),
            node.present_inputs().count(),
            node.outputs.len(),
            lowering,
        );
    }
    println!();

    // ── Fan-out ────────────────────────────────────────────────
    if plan.census().split_count() > 0 {
        println!("  Fan-out ({} split layers):", plan.census().split_count());
        for (name, consumers) in plan.census().fanned_out() {
            println!("   {:<40} {} consumers", truncate(name, 40), consumers);
        }
        println!();
    }

    if unknown > 0 {
        println!("  {unknown} node(s) have no dedicated lowering and will be passed through.");
    }
    if plan.weights().num_elided() > 0 {
        println!(
            "  {} constant reshape(s) will be folded into weights.",
            plan.weights().num_elided()
        );
    }

    Ok(())
}
