// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;

use anyhow::Context as _;
use the_plugwood::config::{load_and_validate_config, RuntimeBuilder};
use the_plugwood::engine::{parallel_map, spawn_blocking};
use the_plugwood::errors::ProcessError;
use the_plugwood::graph::{Direction, MemoryNode, Plug};
use the_plugwood::observability::init_tracing;
use the_plugwood::process::Process;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <config.yaml>", args[0]);
        eprintln!("Example: {} configs/demo.yaml", args[0]);
        std::process::exit(1);
    }

    let config = load_and_validate_config(&args[1])
        .with_context(|| format!("loading {}", args[1]))?;
    init_tracing(config.tracing.filter.as_deref());
    let runtime = RuntimeBuilder::from_config(&config);

    println!("🚀 Plugwood Process Tracking Demo");
    println!("═══════════════════════════════════");
    println!("Config: {}", args[1]);
    println!("Monitors registered: {}", runtime.registry().len());
    println!();

    // reader -> blur -> merge, with a second branch feeding merge
    let reader = MemoryNode::new("reader");
    let blur = MemoryNode::new("blur");
    let sharpen = MemoryNode::new("sharpen");
    let merge = MemoryNode::new("merge");

    let reader_out: Arc<dyn Plug> = reader.add_plug("out", Direction::Out);
    let blur_in = blur.add_plug("in", Direction::In);
    blur_in.set_input(Some(reader_out.clone()));
    let blur_out = blur.add_plug("out", Direction::Out);
    blur_out.set_input(Some(blur_in.clone()));
    let sharpen_out: Arc<dyn Plug> = sharpen.add_plug("out", Direction::Out);
    let merge_out: Arc<dyn Plug> = merge.add_plug("out", Direction::Out);
    let blur_out: Arc<dyn Plug> = blur_out;

    let _scope = runtime.enter();

    println!("▶ Parallel branches");
    let branches = vec![blur_out.clone(), sharpen_out.clone()];
    let outcome: Result<Vec<()>, ProcessError> = Process::run("compute", merge_out.clone(), None, |_| {
        parallel_map(branches, |branch| {
            Process::run("compute", branch.clone(), None, |_| {
                if branch.name() == "blur.out" {
                    // Blur pulls from the reader, which fails.
                    Process::run("compute", reader_out.clone(), Some(branch.clone()), |_| {
                        Err(ProcessError::computation("file not found: plate.exr"))
                    })
                } else {
                    Ok(())
                }
            })
        })
        .into_iter()
        .collect()
    });
    match &outcome {
        Ok(_) => println!("  ✅ merge computed"),
        Err(e) => println!("  ❌ merge failed: {}", e),
    }

    println!("▶ Blocking hash on the tokio pool");
    let hash_plug = sharpen_out.clone();
    let hashed = spawn_blocking(move || Process::run("hash", hash_plug, None, |_| Ok(0xfeed_u64)))
        .await
        .context("hash task panicked")?;
    println!("  ✅ sharpen.out hash: {:x}", hashed?);

    println!();
    println!("📋 Errors reported to nodes:");
    for node in [&reader, &blur, &sharpen, &merge] {
        for record in node.errors() {
            println!(
                "  • {} (source: {}): {}",
                record.plug,
                record.source.as_deref().unwrap_or("unknown"),
                record.message
            );
        }
    }

    if let Some(performance) = runtime.performance() {
        println!();
        println!("📊 Performance:");
        println!("{}", performance.to_json()?);
    }

    println!("\n🎉 Demo complete!");
    Ok(())
}
