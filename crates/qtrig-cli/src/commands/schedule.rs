//! Schedule command implementation.

use anyhow::Result;
use console::style;

use qtrig_compile::{CompilerOptions, PassKind, Pipeline};
use qtrig_sched::Timeline;

use super::common::{load_platform, load_program, parse_policy};

/// Execute the schedule command.
pub fn execute(platform: &str, program: &str, scheduler: &str, format: &str) -> Result<()> {
    let options = CompilerOptions {
        scheduler: parse_policy(scheduler)?,
        ..CompilerOptions::default()
    };

    let platform = load_platform(platform)?;
    let program = load_program(program, platform.clone())?;

    let mut pipeline = Pipeline::new(options);
    pipeline
        .add_pass(PassKind::Decompose)?
        .add_pass(PassKind::Optimize)?
        .add_pass(PassKind::Schedule)?;
    let compiled = pipeline.run(program)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&compiled.timelines)?);
        return Ok(());
    }

    for timeline in &compiled.timelines {
        print_timeline(timeline, platform.cycle_time());
    }
    Ok(())
}

fn print_timeline(timeline: &Timeline, cycle_time: u64) {
    println!(
        "{} {} ({}, makespan {}, {} cycles)",
        style("kernel").bold(),
        style(timeline.kernel()).green(),
        timeline.policy(),
        timeline.makespan(),
        timeline.depth_in_cycles(cycle_time)
    );
    println!(
        "  {:>4}  {:<16} {:>8} {:>8} {:>7} {:>8}",
        "pos", "gate", "start", "duration", "channel", "codeword"
    );
    for g in timeline.gates() {
        let gate = format!("{} {}", g.name, qtrig_ir::format_qubits(&g.qubits));
        println!(
            "  {:>4}  {:<16} {:>8} {:>8} {:>7} {:>8}",
            g.position,
            gate,
            g.start,
            g.duration,
            g.channel.to_string(),
            g.codeword.to_string()
        );
    }
    println!();
}
