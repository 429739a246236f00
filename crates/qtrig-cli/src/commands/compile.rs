//! Compile command implementation.

use std::fs;

use anyhow::{Context, Result};
use console::style;
use tracing::debug;

use qtrig_codegen::listing;
use qtrig_compile::{PassKind, PipelineBuilder};

use super::common::{load_options, load_platform, load_program, parse_override, parse_policy};
use super::stage::JsonWriter;

/// Arguments of `qtrig compile`.
pub struct CompileArgs {
    pub platform: String,
    pub program: String,
    pub config: Option<String>,
    pub scheduler: Option<String>,
    pub overrides: Vec<String>,
    pub output: Option<String>,
    pub format: String,
    pub write: bool,
}

/// Execute the compile command.
pub fn execute(args: &CompileArgs) -> Result<()> {
    let mut options = load_options(args.config.as_deref())?;
    if let Some(name) = &args.scheduler {
        options.scheduler = parse_policy(name)?;
    }

    let platform = load_platform(&args.platform)?;
    let program = load_program(&args.program, platform.clone())?;

    eprintln!(
        "{} Compiling {} for platform {}",
        style("→").cyan().bold(),
        style(program.name()).green(),
        style(platform.name()).yellow()
    );
    eprintln!(
        "  Loaded: {} kernels, {} gates, {} sweep points",
        program.kernels().len(),
        program.gate_count(),
        program.sweep_points().len()
    );

    let mut builder = PipelineBuilder::from_options(&options);
    if args.write {
        builder = builder.with_stage(PassKind::Write, JsonWriter);
    }
    let mut pipeline = builder.build()?;
    for spec in &args.overrides {
        let (pass, key, value) = parse_override(spec)?;
        pipeline
            .set_option(pass, key, value)
            .with_context(|| format!("Invalid --set {spec}"))?;
        debug!("override {pass}.{key}={value}");
    }

    eprintln!(
        "  Running {} passes ({})",
        pipeline.len(),
        pipeline.pass_names().join(", ")
    );

    let compiled = pipeline.run(program)?;
    let stream = compiled
        .stream
        .context("No instruction stream was generated (generate_code skipped?)")?;

    eprintln!("{} Compilation complete", style("✓").green().bold());
    eprintln!(
        "  Result: {} gates, {} channels, {} units",
        compiled.program.gate_count(),
        stream.channels().len(),
        stream.end_time()
    );

    let content = match args.format.as_str() {
        "json" => serde_json::to_string_pretty(&stream)?,
        _ => listing::render(&stream),
    };

    match &args.output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write file: {path}"))?;
            eprintln!("  Output: {}", style(path).green());
        }
        None => print!("{content}"),
    }

    if args.write {
        eprintln!(
            "  Wrote: {}",
            style(options.output_dir.display()).green()
        );
    }

    Ok(())
}
