//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use qtrig_compile::CompilerOptions;
use qtrig_ir::{Gate, Kernel, Platform, Program, QubitId};
use qtrig_sched::SchedulePolicy;

/// Program file layout.
#[derive(Debug, Deserialize)]
pub struct ProgramFile {
    pub name: String,
    pub qubits: u32,
    #[serde(default)]
    pub sweep_points: Vec<f64>,
    pub kernels: Vec<KernelFile>,
}

#[derive(Debug, Deserialize)]
pub struct KernelFile {
    pub name: String,
    /// Defaults to the program width.
    #[serde(default)]
    pub qubits: Option<u32>,
    #[serde(default)]
    pub iterations: Option<u32>,
    pub gates: Vec<GateFile>,
}

#[derive(Debug, Deserialize)]
pub struct GateFile {
    pub name: String,
    pub qubits: Vec<u32>,
    #[serde(default)]
    pub duration: Option<i64>,
}

/// Load a platform description.
pub fn load_platform(path: &str) -> Result<Arc<Platform>> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let platform = Platform::from_file(path)
        .with_context(|| format!("Failed to load platform: {path}"))?;
    Ok(Arc::new(platform))
}

/// Load a program file against `platform`.
pub fn load_program(path: &str, platform: Arc<Platform>) -> Result<Program> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    parse_program(&source, platform).with_context(|| format!("Invalid program file: {path}"))
}

/// Build a program from its JSON text.
pub fn parse_program(source: &str, platform: Arc<Platform>) -> Result<Program> {
    let file: ProgramFile = serde_json::from_str(source)?;

    let mut program = Program::new(&file.name, platform, file.qubits)?;
    program.set_sweep_points(file.sweep_points);

    for kernel_file in file.kernels {
        let mut kernel = Kernel::new(&kernel_file.name, kernel_file.qubits.unwrap_or(file.qubits));
        if let Some(n) = kernel_file.iterations {
            kernel.repeat(n);
        }
        for g in kernel_file.gates {
            let mut gate = Gate::new(&g.name, g.qubits.into_iter().map(QubitId));
            if let Some(d) = g.duration {
                gate = gate.with_duration(d);
            }
            kernel
                .add(gate)
                .with_context(|| format!("In kernel '{}'", kernel_file.name))?;
        }
        program.add_kernel(kernel)?;
    }
    Ok(program)
}

/// Load compiler options, or the defaults when no file is given.
pub fn load_options(path: Option<&str>) -> Result<CompilerOptions> {
    match path {
        Some(path) => CompilerOptions::from_file(path)
            .with_context(|| format!("Failed to load config: {path}")),
        None => Ok(CompilerOptions::default()),
    }
}

/// Parse a scheduling policy name.
pub fn parse_policy(name: &str) -> Result<SchedulePolicy> {
    name.parse::<SchedulePolicy>()
        .map_err(|e| anyhow::anyhow!("{e}"))
}

/// Split a `pass.key=value` override.
pub fn parse_override(spec: &str) -> Result<(&str, &str, &str)> {
    let (target, value) = spec
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected pass.key=value, got '{spec}'"))?;
    let (pass, key) = target
        .split_once('.')
        .ok_or_else(|| anyhow::anyhow!("Expected pass.key=value, got '{spec}'"))?;
    if pass.is_empty() || key.is_empty() {
        anyhow::bail!("Expected pass.key=value, got '{spec}'");
    }
    Ok((pass, key, value))
}

/// Log filter: `-v` counts win, then the config's `log_level`, then `warn`.
pub fn log_filter(verbose: u8, config: Option<&str>) -> String {
    match verbose {
        0 => config
            .and_then(|path| CompilerOptions::from_file(path).ok())
            .map_or_else(|| "warn".to_string(), |o| o.log_level.to_ascii_lowercase()),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}
