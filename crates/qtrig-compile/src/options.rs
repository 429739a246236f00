//! Compiler options.
//!
//! [`CompilerOptions`] is threaded explicitly through the pipeline and can be
//! loaded from YAML:
//!
//! ```yaml
//! output_dir: build
//! log_level: debug
//! scheduler: ALAP
//! optimize: true
//! passes:
//!   decompose:
//!     max_depth: 4
//!   ALL:
//!     skip: false
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use qtrig_sched::SchedulePolicy;
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// Log levels accepted by `log_level`.
const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// A per-pass option value as written in a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Anything else, kept as text.
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Int(i) => write!(f, "{i}"),
            OptionValue::Text(s) => f.write_str(s),
        }
    }
}

/// Compiler-wide options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerOptions {
    /// Directory external stages write into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Log filter used by the CLI when no `-v` flag is given.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Default scheduling policy.
    #[serde(default)]
    pub scheduler: SchedulePolicy,

    /// Include the optimization pass in the default pipeline.
    #[serde(default = "default_true")]
    pub optimize: bool,

    /// Per-pass option overrides keyed by pass instance name or `ALL`.
    #[serde(default)]
    pub passes: BTreeMap<String, BTreeMap<String, OptionValue>>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            log_level: default_log_level(),
            scheduler: SchedulePolicy::default(),
            optimize: true,
            passes: BTreeMap::new(),
        }
    }
}

impl CompilerOptions {
    /// Parse options from a YAML string and validate them.
    pub fn from_yaml_str(source: &str) -> CompileResult<Self> {
        let options: CompilerOptions = serde_yaml_ng::from_str(source)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a YAML file and validate them.
    pub fn from_file<P: AsRef<Path>>(path: P) -> CompileResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Check field values that serde cannot.
    pub fn validate(&self) -> CompileResult<()> {
        let level = self.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(CompileError::InvalidConfiguration(format!(
                "Unknown log level '{}' (expected one of {})",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(CompileError::InvalidConfiguration(
                "output_dir must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Options set on one pipeline entry, stored as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOptions {
    values: BTreeMap<String, String>,
}

impl PassOptions {
    /// Create an empty option map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`.
    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.trim().to_string());
    }

    /// Raw value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Boolean value of `key`, `false` when unset.
    pub fn flag(&self, key: &str) -> CompileResult<bool> {
        self.get(key).map_or(Ok(false), |v| parse_bool(key, v))
    }

    /// Unsigned value of `key`.
    pub fn get_usize(&self, key: &str) -> CompileResult<Option<usize>> {
        self.get(key).map(|v| parse_usize(key, v)).transpose()
    }

    /// Scheduling policy value of `key`.
    pub fn get_policy(&self, key: &str) -> CompileResult<Option<SchedulePolicy>> {
        self.get(key)
            .map(|v| {
                v.parse::<SchedulePolicy>()
                    .map_err(|e| CompileError::InvalidConfiguration(e.to_string()))
            })
            .transpose()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub(crate) fn parse_bool(key: &str, value: &str) -> CompileResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(CompileError::InvalidConfiguration(format!(
            "Option '{key}' expects a boolean, got '{value}'"
        ))),
    }
}

pub(crate) fn parse_usize(key: &str, value: &str) -> CompileResult<usize> {
    value.parse().map_err(|_| {
        CompileError::InvalidConfiguration(format!(
            "Option '{key}' expects a non-negative integer, got '{value}'"
        ))
    })
}
