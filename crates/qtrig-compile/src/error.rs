//! Error types for the compilation crate.

use qtrig_ir::GateRef;
use thiserror::Error;

/// Errors that can occur during compilation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] qtrig_ir::IrError),

    /// Error from the scheduler.
    #[error("Scheduling error: {0}")]
    Sched(#[from] qtrig_sched::SchedError),

    /// Error from the code generator.
    #[error("Code generation error: {0}")]
    Codegen(#[from] qtrig_codegen::CodegenError),

    /// Gate known neither to the platform nor to any decomposition rule.
    #[error("Unknown gate {gate}")]
    UnknownGate {
        /// The offending gate.
        gate: GateRef,
    },

    /// A rule exists but expansion does not reach native gates.
    #[error("Cannot decompose gate {gate}: {reason}")]
    UndecomposableGate {
        /// The offending gate.
        gate: GateRef,
        /// Why expansion stopped.
        reason: String,
    },

    /// Invalid pass configuration.
    #[error("Invalid pass configuration: {0}")]
    InvalidConfiguration(String),

    /// An external stage reported failure.
    #[error("Stage '{stage}' failed: {reason}")]
    ExternalStageFailed {
        /// Stage instance name.
        stage: String,
        /// Failure description.
        reason: String,
    },

    /// Malformed options file.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// I/O error while reading options.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
