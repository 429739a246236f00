//! Error types for the scheduler.

use qtrig_ir::GateRef;
use thiserror::Error;

/// Errors that can occur while scheduling a kernel.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SchedError {
    /// The platform has no spec for the gate on its operands.
    #[error("Unknown gate {gate}: no platform instruction matches")]
    UnknownGate {
        /// The offending gate.
        gate: GateRef,
    },

    /// The gate's spec lacks a channel or codeword.
    #[error("Gate {gate} has no channel or codeword assigned")]
    UnresolvedChannelResource {
        /// The offending gate.
        gate: GateRef,
    },

    /// The resolved duration is zero or negative.
    #[error("Gate {gate} has non-positive duration {duration}")]
    InvalidDuration {
        /// The offending gate.
        gate: GateRef,
        /// The resolved duration.
        duration: i64,
    },

    /// Operand count differs from the spec's arity.
    #[error("Gate {gate} expects {expected} operands, got {found}")]
    ArityMismatch {
        /// The offending gate.
        gate: GateRef,
        /// Arity declared by the platform.
        expected: u32,
        /// Operands supplied.
        found: usize,
    },

    /// Dependencies or channel use cannot be satisfied.
    #[error("Scheduling conflict in kernel '{kernel}': {reason}")]
    SchedulingConflict {
        /// Kernel being scheduled.
        kernel: String,
        /// What went wrong.
        reason: String,
    },

    /// Unrecognized scheduling policy name.
    #[error("Unknown scheduling policy '{0}' (expected ASAP or ALAP)")]
    UnknownPolicy(String),
}

/// Result type for scheduling operations.
pub type SchedResult<T> = Result<T, SchedError>;
