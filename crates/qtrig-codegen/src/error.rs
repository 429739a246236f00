//! Error types for code generation.

use qtrig_ir::{ChannelId, GateRef};
use thiserror::Error;

/// Errors that can occur while lowering timelines to instruction streams.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodegenError {
    /// A scheduled gate has zero duration.
    #[error("Gate {gate} on {channel} has zero duration")]
    InvalidDuration {
        /// The offending gate.
        gate: GateRef,
        /// Channel the gate drives.
        channel: ChannelId,
    },

    /// Two gates overlap on one channel.
    #[error("Gates {first} and {second} overlap on {channel}")]
    ChannelConflict {
        /// Shared channel.
        channel: ChannelId,
        /// Earlier gate.
        first: GateRef,
        /// Later gate.
        second: GateRef,
    },

    /// Timeline count does not match the program's kernels.
    #[error("Program has {kernels} kernels but {timelines} timelines were supplied")]
    TimelineMismatch {
        /// Kernels in the program.
        kernels: usize,
        /// Timelines supplied.
        timelines: usize,
    },

    /// The sweep has more points than a loop counter can hold.
    #[error("Sweep has {count} points, more than a loop can iterate")]
    SweepTooLong {
        /// Number of sweep points.
        count: usize,
    },
}

/// Result type for code generation.
pub type CodegenResult<T> = Result<T, CodegenError>;
