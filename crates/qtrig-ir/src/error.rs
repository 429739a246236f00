//! Error types for the IR crate.

use crate::qubit::QubitId;
use thiserror::Error;

/// Errors that can occur while building kernels, programs or platforms.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit operand outside the kernel's qubit range.
    #[error("Qubit {qubit} out of range for kernel '{kernel}' with {qubit_count} qubits (gate: {gate_name})")]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Number of qubits in the kernel.
        qubit_count: u32,
        /// Kernel name.
        kernel: String,
        /// Gate being added.
        gate_name: String,
    },

    /// The same qubit appears twice in one gate's operand list.
    #[error("Duplicate qubit {qubit} in operation (gate: {gate_name})")]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Gate being added.
        gate_name: String,
    },

    /// A kernel uses more qubits than the program it is added to.
    #[error("Kernel '{kernel}' uses {kernel_qubits} qubits but program '{program}' has {program_qubits}")]
    KernelTooWide {
        /// Kernel name.
        kernel: String,
        /// Qubits declared by the kernel.
        kernel_qubits: u32,
        /// Program name.
        program: String,
        /// Qubits declared by the program.
        program_qubits: u32,
    },

    /// A program uses more qubits than the platform offers.
    #[error("Program '{program}' requires {required} qubits but platform '{platform}' only has {available}")]
    ProgramTooWide {
        /// Program name.
        program: String,
        /// Platform name.
        platform: String,
        /// Qubits required.
        required: u32,
        /// Qubits available on the platform.
        available: u32,
    },

    /// The platform descriptor is malformed.
    #[error("Invalid platform descriptor: {0}")]
    InvalidPlatform(String),

    /// JSON parse error while loading a descriptor.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while reading a descriptor.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
