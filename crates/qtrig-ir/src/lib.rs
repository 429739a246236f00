//! qtrig Program Model
//!
//! This crate holds the data the rest of the qtrig stack compiles: the
//! hardware [`Platform`] descriptor, [`Gate`] instances, [`Kernel`]s and
//! [`Program`]s.
//!
//! # Core Components
//!
//! - **Identifiers**: [`QubitId`], [`ChannelId`], [`Codeword`]
//! - **Platform**: [`Platform`] and [`GateSpec`], loaded from JSON, with
//!   generic and qubit-specialized instruction keys plus
//!   [`DecompositionRule`]s for composite gates
//! - **Gates**: [`Gate`] and [`GateRef`], the positional identity used in
//!   every gate-related error
//! - **Kernels and programs**: [`Kernel`] builder API and [`Program`]
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use qtrig_ir::{GateSpec, Kernel, Platform, Program, QubitId};
//!
//! let mut platform = Platform::new("demo", 2, 5);
//! platform.add_instruction("rx90", GateSpec::new(145, 1).on_channel(4, 1)).unwrap();
//!
//! let mut kernel = Kernel::new("main", 2);
//! kernel.rx90(QubitId(0)).unwrap().rx90(QubitId(1)).unwrap();
//!
//! let mut program = Program::new("prog", Arc::new(platform), 2).unwrap();
//! program.add_kernel(kernel).unwrap();
//! assert_eq!(program.gate_count(), 2);
//! ```

pub mod error;
pub mod gate;
pub mod kernel;
pub mod platform;
pub mod program;
pub mod qubit;

pub use error::{IrError, IrResult};
pub use gate::{Gate, GateRef};
pub use kernel::Kernel;
pub use platform::{
    DecompositionRule, DecompositionStep, GateSpec, Operand, Platform, sanitize_instruction_name,
};
pub use program::Program;
pub use qubit::{ChannelId, Codeword, QubitId, format_qubits};
