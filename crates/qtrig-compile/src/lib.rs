//! qtrig Compilation Pipeline
//!
//! This crate turns a [`Program`](qtrig_ir::Program) into per-channel
//! instruction streams by running an ordered list of passes.
//!
//! # Architecture
//!
//! ```text
//! Program (composite gates)
//!       │
//!       ▼
//! ┌──────────┐
//! │ Pipeline │ ◄── CompilerOptions (scheduler, optimize, per-pass options)
//! └──────────┘
//!       │
//!       ├── decompose      → native gates only
//!       ├── optimize       → merged / cancelled rotations
//!       ├── schedule       → one Timeline per kernel
//!       ├── generate_code  → InstructionStream
//!       └── visualize / write (registered ExternalStage)
//!       │
//!       ▼
//! CompiledProgram
//! ```
//!
//! Every pass accepts `skip`. Options can be set per instance name or for
//! every pass that recognizes them through the `ALL` scope. Passes that
//! rewrite gates discard any earlier schedule, so `generate_code` always
//! sees timelines that match the current gate lists.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use qtrig_compile::PipelineBuilder;
//! use qtrig_ir::{GateSpec, Kernel, Platform, Program, QubitId};
//!
//! let mut platform = Platform::new("spin", 2, 5);
//! platform.add_instruction("rx90", GateSpec::new(145, 1).on_channel(4, 1)).unwrap();
//! platform.add_instruction("rx180", GateSpec::new(145, 1).on_channel(4, 6)).unwrap();
//!
//! let mut kernel = Kernel::new("flip", 1);
//! kernel.x(QubitId(0)).unwrap();
//!
//! let mut program = Program::new("demo", Arc::new(platform), 2).unwrap();
//! program.add_kernel(kernel).unwrap();
//! program.set_sweep_points([1.0, 2.0]);
//!
//! let compiled = PipelineBuilder::new().build().unwrap().run(program).unwrap();
//! let stream = compiled.stream.unwrap();
//! assert_eq!(stream.end_time(), 290);
//! ```

pub mod error;
pub mod options;
pub mod pass;
pub mod passes;
pub mod pipeline;
pub mod unitary;

pub use error::{CompileError, CompileResult};
pub use options::{CompilerOptions, OptionValue, PassOptions};
pub use pass::{ExternalStage, PassKind, SKIP, StageInput};
pub use passes::{DEFAULT_MAX_DEPTH, Decompose, Optimize};
pub use pipeline::{ALL_PASSES, CompiledProgram, Pipeline, PipelineBuilder};
pub use unitary::{ROTATION_GATES, Unitary2x2};
