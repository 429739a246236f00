//! qtrig Backend Code Generator
//!
//! Lowers scheduled timelines into an [`InstructionStream`]: one
//! [`ChannelStream`] of `wait` / `trigger` instructions per physical channel.
//!
//! - Every channel is padded to each kernel's makespan so channels stay
//!   aligned at kernel boundaries.
//! - Kernels repeated more than once become `loop` blocks instead of being
//!   unrolled.
//! - A program with several sweep points is wrapped in one outer `sweep`
//!   loop whose values travel alongside as a [`SweepParameter`].
//!
//! The stream serializes to JSON and renders as a text [`listing`].

pub mod error;
pub mod generator;
pub mod instruction;
pub mod listing;

pub use error::{CodegenError, CodegenResult};
pub use generator::{CodeGenerator, SWEEP_LABEL};
pub use instruction::{ChannelStream, Instruction, InstructionStream, SweepParameter};
