//! Gate-list rewriting passes.
//!
//! - [`Decompose`]: expand composite gates into native gates
//! - [`Optimize`]: merge and cancel adjacent single-qubit rotations

pub mod decompose;
pub mod optimize;

pub use decompose::{DEFAULT_MAX_DEPTH, Decompose};
pub use optimize::Optimize;
