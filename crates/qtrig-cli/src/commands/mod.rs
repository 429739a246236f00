//! CLI command implementations.

pub mod common;
pub mod compile;
pub mod schedule;
pub mod stage;
pub mod version;
