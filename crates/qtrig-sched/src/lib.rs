//! qtrig Scheduler
//!
//! Assigns a start time to every gate of a kernel such that
//!
//! - a gate starts only after every earlier gate sharing one of its qubits
//!   has ended, and
//! - no two gates driving the same channel overlap in time.
//!
//! Two policies are provided. [`SchedulePolicy::Asap`] places each gate as
//! early as possible in a forward pass; [`SchedulePolicy::Alap`] runs a
//! backward pass from the ASAP makespan so each gate ends as late as
//! possible. Both produce the same makespan.
//!
//! # Architecture
//!
//! ```text
//! Kernel + Platform
//!        │
//!        ├── resolve_kernel      → duration, channel, codeword per gate
//!        ├── DependencyGraph     → qubit-labelled edges from last-touch
//!        └── forward / backward  → ChannelOccupancy per channel
//!        │
//!        ▼
//!     Timeline
//! ```

pub mod dependency;
pub mod error;
pub mod resource;
pub mod scheduler;
pub mod timeline;

pub use dependency::DependencyGraph;
pub use error::{SchedError, SchedResult};
pub use resource::{ChannelOccupancy, ResolvedGate, resolve_kernel};
pub use scheduler::{SchedulePolicy, Scheduler};
pub use timeline::{Bundle, ScheduledGate, Timeline};
