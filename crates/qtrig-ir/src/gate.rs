//! Gate instances and gate identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::qubit::{QubitId, format_qubits};

/// An abstract gate applied to an ordered list of qubit operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gate {
    /// Gate name, normalized to lower case.
    pub name: String,
    /// Qubit operands in order.
    pub qubits: Vec<QubitId>,
    /// Explicit duration overriding the platform's, in time units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
}

impl Gate {
    /// Create a gate without a duration override.
    pub fn new(name: impl AsRef<str>, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            name: name.as_ref().trim().to_lowercase(),
            qubits: qubits.into_iter().collect(),
            duration: None,
        }
    }

    /// Create a single-qubit gate.
    pub fn single(name: impl AsRef<str>, qubit: QubitId) -> Self {
        Self::new(name, [qubit])
    }

    /// Set an explicit duration.
    #[must_use]
    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Number of qubit operands.
    #[inline]
    pub fn arity(&self) -> usize {
        self.qubits.len()
    }

    /// Check whether this gate acts on `qubit`.
    #[inline]
    pub fn acts_on(&self, qubit: QubitId) -> bool {
        self.qubits.contains(&qubit)
    }

    /// Build the identity of this gate at `position` in `kernel`.
    pub fn at(&self, kernel: &str, position: usize) -> GateRef {
        GateRef {
            kernel: kernel.to_string(),
            position,
            name: self.name.clone(),
            qubits: self.qubits.clone(),
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.qubits.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, format_qubits(&self.qubits))
        }
    }
}

/// Identity of a gate for error reporting: kernel, position, name and operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateRef {
    /// Kernel containing the gate.
    pub kernel: String,
    /// Position in the kernel's gate list.
    pub position: usize,
    /// Gate name.
    pub name: String,
    /// Qubit operands.
    pub qubits: Vec<QubitId>,
}

impl fmt::Display for GateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{} {}' at position {} in kernel '{}'",
            self.name,
            format_qubits(&self.qubits),
            self.position,
            self.kernel
        )
    }
}
