//! Kernel builder API.

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::qubit::QubitId;

/// An ordered, possibly repeated block of gates.
///
/// Builder methods check operands against the kernel's qubit count and
/// return `&mut Self` so calls chain:
///
/// ```
/// use qtrig_ir::{Kernel, QubitId};
///
/// let mut kernel = Kernel::new("ramsey", 2);
/// kernel
///     .prepz(QubitId(0)).unwrap()
///     .rx90(QubitId(0)).unwrap()
///     .identity(QubitId(0)).unwrap()
///     .rx90(QubitId(0)).unwrap()
///     .measure(QubitId(0)).unwrap();
/// kernel.repeat(100);
///
/// assert_eq!(kernel.len(), 5);
/// assert_eq!(kernel.iterations(), 100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    name: String,
    qubit_count: u32,
    gates: Vec<Gate>,
    iterations: u32,
}

impl Kernel {
    /// Create an empty kernel over `qubit_count` qubits.
    pub fn new(name: impl Into<String>, qubit_count: u32) -> Self {
        Self {
            name: name.into(),
            qubit_count,
            gates: vec![],
            iterations: 1,
        }
    }

    /// Kernel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of qubits the kernel addresses.
    pub fn qubit_count(&self) -> u32 {
        self.qubit_count
    }

    /// Gates in program order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Check whether the kernel has no gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// How many times the body repeats.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Repeat the body `n` times. Zero is treated as one.
    pub fn repeat(&mut self, n: u32) -> &mut Self {
        self.iterations = n.max(1);
        self
    }

    /// Append a gate after validating its operands.
    pub fn add(&mut self, gate: Gate) -> IrResult<&mut Self> {
        self.check_operands(&gate)?;
        self.gates.push(gate);
        Ok(self)
    }

    /// Append a gate by name.
    pub fn gate(
        &mut self,
        name: &str,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.add(Gate::new(name, qubits))
    }

    /// Append a gate with an explicit duration overriding the platform's.
    pub fn gate_with_duration(
        &mut self,
        name: &str,
        qubits: impl IntoIterator<Item = QubitId>,
        duration: i64,
    ) -> IrResult<&mut Self> {
        self.add(Gate::new(name, qubits).with_duration(duration))
    }

    /// Replace `range` of the gate list with `replacement`.
    ///
    /// Replacement gates are validated before the list is touched.
    pub fn replace_range(
        &mut self,
        range: std::ops::Range<usize>,
        replacement: Vec<Gate>,
    ) -> IrResult<()> {
        for gate in &replacement {
            self.check_operands(gate)?;
        }
        self.gates.splice(range, replacement);
        Ok(())
    }

    fn check_operands(&self, gate: &Gate) -> IrResult<()> {
        for (i, &qubit) in gate.qubits.iter().enumerate() {
            if qubit.0 >= self.qubit_count {
                return Err(IrError::QubitOutOfRange {
                    qubit,
                    qubit_count: self.qubit_count,
                    kernel: self.name.clone(),
                    gate_name: gate.name.clone(),
                });
            }
            if gate.qubits[..i].contains(&qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: gate.name.clone(),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply a 90 degree X rotation.
    pub fn rx90(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate("rx90", [qubit])
    }

    /// Apply a 90 degree Y rotation.
    pub fn ry90(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate("ry90", [qubit])
    }

    /// Apply a -90 degree X rotation.
    pub fn mrx90(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate("mrx90", [qubit])
    }

    /// Apply a -90 degree Y rotation.
    pub fn mry90(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate("mry90", [qubit])
    }

    /// Apply Pauli-X.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate("x", [qubit])
    }

    /// Apply Pauli-Y.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate("y", [qubit])
    }

    /// Apply Pauli-Z.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate("z", [qubit])
    }

    /// Apply Hadamard.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate("h", [qubit])
    }

    /// Apply an idle of the platform's identity duration.
    pub fn identity(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate("identity", [qubit])
    }

    /// Prepare the qubit in |0>.
    pub fn prepz(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate("prepz", [qubit])
    }

    /// Measure in the Z basis.
    pub fn measure(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate("measure", [qubit])
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT.
    pub fn cnot(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate("cnot", [control, target])
    }

    /// Apply controlled-Z.
    pub fn cz(&mut self, a: QubitId, b: QubitId) -> IrResult<&mut Self> {
        self.gate("cz", [a, b])
    }

    /// Apply SWAP.
    pub fn swap(&mut self, a: QubitId, b: QubitId) -> IrResult<&mut Self> {
        self.gate("swap", [a, b])
    }

    /// Apply Toffoli.
    pub fn toffoli(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate("toffoli", [c1, c2, target])
    }
}
