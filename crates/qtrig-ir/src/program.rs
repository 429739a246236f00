//! Programs: ordered kernels bound to a platform.

use std::sync::Arc;

use crate::error::{IrError, IrResult};
use crate::kernel::Kernel;
use crate::platform::Platform;

/// An ordered collection of kernels plus sweep parameters.
#[derive(Debug, Clone)]
pub struct Program {
    name: String,
    platform: Arc<Platform>,
    qubit_count: u32,
    kernels: Vec<Kernel>,
    sweep_points: Vec<f64>,
}

impl Program {
    /// Create a program over `qubit_count` qubits of `platform`.
    pub fn new(name: impl Into<String>, platform: Arc<Platform>, qubit_count: u32) -> IrResult<Self> {
        let name = name.into();
        if qubit_count > platform.qubit_count() {
            return Err(IrError::ProgramTooWide {
                program: name,
                platform: platform.name().to_string(),
                required: qubit_count,
                available: platform.qubit_count(),
            });
        }
        Ok(Self {
            name,
            platform,
            qubit_count,
            kernels: vec![],
            sweep_points: vec![],
        })
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The platform this program targets.
    pub fn platform(&self) -> &Arc<Platform> {
        &self.platform
    }

    /// Number of qubits in the program.
    pub fn qubit_count(&self) -> u32 {
        self.qubit_count
    }

    /// Append a kernel.
    pub fn add_kernel(&mut self, kernel: Kernel) -> IrResult<&mut Self> {
        if kernel.qubit_count() > self.qubit_count {
            return Err(IrError::KernelTooWide {
                kernel: kernel.name().to_string(),
                kernel_qubits: kernel.qubit_count(),
                program: self.name.clone(),
                program_qubits: self.qubit_count,
            });
        }
        self.kernels.push(kernel);
        Ok(self)
    }

    /// Kernels in execution order.
    pub fn kernels(&self) -> &[Kernel] {
        &self.kernels
    }

    /// Mutable access to the kernels, for rewriting passes.
    pub fn kernels_mut(&mut self) -> &mut [Kernel] {
        &mut self.kernels
    }

    /// Set the sweep parameter values.
    pub fn set_sweep_points(&mut self, points: impl Into<Vec<f64>>) -> &mut Self {
        self.sweep_points = points.into();
        self
    }

    /// Sweep parameter values.
    pub fn sweep_points(&self) -> &[f64] {
        &self.sweep_points
    }

    /// Total gate count across kernels, ignoring iterations.
    pub fn gate_count(&self) -> usize {
        self.kernels.iter().map(Kernel::len).sum()
    }
}
