//! Single-qubit rotation merging and cancellation.
//!
//! For each qubit, the pass looks at maximal runs of rotation-class gates
//! acting only on that qubit. Gates on other qubits do not break a run; any
//! other gate touching the qubit does. Each run of two or more gates is
//! rewritten by the first rule that applies:
//!
//! 1. the run multiplies to the identity (up to phase): remove it;
//! 2. a native rotation no longer than the run equals its product: replace
//!    the run with that gate at the run's first position (skipped when
//!    `cancel_only` is set);
//! 3. some contiguous window of the run multiplies to the identity: remove
//!    the first such window, larger windows first.
//!
//! Rewrites repeat until none applies. Every rewrite removes at least one
//! gate, so the pass terminates and running it twice changes nothing.

use qtrig_ir::{Gate, Kernel, Platform, Program, QubitId};
use tracing::debug;

use crate::error::CompileResult;
use crate::unitary::{ROTATION_GATES, Unitary2x2};

/// Optimization pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Optimize {
    cancel_only: bool,
}

/// A pending change to one kernel's gate list.
enum Rewrite {
    /// Remove the gates at these positions.
    Remove(Vec<usize>),
    /// Replace the gate at the first position with `gate`, remove the rest.
    Merge(Vec<usize>, Gate),
}

/// A rotation candidate: position in the kernel, matrix and duration.
struct Rotation {
    position: usize,
    unitary: Unitary2x2,
    duration: i64,
}

impl Optimize {
    /// Create the pass with all rules enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only cancel; never merge into a different gate.
    #[must_use]
    pub fn with_cancel_only(mut self, cancel_only: bool) -> Self {
        self.cancel_only = cancel_only;
        self
    }

    /// Optimize every kernel of `program` in place.
    pub fn run(&self, program: &mut Program) -> CompileResult<()> {
        let platform = program.platform().clone();
        for kernel in program.kernels_mut() {
            let before = kernel.len();
            self.optimize_kernel(kernel, &platform)?;
            if kernel.len() != before {
                debug!(
                    "kernel '{}': {} -> {} gates",
                    kernel.name(),
                    before,
                    kernel.len()
                );
            }
        }
        Ok(())
    }

    /// Rewrite `kernel` to a fixpoint.
    pub fn optimize_kernel(&self, kernel: &mut Kernel, platform: &Platform) -> CompileResult<()> {
        while let Some(rewrite) = self.find_rewrite(kernel, platform) {
            apply(kernel, rewrite)?;
        }
        Ok(())
    }

    fn find_rewrite(&self, kernel: &Kernel, platform: &Platform) -> Option<Rewrite> {
        for q in 0..kernel.qubit_count() {
            for run in runs_on(kernel, platform, QubitId(q)) {
                if run.len() < 2 {
                    continue;
                }
                if let Some(rewrite) = self.rewrite_run(&run, platform, QubitId(q)) {
                    return Some(rewrite);
                }
            }
        }
        None
    }

    fn rewrite_run(&self, run: &[Rotation], platform: &Platform, qubit: QubitId) -> Option<Rewrite> {
        let positions = || run.iter().map(|r| r.position).collect::<Vec<_>>();
        let product = product_of(run);

        if product.is_identity() {
            return Some(Rewrite::Remove(positions()));
        }

        if !self.cancel_only {
            let total: i64 = run.iter().map(|r| r.duration).sum();
            if let Some(gate) = merge_candidate(&product, total, platform, qubit) {
                return Some(Rewrite::Merge(positions(), gate));
            }
        }

        for size in (2..run.len()).rev() {
            for window in run.windows(size) {
                if product_of(window).is_identity() {
                    return Some(Rewrite::Remove(window.iter().map(|r| r.position).collect()));
                }
            }
        }
        None
    }
}

fn product_of(window: &[Rotation]) -> Unitary2x2 {
    window
        .iter()
        .fold(Unitary2x2::identity(), |acc, r| r.unitary.mul(&acc))
}

/// The shortest native rotation equal to `product` and not longer than `total`.
fn merge_candidate(
    product: &Unitary2x2,
    total: i64,
    platform: &Platform,
    qubit: QubitId,
) -> Option<Gate> {
    let mut best: Option<(&str, i64)> = None;
    for &name in ROTATION_GATES {
        let Some(spec) = platform.resolve(name, &[qubit]) else {
            continue;
        };
        if spec.duration > total || spec.arity != 1 {
            continue;
        }
        let Some(u) = Unitary2x2::for_gate(name) else {
            continue;
        };
        if !u.equals_up_to_phase(product) {
            continue;
        }
        if best.is_none_or(|(_, d)| spec.duration < d) {
            best = Some((name, spec.duration));
        }
    }
    best.map(|(name, _)| Gate::single(name, qubit))
}

/// Maximal runs of rotation candidates on `qubit`, in program order.
fn runs_on(kernel: &Kernel, platform: &Platform, qubit: QubitId) -> Vec<Vec<Rotation>> {
    let mut runs = vec![];
    let mut current: Vec<Rotation> = vec![];

    for (position, gate) in kernel.gates().iter().enumerate() {
        if !gate.acts_on(qubit) {
            continue;
        }
        match rotation(gate, platform, position) {
            Some(r) if gate.arity() == 1 => current.push(r),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn rotation(gate: &Gate, platform: &Platform, position: usize) -> Option<Rotation> {
    let unitary = Unitary2x2::for_gate(&gate.name)?;
    let spec = platform.resolve(&gate.name, &gate.qubits)?;
    Some(Rotation {
        position,
        unitary,
        duration: gate.duration.unwrap_or(spec.duration),
    })
}

fn apply(kernel: &mut Kernel, rewrite: Rewrite) -> CompileResult<()> {
    let (remove, merged) = match rewrite {
        Rewrite::Remove(positions) => (positions, None),
        Rewrite::Merge(positions, gate) => (positions, Some(gate)),
    };
    let first = remove.first().copied();

    let mut gates = Vec::with_capacity(kernel.len());
    for (position, gate) in kernel.gates().iter().enumerate() {
        if Some(position) == first {
            if let Some(merged) = &merged {
                gates.push(merged.clone());
                continue;
            }
        }
        if !remove.contains(&position) {
            gates.push(gate.clone());
        }
    }
    let len = kernel.len();
    kernel.replace_range(0..len, gates)?;
    Ok(())
}
