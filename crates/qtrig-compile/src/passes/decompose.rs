//! Composite gate decomposition.
//!
//! Rewrites every gate that is not native on its operands into native gates.
//! Rules are tried in order: a platform rule specialized to the operands, a
//! parametric platform rule, then the built-in table below. Expansion
//! recurses until every part is native, up to `max_depth` levels.
//!
//! | Gate | Expansion |
//! |------|-----------|
//! | `toffoli`, `ccx` (a, b, c) | 15-gate h/t/tdag/cnot network |
//! | `swap` (a, b) | `cnot a,b; cnot b,a; cnot a,b` |
//! | `cnot`, `cx` (c, t) | `mry90 t; cz c,t; ry90 t` |
//! | `h`, `hadamard` | `ry90; x` |
//! | `x` | `rx180` |
//! | `y` | `ry180` |
//! | `z` | `ry180; rx180` |

use qtrig_ir::{Gate, GateRef, Platform, Program, QubitId};
use tracing::debug;

use crate::error::{CompileError, CompileResult};

/// Default recursion limit.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Decomposition pass.
#[derive(Debug, Clone, Copy)]
pub struct Decompose {
    max_depth: usize,
}

impl Decompose {
    /// Create the pass with the default recursion limit.
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the recursion limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Decompose every kernel of `program` in place.
    pub fn run(&self, program: &mut Program) -> CompileResult<()> {
        let platform = program.platform().clone();
        for kernel in program.kernels_mut() {
            if kernel
                .gates()
                .iter()
                .all(|g| platform.is_native(&g.name, &g.qubits))
            {
                continue;
            }

            let mut lowered = Vec::with_capacity(kernel.len());
            for (position, gate) in kernel.gates().iter().enumerate() {
                if platform.is_native(&gate.name, &gate.qubits) {
                    lowered.push(gate.clone());
                    continue;
                }
                let gate_ref = gate.at(kernel.name(), position);
                if !platform.knows(&gate.name) && builtin(&gate.name, &gate.qubits).is_none() {
                    return Err(CompileError::UnknownGate { gate: gate_ref });
                }
                let before = lowered.len();
                self.expand(&platform, gate, 0, &gate_ref, &mut lowered)?;
                debug!("{gate_ref} decomposed into {} gates", lowered.len() - before);
            }

            let len = kernel.len();
            kernel.replace_range(0..len, lowered)?;
        }
        Ok(())
    }

    fn expand(
        &self,
        platform: &Platform,
        gate: &Gate,
        depth: usize,
        origin: &GateRef,
        out: &mut Vec<Gate>,
    ) -> CompileResult<()> {
        if platform.is_native(&gate.name, &gate.qubits) {
            out.push(gate.clone());
            return Ok(());
        }
        if depth >= self.max_depth {
            return Err(CompileError::UndecomposableGate {
                gate: origin.clone(),
                reason: format!("recursion limit {} reached at '{gate}'", self.max_depth),
            });
        }

        let parts = match platform.decomposition_for(&gate.name, &gate.qubits) {
            Some(rule) => rule.expand(&gate.qubits),
            None => builtin(&gate.name, &gate.qubits).ok_or_else(|| {
                CompileError::UndecomposableGate {
                    gate: origin.clone(),
                    reason: format!("'{gate}' is not native and has no decomposition"),
                }
            })?,
        };

        for part in &parts {
            self.expand(platform, part, depth + 1, origin, out)?;
        }
        Ok(())
    }
}

impl Default for Decompose {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in expansion of `name` on `qubits`, when the arity matches.
fn builtin(name: &str, qubits: &[QubitId]) -> Option<Vec<Gate>> {
    let g1 = |n: &str, q: QubitId| Gate::single(n, q);
    let g2 = |n: &str, a: QubitId, b: QubitId| Gate::new(n, [a, b]);

    let gates = match (name, qubits) {
        ("x", &[q]) => vec![g1("rx180", q)],
        ("y", &[q]) => vec![g1("ry180", q)],
        ("z", &[q]) => vec![g1("ry180", q), g1("rx180", q)],
        ("h" | "hadamard", &[q]) => vec![g1("ry90", q), g1("x", q)],
        ("cnot" | "cx", &[c, t]) => vec![g1("mry90", t), g2("cz", c, t), g1("ry90", t)],
        ("swap", &[a, b]) => vec![g2("cnot", a, b), g2("cnot", b, a), g2("cnot", a, b)],
        ("toffoli" | "ccx", &[a, b, c]) => vec![
            g1("h", c),
            g2("cnot", b, c),
            g1("tdag", c),
            g2("cnot", a, c),
            g1("t", c),
            g2("cnot", b, c),
            g1("tdag", c),
            g2("cnot", a, c),
            g1("t", b),
            g1("t", c),
            g1("h", c),
            g2("cnot", a, b),
            g1("t", a),
            g1("tdag", b),
            g2("cnot", a, b),
        ],
        _ => return None,
    };
    Some(gates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qtrig_ir::{GateSpec, Kernel};
    use std::sync::Arc;

    fn platform() -> Platform {
        let mut p = Platform::new("p", 3, 5);
        for (name, cw) in [("rx90", 1), ("ry90", 3), ("mry90", 4), ("rx180", 6), ("ry180", 7)] {
            p.add_instruction(name, GateSpec::new(20, 1).on_channel(1, cw))
                .unwrap();
        }
        for name in ["t", "tdag"] {
            p.add_instruction(name, GateSpec::new(20, 1).on_channel(2, 1))
                .unwrap();
        }
        p.add_instruction("cz", GateSpec::new(60, 2).on_channel(3, 1))
            .unwrap();
        p
    }

    fn program(p: Platform, kernel: Kernel) -> Program {
        let mut program = Program::new("prog", Arc::new(p), 3).unwrap();
        program.add_kernel(kernel).unwrap();
        program
    }

    fn names(program: &Program) -> Vec<String> {
        program.kernels()[0]
            .gates()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_cnot_builtin() {
        let mut k = Kernel::new("k", 3);
        k.rx90(QubitId(0))
            .unwrap()
            .cnot(QubitId(0), QubitId(1))
            .unwrap()
            .rx90(QubitId(2))
            .unwrap();
        let mut prog = program(platform(), k);
        Decompose::new().run(&mut prog).unwrap();
        assert_eq!(
            names(&prog),
            vec!["rx90 q0", "mry90 q1", "cz q0,q1", "ry90 q1", "rx90 q2"]
        );
    }

    #[test]
    fn test_nested_builtins() {
        let mut k = Kernel::new("k", 3);
        k.h(QubitId(0)).unwrap().z(QubitId(1)).unwrap();
        let mut prog = program(platform(), k);
        Decompose::new().run(&mut prog).unwrap();
        assert_eq!(
            names(&prog),
            vec!["ry90 q0", "rx180 q0", "ry180 q1", "rx180 q1"]
        );
    }

    #[test]
    fn test_toffoli_all_native() {
        let mut k = Kernel::new("k", 3);
        k.toffoli(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        let mut prog = program(platform(), k);
        Decompose::new().run(&mut prog).unwrap();

        let p = prog.platform().clone();
        let gates = prog.kernels()[0].gates();
        assert!(gates.iter().all(|g| p.is_native(&g.name, &g.qubits)));
        assert_eq!(gates.iter().filter(|g| g.name == "cz").count(), 6);
    }

    #[test]
    fn test_platform_rule_wins_over_builtin() {
        let mut p = platform();
        p.add_decomposition("cnot %0,%1", &["ry90 %1", "cz %0,%1", "mry90 %1"])
            .unwrap();
        p.add_decomposition("cnot q1,q0", &["rx90 q0"]).unwrap();

        let mut k = Kernel::new("k", 3);
        k.cnot(QubitId(0), QubitId(1))
            .unwrap()
            .cnot(QubitId(1), QubitId(0))
            .unwrap();
        let mut prog = program(p, k);
        Decompose::new().run(&mut prog).unwrap();
        assert_eq!(
            names(&prog),
            vec!["ry90 q1", "cz q0,q1", "mry90 q1", "rx90 q0"]
        );
    }

    #[test]
    fn test_duration_override_not_inherited() {
        let mut k = Kernel::new("k", 3);
        k.gate_with_duration("x", [QubitId(0)], 999).unwrap();
        let mut prog = program(platform(), k);
        Decompose::new().run(&mut prog).unwrap();
        assert_eq!(prog.kernels()[0].gates()[0].duration, None);
    }

    #[test]
    fn test_unknown_gate() {
        let mut k = Kernel::new("k", 3);
        k.rx90(QubitId(0)).unwrap().gate("frobnicate", [QubitId(1)]).unwrap();
        let mut prog = program(platform(), k);
        let err = Decompose::new().run(&mut prog).unwrap_err();
        match err {
            CompileError::UnknownGate { gate } => {
                assert_eq!(gate.position, 1);
                assert_eq!(gate.name, "frobnicate");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_known_but_not_native_here() {
        let mut p = Platform::new("p", 2, 5);
        p.add_instruction("rx90 q0", GateSpec::new(20, 1).on_channel(1, 1))
            .unwrap();
        let mut k = Kernel::new("k", 2);
        k.rx90(QubitId(1)).unwrap();
        let mut prog = Program::new("prog", Arc::new(p), 2).unwrap();
        prog.add_kernel(k).unwrap();
        assert!(matches!(
            Decompose::new().run(&mut prog),
            Err(CompileError::UndecomposableGate { .. })
        ));
    }

    #[test]
    fn test_arity_mismatch_uses_decomposition() {
        let mut p = platform();
        p.add_decomposition("cz %0,%1,%2", &["cz %0,%1", "cz %1,%2"])
            .unwrap();
        let mut k = Kernel::new("k", 3);
        k.gate("cz", [QubitId(0), QubitId(1), QubitId(2)]).unwrap();
        let mut prog = program(p, k);
        Decompose::new().run(&mut prog).unwrap();
        assert_eq!(names(&prog), vec!["cz q0,q1", "cz q1,q2"]);
    }

    #[test]
    fn test_arity_mismatch_without_rule() {
        let mut k = Kernel::new("k", 3);
        k.gate("cz", [QubitId(0), QubitId(1), QubitId(2)]).unwrap();
        let mut prog = program(platform(), k);
        let err = Decompose::new().run(&mut prog).unwrap_err();
        assert!(matches!(err, CompileError::UndecomposableGate { gate, .. } if gate.position == 0));
    }

    #[test]
    fn test_recursion_limit() {
        let mut p = platform();
        p.add_decomposition("loop %0", &["loop %0"]).unwrap();
        let mut k = Kernel::new("k", 3);
        k.gate("loop", [QubitId(0)]).unwrap();
        let mut prog = program(p, k);
        let err = Decompose::new().with_max_depth(3).run(&mut prog).unwrap_err();
        assert!(matches!(err, CompileError::UndecomposableGate { reason, .. } if reason.contains("recursion limit 3")));
    }
}
