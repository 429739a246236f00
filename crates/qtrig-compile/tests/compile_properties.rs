//! Property-based tests for the rewriting passes and the full pipeline.

use std::sync::Arc;

use proptest::prelude::*;
use qtrig_codegen::Instruction;
use qtrig_compile::{Decompose, Optimize, PipelineBuilder, Unitary2x2};
use qtrig_ir::{GateSpec, Kernel, Platform, Program, QubitId};

const NUM_QUBITS: u32 = 3;

fn platform() -> Arc<Platform> {
    let mut p = Platform::new("props", NUM_QUBITS, 5);
    for q in 0..NUM_QUBITS {
        let ch = 1 + q;
        for (name, cw, d) in [
            ("rx90", 1, 145),
            ("mrx90", 2, 145),
            ("ry90", 3, 145),
            ("mry90", 4, 145),
            ("rx180", 6, 200),
            ("ry180", 7, 200),
            ("identity", 5, 125),
        ] {
            p.add_instruction(&format!("{name} q{q}"), GateSpec::new(d, 1).on_channel(ch, cw))
                .unwrap();
        }
        p.add_instruction(&format!("measure q{q}"), GateSpec::new(400, 1).on_channel(10 + q, 1))
            .unwrap();
    }
    for name in ["t", "tdag"] {
        p.add_instruction(name, GateSpec::new(20, 1).on_channel(8, 1))
            .unwrap();
    }
    p.add_instruction("cz", GateSpec::new(300, 2).on_channel(20, 1))
        .unwrap();
    Arc::new(p)
}

const SINGLE: &[&str] = &[
    "rx90", "mrx90", "ry90", "mry90", "rx180", "ry180", "identity", "x", "y", "z", "h", "measure",
];
const ROTATIONS: &[&str] = &[
    "rx90", "mrx90", "ry90", "mry90", "rx180", "ry180", "identity", "t", "tdag",
];
const DOUBLE: &[&str] = &["cz", "cnot", "swap"];

#[derive(Debug, Clone)]
enum GateOp {
    Single(usize, u32),
    Double(usize, u32, u32),
    Toffoli(u32),
}

impl GateOp {
    fn apply(self, kernel: &mut Kernel) {
        let _ = match self {
            GateOp::Single(i, q) => kernel.gate(SINGLE[i], [QubitId(q)]),
            GateOp::Double(i, a, b) => kernel.gate(DOUBLE[i], [QubitId(a), QubitId(b)]),
            GateOp::Toffoli(c) => kernel.toffoli(
                QubitId(c),
                QubitId((c + 1) % NUM_QUBITS),
                QubitId((c + 2) % NUM_QUBITS),
            ),
        };
    }
}

fn arb_gate_op() -> impl Strategy<Value = GateOp> {
    prop_oneof![
        6 => (0..SINGLE.len(), 0..NUM_QUBITS).prop_map(|(i, q)| GateOp::Single(i, q)),
        2 => (0..DOUBLE.len(), 0..NUM_QUBITS, 1..NUM_QUBITS)
            .prop_map(|(i, a, off)| GateOp::Double(i, a, (a + off) % NUM_QUBITS)),
        1 => (0..NUM_QUBITS).prop_map(GateOp::Toffoli),
    ]
}

fn arb_program() -> impl Strategy<Value = Program> {
    prop::collection::vec(arb_gate_op(), 0..30).prop_map(|ops| {
        let mut kernel = Kernel::new("random", NUM_QUBITS);
        for op in ops {
            op.apply(&mut kernel);
        }
        let mut program = Program::new("random", platform(), NUM_QUBITS).unwrap();
        program.add_kernel(kernel).unwrap();
        program
    })
}

fn arb_rotation_kernel() -> impl Strategy<Value = Kernel> {
    prop::collection::vec((0..ROTATIONS.len(), 0..NUM_QUBITS), 0..24).prop_map(|ops| {
        let mut kernel = Kernel::new("rotations", NUM_QUBITS);
        for (i, q) in ops {
            kernel.gate(ROTATIONS[i], [QubitId(q)]).unwrap();
        }
        kernel
    })
}

fn qubit_unitary(kernel: &Kernel, qubit: u32) -> Unitary2x2 {
    Unitary2x2::sequence(
        kernel
            .gates()
            .iter()
            .filter(|g| g.qubits == [QubitId(qubit)])
            .map(|g| g.name.as_str()),
    )
    .unwrap()
}

fn decomposed(mut program: Program) -> Program {
    Decompose::new().run(&mut program).unwrap();
    program
}

proptest! {
    #[test]
    fn prop_decompose_yields_native_gates(program in arb_program()) {
        let program = decomposed(program);
        let p = program.platform().clone();
        for gate in program.kernels()[0].gates() {
            prop_assert!(p.is_native(&gate.name, &gate.qubits), "{} is not native", gate);
        }
    }

    #[test]
    fn prop_optimize_is_idempotent(program in arb_program(), cancel_only in any::<bool>()) {
        let mut program = decomposed(program);
        let pass = Optimize::new().with_cancel_only(cancel_only);
        pass.run(&mut program).unwrap();
        let once = program.kernels()[0].clone();
        pass.run(&mut program).unwrap();
        prop_assert_eq!(&program.kernels()[0], &once);
    }

    #[test]
    fn prop_optimize_never_adds_gates(program in arb_program()) {
        let mut program = decomposed(program);
        let before = program.gate_count();
        Optimize::new().run(&mut program).unwrap();
        prop_assert!(program.gate_count() <= before);
    }

    #[test]
    fn prop_optimize_preserves_unitary(kernel in arb_rotation_kernel(), cancel_only in any::<bool>()) {
        let platform = platform();
        let mut optimized = kernel.clone();
        Optimize::new()
            .with_cancel_only(cancel_only)
            .optimize_kernel(&mut optimized, &platform)
            .unwrap();
        for q in 0..NUM_QUBITS {
            let before = qubit_unitary(&kernel, q);
            let after = qubit_unitary(&optimized, q);
            prop_assert!(after.equals_up_to_phase(&before), "qubit q{} changed", q);
        }
    }

    #[test]
    fn prop_channel_durations_sum_to_makespan(program in arb_program()) {
        let compiled = PipelineBuilder::new().build().unwrap().run(program).unwrap();
        let makespan = compiled.timelines[0].makespan();
        let stream = compiled.stream.unwrap();
        for channel in stream.channels() {
            let total: u64 = channel
                .instructions()
                .iter()
                .map(Instruction::duration)
                .sum();
            prop_assert_eq!(total, makespan);
            prop_assert_eq!(channel.end_time(), makespan);
        }
    }
}
