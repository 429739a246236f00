//! Lowering scheduled timelines to per-channel instruction streams.

use std::collections::{BTreeMap, BTreeSet};

use qtrig_ir::{ChannelId, GateRef, Program};
use qtrig_sched::{ScheduledGate, Timeline};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{CodegenError, CodegenResult};
use crate::instruction::{ChannelStream, InstructionStream, SweepParameter};

/// Label of the outer loop emitted for programs with several sweep points.
pub const SWEEP_LABEL: &str = "sweep";

/// Emits wait/trigger streams with loop synthesis.
///
/// Every channel used anywhere in the program gets a stream covering the
/// whole program. At each kernel boundary all channels are padded to the
/// kernel makespan, so the streams stay aligned without cross-channel
/// synchronization.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGenerator;

impl CodeGenerator {
    /// Create a code generator.
    pub fn new() -> Self {
        Self
    }

    /// Generate the stream for `program`, one timeline per kernel in order.
    pub fn generate(&self, program: &Program, timelines: &[Timeline]) -> CodegenResult<InstructionStream> {
        let kernels = program.kernels();
        if kernels.len() != timelines.len() {
            return Err(CodegenError::TimelineMismatch {
                kernels: kernels.len(),
                timelines: timelines.len(),
            });
        }
        for timeline in timelines {
            check_timeline(timeline)?;
        }

        let channels: BTreeSet<ChannelId> = timelines.iter().flat_map(Timeline::channels).collect();
        let mut streams: BTreeMap<ChannelId, ChannelStream> = channels
            .iter()
            .map(|&ch| (ch, ChannelStream::new(ch)))
            .collect();

        let points = program.sweep_points();
        let sweep = (points.len() > 1).then(|| SweepParameter {
            label: SWEEP_LABEL.to_string(),
            values: points.to_vec(),
        });
        let sweep_iterations = sweep_iterations(points.len())?;

        if sweep.is_some() {
            for stream in streams.values_mut() {
                stream.push_loop_start(SWEEP_LABEL, sweep_iterations);
            }
        }

        for (index, (kernel, timeline)) in kernels.iter().zip(timelines).enumerate() {
            let repeated = kernel.iterations() > 1;
            let label = format!("k{index}_{}", kernel.name());

            if repeated {
                for stream in streams.values_mut() {
                    stream.push_loop_start(&label, kernel.iterations());
                }
            }
            emit_kernel_body(timeline, &mut streams);
            if repeated {
                for stream in streams.values_mut() {
                    stream.push_loop_end(&label, kernel.iterations());
                }
            }

            debug!(
                "kernel '{}': {} triggers over {} channels, makespan {}",
                kernel.name(),
                timeline.len(),
                channels.len(),
                timeline.makespan()
            );
        }

        if sweep.is_some() {
            for stream in streams.values_mut() {
                stream.push_loop_end(SWEEP_LABEL, sweep_iterations);
            }
        }

        Ok(InstructionStream::new(
            program.name(),
            streams.into_values().collect(),
            sweep,
        ))
    }
}

/// Emit one kernel body on every channel, ending each at the makespan.
fn emit_kernel_body(timeline: &Timeline, streams: &mut BTreeMap<ChannelId, ChannelStream>) {
    let mut order: Vec<&ScheduledGate> = timeline.gates().iter().collect();
    order.sort_by_key(|g| (g.start, g.channel, g.position));

    let mut cursor: FxHashMap<ChannelId, u64> = FxHashMap::default();
    for gate in order {
        let at = cursor.entry(gate.channel).or_insert(0);
        if let Some(stream) = streams.get_mut(&gate.channel) {
            stream.push_wait(gate.start - *at);
            stream.push_trigger(gate.codeword, gate.duration);
        }
        *at = gate.end();
    }

    let makespan = timeline.makespan();
    for (channel, stream) in streams.iter_mut() {
        let at = cursor.get(channel).copied().unwrap_or(0);
        stream.push_wait(makespan - at);
    }
}

fn gate_ref(timeline: &Timeline, gate: &ScheduledGate) -> GateRef {
    GateRef {
        kernel: timeline.kernel().to_string(),
        position: gate.position,
        name: gate.name.clone(),
        qubits: gate.qubits.clone(),
    }
}

/// Reject zero durations and same-channel overlaps.
fn check_timeline(timeline: &Timeline) -> CodegenResult<()> {
    let mut per_channel: FxHashMap<ChannelId, Vec<&ScheduledGate>> = FxHashMap::default();
    for gate in timeline.gates() {
        if gate.duration == 0 {
            return Err(CodegenError::InvalidDuration {
                gate: gate_ref(timeline, gate),
                channel: gate.channel,
            });
        }
        per_channel.entry(gate.channel).or_default().push(gate);
    }

    for (channel, mut gates) in per_channel {
        gates.sort_by_key(|g| (g.start, g.position));
        for pair in gates.windows(2) {
            if pair[1].start < pair[0].end() {
                return Err(CodegenError::ChannelConflict {
                    channel,
                    first: gate_ref(timeline, pair[0]),
                    second: gate_ref(timeline, pair[1]),
                });
            }
        }
    }
    Ok(())
}

/// Loop count for a sweep of `count` points.
fn sweep_iterations(count: usize) -> CodegenResult<u32> {
    u32::try_from(count).map_err(|_| CodegenError::SweepTooLong { count })
}
