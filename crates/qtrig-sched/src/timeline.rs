//! Scheduled timelines.

use std::collections::BTreeSet;

use qtrig_ir::{ChannelId, Codeword, QubitId, format_qubits};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::{SchedError, SchedResult};
use crate::scheduler::SchedulePolicy;

/// One gate with its assigned start time and resolved resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledGate {
    /// Position in the kernel's gate list.
    pub position: usize,
    /// Gate name.
    pub name: String,
    /// Qubit operands.
    pub qubits: Vec<QubitId>,
    /// Start time in time units.
    pub start: u64,
    /// Duration in time units.
    pub duration: u64,
    /// Channel driven by the gate.
    pub channel: ChannelId,
    /// Codeword latched at the trigger.
    pub codeword: Codeword,
}

impl ScheduledGate {
    /// Exclusive end time.
    #[inline]
    pub fn end(&self) -> u64 {
        self.start + self.duration
    }

    /// Check whether two gates occupy a common instant.
    #[inline]
    pub fn overlaps(&self, other: &ScheduledGate) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Gates sharing one start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    /// Common start time.
    pub start: u64,
    /// Positions of the gates starting at `start`, in program order.
    pub positions: Vec<usize>,
}

/// Start times for every gate of one kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    kernel: String,
    policy: SchedulePolicy,
    gates: Vec<ScheduledGate>,
}

impl Timeline {
    /// Create a timeline. `gates` must be sorted by position.
    pub fn new(kernel: impl Into<String>, policy: SchedulePolicy, gates: Vec<ScheduledGate>) -> Self {
        Self {
            kernel: kernel.into(),
            policy,
            gates,
        }
    }

    /// Name of the scheduled kernel.
    pub fn kernel(&self) -> &str {
        &self.kernel
    }

    /// Policy that produced this timeline.
    pub fn policy(&self) -> SchedulePolicy {
        self.policy
    }

    /// Scheduled gates in program order.
    pub fn gates(&self) -> &[ScheduledGate] {
        &self.gates
    }

    /// The scheduled gate at `position`.
    pub fn get(&self, position: usize) -> Option<&ScheduledGate> {
        self.gates.get(position)
    }

    /// Number of gates.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Check whether the timeline has no gates.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Time from zero to the last gate end.
    pub fn makespan(&self) -> u64 {
        self.gates.iter().map(ScheduledGate::end).max().unwrap_or(0)
    }

    /// Makespan rounded up to whole cycles.
    ///
    /// Returns 0 for a zero `cycle_time`. Platforms loaded from JSON always
    /// have a positive cycle time; only a hand-built [`Platform::new`] can
    /// carry zero.
    ///
    /// [`Platform::new`]: qtrig_ir::Platform::new
    pub fn depth_in_cycles(&self, cycle_time: u64) -> u64 {
        if cycle_time == 0 {
            return 0;
        }
        self.makespan().div_ceil(cycle_time)
    }

    /// Channels used by this timeline, ordered by id.
    pub fn channels(&self) -> BTreeSet<ChannelId> {
        self.gates.iter().map(|g| g.channel).collect()
    }

    /// Group gates by equal start time, earliest first.
    pub fn bundles(&self) -> Vec<Bundle> {
        let mut by_start: Vec<&ScheduledGate> = self.gates.iter().collect();
        by_start.sort_by_key(|g| (g.start, g.position));

        let mut bundles: Vec<Bundle> = vec![];
        for gate in by_start {
            match bundles.last_mut() {
                Some(bundle) if bundle.start == gate.start => bundle.positions.push(gate.position),
                _ => bundles.push(Bundle {
                    start: gate.start,
                    positions: vec![gate.position],
                }),
            }
        }
        bundles
    }

    /// Recheck channel exclusivity and qubit ordering.
    pub fn validate(&self) -> SchedResult<()> {
        let mut per_channel: FxHashMap<ChannelId, Vec<&ScheduledGate>> = FxHashMap::default();
        for gate in &self.gates {
            per_channel.entry(gate.channel).or_default().push(gate);
        }
        for (channel, mut gates) in per_channel {
            gates.sort_by_key(|g| (g.start, g.position));
            for pair in gates.windows(2) {
                if pair[0].overlaps(pair[1]) {
                    return Err(self.conflict(format!(
                        "gates at positions {} and {} overlap on {channel}",
                        pair[0].position, pair[1].position
                    )));
                }
            }
        }

        let mut qubit_end: FxHashMap<QubitId, (usize, u64)> = FxHashMap::default();
        for gate in &self.gates {
            for &qubit in &gate.qubits {
                if let Some(&(prev, end)) = qubit_end.get(&qubit) {
                    if gate.start < end {
                        return Err(self.conflict(format!(
                            "gate '{} {}' at position {} starts at {} before gate at position {prev} on {qubit} ends at {end}",
                            gate.name,
                            format_qubits(&gate.qubits),
                            gate.position,
                            gate.start,
                        )));
                    }
                }
                qubit_end.insert(qubit, (gate.position, gate.end()));
            }
        }
        Ok(())
    }

    fn conflict(&self, reason: String) -> SchedError {
        SchedError::SchedulingConflict {
            kernel: self.kernel.clone(),
            reason,
        }
    }
}
