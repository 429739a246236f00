//! ASAP and ALAP list scheduling.

use std::fmt;
use std::str::FromStr;

use qtrig_ir::{Kernel, Platform};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dependency::DependencyGraph;
use crate::error::{SchedError, SchedResult};
use crate::resource::{ChannelOccupancy, ResolvedGate, resolve_kernel};
use crate::timeline::{ScheduledGate, Timeline};

/// Scheduling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[non_exhaustive]
pub enum SchedulePolicy {
    /// Every gate starts as soon as its dependencies and channel allow.
    #[default]
    #[serde(rename = "ASAP")]
    Asap,
    /// Every gate ends as late as its successors and channel allow.
    #[serde(rename = "ALAP")]
    Alap,
}

impl SchedulePolicy {
    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulePolicy::Asap => "ASAP",
            SchedulePolicy::Alap => "ALAP",
        }
    }
}

impl fmt::Display for SchedulePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulePolicy {
    type Err = SchedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASAP" => Ok(SchedulePolicy::Asap),
            "ALAP" => Ok(SchedulePolicy::Alap),
            _ => Err(SchedError::UnknownPolicy(s.to_string())),
        }
    }
}

impl TryFrom<String> for SchedulePolicy {
    type Error = SchedError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Assigns start times to the gates of a kernel.
///
/// Placement is greedy in program order. A gate may start once every
/// predecessor sharing a qubit has ended and its channel is free; among gates
/// competing for a channel the earlier one in program order goes first.
///
/// ```
/// use qtrig_ir::{GateSpec, Kernel, Platform, QubitId};
/// use qtrig_sched::{SchedulePolicy, Scheduler};
///
/// let mut platform = Platform::new("demo", 2, 5);
/// platform.add_instruction("rx90 q0", GateSpec::new(145, 1).on_channel(4, 1)).unwrap();
/// platform.add_instruction("rx90 q1", GateSpec::new(145, 1).on_channel(5, 1)).unwrap();
///
/// let mut kernel = Kernel::new("k", 2);
/// kernel.rx90(QubitId(0)).unwrap().rx90(QubitId(1)).unwrap();
///
/// let timeline = Scheduler::new(SchedulePolicy::Asap).schedule(&kernel, &platform).unwrap();
/// assert_eq!(timeline.gates()[1].start, 0);
/// assert_eq!(timeline.makespan(), 145);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler {
    policy: SchedulePolicy,
}

impl Scheduler {
    /// Create a scheduler with the given policy.
    pub fn new(policy: SchedulePolicy) -> Self {
        Self { policy }
    }

    /// The configured policy.
    pub fn policy(&self) -> SchedulePolicy {
        self.policy
    }

    /// Schedule `kernel` on `platform`.
    pub fn schedule(&self, kernel: &Kernel, platform: &Platform) -> SchedResult<Timeline> {
        let resolved = resolve_kernel(kernel, platform)?;
        let dag = DependencyGraph::build(kernel.gates());
        dag.topological_order(kernel.name())?;

        let asap = forward_pass(&dag, &resolved);
        let starts = match self.policy {
            SchedulePolicy::Asap => asap,
            SchedulePolicy::Alap => {
                let makespan = asap
                    .iter()
                    .zip(&resolved)
                    .map(|(start, r)| start + r.duration)
                    .max()
                    .unwrap_or(0);
                backward_pass(&dag, &resolved, makespan, kernel.name())?
            }
        };

        let gates = kernel
            .gates()
            .iter()
            .zip(&resolved)
            .zip(starts)
            .enumerate()
            .map(|(position, ((gate, r), start))| ScheduledGate {
                position,
                name: gate.name.clone(),
                qubits: gate.qubits.clone(),
                start,
                duration: r.duration,
                channel: r.channel,
                codeword: r.codeword,
            })
            .collect();

        let timeline = Timeline::new(kernel.name(), self.policy, gates);
        debug!(
            "scheduled kernel '{}' ({} gates, {}): makespan {}",
            kernel.name(),
            timeline.len(),
            self.policy,
            timeline.makespan()
        );
        Ok(timeline)
    }
}

fn forward_pass(dag: &DependencyGraph, resolved: &[ResolvedGate]) -> Vec<u64> {
    let mut starts = vec![0u64; resolved.len()];
    let mut channels = ChannelOccupancy::new();

    for (i, r) in resolved.iter().enumerate() {
        let deps_ready = dag
            .predecessors(i)
            .map(|p| starts[p] + resolved[p].duration)
            .max()
            .unwrap_or(0);
        let start = deps_ready.max(channels.free_at(r.channel));
        starts[i] = start;
        channels.mark(r.channel, start + r.duration);
    }
    starts
}

fn backward_pass(
    dag: &DependencyGraph,
    resolved: &[ResolvedGate],
    makespan: u64,
    kernel: &str,
) -> SchedResult<Vec<u64>> {
    let mut starts = vec![0u64; resolved.len()];
    let mut channels = ChannelOccupancy::new();

    for (i, r) in resolved.iter().enumerate().rev() {
        let succs_ready = dag.successors(i).map(|s| starts[s]).min().unwrap_or(makespan);
        let end = succs_ready.min(channels.busy_from(r.channel, makespan));
        let start = end
            .checked_sub(r.duration)
            .ok_or_else(|| SchedError::SchedulingConflict {
                kernel: kernel.to_string(),
                reason: format!("gate at position {i} cannot end by {end} under ALAP"),
            })?;
        starts[i] = start;
        channels.mark(r.channel, start);
    }
    Ok(starts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qtrig_ir::{ChannelId, GateSpec, QubitId};

    /// Mirrors a two-qubit spin platform: each qubit has its own channel.
    fn spin_platform() -> Platform {
        let mut p = Platform::new("spin", 2, 5);
        for (q, ch) in [(0, 4), (1, 5)] {
            for (name, cw) in [("rx90", 1), ("mrx90", 2), ("ry90", 3), ("mry90", 4)] {
                p.add_instruction(&format!("{name} q{q}"), GateSpec::new(145, 1).on_channel(ch, cw))
                    .unwrap();
            }
            p.add_instruction(&format!("identity q{q}"), GateSpec::new(125, 1).on_channel(ch, 5))
                .unwrap();
        }
        p.add_instruction("cz", GateSpec::new(300, 2).on_channel(6, 1))
            .unwrap();
        p.add_instruction("x", GateSpec::new(20, 1).on_channel(1, 1))
            .unwrap();
        p.add_instruction("y", GateSpec::new(20, 1).on_channel(2, 1))
            .unwrap();
        p
    }

    fn starts(tl: &Timeline) -> Vec<u64> {
        tl.gates().iter().map(|g| g.start).collect()
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("asap".parse::<SchedulePolicy>().unwrap(), SchedulePolicy::Asap);
        assert_eq!(" ALAP ".parse::<SchedulePolicy>().unwrap(), SchedulePolicy::Alap);
        assert!(matches!(
            "uniform".parse::<SchedulePolicy>(),
            Err(SchedError::UnknownPolicy(_))
        ));
        assert_eq!(SchedulePolicy::default().to_string(), "ASAP");
    }

    #[test]
    fn test_same_qubit_distinct_channels_serialize() {
        let p = spin_platform();
        let mut k = Kernel::new("k", 2);
        k.x(QubitId(0)).unwrap().y(QubitId(0)).unwrap();
        let tl = Scheduler::default().schedule(&k, &p).unwrap();
        assert_eq!(starts(&tl), vec![0, 20]);
    }

    #[test]
    fn test_parallel_triggers() {
        let p = spin_platform();
        let mut k = Kernel::new("kernel", 2);
        k.rx90(QubitId(0))
            .unwrap()
            .ry90(QubitId(0))
            .unwrap()
            .mrx90(QubitId(0))
            .unwrap()
            .mry90(QubitId(0))
            .unwrap()
            .ry90(QubitId(1))
            .unwrap();

        let tl = Scheduler::new(SchedulePolicy::Asap).schedule(&k, &p).unwrap();
        assert_eq!(starts(&tl), vec![0, 145, 290, 435, 0]);
        assert_eq!(tl.makespan(), 580);
        assert_eq!(tl.bundles()[0].positions, vec![0, 4]);
        tl.validate().unwrap();
    }

    #[test]
    fn test_channel_exclusivity_across_qubits() {
        // x on both qubits shares channel 1.
        let p = spin_platform();
        let mut k = Kernel::new("k", 2);
        k.x(QubitId(0)).unwrap().x(QubitId(1)).unwrap();
        let tl = Scheduler::default().schedule(&k, &p).unwrap();
        assert_eq!(starts(&tl), vec![0, 20]);
        assert_eq!(tl.gates()[1].channel, ChannelId(1));
    }

    #[test]
    fn test_alap_moves_short_branch_late() {
        let p = spin_platform();
        let mut k = Kernel::new("kernel", 2);
        k.rx90(QubitId(0))
            .unwrap()
            .ry90(QubitId(0))
            .unwrap()
            .ry90(QubitId(1))
            .unwrap();

        let asap = Scheduler::new(SchedulePolicy::Asap).schedule(&k, &p).unwrap();
        let alap = Scheduler::new(SchedulePolicy::Alap).schedule(&k, &p).unwrap();
        assert_eq!(starts(&asap), vec![0, 145, 0]);
        assert_eq!(starts(&alap), vec![0, 145, 145]);
        assert_eq!(asap.makespan(), alap.makespan());
        alap.validate().unwrap();
    }

    #[test]
    fn test_two_qubit_gate_waits_for_both() {
        let p = spin_platform();
        let mut k = Kernel::new("k", 2);
        k.rx90(QubitId(0))
            .unwrap()
            .identity(QubitId(1))
            .unwrap()
            .cz(QubitId(0), QubitId(1))
            .unwrap()
            .ry90(QubitId(1))
            .unwrap();
        let tl = Scheduler::default().schedule(&k, &p).unwrap();
        assert_eq!(starts(&tl), vec![0, 0, 145, 445]);
    }

    #[test]
    fn test_empty_kernel() {
        let tl = Scheduler::new(SchedulePolicy::Alap)
            .schedule(&Kernel::new("k", 1), &spin_platform())
            .unwrap();
        assert!(tl.is_empty());
        assert_eq!(tl.makespan(), 0);
    }

    #[test]
    fn test_unknown_gate_names_position() {
        let p = spin_platform();
        let mut k = Kernel::new("k", 2);
        k.x(QubitId(0)).unwrap().h(QubitId(1)).unwrap();
        let err = Scheduler::default().schedule(&k, &p).unwrap_err();
        match err {
            SchedError::UnknownGate { gate } => {
                assert_eq!(gate.position, 1);
                assert_eq!(gate.name, "h");
                assert_eq!(gate.qubits, vec![QubitId(1)]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
