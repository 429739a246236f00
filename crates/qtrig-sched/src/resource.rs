//! Platform resolution and channel occupancy tracking.

use qtrig_ir::{ChannelId, Codeword, Kernel, Platform};
use rustc_hash::FxHashMap;

use crate::error::{SchedError, SchedResult};

/// Timing and resource attributes of one gate after platform lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedGate {
    /// Duration in time units, always positive.
    pub duration: u64,
    /// Channel driven by the gate.
    pub channel: ChannelId,
    /// Codeword latched on the channel.
    pub codeword: Codeword,
}

/// Resolve every gate of `kernel` against `platform`.
///
/// An explicit gate duration overrides the platform's.
pub fn resolve_kernel(kernel: &Kernel, platform: &Platform) -> SchedResult<Vec<ResolvedGate>> {
    kernel
        .gates()
        .iter()
        .enumerate()
        .map(|(position, gate)| {
            let gate_ref = || gate.at(kernel.name(), position);
            let spec = platform
                .resolve(&gate.name, &gate.qubits)
                .ok_or_else(|| SchedError::UnknownGate { gate: gate_ref() })?;

            if spec.arity as usize != gate.arity() {
                return Err(SchedError::ArityMismatch {
                    gate: gate_ref(),
                    expected: spec.arity,
                    found: gate.arity(),
                });
            }

            let duration = gate.duration.unwrap_or(spec.duration);
            if duration <= 0 {
                return Err(SchedError::InvalidDuration {
                    gate: gate_ref(),
                    duration,
                });
            }

            match (spec.channel, spec.codeword) {
                (Some(channel), Some(codeword)) => Ok(ResolvedGate {
                    duration: duration.unsigned_abs(),
                    channel,
                    codeword,
                }),
                _ => Err(SchedError::UnresolvedChannelResource { gate: gate_ref() }),
            }
        })
        .collect()
}

/// Per-channel boundary times for the greedy placement passes.
///
/// In the forward pass the boundary is the time the channel next becomes
/// free; in the backward pass it is the time the channel is next used.
#[derive(Debug, Clone, Default)]
pub struct ChannelOccupancy {
    boundary: FxHashMap<ChannelId, u64>,
}

impl ChannelOccupancy {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest start allowed on `channel`.
    pub fn free_at(&self, channel: ChannelId) -> u64 {
        self.boundary.get(&channel).copied().unwrap_or(0)
    }

    /// Latest end allowed on `channel`, given the kernel makespan.
    pub fn busy_from(&self, channel: ChannelId, makespan: u64) -> u64 {
        self.boundary.get(&channel).copied().unwrap_or(makespan)
    }

    /// Record the new boundary for `channel`.
    pub fn mark(&mut self, channel: ChannelId, time: u64) {
        self.boundary.insert(channel, time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qtrig_ir::{GateSpec, QubitId};

    fn platform() -> Platform {
        let mut p = Platform::new("p", 2, 5);
        p.add_instruction("rx90", GateSpec::new(145, 1).on_channel(4, 1))
            .unwrap();
        p.add_instruction("flux", GateSpec::new(40, 1)).unwrap();
        p.add_instruction("bad", GateSpec::new(0, 1).on_channel(2, 1))
            .unwrap();
        p.add_instruction("cz", GateSpec::new(60, 2).on_channel(6, 1))
            .unwrap();
        p
    }

    #[test]
    fn test_resolve_with_override() {
        let mut kernel = Kernel::new("k", 2);
        kernel
            .rx90(QubitId(0))
            .unwrap()
            .gate_with_duration("rx90", [QubitId(1)], 20)
            .unwrap();
        let resolved = resolve_kernel(&kernel, &platform()).unwrap();
        assert_eq!(resolved[0].duration, 145);
        assert_eq!(resolved[1].duration, 20);
        assert_eq!(resolved[1].channel, ChannelId(4));
    }

    #[test]
    fn test_resolve_errors() {
        let p = platform();

        let mut kernel = Kernel::new("k", 2);
        kernel.gate("nope", [QubitId(0)]).unwrap();
        let err = resolve_kernel(&kernel, &p).unwrap_err();
        assert!(matches!(err, SchedError::UnknownGate { gate } if gate.position == 0));

        let mut kernel = Kernel::new("k", 2);
        kernel.gate("flux", [QubitId(0)]).unwrap();
        assert!(matches!(
            resolve_kernel(&kernel, &p),
            Err(SchedError::UnresolvedChannelResource { .. })
        ));

        let mut kernel = Kernel::new("k", 2);
        kernel.gate("bad", [QubitId(0)]).unwrap();
        assert!(matches!(
            resolve_kernel(&kernel, &p),
            Err(SchedError::InvalidDuration { duration: 0, .. })
        ));

        let mut kernel = Kernel::new("k", 2);
        kernel.gate("cz", [QubitId(0)]).unwrap();
        assert!(matches!(
            resolve_kernel(&kernel, &p),
            Err(SchedError::ArityMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn test_occupancy_defaults() {
        let mut occ = ChannelOccupancy::new();
        assert_eq!(occ.free_at(ChannelId(1)), 0);
        assert_eq!(occ.busy_from(ChannelId(1), 300), 300);
        occ.mark(ChannelId(1), 145);
        assert_eq!(occ.free_at(ChannelId(1)), 145);
        assert_eq!(occ.busy_from(ChannelId(1), 300), 145);
    }
}
