//! Instruction stream model.

use qtrig_ir::{ChannelId, Codeword};
use serde::Serialize;

/// One channel-level instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    /// Idle for `duration` time units.
    Wait {
        /// Idle time.
        duration: u64,
    },
    /// Latch `codeword` on `channel` and hold for `duration`.
    Trigger {
        /// Target channel.
        channel: ChannelId,
        /// Payload selecting the waveform.
        codeword: Codeword,
        /// Time the trigger occupies the channel.
        duration: u64,
    },
    /// Begin a repeated block.
    LoopStart {
        /// Loop label, unique within the stream.
        label: String,
        /// Body repetitions.
        iterations: u32,
    },
    /// End the repeated block opened with the same label.
    LoopEnd {
        /// Loop label.
        label: String,
        /// Body repetitions.
        iterations: u32,
    },
}

impl Instruction {
    /// Time the instruction itself takes; loop markers take none.
    pub fn duration(&self) -> u64 {
        match self {
            Instruction::Wait { duration } | Instruction::Trigger { duration, .. } => *duration,
            Instruction::LoopStart { .. } | Instruction::LoopEnd { .. } => 0,
        }
    }

    /// Check whether this is a trigger.
    #[inline]
    pub fn is_trigger(&self) -> bool {
        matches!(self, Instruction::Trigger { .. })
    }
}

/// The instruction sequence for one physical channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStream {
    channel: ChannelId,
    instructions: Vec<Instruction>,
}

impl ChannelStream {
    /// Create an empty stream for `channel`.
    pub fn new(channel: ChannelId) -> Self {
        Self {
            channel,
            instructions: vec![],
        }
    }

    /// The channel this stream drives.
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Instructions in order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check whether the stream has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Number of triggers, counting each loop body once.
    pub fn trigger_count(&self) -> usize {
        self.instructions.iter().filter(|i| i.is_trigger()).count()
    }

    /// Append a wait, merging into a preceding wait. Zero waits are dropped.
    pub fn push_wait(&mut self, duration: u64) {
        if duration == 0 {
            return;
        }
        if let Some(Instruction::Wait { duration: prev }) = self.instructions.last_mut() {
            *prev += duration;
            return;
        }
        self.instructions.push(Instruction::Wait { duration });
    }

    /// Append a trigger.
    pub fn push_trigger(&mut self, codeword: Codeword, duration: u64) {
        self.instructions.push(Instruction::Trigger {
            channel: self.channel,
            codeword,
            duration,
        });
    }

    /// Open a loop.
    pub fn push_loop_start(&mut self, label: &str, iterations: u32) {
        self.instructions.push(Instruction::LoopStart {
            label: label.to_string(),
            iterations,
        });
    }

    /// Close a loop. A loop whose body is empty is removed instead.
    pub fn push_loop_end(&mut self, label: &str, iterations: u32) {
        if let Some(Instruction::LoopStart { label: open, .. }) = self.instructions.last() {
            if open == label {
                self.instructions.pop();
                return;
            }
        }
        self.instructions.push(Instruction::LoopEnd {
            label: label.to_string(),
            iterations,
        });
    }

    /// Sum of wait and trigger durations, ignoring loop repetition.
    pub fn flat_duration(&self) -> u64 {
        self.instructions.iter().map(Instruction::duration).sum()
    }

    /// Time at which the channel finishes, with loop bodies repeated.
    pub fn end_time(&self) -> u64 {
        // One accumulator per open loop; the bottom frame is the top level.
        let mut frames: Vec<u64> = vec![0];
        for inst in &self.instructions {
            match inst {
                Instruction::LoopStart { .. } => frames.push(0),
                Instruction::LoopEnd { iterations, .. } => {
                    if frames.len() > 1 {
                        let body = frames.pop().unwrap_or(0);
                        if let Some(outer) = frames.last_mut() {
                            *outer += body * u64::from(*iterations);
                        }
                    }
                }
                other => {
                    if let Some(current) = frames.last_mut() {
                        *current += other.duration();
                    }
                }
            }
        }
        frames.into_iter().sum()
    }
}

/// Values for a symbolic sweep loop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepParameter {
    /// Label of the loop the values belong to.
    pub label: String,
    /// One value per iteration.
    pub values: Vec<f64>,
}

/// Per-channel instruction streams for a whole program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionStream {
    program: String,
    channels: Vec<ChannelStream>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sweep: Option<SweepParameter>,
}

impl InstructionStream {
    /// Assemble a stream. Channel streams are ordered by channel id.
    pub fn new(
        program: impl Into<String>,
        mut channels: Vec<ChannelStream>,
        sweep: Option<SweepParameter>,
    ) -> Self {
        channels.sort_by_key(ChannelStream::channel);
        Self {
            program: program.into(),
            channels,
            sweep,
        }
    }

    /// Name of the compiled program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Channel streams ordered by channel id.
    pub fn channels(&self) -> &[ChannelStream] {
        &self.channels
    }

    /// The stream for `channel`.
    pub fn channel(&self, channel: ChannelId) -> Option<&ChannelStream> {
        self.channels.iter().find(|s| s.channel == channel)
    }

    /// Sweep values, when the program sweeps.
    pub fn sweep(&self) -> Option<&SweepParameter> {
        self.sweep.as_ref()
    }

    /// Check whether no channel is driven.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Latest end time over all channels.
    pub fn end_time(&self) -> u64 {
        self.channels
            .iter()
            .map(ChannelStream::end_time)
            .max()
            .unwrap_or(0)
    }
}
