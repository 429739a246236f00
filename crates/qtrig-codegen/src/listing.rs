//! Plain-text listing of an instruction stream.
//!
//! One section per channel, loop bodies indented:
//!
//! ```text
//! ; program test_parallel_triggers
//! ; sweep [1, 2]
//!
//! ch4:
//!     loop    sweep, 2
//!         trig    cw1, 145
//!         wait    560
//!     endloop sweep
//! ```

use std::fmt;

use crate::instruction::{Instruction, InstructionStream};

const INDENT: &str = "    ";

/// Render `stream` as a listing.
pub fn render(stream: &InstructionStream) -> String {
    Listing(stream).to_string()
}

/// Display adapter printing a stream as a listing.
#[derive(Debug, Clone, Copy)]
pub struct Listing<'a>(pub &'a InstructionStream);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stream = self.0;
        writeln!(f, "; program {}", stream.program())?;
        if let Some(sweep) = stream.sweep() {
            let values: Vec<String> = sweep.values.iter().map(ToString::to_string).collect();
            writeln!(f, "; {} [{}]", sweep.label, values.join(", "))?;
        }

        for channel in stream.channels() {
            writeln!(f, "\n{}:", channel.channel())?;
            let mut depth = 1;
            for inst in channel.instructions() {
                if matches!(inst, Instruction::LoopEnd { .. }) {
                    depth = usize::max(depth - 1, 1);
                }
                f.write_str(&INDENT.repeat(depth))?;
                match inst {
                    Instruction::Wait { duration } => writeln!(f, "wait    {duration}")?,
                    Instruction::Trigger {
                        codeword, duration, ..
                    } => writeln!(f, "trig    {codeword}, {duration}")?,
                    Instruction::LoopStart { label, iterations } => {
                        writeln!(f, "loop    {label}, {iterations}")?;
                        depth += 1;
                    }
                    Instruction::LoopEnd { label, .. } => writeln!(f, "endloop {label}")?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{ChannelStream, SweepParameter};
    use qtrig_ir::{ChannelId, Codeword};

    #[test]
    fn test_render() {
        let mut ch = ChannelStream::new(ChannelId(4));
        ch.push_loop_start("sweep", 2);
        ch.push_trigger(Codeword(1), 145);
        ch.push_wait(560);
        ch.push_loop_end("sweep", 2);
        let stream = InstructionStream::new(
            "demo",
            vec![ch],
            Some(SweepParameter {
                label: "sweep".into(),
                values: vec![1.0, 2.5],
            }),
        );

        let expected = "\
; program demo
; sweep [1, 2.5]

ch4:
    loop    sweep, 2
        trig    cw1, 145
        wait    560
    endloop sweep
";
        assert_eq!(render(&stream), expected);
        assert_eq!(format!("{}", Listing(&stream)), expected);
    }

    #[test]
    fn test_render_without_sweep() {
        let mut ch = ChannelStream::new(ChannelId(2));
        ch.push_wait(40);
        let stream = InstructionStream::new("idle", vec![ch], None);
        assert_eq!(render(&stream), "; program idle\n\nch2:\n    wait    40\n");
    }
}
