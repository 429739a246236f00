//! Pipeline pass kinds and external stage seam.

use std::fmt;
use std::str::FromStr;

use qtrig_codegen::InstructionStream;
use qtrig_ir::Program;
use qtrig_sched::Timeline;

use crate::error::{CompileError, CompileResult};
use crate::options::{CompilerOptions, PassOptions};

/// Option recognized by every pass.
pub const SKIP: &str = "skip";

/// The closed set of pipeline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Expand composite gates into native gates.
    Decompose,
    /// Merge and cancel single-qubit rotations.
    Optimize,
    /// Assign start times.
    Schedule,
    /// Emit per-channel instruction streams.
    GenerateCode,
    /// Hand the artifacts to a registered visualizer.
    Visualize,
    /// Hand the artifacts to a registered writer.
    Write,
}

impl PassKind {
    /// Every pass kind.
    pub const ALL: [PassKind; 6] = [
        PassKind::Decompose,
        PassKind::Optimize,
        PassKind::Schedule,
        PassKind::GenerateCode,
        PassKind::Visualize,
        PassKind::Write,
    ];

    /// Canonical pass name; also the default instance name.
    pub fn name(self) -> &'static str {
        match self {
            PassKind::Decompose => "decompose",
            PassKind::Optimize => "optimize",
            PassKind::Schedule => "schedule",
            PassKind::GenerateCode => "generate_code",
            PassKind::Visualize => "visualize",
            PassKind::Write => "write",
        }
    }

    /// Options this kind recognizes besides `skip`.
    ///
    /// External stages declare theirs through [`ExternalStage::options`].
    pub fn options(self) -> &'static [&'static str] {
        match self {
            PassKind::Decompose => &["max_depth"],
            PassKind::Optimize => &["cancel_only"],
            PassKind::Schedule => &["scheduler"],
            PassKind::GenerateCode | PassKind::Visualize | PassKind::Write => &[],
        }
    }

    /// Whether the pass rewrites gate lists.
    pub fn rewrites_gates(self) -> bool {
        matches!(self, PassKind::Decompose | PassKind::Optimize)
    }

    /// Whether the pass delegates to an [`ExternalStage`].
    pub fn is_external(self) -> bool {
        matches!(self, PassKind::Visualize | PassKind::Write)
    }
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PassKind {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PassKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| CompileError::InvalidConfiguration(format!("Unknown pass kind '{s}'")))
    }
}

/// Artifacts visible to an external stage.
#[derive(Debug, Clone, Copy)]
pub struct StageInput<'a> {
    /// The program in its current form.
    pub program: &'a Program,
    /// Timelines, when a schedule pass ran after the last rewrite.
    pub timelines: Option<&'a [Timeline]>,
    /// Instruction stream, when code was generated after the last rewrite.
    pub stream: Option<&'a InstructionStream>,
    /// Compiler-wide options.
    pub options: &'a CompilerOptions,
}

/// An opaque stage outside the compiler core, such as a report writer.
///
/// Stages only observe artifacts; they never modify the program.
pub trait ExternalStage: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Options the stage recognizes besides `skip`.
    fn options(&self) -> &[&str] {
        &[]
    }

    /// Run the stage.
    fn run(&self, input: StageInput<'_>, options: &PassOptions) -> CompileResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_names_round_trip() {
        for kind in PassKind::ALL {
            assert_eq!(kind.name().parse::<PassKind>().unwrap(), kind);
        }
        assert!("route".parse::<PassKind>().is_err());
    }

    #[test]
    fn test_rewriting_kinds() {
        assert!(PassKind::Decompose.rewrites_gates());
        assert!(PassKind::Optimize.rewrites_gates());
        assert!(!PassKind::Schedule.rewrites_gates());
        assert!(PassKind::Write.is_external());
        assert_eq!(PassKind::Schedule.options(), &["scheduler"]);
    }
}
