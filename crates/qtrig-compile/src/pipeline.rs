//! Pass pipeline for orchestrating compilation.

use std::collections::BTreeMap;

use qtrig_codegen::{CodeGenerator, InstructionStream};
use qtrig_ir::Program;
use qtrig_sched::{SchedulePolicy, Scheduler, Timeline};
use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument};

use crate::error::{CompileError, CompileResult};
use crate::options::{CompilerOptions, OptionValue, PassOptions, parse_bool, parse_usize};
use crate::pass::{ExternalStage, PassKind, SKIP, StageInput};
use crate::passes::{DEFAULT_MAX_DEPTH, Decompose, Optimize};

/// Scope that broadcasts an option to every pass recognizing it.
pub const ALL_PASSES: &str = "ALL";

/// One pipeline slot: a pass kind under an instance name.
#[derive(Debug, Clone)]
struct PipelineEntry {
    kind: PassKind,
    instance: String,
    options: PassOptions,
}

/// Result of running a pipeline.
#[derive(Debug)]
pub struct CompiledProgram {
    /// The program after all rewriting passes.
    pub program: Program,
    /// One timeline per kernel, empty when no schedule pass ran after the
    /// last rewrite.
    pub timelines: Vec<Timeline>,
    /// The instruction stream, when code was generated after the last rewrite.
    pub stream: Option<InstructionStream>,
}

/// An ordered list of passes with per-pass options.
///
/// ```
/// use std::sync::Arc;
/// use qtrig_compile::{CompilerOptions, PassKind, Pipeline};
/// use qtrig_ir::{GateSpec, Kernel, Platform, Program, QubitId};
///
/// let mut platform = Platform::new("demo", 1, 5);
/// platform.add_instruction("rx90", GateSpec::new(145, 1).on_channel(4, 1)).unwrap();
/// let mut kernel = Kernel::new("k", 1);
/// kernel.rx90(QubitId(0)).unwrap();
/// let mut program = Program::new("prog", Arc::new(platform), 1).unwrap();
/// program.add_kernel(kernel).unwrap();
///
/// let mut pipeline = Pipeline::new(CompilerOptions::default());
/// pipeline.add_pass(PassKind::Schedule).unwrap();
/// pipeline.add_pass(PassKind::GenerateCode).unwrap();
/// pipeline.set_option("schedule", "scheduler", "ALAP").unwrap();
///
/// let compiled = pipeline.run(program).unwrap();
/// assert_eq!(compiled.stream.unwrap().end_time(), 145);
/// ```
pub struct Pipeline {
    entries: Vec<PipelineEntry>,
    options: CompilerOptions,
    stages: FxHashMap<PassKind, Box<dyn ExternalStage>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            entries: vec![],
            options,
            stages: FxHashMap::default(),
        }
    }

    /// Append a pass under its canonical name.
    pub fn add_pass(&mut self, kind: PassKind) -> CompileResult<&mut Self> {
        self.add_pass_named(kind, kind.name())
    }

    /// Append a pass under an explicit instance name.
    pub fn add_pass_named(&mut self, kind: PassKind, instance: &str) -> CompileResult<&mut Self> {
        if instance == ALL_PASSES {
            return Err(CompileError::InvalidConfiguration(format!(
                "'{ALL_PASSES}' is reserved and cannot name a pass"
            )));
        }
        if self.entries.iter().any(|e| e.instance == instance) {
            return Err(CompileError::InvalidConfiguration(format!(
                "Pass '{instance}' is already in the pipeline"
            )));
        }
        self.entries.push(PipelineEntry {
            kind,
            instance: instance.to_string(),
            options: PassOptions::new(),
        });
        Ok(self)
    }

    /// Register the stage that `Visualize` or `Write` passes delegate to.
    pub fn register_stage(
        &mut self,
        kind: PassKind,
        stage: Box<dyn ExternalStage>,
    ) -> CompileResult<&mut Self> {
        if !kind.is_external() {
            return Err(CompileError::InvalidConfiguration(format!(
                "Pass '{kind}' is built in and takes no external stage"
            )));
        }
        self.stages.insert(kind, stage);
        Ok(self)
    }

    /// Set `key` to `value` on the pass instance named `pass`, or on every
    /// recognizing pass when `pass` is `ALL`.
    pub fn set_option(&mut self, pass: &str, key: &str, value: &str) -> CompileResult<()> {
        validate_value(key, value)?;

        if pass == ALL_PASSES {
            let mut applied = 0;
            for i in 0..self.entries.len() {
                if self.recognizes(&self.entries[i], key) {
                    self.entries[i].options.set(key, value);
                    applied += 1;
                }
            }
            if applied == 0 {
                return Err(CompileError::InvalidConfiguration(format!(
                    "No pass in the pipeline recognizes option '{key}'"
                )));
            }
            debug!("option {key}={value} broadcast to {applied} passes");
            return Ok(());
        }

        let index = self
            .entries
            .iter()
            .position(|e| e.instance == pass)
            .ok_or_else(|| CompileError::InvalidConfiguration(format!("Unknown pass '{pass}'")))?;
        if !self.recognizes(&self.entries[index], key) {
            return Err(CompileError::InvalidConfiguration(format!(
                "Pass '{pass}' does not recognize option '{key}'"
            )));
        }
        self.entries[index].options.set(key, value);
        Ok(())
    }

    /// Apply overrides as loaded from [`CompilerOptions::passes`].
    pub fn apply_overrides(
        &mut self,
        overrides: &BTreeMap<String, BTreeMap<String, OptionValue>>,
    ) -> CompileResult<()> {
        for (pass, options) in overrides {
            for (key, value) in options {
                self.set_option(pass, key, &value.to_string())?;
            }
        }
        Ok(())
    }

    fn recognizes(&self, entry: &PipelineEntry, key: &str) -> bool {
        if key == SKIP || entry.kind.options().contains(&key) {
            return true;
        }
        entry.kind.is_external()
            && self
                .stages
                .get(&entry.kind)
                .is_some_and(|stage| stage.options().contains(&key))
    }

    /// Instance names in execution order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.instance.as_str()).collect()
    }

    /// Options set on the pass instance named `pass`.
    pub fn pass_options(&self, pass: &str) -> Option<&PassOptions> {
        self.entries
            .iter()
            .find(|e| e.instance == pass)
            .map(|e| &e.options)
    }

    /// Compiler-wide options.
    pub fn compiler_options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the pipeline has no passes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every pass in order on `program`.
    #[instrument(skip_all, fields(program = program.name()))]
    pub fn run(&self, mut program: Program) -> CompileResult<CompiledProgram> {
        info!(
            "Running pipeline with {} passes on program '{}' with {} kernels",
            self.entries.len(),
            program.name(),
            program.kernels().len()
        );

        let mut timelines: Option<Vec<Timeline>> = None;
        let mut stream: Option<InstructionStream> = None;

        for entry in &self.entries {
            if entry.options.flag(SKIP)? {
                debug!("Skipping pass: {}", entry.instance);
                continue;
            }
            debug!("Running pass: {} ({})", entry.instance, entry.kind);

            match entry.kind {
                PassKind::Decompose => {
                    let max_depth = entry
                        .options
                        .get_usize("max_depth")?
                        .unwrap_or(DEFAULT_MAX_DEPTH);
                    Decompose::new().with_max_depth(max_depth).run(&mut program)?;
                }
                PassKind::Optimize => {
                    let cancel_only = entry.options.flag("cancel_only")?;
                    Optimize::new()
                        .with_cancel_only(cancel_only)
                        .run(&mut program)?;
                }
                PassKind::Schedule => {
                    let policy = entry
                        .options
                        .get_policy("scheduler")?
                        .unwrap_or(self.options.scheduler);
                    timelines = Some(schedule_all(&program, policy)?);
                    stream = None;
                }
                PassKind::GenerateCode => {
                    let scheduled = timelines.as_deref().ok_or_else(|| {
                        CompileError::InvalidConfiguration(format!(
                            "Pass '{}' needs a schedule pass after the last rewrite",
                            entry.instance
                        ))
                    })?;
                    stream = Some(CodeGenerator::new().generate(&program, scheduled)?);
                }
                PassKind::Visualize | PassKind::Write => {
                    let stage = self.stages.get(&entry.kind).ok_or_else(|| {
                        CompileError::InvalidConfiguration(format!(
                            "Pass '{}' has no registered {} stage",
                            entry.instance, entry.kind
                        ))
                    })?;
                    let input = StageInput {
                        program: &program,
                        timelines: timelines.as_deref(),
                        stream: stream.as_ref(),
                        options: &self.options,
                    };
                    stage.run(input, &entry.options)?;
                }
            }

            if entry.kind.rewrites_gates() {
                timelines = None;
                stream = None;
            }
            debug!(
                "Pass {} completed, gates: {}",
                entry.instance,
                program.gate_count()
            );
        }

        info!(
            "Pipeline completed, gates: {}, stream: {}",
            program.gate_count(),
            if stream.is_some() { "generated" } else { "none" }
        );

        Ok(CompiledProgram {
            program,
            timelines: timelines.unwrap_or_default(),
            stream,
        })
    }
}

fn schedule_all(program: &Program, policy: SchedulePolicy) -> CompileResult<Vec<Timeline>> {
    let scheduler = Scheduler::new(policy);
    program
        .kernels()
        .iter()
        .map(|kernel| {
            scheduler
                .schedule(kernel, program.platform())
                .map_err(CompileError::from)
        })
        .collect()
}

/// Reject values the recognizing pass could not parse.
fn validate_value(key: &str, value: &str) -> CompileResult<()> {
    match key {
        "skip" | "cancel_only" => parse_bool(key, value).map(|_| ()),
        "max_depth" => parse_usize(key, value).map(|_| ()),
        "scheduler" => value
            .parse::<SchedulePolicy>()
            .map(|_| ())
            .map_err(|e| CompileError::InvalidConfiguration(e.to_string())),
        _ => Ok(()),
    }
}

/// Builder for the default pipeline.
pub struct PipelineBuilder {
    options: CompilerOptions,
    stages: Vec<(PassKind, Box<dyn ExternalStage>)>,
}

impl PipelineBuilder {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self::from_options(&CompilerOptions::default())
    }

    /// Create a builder from loaded options.
    pub fn from_options(options: &CompilerOptions) -> Self {
        Self {
            options: options.clone(),
            stages: vec![],
        }
    }

    /// Set the default scheduling policy.
    #[must_use]
    pub fn with_scheduler(mut self, policy: SchedulePolicy) -> Self {
        self.options.scheduler = policy;
        self
    }

    /// Include or omit the optimization pass.
    #[must_use]
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.options.optimize = optimize;
        self
    }

    /// Append a `Visualize` or `Write` pass backed by `stage`.
    #[must_use]
    pub fn with_stage(mut self, kind: PassKind, stage: impl ExternalStage + 'static) -> Self {
        self.stages.push((kind, Box::new(stage)));
        self
    }

    /// Build the pipeline: decompose, optimize (if enabled), schedule,
    /// generate_code, then any stages, with the option overrides applied.
    pub fn build(self) -> CompileResult<Pipeline> {
        let overrides = self.options.passes.clone();
        let optimize = self.options.optimize;
        let mut pipeline = Pipeline::new(self.options);

        pipeline.add_pass(PassKind::Decompose)?;
        if optimize {
            pipeline.add_pass(PassKind::Optimize)?;
        }
        pipeline.add_pass(PassKind::Schedule)?;
        pipeline.add_pass(PassKind::GenerateCode)?;

        for (kind, stage) in self.stages {
            pipeline.register_stage(kind, stage)?;
            pipeline.add_pass(kind)?;
        }

        pipeline.apply_overrides(&overrides)?;
        Ok(pipeline)
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qtrig_ir::{GateSpec, Kernel, Platform, QubitId};
    use std::sync::{Arc, Mutex};

    fn platform() -> Arc<Platform> {
        let mut p = Platform::new("p", 2, 5);
        for (name, cw) in [("rx90", 1), ("mrx90", 2), ("ry90", 3), ("mry90", 4)] {
            p.add_instruction(&format!("{name} q0"), GateSpec::new(145, 1).on_channel(4, cw))
                .unwrap();
            p.add_instruction(&format!("{name} q1"), GateSpec::new(145, 1).on_channel(5, cw))
                .unwrap();
        }
        p.add_instruction("cz", GateSpec::new(300, 2).on_channel(6, 1))
            .unwrap();
        Arc::new(p)
    }

    fn program() -> Program {
        let mut k = Kernel::new("main", 2);
        k.rx90(QubitId(0))
            .unwrap()
            .mrx90(QubitId(0))
            .unwrap()
            .cnot(QubitId(0), QubitId(1))
            .unwrap();
        let mut p = Program::new("prog", platform(), 2).unwrap();
        p.add_kernel(k).unwrap();
        p
    }

    /// Records what it saw.
    #[derive(Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<(bool, bool, Option<String>)>>>,
    }

    impl ExternalStage for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn options(&self) -> &[&str] {
            &["label"]
        }

        fn run(&self, input: StageInput<'_>, options: &PassOptions) -> CompileResult<()> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push((
                    input.timelines.is_some(),
                    input.stream.is_some(),
                    options.get("label").map(str::to_string),
                ));
            }
            Ok(())
        }
    }

    #[test]
    fn test_default_pipeline_order() {
        let pipeline = PipelineBuilder::new().build().unwrap();
        assert_eq!(
            pipeline.pass_names(),
            vec!["decompose", "optimize", "schedule", "generate_code"]
        );
        let pipeline = PipelineBuilder::new().with_optimize(false).build().unwrap();
        assert_eq!(pipeline.len(), 3);
    }

    #[test]
    fn test_full_run() {
        let compiled = PipelineBuilder::new().build().unwrap().run(program()).unwrap();
        // rx90 mrx90 cancels; cnot becomes mry90 cz ry90.
        assert_eq!(compiled.program.gate_count(), 3);
        assert_eq!(compiled.timelines.len(), 1);
        let stream = compiled.stream.unwrap();
        assert_eq!(stream.end_time(), 145 + 300 + 145);
    }

    #[test]
    fn test_skip_option() {
        let mut pipeline = PipelineBuilder::new().build().unwrap();
        pipeline.set_option("optimize", "skip", "true").unwrap();
        let compiled = pipeline.run(program()).unwrap();
        assert_eq!(compiled.program.gate_count(), 5);
    }

    #[test]
    fn test_all_scope_broadcast() {
        let mut pipeline = PipelineBuilder::new().build().unwrap();
        pipeline.set_option(ALL_PASSES, "skip", "yes").unwrap();
        for name in pipeline.pass_names() {
            assert_eq!(pipeline.pass_options(name).unwrap().get("skip"), Some("yes"));
        }
        let compiled = pipeline.run(program()).unwrap();
        assert_eq!(compiled.program.gate_count(), 3);
        assert!(compiled.stream.is_none());

        let mut pipeline = PipelineBuilder::new().build().unwrap();
        pipeline.set_option(ALL_PASSES, "scheduler", "ALAP").unwrap();
        assert!(pipeline.pass_options("decompose").unwrap().get("scheduler").is_none());
        assert!(matches!(
            pipeline.set_option(ALL_PASSES, "label", "x"),
            Err(CompileError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_option_errors() {
        let mut pipeline = PipelineBuilder::new().build().unwrap();
        assert!(pipeline.set_option("route", "skip", "true").is_err());
        assert!(pipeline.set_option("schedule", "max_depth", "3").is_err());
        assert!(pipeline.set_option("schedule", "scheduler", "random").is_err());
        assert!(pipeline.set_option("decompose", "max_depth", "-1").is_err());
        assert!(pipeline.set_option("decompose", "max_depth", "2").is_ok());
    }

    #[test]
    fn test_generate_code_needs_schedule() {
        let mut pipeline = Pipeline::new(CompilerOptions::default());
        pipeline.add_pass(PassKind::GenerateCode).unwrap();
        assert!(matches!(
            pipeline.run(program()),
            Err(CompileError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rewrite_invalidates_schedule() {
        let mut pipeline = Pipeline::new(CompilerOptions::default());
        pipeline
            .add_pass(PassKind::Decompose)
            .unwrap()
            .add_pass(PassKind::Schedule)
            .unwrap()
            .add_pass(PassKind::Optimize)
            .unwrap()
            .add_pass(PassKind::GenerateCode)
            .unwrap();
        assert!(pipeline.run(program()).is_err());
    }

    #[test]
    fn test_first_error_aborts() {
        let recorder = Recorder::default();
        let seen = recorder.seen.clone();
        let mut pipeline = Pipeline::new(CompilerOptions::default());
        pipeline
            .add_pass(PassKind::Schedule)
            .unwrap()
            .add_pass(PassKind::Write)
            .unwrap();
        pipeline
            .register_stage(PassKind::Write, Box::new(recorder))
            .unwrap();
        // cnot is not native, so scheduling fails before the stage runs.
        let err = pipeline.run(program()).unwrap_err();
        assert!(matches!(err, CompileError::Sched(_)));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_external_stage_sees_artifacts() {
        let recorder = Recorder::default();
        let seen = recorder.seen.clone();
        let mut pipeline = PipelineBuilder::new()
            .with_stage(PassKind::Visualize, recorder)
            .build()
            .unwrap();
        pipeline.set_option("visualize", "label", "timing").unwrap();
        pipeline.run(program()).unwrap();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(true, true, Some("timing".to_string()))]
        );
    }

    #[test]
    fn test_missing_stage() {
        let mut pipeline = Pipeline::new(CompilerOptions::default());
        pipeline.add_pass(PassKind::Visualize).unwrap();
        assert!(matches!(
            pipeline.run(program()),
            Err(CompileError::InvalidConfiguration(_))
        ));
        assert!(
            pipeline
                .register_stage(PassKind::Schedule, Box::new(Recorder::default()))
                .is_err()
        );
    }

    #[test]
    fn test_duplicate_instance_names() {
        let mut pipeline = Pipeline::new(CompilerOptions::default());
        pipeline.add_pass(PassKind::Optimize).unwrap();
        assert!(pipeline.add_pass(PassKind::Optimize).is_err());
        pipeline
            .add_pass_named(PassKind::Optimize, "optimize_again")
            .unwrap();
        assert_eq!(pipeline.pass_names(), vec!["optimize", "optimize_again"]);
    }

    #[test]
    fn test_overrides_from_options() {
        let options = CompilerOptions::from_yaml_str(
            "optimize: false\npasses:\n  schedule:\n    scheduler: alap\n",
        )
        .unwrap();
        let pipeline = PipelineBuilder::from_options(&options).build().unwrap();
        assert_eq!(
            pipeline.pass_options("schedule").unwrap().get("scheduler"),
            Some("alap")
        );

        let bad = CompilerOptions::from_yaml_str("passes:\n  ALL:\n    nonsense: 1\n").unwrap();
        assert!(PipelineBuilder::from_options(&bad).build().is_err());
    }
}
