//! JSON writer behind the `write` pass.

use std::fs;

use qtrig_compile::{CompileError, CompileResult, ExternalStage, PassOptions, StageInput};

/// Writes `<output_dir>/<program>.json` holding the instruction stream.
///
/// Recognizes `pretty` (default true).
#[derive(Debug, Default)]
pub struct JsonWriter;

impl ExternalStage for JsonWriter {
    fn name(&self) -> &str {
        "json-writer"
    }

    fn options(&self) -> &[&str] {
        &["pretty"]
    }

    fn run(&self, input: StageInput<'_>, options: &PassOptions) -> CompileResult<()> {
        let failed = |reason: String| CompileError::ExternalStageFailed {
            stage: self.name().to_string(),
            reason,
        };

        let stream = input
            .stream
            .ok_or_else(|| failed("no instruction stream was generated".into()))?;
        let pretty = options.get("pretty").is_none() || options.flag("pretty")?;

        let json = if pretty {
            serde_json::to_string_pretty(stream)
        } else {
            serde_json::to_string(stream)
        }
        .map_err(|e| failed(e.to_string()))?;

        let dir = &input.options.output_dir;
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", file_stem(input.program.name())));
        fs::write(&path, json)?;
        tracing::info!("Wrote {}", path.display());
        Ok(())
    }
}

/// Program name with path-unsafe characters replaced.
pub fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
