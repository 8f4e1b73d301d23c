//! Shader description loading and stage splitting.
//!
//! A description is plain text where `#shader vertex` / `#shader fragment`
//! directive lines select which stage the following lines belong to:
//!
//! ```text
//! #shader vertex
//! ...vertex body...
//! #shader fragment
//! ...fragment body...
//! ```
//!
//! Lines seen before the first recognized directive, or after a directive
//! naming neither stage, are dropped.

use std::fs;

use thiserror::Error;

use crate::error::PipelineError;
use crate::types::{ProgramName, ShaderSource, StageKind};

const DIRECTIVE: &str = "#shader";

/// Per-stage source text produced by [`split`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSource {
    pub vertex: String,
    pub fragment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    /// A directive line mentions both stage names, so the target stage is undefined.
    #[error("line {line}: directive names both vertex and fragment stages: `{text}`")]
    AmbiguousDirective { line: usize, text: String },
}

/// Splits a shader description into its vertex and fragment bodies.
///
/// Lines end at `\n` only. Body lines are copied unchanged, including any
/// `\r`, and gain a trailing `\n`.
pub fn split(text: &str) -> Result<SplitSource, SplitError> {
    let mut output = SplitSource::default();
    let mut current: Option<StageKind> = None;

    for (index, raw) in text.split_inclusive('\n').enumerate() {
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        if line.trim_start().starts_with(DIRECTIVE) {
            current = directive_stage(line).map_err(|()| SplitError::AmbiguousDirective {
                line: index + 1,
                text: line.to_string(),
            })?;
            if current.is_none() {
                tracing::debug!(line = index + 1, "directive names no known stage; dropping body");
            }
            continue;
        }

        let target = match current {
            Some(StageKind::Vertex) => &mut output.vertex,
            Some(StageKind::Fragment) => &mut output.fragment,
            None => continue,
        };
        target.push_str(line);
        target.push('\n');
    }

    Ok(output)
}

fn directive_stage(line: &str) -> Result<Option<StageKind>, ()> {
    match (line.contains("vertex"), line.contains("fragment")) {
        (true, true) => Err(()),
        (true, false) => Ok(Some(StageKind::Vertex)),
        (false, true) => Ok(Some(StageKind::Fragment)),
        (false, false) => Ok(None),
    }
}

/// Reads the description text for `program` from its configured location.
pub fn load(program: ProgramName, location: &ShaderSource) -> Result<String, PipelineError> {
    match location {
        ShaderSource::Embedded => Ok(program.embedded_source().to_string()),
        ShaderSource::File(path) => {
            fs::read_to_string(path).map_err(|source| PipelineError::Read {
                program,
                location: location.clone(),
                source,
            })
        }
    }
}

/// Reads and splits the description for `program`.
pub fn load_split(program: ProgramName, location: &ShaderSource) -> Result<SplitSource, PipelineError> {
    let text = load(program, location)?;
    split(&text).map_err(|source| PipelineError::Split { program, source })
}
