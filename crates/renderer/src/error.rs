use std::io;

use thiserror::Error;

use crate::source::SplitError;
use crate::types::{ProgramName, ShaderSource, StageKind};

/// Failures raised while turning shader descriptions into linked programs.
///
/// Every variant is fatal at startup; none of them are retried.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read `{program}` shader description from {location}")]
    Read {
        program: ProgramName,
        location: ShaderSource,
        #[source]
        source: io::Error,
    },
    #[error("failed to split `{program}` shader description")]
    Split {
        program: ProgramName,
        #[source]
        source: SplitError,
    },
    #[error("failed to compile {stage} shader for `{program}`:\n{log}")]
    Compile {
        program: ProgramName,
        stage: StageKind,
        log: String,
    },
    #[error("failed to link `{program}` shader program:\n{log}")]
    Link { program: ProgramName, log: String },
    #[error("`{program}` shader program failed validation:\n{log}")]
    Validate { program: ProgramName, log: String },
}

impl PipelineError {
    pub fn program(&self) -> ProgramName {
        match self {
            PipelineError::Read { program, .. }
            | PipelineError::Split { program, .. }
            | PipelineError::Compile { program, .. }
            | PipelineError::Link { program, .. }
            | PipelineError::Validate { program, .. } => *program,
        }
    }
}
