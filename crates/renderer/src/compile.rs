use crate::backend::ShaderBackend;
use crate::types::{ProgramName, StageKind};

/// Outcome of compiling one shader stage.
///
/// A failed stage owns no backend object; its diagnostic log is all that
/// remains.
#[derive(Debug)]
pub enum CompiledStage<S> {
    Compiled { kind: StageKind, shader: S },
    Failed { kind: StageKind, log: String },
}

impl<S> CompiledStage<S> {
    pub fn kind(&self) -> StageKind {
        match self {
            CompiledStage::Compiled { kind, .. } | CompiledStage::Failed { kind, .. } => *kind,
        }
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self, CompiledStage::Compiled { .. })
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            CompiledStage::Compiled { .. } => None,
            CompiledStage::Failed { log, .. } => Some(log),
        }
    }
}

/// Submits `source` for one stage of `program` and queries the compile status.
///
/// On failure the backend log is reported and the backend shader object is
/// deleted before returning [`CompiledStage::Failed`].
pub fn compile_stage<B: ShaderBackend>(
    backend: &mut B,
    program: ProgramName,
    kind: StageKind,
    source: &str,
) -> CompiledStage<B::Shader> {
    let mut shader = backend.create_shader(kind, source);
    if backend.compile_shader(&mut shader) {
        tracing::debug!(%program, stage = %kind, "compiled shader stage");
        return CompiledStage::Compiled { kind, shader };
    }

    let mut log = backend.shader_info_log(&shader);
    if log.trim().is_empty() {
        log = format!("{kind} shader failed to compile (backend reported no diagnostics)");
    }
    tracing::error!(%program, stage = %kind, "failed to compile shader stage:\n{log}");
    backend.delete_shader(shader);
    CompiledStage::Failed { kind, log }
}
