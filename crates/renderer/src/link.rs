use crate::backend::ShaderBackend;
use crate::compile::{compile_stage, CompiledStage};
use crate::error::PipelineError;
use crate::source::load_split;
use crate::types::{ProgramName, ShaderSources, StageKind};

/// A linked and validated program together with its name.
#[derive(Debug)]
pub struct ShaderProgram<P> {
    name: ProgramName,
    handle: P,
}

impl<P> ShaderProgram<P> {
    pub fn name(&self) -> ProgramName {
        self.name
    }

    pub fn handle(&self) -> &P {
        &self.handle
    }

    pub fn destroy<B: ShaderBackend<Program = P>>(self, backend: &mut B) {
        tracing::debug!(program = %self.name, "deleting shader program");
        backend.delete_program(self.handle);
    }
}

/// Links a vertex and fragment stage into an executable program.
///
/// Failed stages are never attached: any compiled stage passed alongside a
/// failed one is deleted and the compile diagnostic is returned. Both stages
/// are deleted once attached, whatever the link outcome.
pub fn link_program<B: ShaderBackend>(
    backend: &mut B,
    name: ProgramName,
    vertex: CompiledStage<B::Shader>,
    fragment: CompiledStage<B::Shader>,
) -> Result<ShaderProgram<B::Program>, PipelineError> {
    let (vertex, fragment) = match (vertex, fragment) {
        (
            CompiledStage::Compiled { kind: vk, shader: vs },
            CompiledStage::Compiled { kind: fk, shader: fs },
        ) => {
            if vk != StageKind::Vertex || fk != StageKind::Fragment {
                backend.delete_shader(vs);
                backend.delete_shader(fs);
                return Err(PipelineError::Link {
                    program: name,
                    log: format!("expected vertex and fragment stages, got {vk} and {fk}"),
                });
            }
            (vs, fs)
        }
        (vertex, fragment) => {
            let mut failure = None;
            for stage in [vertex, fragment] {
                match stage {
                    CompiledStage::Compiled { shader, .. } => backend.delete_shader(shader),
                    CompiledStage::Failed { kind, log } => {
                        failure.get_or_insert((kind, log));
                    }
                }
            }
            let (stage, log) = failure.unwrap_or((StageKind::Vertex, String::new()));
            return Err(PipelineError::Compile {
                program: name,
                stage,
                log,
            });
        }
    };

    let mut program = backend.create_program(name.as_str());
    backend.attach_shader(&mut program, &vertex);
    backend.attach_shader(&mut program, &fragment);
    let linked = backend.link_program(&mut program);
    backend.delete_shader(vertex);
    backend.delete_shader(fragment);

    if !linked {
        let log = backend.program_info_log(&program);
        tracing::error!(program = %name, "failed to link shader program:\n{log}");
        backend.delete_program(program);
        return Err(PipelineError::Link { program: name, log });
    }

    if !backend.validate_program(&mut program) {
        let log = backend.program_info_log(&program);
        tracing::error!(program = %name, "shader program failed validation:\n{log}");
        backend.delete_program(program);
        return Err(PipelineError::Validate { program: name, log });
    }

    tracing::info!(program = %name, "shader program ready");
    Ok(ShaderProgram {
        name,
        handle: program,
    })
}

/// Reads, splits, compiles and links the description configured for `name`.
pub fn build_program<B: ShaderBackend>(
    backend: &mut B,
    name: ProgramName,
    sources: &ShaderSources,
) -> Result<ShaderProgram<B::Program>, PipelineError> {
    let location = sources.get(name);
    tracing::debug!(program = %name, %location, "building shader program");
    let split = load_split(name, location)?;
    let vertex = compile_stage(backend, name, StageKind::Vertex, &split.vertex);
    let fragment = compile_stage(backend, name, StageKind::Fragment, &split.fragment);
    link_program(backend, name, vertex, fragment)
}

/// One program per [`ProgramName`], alive for the whole frame loop.
#[derive(Debug)]
pub struct ProgramSet<P> {
    default: ShaderProgram<P>,
    rainbow: ShaderProgram<P>,
    reflection: ShaderProgram<P>,
}

impl<P> ProgramSet<P> {
    /// Builds `default`, `rainbow` and `reflection` in that order.
    ///
    /// Stops at the first failure after deleting the programs already built.
    pub fn build<B>(backend: &mut B, sources: &ShaderSources) -> Result<Self, PipelineError>
    where
        B: ShaderBackend<Program = P>,
    {
        let default = build_program(backend, ProgramName::Default, sources)?;
        let rainbow = match build_program(backend, ProgramName::Rainbow, sources) {
            Ok(program) => program,
            Err(err) => {
                default.destroy(backend);
                return Err(err);
            }
        };
        let reflection = match build_program(backend, ProgramName::Reflection, sources) {
            Ok(program) => program,
            Err(err) => {
                rainbow.destroy(backend);
                default.destroy(backend);
                return Err(err);
            }
        };

        Ok(Self {
            default,
            rainbow,
            reflection,
        })
    }

    pub fn get(&self, name: ProgramName) -> &ShaderProgram<P> {
        match name {
            ProgramName::Default => &self.default,
            ProgramName::Rainbow => &self.rainbow,
            ProgramName::Reflection => &self.reflection,
        }
    }

    /// Deletes every program in reverse build order.
    pub fn destroy<B: ShaderBackend<Program = P>>(self, backend: &mut B) {
        self.reflection.destroy(backend);
        self.rainbow.destroy(backend);
        self.default.destroy(backend);
    }
}
