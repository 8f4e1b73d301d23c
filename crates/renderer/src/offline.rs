//! Device-free backend that compiles and links through naga only.
//!
//! Used by the `--check` path to report the same compile and link
//! diagnostics as the GPU backend without opening a window.

use crate::backend::ShaderBackend;
use crate::error::PipelineError;
use crate::link::ProgramSet;
use crate::reflect::{self, LinkedUniforms, StageReflection, UniformSlot};
use crate::types::{ProgramName, ShaderSources, StageKind};

#[derive(Debug, Default)]
pub struct OfflineBackend {
    _private: (),
}

#[derive(Debug)]
pub struct OfflineShader {
    kind: StageKind,
    source: String,
    reflection: Option<StageReflection>,
    log: String,
}

#[derive(Debug)]
pub struct OfflineProgram {
    stages: Vec<StageReflection>,
    uniforms: Option<LinkedUniforms>,
    log: String,
}

impl OfflineProgram {
    pub fn uniforms(&self) -> Option<&LinkedUniforms> {
        self.uniforms.as_ref()
    }
}

impl OfflineBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ShaderBackend for OfflineBackend {
    type Shader = OfflineShader;
    type Program = OfflineProgram;
    type UniformLocation = UniformSlot;

    fn create_shader(&mut self, kind: StageKind, source: &str) -> OfflineShader {
        OfflineShader {
            kind,
            source: source.to_string(),
            reflection: None,
            log: String::new(),
        }
    }

    fn compile_shader(&mut self, shader: &mut OfflineShader) -> bool {
        match reflect::parse_stage(shader.kind, &shader.source) {
            Ok(reflection) => {
                shader.reflection = Some(reflection);
                shader.log.clear();
                true
            }
            Err(log) => {
                shader.reflection = None;
                shader.log = log;
                false
            }
        }
    }

    fn shader_info_log(&self, shader: &OfflineShader) -> String {
        shader.log.clone()
    }

    fn delete_shader(&mut self, _shader: OfflineShader) {}

    fn create_program(&mut self, _label: &str) -> OfflineProgram {
        OfflineProgram {
            stages: Vec::new(),
            uniforms: None,
            log: String::new(),
        }
    }

    fn attach_shader(&mut self, program: &mut OfflineProgram, shader: &OfflineShader) {
        if let Some(reflection) = &shader.reflection {
            program.stages.push(reflection.clone());
        }
    }

    fn link_program(&mut self, program: &mut OfflineProgram) -> bool {
        match reflect::link_stages(&program.stages) {
            Ok(uniforms) => {
                program.uniforms = Some(uniforms);
                true
            }
            Err(log) => {
                program.log = log;
                false
            }
        }
    }

    fn validate_program(&mut self, program: &mut OfflineProgram) -> bool {
        if program.uniforms.is_none() {
            program.log = "program has not been linked".to_string();
            return false;
        }
        true
    }

    fn program_info_log(&self, program: &OfflineProgram) -> String {
        program.log.clone()
    }

    fn delete_program(&mut self, _program: OfflineProgram) {}

    fn uniform_location(&self, program: &OfflineProgram, name: &str) -> Option<UniformSlot> {
        program.uniforms.as_ref()?.slot(name)
    }
}

/// Builds every configured program without a GPU, reporting the uniforms each one exposes.
pub fn check_sources(sources: &ShaderSources) -> Result<Vec<(ProgramName, Vec<String>)>, PipelineError> {
    let mut backend = OfflineBackend::new();
    let programs = ProgramSet::build(&mut backend, sources)?;
    let report = ProgramName::ALL
        .into_iter()
        .map(|name| {
            let mut uniforms: Vec<String> = programs
                .get(name)
                .handle()
                .uniforms()
                .map(|linked| linked.slots.keys().cloned().collect())
                .unwrap_or_default();
            uniforms.sort();
            (name, uniforms)
        })
        .collect();
    programs.destroy(&mut backend);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShaderSource;

    #[test]
    fn embedded_sources_pass_the_check() {
        let report = check_sources(&ShaderSources::default()).unwrap();
        let uniforms: Vec<_> = report.iter().map(|(_, names)| names.clone()).collect();
        assert_eq!(
            uniforms,
            vec![
                vec![],
                vec!["screenSize".to_string()],
                vec!["objectColor".to_string(), "screenSize".to_string()],
            ]
        );
    }

    #[test]
    fn broken_fragment_is_reported_as_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.shader");
        std::fs::write(
            &path,
            "#shader vertex\n#version 450\nlayout(location = 0) in vec2 position;\nvoid main() { gl_Position = vec4(position, 0.0, 1.0); }\n#shader fragment\n#version 450\nvoid main() { undefined_call(); }\n",
        )
        .unwrap();
        let mut sources = ShaderSources::default();
        sources.set(ProgramName::Rainbow, ShaderSource::File(path));

        let err = check_sources(&sources).unwrap_err();
        match err {
            PipelineError::Compile { program, stage, log } => {
                assert_eq!(program, ProgramName::Rainbow);
                assert_eq!(stage, StageKind::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unfed_fragment_input_is_reported_as_link_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unfed.shader");
        std::fs::write(
            &path,
            "#shader vertex\n#version 450\nlayout(location = 0) in vec2 position;\nvoid main() { gl_Position = vec4(position, 0.0, 1.0); }\n#shader fragment\n#version 450\nlayout(location = 0) in vec3 tint;\nlayout(location = 0) out vec4 color;\nvoid main() { color = vec4(tint, 1.0); }\n",
        )
        .unwrap();
        let mut sources = ShaderSources::default();
        sources.set(ProgramName::Reflection, ShaderSource::File(path));

        match check_sources(&sources).unwrap_err() {
            PipelineError::Link { program, log } => {
                assert_eq!(program, ProgramName::Reflection);
                assert!(log.contains("no matching vertex output"), "{log}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_stage_is_reported_as_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vertex-only.shader");
        std::fs::write(
            &path,
            "#shader vertex\n#version 450\nlayout(location = 0) in vec2 position;\nvoid main() { gl_Position = vec4(position, 0.0, 1.0); }\n",
        )
        .unwrap();
        let mut sources = ShaderSources::default();
        sources.set(ProgramName::Default, ShaderSource::File(path));

        let err = check_sources(&sources).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Compile {
                stage: StageKind::Fragment,
                ..
            }
        ));
    }
}
