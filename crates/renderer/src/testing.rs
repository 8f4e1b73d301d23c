//! Recording graphics context used by unit tests.

use crate::backend::{GraphicsContext, ShaderBackend};
use crate::types::{StageKind, Topology};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateShader(StageKind),
    CompileShader(StageKind),
    DeleteShader(StageKind),
    CreateProgram(String),
    AttachShader(StageKind),
    LinkProgram,
    ValidateProgram,
    DeleteProgram(String),
    CreateBuffer,
    DeleteBuffer,
    UseProgram(String),
    UploadVertices(Vec<[f32; 2]>),
    SetUniformVec2(String, [f32; 2]),
    SetUniformVec4(String, [f32; 4]),
    DrawArrays(Topology, u32),
}

#[derive(Debug)]
pub(crate) struct FakeShader {
    kind: StageKind,
    source: String,
}

#[derive(Debug)]
pub(crate) struct FakeProgram {
    label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeLocation(String);

#[derive(Debug)]
pub(crate) struct FakeBuffer;

#[derive(Debug)]
pub(crate) struct RecordingContext {
    pub calls: Vec<Call>,
    pub fail_compile: bool,
    pub fail_compile_containing: Option<String>,
    pub fail_link: bool,
    pub fail_validate: bool,
    pub compile_log: String,
    /// Uniform names every program exposes.
    pub uniforms: Vec<&'static str>,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            fail_compile: false,
            fail_compile_containing: None,
            fail_link: false,
            fail_validate: false,
            compile_log: "0:1: error: unexpected token".to_string(),
            uniforms: vec!["screenSize", "objectColor"],
        }
    }
}

impl RecordingContext {
    pub fn draw_calls(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::DrawArrays(..)))
            .collect()
    }
}

impl ShaderBackend for RecordingContext {
    type Shader = FakeShader;
    type Program = FakeProgram;
    type UniformLocation = FakeLocation;

    fn create_shader(&mut self, kind: StageKind, source: &str) -> FakeShader {
        self.calls.push(Call::CreateShader(kind));
        FakeShader {
            kind,
            source: source.to_string(),
        }
    }

    fn compile_shader(&mut self, shader: &mut FakeShader) -> bool {
        self.calls.push(Call::CompileShader(shader.kind));
        let poisoned = self
            .fail_compile_containing
            .as_deref()
            .is_some_and(|needle| shader.source.contains(needle));
        !(self.fail_compile || poisoned)
    }

    fn shader_info_log(&self, _shader: &FakeShader) -> String {
        self.compile_log.clone()
    }

    fn delete_shader(&mut self, shader: FakeShader) {
        self.calls.push(Call::DeleteShader(shader.kind));
    }

    fn create_program(&mut self, label: &str) -> FakeProgram {
        self.calls.push(Call::CreateProgram(label.to_string()));
        FakeProgram {
            label: label.to_string(),
        }
    }

    fn attach_shader(&mut self, _program: &mut FakeProgram, shader: &FakeShader) {
        self.calls.push(Call::AttachShader(shader.kind));
    }

    fn link_program(&mut self, _program: &mut FakeProgram) -> bool {
        self.calls.push(Call::LinkProgram);
        !self.fail_link
    }

    fn validate_program(&mut self, _program: &mut FakeProgram) -> bool {
        self.calls.push(Call::ValidateProgram);
        !self.fail_validate
    }

    fn program_info_log(&self, _program: &FakeProgram) -> String {
        if self.fail_link {
            "link failed".to_string()
        } else {
            "validate failed".to_string()
        }
    }

    fn delete_program(&mut self, program: FakeProgram) {
        self.calls.push(Call::DeleteProgram(program.label));
    }

    fn uniform_location(&self, _program: &FakeProgram, name: &str) -> Option<FakeLocation> {
        self.uniforms
            .contains(&name)
            .then(|| FakeLocation(name.to_string()))
    }
}

impl GraphicsContext for RecordingContext {
    type Buffer = FakeBuffer;

    fn create_vertex_buffer(&mut self) -> FakeBuffer {
        self.calls.push(Call::CreateBuffer);
        FakeBuffer
    }

    fn delete_buffer(&mut self, _buffer: FakeBuffer) {
        self.calls.push(Call::DeleteBuffer);
    }

    fn use_program(&mut self, program: &FakeProgram) {
        self.calls.push(Call::UseProgram(program.label.clone()));
    }

    fn upload_vertices(&mut self, _buffer: &FakeBuffer, vertices: &[[f32; 2]]) {
        self.calls.push(Call::UploadVertices(vertices.to_vec()));
    }

    fn set_uniform_vec2(&mut self, location: &FakeLocation, value: [f32; 2]) {
        self.calls.push(Call::SetUniformVec2(location.0.clone(), value));
    }

    fn set_uniform_vec4(&mut self, location: &FakeLocation, value: [f32; 4]) {
        self.calls.push(Call::SetUniformVec4(location.0.clone(), value));
    }

    fn draw_arrays(&mut self, topology: Topology, count: u32) {
        self.calls.push(Call::DrawArrays(topology, count));
    }
}
