//! Graphics-context capability consumed by the program pipeline and the frame renderer.
//!
//! The traits follow the create / compile / query-status shape of classic
//! shader APIs so the pipeline can report every step explicitly:
//! - [`ShaderBackend`] covers shader and program objects and is all that the
//!   offline `--check` path needs.
//! - [`GraphicsContext`] adds vertex buffers, uniform writes and draws.

use crate::types::{StageKind, Topology};

/// Shader and program object management.
pub trait ShaderBackend {
    type Shader;
    type Program;
    type UniformLocation;

    fn create_shader(&mut self, kind: StageKind, source: &str) -> Self::Shader;
    /// Compiles `shader`, returning its compile status.
    fn compile_shader(&mut self, shader: &mut Self::Shader) -> bool;
    fn shader_info_log(&self, shader: &Self::Shader) -> String;
    fn delete_shader(&mut self, shader: Self::Shader);

    fn create_program(&mut self, label: &str) -> Self::Program;
    fn attach_shader(&mut self, program: &mut Self::Program, shader: &Self::Shader);
    /// Links every attached stage, returning the link status.
    fn link_program(&mut self, program: &mut Self::Program) -> bool;
    /// Checks that a linked program can execute against this context, returning the validate status.
    fn validate_program(&mut self, program: &mut Self::Program) -> bool;
    fn program_info_log(&self, program: &Self::Program) -> String;
    fn delete_program(&mut self, program: Self::Program);

    /// Resolves a uniform by name; `None` when the linked program has no such uniform.
    fn uniform_location(&self, program: &Self::Program, name: &str) -> Option<Self::UniformLocation>;
}

/// Drawing on top of [`ShaderBackend`].
///
/// Uniform writes and draws target the program most recently passed to
/// [`GraphicsContext::use_program`]; draws read the buffer most recently
/// passed to [`GraphicsContext::upload_vertices`].
pub trait GraphicsContext: ShaderBackend {
    type Buffer;

    fn create_vertex_buffer(&mut self) -> Self::Buffer;
    fn delete_buffer(&mut self, buffer: Self::Buffer);

    fn use_program(&mut self, program: &Self::Program);
    /// Binds `buffer` and replaces its whole contents with `vertices`.
    fn upload_vertices(&mut self, buffer: &Self::Buffer, vertices: &[[f32; 2]]);
    fn set_uniform_vec2(&mut self, location: &Self::UniformLocation, value: [f32; 2]);
    fn set_uniform_vec4(&mut self, location: &Self::UniformLocation, value: [f32; 4]);
    fn draw_arrays(&mut self, topology: Topology, count: u32);
}
