//! wgpu implementation of the graphics-context capability.
//!
//! - `context` owns instance/device/surface wiring and reconfigures the
//!   swapchain on resize.
//! - `pipeline` turns a linked program into uniform buffers, a bind group and
//!   a render pipeline.
//!
//! Compilation runs the naga GLSL frontend first so diagnostics come back as
//! text, then hands the same source to wgpu. Linking reconciles uniform
//! blocks across stages; validation creates the render pipeline inside a
//! validation error scope. Uniform writes and draws are applied immediately,
//! one submission per draw, against the frame opened by
//! [`WgpuContext::begin_frame`].

mod context;
mod pipeline;

use std::borrow::Cow;
use std::sync::Arc;

use anyhow::Result;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::backend::{GraphicsContext, ShaderBackend};
use crate::reflect::{self, LinkedUniforms, StageReflection, UniformKind, UniformSlot};
use crate::types::{StageKind, Topology, Viewport};

use self::context::GpuContext;
use self::pipeline::{create_program_pipeline, fan_indices, ProgramPipeline, VERTEX_STRIDE};

/// Vertices a single vertex buffer can hold.
const VERTEX_CAPACITY: u64 = 64;

const CLEAR_COLOR: wgpu::Color = wgpu::Color::BLACK;

pub struct WgpuShader {
    kind: StageKind,
    source: String,
    compiled: Option<(wgpu::ShaderModule, StageReflection)>,
    log: String,
}

pub struct WgpuProgram {
    label: String,
    stages: Vec<(wgpu::ShaderModule, StageReflection)>,
    uniforms: Option<LinkedUniforms>,
    pipeline: Option<ProgramPipeline>,
    log: String,
}

impl WgpuProgram {
    fn module(&self, kind: StageKind) -> Option<&wgpu::ShaderModule> {
        self.stages
            .iter()
            .find(|(_, reflection)| reflection.kind == kind)
            .map(|(module, _)| module)
    }
}

#[derive(Clone)]
pub struct VertexBuffer {
    buffer: wgpu::Buffer,
}

struct Frame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

struct BoundVertices {
    buffer: wgpu::Buffer,
    count: u32,
}

pub struct WgpuContext {
    gpu: GpuContext,
    index_buffer: wgpu::Buffer,
    bound_program: Option<ProgramPipeline>,
    bound_vertices: Option<BoundVertices>,
    frame: Option<Frame>,
}

impl WgpuContext {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let gpu = GpuContext::new(window)?;
        let index_buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fan index buffer"),
            size: fan_indices(VERTEX_CAPACITY as u32).len() as u64 * 4,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            gpu,
            index_buffer,
            bound_program: None,
            bound_vertices: None,
            frame: None,
        })
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.gpu.size.width, self.gpu.size.height)
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    /// Acquires the next swapchain texture and clears it.
    pub fn begin_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let texture = self.gpu.surface.get_current_texture()?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("clear encoder"),
            });
        {
            let _pass = begin_pass(&mut encoder, &view, wgpu::LoadOp::Clear(CLEAR_COLOR));
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));

        self.frame = Some(Frame { texture, view });
        Ok(())
    }

    /// Presents the frame opened by [`WgpuContext::begin_frame`].
    pub fn end_frame(&mut self) {
        if let Some(frame) = self.frame.take() {
            frame.texture.present();
        }
    }

    fn write_uniform(&self, location: &UniformSlot, expected: UniformKind, bytes: &[u8]) {
        if location.kind != expected {
            tracing::debug!(?location, ?expected, "uniform type mismatch; ignoring write");
            return;
        }
        let Some(program) = self.bound_program.as_ref() else {
            tracing::warn!("uniform written with no program bound");
            return;
        };
        let Some(buffer) = program.uniform_buffer(location.binding) else {
            tracing::debug!(binding = location.binding, "bound program has no uniform buffer at binding");
            return;
        };
        self.gpu.queue.write_buffer(buffer, location.offset, bytes);
    }
}

fn begin_pass<'encoder>(
    encoder: &'encoder mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    load: wgpu::LoadOp<wgpu::Color>,
) -> wgpu::RenderPass<'encoder> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("shadercycle pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            depth_slice: None,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    })
}

impl ShaderBackend for WgpuContext {
    type Shader = WgpuShader;
    type Program = WgpuProgram;
    type UniformLocation = UniformSlot;

    fn create_shader(&mut self, kind: StageKind, source: &str) -> WgpuShader {
        WgpuShader {
            kind,
            source: source.to_string(),
            compiled: None,
            log: String::new(),
        }
    }

    fn compile_shader(&mut self, shader: &mut WgpuShader) -> bool {
        shader.compiled = None;
        let reflection = match reflect::parse_stage(shader.kind, &shader.source) {
            Ok(reflection) => reflection,
            Err(log) => {
                shader.log = log;
                return false;
            }
        };

        let device = &self.gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} stage", shader.kind)),
            source: wgpu::ShaderSource::Glsl {
                shader: Cow::Owned(shader.source.clone()),
                stage: shader.kind.naga_stage(),
                defines: &[],
            },
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            shader.log = error.to_string();
            return false;
        }

        shader.log.clear();
        shader.compiled = Some((module, reflection));
        true
    }

    fn shader_info_log(&self, shader: &WgpuShader) -> String {
        shader.log.clone()
    }

    fn delete_shader(&mut self, _shader: WgpuShader) {}

    fn create_program(&mut self, label: &str) -> WgpuProgram {
        WgpuProgram {
            label: label.to_string(),
            stages: Vec::new(),
            uniforms: None,
            pipeline: None,
            log: String::new(),
        }
    }

    fn attach_shader(&mut self, program: &mut WgpuProgram, shader: &WgpuShader) {
        match &shader.compiled {
            Some((module, reflection)) => program.stages.push((module.clone(), reflection.clone())),
            None => tracing::warn!(stage = %shader.kind, "ignoring uncompiled shader attachment"),
        }
    }

    fn link_program(&mut self, program: &mut WgpuProgram) -> bool {
        program.uniforms = None;
        match reflect::link_stages(program.stages.iter().map(|(_, reflection)| reflection)) {
            Ok(uniforms) => {
                program.uniforms = Some(uniforms);
                program.log.clear();
                true
            }
            Err(log) => {
                program.log = log;
                false
            }
        }
    }

    fn validate_program(&mut self, program: &mut WgpuProgram) -> bool {
        let (Some(uniforms), Some(vertex), Some(fragment)) = (
            program.uniforms.as_ref(),
            program.module(StageKind::Vertex),
            program.module(StageKind::Fragment),
        ) else {
            program.log = "program has not been linked".to_string();
            return false;
        };

        let device = &self.gpu.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = create_program_pipeline(
            device,
            self.gpu.surface_format(),
            &program.label,
            vertex,
            fragment,
            uniforms,
        );
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            pipeline.destroy();
            program.log = error.to_string();
            return false;
        }

        program.pipeline = Some(pipeline);
        true
    }

    fn program_info_log(&self, program: &WgpuProgram) -> String {
        program.log.clone()
    }

    fn delete_program(&mut self, program: WgpuProgram) {
        if let Some(pipeline) = program.pipeline {
            pipeline.destroy();
        }
    }

    fn uniform_location(&self, program: &WgpuProgram, name: &str) -> Option<UniformSlot> {
        program.uniforms.as_ref()?.slot(name)
    }
}

impl GraphicsContext for WgpuContext {
    type Buffer = VertexBuffer;

    fn create_vertex_buffer(&mut self) -> VertexBuffer {
        let buffer = self.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("vertex buffer"),
            size: VERTEX_CAPACITY * VERTEX_STRIDE,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        VertexBuffer { buffer }
    }

    fn delete_buffer(&mut self, buffer: VertexBuffer) {
        self.bound_vertices = None;
        buffer.buffer.destroy();
    }

    fn use_program(&mut self, program: &WgpuProgram) {
        if program.pipeline.is_none() {
            tracing::warn!(program = %program.label, "program used before validation");
        }
        self.bound_program = program.pipeline.clone();
    }

    fn upload_vertices(&mut self, buffer: &VertexBuffer, vertices: &[[f32; 2]]) {
        let capacity = VERTEX_CAPACITY as usize;
        let vertices = if vertices.len() > capacity {
            tracing::warn!(
                requested = vertices.len(),
                capacity,
                "vertex upload exceeds buffer capacity; truncating"
            );
            &vertices[..capacity]
        } else {
            vertices
        };
        if !vertices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&buffer.buffer, 0, bytemuck::cast_slice(vertices));
        }
        self.bound_vertices = Some(BoundVertices {
            buffer: buffer.buffer.clone(),
            count: vertices.len() as u32,
        });
    }

    fn set_uniform_vec2(&mut self, location: &UniformSlot, value: [f32; 2]) {
        self.write_uniform(location, UniformKind::Vec2, bytemuck::cast_slice(&value));
    }

    fn set_uniform_vec4(&mut self, location: &UniformSlot, value: [f32; 4]) {
        self.write_uniform(location, UniformKind::Vec4, bytemuck::cast_slice(&value));
    }

    fn draw_arrays(&mut self, topology: Topology, count: u32) {
        let (Some(frame), Some(program), Some(vertices)) = (
            self.frame.as_ref(),
            self.bound_program.as_ref(),
            self.bound_vertices.as_ref(),
        ) else {
            tracing::warn!("draw issued without an open frame, bound program and vertex buffer");
            return;
        };
        let count = count.min(vertices.count);
        if count == 0 {
            return;
        }

        let indices = match topology {
            Topology::Triangles => None,
            Topology::TriangleFan => {
                let indices = fan_indices(count);
                if indices.is_empty() {
                    return;
                }
                self.gpu
                    .queue
                    .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&indices));
                Some(indices.len() as u32)
            }
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("draw encoder"),
            });
        {
            let mut pass = begin_pass(&mut encoder, &frame.view, wgpu::LoadOp::Load);
            pass.set_pipeline(&program.pipeline);
            if let Some(bind_group) = program.bind_group.as_ref() {
                pass.set_bind_group(0, bind_group, &[]);
            }
            pass.set_vertex_buffer(0, vertices.buffer.slice(..u64::from(count) * VERTEX_STRIDE));
            match indices {
                None => pass.draw(0..count, 0..1),
                Some(index_count) => {
                    pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..index_count, 0, 0..1);
                }
            }
        }
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
    }
}
