use crate::reflect::LinkedUniforms;

/// Bytes per vertex: one `vec2` position at location 0.
pub(crate) const VERTEX_STRIDE: u64 = std::mem::size_of::<[f32; 2]>() as u64;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

/// GPU objects backing a validated program.
///
/// Cloning shares the underlying wgpu handles.
#[derive(Clone)]
pub(crate) struct ProgramPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group: Option<wgpu::BindGroup>,
    pub uniform_buffers: Vec<(u32, wgpu::Buffer)>,
}

impl ProgramPipeline {
    pub fn uniform_buffer(&self, binding: u32) -> Option<&wgpu::Buffer> {
        self.uniform_buffers
            .iter()
            .find(|(candidate, _)| *candidate == binding)
            .map(|(_, buffer)| buffer)
    }

    pub fn destroy(&self) {
        for (_, buffer) in &self.uniform_buffers {
            buffer.destroy();
        }
    }
}

/// Builds the uniform buffers, bind group and render pipeline for a linked program.
///
/// Every draw goes through a triangle list; fans are expanded by the caller.
pub(crate) fn create_program_pipeline(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    label: &str,
    vertex_module: &wgpu::ShaderModule,
    fragment_module: &wgpu::ShaderModule,
    uniforms: &LinkedUniforms,
) -> ProgramPipeline {
    let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = uniforms
        .blocks
        .iter()
        .map(|block| wgpu::BindGroupLayoutEntry {
            binding: block.binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        })
        .collect();

    let uniform_buffers: Vec<(u32, wgpu::Buffer)> = uniforms
        .blocks
        .iter()
        .map(|block| {
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{label} {} uniforms", block.name)),
                size: block.size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            (block.binding, buffer)
        })
        .collect();

    let (bind_group_layout, bind_group) = if uniform_buffers.is_empty() {
        (None, None)
    } else {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} uniform layout")),
            entries: &layout_entries,
        });
        let entries: Vec<wgpu::BindGroupEntry> = uniform_buffers
            .iter()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} uniform bind group")),
            layout: &layout,
            entries: &entries,
        });
        (Some(layout), Some(group))
    };

    let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} pipeline layout")),
        bind_group_layouts: &bind_group_layouts,
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: vertex_module,
            entry_point: Some("main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: VERTEX_STRIDE,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &VERTEX_ATTRIBUTES,
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview: None,
        cache: None,
    });

    ProgramPipeline {
        pipeline,
        bind_group,
        uniform_buffers,
    }
}

/// Index list turning a fan of `count` vertices into a triangle list.
pub(crate) fn fan_indices(count: u32) -> Vec<u32> {
    (1..count.saturating_sub(1))
        .flat_map(|i| [0, i, i + 1])
        .collect()
}
