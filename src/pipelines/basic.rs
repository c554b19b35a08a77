use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{MarkerVertex, Vertex},
    },
    graphic::RenderGraphic,
    render::{Decorations, GraphicType},
};

/// Camera and light data shared by every scene decoration of a frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    light_position: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    light_color: [f32; 3],
    _padding2: u32,
}

impl SceneUniform {
    pub fn new(view_proj: cgmath::Matrix4<f32>) -> Self {
        Self {
            view_proj: view_proj.into(),
            light_position: [8.0, 80.0, 50.0],
            _padding: 0,
            light_color: [1.0, 1.0, 1.0],
            _padding2: 0,
        }
    }

    pub fn with_light(mut self, position: [f32; 3], color: [f32; 3]) -> Self {
        self.light_position = position;
        self.light_color = color;
        self
    }
}

/// Draws the `Scene` category of a frame's [`Decorations`].
///
/// The host owns the render pass (and its colour/depth targets); this pipeline
/// only needs the view-projection matrix of the viewport being drawn.
pub struct DecorationPipeline {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl DecorationPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let uniform = SceneUniform::new(cgmath::SquareMatrix::identity());
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Decoration Uniform Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("scene_decoration_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("scene_decoration_bind_group"),
        });

        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene Decoration Pipeline Layout"),
                bind_group_layouts: &[Some(&bind_group_layout)],
                immediate_size: 0,
            });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Decoration Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("decoration_shader.wgsl").into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Scene Decoration Pipeline"),
            layout: Some(&render_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[MarkerVertex::desc(), InstanceRaw::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                // Marker assets are often single sided
                cull_mode: None,
                ..Default::default()
            },
            // Decorations share the host's depth buffer so scene geometry can hide them
            depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: Some(true),
                depth_compare: Some(wgpu::CompareFunction::LessEqual),
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
        }
    }

    pub fn update_uniform(&self, queue: &wgpu::Queue, uniform: SceneUniform) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    /// Record the scene decorations into `render_pass`. Returns the number of
    /// graphics that produced at least one draw.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, decorations: &Decorations) -> usize {
        let mut drawn = 0;
        let mut bound = false;
        for graphic in decorations.get(GraphicType::Scene) {
            if graphic.is_disposed() {
                log::warn!("Skipping a disposed scene decoration.");
                continue;
            }
            let mut draws = Vec::new();
            graphic.collect_instanced(&mut draws);
            let mut produced_draw = false;
            for instanced in draws {
                if instanced.amount == 0 || instanced.instance.size() == 0 {
                    log::warn!("Tried to draw a decoration with zero instances");
                    continue;
                }
                if !bound {
                    render_pass.set_pipeline(&self.pipeline);
                    render_pass.set_bind_group(0, &self.bind_group, &[]);
                    bound = true;
                }
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                for mesh in instanced.meshes {
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.num_elements, 0, 0..instanced.amount as u32);
                }
                produced_draw = true;
            }
            if produced_draw {
                drawn += 1;
            }
        }
        drawn
    }
}
