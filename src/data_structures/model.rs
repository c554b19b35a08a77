//! GPU meshes backing template graphics.

use std::{any::Any, cell::Cell};

use wgpu::util::DeviceExt;

use crate::graphic::RenderGraphic;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MarkerVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for MarkerVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MarkerVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[derive(Debug)]
pub struct GpuMesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

impl GpuMesh {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        vertices: &[MarkerVertex],
        indices: &[u32],
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", name)),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", name)),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
        }
    }
}

/// An uploaded asset that placed graphics are instanced from.
///
/// Templates are shared by every graphic placed from them. Replacing the
/// template of a decorator only drops the decorator's reference; the buffers
/// live as long as any placed graphic still points at them.
#[derive(Debug)]
pub struct GpuTemplate {
    name: String,
    meshes: Vec<GpuMesh>,
    disposed: Cell<bool>,
}

impl GpuTemplate {
    pub fn new(name: &str, meshes: Vec<GpuMesh>) -> Self {
        Self {
            name: name.to_string(),
            meshes,
            disposed: Cell::new(false),
        }
    }

    /// Upload a single mesh template from raw vertex and index data.
    pub fn from_vertices(
        device: &wgpu::Device,
        name: &str,
        vertices: &[MarkerVertex],
        indices: &[u32],
    ) -> Self {
        let mesh = GpuMesh::new(device, name, vertices, indices);
        Self::new(name, vec![mesh])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meshes(&self) -> &[GpuMesh] {
        &self.meshes
    }
}

impl RenderGraphic for GpuTemplate {
    /// Destroys the mesh buffers. Only do this once nothing is instanced from
    /// the template anymore; placed graphics skip disposed templates.
    fn dispose(&self) -> anyhow::Result<()> {
        if !self.disposed.replace(true) {
            for mesh in &self.meshes {
                mesh.vertex_buffer.destroy();
                mesh.index_buffer.destroy();
            }
        }
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
