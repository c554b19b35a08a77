use std::{any::Any, cell::Cell, rc::Rc};

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        model::GpuTemplate,
        scene_graph::GraphicBranch,
    },
    graphic::{GraphicRef, RenderGraphic, RenderSystem},
    render::Instanced,
};

/// GPU device and queue used to create decoration graphics.
///
/// Hosts that already own a device build a [`GpuRenderSystem`] from it
/// directly; `Context` is for setups without a window, such as tests.
#[derive(Debug)]
pub struct Context {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl Context {
    pub async fn new_headless() -> anyhow::Result<Self> {
        // The instance is a handle to our GPU
        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Decoration Device"),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await?;

        Ok(Self { device, queue })
    }
}

/// [`RenderSystem`] that places templates as GPU instance buffers.
pub struct GpuRenderSystem {
    device: wgpu::Device,
}

impl GpuRenderSystem {
    pub fn new(device: wgpu::Device) -> Self {
        Self { device }
    }
}

impl From<&Context> for GpuRenderSystem {
    fn from(ctx: &Context) -> Self {
        // Cloning only bumps the device's internal reference count
        Self::new(ctx.device.clone())
    }
}

impl RenderSystem for GpuRenderSystem {
    fn create_graphic_branch(
        &mut self,
        branch: &GraphicBranch,
        transform: &Instance,
    ) -> Option<GraphicRef> {
        if branch.is_empty() {
            return None;
        }
        let instance_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Instance Buffer", branch.name())),
                contents: bytemuck::cast_slice(&[transform.to_raw()]),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        Some(Rc::new(GpuBranchGraphic {
            entries: branch.entries().to_vec(),
            transform: transform.clone(),
            instance_buffer,
            disposed: Cell::new(false),
        }))
    }
}

/// A branch placed at one transform. Owns its instance buffer and shares the
/// template meshes of the branch it was created from.
#[derive(Debug)]
pub struct GpuBranchGraphic {
    entries: Vec<GraphicRef>,
    transform: Instance,
    instance_buffer: wgpu::Buffer,
    disposed: Cell<bool>,
}

impl GpuBranchGraphic {
    pub fn transform(&self) -> &Instance {
        &self.transform
    }
}

impl RenderGraphic for GpuBranchGraphic {
    fn dispose(&self) -> anyhow::Result<()> {
        if !self.disposed.replace(true) {
            self.instance_buffer.destroy();
        }
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    fn collect_instanced<'a>(&'a self, out: &mut Vec<Instanced<'a>>) {
        if self.is_disposed() {
            return;
        }
        for entry in &self.entries {
            if entry.is_disposed() {
                continue;
            }
            match entry.as_any().downcast_ref::<GpuTemplate>() {
                Some(template) => out.push(Instanced {
                    instance: &self.instance_buffer,
                    meshes: template.meshes(),
                    amount: 1,
                }),
                None => log::warn!("Branch entry {:?} is not a GPU template and is skipped.", entry),
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
