//! Loading template graphics from binary glTF assets.
//!
//! Assets are resolved by name: `Streetlights` becomes `assets/Streetlights.glb`
//! natively and `<origin>/assets/Streetlights.glb` on the web. Loading failures
//! are returned as errors by [`AssetLoader`] implementations and turned into
//! "no template" by [`create_gltf_graphic`].

use std::{future::Future, rc::Rc};

use anyhow::{Context as _, bail};
use cgmath::{InnerSpace, Matrix, SquareMatrix};

use crate::{
    data_structures::model::{GpuMesh, GpuTemplate, MarkerVertex},
    graphic::GraphicRef,
};

/// Produces template graphics from a logical asset name.
pub trait AssetLoader {
    fn load_template(&self, name: &str) -> impl Future<Output = anyhow::Result<GraphicRef>>;
}

/// Load a template and log instead of failing.
///
/// A missing or broken asset simply means there is no template; callers keep
/// whatever template they had.
pub async fn create_gltf_graphic<L: AssetLoader>(loader: &L, name: &str) -> Option<GraphicRef> {
    match loader.load_template(name).await {
        Ok(graphic) => {
            log::info!("Loaded template graphic {}", name);
            Some(graphic)
        }
        Err(e) => {
            log::error!("Error occurred while loading template {}: {:#}", name, e);
            None
        }
    }
}

/// [`AssetLoader`] for `.glb` files, uploading every mesh to the GPU.
pub struct GltfLoader {
    device: wgpu::Device,
}

impl GltfLoader {
    pub fn new(device: wgpu::Device) -> Self {
        Self { device }
    }
}

impl AssetLoader for GltfLoader {
    async fn load_template(&self, name: &str) -> anyhow::Result<GraphicRef> {
        let file_name = format!("{}.glb", name);
        let bytes = load_binary(&file_name)
            .await
            .with_context(|| format!("could not read {}", file_name))?;
        let meshes = read_glb_meshes(&bytes).await?;
        if meshes.is_empty() {
            bail!("{} contains no triangle meshes", file_name);
        }
        let meshes = meshes
            .iter()
            .map(|mesh| GpuMesh::new(&self.device, &mesh.name, &mesh.vertices, &mesh.indices))
            .collect();
        Ok(Rc::new(GpuTemplate::new(name, meshes)))
    }
}

/// CPU side mesh data read from a glTF asset, with node transforms baked in.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<MarkerVertex>,
    pub indices: Vec<u32>,
}

/// Read every mesh primitive of the default scene (or all scenes if there is
/// none) into world space vertex data.
pub async fn read_glb_meshes(bytes: &[u8]) -> anyhow::Result<Vec<MeshData>> {
    let gltf = gltf::Gltf::from_slice(bytes)?;

    // Load buffers, external ones concurrently
    let buffer_data = futures::future::join_all(gltf.buffers().map(|buffer| {
        let blob = gltf.blob.as_deref();
        async move {
            match buffer.source() {
                gltf::buffer::Source::Bin => match blob {
                    Some(blob) => Ok(blob.to_vec()),
                    None => bail!("buffer {} refers to a missing binary chunk", buffer.index()),
                },
                gltf::buffer::Source::Uri(uri) => load_binary(uri).await,
            }
        }
    }))
    .await
    .into_iter()
    .collect::<anyhow::Result<Vec<Vec<u8>>>>()?;

    let mut meshes = Vec::new();
    let identity = cgmath::Matrix4::identity();
    match gltf.default_scene() {
        Some(scene) => scene
            .nodes()
            .for_each(|node| collect_meshes(&node, identity, &buffer_data, &mut meshes)),
        None => gltf.scenes().for_each(|scene| {
            scene
                .nodes()
                .for_each(|node| collect_meshes(&node, identity, &buffer_data, &mut meshes))
        }),
    }
    Ok(meshes)
}

fn collect_meshes(
    node: &gltf::Node,
    parent: cgmath::Matrix4<f32>,
    buffers: &[Vec<u8>],
    out: &mut Vec<MeshData>,
) {
    let world = parent * cgmath::Matrix4::from(node.transform().matrix());
    let linear = cgmath::Matrix3::from_cols(
        world.x.truncate(),
        world.y.truncate(),
        world.z.truncate(),
    );
    let normal_matrix = linear
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or(linear);

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("unknown_mesh");
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of mesh {}: only triangle lists are supported.",
                    primitive.index(),
                    mesh_name
                );
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

            let mut vertices = Vec::new();
            if let Some(positions) = reader.read_positions() {
                positions.for_each(|position| {
                    let world_position =
                        world * cgmath::Vector4::new(position[0], position[1], position[2], 1.0);
                    vertices.push(MarkerVertex {
                        position: world_position.truncate().into(),
                        // Faces +Z until a normal is read below
                        normal: [0.0, 0.0, 1.0],
                    })
                });
            }
            if let Some(normals) = reader.read_normals() {
                vertices.iter_mut().zip(normals).for_each(|(vertex, normal)| {
                    let normal = normal_matrix * cgmath::Vector3::from(normal);
                    if normal.magnitude2() > 0.0 {
                        vertex.normal = normal.normalize().into();
                    }
                });
            }
            if vertices.is_empty() {
                continue;
            }

            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect::<Vec<u32>>(),
                None => (0..vertices.len() as u32).collect(),
            };

            out.push(MeshData {
                name: format!("{} #{}", mesh_name, primitive.index()),
                vertices,
                indices,
            });
        }
    }

    for child in node.children() {
        collect_meshes(&child, world, buffers, out);
    }
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no browser window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("could not read page origin: {:?}", e))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read_to_string(path).await?
    };

    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(path).await?
    };

    Ok(data)
}
