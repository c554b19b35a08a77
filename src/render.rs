//! Decoration lists and their batching for the GPU.
//!
//! Decorators add graphics to a [`Decorations`] value, sorted by
//! [`GraphicType`]. The host composes the lists of all decorators for a
//! viewport and turns each category into [`Instanced`] draws for the matching
//! pipeline.
//!
//! # Key types
//!
//! - [`GraphicType`] is the draw category of a decoration
//! - [`Decorations`] holds one list of graphics per category
//! - [`Instanced`] is one instanced draw (meshes + instance buffer)

use crate::{data_structures::model::GpuMesh, graphic::GraphicRef};

/// The category a decoration is drawn in.
///
/// - `ViewBackground` is drawn behind everything in view coordinates
/// - `Scene` participates in lighting and the view's display style like regular geometry
/// - `WorldDecoration` is drawn in world coordinates without lighting
/// - `WorldOverlay` is drawn in world coordinates on top of the scene
/// - `ViewOverlay` is drawn in view coordinates on top of everything
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GraphicType {
    ViewBackground,
    Scene,
    WorldDecoration,
    WorldOverlay,
    ViewOverlay,
}

/// Data for one instanced draw: the meshes of a template and the instance
/// buffer holding its placements.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub meshes: &'a [GpuMesh],
    pub amount: usize,
}

/// All decorations produced for one viewport, per category, in submission order.
#[derive(Clone, Debug, Default)]
pub struct Decorations {
    view_background: Vec<GraphicRef>,
    scene: Vec<GraphicRef>,
    world_decorations: Vec<GraphicRef>,
    world_overlays: Vec<GraphicRef>,
    view_overlays: Vec<GraphicRef>,
}

impl Decorations {
    pub fn add(&mut self, graphic_type: GraphicType, graphic: GraphicRef) {
        self.list_mut(graphic_type).push(graphic);
    }

    pub fn get(&self, graphic_type: GraphicType) -> &[GraphicRef] {
        match graphic_type {
            GraphicType::ViewBackground => &self.view_background,
            GraphicType::Scene => &self.scene,
            GraphicType::WorldDecoration => &self.world_decorations,
            GraphicType::WorldOverlay => &self.world_overlays,
            GraphicType::ViewOverlay => &self.view_overlays,
        }
    }

    fn list_mut(&mut self, graphic_type: GraphicType) -> &mut Vec<GraphicRef> {
        match graphic_type {
            GraphicType::ViewBackground => &mut self.view_background,
            GraphicType::Scene => &mut self.scene,
            GraphicType::WorldDecoration => &mut self.world_decorations,
            GraphicType::WorldOverlay => &mut self.world_overlays,
            GraphicType::ViewOverlay => &mut self.view_overlays,
        }
    }

    /// Append all of `other`'s lists behind ours, keeping their order.
    pub fn append(&mut self, mut other: Decorations) {
        self.view_background.append(&mut other.view_background);
        self.scene.append(&mut other.scene);
        self.world_decorations.append(&mut other.world_decorations);
        self.world_overlays.append(&mut other.world_overlays);
        self.view_overlays.append(&mut other.view_overlays);
    }

    pub fn len(&self) -> usize {
        self.view_background.len()
            + self.scene.len()
            + self.world_decorations.len()
            + self.world_overlays.len()
            + self.view_overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Batch one category into instanced draws.
    ///
    /// Disposed graphics are skipped: a stale cache must never put released
    /// GPU memory into a render pass.
    pub fn instanced(&self, graphic_type: GraphicType) -> Vec<Instanced<'_>> {
        let mut draws = Vec::new();
        for graphic in self.get(graphic_type) {
            if graphic.is_disposed() {
                log::warn!("Skipping a disposed {:?} decoration.", graphic_type);
                continue;
            }
            graphic.collect_instanced(&mut draws);
        }
        draws
    }
}
