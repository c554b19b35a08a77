//! Render graphics and who owns them.
//!
//! Graphics are created by a [`RenderSystem`] and handed around as reference
//! counted [`GraphicRef`]s so the host may keep them in its decoration caches.
//! GPU memory, however, has exactly one owner: the [`GraphicOwner`] that took
//! the graphic on creation. Only the owner disposes it.

use std::{any::Any, fmt::Debug, rc::Rc};

use crate::{
    data_structures::{instance::Instance, scene_graph::GraphicBranch},
    render::Instanced,
};

/// Something the host engine can draw.
///
/// Implementors release their GPU memory in [`RenderGraphic::dispose`]. Once
/// disposed a graphic must not produce any draws.
pub trait RenderGraphic: Debug {
    /// Release the GPU resources backing this graphic.
    fn dispose(&self) -> anyhow::Result<()>;

    fn is_disposed(&self) -> bool;

    /// Push the instanced draws needed to render `self`.
    ///
    /// The default produces nothing, which is right for graphics that only
    /// serve as templates.
    fn collect_instanced<'a>(&'a self, _out: &mut Vec<Instanced<'a>>) {}

    fn as_any(&self) -> &dyn Any;
}

pub type GraphicRef = Rc<dyn RenderGraphic>;

/// Creates positioned graphics from a [`GraphicBranch`].
///
/// The returned graphic is independent from `branch`: replacing or emptying
/// the branch later must not invalidate it.
pub trait RenderSystem {
    fn create_graphic_branch(
        &mut self,
        branch: &GraphicBranch,
        transform: &Instance,
    ) -> Option<GraphicRef>;
}

/// Exclusive owner of a graphic's GPU resources.
///
/// Taking ownership means taking responsibility: the graphic stays alive until
/// [`GraphicOwner::dispose_graphic`] is called. Dropping an owner that still
/// holds an unreleased graphic releases it and logs a warning.
#[derive(Debug)]
pub struct GraphicOwner {
    graphic: GraphicRef,
    released: bool,
}

impl GraphicOwner {
    pub fn new(graphic: GraphicRef) -> Self {
        Self {
            graphic,
            released: false,
        }
    }

    pub fn graphic(&self) -> &GraphicRef {
        &self.graphic
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release the owned graphic. Calling this more than once is a no-op.
    ///
    /// A failed release is logged; the owner counts as released either way so
    /// the graphic is never disposed twice.
    pub fn dispose_graphic(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.graphic.dispose() {
            log::error!("Failed to release placed graphic {:?}: {}", self.graphic, e);
        }
    }
}

impl Drop for GraphicOwner {
    fn drop(&mut self) {
        if !self.released {
            log::warn!("A placed graphic was dropped without being disposed. Releasing it now.");
            self.dispose_graphic();
        }
    }
}
