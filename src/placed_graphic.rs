//! The placed graphic decorator: one template, many placements.
//!
//! [`PlacedGraphicDecorator`] keeps a single template graphic wrapped in a
//! [`GraphicBranch`] and turns every placement request into a positioned
//! graphic it owns until it is cleared. The owned graphics are handed to the
//! host as scene decorations of spatial views.
//!
//! All operations are best effort. Placing without a template does nothing
//! and reports `false` instead of failing, since callers usually run inside
//! the host's frame or event loop.

use crate::{
    data_structures::{instance::Instance, scene_graph::GraphicBranch},
    decorator::{DecorateContext, Decorator, DecoratorId},
    graphic::{GraphicOwner, GraphicRef, RenderSystem},
    render::GraphicType,
    view_manager::DecoratorHost,
};

const BRANCH_NAME: &str = "Placed graphic";

pub struct PlacedGraphicDecorator {
    id: DecoratorId,
    original_graphic: Option<GraphicRef>,
    branch: Option<GraphicBranch>,
    placed_graphics: Vec<GraphicOwner>,
}

impl PlacedGraphicDecorator {
    pub fn new() -> Self {
        Self {
            id: DecoratorId::next(),
            original_graphic: None,
            branch: None,
            placed_graphics: Vec::new(),
        }
    }

    /// Use `graphic` as the template for all following placements.
    ///
    /// Builds a fresh branch around it. Graphics placed from the previous
    /// template stay where they are.
    pub fn change_placed_graphic(&mut self, graphic: GraphicRef) {
        let mut branch = GraphicBranch::new(BRANCH_NAME);
        branch.add(graphic.clone());
        self.original_graphic = Some(graphic);
        self.branch = Some(branch);
    }

    /// Place the current template at `transform` and keep the result until it
    /// is cleared.
    ///
    /// Returns `false` without side effects if no template was set or the
    /// render system produced nothing.
    pub fn add_placed_graphic(
        &mut self,
        render_system: &mut dyn RenderSystem,
        host: &mut dyn DecoratorHost,
        transform: &Instance,
    ) -> bool {
        // An emptied branch would otherwise block every further placement.
        if self.branch.as_ref().is_some_and(GraphicBranch::is_empty) {
            if let Some(graphic) = self.original_graphic.clone() {
                log::debug!("Graphic branch was emptied, rebuilding it from the template.");
                self.change_placed_graphic(graphic);
            }
        }
        let Some(branch) = &self.branch else {
            log::debug!("No template graphic set, ignoring placement at {:?}", transform.position);
            return false;
        };
        let Some(graphic) = render_system.create_graphic_branch(branch, transform) else {
            log::debug!("Render system produced no graphic for placement at {:?}", transform.position);
            return false;
        };
        self.placed_graphics.push(GraphicOwner::new(graphic));
        host.invalidate_cached_decorations(self.id);
        true
    }

    /// Release every placed graphic and make the host redraw without them.
    pub fn clear_graphics(&mut self, host: &mut dyn DecoratorHost) {
        for mut owner in self.placed_graphics.drain(..) {
            owner.dispose_graphic();
        }
        host.invalidate_cached_decorations(self.id);
    }

    /// Release every placed graphic and unregister from the host.
    pub fn drop_decorator(&mut self, host: &mut dyn DecoratorHost) {
        self.clear_graphics(host);
        if host.drop_decorator(self.id) {
            log::info!("Placed graphic decorator {:?} dropped.", self.id);
        }
    }

    pub fn original_graphic(&self) -> Option<&GraphicRef> {
        self.original_graphic.as_ref()
    }

    pub fn branch(&self) -> Option<&GraphicBranch> {
        self.branch.as_ref()
    }

    /// Mutable access to the branch, e.g. for hosts that empty it when their
    /// graphics are invalidated. An emptied branch is rebuilt on the next placement.
    pub fn branch_mut(&mut self) -> Option<&mut GraphicBranch> {
        self.branch.as_mut()
    }

    /// The placed graphics in placement order.
    pub fn placed_graphics(&self) -> impl Iterator<Item = &GraphicRef> + '_ {
        self.placed_graphics.iter().map(GraphicOwner::graphic)
    }

    pub fn len(&self) -> usize {
        self.placed_graphics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed_graphics.is_empty()
    }
}

impl Default for PlacedGraphicDecorator {
    fn default() -> Self {
        Self::new()
    }
}

impl Decorator for PlacedGraphicDecorator {
    fn id(&self) -> DecoratorId {
        self.id
    }

    fn decorate(&self, ctx: &mut DecorateContext<'_>) {
        // Placements are in world coordinates, only spatial views can show them
        if !ctx.viewport().is_spatial_view() {
            return;
        }
        // Scene graphics are lit and styled like the rest of the view
        for owner in &self.placed_graphics {
            ctx.add_decoration(GraphicType::Scene, owner.graphic().clone());
        }
    }

    /// Placed graphics only change through this decorator, which invalidates
    /// the cache itself.
    fn use_cached_decorations(&self) -> bool {
        true
    }
}
