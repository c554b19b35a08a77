//! Host side of the decoration protocol: viewports, the decorator registry
//! and cached decorations.
//!
//! A [`ViewManager`] calls every registered decorator once per viewport and
//! frame. Decorators that opt into cached decorations are only called again
//! after they invalidate their cache through [`DecoratorHost`].

use std::collections::HashMap;

use crate::{
    decorator::{DecorateContext, DecoratorId, DecoratorRef},
    render::Decorations,
};

/// The hooks a decorator needs from the engine that renders it.
pub trait DecoratorHost {
    /// Register `decorator`. Returns `false` if it was already registered.
    fn add_decorator(&mut self, decorator: DecoratorRef) -> bool;

    /// Unregister the decorator with `id`. Returns `false` if it was not registered.
    fn drop_decorator(&mut self, id: DecoratorId) -> bool;

    fn has_decorator(&self, id: DecoratorId) -> bool;

    /// Throw away cached decorations of `id` on all views.
    fn invalidate_cached_decorations(&mut self, id: DecoratorId);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewportId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKind {
    /// A 3D view of spatial models.
    Spatial,
    Drawing,
    Sheet,
}

#[derive(Clone, Debug)]
pub struct Viewport {
    id: ViewportId,
    kind: ViewKind,
}

impl Viewport {
    pub fn id(&self) -> ViewportId {
        self.id
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn is_spatial_view(&self) -> bool {
        self.kind == ViewKind::Spatial
    }
}

struct Registered {
    id: DecoratorId,
    decorator: DecoratorRef,
    cached: HashMap<ViewportId, Decorations>,
}

#[derive(Default)]
pub struct ViewManager {
    viewports: Vec<Viewport>,
    decorators: Vec<Registered>,
    next_viewport: u32,
    decorate_calls: usize,
}

impl ViewManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_viewport(&mut self, kind: ViewKind) -> ViewportId {
        let id = ViewportId(self.next_viewport);
        self.next_viewport += 1;
        self.viewports.push(Viewport { id, kind });
        id
    }

    /// Remove a viewport together with everything cached for it.
    pub fn drop_viewport(&mut self, id: ViewportId) {
        self.viewports.retain(|vp| vp.id != id);
        for registered in &mut self.decorators {
            registered.cached.remove(&id);
        }
    }

    pub fn viewports(&self) -> &[Viewport] {
        &self.viewports
    }

    pub fn decorators(&self) -> impl Iterator<Item = DecoratorId> + '_ {
        self.decorators.iter().map(|registered| registered.id)
    }

    /// How often a decorator's `decorate` was actually invoked (cache hits excluded).
    pub fn decorate_calls(&self) -> usize {
        self.decorate_calls
    }

    /// Collect the decorations of all registered decorators for one viewport.
    pub fn decorate(&mut self, viewport_id: ViewportId) -> Decorations {
        let mut decorations = Decorations::default();
        let Some(viewport) = self.viewports.iter().find(|vp| vp.id == viewport_id) else {
            log::warn!("Tried to decorate unknown viewport {:?}", viewport_id);
            return decorations;
        };
        for registered in &mut self.decorators {
            let Ok(decorator) = registered.decorator.try_borrow() else {
                log::warn!(
                    "Decorator {:?} is borrowed elsewhere and is skipped this frame.",
                    registered.id
                );
                continue;
            };
            let use_cache = decorator.use_cached_decorations();
            if use_cache {
                if let Some(cached) = registered.cached.get(&viewport.id) {
                    decorations.append(cached.clone());
                    continue;
                }
            }
            let mut ctx = DecorateContext::new(viewport);
            decorator.decorate(&mut ctx);
            self.decorate_calls += 1;
            let produced = ctx.into_decorations();
            if use_cache {
                registered.cached.insert(viewport.id, produced.clone());
            }
            decorations.append(produced);
        }
        decorations
    }

    /// Decorate every viewport, in the order they were added.
    pub fn decorate_all(&mut self) -> Vec<(ViewportId, Decorations)> {
        let ids: Vec<ViewportId> = self.viewports.iter().map(Viewport::id).collect();
        ids.into_iter()
            .map(|id| (id, self.decorate(id)))
            .collect()
    }
}

impl DecoratorHost for ViewManager {
    fn add_decorator(&mut self, decorator: DecoratorRef) -> bool {
        let id = match decorator.try_borrow() {
            Ok(decorator) => decorator.id(),
            Err(_) => {
                log::error!("Cannot register a decorator that is mutably borrowed.");
                return false;
            }
        };
        if self.has_decorator(id) {
            return false;
        }
        self.decorators.push(Registered {
            id,
            decorator,
            cached: HashMap::new(),
        });
        true
    }

    fn drop_decorator(&mut self, id: DecoratorId) -> bool {
        let before = self.decorators.len();
        self.decorators.retain(|registered| registered.id != id);
        before != self.decorators.len()
    }

    fn has_decorator(&self, id: DecoratorId) -> bool {
        self.decorators.iter().any(|registered| registered.id == id)
    }

    fn invalidate_cached_decorations(&mut self, id: DecoratorId) {
        if let Some(registered) = self.decorators.iter_mut().find(|r| r.id == id) {
            registered.cached.clear();
        }
    }
}
