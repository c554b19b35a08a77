//! The decorator contract between the host engine and everything that injects
//! draws into its frames.

use std::{
    cell::RefCell,
    rc::Rc,
    sync::atomic::{AtomicU32, Ordering},
};

use crate::{
    graphic::GraphicRef,
    render::{Decorations, GraphicType},
    view_manager::Viewport,
};

static NEXT_DECORATOR_ID: AtomicU32 = AtomicU32::new(1);

/// Stable identity of a decorator inside the host's registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecoratorId(u32);

impl DecoratorId {
    pub fn next() -> Self {
        Self(NEXT_DECORATOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Per-viewport, per-frame sink for decorations.
pub struct DecorateContext<'v> {
    viewport: &'v Viewport,
    decorations: Decorations,
}

impl<'v> DecorateContext<'v> {
    pub fn new(viewport: &'v Viewport) -> Self {
        Self {
            viewport,
            decorations: Decorations::default(),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        self.viewport
    }

    pub fn add_decoration(&mut self, graphic_type: GraphicType, graphic: GraphicRef) {
        self.decorations.add(graphic_type, graphic);
    }

    pub fn into_decorations(self) -> Decorations {
        self.decorations
    }
}

/// Something the host asks for decorations once per viewport and frame.
pub trait Decorator {
    fn id(&self) -> DecoratorId;

    /// Add this frame's decorations for `ctx.viewport()`.
    fn decorate(&self, ctx: &mut DecorateContext<'_>);

    /// Whether the host may reuse this decorator's output across frames until
    /// it is explicitly invalidated.
    fn use_cached_decorations(&self) -> bool {
        false
    }
}

pub type DecoratorRef = Rc<RefCell<dyn Decorator>>;
