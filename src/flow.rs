//! Placement flow: the glue between asset loading, the placed graphic
//! decorator and the host's decorator registry.
//!
//! A [`PlacementFlow`] owns the application's single [`PlacedGraphicDecorator`]
//! and drives it:
//! 1. `enable_decorations` registers the decorator with the host (once)
//! 2. `populate` loads the configured template and places it at every
//!    configured coordinate
//! 3. `teardown` releases all placed graphics and unregisters
//!
//! Template loads are asynchronous and may finish after the decorator was torn
//! down. Their results go through a [`PendingPlacement`], which only holds a
//! weak reference and checks the registration before touching the decorator.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{
    config::PlacementConfig,
    data_structures::instance::Instance,
    decorator::{Decorator, DecoratorId},
    graphic::{GraphicRef, RenderSystem},
    placed_graphic::PlacedGraphicDecorator,
    resources::{AssetLoader, create_gltf_graphic},
    view_manager::DecoratorHost,
};

/// Install the platform logger. Safe to call more than once.
pub fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::log_1(&format!("Could not initialize logger: {}", e).into());
        }
    }
}

pub struct PlacementFlow {
    id: DecoratorId,
    decorator: Rc<RefCell<PlacedGraphicDecorator>>,
    config: PlacementConfig,
}

impl PlacementFlow {
    pub fn new(config: PlacementConfig) -> Self {
        let decorator = PlacedGraphicDecorator::new();
        Self {
            id: decorator.id(),
            decorator: Rc::new(RefCell::new(decorator)),
            config,
        }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn decorator(&self) -> &Rc<RefCell<PlacedGraphicDecorator>> {
        &self.decorator
    }

    pub fn decorator_id(&self) -> DecoratorId {
        self.id
    }

    /// Register the decorator with `host` unless it already is.
    pub fn enable_decorations(&self, host: &mut dyn DecoratorHost) {
        if !host.has_decorator(self.id) {
            host.add_decorator(self.decorator.clone());
        }
    }

    /// Unregister the decorator. Placed graphics are kept and show up again
    /// once decorations are re-enabled.
    pub fn disable_decorations(&self, host: &mut dyn DecoratorHost) {
        host.drop_decorator(self.id);
    }

    pub fn set_decorations_enabled(&self, host: &mut dyn DecoratorHost, enabled: bool) {
        if enabled {
            self.enable_decorations(host);
        } else {
            self.disable_decorations(host);
        }
    }

    /// Capture what is needed to apply a template load later.
    pub fn pending(&self) -> PendingPlacement {
        PendingPlacement {
            id: self.id,
            decorator: Rc::downgrade(&self.decorator),
            positions: self.config.positions().collect(),
        }
    }

    /// Load the configured template and place it at every configured
    /// coordinate, oriented by `rotation`. Returns the number of placements.
    pub async fn populate<L: AssetLoader>(
        &self,
        loader: &L,
        render_system: &mut dyn RenderSystem,
        host: &mut dyn DecoratorHost,
        rotation: cgmath::Quaternion<f32>,
    ) -> usize {
        let pending = self.pending();
        let template = create_gltf_graphic(loader, &self.config.template).await;
        pending.complete(template, render_system, host, rotation)
    }

    /// Like [`PlacementFlow::populate`], but without blocking the caller: the
    /// load runs as a local task (`spawn_local` on the web, a tokio `LocalSet`
    /// task natively) and is applied once it finishes. Loads finishing after
    /// [`PlacementFlow::teardown`] are dropped.
    pub fn spawn_populate<L, R, H>(
        &self,
        loader: L,
        render_system: Rc<RefCell<R>>,
        host: Rc<RefCell<H>>,
        rotation: cgmath::Quaternion<f32>,
    ) where
        L: AssetLoader + 'static,
        R: RenderSystem + 'static,
        H: DecoratorHost + 'static,
    {
        let pending = self.pending();
        let template_name = self.config.template.clone();
        let task = async move {
            let template = create_gltf_graphic(&loader, &template_name).await;
            let (Ok(mut render_system), Ok(mut host)) =
                (render_system.try_borrow_mut(), host.try_borrow_mut())
            else {
                log::error!("Render system or host is busy, dropping the loaded template.");
                return;
            };
            let placed = pending.complete(template, &mut *render_system, &mut *host, rotation);
            log::info!("Placed {} graphics from {}", placed, template_name);
        };

        #[cfg(not(target_arch = "wasm32"))]
        tokio::task::spawn_local(task);

        #[cfg(target_arch = "wasm32")]
        wasm_bindgen_futures::spawn_local(task);
    }

    /// Release every placed graphic and unregister the decorator.
    pub fn teardown(&self, host: &mut dyn DecoratorHost) {
        match self.decorator.try_borrow_mut() {
            Ok(mut decorator) => decorator.drop_decorator(host),
            Err(_) => {
                log::error!("Placed graphic decorator is borrowed during teardown, unregistering only.");
                host.drop_decorator(self.id);
            }
        }
    }
}

/// A template load that has not been applied yet.
pub struct PendingPlacement {
    id: DecoratorId,
    decorator: Weak<RefCell<PlacedGraphicDecorator>>,
    positions: Vec<cgmath::Vector3<f32>>,
}

impl PendingPlacement {
    /// Apply a finished load: set the template and place it at all positions.
    ///
    /// A failed load (`None`) keeps the decorator's current template and places
    /// that one instead; without any template nothing is placed. Does nothing
    /// if the decorator no longer exists or is not registered with `host`
    /// anymore. Returns the number of placements.
    pub fn complete(
        self,
        template: Option<GraphicRef>,
        render_system: &mut dyn RenderSystem,
        host: &mut dyn DecoratorHost,
        rotation: cgmath::Quaternion<f32>,
    ) -> usize {
        let Some(decorator) = self.decorator.upgrade() else {
            log::info!("Template finished loading after its decorator was dropped.");
            return 0;
        };
        if !host.has_decorator(self.id) {
            log::info!(
                "Template finished loading but decorator {:?} is not registered anymore.",
                self.id
            );
            return 0;
        }
        let Ok(mut decorator) = decorator.try_borrow_mut() else {
            log::warn!("Placed graphic decorator is busy, dropping the loaded template.");
            return 0;
        };
        match template {
            Some(template) => decorator.change_placed_graphic(template),
            None => log::warn!("No new template loaded, placing the current one."),
        }

        let mut placed = 0;
        for &position in &self.positions {
            let transform = Instance::from_origin_and_rotation(position, rotation);
            if decorator.add_placed_graphic(render_system, host, &transform) {
                placed += 1;
            }
        }
        placed
    }
}
