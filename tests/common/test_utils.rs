use std::{
    any::Any,
    cell::{Cell, RefCell},
    rc::Rc,
};

use decor_ngin::{
    data_structures::{instance::Instance, scene_graph::GraphicBranch},
    decorator::{DecorateContext, Decorator, DecoratorId, DecoratorRef},
    graphic::{GraphicRef, RenderGraphic, RenderSystem},
    render::GraphicType,
    resources::AssetLoader,
    view_manager::{DecoratorHost, ViewManager},
};

/// A graphic that only counts how often it was released.
#[derive(Debug)]
pub(crate) struct MockGraphic {
    pub label: String,
    pub transform: Option<Instance>,
    disposals: Rc<Cell<u32>>,
    disposed: Cell<bool>,
    fail_dispose: bool,
}

impl MockGraphic {
    pub fn template(label: &str) -> GraphicRef {
        Rc::new(Self {
            label: label.to_string(),
            transform: None,
            disposals: Rc::new(Cell::new(0)),
            disposed: Cell::new(false),
            fail_dispose: false,
        })
    }
}

impl RenderGraphic for MockGraphic {
    fn dispose(&self) -> anyhow::Result<()> {
        self.disposals.set(self.disposals.get() + 1);
        self.disposed.set(true);
        if self.fail_dispose {
            anyhow::bail!("device lost while releasing {}", self.label);
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

pub(crate) fn label_of(graphic: &GraphicRef) -> String {
    graphic
        .as_any()
        .downcast_ref::<MockGraphic>()
        .map(|mock| mock.label.clone())
        .unwrap_or_default()
}

pub(crate) fn position_of(graphic: &GraphicRef) -> Option<cgmath::Vector3<f32>> {
    graphic
        .as_any()
        .downcast_ref::<MockGraphic>()
        .and_then(|mock| mock.transform.as_ref())
        .map(|transform| transform.position)
}

/// Render system producing [`MockGraphic`]s labelled after the branch content,
/// e.g. `G@T1` for template `G`.
#[derive(Default)]
pub(crate) struct MockRenderSystem {
    pub created: Vec<GraphicRef>,
    pub disposals: Rc<Cell<u32>>,
    pub fail_dispose: bool,
    pub refuse: bool,
}

impl MockRenderSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disposals(&self) -> u32 {
        self.disposals.get()
    }

    /// Placed graphics that were created but not released yet.
    pub fn live(&self) -> usize {
        self.created.iter().filter(|g| !g.is_disposed()).count()
    }
}

impl RenderSystem for MockRenderSystem {
    fn create_graphic_branch(
        &mut self,
        branch: &GraphicBranch,
        transform: &Instance,
    ) -> Option<GraphicRef> {
        if self.refuse || branch.is_empty() {
            return None;
        }
        let label = branch
            .entries()
            .iter()
            .map(label_of)
            .collect::<Vec<_>>()
            .join("+");
        let graphic: GraphicRef = Rc::new(MockGraphic {
            label,
            transform: Some(transform.clone()),
            disposals: self.disposals.clone(),
            disposed: Cell::new(false),
            fail_dispose: self.fail_dispose,
        });
        self.created.push(graphic.clone());
        Some(graphic)
    }
}

/// Host that forwards to a [`ViewManager`] and records every invalidation.
#[derive(Default)]
pub(crate) struct RecordingHost {
    pub views: ViewManager,
    pub invalidations: Vec<DecoratorId>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DecoratorHost for RecordingHost {
    fn add_decorator(&mut self, decorator: DecoratorRef) -> bool {
        self.views.add_decorator(decorator)
    }

    fn drop_decorator(&mut self, id: DecoratorId) -> bool {
        self.views.drop_decorator(id)
    }

    fn has_decorator(&self, id: DecoratorId) -> bool {
        self.views.has_decorator(id)
    }

    fn invalidate_cached_decorations(&mut self, id: DecoratorId) {
        self.invalidations.push(id);
        self.views.invalidate_cached_decorations(id);
    }
}

/// Decorator adding one fixed graphic to every view it is asked about.
pub(crate) struct FixedDecorator {
    id: DecoratorId,
    graphic: GraphicRef,
    graphic_type: GraphicType,
    cached: bool,
    pub calls: Cell<u32>,
}

impl FixedDecorator {
    pub fn new(label: &str, graphic_type: GraphicType, cached: bool) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            id: DecoratorId::next(),
            graphic: MockGraphic::template(label),
            graphic_type,
            cached,
            calls: Cell::new(0),
        }))
    }
}

impl Decorator for FixedDecorator {
    fn id(&self) -> DecoratorId {
        self.id
    }

    fn decorate(&self, ctx: &mut DecorateContext<'_>) {
        self.calls.set(self.calls.get() + 1);
        ctx.add_decoration(self.graphic_type, self.graphic.clone());
    }

    fn use_cached_decorations(&self) -> bool {
        self.cached
    }
}

/// Loader that knows a fixed set of asset names.
pub(crate) struct MockLoader {
    known: Vec<String>,
    pub requests: RefCell<Vec<String>>,
}

impl MockLoader {
    pub fn new(known: &[&str]) -> Self {
        Self {
            known: known.iter().map(|name| name.to_string()).collect(),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl AssetLoader for MockLoader {
    async fn load_template(&self, name: &str) -> anyhow::Result<GraphicRef> {
        self.requests.borrow_mut().push(name.to_string());
        if self.known.iter().any(|known| known == name) {
            Ok(MockGraphic::template(name))
        } else {
            anyhow::bail!("{}.glb not found", name)
        }
    }
}

pub(crate) fn at(x: f32, y: f32, z: f32) -> Instance {
    Instance::from(cgmath::Vector3::new(x, y, z))
}
