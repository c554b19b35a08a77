use std::{cell::RefCell, rc::Rc};

use decor_ngin::{
    decorator::Decorator,
    placed_graphic::PlacedGraphicDecorator,
    render::GraphicType,
    view_manager::{DecoratorHost, ViewKind},
};

use crate::common::test_utils::{
    MockGraphic, MockRenderSystem, RecordingHost, at, label_of, position_of,
};

mod common;

fn registered() -> (Rc<RefCell<PlacedGraphicDecorator>>, RecordingHost) {
    let decorator = Rc::new(RefCell::new(PlacedGraphicDecorator::new()));
    let mut host = RecordingHost::new();
    assert!(host.add_decorator(decorator.clone()));
    (decorator, host)
}

#[test]
fn placing_without_template_does_nothing() {
    let (decorator, mut host) = registered();
    let mut render_system = MockRenderSystem::new();

    let placed = decorator
        .borrow_mut()
        .add_placed_graphic(&mut render_system, &mut host, &at(1.0, 2.0, 3.0));

    assert!(!placed);
    assert!(decorator.borrow().is_empty());
    assert!(render_system.created.is_empty());
    assert!(host.invalidations.is_empty());
}

#[test]
fn placements_are_kept_in_call_order() {
    let (decorator, mut host) = registered();
    let mut render_system = MockRenderSystem::new();
    decorator
        .borrow_mut()
        .change_placed_graphic(MockGraphic::template("G"));

    for x in [1.0, 2.0, 3.0] {
        assert!(decorator.borrow_mut().add_placed_graphic(
            &mut render_system,
            &mut host,
            &at(x, 0.0, 0.0)
        ));
    }

    let decorator = decorator.borrow();
    let xs: Vec<f32> = decorator
        .placed_graphics()
        .filter_map(position_of)
        .map(|p| p.x)
        .collect();
    assert_eq!(xs, vec![1.0, 2.0, 3.0]);
    assert!(decorator.placed_graphics().all(|g| label_of(g) == "G"));
    assert_eq!(host.invalidations, vec![decorator.id(); 3]);
}

#[test]
fn placed_graphics_decorate_spatial_views_as_scene_graphics() {
    let (decorator, mut host) = registered();
    let spatial = host.views.add_viewport(ViewKind::Spatial);
    let mut render_system = MockRenderSystem::new();

    decorator
        .borrow_mut()
        .change_placed_graphic(MockGraphic::template("G"));
    decorator
        .borrow_mut()
        .add_placed_graphic(&mut render_system, &mut host, &at(1.0, 0.0, 0.0));
    decorator
        .borrow_mut()
        .add_placed_graphic(&mut render_system, &mut host, &at(2.0, 0.0, 0.0));

    let decorations = host.views.decorate(spatial);
    let scene = decorations.get(GraphicType::Scene);
    assert_eq!(scene.len(), 2);
    assert_eq!(decorations.len(), 2);
    assert_eq!(position_of(&scene[0]).map(|p| p.x), Some(1.0));
    assert_eq!(position_of(&scene[1]).map(|p| p.x), Some(2.0));
    assert!(decorations.get(GraphicType::WorldDecoration).is_empty());

    decorator.borrow_mut().clear_graphics(&mut host);
    assert!(host.views.decorate(spatial).is_empty());
    assert_eq!(render_system.disposals(), 2);
}

#[test]
fn non_spatial_views_get_no_decorations() {
    let (decorator, mut host) = registered();
    let drawing = host.views.add_viewport(ViewKind::Drawing);
    let sheet = host.views.add_viewport(ViewKind::Sheet);
    let mut render_system = MockRenderSystem::new();
    decorator
        .borrow_mut()
        .change_placed_graphic(MockGraphic::template("G"));
    for x in [1.0, 2.0, 3.0] {
        decorator
            .borrow_mut()
            .add_placed_graphic(&mut render_system, &mut host, &at(x, 0.0, 0.0));
    }

    assert!(host.views.decorate(drawing).is_empty());
    assert!(host.views.decorate(sheet).is_empty());
    assert_eq!(decorator.borrow().len(), 3);
}

#[test]
fn clearing_releases_each_graphic_once() {
    let (decorator, mut host) = registered();
    let mut render_system = MockRenderSystem::new();
    decorator
        .borrow_mut()
        .change_placed_graphic(MockGraphic::template("G"));
    for x in [1.0, 2.0] {
        decorator
            .borrow_mut()
            .add_placed_graphic(&mut render_system, &mut host, &at(x, 0.0, 0.0));
    }

    decorator.borrow_mut().clear_graphics(&mut host);
    decorator.borrow_mut().clear_graphics(&mut host);

    assert!(decorator.borrow().is_empty());
    assert_eq!(render_system.disposals(), 2);
    assert_eq!(render_system.live(), 0);
    // Two placements plus two clears, the second one on an empty set
    assert_eq!(host.invalidations.len(), 4);
}

#[test]
fn failed_release_is_not_retried() {
    let (decorator, mut host) = registered();
    let mut render_system = MockRenderSystem {
        fail_dispose: true,
        ..Default::default()
    };
    decorator
        .borrow_mut()
        .change_placed_graphic(MockGraphic::template("G"));
    decorator
        .borrow_mut()
        .add_placed_graphic(&mut render_system, &mut host, &at(0.0, 0.0, 0.0));

    decorator.borrow_mut().clear_graphics(&mut host);
    drop(decorator);

    assert_eq!(render_system.disposals(), 1);
}

#[test]
fn dropping_the_decorator_releases_graphics_without_clearing() {
    let mut render_system = MockRenderSystem::new();
    {
        let mut decorator = PlacedGraphicDecorator::new();
        let mut host = RecordingHost::new();
        decorator.change_placed_graphic(MockGraphic::template("G"));
        decorator.add_placed_graphic(&mut render_system, &mut host, &at(0.0, 0.0, 0.0));
        decorator.add_placed_graphic(&mut render_system, &mut host, &at(1.0, 0.0, 0.0));
    }
    assert_eq!(render_system.disposals(), 2);
}

#[test]
fn emptied_branch_is_rebuilt_from_the_template() {
    let (decorator, mut host) = registered();
    let mut render_system = MockRenderSystem::new();
    decorator
        .borrow_mut()
        .change_placed_graphic(MockGraphic::template("G"));

    if let Some(branch) = decorator.borrow_mut().branch_mut() {
        branch.clear();
    }
    let placed = decorator
        .borrow_mut()
        .add_placed_graphic(&mut render_system, &mut host, &at(5.0, 0.0, 0.0));

    assert!(placed);
    let decorator = decorator.borrow();
    assert_eq!(decorator.branch().map(|b| b.len()), Some(1));
    let graphic = decorator.placed_graphics().next().cloned();
    assert_eq!(graphic.as_ref().map(label_of).as_deref(), Some("G"));
}

#[test]
fn changing_the_template_keeps_existing_placements() {
    let (decorator, mut host) = registered();
    let mut render_system = MockRenderSystem::new();

    decorator
        .borrow_mut()
        .change_placed_graphic(MockGraphic::template("Old"));
    decorator
        .borrow_mut()
        .add_placed_graphic(&mut render_system, &mut host, &at(0.0, 0.0, 0.0));
    decorator
        .borrow_mut()
        .change_placed_graphic(MockGraphic::template("New"));
    decorator
        .borrow_mut()
        .add_placed_graphic(&mut render_system, &mut host, &at(1.0, 0.0, 0.0));

    let decorator = decorator.borrow();
    let labels: Vec<String> = decorator.placed_graphics().map(label_of).collect();
    assert_eq!(labels, vec!["Old", "New"]);
    assert_eq!(
        decorator.original_graphic().map(label_of).as_deref(),
        Some("New")
    );
    assert_eq!(render_system.disposals(), 0);
}

#[test]
fn render_system_without_output_is_not_a_placement() {
    let (decorator, mut host) = registered();
    let mut render_system = MockRenderSystem {
        refuse: true,
        ..Default::default()
    };
    decorator
        .borrow_mut()
        .change_placed_graphic(MockGraphic::template("G"));

    let placed = decorator
        .borrow_mut()
        .add_placed_graphic(&mut render_system, &mut host, &at(0.0, 0.0, 0.0));

    assert!(!placed);
    assert!(decorator.borrow().is_empty());
    assert!(host.invalidations.is_empty());
}

#[test]
fn drop_decorator_releases_and_unregisters() {
    let (decorator, mut host) = registered();
    let spatial = host.views.add_viewport(ViewKind::Spatial);
    let mut render_system = MockRenderSystem::new();
    let id = decorator.borrow().id();
    decorator
        .borrow_mut()
        .change_placed_graphic(MockGraphic::template("G"));
    decorator
        .borrow_mut()
        .add_placed_graphic(&mut render_system, &mut host, &at(0.0, 0.0, 0.0));
    host.views.decorate(spatial);
    let calls = host.views.decorate_calls();

    decorator.borrow_mut().drop_decorator(&mut host);

    assert!(!host.has_decorator(id));
    assert!(decorator.borrow().is_empty());
    assert_eq!(render_system.disposals(), 1);
    assert!(host.views.decorate(spatial).is_empty());
    assert_eq!(host.views.decorate_calls(), calls);

    // A second drop is harmless
    decorator.borrow_mut().drop_decorator(&mut host);
    assert_eq!(render_system.disposals(), 1);
}

#[test]
fn placement_refreshes_cached_decorations() {
    let (decorator, mut host) = registered();
    let spatial = host.views.add_viewport(ViewKind::Spatial);
    let mut render_system = MockRenderSystem::new();
    decorator
        .borrow_mut()
        .change_placed_graphic(MockGraphic::template("G"));

    assert!(host.views.decorate(spatial).is_empty());
    assert!(host.views.decorate(spatial).is_empty());
    assert_eq!(host.views.decorate_calls(), 1);

    decorator
        .borrow_mut()
        .add_placed_graphic(&mut render_system, &mut host, &at(0.0, 0.0, 0.0));

    assert_eq!(host.views.decorate(spatial).len(), 1);
    assert_eq!(host.views.decorate(spatial).len(), 1);
    assert_eq!(host.views.decorate_calls(), 2);
}
