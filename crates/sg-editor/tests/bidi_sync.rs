//! Integration tests: bidirectional sync between the shape model and the
//! retained surface.
//!
//! Forward: every model change rebuilds the surface primitives.
//! Reverse: finished gestures are folded back into the model once.

use pretty_assertions::assert_eq;
use sg_core::{BackgroundImage, CanvasDimensions, Shape, ShapeId, ShapeKind};
use sg_editor::sync::promoted_base;
use sg_editor::{Editor, EditorConfig, Modifiers, ToolKind};
use sg_render::{Geometry, RecordingSurface};
use smallvec::smallvec;

fn editor() -> Editor {
    let config = EditorConfig::default();
    Editor::new(Box::new(RecordingSurface::new(config.dimensions)), config)
}

fn gesture(ed: &mut Editor, from: (f64, f64), to: (f64, f64)) {
    ed.pointer_down(from.0, from.1, Modifiers::NONE);
    ed.pointer_move(to.0, to.1, Modifiers::NONE);
    ed.pointer_up(to.0, to.1, Modifiers::NONE);
}

fn circle(id: &str) -> Shape {
    Shape::with_id(ShapeId::intern(id), 100.0, 100.0, ShapeKind::Circle { radius: 20.0 })
        .stroke("#000000", 2.0)
        .fill("#ffffff")
}

// ─── Forward ─────────────────────────────────────────────────────────────

#[test]
fn primitives_follow_list_order() {
    let mut ed = editor();
    ed.add_shape(circle("fw-a")).unwrap();
    ed.add_shape(circle("fw-b")).unwrap();
    ed.bring_to_front(ShapeId::intern("fw-a"));

    let ids: Vec<_> = ed
        .surface()
        .surface()
        .primitives()
        .iter()
        .filter_map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![ShapeId::intern("fw-b"), ShapeId::intern("fw-a")]);
}

#[test]
fn background_is_fitted_and_not_reloaded_needlessly() {
    let mut ed = editor();
    ed.set_background_image(Some(BackgroundImage {
        url: "bg.png".into(),
        width: 512.0,
        height: 384.0,
        opacity: 0.5,
    }));
    let layer = ed.surface().surface().background().cloned();
    assert_eq!(layer.as_ref().map(|l| (l.scale_x, l.scale_y)), Some((2.0, 2.0)));

    // Shape edits never touch the background layer.
    ed.add_shape(circle("bg-shape")).unwrap();
    assert_eq!(ed.surface().surface().background().cloned(), layer);

    ed.set_dimensions(CanvasDimensions::new(512.0, 768.0));
    assert_eq!(
        ed.surface().surface().background().map(|l| (l.scale_x, l.scale_y)),
        Some((1.0, 2.0))
    );
}

// ─── Reverse ─────────────────────────────────────────────────────────────

#[test]
fn move_gesture_updates_position_once() {
    let mut ed = editor();
    ed.add_shape(
        Shape::with_id(
            ShapeId::intern("mv"),
            10.0,
            10.0,
            ShapeKind::Rectangle {
                width: 20.0,
                height: 20.0,
                corner_radius: 0.0,
            },
        )
        .fill("#ffffff"),
    )
    .unwrap();
    let len = ed.history().len();

    gesture(&mut ed, (20.0, 20.0), (50.0, 60.0));
    let shape = ed.shape(ShapeId::intern("mv")).cloned();
    assert_eq!(shape.map(|s| (s.x, s.y)), Some((40.0, 50.0)));
    assert_eq!(ed.history().len(), len + 1);
}

#[test]
fn click_without_drag_saves_nothing() {
    let mut ed = editor();
    ed.add_shape(circle("still")).unwrap();
    let len = ed.history().len();
    gesture(&mut ed, (100.0, 100.0), (100.0, 100.0));
    assert_eq!(ed.history().len(), len);
    assert_eq!(ed.selected(), Some(ShapeId::intern("still")));
}

#[test]
fn uniform_circle_scale_updates_radius() {
    let mut ed = editor();
    ed.add_shape(circle("uni")).unwrap();
    let id = ShapeId::intern("uni");
    // Select, then drag the bottom-right corner handle (120, 120) outward.
    gesture(&mut ed, (100.0, 100.0), (100.0, 100.0));
    gesture(&mut ed, (120.0, 120.0), (130.0, 130.0));

    let shape = ed.shape(id).cloned();
    assert_eq!(shape.map(|s| s.kind), Some(ShapeKind::Circle { radius: 25.0 }));
    let prim = ed.surface().primitive(id).cloned();
    assert_eq!(prim.map(|p| (p.scale_x, p.scale_y)), Some((1.0, 1.0)));
}

#[test]
fn non_uniform_circle_scale_promotes_to_ellipse() {
    let mut ed = editor();
    ed.add_shape(circle("promo")).unwrap();
    let id = ShapeId::intern("promo");
    // Select, then drag the middle-right handle (120, 100) to double the width.
    gesture(&mut ed, (100.0, 100.0), (100.0, 100.0));
    gesture(&mut ed, (120.0, 100.0), (160.0, 100.0));

    let shape = ed.shape(id).cloned();
    assert_eq!(
        shape.as_ref().map(|s| s.kind.clone()),
        Some(ShapeKind::Ellipse {
            radius_x: 40.0,
            radius_y: 20.0
        })
    );
    assert_eq!(shape.map(|s| s.x), Some(120.0));

    // Still drawn through the original circle, scaled per axis.
    assert_eq!(ed.shape(id).and_then(promoted_base), Some(20.0));
    let prim = ed.surface().primitive(id).cloned();
    assert_eq!(
        prim.map(|p| (p.geometry, p.scale_x, p.scale_y)),
        Some((Geometry::Circle { radius: 20.0 }, 2.0, 1.0))
    );
}

#[test]
fn promoted_ellipse_survives_undo_redo_and_reimport() {
    let mut ed = editor();
    ed.add_shape(circle("promo-hist")).unwrap();
    let id = ShapeId::intern("promo-hist");
    gesture(&mut ed, (100.0, 100.0), (100.0, 100.0));
    gesture(&mut ed, (120.0, 100.0), (160.0, 100.0));

    let scaled_circle = Some((Geometry::Circle { radius: 20.0 }, 2.0, 1.0));
    let drawn = |ed: &Editor| {
        ed.surface()
            .primitive(id)
            .map(|p| (p.geometry.clone(), p.scale_x, p.scale_y))
    };
    assert_eq!(drawn(&ed), scaled_circle);

    assert!(ed.undo());
    assert_eq!(ed.shape(id).map(|s| s.kind.clone()), Some(ShapeKind::Circle { radius: 20.0 }));
    assert!(ed.redo());
    assert_eq!(drawn(&ed), scaled_circle);

    let json = ed.export_json().unwrap();
    let mut reloaded = editor();
    reloaded.import_json(&json).unwrap();
    assert_eq!(drawn(&reloaded), scaled_circle);
}

#[test]
fn promoted_ellipse_keeps_scaling_on_later_gestures() {
    let mut ed = editor();
    ed.add_shape(circle("promo-again")).unwrap();
    let id = ShapeId::intern("promo-again");
    gesture(&mut ed, (100.0, 100.0), (100.0, 100.0));
    gesture(&mut ed, (120.0, 100.0), (160.0, 100.0));
    // Bottom-middle handle of the 80×40 box sits at (120, 120).
    gesture(&mut ed, (120.0, 120.0), (120.0, 140.0));

    let shape = ed.shape(id).cloned();
    assert_eq!(
        shape.as_ref().map(|s| s.kind.clone()),
        Some(ShapeKind::Ellipse {
            radius_x: 40.0,
            radius_y: 30.0
        })
    );
    assert_eq!(shape.as_ref().map(|s| s.scale()), Some((2.0, 1.5)));
    assert_eq!(shape.as_ref().and_then(promoted_base), Some(20.0));
}

#[test]
fn path_dragged_to_canvas_origin_stays_there() {
    let mut ed = editor();
    ed.add_shape(
        Shape::with_id(
            ShapeId::intern("to-origin"),
            0.0,
            0.0,
            ShapeKind::Polyline {
                points: smallvec![50.0, 50.0, 90.0, 50.0, 90.0, 90.0, 50.0, 90.0],
                closed: Some(true),
            },
        )
        .stroke("#000000", 2.0)
        .fill("#ffffff"),
    )
    .unwrap();
    let id = ShapeId::intern("to-origin");

    gesture(&mut ed, (70.0, 70.0), (20.0, 20.0));
    let shape = ed.shape(id).cloned();
    assert_eq!(shape.as_ref().map(|s| (s.x, s.y)), Some((-50.0, -50.0)));
    assert_eq!(
        shape.and_then(|s| s.kind.points().map(<[f64]>::to_vec)),
        Some(vec![50.0, 50.0, 90.0, 50.0, 90.0, 90.0, 50.0, 90.0])
    );

    // A later forward sync draws it where it was dropped.
    ed.set_tool(ToolKind::Select);
    let prim = ed.surface().primitive(id).cloned();
    assert_eq!(prim.map(|p| (p.left, p.top)), Some((0.0, 0.0)));
}

#[test]
fn gestures_only_apply_in_select_mode() {
    let mut ed = editor();
    ed.add_shape(circle("inert")).unwrap();
    ed.set_tool(ToolKind::Line);
    ed.pointer_down(100.0, 100.0, Modifiers::NONE);
    assert!(!ed.surface().surface().in_gesture());
}
