//! Integration tests: history behaviour through the editor (sg-editor).
//!
//! Every structural operation saves exactly one snapshot, and undo/redo
//! restore the shape list the surface then mirrors.

use pretty_assertions::assert_eq;
use sg_core::{CanvasDimensions, Shape, ShapeId, ShapeKind, ShapePatch};
use sg_editor::{Editor, EditorConfig};
use sg_render::RecordingSurface;

fn editor_with(config: EditorConfig) -> Editor {
    Editor::new(
        Box::new(RecordingSurface::new(config.dimensions)),
        config,
    )
}

fn editor() -> Editor {
    editor_with(EditorConfig::default())
}

fn rect(id: &str, x: f64) -> Shape {
    Shape::with_id(
        ShapeId::intern(id),
        x,
        10.0,
        ShapeKind::Rectangle {
            width: 20.0,
            height: 20.0,
            corner_radius: 0.0,
        },
    )
    .stroke("#000000", 2.0)
    .fill("#ffffff")
}

fn assert_cursor_at_end(ed: &Editor) {
    let h = ed.history();
    assert_eq!(h.index(), h.len() as isize - 1, "cursor not at the newest snapshot");
    assert!(h.len() <= h.max_size());
}

// ─── Saving ──────────────────────────────────────────────────────────────

#[test]
fn structural_ops_save_once_each() {
    let mut ed = editor();
    let base = ed.history().len();

    ed.add_shape(rect("ops-a", 0.0)).unwrap();
    assert_eq!(ed.history().len(), base + 1);
    assert_cursor_at_end(&ed);

    ed.add_shape(rect("ops-b", 40.0)).unwrap();
    ed.send_to_back(ShapeId::intern("ops-b"));
    assert_eq!(ed.history().len(), base + 3);
    assert_cursor_at_end(&ed);

    // Already at the back: nothing changes, nothing saved.
    assert!(!ed.send_to_back(ShapeId::intern("ops-b")));
    assert_eq!(ed.history().len(), base + 3);

    ed.set_dimensions(CanvasDimensions::new(512.0, 512.0));
    ed.delete_shape(ShapeId::intern("ops-a")).unwrap();
    ed.clear_shapes();
    assert_eq!(ed.history().len(), base + 6);
    assert_cursor_at_end(&ed);
}

#[test]
fn live_property_edits_save_once_on_finish() {
    let mut ed = editor();
    ed.add_shape(rect("slider", 0.0)).unwrap();
    let len = ed.history().len();
    let id = ShapeId::intern("slider");

    for step in 1..=5 {
        let patch = ShapePatch {
            opacity: Some(1.0 - step as f64 * 0.1),
            ..Default::default()
        };
        ed.preview_property_edit(id, &patch).unwrap();
    }
    assert_eq!(ed.history().len(), len);
    ed.finish_property_edit();
    assert_eq!(ed.history().len(), len + 1);
    assert_eq!(ed.shape(id).map(|s| s.opacity), Some(0.5));
}

#[test]
fn capacity_is_respected() {
    let mut ed = editor_with(EditorConfig {
        max_history: 4,
        ..Default::default()
    });
    for i in 0..10 {
        ed.add_shape(rect(&format!("cap-{i}"), i as f64)).unwrap();
        assert_cursor_at_end(&ed);
    }
    assert_eq!(ed.history().len(), 4);
}

// ─── Undo / redo ─────────────────────────────────────────────────────────

#[test]
fn undo_then_redo_restores_the_same_list() {
    let mut ed = editor();
    ed.add_shape(rect("rt-a", 0.0)).unwrap();
    ed.add_shape(rect("rt-b", 40.0)).unwrap();
    let before = ed.shapes().to_vec();

    assert!(ed.undo());
    assert_eq!(ed.shapes().len(), 1);
    assert!(ed.redo());
    assert_eq!(ed.shapes().to_vec(), before);
    assert_eq!(ed.surface().surface().primitives().len(), 2);
}

#[test]
fn new_change_after_undo_drops_redo() {
    let mut ed = editor();
    // The editor starts with one snapshot; four adds make five.
    for i in 0..4 {
        ed.add_shape(rect(&format!("br-{i}"), i as f64 * 30.0)).unwrap();
    }
    assert_eq!(ed.history().len(), 5);

    ed.undo();
    ed.undo();
    assert!(ed.can_redo());
    ed.add_shape(rect("br-new", 200.0)).unwrap();

    assert_eq!(ed.history().len(), 4);
    assert!(!ed.can_redo());
    assert_cursor_at_end(&ed);
}

#[test]
fn undo_clears_selection_of_removed_shape() {
    let mut ed = editor();
    ed.add_shape(rect("sel-undo", 0.0)).unwrap();
    ed.select_shape(Some(ShapeId::intern("sel-undo")));
    ed.undo();
    assert_eq!(ed.selected(), None);
}

#[test]
fn undo_at_the_start_is_a_no_op() {
    let mut ed = editor();
    assert!(!ed.can_undo());
    assert!(!ed.undo());
    assert!(!ed.redo());
}
