//! Integration tests: snapshot JSON → model → JSON.
//!
//! Exercises the serialized form shared with saved drawings: every shape
//! kind, optional fields, and the validation applied on load.

use pretty_assertions::assert_eq;
use sg_core::snapshot::SNAPSHOT_VERSION;
use sg_core::{CanvasDimensions, ShapeId, ShapeKind, ShapeList, ShapeType, Snapshot, SnapshotError};

const DRAWING: &str = r##"{
  "version": "1.0",
  "dimensions": { "width": 1024, "height": 768 },
  "shapes": [
    { "id": "r1", "type": "rectangle", "x": 10, "y": 10, "width": 100, "height": 50,
      "cornerRadius": 8, "rotation": 30, "strokeColor": "#000000", "fillColor": "#ff0000",
      "strokeWidth": 2, "opacity": 1,
      "shadow": { "color": "#000000", "blur": 10, "offsetX": 5, "offsetY": 5, "opacity": 0.5, "enabled": true } },
    { "id": "c1", "type": "circle", "x": 200, "y": 200, "radius": 40, "rotation": 0,
      "strokeColor": "#000000", "fillColor": "transparent", "strokeWidth": 1, "opacity": 0.8 },
    { "id": "e1", "type": "ellipse", "x": 300, "y": 100, "radiusX": 50, "radiusY": 20, "rotation": 0,
      "strokeColor": "#000000", "fillColor": "#00ff00", "strokeWidth": 1, "opacity": 1 },
    { "id": "l1", "type": "line", "x": 0, "y": 0, "points": [0, 0, 100, 100], "rotation": 0,
      "strokeColor": "#0000ff", "fillColor": "transparent", "strokeWidth": 3, "opacity": 1 },
    { "id": "b1", "type": "bezier", "x": 0, "y": 0, "points": [0, 0, 50, 50, 100, 0], "rotation": 0,
      "strokeColor": "#000000", "fillColor": "transparent", "strokeWidth": 2, "opacity": 1,
      "scaleX": 1.5, "scaleY": 1.5 },
    { "id": "p1", "type": "polyline", "x": 0, "y": 0, "points": [0, 0, 10, 0, 10, 10, 0, 0],
      "closed": true, "rotation": 0, "strokeColor": "#000000", "fillColor": "#cccccc",
      "strokeWidth": 2, "opacity": 1 },
    { "id": "i1", "type": "image", "x": 100, "y": 100, "src": "data:image/png;base64,AA",
      "width": 512, "height": 512, "scaleX": 1, "scaleY": 1, "rotation": 0,
      "strokeColor": "", "fillColor": "", "strokeWidth": 0, "opacity": 1 }
  ],
  "backgroundImage": null,
  "exportedAt": "2026-01-01T00:00:00.000Z"
}"##;

#[test]
fn every_kind_loads() {
    let snap = Snapshot::from_json(DRAWING).unwrap();
    let types: Vec<_> = snap.shapes.iter().map(|s| s.shape_type()).collect();
    assert_eq!(
        types,
        vec![
            ShapeType::Rectangle,
            ShapeType::Circle,
            ShapeType::Ellipse,
            ShapeType::Line,
            ShapeType::Bezier,
            ShapeType::Polyline,
            ShapeType::Image,
        ]
    );
    assert_eq!(snap.dimensions, CanvasDimensions::new(1024.0, 768.0));
    assert_eq!(snap.background_image, None);

    let rect = &snap.shapes[0];
    assert_eq!(rect.rotation, 30.0);
    assert!(rect.shadow.as_ref().is_some_and(|s| s.enabled));
    assert_eq!(snap.shapes[4].scale(), (1.5, 1.5));
    assert!(snap.shapes[5].kind.is_closed());
}

#[test]
fn reserialized_snapshot_loads_identically() {
    let snap = Snapshot::from_json(DRAWING).unwrap();
    let again = Snapshot::from_json(&snap.to_json().unwrap()).unwrap();
    assert_eq!(again, snap);
    assert_eq!(again.version, SNAPSHOT_VERSION);
}

#[test]
fn loaded_shapes_fill_a_list_in_order() {
    let snap = Snapshot::from_json(DRAWING).unwrap();
    let mut list = ShapeList::new();
    for shape in snap.shapes {
        list.add(shape).unwrap();
    }
    assert_eq!(list.position(ShapeId::intern("i1")), Some(6));
    assert!(list.bring_to_front(ShapeId::intern("r1")));
    assert_eq!(list.position(ShapeId::intern("r1")), Some(6));
    assert!(matches!(
        list.get(ShapeId::intern("e1")).map(|s| &s.kind),
        Some(ShapeKind::Ellipse { radius_x, .. }) if *radius_x == 50.0
    ));
}

#[test]
fn rejects_short_paths_and_duplicates() {
    let short = DRAWING.replace("[0, 0, 50, 50, 100, 0]", "[0, 0]");
    assert!(matches!(
        Snapshot::from_json(&short),
        Err(SnapshotError::Invalid(_))
    ));

    let dup = DRAWING.replace("\"id\": \"c1\"", "\"id\": \"r1\"");
    assert!(matches!(Snapshot::from_json(&dup), Err(SnapshotError::Invalid(_))));
}

#[test]
fn missing_fields_are_parse_errors() {
    let broken = DRAWING.replace("\"radius\": 40,", "");
    assert!(matches!(
        Snapshot::from_json(&broken),
        Err(SnapshotError::Parse(_))
    ));
}
