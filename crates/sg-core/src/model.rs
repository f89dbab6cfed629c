//! Shape data model.
//!
//! A drawing is a flat, ordered list of [`Shape`]s. List order is z-order:
//! index 0 is painted first (bottom-most). Every shape carries a shared base
//! record plus a kind-specific payload in [`ShapeKind`].
//!
//! The serde layout matches the JSON snapshot format: camelCase keys with
//! the kind flattened in under a `"type"` tag.

use crate::color::TRANSPARENT;
use crate::id::ShapeId;
use crate::path::bounds;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Flat `[x0, y0, x1, y1, ...]` coordinate list.
pub type Points = SmallVec<[f64; 8]>;

// ─── Shapes ──────────────────────────────────────────────────────────────

/// A single drawable entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: ShapeId,
    /// Top-left for rectangles and images, centre for circles and ellipses.
    /// For path-like kinds, an offset added to every point.
    pub x: f64,
    pub y: f64,
    /// Degrees, clockwise.
    #[serde(default)]
    pub rotation: f64,
    pub stroke_color: String,
    pub fill_color: String,
    /// 0 means no stroke is drawn.
    pub stroke_width: f64,
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
    #[serde(flatten)]
    pub kind: ShapeKind,
}

/// Kind-specific geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ShapeKind {
    Rectangle {
        width: f64,
        height: f64,
        #[serde(default)]
        corner_radius: f64,
    },
    Circle {
        radius: f64,
    },
    Ellipse {
        radius_x: f64,
        radius_y: f64,
    },
    /// Exactly two absolute endpoints.
    Line {
        points: Points,
    },
    /// Control points interpolated by a Catmull-Rom spline.
    Bezier {
        points: Points,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        closed: Option<bool>,
    },
    /// Straight segments between points.
    Polyline {
        points: Points,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        closed: Option<bool>,
    },
    /// Raster image. `width`/`height` are the displayed size.
    Image {
        src: String,
        width: f64,
        height: f64,
    },
}

/// The discriminant of a [`ShapeKind`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Rectangle,
    Circle,
    Ellipse,
    Line,
    Bezier,
    Polyline,
    Image,
}

impl ShapeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Circle => "circle",
            ShapeType::Ellipse => "ellipse",
            ShapeType::Line => "line",
            ShapeType::Bezier => "bezier",
            ShapeType::Polyline => "polyline",
            ShapeType::Image => "image",
        }
    }
}

impl ShapeKind {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeKind::Rectangle { .. } => ShapeType::Rectangle,
            ShapeKind::Circle { .. } => ShapeType::Circle,
            ShapeKind::Ellipse { .. } => ShapeType::Ellipse,
            ShapeKind::Line { .. } => ShapeType::Line,
            ShapeKind::Bezier { .. } => ShapeType::Bezier,
            ShapeKind::Polyline { .. } => ShapeType::Polyline,
            ShapeKind::Image { .. } => ShapeType::Image,
        }
    }

    /// Flat point list for line, bezier and polyline kinds.
    pub fn points(&self) -> Option<&[f64]> {
        match self {
            ShapeKind::Line { points }
            | ShapeKind::Bezier { points, .. }
            | ShapeKind::Polyline { points, .. } => Some(points),
            _ => None,
        }
    }

    /// Whether a bezier or polyline is closed. Other kinds report `false`.
    pub fn is_closed(&self) -> bool {
        match self {
            ShapeKind::Bezier { closed, .. } | ShapeKind::Polyline { closed, .. } => {
                closed.unwrap_or(false)
            }
            _ => false,
        }
    }
}

/// Drop shadow. `color` is an opaque hex color; `opacity` is separate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    pub color: String,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub opacity: f64,
    pub enabled: bool,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: "#000000".into(),
            blur: 10.0,
            offset_x: 5.0,
            offset_y: 5.0,
            opacity: 0.5,
            enabled: false,
        }
    }
}

impl Shape {
    /// A shape with a fresh id, no rotation, full opacity and no style.
    pub fn new(x: f64, y: f64, kind: ShapeKind) -> Self {
        Self::with_id(ShapeId::generate(), x, y, kind)
    }

    pub fn with_id(id: ShapeId, x: f64, y: f64, kind: ShapeKind) -> Self {
        Self {
            id,
            x,
            y,
            rotation: 0.0,
            stroke_color: String::new(),
            fill_color: TRANSPARENT.into(),
            stroke_width: 0.0,
            opacity: 1.0,
            scale_x: None,
            scale_y: None,
            shadow: None,
            kind,
        }
    }

    pub fn stroke(mut self, color: impl Into<String>, width: f64) -> Self {
        self.stroke_color = color.into();
        self.stroke_width = width;
        self
    }

    pub fn fill(mut self, color: impl Into<String>) -> Self {
        self.fill_color = color.into();
        self
    }

    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    /// Persisted scale, defaulting to 1 on either axis.
    pub fn scale(&self) -> (f64, f64) {
        (self.scale_x.unwrap_or(1.0), self.scale_y.unwrap_or(1.0))
    }

    /// Whether `x`/`y` offsets the points rather than placing the shape.
    pub fn is_path_like(&self) -> bool {
        self.kind.points().is_some()
    }

    /// Rotation pivot in canvas coordinates, used by vector export. Path-like
    /// kinds pivot on the top-left of their offset points.
    pub fn anchor(&self) -> (f64, f64) {
        match &self.kind {
            ShapeKind::Rectangle { width, height, .. } => {
                (self.x + width / 2.0, self.y + height / 2.0)
            }
            ShapeKind::Image { width, height, .. } => (self.x + width / 2.0, self.y + height / 2.0),
            ShapeKind::Line { points }
            | ShapeKind::Bezier { points, .. }
            | ShapeKind::Polyline { points, .. } => {
                let (x0, y0, _, _) = bounds(points).unwrap_or_default();
                (x0 + self.x, y0 + self.y)
            }
            _ => (self.x, self.y),
        }
    }

    /// Check the point-count invariants for committed shapes.
    pub fn validate(&self) -> Result<(), String> {
        let Some(points) = self.kind.points() else {
            return Ok(());
        };
        if points.len() % 2 != 0 {
            return Err(format!("shape {} has an odd number of coordinates", self.id));
        }
        if self.shape_type() == ShapeType::Line && points.len() != 4 {
            return Err(format!("line {} must have exactly 4 coordinates", self.id));
        }
        if points.len() < 4 {
            return Err(format!(
                "{} {} has {} coordinates, need at least 4",
                self.shape_type().as_str(),
                self.id,
                points.len()
            ));
        }
        Ok(())
    }
}

// ─── Partial updates ─────────────────────────────────────────────────────

/// A partial update merged into an existing shape.
///
/// `None` fields are left untouched. Kind-specific fields only apply to
/// shapes of a matching kind. The one permitted kind change is
/// circle→ellipse, requested with `promote_to_ellipse` together with
/// `radius_x`/`radius_y`.
///
/// Deserializes from a camelCase JSON object of the fields to change, as
/// sent by a property panel. A `null` shadow counts as "unchanged".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub stroke_color: Option<String>,
    pub fill_color: Option<String>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub shadow: Option<Option<Shadow>>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub corner_radius: Option<f64>,
    pub radius: Option<f64>,
    pub radius_x: Option<f64>,
    pub radius_y: Option<f64>,
    pub points: Option<Points>,
    pub closed: Option<bool>,
    pub src: Option<String>,
    #[serde(skip)]
    pub promote_to_ellipse: bool,
}

impl ShapePatch {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this patch into `shape`. Never touches `id`.
    pub fn apply(&self, shape: &mut Shape) {
        let id = shape.id;
        if let Some(v) = self.x {
            shape.x = v;
        }
        if let Some(v) = self.y {
            shape.y = v;
        }
        if let Some(v) = self.rotation {
            shape.rotation = v;
        }
        if let Some(v) = &self.stroke_color {
            shape.stroke_color.clone_from(v);
        }
        if let Some(v) = &self.fill_color {
            shape.fill_color.clone_from(v);
        }
        if let Some(v) = self.stroke_width {
            shape.stroke_width = v;
        }
        if let Some(v) = self.opacity {
            shape.opacity = v.clamp(0.0, 1.0);
        }
        if let Some(v) = self.scale_x {
            shape.scale_x = Some(v);
        }
        if let Some(v) = self.scale_y {
            shape.scale_y = Some(v);
        }
        if let Some(v) = &self.shadow {
            shape.shadow.clone_from(v);
        }

        if self.promote_to_ellipse
            && let ShapeKind::Circle { radius } = shape.kind
        {
            shape.kind = ShapeKind::Ellipse {
                radius_x: self.radius_x.unwrap_or(radius),
                radius_y: self.radius_y.unwrap_or(radius),
            };
            return;
        }

        let mut ignored = false;
        match &mut shape.kind {
            ShapeKind::Rectangle {
                width,
                height,
                corner_radius,
            } => {
                set(width, self.width);
                set(height, self.height);
                set(corner_radius, self.corner_radius);
                ignored |= self.radius.is_some() || self.points.is_some() || self.src.is_some();
            }
            ShapeKind::Circle { radius } => {
                set(radius, self.radius);
                ignored |= self.width.is_some() || self.radius_x.is_some() || self.points.is_some();
            }
            ShapeKind::Ellipse { radius_x, radius_y } => {
                set(radius_x, self.radius_x);
                set(radius_y, self.radius_y);
                ignored |= self.radius.is_some() || self.width.is_some() || self.points.is_some();
            }
            ShapeKind::Line { points } => {
                if let Some(p) = &self.points {
                    if p.len() == 4 {
                        points.clone_from(p);
                    } else {
                        ignored = true;
                    }
                }
            }
            ShapeKind::Bezier { points, closed } | ShapeKind::Polyline { points, closed } => {
                if let Some(p) = &self.points {
                    points.clone_from(p);
                }
                if let Some(c) = self.closed {
                    *closed = Some(c);
                }
                ignored |= self.width.is_some() || self.radius.is_some();
            }
            ShapeKind::Image { src, width, height } => {
                set(width, self.width);
                set(height, self.height);
                if let Some(s) = &self.src {
                    src.clone_from(s);
                }
                ignored |= self.radius.is_some() || self.points.is_some();
            }
        }
        if ignored {
            log::debug!(
                "patch fields not applicable to {} {id} were ignored",
                shape.kind.shape_type().as_str()
            );
        }
    }
}

fn set(slot: &mut f64, value: Option<f64>) {
    if let Some(v) = value {
        *slot = v;
    }
}

// ─── Canvas ──────────────────────────────────────────────────────────────

/// Drawing-surface bounds. All shape coordinates live in this space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasDimensions {
    pub width: f64,
    pub height: f64,
}

impl Default for CanvasDimensions {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 768.0,
        }
    }
}

impl CanvasDimensions {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size presets offered by the canvas controls.
    pub const PRESETS: [(&'static str, CanvasDimensions); 5] = [
        ("512 × 512", CanvasDimensions::new(512.0, 512.0)),
        ("768 × 768", CanvasDimensions::new(768.0, 768.0)),
        ("1024 × 768", CanvasDimensions::new(1024.0, 768.0)),
        ("768 × 1024", CanvasDimensions::new(768.0, 1024.0)),
        ("1024 × 1024", CanvasDimensions::new(1024.0, 1024.0)),
    ];
}

/// Reference image drawn beneath all shapes, stretched to fill the canvas.
/// `width`/`height` are the image's natural size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub url: String,
    pub width: f64,
    pub height: f64,
    pub opacity: f64,
}

/// An immutable deep copy of the shape list taken for undo/redo.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryState {
    pub shapes: Vec<Shape>,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl HistoryState {
    pub fn capture(shapes: &[Shape]) -> Self {
        Self {
            shapes: shapes.to_vec(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;

    fn rect() -> Shape {
        Shape::with_id(
            ShapeId::intern("r1"),
            10.0,
            20.0,
            ShapeKind::Rectangle {
                width: 30.0,
                height: 40.0,
                corner_radius: 0.0,
            },
        )
        .stroke("#000000", 2.0)
        .fill("#ffffff")
    }

    #[test]
    fn serializes_with_type_tag_and_camel_case() {
        let json = serde_json::to_value(rect()).unwrap();
        assert_eq!(json["type"], "rectangle");
        assert_eq!(json["strokeColor"], "#000000");
        assert_eq!(json["cornerRadius"], 0.0);
        assert!(json.get("scaleX").is_none());
    }

    #[test]
    fn deserializes_original_json() {
        let json = r##"{
            "id": "shape-1-0.5", "type": "ellipse", "x": 5, "y": 6,
            "rotation": 0, "strokeColor": "#000", "fillColor": "transparent",
            "strokeWidth": 2, "opacity": 1, "radiusX": 10, "radiusY": 4
        }"##;
        let shape: Shape = serde_json::from_str(json).unwrap();
        assert_eq!(
            shape.kind,
            ShapeKind::Ellipse {
                radius_x: 10.0,
                radius_y: 4.0
            }
        );
    }

    #[test]
    fn patch_merges_without_touching_other_fields() {
        let mut s = rect();
        let patch = ShapePatch {
            width: Some(99.0),
            x: Some(1.0),
            ..Default::default()
        };
        patch.apply(&mut s);
        assert_eq!(s.x, 1.0);
        assert_eq!(s.y, 20.0);
        assert_eq!(
            s.kind,
            ShapeKind::Rectangle {
                width: 99.0,
                height: 40.0,
                corner_radius: 0.0
            }
        );
    }

    #[test]
    fn promote_circle_to_ellipse() {
        let mut s = Shape::with_id(
            ShapeId::intern("c1"),
            0.0,
            0.0,
            ShapeKind::Circle { radius: 10.0 },
        );
        ShapePatch {
            promote_to_ellipse: true,
            radius_x: Some(20.0),
            radius_y: Some(10.0),
            ..Default::default()
        }
        .apply(&mut s);
        assert_eq!(
            s.kind,
            ShapeKind::Ellipse {
                radius_x: 20.0,
                radius_y: 10.0
            }
        );
    }

    #[test]
    fn promotion_is_ignored_for_non_circles() {
        let mut s = rect();
        ShapePatch {
            promote_to_ellipse: true,
            ..Default::default()
        }
        .apply(&mut s);
        assert_eq!(s.shape_type(), ShapeType::Rectangle);
    }

    #[test]
    fn line_requires_exactly_four_coordinates() {
        let s = Shape::new(
            0.0,
            0.0,
            ShapeKind::Line {
                points: smallvec![0.0, 0.0, 1.0],
            },
        );
        assert!(s.validate().is_err());
    }

    #[test]
    fn patch_from_panel_json() {
        let patch: ShapePatch =
            serde_json::from_str(r##"{ "fillColor": "#00ff00", "cornerRadius": 6 }"##).unwrap();
        assert_eq!(patch.fill_color.as_deref(), Some("#00ff00"));
        assert_eq!(patch.corner_radius, Some(6.0));
        assert_eq!(patch.x, None);
        assert!(!patch.promote_to_ellipse);
    }
}
