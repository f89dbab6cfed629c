//! Tool system for canvas interactions.
//!
//! Each tool translates input events into a [`ToolOutcome`] that the editor
//! applies: a transient preview on the surface overlay, a committed shape,
//! a selection change or a deletion. Tools never touch the shape list
//! themselves.
//!
//! | Tool | Pointer down | Pointer move | Pointer up | Enter / Escape |
//! |------|--------------|--------------|------------|----------------|
//! | select | select hit / clear | - | - | - |
//! | rectangle, circle, ellipse, line | anchor + preview | resize preview | commit or discard | - |
//! | bezier, polyline | add point, or close | - | - | commit open path |
//! | image | place pending image | - | - | - |
//! | delete | delete hit | - | - | - |

use crate::config::EditorConfig;
use crate::input::InputEvent;
use crate::sync::primitive_for;
use sg_core::model::Points;
use sg_core::{DrawingSettings, Shape, ShapeId, ShapeKind};
use sg_render::{Geometry, Primitive};

/// The active tool determines how input events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Rectangle,
    Circle,
    Ellipse,
    Line,
    Bezier,
    Polyline,
    Image,
    Delete,
}

impl ToolKind {
    pub const ALL: [ToolKind; 9] = [
        ToolKind::Select,
        ToolKind::Rectangle,
        ToolKind::Circle,
        ToolKind::Ellipse,
        ToolKind::Line,
        ToolKind::Bezier,
        ToolKind::Polyline,
        ToolKind::Image,
        ToolKind::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Circle => "circle",
            ToolKind::Ellipse => "ellipse",
            ToolKind::Line => "line",
            ToolKind::Bezier => "bezier",
            ToolKind::Polyline => "polyline",
            ToolKind::Image => "image",
            ToolKind::Delete => "delete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// An uploaded image waiting to be placed, with its natural pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingImage {
    pub src: String,
    pub width: f64,
    pub height: f64,
}

/// Everything a tool may read while handling an event.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub settings: &'a DrawingSettings,
    pub config: &'a EditorConfig,
    /// Topmost shape under the pointer, if any.
    pub hit: Option<ShapeId>,
    pub pending_image: Option<&'a PendingImage>,
}

/// What the editor should do after a tool handled an event.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    None,
    /// Replace the overlay with these primitives.
    Preview(Vec<Primitive>),
    /// Add this shape and clear the overlay.
    Commit(Shape),
    /// Clear the overlay; nothing was created.
    Discard,
    Select(Option<ShapeId>),
    Delete(ShapeId),
}

/// Trait for tools that handle input and produce outcomes.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> ToolOutcome;

    /// Enter/Escape: commit or drop any in-progress work.
    fn finish(&mut self, _ctx: &ToolContext) -> ToolOutcome {
        ToolOutcome::None
    }

    /// Drop in-progress state when the tool is switched away.
    fn reset(&mut self) {}
}

/// Fresh tool instance for a kind.
pub fn tool_for(kind: ToolKind) -> Box<dyn Tool> {
    match kind {
        ToolKind::Select => Box::new(SelectTool),
        ToolKind::Rectangle => Box::new(DragTool::new(DragShape::Rectangle)),
        ToolKind::Circle => Box::new(DragTool::new(DragShape::Circle)),
        ToolKind::Ellipse => Box::new(DragTool::new(DragShape::Ellipse)),
        ToolKind::Line => Box::new(DragTool::new(DragShape::Line)),
        ToolKind::Bezier => Box::new(PathTool::new(PathMode::Bezier)),
        ToolKind::Polyline => Box::new(PathTool::new(PathMode::Polyline)),
        ToolKind::Image => Box::new(ImageTool),
        ToolKind::Delete => Box::new(DeleteTool),
    }
}

fn preview_id() -> ShapeId {
    ShapeId::intern("__preview__")
}

/// A shape styled from the current settings, under the preview id.
fn draft(settings: &DrawingSettings, x: f64, y: f64, kind: ShapeKind, filled: bool) -> Shape {
    let shape = Shape::with_id(preview_id(), x, y, kind)
        .stroke(settings.stroke_color.as_str(), settings.stroke_width);
    if filled {
        shape.fill(settings.effective_fill())
    } else {
        shape
    }
}

/// Promote a draft to a real shape with a fresh id.
fn commit(draft: Shape) -> ToolOutcome {
    ToolOutcome::Commit(Shape {
        id: ShapeId::generate(),
        ..draft
    })
}

// ─── Select Tool ─────────────────────────────────────────────────────────

/// Selection only. Dragging, scaling and rotating are direct-manipulation
/// gestures owned by the surface.
pub struct SelectTool;

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> ToolOutcome {
        match event {
            InputEvent::PointerDown { .. } => ToolOutcome::Select(ctx.hit),
            _ => ToolOutcome::None,
        }
    }
}

// ─── Delete Tool ─────────────────────────────────────────────────────────

pub struct DeleteTool;

impl Tool for DeleteTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Delete
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> ToolOutcome {
        match (event, ctx.hit) {
            (InputEvent::PointerDown { .. }, Some(id)) => ToolOutcome::Delete(id),
            _ => ToolOutcome::None,
        }
    }
}

// ─── Drag Tools ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragShape {
    Rectangle,
    Circle,
    Ellipse,
    Line,
}

/// Press-drag-release creation of rectangles, circles, ellipses and lines.
pub struct DragTool {
    shape: DragShape,
    anchor: Option<(f64, f64)>,
}

impl DragTool {
    pub fn new(shape: DragShape) -> Self {
        Self {
            shape,
            anchor: None,
        }
    }

    /// Shape spanned by the drag so far, and whether it is big enough to keep.
    fn span(&self, settings: &DrawingSettings, min: f64, end: (f64, f64)) -> Option<(Shape, bool)> {
        let (ax, ay) = self.anchor?;
        let (x, y) = end;
        let (dx, dy) = (x - ax, y - ay);
        let (w, h) = (dx.abs(), dy.abs());
        let result = match self.shape {
            DragShape::Rectangle => (
                draft(
                    settings,
                    ax.min(x),
                    ay.min(y),
                    ShapeKind::Rectangle {
                        width: w,
                        height: h,
                        corner_radius: settings.corner_radius,
                    },
                    true,
                ),
                w >= min && h >= min,
            ),
            DragShape::Circle => {
                let radius = dx.hypot(dy);
                (
                    draft(settings, ax, ay, ShapeKind::Circle { radius }, true),
                    radius >= min,
                )
            }
            DragShape::Ellipse => {
                let (rx, ry) = (w / 2.0, h / 2.0);
                (
                    draft(
                        settings,
                        (ax + x) / 2.0,
                        (ay + y) / 2.0,
                        ShapeKind::Ellipse {
                            radius_x: rx,
                            radius_y: ry,
                        },
                        true,
                    ),
                    rx >= min && ry >= min,
                )
            }
            DragShape::Line => (
                draft(
                    settings,
                    0.0,
                    0.0,
                    ShapeKind::Line {
                        points: smallvec::smallvec![ax, ay, x, y],
                    },
                    false,
                ),
                w >= min || h >= min,
            ),
        };
        Some(result)
    }
}

impl Tool for DragTool {
    fn kind(&self) -> ToolKind {
        match self.shape {
            DragShape::Rectangle => ToolKind::Rectangle,
            DragShape::Circle => ToolKind::Circle,
            DragShape::Ellipse => ToolKind::Ellipse,
            DragShape::Line => ToolKind::Line,
        }
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> ToolOutcome {
        let min = ctx.config.min_shape_size;
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                self.anchor = Some((*x, *y));
                self.span(ctx.settings, min, (*x, *y))
                    .map_or(ToolOutcome::None, |(shape, _)| {
                        ToolOutcome::Preview(vec![primitive_for(&shape)])
                    })
            }
            InputEvent::PointerMove { x, y, .. } => self
                .span(ctx.settings, min, (*x, *y))
                .map_or(ToolOutcome::None, |(shape, _)| {
                    ToolOutcome::Preview(vec![primitive_for(&shape)])
                }),
            InputEvent::PointerUp { x, y, .. } => {
                let span = self.span(ctx.settings, min, (*x, *y));
                self.anchor = None;
                match span {
                    Some((shape, true)) => commit(shape),
                    Some((shape, false)) => {
                        log::debug!("{} below minimum size, discarded", shape.shape_type().as_str());
                        ToolOutcome::Discard
                    }
                    None => ToolOutcome::None,
                }
            }
            InputEvent::Key { .. } => ToolOutcome::None,
        }
    }

    fn reset(&mut self) {
        self.anchor = None;
    }
}

// ─── Path Tools ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMode {
    /// Smooth spline through the clicked points.
    Bezier,
    /// Straight segments between the clicked points.
    Polyline,
}

const FIRST_MARKER_RADIUS: f64 = 6.0;
const MARKER_RADIUS: f64 = 4.0;
const PREVIEW_DASH: f64 = 5.0;

/// Click-per-point creation of bezier curves and polylines.
///
/// Clicking near the first point once three points exist closes the path.
/// Enter/Escape commits the open path if it has enough points.
pub struct PathTool {
    mode: PathMode,
    points: Points,
}

impl PathTool {
    pub fn new(mode: PathMode) -> Self {
        Self {
            mode,
            points: Points::new(),
        }
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    fn kind_for(&self, points: Points, closed: bool) -> ShapeKind {
        match self.mode {
            PathMode::Bezier => ShapeKind::Bezier {
                points,
                closed: closed.then_some(true),
            },
            PathMode::Polyline => ShapeKind::Polyline {
                points,
                closed: Some(closed),
            },
        }
    }

    /// Open paths need this many coordinates to be kept.
    fn min_open_coords(&self) -> usize {
        match self.mode {
            PathMode::Bezier => 6,
            PathMode::Polyline => 4,
        }
    }

    /// Dashed preview of the path so far plus one marker per point.
    fn overlay(&self, settings: &DrawingSettings) -> Vec<Primitive> {
        let mut overlay = Vec::with_capacity(self.points.len() / 2 + 1);
        if self.points.len() >= 4 {
            let shape = draft(settings, 0.0, 0.0, self.kind_for(self.points.clone(), false), false);
            let mut preview = primitive_for(&shape);
            preview.fill = None;
            overlay.push(preview.dashed(PREVIEW_DASH, PREVIEW_DASH));
        }
        for (i, p) in self.points.chunks_exact(2).enumerate() {
            let radius = if i == 0 {
                FIRST_MARKER_RADIUS
            } else {
                MARKER_RADIUS
            };
            let marker = Primitive::new(Geometry::Circle { radius })
                .at(p[0], p[1])
                .centered()
                .fill(settings.stroke_color.as_str());
            overlay.push(if i == 0 {
                marker.stroke("#ffffff", 2.0)
            } else {
                marker
            });
        }
        overlay
    }
}

impl Tool for PathTool {
    fn kind(&self) -> ToolKind {
        match self.mode {
            PathMode::Bezier => ToolKind::Bezier,
            PathMode::Polyline => ToolKind::Polyline,
        }
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> ToolOutcome {
        let InputEvent::PointerDown { x, y, .. } = event else {
            return ToolOutcome::None;
        };
        if let [fx, fy, ..] = self.points[..]
            && self.points.len() >= 6
            && (x - fx).hypot(y - fy) < ctx.config.close_threshold
        {
            let mut points = std::mem::take(&mut self.points);
            points.extend([fx, fy]);
            let shape = draft(ctx.settings, 0.0, 0.0, self.kind_for(points, true), true);
            log::debug!("{} closed", shape.shape_type().as_str());
            return commit(shape);
        }
        self.points.extend([*x, *y]);
        ToolOutcome::Preview(self.overlay(ctx.settings))
    }

    fn finish(&mut self, ctx: &ToolContext) -> ToolOutcome {
        let points = std::mem::take(&mut self.points);
        if points.len() >= self.min_open_coords() {
            commit(draft(ctx.settings, 0.0, 0.0, self.kind_for(points, false), false))
        } else {
            if !points.is_empty() {
                log::debug!("open path with {} coordinates discarded", points.len());
            }
            ToolOutcome::Discard
        }
    }

    fn reset(&mut self) {
        self.points.clear();
    }
}

// ─── Image Tool ──────────────────────────────────────────────────────────

/// Places the staged image with its top-left corner at the click.
pub struct ImageTool;

impl ImageTool {
    /// Uniform scale that fits an image of this natural size within `max`.
    pub fn fit_scale(width: f64, height: f64, max: f64) -> f64 {
        if width > max || height > max {
            max / width.max(height)
        } else {
            1.0
        }
    }
}

impl Tool for ImageTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Image
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> ToolOutcome {
        let InputEvent::PointerDown { x, y, .. } = event else {
            return ToolOutcome::None;
        };
        let Some(image) = ctx.pending_image else {
            log::debug!("image tool click without a pending image");
            return ToolOutcome::None;
        };
        let scale = Self::fit_scale(image.width, image.height, ctx.config.max_image_size);
        let mut shape = Shape::new(
            *x,
            *y,
            ShapeKind::Image {
                src: image.src.clone(),
                width: image.width * scale,
                height: image.height * scale,
            },
        )
        .fill("");
        shape.scale_x = Some(scale);
        shape.scale_y = Some(scale);
        ToolOutcome::Commit(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx<'a>(settings: &'a DrawingSettings, config: &'a EditorConfig) -> ToolContext<'a> {
        ToolContext {
            settings,
            config,
            hit: None,
            pending_image: None,
        }
    }

    fn committed(outcome: ToolOutcome) -> Shape {
        match outcome {
            ToolOutcome::Commit(shape) => shape,
            other => panic!("expected a commit, got {other:?}"),
        }
    }

    #[test]
    fn tool_kind_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ToolKind::parse("lasso"), None);
    }

    #[test]
    fn rect_drag_normalizes_reversed_drag() {
        let (settings, config) = (DrawingSettings::default(), EditorConfig::default());
        let c = ctx(&settings, &config);
        let mut tool = DragTool::new(DragShape::Rectangle);
        tool.handle(&InputEvent::down(30.0, 40.0), &c);
        let shape = committed(tool.handle(&InputEvent::up(10.0, 10.0), &c));
        assert_eq!((shape.x, shape.y), (10.0, 10.0));
        assert_eq!(
            shape.kind,
            ShapeKind::Rectangle {
                width: 20.0,
                height: 30.0,
                corner_radius: 0.0
            }
        );
        assert_eq!(shape.fill_color, "#ffffff");
        assert_ne!(shape.id, preview_id());
    }

    #[test]
    fn ellipse_is_centred_on_the_drag_midpoint() {
        let (settings, config) = (DrawingSettings::default(), EditorConfig::default());
        let c = ctx(&settings, &config);
        let mut tool = DragTool::new(DragShape::Ellipse);
        tool.handle(&InputEvent::down(0.0, 0.0), &c);
        let shape = committed(tool.handle(&InputEvent::up(40.0, 20.0), &c));
        assert_eq!((shape.x, shape.y), (20.0, 10.0));
        assert_eq!(
            shape.kind,
            ShapeKind::Ellipse {
                radius_x: 20.0,
                radius_y: 10.0
            }
        );
    }

    #[test]
    fn line_needs_span_on_one_axis() {
        let (settings, config) = (DrawingSettings::default(), EditorConfig::default());
        let c = ctx(&settings, &config);
        let mut tool = DragTool::new(DragShape::Line);
        tool.handle(&InputEvent::down(10.0, 10.0), &c);
        let shape = committed(tool.handle(&InputEvent::up(30.0, 11.0), &c));
        assert_eq!(shape.kind.points(), Some(&[10.0, 10.0, 30.0, 11.0][..]));
        assert_eq!((shape.x, shape.y), (0.0, 0.0));
        assert_eq!(shape.fill_color, "transparent");

        tool.handle(&InputEvent::down(10.0, 10.0), &c);
        assert_eq!(tool.handle(&InputEvent::up(12.0, 13.0), &c), ToolOutcome::Discard);
    }

    #[test]
    fn move_without_press_does_nothing() {
        let (settings, config) = (DrawingSettings::default(), EditorConfig::default());
        let mut tool = DragTool::new(DragShape::Circle);
        assert_eq!(
            tool.handle(&InputEvent::moved(5.0, 5.0), &ctx(&settings, &config)),
            ToolOutcome::None
        );
    }

    #[test]
    fn path_markers_and_dashed_preview() {
        let (settings, config) = (DrawingSettings::default(), EditorConfig::default());
        let c = ctx(&settings, &config);
        let mut tool = PathTool::new(PathMode::Polyline);
        let ToolOutcome::Preview(first) = tool.handle(&InputEvent::down(0.0, 0.0), &c) else {
            panic!("expected preview");
        };
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].geometry, Geometry::Circle { radius: 6.0 });
        assert_eq!(first[0].stroke.as_deref(), Some("#ffffff"));

        let ToolOutcome::Preview(second) = tool.handle(&InputEvent::down(10.0, 0.0), &c) else {
            panic!("expected preview");
        };
        assert_eq!(second.len(), 3);
        assert_eq!(second[0].dash, Some([5.0, 5.0]));
        assert_eq!(second[0].fill, None);
        assert_eq!(second[2].geometry, Geometry::Circle { radius: 4.0 });
    }

    #[test]
    fn polyline_finish_needs_two_points() {
        let (settings, config) = (DrawingSettings::default(), EditorConfig::default());
        let c = ctx(&settings, &config);
        let mut tool = PathTool::new(PathMode::Polyline);
        tool.handle(&InputEvent::down(0.0, 0.0), &c);
        assert_eq!(tool.finish(&c), ToolOutcome::Discard);

        tool.handle(&InputEvent::down(0.0, 0.0), &c);
        tool.handle(&InputEvent::down(10.0, 10.0), &c);
        let shape = committed(tool.finish(&c));
        assert_eq!(
            shape.kind,
            ShapeKind::Polyline {
                points: smallvec::smallvec![0.0, 0.0, 10.0, 10.0],
                closed: Some(false)
            }
        );
        assert!(tool.points().is_empty());
    }

    #[test]
    fn closing_needs_three_points() {
        let (settings, config) = (DrawingSettings::default(), EditorConfig::default());
        let c = ctx(&settings, &config);
        let mut tool = PathTool::new(PathMode::Bezier);
        tool.handle(&InputEvent::down(0.0, 0.0), &c);
        tool.handle(&InputEvent::down(50.0, 0.0), &c);
        // Near the first point, but only two points so far.
        assert!(matches!(
            tool.handle(&InputEvent::down(3.0, 3.0), &c),
            ToolOutcome::Preview(_)
        ));
        assert_eq!(tool.points().len(), 6);
    }

    #[test]
    fn reset_clears_the_buffer() {
        let (settings, config) = (DrawingSettings::default(), EditorConfig::default());
        let mut tool = PathTool::new(PathMode::Bezier);
        tool.handle(&InputEvent::down(0.0, 0.0), &ctx(&settings, &config));
        tool.reset();
        assert!(tool.points().is_empty());
    }

    #[test]
    fn image_is_scaled_to_fit() {
        let (settings, config) = (DrawingSettings::default(), EditorConfig::default());
        let pending = PendingImage {
            src: "data:image/png;base64,AAAA".into(),
            width: 800.0,
            height: 600.0,
        };
        let c = ToolContext {
            pending_image: Some(&pending),
            ..ctx(&settings, &config)
        };
        let shape = committed(ImageTool.handle(&InputEvent::down(12.0, 34.0), &c));
        assert_eq!((shape.x, shape.y), (12.0, 34.0));
        assert_eq!(shape.scale(), (0.5, 0.5));
        assert_eq!(
            shape.kind,
            ShapeKind::Image {
                src: pending.src.clone(),
                width: 400.0,
                height: 300.0
            }
        );
        assert_eq!(shape.stroke_width, 0.0);
    }

    #[test]
    fn image_click_without_pending_is_ignored() {
        let (settings, config) = (DrawingSettings::default(), EditorConfig::default());
        assert_eq!(
            ImageTool.handle(&InputEvent::down(0.0, 0.0), &ctx(&settings, &config)),
            ToolOutcome::None
        );
    }

    #[test]
    fn delete_and_select_follow_the_hit() {
        let (settings, config) = (DrawingSettings::default(), EditorConfig::default());
        let id = ShapeId::intern("target");
        let c = ToolContext {
            hit: Some(id),
            ..ctx(&settings, &config)
        };
        assert_eq!(DeleteTool.handle(&InputEvent::down(0.0, 0.0), &c), ToolOutcome::Delete(id));
        assert_eq!(
            SelectTool.handle(&InputEvent::down(0.0, 0.0), &c),
            ToolOutcome::Select(Some(id))
        );
        assert_eq!(
            SelectTool.handle(&InputEvent::down(0.0, 0.0), &ctx(&settings, &config)),
            ToolOutcome::Select(None)
        );
    }
}
