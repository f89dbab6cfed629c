//! Canvas synchronizer: shape model ↔ retained surface.
//!
//! - **Model → surface**: every forward sync clears the surface's shape
//!   primitives and rebuilds one per shape, in list order, with every
//!   attribute applied. Cheap at this scale, and it means the surface can
//!   never drift from the model.
//!
//! - **Surface → model**: when a drag/scale/rotate gesture completes, the
//!   primitive's final transform is read back and normalized into a
//!   [`ShapePatch`]. Scale is folded into the shape's own dimensions where
//!   the kind allows it, and the primitive's scale is reset so the next
//!   gesture starts from 1 instead of compounding.
//!
//! A circle scaled non-uniformly becomes an ellipse in the model but keeps
//! rendering through its original circle primitive with a per-axis scale.
//! The ellipse stores that scale in `scaleX`/`scaleY`, so the base circle is
//! recovered from the shape itself (see [`promoted_base`]) and survives
//! undo, redo and snapshot round trips.
//!
//! Path-like shapes (line, bezier, polyline) keep their points where they
//! were drawn; `x`/`y` is an offset added to the points' own top-left.

use crate::tools::ToolKind;
use sg_core::color::Rgba;
use sg_core::path::{bounds, spline};
use sg_core::{BackgroundImage, CanvasDimensions, Shadow, Shape, ShapeId, ShapeKind, ShapePatch};
use sg_render::geom::normalize_commands;
use sg_render::{
    CanvasTheme, Geometry, Primitive, PrimitiveShadow, SurfaceAdapter, SurfaceScene,
};

/// Editor state the forward sync projects besides the shapes themselves.
#[derive(Debug, Clone, Copy)]
pub struct SceneState {
    pub dimensions: CanvasDimensions,
    pub tool: ToolKind,
    pub selected: Option<ShapeId>,
    pub theme: CanvasTheme,
}

pub struct CanvasSync {
    surface: Box<dyn SurfaceAdapter>,
    background: Option<(Option<BackgroundImage>, CanvasDimensions)>,
    uniform_epsilon: f64,
}

impl CanvasSync {
    pub fn new(surface: Box<dyn SurfaceAdapter>, uniform_epsilon: f64) -> Self {
        Self {
            surface,
            background: None,
            uniform_epsilon,
        }
    }

    pub fn surface(&self) -> &dyn SurfaceAdapter {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> &mut dyn SurfaceAdapter {
        self.surface.as_mut()
    }

    /// Rebuild every shape primitive from the model.
    pub fn render(&mut self, shapes: &[Shape], state: SceneState) {
        let interactive = state.tool == ToolKind::Select;
        let primitives = shapes
            .iter()
            .map(|shape| {
                let mut prim = match promoted_base(shape) {
                    Some(base) => promoted_primitive(shape, base),
                    None => primitive_for(shape),
                };
                prim.id = Some(shape.id);
                prim.interactive = interactive;
                prim
            })
            .collect::<Vec<_>>();
        log::trace!("forward sync: {} primitives", primitives.len());
        self.surface.render(SurfaceScene {
            dimensions: state.dimensions,
            theme: state.theme,
            primitives,
            active: state.selected.filter(|_| interactive),
        });
    }

    /// Install the background layer if the image or the canvas size changed.
    pub fn sync_background(&mut self, bg: Option<&BackgroundImage>, dims: CanvasDimensions) {
        let next = (bg.cloned(), dims);
        if self.background.as_ref() == Some(&next) {
            return;
        }
        self.surface.set_background(bg, dims);
        self.background = Some(next);
    }

    pub fn show_overlay(&mut self, overlay: Vec<Primitive>) {
        self.surface.set_overlay(overlay);
    }

    pub fn clear_overlay(&mut self) {
        if !self.surface.surface().overlay().is_empty() {
            self.surface.set_overlay(Vec::new());
        }
    }

    /// Ids whose gestures finished since the last call.
    pub fn take_completed(&mut self) -> Vec<ShapeId> {
        self.surface.take_completed_gestures()
    }

    /// Read back a finished gesture on `shape`'s primitive.
    ///
    /// Returns the patch to apply to the model, or `None` if the shape has
    /// no primitive. The primitive is normalized in place.
    pub fn complete_gesture(&mut self, shape: &Shape) -> Option<ShapePatch> {
        let eps = self.uniform_epsilon;
        let prim = self.surface.primitive_mut(shape.id)?;
        let patch = normalize_transform(shape, prim, eps);
        if patch.promote_to_ellipse {
            log::debug!("circle {} promoted to ellipse", shape.id);
        }
        Some(patch)
    }
}

// ─── Model → surface ─────────────────────────────────────────────────────

fn stroke_of(shape: &Shape) -> Option<String> {
    (shape.stroke_width > 0.0 && !shape.stroke_color.is_empty()).then(|| shape.stroke_color.clone())
}

fn shadow_of(shape: &Shape) -> Option<PrimitiveShadow> {
    let shadow = shape.shadow.as_ref().filter(|s| s.enabled)?;
    let base = Rgba::from_hex(&shadow.color).unwrap_or(Rgba::BLACK);
    let opacity = if shadow.opacity > 0.0 { shadow.opacity } else { 1.0 };
    Some(PrimitiveShadow {
        color: base.with_alpha(opacity).to_css_rgba(),
        blur: shadow.blur,
        offset_x: shadow.offset_x,
        offset_y: shadow.offset_y,
    })
}

/// Top-left of a path-like shape's drawn geometry before its offset.
/// `None` for kinds positioned directly by `x`/`y`.
pub fn natural_origin(kind: &ShapeKind) -> Option<(f64, f64)> {
    match kind {
        ShapeKind::Line { points } | ShapeKind::Polyline { points, .. } => {
            bounds(points).map(|(x0, y0, _, _)| (x0, y0))
        }
        ShapeKind::Bezier { points, closed } => {
            Some(normalize_commands(&spline(points, closed.unwrap_or(false))).1)
        }
        _ => None,
    }
}

/// Radius of the circle primitive a promoted ellipse is drawn through.
///
/// An ellipse is promoted when it carries a persisted scale whose axes both
/// map back to the same base radius.
pub fn promoted_base(shape: &Shape) -> Option<f64> {
    let ShapeKind::Ellipse { radius_x, radius_y } = shape.kind else {
        return None;
    };
    let (sx, sy) = (shape.scale_x?, shape.scale_y?);
    if sx <= 0.0 || sy <= 0.0 {
        return None;
    }
    let (bx, by) = (radius_x / sx, radius_y / sy);
    ((bx - by).abs() <= 1e-6 * bx.max(by).max(1.0) && bx > 0.0).then_some(bx)
}

/// Build the surface primitive for a shape. The result has no id and is
/// not interactive; callers set both.
pub fn primitive_for(shape: &Shape) -> Primitive {
    let (sx, sy) = shape.scale();
    let closed = shape.kind.is_closed();
    let mut prim = match &shape.kind {
        ShapeKind::Rectangle {
            width,
            height,
            corner_radius,
        } => Primitive::new(Geometry::Rect {
            width: *width,
            height: *height,
            rx: *corner_radius,
        })
        .at(shape.x, shape.y),
        ShapeKind::Circle { radius } => {
            Primitive::new(Geometry::Circle { radius: *radius })
                .at(shape.x, shape.y)
                .centered()
        }
        ShapeKind::Ellipse { radius_x, radius_y } => Primitive::new(Geometry::Ellipse {
            rx: radius_x / sx,
            ry: radius_y / sy,
        })
        .at(shape.x, shape.y)
        .centered(),
        ShapeKind::Line { points } => {
            let (x0, y0, _, _) = bounds(points).unwrap_or_default();
            let p = |i: usize| points.get(i).copied().unwrap_or_default();
            Primitive::new(Geometry::Line {
                x1: p(0) - x0,
                y1: p(1) - y0,
                x2: p(2) - x0,
                y2: p(3) - y0,
            })
            .at(x0 + shape.x, y0 + shape.y)
        }
        ShapeKind::Bezier { points, .. } => {
            let (commands, (x0, y0)) = normalize_commands(&spline(points, closed));
            Primitive::new(Geometry::Path { commands }).at(x0 + shape.x, y0 + shape.y)
        }
        ShapeKind::Polyline { points, .. } => {
            let (x0, y0, _, _) = bounds(points).unwrap_or_default();
            let local = points
                .chunks_exact(2)
                .flat_map(|p| [p[0] - x0, p[1] - y0])
                .collect();
            Primitive::new(Geometry::Polyline {
                points: local,
                closed,
            })
            .at(x0 + shape.x, y0 + shape.y)
        }
        ShapeKind::Image { src, width, height } => Primitive::new(Geometry::Image {
            src: src.clone(),
            width: width / sx,
            height: height / sy,
        })
        .at(shape.x, shape.y),
    };

    prim.angle = shape.rotation;
    prim.scale_x = sx;
    prim.scale_y = sy;
    prim.opacity = shape.opacity;
    prim.stroke_width = shape.stroke_width;
    prim.stroke = stroke_of(shape);
    prim.fill = match shape.kind {
        ShapeKind::Bezier { .. } | ShapeKind::Polyline { .. } if !closed => None,
        ShapeKind::Line { .. } | ShapeKind::Image { .. } => None,
        _ => Some(shape.fill_color.clone()),
    };
    prim.shadow = shadow_of(shape);
    prim
}

/// A promoted ellipse drawn through its original circle primitive. The
/// persisted scale stays on the primitive, stroke included.
fn promoted_primitive(shape: &Shape, base: f64) -> Primitive {
    let mut prim = primitive_for(shape);
    prim.geometry = Geometry::Circle { radius: base };
    prim
}

// ─── Surface → model ─────────────────────────────────────────────────────

/// Fold a primitive's final transform into a patch for `shape`.
///
/// Rectangles, ellipses and uniformly scaled circles absorb scale into
/// their size and the primitive's scale is reset to 1. Lines absorb it into
/// their endpoints and drop their offset. Paths and images keep the scale on
/// the shape; promoted ellipses keep it too. A path's position is read back
/// as an offset from its points.
pub fn normalize_transform(shape: &Shape, prim: &mut Primitive, uniform_epsilon: f64) -> ShapePatch {
    let (sx, sy) = (prim.scale_x, prim.scale_y);
    let mut patch = ShapePatch {
        x: Some(prim.left),
        y: Some(prim.top),
        rotation: Some(prim.angle),
        ..Default::default()
    };
    let mut reset = true;

    match &mut prim.geometry {
        Geometry::Rect { width, height, .. } => {
            *width *= sx;
            *height *= sy;
            patch.width = Some(*width);
            patch.height = Some(*height);
        }
        Geometry::Circle { radius } => {
            let r = *radius;
            let promoted = matches!(shape.kind, ShapeKind::Ellipse { .. });
            if promoted || (sx - sy).abs() > uniform_epsilon {
                patch.promote_to_ellipse = !promoted;
                patch.radius_x = Some(r * sx);
                patch.radius_y = Some(r * sy);
                patch.scale_x = Some(sx);
                patch.scale_y = Some(sy);
                reset = false;
            } else {
                *radius = r * sx.max(sy);
                patch.radius = Some(*radius);
            }
        }
        Geometry::Ellipse { rx, ry } => {
            *rx *= sx;
            *ry *= sy;
            patch.radius_x = Some(*rx);
            patch.radius_y = Some(*ry);
            if shape.scale_x.is_some() || shape.scale_y.is_some() {
                patch.scale_x = Some(1.0);
                patch.scale_y = Some(1.0);
            }
        }
        Geometry::Line { x1, y1, x2, y2 } => {
            *x1 *= sx;
            *y1 *= sy;
            *x2 *= sx;
            *y2 *= sy;
            patch.points = Some(smallvec::smallvec![
                prim.left + *x1,
                prim.top + *y1,
                prim.left + *x2,
                prim.top + *y2,
            ]);
            patch.x = Some(0.0);
            patch.y = Some(0.0);
        }
        Geometry::Path { .. } | Geometry::Polyline { .. } => {
            let (x0, y0) = natural_origin(&shape.kind).unwrap_or_default();
            patch.x = Some(prim.left - x0);
            patch.y = Some(prim.top - y0);
            patch.scale_x = Some(sx);
            patch.scale_y = Some(sy);
            reset = false;
        }
        Geometry::Image { width, height, .. } => {
            patch.scale_x = Some(sx);
            patch.scale_y = Some(sy);
            patch.width = Some(*width * sx);
            patch.height = Some(*height * sy);
            reset = false;
        }
    }
    if reset {
        prim.scale_x = 1.0;
        prim.scale_y = 1.0;
    }

    if let Some(shadow) = &prim.shadow {
        let (color, opacity) = match Rgba::parse(&shadow.color) {
            Some(c) => (c.to_hex(), c.a),
            None => (shadow.color.clone(), 1.0),
        };
        patch.shadow = Some(Some(Shadow {
            color,
            blur: shadow.blur,
            offset_x: shadow.offset_x,
            offset_y: shadow.offset_y,
            opacity,
            enabled: true,
        }));
    }
    patch
}
