//! Retained-mode drawing surface.
//!
//! The surface owns one [`Primitive`] per shape plus a background layer and
//! a non-interactive overlay (tool previews and path markers). Primitives
//! are mutated in place while the user drags, scales or rotates them; when
//! a gesture finishes, the primitive's id is queued so the editor can fold
//! the final transform back into the shape model.
//!
//! Backends implement [`SurfaceAdapter`] and decide how the retained state
//! is actually drawn (Canvas2D in the browser, Vello, or nothing at all).

use crate::geom;
use crate::hit;
use crate::raster::{self, RasterError};
use kurbo::{Affine, Point, Rect, Vec2};
use sg_core::path::PathCmd;
use sg_core::{BackgroundImage, CanvasDimensions, ShapeId};

/// Smallest scale a gesture may produce on either axis.
pub const MIN_SCALE: f64 = 0.01;

/// Distance of the rotation handle above the top edge, in canvas units.
pub const ROTATE_HANDLE_OFFSET: f64 = 30.0;

// ─── Primitives ──────────────────────────────────────────────────────────

/// Where `left`/`top` sit on the primitive's local box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    #[default]
    TopLeft,
    Center,
}

/// Unscaled local geometry. Coordinates are relative to the local box,
/// whose top-left corner is `(0, 0)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Rect { width: f64, height: f64, rx: f64 },
    Circle { radius: f64 },
    Ellipse { rx: f64, ry: f64 },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
    Path { commands: Vec<PathCmd> },
    Polyline { points: Vec<f64>, closed: bool },
    /// `width`/`height` are the intrinsic pixel size of the image.
    Image { src: String, width: f64, height: f64 },
}

/// Shadow as the surface carries it: a translucent CSS color.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveShadow {
    pub color: String,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

/// One retained graphical object.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Shape this primitive mirrors. `None` for overlay objects.
    pub id: Option<ShapeId>,
    pub geometry: Geometry,
    pub left: f64,
    pub top: f64,
    /// Degrees, clockwise, about the origin point.
    pub angle: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub origin: Origin,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub opacity: f64,
    pub shadow: Option<PrimitiveShadow>,
    /// `[dash, gap]` stroke pattern.
    pub dash: Option<[f64; 2]>,
    /// Selectable and draggable.
    pub interactive: bool,
}

impl Primitive {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            geometry,
            left: 0.0,
            top: 0.0,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            origin: Origin::TopLeft,
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            opacity: 1.0,
            shadow: None,
            dash: None,
            interactive: false,
        }
    }

    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn centered(mut self) -> Self {
        self.origin = Origin::Center;
        self
    }

    pub fn fill(mut self, color: impl Into<String>) -> Self {
        self.fill = Some(color.into());
        self
    }

    pub fn stroke(mut self, color: impl Into<String>, width: f64) -> Self {
        self.stroke = Some(color.into());
        self.stroke_width = width;
        self
    }

    pub fn dashed(mut self, dash: f64, gap: f64) -> Self {
        self.dash = Some([dash, gap]);
        self
    }

    /// Unscaled local box size.
    pub fn size(&self) -> (f64, f64) {
        geom::size(&self.geometry)
    }

    pub fn local_box(&self) -> Rect {
        let (w, h) = self.size();
        Rect::new(0.0, 0.0, w, h)
    }

    /// Local box → canvas coordinates.
    pub fn transform(&self) -> Affine {
        let (w, h) = self.size();
        let origin = match self.origin {
            Origin::TopLeft => Vec2::ZERO,
            Origin::Center => Vec2::new(-w / 2.0, -h / 2.0),
        };
        let mut t = Affine::translate((self.left, self.top));
        if self.angle != 0.0 {
            t *= Affine::rotate(self.angle.to_radians());
        }
        t * Affine::scale_non_uniform(self.scale_x, self.scale_y) * Affine::translate(origin)
    }

    /// Axis-aligned bounds in canvas coordinates.
    pub fn world_bounds(&self) -> Rect {
        self.transform().transform_rect_bbox(self.local_box())
    }

    /// Centre of the local box in canvas coordinates.
    pub fn world_center(&self) -> Point {
        self.transform() * self.local_box().center()
    }

    /// Whether the primitive paints an interior.
    pub fn is_filled(&self) -> bool {
        match &self.geometry {
            Geometry::Image { .. } => true,
            Geometry::Line { .. } => false,
            _ => self
                .fill
                .as_deref()
                .is_some_and(|f| !sg_core::color::is_transparent(f)),
        }
    }

    fn same_transform(&self, other: &Primitive) -> bool {
        self.left == other.left
            && self.top == other.top
            && self.angle == other.angle
            && self.scale_x == other.scale_x
            && self.scale_y == other.scale_y
    }
}

// ─── Background & theme ──────────────────────────────────────────────────

/// Background image stretched independently on each axis to fill the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundLayer {
    pub url: String,
    pub natural_width: f64,
    pub natural_height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub opacity: f64,
}

impl BackgroundLayer {
    pub fn fit(bg: &BackgroundImage, dims: CanvasDimensions) -> Self {
        let ratio = |canvas: f64, natural: f64| {
            if natural > 0.0 { canvas / natural } else { 1.0 }
        };
        Self {
            url: bg.url.clone(),
            natural_width: bg.width,
            natural_height: bg.height,
            scale_x: ratio(dims.width, bg.width),
            scale_y: ratio(dims.height, bg.height),
            opacity: bg.opacity,
        }
    }
}

/// Canvas background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanvasTheme {
    #[default]
    Light,
    Dark,
}

impl CanvasTheme {
    pub fn background_color(self) -> &'static str {
        match self {
            CanvasTheme::Light => "#ffffff",
            CanvasTheme::Dark => "#1a1a1a",
        }
    }
}

// ─── Gestures ────────────────────────────────────────────────────────────

/// Transform control around the active primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    Rotate,
}

impl Handle {
    pub const SCALE: [Handle; 8] = [
        Handle::TopLeft,
        Handle::Top,
        Handle::TopRight,
        Handle::Right,
        Handle::BottomRight,
        Handle::Bottom,
        Handle::BottomLeft,
        Handle::Left,
    ];

    /// Position on the local box. The rotation handle sits above the
    /// top edge, compensated for vertical scale.
    pub fn local(self, prim: &Primitive) -> Point {
        let (w, h) = prim.size();
        match self {
            Handle::TopLeft => Point::new(0.0, 0.0),
            Handle::Top => Point::new(w / 2.0, 0.0),
            Handle::TopRight => Point::new(w, 0.0),
            Handle::Right => Point::new(w, h / 2.0),
            Handle::BottomRight => Point::new(w, h),
            Handle::Bottom => Point::new(w / 2.0, h),
            Handle::BottomLeft => Point::new(0.0, h),
            Handle::Left => Point::new(0.0, h / 2.0),
            Handle::Rotate => {
                let sy = if prim.scale_y.abs() > MIN_SCALE { prim.scale_y } else { 1.0 };
                Point::new(w / 2.0, -ROTATE_HANDLE_OFFSET / sy)
            }
        }
    }

    fn opposite(self) -> Handle {
        match self {
            Handle::TopLeft => Handle::BottomRight,
            Handle::Top => Handle::Bottom,
            Handle::TopRight => Handle::BottomLeft,
            Handle::Right => Handle::Left,
            Handle::BottomRight => Handle::TopLeft,
            Handle::Bottom => Handle::Top,
            Handle::BottomLeft => Handle::TopRight,
            Handle::Left => Handle::Right,
            Handle::Rotate => Handle::Rotate,
        }
    }

    /// Which axes the handle scales.
    fn axes(self) -> (bool, bool) {
        match self {
            Handle::Top | Handle::Bottom => (false, true),
            Handle::Left | Handle::Right => (true, false),
            Handle::Rotate => (false, false),
            _ => (true, true),
        }
    }

    fn is_corner(self) -> bool {
        matches!(
            self,
            Handle::TopLeft | Handle::TopRight | Handle::BottomLeft | Handle::BottomRight
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Scale(Handle),
    Rotate,
}

#[derive(Debug, Clone)]
struct ActiveGesture {
    id: ShapeId,
    kind: GestureKind,
    start: Primitive,
    start_pointer: Point,
}

// ─── Retained state ──────────────────────────────────────────────────────

/// Everything a forward sync pushes to the surface in one go.
#[derive(Debug, Clone, Default)]
pub struct SurfaceScene {
    pub dimensions: CanvasDimensions,
    pub theme: CanvasTheme,
    pub primitives: Vec<Primitive>,
    /// Primitive to re-select after the rebuild.
    pub active: Option<ShapeId>,
}

#[derive(Debug, Default)]
pub struct RetainedSurface {
    pub dimensions: CanvasDimensions,
    pub theme: CanvasTheme,
    primitives: Vec<Primitive>,
    overlay: Vec<Primitive>,
    background: Option<BackgroundLayer>,
    active: Option<ShapeId>,
    gesture: Option<ActiveGesture>,
    completed: Vec<ShapeId>,
}

impl RetainedSurface {
    pub fn new(dimensions: CanvasDimensions) -> Self {
        Self {
            dimensions,
            ..Default::default()
        }
    }

    /// Replace every shape primitive. Background and overlay are kept.
    pub fn load(&mut self, scene: SurfaceScene) {
        if let Some(g) = self.gesture.take() {
            log::debug!("surface rebuilt during gesture on {}; gesture dropped", g.id);
        }
        self.dimensions = scene.dimensions;
        self.theme = scene.theme;
        self.primitives = scene.primitives;
        self.active = scene.active.filter(|id| {
            self.primitives
                .iter()
                .any(|p| p.id == Some(*id) && p.interactive)
        });
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn overlay(&self) -> &[Primitive] {
        &self.overlay
    }

    pub fn set_overlay(&mut self, overlay: Vec<Primitive>) {
        self.overlay = overlay;
    }

    pub fn background(&self) -> Option<&BackgroundLayer> {
        self.background.as_ref()
    }

    pub fn set_background(&mut self, layer: Option<BackgroundLayer>) {
        self.background = layer;
    }

    pub fn active(&self) -> Option<ShapeId> {
        self.active
    }

    pub fn set_active(&mut self, id: Option<ShapeId>) {
        self.active = id;
    }

    pub fn primitive(&self, id: ShapeId) -> Option<&Primitive> {
        self.primitives.iter().find(|p| p.id == Some(id))
    }

    pub fn primitive_mut(&mut self, id: ShapeId) -> Option<&mut Primitive> {
        self.primitives.iter_mut().find(|p| p.id == Some(id))
    }

    pub fn in_gesture(&self) -> bool {
        self.gesture.is_some()
    }

    /// Start a direct-manipulation gesture at a canvas point.
    ///
    /// A handle of the active primitive wins over the primitives beneath
    /// it. Returns the id of the primitive now being manipulated, or `None`
    /// when the point hits empty canvas (which also clears the active
    /// primitive).
    pub fn begin_gesture(&mut self, x: f64, y: f64) -> Option<ShapeId> {
        let pointer = Point::new(x, y);
        let target = match self.active.zip(hit::handle_at(self, pointer)) {
            Some((id, Handle::Rotate)) => Some((id, GestureKind::Rotate)),
            Some((id, handle)) => Some((id, GestureKind::Scale(handle))),
            None => hit::hit_test(self, pointer).map(|id| (id, GestureKind::Move)),
        };
        let Some((id, kind)) = target else {
            self.active = None;
            self.gesture = None;
            return None;
        };
        let start = self.primitive(id)?.clone();
        self.active = Some(id);
        self.gesture = Some(ActiveGesture {
            id,
            kind,
            start,
            start_pointer: pointer,
        });
        log::trace!("gesture {kind:?} started on {id}");
        Some(id)
    }

    /// Apply the pointer's current position to the gesture's primitive.
    /// Only the primitive changes; nothing is reported until the gesture ends.
    pub fn update_gesture(&mut self, x: f64, y: f64) {
        let Some(gesture) = self.gesture.clone() else {
            return;
        };
        let pointer = Point::new(x, y);
        let Some(prim) = self.primitive_mut(gesture.id) else {
            return;
        };
        let start = &gesture.start;
        match gesture.kind {
            GestureKind::Move => {
                let delta = pointer - gesture.start_pointer;
                prim.left = start.left + delta.x;
                prim.top = start.top + delta.y;
            }
            GestureKind::Scale(handle) => {
                let inverse = start.transform().inverse();
                let local = inverse * pointer;
                let h = handle.local(start);
                let a = handle.opposite().local(start);
                let (use_x, use_y) = handle.axes();
                let factor = |on: bool, p: f64, h: f64, a: f64| {
                    if on && (h - a).abs() > f64::EPSILON {
                        (p - a) / (h - a)
                    } else {
                        1.0
                    }
                };
                let mut fx = factor(use_x, local.x, h.x, a.x);
                let mut fy = factor(use_y, local.y, h.y, a.y);
                if handle.is_corner() {
                    let f = (fx + fy) / 2.0;
                    fx = f;
                    fy = f;
                }
                prim.scale_x = (start.scale_x * fx).max(MIN_SCALE);
                prim.scale_y = (start.scale_y * fy).max(MIN_SCALE);
                pin(prim, start, a);
            }
            GestureKind::Rotate => {
                let center = start.world_center();
                let v = pointer - center;
                let angle = v.y.atan2(v.x).to_degrees() + 90.0;
                prim.angle = angle.rem_euclid(360.0);
                pin(prim, start, start.local_box().center());
            }
        }
    }

    /// Finish the gesture. The primitive is queued for reverse sync only if
    /// its transform actually changed.
    pub fn end_gesture(&mut self) -> Option<ShapeId> {
        let gesture = self.gesture.take()?;
        let changed = self
            .primitive(gesture.id)
            .is_some_and(|p| !p.same_transform(&gesture.start));
        if changed {
            self.completed.push(gesture.id);
            log::trace!("gesture {:?} completed on {}", gesture.kind, gesture.id);
        }
        Some(gesture.id)
    }

    pub fn cancel_gesture(&mut self) {
        if let Some(g) = self.gesture.take()
            && let Some(prim) = self.primitive_mut(g.id)
        {
            *prim = g.start;
        }
    }

    /// Drain ids of primitives whose gestures completed since the last call.
    pub fn take_completed(&mut self) -> Vec<ShapeId> {
        std::mem::take(&mut self.completed)
    }
}

/// Shift `prim` so that the local point `anchor` lands where it did on `start`.
fn pin(prim: &mut Primitive, start: &Primitive, anchor: Point) {
    let before = start.transform() * anchor;
    prim.left = start.left;
    prim.top = start.top;
    let after = prim.transform() * anchor;
    prim.left += before.x - after.x;
    prim.top += before.y - after.y;
}

// ─── Adapter ─────────────────────────────────────────────────────────────

/// A concrete drawing backend behind the retained surface.
pub trait SurfaceAdapter {
    fn surface(&self) -> &RetainedSurface;
    fn surface_mut(&mut self) -> &mut RetainedSurface;

    /// Draw the current retained state.
    fn present(&mut self);

    /// Hook for backends that decode the background image asynchronously.
    fn background_changed(&mut self) {}

    /// Rebuild all shape primitives and redraw.
    fn render(&mut self, scene: SurfaceScene) {
        self.surface_mut().load(scene);
        self.present();
    }

    /// Tear down the background layer and install a new one, if any.
    fn set_background(&mut self, bg: Option<&BackgroundImage>, dims: CanvasDimensions) {
        let layer = bg
            .filter(|b| !b.url.is_empty())
            .map(|b| BackgroundLayer::fit(b, dims));
        self.surface_mut().set_background(layer);
        self.background_changed();
        self.present();
    }

    fn set_overlay(&mut self, overlay: Vec<Primitive>) {
        self.surface_mut().set_overlay(overlay);
        self.present();
    }

    fn primitive(&self, id: ShapeId) -> Option<&Primitive> {
        self.surface().primitive(id)
    }

    fn primitive_mut(&mut self, id: ShapeId) -> Option<&mut Primitive> {
        self.surface_mut().primitive_mut(id)
    }

    /// Ids whose gestures completed since the last call.
    fn take_completed_gestures(&mut self) -> Vec<ShapeId> {
        self.surface_mut().take_completed()
    }

    /// PNG snapshot of the surface at `multiplier` × its dimensions.
    fn export_raster(&self, multiplier: f64) -> Result<Vec<u8>, RasterError> {
        raster::render_png(self.surface(), multiplier)
    }
}

/// A surface that draws nothing and counts redraws.
///
/// Used by the command-line exporter and in tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    surface: RetainedSurface,
    pub presents: usize,
    pub background_loads: usize,
}

impl RecordingSurface {
    pub fn new(dimensions: CanvasDimensions) -> Self {
        Self {
            surface: RetainedSurface::new(dimensions),
            ..Default::default()
        }
    }
}

impl SurfaceAdapter for RecordingSurface {
    fn surface(&self) -> &RetainedSurface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut RetainedSurface {
        &mut self.surface
    }

    fn present(&mut self) {
        self.presents += 1;
    }

    fn background_changed(&mut self) {
        self.background_loads += 1;
    }
}
