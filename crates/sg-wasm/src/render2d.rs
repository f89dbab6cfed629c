//! Canvas2D backend for the retained surface.
//!
//! Draws a [`RetainedSurface`] to an HTML `<canvas>` via
//! `CanvasRenderingContext2d`. Images decode asynchronously: the first
//! present that needs one starts the load, and when it finishes the
//! shared dirty flag is raised so the host's next frame redraws.

use kurbo::Point;
use sg_core::path::{PathCmd, pairs};
use sg_render::{
    BackgroundLayer, Geometry, Handle, Primitive, PrimitiveShadow, RetainedSurface, SurfaceAdapter,
};
use sg_core::CanvasDimensions;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

const SELECTION_COLOR: &str = "#2563eb";
const HANDLE_SIZE: f64 = 8.0;

// ─── Image cache ─────────────────────────────────────────────────────────

enum ImageSlot {
    Loading,
    Ready(HtmlImageElement),
    Failed,
}

#[derive(Clone, Default)]
struct ImageCache {
    slots: Rc<RefCell<HashMap<String, ImageSlot>>>,
    dirty: Rc<Cell<bool>>,
}

impl ImageCache {
    /// The decoded image for `src`, starting a load on first request.
    fn get(&self, src: &str) -> Option<HtmlImageElement> {
        if src.is_empty() {
            return None;
        }
        if let Some(slot) = self.slots.borrow().get(src) {
            return match slot {
                ImageSlot::Ready(img) => Some(img.clone()),
                ImageSlot::Loading | ImageSlot::Failed => None,
            };
        }
        self.load(src);
        None
    }

    fn load(&self, src: &str) {
        let img = match HtmlImageElement::new() {
            Ok(img) => img,
            Err(e) => {
                log::error!("cannot create image element: {e:?}");
                self.slots
                    .borrow_mut()
                    .insert(src.to_string(), ImageSlot::Failed);
                return;
            }
        };
        self.slots
            .borrow_mut()
            .insert(src.to_string(), ImageSlot::Loading);

        let onload = {
            let slots = Rc::clone(&self.slots);
            let dirty = Rc::clone(&self.dirty);
            let key = src.to_string();
            let loaded = img.clone();
            Closure::wrap(Box::new(move || {
                log::debug!("image decoded: {}", abbreviate(&key));
                slots
                    .borrow_mut()
                    .insert(key.clone(), ImageSlot::Ready(loaded.clone()));
                dirty.set(true);
            }) as Box<dyn FnMut()>)
        };
        let onerror = {
            let slots = Rc::clone(&self.slots);
            let key = src.to_string();
            Closure::wrap(Box::new(move || {
                log::error!("failed to load image {}", abbreviate(&key));
                slots.borrow_mut().insert(key.clone(), ImageSlot::Failed);
            }) as Box<dyn FnMut()>)
        };
        img.set_onload(Some(onload.as_ref().unchecked_ref()));
        img.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onload.forget();
        onerror.forget();

        img.set_cross_origin(Some("anonymous"));
        img.set_src(src);
    }
}

/// Data URLs are long; keep log lines readable.
fn abbreviate(src: &str) -> &str {
    src.char_indices().nth(48).map_or(src, |(i, _)| &src[..i])
}

// ─── Surface ─────────────────────────────────────────────────────────────

/// Retained surface drawn through a 2D canvas context.
pub struct Canvas2dSurface {
    ctx: CanvasRenderingContext2d,
    surface: RetainedSurface,
    images: ImageCache,
}

impl Canvas2dSurface {
    pub fn new(ctx: CanvasRenderingContext2d, dimensions: CanvasDimensions) -> Self {
        Self {
            ctx,
            surface: RetainedSurface::new(dimensions),
            images: ImageCache::default(),
        }
    }

    /// Raised whenever an image finishes decoding after the last present.
    pub fn dirty_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.images.dirty)
    }
}

impl SurfaceAdapter for Canvas2dSurface {
    fn surface(&self) -> &RetainedSurface {
        &self.surface
    }

    fn surface_mut(&mut self) -> &mut RetainedSurface {
        &mut self.surface
    }

    fn present(&mut self) {
        self.images.dirty.set(false);
        draw_surface(&self.ctx, &self.surface, &self.images);
    }

    fn background_changed(&mut self) {
        if let Some(layer) = self.surface.background() {
            // Warm the cache so the image is usually ready by the next frame.
            let _ = self.images.get(&layer.url);
        }
    }
}

// ─── Drawing ─────────────────────────────────────────────────────────────

fn draw_surface(ctx: &CanvasRenderingContext2d, surface: &RetainedSurface, images: &ImageCache) {
    let dims = surface.dimensions;
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_global_alpha(1.0);
    ctx.set_fill_style_str(surface.theme.background_color());
    ctx.fill_rect(0.0, 0.0, dims.width, dims.height);

    if let Some(layer) = surface.background() {
        draw_background(ctx, layer, images);
    }
    for prim in surface.primitives() {
        draw_primitive(ctx, prim, images);
    }
    for prim in surface.overlay() {
        draw_primitive(ctx, prim, images);
    }
    if let Some(active) = surface.active().and_then(|id| surface.primitive(id)) {
        draw_selection(ctx, active);
    }
}

fn draw_background(ctx: &CanvasRenderingContext2d, layer: &BackgroundLayer, images: &ImageCache) {
    let Some(img) = images.get(&layer.url) else {
        return;
    };
    ctx.save();
    ctx.set_global_alpha(layer.opacity);
    let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
        &img,
        0.0,
        0.0,
        layer.natural_width * layer.scale_x,
        layer.natural_height * layer.scale_y,
    );
    ctx.restore();
}

fn draw_primitive(ctx: &CanvasRenderingContext2d, prim: &Primitive, images: &ImageCache) {
    ctx.save();
    let [a, b, c, d, e, f] = prim.transform().as_coeffs();
    let _ = ctx.set_transform(a, b, c, d, e, f);
    ctx.set_global_alpha(prim.opacity);
    ctx.set_line_cap("round");
    ctx.set_line_join("round");
    if let Some([dash, gap]) = prim.dash {
        let pattern = js_sys::Array::of2(&dash.into(), &gap.into());
        let _ = ctx.set_line_dash(&pattern);
    }
    if let Some(shadow) = &prim.shadow {
        apply_shadow(ctx, shadow);
    }

    if let Geometry::Image { src, width, height } = &prim.geometry {
        if let Some(img) = images.get(src) {
            let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
                &img, 0.0, 0.0, *width, *height,
            );
        }
        ctx.restore();
        return;
    }

    trace_geometry(ctx, &prim.geometry);
    if prim.is_filled()
        && let Some(fill) = &prim.fill
    {
        ctx.set_fill_style_str(fill);
        ctx.fill();
        // Stroke should not cast a second shadow.
        clear_shadow(ctx);
    }
    if let Some(stroke) = &prim.stroke
        && prim.stroke_width > 0.0
    {
        ctx.set_stroke_style_str(stroke);
        ctx.set_line_width(prim.stroke_width);
        ctx.stroke();
    }
    ctx.restore();
}

/// Build the path for `geometry` in local-box coordinates.
fn trace_geometry(ctx: &CanvasRenderingContext2d, geometry: &Geometry) {
    match geometry {
        Geometry::Rect { width, height, rx } => {
            if *rx > 0.0 {
                rounded_rect_path(ctx, 0.0, 0.0, *width, *height, *rx);
            } else {
                ctx.begin_path();
                ctx.rect(0.0, 0.0, *width, *height);
            }
        }
        Geometry::Circle { radius } => {
            ctx.begin_path();
            let _ = ctx.arc(*radius, *radius, *radius, 0.0, TAU);
        }
        Geometry::Ellipse { rx, ry } => {
            ctx.begin_path();
            let _ = ctx.ellipse(*rx, *ry, *rx, *ry, 0.0, 0.0, TAU);
        }
        Geometry::Line { x1, y1, x2, y2 } => {
            ctx.begin_path();
            ctx.move_to(*x1, *y1);
            ctx.line_to(*x2, *y2);
        }
        Geometry::Path { commands } => {
            ctx.begin_path();
            for cmd in commands {
                match *cmd {
                    PathCmd::MoveTo(x, y) => ctx.move_to(x, y),
                    PathCmd::LineTo(x, y) => ctx.line_to(x, y),
                    PathCmd::QuadTo(x1, y1, x, y) => ctx.quadratic_curve_to(x1, y1, x, y),
                    PathCmd::CubicTo(x1, y1, x2, y2, x, y) => {
                        ctx.bezier_curve_to(x1, y1, x2, y2, x, y)
                    }
                    PathCmd::Close => ctx.close_path(),
                }
            }
        }
        Geometry::Polyline { points, closed } => {
            ctx.begin_path();
            for (i, (x, y)) in pairs(points).into_iter().enumerate() {
                if i == 0 {
                    ctx.move_to(x, y);
                } else {
                    ctx.line_to(x, y);
                }
            }
            if *closed {
                ctx.close_path();
            }
        }
        Geometry::Image { .. } => {}
    }
}

/// Bounding box and transform handles around the active primitive, drawn
/// in canvas space so they keep a constant size.
fn draw_selection(ctx: &CanvasRenderingContext2d, prim: &Primitive) {
    let t = prim.transform();
    let b = prim.local_box();
    let corners = [
        Point::new(b.x0, b.y0),
        Point::new(b.x1, b.y0),
        Point::new(b.x1, b.y1),
        Point::new(b.x0, b.y1),
    ]
    .map(|p| t * p);

    ctx.save();
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(1.0);
    ctx.begin_path();
    ctx.move_to(corners[0].x, corners[0].y);
    for p in &corners[1..] {
        ctx.line_to(p.x, p.y);
    }
    ctx.close_path();
    ctx.stroke();

    let top = t * Handle::Top.local(prim);
    let rotate = t * Handle::Rotate.local(prim);
    ctx.begin_path();
    ctx.move_to(top.x, top.y);
    ctx.line_to(rotate.x, rotate.y);
    ctx.stroke();

    ctx.set_fill_style_str("#ffffff");
    let half = HANDLE_SIZE / 2.0;
    for handle in Handle::SCALE {
        let p = t * handle.local(prim);
        ctx.fill_rect(p.x - half, p.y - half, HANDLE_SIZE, HANDLE_SIZE);
        ctx.stroke_rect(p.x - half, p.y - half, HANDLE_SIZE, HANDLE_SIZE);
    }
    ctx.begin_path();
    let _ = ctx.arc(rotate.x, rotate.y, half, 0.0, TAU);
    ctx.fill();
    ctx.stroke();
    ctx.restore();
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}

fn apply_shadow(ctx: &CanvasRenderingContext2d, shadow: &PrimitiveShadow) {
    ctx.set_shadow_blur(shadow.blur);
    ctx.set_shadow_offset_x(shadow.offset_x);
    ctx.set_shadow_offset_y(shadow.offset_y);
    ctx.set_shadow_color(&shadow.color);
}

fn clear_shadow(ctx: &CanvasRenderingContext2d) {
    ctx.set_shadow_blur(0.0);
    ctx.set_shadow_offset_x(0.0);
    ctx.set_shadow_offset_y(0.0);
    ctx.set_shadow_color("transparent");
}
