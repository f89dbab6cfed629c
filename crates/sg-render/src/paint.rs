//! Retained surface → Vello drawing commands.
//!
//! Paints the canvas background, the background image, every primitive in
//! order and then the overlay. Images are drawn only once their pixels
//! have been supplied with [`ScenePainter::provide_image`]; until then they
//! are skipped, matching a browser surface waiting on decode.

use crate::geom;
use crate::surface::{Geometry, Primitive, RetainedSurface};
use kurbo::{Affine, Cap, Join, Rect, Stroke};
use peniko::{Blob, Color, Fill, Image, ImageFormat};
use sg_core::color::{Rgba, is_transparent};
use std::collections::HashMap;
use std::sync::Arc;
use vello::Scene;

/// Decoded images keyed by source URL.
#[derive(Default)]
pub struct ScenePainter {
    images: HashMap<String, Image>,
}

impl ScenePainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register decoded RGBA8 pixels for an image source.
    pub fn provide_image(&mut self, src: &str, rgba: Vec<u8>, width: u32, height: u32) {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            log::error!(
                "image {src}: expected {expected} bytes for {width}×{height}, got {}",
                rgba.len()
            );
            return;
        }
        let blob = Blob::new(Arc::new(rgba));
        self.images
            .insert(src.to_string(), Image::new(blob, ImageFormat::Rgba8, width, height));
    }

    pub fn has_image(&self, src: &str) -> bool {
        self.images.contains_key(src)
    }

    /// Encode the surface into a fresh scene. Returns the scene and the
    /// number of primitives drawn.
    pub fn encode(&self, surface: &RetainedSurface) -> (Scene, usize) {
        let mut scene = Scene::new();
        let drawn = self.paint(&mut scene, surface);
        (scene, drawn)
    }

    /// Paint the whole surface. Returns the number of primitives drawn.
    pub fn paint(&self, scene: &mut Scene, surface: &RetainedSurface) -> usize {
        let dims = surface.dimensions;
        let bg = css_color(surface.theme.background_color(), 1.0)
            .unwrap_or(Color::from_rgb8(255, 255, 255));
        scene.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            bg,
            None,
            &Rect::new(0.0, 0.0, dims.width, dims.height),
        );

        if let Some(layer) = surface.background() {
            match self.images.get(&layer.url) {
                Some(image) => {
                    let transform = Affine::scale_non_uniform(layer.scale_x, layer.scale_y);
                    scene.draw_image(&image.clone().with_alpha(layer.opacity as f32), transform);
                }
                None => log::trace!("background {} not decoded yet", layer.url),
            }
        }

        let mut drawn = 0;
        for prim in surface.primitives().iter().chain(surface.overlay()) {
            if self.paint_primitive(scene, prim) {
                drawn += 1;
            }
        }
        if let Some(active) = surface.active().and_then(|id| surface.primitive(id)) {
            paint_selection(scene, active);
        }
        drawn
    }

    fn paint_primitive(&self, scene: &mut Scene, prim: &Primitive) -> bool {
        let transform = prim.transform();

        if let Geometry::Image { src, .. } = &prim.geometry {
            let Some(image) = self.images.get(src) else {
                log::trace!("image {src} not decoded yet");
                return false;
            };
            paint_shadow(scene, prim, transform);
            scene.draw_image(&image.clone().with_alpha(prim.opacity as f32), transform);
            return true;
        }

        paint_shadow(scene, prim, transform);
        let outline = geom::outline(&prim.geometry);

        if prim.is_filled()
            && let Some(color) = prim.fill.as_deref().and_then(|f| css_color(f, prim.opacity))
        {
            scene.fill(Fill::NonZero, transform, color, None, &outline);
        }
        if prim.stroke_width > 0.0
            && let Some(color) = prim.stroke.as_deref().and_then(|s| css_color(s, prim.opacity))
        {
            let mut stroke = Stroke::new(prim.stroke_width)
                .with_caps(Cap::Round)
                .with_join(Join::Round);
            if let Some([dash, gap]) = prim.dash {
                stroke = stroke.with_dashes(0.0, [dash, gap]);
            }
            scene.stroke(&stroke, transform, color, None, &outline);
        }
        true
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Parse a CSS color and fold in an extra opacity. `None` for transparent.
fn css_color(css: &str, opacity: f64) -> Option<Color> {
    if is_transparent(css) {
        return None;
    }
    let c = Rgba::parse(css)?;
    let alpha = (c.a * opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Some(Color::from_rgba8(c.r, c.g, c.b, alpha))
}

/// Blurred box behind the primitive's local bounds.
fn paint_shadow(scene: &mut Scene, prim: &Primitive, transform: Affine) {
    let Some(shadow) = &prim.shadow else {
        return;
    };
    let Some(color) = css_color(&shadow.color, prim.opacity) else {
        return;
    };
    let offset = Affine::translate((shadow.offset_x, shadow.offset_y));
    let radius = match prim.geometry {
        Geometry::Rect { rx, .. } => rx,
        _ => 0.0,
    };
    scene.draw_blurred_rounded_rect(
        offset * transform,
        prim.local_box(),
        color,
        radius,
        shadow.blur / 2.0,
    );
}

fn paint_selection(scene: &mut Scene, prim: &Primitive) {
    let border = Color::from_rgb8(0x25, 0x63, 0xeb);
    let bounds = prim.world_bounds();
    scene.stroke(&Stroke::new(2.0), Affine::IDENTITY, border, None, &bounds);
}

// ─── Backend ─────────────────────────────────────────────────────────────────
