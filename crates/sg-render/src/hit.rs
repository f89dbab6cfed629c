//! Hit testing: canvas point → primitive lookup.
//!
//! Walks primitives in reverse paint order (topmost first). Points are
//! mapped into each primitive's local box through the inverse transform,
//! so rotated and scaled primitives hit exactly where they are drawn.

use crate::geom;
use crate::surface::{Handle, Primitive, RetainedSurface};
use kurbo::Point;
use sg_core::ShapeId;

/// Half the side of a square transform handle, in canvas units.
pub const HANDLE_RADIUS: f64 = 5.0;

/// Extra slop around strokes and open paths, in canvas units.
pub const STROKE_SLOP: f64 = 3.0;

/// Find the topmost interactive primitive at `p`.
pub fn hit_test(surface: &RetainedSurface, p: Point) -> Option<ShapeId> {
    surface
        .primitives()
        .iter()
        .rev()
        .filter(|prim| prim.interactive)
        .find(|prim| hits(prim, p))
        .and_then(|prim| prim.id)
}

/// Find the topmost shape primitive at `p`, interactive or not.
pub fn pick(surface: &RetainedSurface, p: Point) -> Option<ShapeId> {
    surface
        .primitives()
        .iter()
        .rev()
        .filter(|prim| prim.id.is_some())
        .find(|prim| hits(prim, p))
        .and_then(|prim| prim.id)
}

/// Whether `p` (canvas coordinates) falls on the primitive.
pub fn hits(prim: &Primitive, p: Point) -> bool {
    let transform = prim.transform();
    if transform.determinant().abs() < f64::EPSILON {
        return false;
    }
    let local = transform.inverse() * p;
    let scale = prim.scale_x.abs().min(prim.scale_y.abs()).max(f64::EPSILON);
    let slop = (prim.stroke_width / 2.0 + STROKE_SLOP) / scale;

    if prim.is_filled() {
        geom::contains(&prim.geometry, local)
    } else {
        prim.local_box().inflate(slop, slop).contains(local)
    }
}

/// Find the transform handle of the active primitive under `p`.
/// The rotation handle is checked first.
pub fn handle_at(surface: &RetainedSurface, p: Point) -> Option<Handle> {
    let prim = surface.primitive(surface.active()?)?;
    if !prim.interactive {
        return None;
    }
    let transform = prim.transform();
    std::iter::once(Handle::Rotate)
        .chain(Handle::SCALE)
        .find(|h| {
            let at = transform * h.local(prim);
            (at.x - p.x).abs() <= HANDLE_RADIUS && (at.y - p.y).abs() <= HANDLE_RADIUS
        })
}
