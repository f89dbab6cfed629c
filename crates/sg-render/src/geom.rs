//! Local-space outlines for surface primitives.

use crate::surface::Geometry;
use kurbo::{BezPath, Ellipse, Point, Rect, Shape as _};
use sg_core::path::PathCmd;

const TOLERANCE: f64 = 0.1;

/// Build a kurbo path from absolute commands.
pub fn bez_path(cmds: &[PathCmd]) -> BezPath {
    let mut bez = BezPath::new();
    for cmd in cmds {
        match *cmd {
            PathCmd::MoveTo(x, y) => bez.move_to((x, y)),
            PathCmd::LineTo(x, y) => bez.line_to((x, y)),
            PathCmd::QuadTo(cx, cy, ex, ey) => bez.quad_to((cx, cy), (ex, ey)),
            PathCmd::CubicTo(c1x, c1y, c2x, c2y, ex, ey) => {
                bez.curve_to((c1x, c1y), (c2x, c2y), (ex, ey))
            }
            PathCmd::Close => bez.close_path(),
        }
    }
    bez
}

/// Shift commands so their drawn bounds start at the origin.
///
/// Returns the shifted commands and the offset that was removed, which is
/// the path's natural top-left position.
pub fn normalize_commands(cmds: &[PathCmd]) -> (Vec<PathCmd>, (f64, f64)) {
    if cmds.is_empty() {
        return (Vec::new(), (0.0, 0.0));
    }
    let bbox = bez_path(cmds).bounding_box();
    let shifted = cmds.iter().map(|c| c.translate(-bbox.x0, -bbox.y0)).collect();
    (shifted, (bbox.x0, bbox.y0))
}

/// Unscaled size of a geometry's local box.
pub fn size(geometry: &Geometry) -> (f64, f64) {
    match geometry {
        Geometry::Rect { width, height, .. } => (*width, *height),
        Geometry::Circle { radius } => (radius * 2.0, radius * 2.0),
        Geometry::Ellipse { rx, ry } => (rx * 2.0, ry * 2.0),
        Geometry::Line { x1, y1, x2, y2 } => ((x2 - x1).abs(), (y2 - y1).abs()),
        Geometry::Image { width, height, .. } => (*width, *height),
        Geometry::Path { .. } | Geometry::Polyline { .. } => {
            let bbox = outline(geometry).bounding_box();
            (bbox.x1.max(0.0), bbox.y1.max(0.0))
        }
    }
}

/// Outline in local coordinates, with the local box at `(0, 0)`.
pub fn outline(geometry: &Geometry) -> BezPath {
    match geometry {
        Geometry::Rect { width, height, rx } => Rect::new(0.0, 0.0, *width, *height)
            .to_rounded_rect(*rx)
            .to_path(TOLERANCE),
        Geometry::Circle { radius } => {
            Ellipse::new((*radius, *radius), (*radius, *radius), 0.0).to_path(TOLERANCE)
        }
        Geometry::Ellipse { rx, ry } => Ellipse::new((*rx, *ry), (*rx, *ry), 0.0).to_path(TOLERANCE),
        Geometry::Line { x1, y1, x2, y2 } => {
            let mut bez = BezPath::new();
            bez.move_to((*x1, *y1));
            bez.line_to((*x2, *y2));
            bez
        }
        Geometry::Path { commands } => bez_path(commands),
        Geometry::Polyline { points, closed } => {
            bez_path(&sg_core::path::polyline(points, *closed))
        }
        Geometry::Image { width, height, .. } => {
            Rect::new(0.0, 0.0, *width, *height).to_path(TOLERANCE)
        }
    }
}

/// Whether a local point lies inside a closed outline.
pub fn contains(geometry: &Geometry, p: Point) -> bool {
    outline(geometry).contains(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalize_moves_bounds_to_origin() {
        let cmds = sg_core::path::polyline(&[10.0, 20.0, 30.0, 50.0], false);
        let (shifted, offset) = normalize_commands(&cmds);
        assert_eq!(offset, (10.0, 20.0));
        assert_eq!(shifted[0], PathCmd::MoveTo(0.0, 0.0));
        assert_eq!(shifted[1], PathCmd::LineTo(20.0, 30.0));
    }

    #[test]
    fn circle_box_is_diameter() {
        assert_eq!(size(&Geometry::Circle { radius: 7.0 }), (14.0, 14.0));
    }

    #[test]
    fn ellipse_contains_centre_not_corner() {
        let g = Geometry::Ellipse { rx: 10.0, ry: 5.0 };
        assert!(contains(&g, Point::new(10.0, 5.0)));
        assert!(!contains(&g, Point::new(0.5, 0.5)));
    }
}
