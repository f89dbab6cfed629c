//! Path geometry for the multi-point kinds.
//!
//! Bezier shapes store only their control points; the drawn curve is a
//! Catmull-Rom spline through them, converted to cubic Bézier segments.

use std::fmt::Write as _;

/// One path command in absolute coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCmd {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadTo(f64, f64, f64, f64),
    CubicTo(f64, f64, f64, f64, f64, f64),
    Close,
}

impl PathCmd {
    /// Shift every coordinate by `(dx, dy)`.
    pub fn translate(self, dx: f64, dy: f64) -> Self {
        match self {
            PathCmd::MoveTo(x, y) => PathCmd::MoveTo(x + dx, y + dy),
            PathCmd::LineTo(x, y) => PathCmd::LineTo(x + dx, y + dy),
            PathCmd::QuadTo(x1, y1, x, y) => PathCmd::QuadTo(x1 + dx, y1 + dy, x + dx, y + dy),
            PathCmd::CubicTo(x1, y1, x2, y2, x, y) => {
                PathCmd::CubicTo(x1 + dx, y1 + dy, x2 + dx, y2 + dy, x + dx, y + dy)
            }
            PathCmd::Close => PathCmd::Close,
        }
    }
}

/// Group a flat coordinate list into `(x, y)` pairs. A trailing odd value
/// is dropped.
pub fn pairs(points: &[f64]) -> Vec<(f64, f64)> {
    points.chunks_exact(2).map(|p| (p[0], p[1])).collect()
}

/// Axis-aligned bounds of a flat coordinate list as `(min_x, min_y, max_x, max_y)`.
pub fn bounds(points: &[f64]) -> Option<(f64, f64, f64, f64)> {
    let mut it = points.chunks_exact(2);
    let first = it.next()?;
    let init = (first[0], first[1], first[0], first[1]);
    Some(it.fold(init, |(x0, y0, x1, y1), p| {
        (x0.min(p[0]), y0.min(p[1]), x1.max(p[0]), y1.max(p[1]))
    }))
}

/// Interpolating spline through `points`.
///
/// Two points give a straight line, three give a single quadratic curve
/// with the middle point as its control. Four or more give one cubic per
/// span (tension 0), with the end tangents clamped to the path's own
/// neighbouring point instead of extrapolated.
pub fn spline(points: &[f64], closed: bool) -> Vec<PathCmd> {
    let pts = pairs(points);
    let Some(&(x0, y0)) = pts.first() else {
        return Vec::new();
    };
    let mut cmds = vec![PathCmd::MoveTo(x0, y0)];
    match pts.len() {
        1 => {}
        2 => cmds.push(PathCmd::LineTo(pts[1].0, pts[1].1)),
        3 => cmds.push(PathCmd::QuadTo(pts[1].0, pts[1].1, pts[2].0, pts[2].1)),
        n => {
            for i in 0..n - 1 {
                let p0 = if i > 0 { pts[i - 1] } else { pts[i] };
                let p1 = pts[i];
                let p2 = pts[i + 1];
                let p3 = if i + 2 < n { pts[i + 2] } else { pts[i + 1] };
                cmds.push(PathCmd::CubicTo(
                    p1.0 + (p2.0 - p0.0) / 6.0,
                    p1.1 + (p2.1 - p0.1) / 6.0,
                    p2.0 - (p3.0 - p1.0) / 6.0,
                    p2.1 - (p3.1 - p1.1) / 6.0,
                    p2.0,
                    p2.1,
                ));
            }
        }
    }
    if closed {
        cmds.push(PathCmd::Close);
    }
    cmds
}

/// Straight segments through `points`.
pub fn polyline(points: &[f64], closed: bool) -> Vec<PathCmd> {
    let mut cmds: Vec<PathCmd> = pairs(points)
        .into_iter()
        .enumerate()
        .map(|(i, (x, y))| {
            if i == 0 {
                PathCmd::MoveTo(x, y)
            } else {
                PathCmd::LineTo(x, y)
            }
        })
        .collect();
    if closed && !cmds.is_empty() {
        cmds.push(PathCmd::Close);
    }
    cmds
}

/// Serialize commands as SVG path data (`M 0 0 C ...`).
pub fn to_svg_data(cmds: &[PathCmd]) -> String {
    let mut d = String::new();
    for cmd in cmds {
        if !d.is_empty() {
            d.push(' ');
        }
        let _ = match *cmd {
            PathCmd::MoveTo(x, y) => write!(d, "M {x} {y}"),
            PathCmd::LineTo(x, y) => write!(d, "L {x} {y}"),
            PathCmd::QuadTo(x1, y1, x, y) => write!(d, "Q {x1} {y1} {x} {y}"),
            PathCmd::CubicTo(x1, y1, x2, y2, x, y) => {
                write!(d, "C {x1} {y1} {x2} {y2} {x} {y}")
            }
            PathCmd::Close => write!(d, "Z"),
        };
    }
    d
}
