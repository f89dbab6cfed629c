//! Static SVG export of the shape list.
//!
//! Path-like shapes are written as straight segments through their stored
//! points, translated by the shape's offset. This is a fast lossy export:
//! bezier shapes lose their spline smoothing and persisted scale is not
//! applied.

use crate::color::is_transparent;
use crate::model::{CanvasDimensions, Shape, ShapeKind};
use crate::path::{polyline, to_svg_data};
use std::fmt::Write as _;

/// Escape a value for use inside a double-quoted XML attribute.
pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn svg_fill(fill: &str) -> String {
    if is_transparent(fill) {
        "none".into()
    } else {
        escape_attr(fill)
    }
}

fn transform_attr(shape: &Shape) -> String {
    let mut ops = Vec::new();
    if shape.rotation != 0.0 {
        let (cx, cy) = shape.anchor();
        ops.push(format!("rotate({} {cx} {cy})", shape.rotation));
    }
    if shape.is_path_like() && (shape.x != 0.0 || shape.y != 0.0) {
        ops.push(format!("translate({} {})", shape.x, shape.y));
    }
    if ops.is_empty() {
        String::new()
    } else {
        format!(" transform=\"{}\"", ops.join(" "))
    }
}

/// Render the whole drawing as a standalone SVG document.
pub fn export_svg(shapes: &[Shape], dims: CanvasDimensions) -> String {
    let mut svg = String::new();
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(
        svg,
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">",
        dims.width, dims.height
    );

    for shape in shapes {
        let paint = format!(
            "stroke=\"{}\" stroke-width=\"{}\" opacity=\"{}\"",
            escape_attr(&shape.stroke_color),
            shape.stroke_width,
            shape.opacity
        );
        let fill = svg_fill(&shape.fill_color);
        let transform = transform_attr(shape);
        let (x, y) = (shape.x, shape.y);

        let _ = match &shape.kind {
            ShapeKind::Rectangle {
                width,
                height,
                corner_radius,
            } => writeln!(
                svg,
                "  <rect x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" rx=\"{corner_radius}\" fill=\"{fill}\" {paint}{transform}/>"
            ),
            ShapeKind::Circle { radius } => writeln!(
                svg,
                "  <circle cx=\"{x}\" cy=\"{y}\" r=\"{radius}\" fill=\"{fill}\" {paint}{transform}/>"
            ),
            ShapeKind::Ellipse { radius_x, radius_y } => writeln!(
                svg,
                "  <ellipse cx=\"{x}\" cy=\"{y}\" rx=\"{radius_x}\" ry=\"{radius_y}\" fill=\"{fill}\" {paint}{transform}/>"
            ),
            ShapeKind::Line { points } => {
                let pts = points
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(
                    svg,
                    "  <polyline points=\"{pts}\" fill=\"none\" {paint}{transform}/>"
                )
            }
            ShapeKind::Bezier { points, closed } | ShapeKind::Polyline { points, closed } => {
                if points.len() < 4 {
                    continue;
                }
                let closed = closed.unwrap_or(false);
                let d = to_svg_data(&polyline(points, closed));
                let fill = if closed { fill.as_str() } else { "none" };
                writeln!(svg, "  <path d=\"{d}\" fill=\"{fill}\" {paint}{transform}/>")
            }
            ShapeKind::Image { src, width, height } => writeln!(
                svg,
                "  <image href=\"{}\" x=\"{x}\" y=\"{y}\" width=\"{width}\" height=\"{height}\" opacity=\"{}\" preserveAspectRatio=\"none\"{transform}/>",
                escape_attr(src),
                shape.opacity
            ),
        };
    }

    svg.push_str("</svg>");
    log::info!("exported {} shapes to SVG", shapes.len());
    svg
}
