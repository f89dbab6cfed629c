//! Raster export: retained surface → SVG → resvg → PNG.
//!
//! Unlike the vector export in `sg_core::svg`, this goes through the live
//! primitives, so splines, transforms, dashes and shadows all match what is
//! on screen.

use crate::surface::{Geometry, Primitive, RetainedSurface};
use sg_core::color::is_transparent;
use sg_core::path::{polyline, to_svg_data};
use sg_core::svg::escape_attr;
use std::fmt::Write as _;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("failed to parse intermediate SVG: {0}")]
    Svg(#[from] usvg::Error),

    #[error("invalid raster size {width}×{height}")]
    Size { width: u32, height: u32 },

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Render the surface to PNG bytes at `multiplier` × its dimensions.
pub fn render_png(surface: &RetainedSurface, multiplier: f64) -> Result<Vec<u8>, RasterError> {
    let svg = surface_to_svg(surface);
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)?;

    let dims = surface.dimensions;
    let width = (dims.width * multiplier).round().max(1.0) as u32;
    let height = (dims.height * multiplier).round().max(1.0) as u32;
    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(RasterError::Size { width, height })?;

    let scale = multiplier as f32;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    let png = pixmap
        .encode_png()
        .map_err(|e| RasterError::Encode(e.to_string()))?;
    log::info!("rendered {width}×{height} PNG ({} bytes)", png.len());
    Ok(png)
}

/// Full-fidelity SVG of the retained surface, overlay excluded.
pub fn surface_to_svg(surface: &RetainedSurface) -> String {
    let dims = surface.dimensions;
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        w = dims.width,
        h = dims.height
    );
    let _ = writeln!(
        svg,
        "  <rect width=\"{}\" height=\"{}\" fill=\"{}\"/>",
        dims.width,
        dims.height,
        surface.theme.background_color()
    );
    if let Some(layer) = surface.background() {
        let _ = writeln!(
            svg,
            "  <image href=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" opacity=\"{}\"/>",
            escape_attr(&layer.url),
            dims.width,
            dims.height,
            layer.opacity
        );
    }
    for (i, prim) in surface.primitives().iter().enumerate() {
        write_primitive(&mut svg, i, prim);
    }
    svg.push_str("</svg>\n");
    svg
}

fn write_primitive(svg: &mut String, index: usize, prim: &Primitive) {
    let [a, b, c, d, e, f] = prim.transform().as_coeffs();
    let filter = match &prim.shadow {
        Some(shadow) => {
            let _ = writeln!(
                svg,
                "  <filter id=\"shadow-{index}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\"><feDropShadow dx=\"{}\" dy=\"{}\" stdDeviation=\"{}\" flood-color=\"{}\"/></filter>",
                shadow.offset_x,
                shadow.offset_y,
                shadow.blur / 2.0,
                escape_attr(&shadow.color)
            );
            format!(" filter=\"url(#shadow-{index})\"")
        }
        None => String::new(),
    };
    let _ = writeln!(
        svg,
        "  <g{filter}><g transform=\"matrix({a} {b} {c} {d} {e} {f})\" opacity=\"{}\">",
        prim.opacity
    );

    let fill = match prim.fill.as_deref() {
        Some(f) if prim.is_filled() && !is_transparent(f) => escape_attr(f),
        _ => "none".into(),
    };
    let mut paint = format!("fill=\"{fill}\"");
    match prim.stroke.as_deref() {
        Some(s) if prim.stroke_width > 0.0 && !is_transparent(s) => {
            let _ = write!(
                paint,
                " stroke=\"{}\" stroke-width=\"{}\" stroke-linecap=\"round\" stroke-linejoin=\"round\"",
                escape_attr(s),
                prim.stroke_width
            );
            if let Some([dash, gap]) = prim.dash {
                let _ = write!(paint, " stroke-dasharray=\"{dash} {gap}\"");
            }
        }
        _ => paint.push_str(" stroke=\"none\""),
    }

    let _ = match &prim.geometry {
        Geometry::Rect { width, height, rx } => writeln!(
            svg,
            "    <rect width=\"{width}\" height=\"{height}\" rx=\"{rx}\" ry=\"{rx}\" {paint}/>"
        ),
        Geometry::Circle { radius } => writeln!(
            svg,
            "    <circle cx=\"{radius}\" cy=\"{radius}\" r=\"{radius}\" {paint}/>"
        ),
        Geometry::Ellipse { rx, ry } => writeln!(
            svg,
            "    <ellipse cx=\"{rx}\" cy=\"{ry}\" rx=\"{rx}\" ry=\"{ry}\" {paint}/>"
        ),
        Geometry::Line { x1, y1, x2, y2 } => writeln!(
            svg,
            "    <line x1=\"{x1}\" y1=\"{y1}\" x2=\"{x2}\" y2=\"{y2}\" {paint}/>"
        ),
        Geometry::Path { commands } => {
            writeln!(svg, "    <path d=\"{}\" {paint}/>", to_svg_data(commands))
        }
        Geometry::Polyline { points, closed } => writeln!(
            svg,
            "    <path d=\"{}\" {paint}/>",
            to_svg_data(&polyline(points, *closed))
        ),
        Geometry::Image { src, width, height } => writeln!(
            svg,
            "    <image href=\"{}\" width=\"{width}\" height=\"{height}\" preserveAspectRatio=\"none\"/>",
            escape_attr(src)
        ),
    };
    svg.push_str("  </g></g>\n");
}
