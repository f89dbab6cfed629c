//! CSS color helpers.
//!
//! Shapes store colors as CSS strings (`#RRGGBB` or `transparent`). The
//! drawing surface carries shadow colors as `rgba(...)` strings, so shadow
//! readback needs to split those into an opaque hex color plus an opacity.

/// The sentinel fill used when a shape has no fill.
pub const TRANSPARENT: &str = "transparent";

/// An sRGB color with 8-bit channels and a fractional alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

/// Parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#RGB` or `#RRGGBB` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        match bytes.len() {
            3 => Some(Self::opaque(
                hex_val(bytes[0])? * 17,
                hex_val(bytes[1])? * 17,
                hex_val(bytes[2])? * 17,
            )),
            6 => Some(Self::opaque(
                hex_val(bytes[0])? << 4 | hex_val(bytes[1])?,
                hex_val(bytes[2])? << 4 | hex_val(bytes[3])?,
                hex_val(bytes[4])? << 4 | hex_val(bytes[5])?,
            )),
            _ => None,
        }
    }

    /// Parse any of `#hex`, `rgb(r, g, b)` or `rgba(r, g, b, a)`.
    pub fn parse(css: &str) -> Option<Self> {
        let css = css.trim();
        if css.starts_with('#') {
            return Self::from_hex(css);
        }
        let inner = css
            .strip_prefix("rgba(")
            .or_else(|| css.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let mut parts = inner.split(',').map(str::trim);
        let r = parts.next()?.parse::<f64>().ok()?;
        let g = parts.next()?.parse::<f64>().ok()?;
        let b = parts.next()?.parse::<f64>().ok()?;
        let a = match parts.next() {
            Some(a) => a.parse::<f64>().ok()?,
            None => 1.0,
        };
        Some(Self {
            r: r.clamp(0.0, 255.0) as u8,
            g: g.clamp(0.0, 255.0) as u8,
            b: b.clamp(0.0, 255.0) as u8,
            a: a.clamp(0.0, 1.0),
        })
    }

    /// Lowercase `#rrggbb`, alpha dropped.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// `rgba(r, g, b, a)` with the given alpha.
    pub fn to_css_rgba(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }

    pub fn with_alpha(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// Whether a fill/stroke string paints nothing.
pub fn is_transparent(css: &str) -> bool {
    css.is_empty() || css.eq_ignore_ascii_case(TRANSPARENT) || css.eq_ignore_ascii_case("none")
}
