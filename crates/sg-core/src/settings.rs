use crate::color::TRANSPARENT;
use crate::model::{Shape, ShapeKind};
use serde::{Deserialize, Serialize};

/// Style defaults stamped onto newly created shapes.
///
/// Read only at creation time. Changing a setting never restyles shapes
/// that already exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingSettings {
    pub stroke_color: String,
    pub fill_color: String,
    pub stroke_width: f64,
    pub corner_radius: f64,
    pub fill_enabled: bool,
}

impl Default for DrawingSettings {
    fn default() -> Self {
        Self {
            stroke_color: "#000000".into(),
            fill_color: "#ffffff".into(),
            stroke_width: 2.0,
            corner_radius: 0.0,
            fill_enabled: true,
        }
    }
}

impl DrawingSettings {
    /// The fill a new closed shape receives.
    pub fn effective_fill(&self) -> &str {
        if self.fill_enabled {
            &self.fill_color
        } else {
            TRANSPARENT
        }
    }

    /// Build a filled shape (rect, circle, ellipse, closed path).
    pub fn filled(&self, x: f64, y: f64, kind: ShapeKind) -> Shape {
        Shape::new(x, y, kind)
            .stroke(self.stroke_color.as_str(), self.stroke_width)
            .fill(self.effective_fill())
    }

    /// Build a stroke-only shape (line, open path).
    pub fn outlined(&self, x: f64, y: f64, kind: ShapeKind) -> Shape {
        Shape::new(x, y, kind)
            .stroke(self.stroke_color.as_str(), self.stroke_width)
            .fill(TRANSPARENT)
    }
}
