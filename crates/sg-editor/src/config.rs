use serde::{Deserialize, Serialize};
use sg_core::CanvasDimensions;

/// Editor tuning knobs. Every field has a default, so a partial JSON
/// object (or `{}`) deserializes into a complete config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Snapshots kept for undo.
    pub max_history: usize,
    /// Drag-created shapes smaller than this are discarded.
    pub min_shape_size: f64,
    /// Clicking closer than this to a path's first point closes it.
    pub close_threshold: f64,
    /// Placed images are scaled down to fit this size.
    pub max_image_size: f64,
    /// Circle scale factors closer than this count as uniform.
    pub uniform_scale_epsilon: f64,
    /// Supersampling factor for PNG export.
    pub raster_multiplier: f64,
    /// Canvas size for a fresh editor.
    pub dimensions: CanvasDimensions,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_history: crate::history::DEFAULT_MAX_HISTORY,
            min_shape_size: 5.0,
            close_threshold: 15.0,
            max_image_size: 400.0,
            uniform_scale_epsilon: 0.01,
            raster_multiplier: 2.0,
            dimensions: CanvasDimensions::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
