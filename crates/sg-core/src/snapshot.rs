//! JSON snapshot of a whole drawing.
//!
//! ```json
//! { "version": "1.0", "dimensions": {...}, "shapes": [...],
//!   "backgroundImage": null, "exportedAt": "2024-06-10T12:00:00.000Z" }
//! ```

use crate::error::SnapshotError;
use crate::model::{BackgroundImage, CanvasDimensions, Shape};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const SNAPSHOT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub dimensions: CanvasDimensions,
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub background_image: Option<BackgroundImage>,
    /// ISO-8601. Informational only; not validated on import.
    #[serde(default)]
    pub exported_at: String,
}

impl Snapshot {
    /// Capture the current drawing, stamped with the current time.
    pub fn capture(
        shapes: &[Shape],
        dimensions: CanvasDimensions,
        background_image: Option<&BackgroundImage>,
    ) -> Self {
        Self::capture_at(shapes, dimensions, background_image, Utc::now())
    }

    pub fn capture_at(
        shapes: &[Shape],
        dimensions: CanvasDimensions,
        background_image: Option<&BackgroundImage>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION.into(),
            dimensions,
            shapes: shapes.to_vec(),
            background_image: background_image.cloned(),
            exported_at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Pretty-printed JSON, two-space indent.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(SnapshotError::Serialize)
    }

    /// Parse and validate a snapshot. Nothing is returned unless the whole
    /// document is well formed, so callers can apply it without rollback.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version(snapshot.version));
        }
        let mut seen = HashSet::with_capacity(snapshot.shapes.len());
        for shape in &snapshot.shapes {
            if !seen.insert(shape.id) {
                return Err(SnapshotError::Invalid(format!(
                    "duplicate shape id {}",
                    shape.id
                )));
            }
            shape.validate().map_err(SnapshotError::Invalid)?;
        }
        if !(snapshot.dimensions.width > 0.0 && snapshot.dimensions.height > 0.0) {
            return Err(SnapshotError::Invalid(format!(
                "canvas dimensions must be positive, got {}×{}",
                snapshot.dimensions.width, snapshot.dimensions.height
            )));
        }
        log::info!(
            "parsed snapshot: {} shapes, {}×{}",
            snapshot.shapes.len(),
            snapshot.dimensions.width,
            snapshot.dimensions.height
        );
        Ok(snapshot)
    }
}
