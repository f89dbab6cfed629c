pub mod color;
pub mod error;
pub mod id;
pub mod model;
pub mod path;
pub mod settings;
pub mod shapes;
pub mod snapshot;
pub mod svg;

pub use error::{ModelError, SnapshotError};
pub use id::ShapeId;
pub use model::*;
pub use settings::DrawingSettings;
pub use shapes::ShapeList;
pub use snapshot::Snapshot;
