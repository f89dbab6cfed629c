use crate::id::ShapeId;

/// Errors from shape-list operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// `add` was called with an id that is already in the list.
    #[error("duplicate shape id: {0}")]
    DuplicateId(ShapeId),

    /// No shape with this id exists.
    #[error("shape not found: {0}")]
    NotFound(ShapeId),
}

/// Errors from JSON snapshot import/export.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The document is not valid JSON or does not match the snapshot layout.
    #[error("invalid snapshot JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document declares a version this build cannot read.
    #[error("unsupported snapshot version {0:?} (expected \"1.0\")")]
    Version(String),

    /// The document parsed but violates a shape-model invariant.
    #[error("invalid snapshot: {0}")]
    Invalid(String),

    #[error("failed to serialize snapshot: {0}")]
    Serialize(serde_json::Error),
}
