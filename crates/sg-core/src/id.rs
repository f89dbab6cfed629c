use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for shape IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Process-wide sequence appended to generated IDs.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// An interned shape identifier.
///
/// Wire form is the plain string (`"shape-1718000000000-3"`). Internally a
/// `Spur` index, so it is `Copy` and compares in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(Spur);

impl ShapeId {
    /// Intern a string as a ShapeId, or return the existing handle.
    pub fn intern(s: &str) -> Self {
        ShapeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh id of the form `shape-<unix-millis>-<seq>`.
    ///
    /// The sequence number is monotonic for the lifetime of the process, so
    /// two shapes created in the same millisecond never collide.
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("shape-{millis}-{seq}"))
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ShapeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ShapeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ShapeId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ShapeId::intern("shape-1-0");
        let b = ShapeId::intern("shape-1-0");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "shape-1-0");
    }

    #[test]
    fn generated_ids_are_unique() {
        let ids: Vec<ShapeId> = (0..1000).map(|_| ShapeId::generate()).collect();
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids[0].as_str().starts_with("shape-"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ShapeId::intern("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        let back: ShapeId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, id);
    }
}
