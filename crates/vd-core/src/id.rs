use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for shape IDs.
///
/// Append-only: every distinct id ever interned stays resident for the
/// life of the process. Interning the same string again is a lookup, so
/// growth tracks the number of distinct ids seen (fresh ids plus ids read
/// back from the host), not the number of calls.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Prefix the canvas engine expects on every shape identifier.
pub const SHAPE_PREFIX: &str = "shape:";

/// An interned identifier for a shape on the canvas.
/// Internally a `Spur` index: 4 bytes, Copy, Eq, Hash in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(Spur);

impl ShapeId {
    /// Intern an identifier handed to us by the canvas host.
    pub fn intern(s: &str) -> Self {
        ShapeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Allocate a fresh, process-unique shape ID (`shape:vd_<n>`).
    pub fn fresh() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{SHAPE_PREFIX}vd_{n}"))
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
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
        let a = ShapeId::intern("shape:abc");
        let b = ShapeId::intern("shape:abc");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "shape:abc");
    }

    #[test]
    fn fresh_ids_are_unique_and_prefixed() {
        let a = ShapeId::fresh();
        let b = ShapeId::fresh();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with(SHAPE_PREFIX));
    }
}
