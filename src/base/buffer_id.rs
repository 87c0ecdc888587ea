//! Buffer identifiers.

/// A compact identifier for a logical source buffer.
///
/// Assigned by the session when a URI is first seen; stable for the
/// lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u32);

impl BufferId {
    /// Create a BufferId from a raw index.
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw index.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "buffer({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_id_roundtrip() {
        let id = BufferId::new(7);
        assert_eq!(id.as_u32(), 7);
        assert_eq!(id, BufferId::new(7));
        assert_ne!(id, BufferId::new(8));
    }
}
