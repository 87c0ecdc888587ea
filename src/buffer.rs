//! Source Buffer Store — versioned text per logical file.
//!
//! Holds the current text of one or more buffers keyed by URI. Every
//! `set_text` bumps the version counter, even when the text is unchanged:
//! callers rely on the bump to force re-analysis (the editor issues a
//! forced update to trigger the initial inlay hint pass).

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::base::{BufferId, Name};

/// A versioned in-memory source text unit.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub id: BufferId,
    pub uri: Name,
    pub text: Arc<str>,
    /// Monotonic version counter, starting at 1 for the first `set_text`.
    pub version: u64,
}

/// Store of all open buffers.
///
/// `set_text` creates the buffer on first use and always increments the
/// version. `get_text` on an unknown URI yields an empty string rather
/// than an error.
#[derive(Debug, Default)]
pub struct BufferStore {
    buffers: FxHashMap<Name, Buffer>,
    by_id: FxHashMap<BufferId, Name>,
    next_id: u32,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the text of a buffer, creating it if needed.
    ///
    /// Returns the buffer id and the new version. The version increments
    /// on every call, identical text included.
    pub fn set_text(&mut self, uri: &str, text: &str) -> (BufferId, u64) {
        if let Some(buffer) = self.buffers.get_mut(uri) {
            buffer.version += 1;
            buffer.text = Arc::from(text);
            (buffer.id, buffer.version)
        } else {
            let id = BufferId::new(self.next_id);
            self.next_id += 1;
            let uri: Name = Arc::from(uri);
            self.by_id.insert(id, uri.clone());
            self.buffers.insert(
                uri.clone(),
                Buffer {
                    id,
                    uri,
                    text: Arc::from(text),
                    version: 1,
                },
            );
            (id, 1)
        }
    }

    /// Get the current text of a buffer. Unknown URIs yield "".
    pub fn get_text(&self, uri: &str) -> Arc<str> {
        self.buffers
            .get(uri)
            .map(|b| b.text.clone())
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Get a buffer by URI.
    pub fn get(&self, uri: &str) -> Option<&Buffer> {
        self.buffers.get(uri)
    }

    /// Current version of a buffer by id, if it exists.
    pub fn version_of(&self, id: BufferId) -> Option<u64> {
        let uri = self.by_id.get(&id)?;
        self.buffers.get(uri).map(|b| b.version)
    }

    /// URI of a buffer by id, if it exists.
    pub fn uri_of(&self, id: BufferId) -> Option<Name> {
        self.by_id.get(&id).cloned()
    }

    /// Number of open buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Drop all buffers (session disposal).
    pub fn clear(&mut self) {
        self.buffers.clear();
        self.by_id.clear();
    }
}
