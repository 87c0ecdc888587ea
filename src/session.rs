//! Session façade — the single entry point for updates and queries.
//!
//! A [`Session`] owns the buffer store and one committed analysis snapshot
//! per buffer. Updates allocate a version under the write lock, run
//! analysis outside it, and commit only when the analyzed version is still
//! the latest; a superseded result is discarded, so queries never observe
//! output from stale text. Queries always read the last committed
//! snapshot.
//!
//! Invalid positions (0-valued or past the end of the buffer) are not
//! errors: the query returns its empty result and the fault is recorded
//! for [`Session::take_last_fault`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use text_size::TextSize;

use crate::base::{BufferId, Name, Position};
use crate::buffer::BufferStore;
use crate::hir::{Analysis, Diagnostic, Signature, analyze};
use crate::ide::{
    CompletionItem, GotoTarget, HoverResult, InlayHint, completions, goto_definition, hover,
    inlay_hints, matching_overloads,
};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed but not yet serving (transient; `new` leaves the
    /// session `Ready`).
    Uninitialized,
    Ready,
    /// At least one update is being analyzed.
    Updating,
    Disposed,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session has been disposed")]
    SessionClosed,
}

/// A non-fatal query problem, recorded instead of failing the query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryFault {
    #[error("position {line}:{column} is not inside the buffer")]
    InvalidPosition { line: u32, column: u32 },
    #[error("no analysis snapshot for `{uri}`")]
    NoSnapshot { uri: Name },
}

/// Result of one `update_source` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub buffer: BufferId,
    pub version: u64,
    /// False when a newer update superseded this one before its analysis
    /// finished; the result was discarded.
    pub committed: bool,
}

#[derive(Debug, Clone)]
struct BufferSnapshot {
    version: u64,
    analysis: Arc<Analysis>,
}

#[derive(Default)]
struct SessionInner {
    buffers: BufferStore,
    snapshots: FxHashMap<Name, BufferSnapshot>,
    /// Global counter, bumped on every committed analysis. Protocol
    /// clients use it to detect stale requests.
    snapshot_id: u64,
    disposed: bool,
    last_fault: Option<QueryFault>,
}

pub struct Session {
    inner: RwLock<SessionInner>,
    in_flight: AtomicU32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        tracing::debug!("session ready");
        Self {
            inner: RwLock::new(SessionInner::default()),
            in_flight: AtomicU32::new(0),
        }
    }

    // ==================== updates ====================

    /// Replace a buffer's text and re-analyze it.
    ///
    /// The version is allocated under the lock, analysis runs outside it,
    /// and the snapshot is committed only if no newer version was
    /// allocated meanwhile.
    pub fn update_source(&self, uri: &str, text: &str) -> Result<UpdateOutcome, SessionError> {
        let (buffer, version, owned_text) = {
            let mut inner = self.inner.write();
            if inner.disposed {
                return Err(SessionError::SessionClosed);
            }
            let (buffer, version) = inner.buffers.set_text(uri, text);
            (buffer, version, inner.buffers.get_text(uri))
        };

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let analysis = analyze(&owned_text);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut inner = self.inner.write();
        if inner.disposed {
            return Err(SessionError::SessionClosed);
        }
        let latest = inner.buffers.get(uri).map(|b| b.version);
        let committed = latest == Some(version);
        if committed {
            inner.snapshots.insert(
                Arc::from(uri),
                BufferSnapshot {
                    version,
                    analysis: Arc::new(analysis),
                },
            );
            inner.snapshot_id += 1;
            tracing::debug!(uri, version, snapshot = inner.snapshot_id, "update committed");
        } else {
            tracing::debug!(uri, version, ?latest, "update superseded, result discarded");
        }
        Ok(UpdateOutcome {
            buffer,
            version,
            committed,
        })
    }

    // ==================== queries ====================

    /// All diagnostics of the last committed analysis, sorted by position.
    /// Unknown URIs yield an empty list.
    pub fn get_errors(&self, uri: &str) -> Result<Vec<Diagnostic>, SessionError> {
        Ok(self
            .snapshot(uri)?
            .map(|a| a.diagnostics.clone())
            .unwrap_or_default())
    }

    /// Current text of a buffer ("" for unknown URIs).
    pub fn get_text(&self, uri: &str) -> Result<Arc<str>, SessionError> {
        let inner = self.inner.read();
        if inner.disposed {
            return Err(SessionError::SessionClosed);
        }
        Ok(inner.buffers.get_text(uri))
    }

    /// Hover information at a 1-based position.
    pub fn query_type(
        &self,
        uri: &str,
        line: u32,
        column: u32,
    ) -> Result<Option<HoverResult>, SessionError> {
        let Some((analysis, offset)) = self.locate(uri, line, column)? else {
            return Ok(None);
        };
        Ok(hover(&analysis, offset))
    }

    /// Definition of the name at a 1-based position.
    pub fn goto_definition(
        &self,
        uri: &str,
        line: u32,
        column: u32,
    ) -> Result<Option<GotoTarget>, SessionError> {
        let Some((analysis, offset)) = self.locate(uri, line, column)? else {
            return Ok(None);
        };
        Ok(goto_definition(&analysis, offset))
    }

    /// Completion items at a 1-based position.
    pub fn auto_complete(
        &self,
        uri: &str,
        line: u32,
        column: u32,
    ) -> Result<Vec<CompletionItem>, SessionError> {
        let Some((analysis, offset)) = self.locate(uri, line, column)? else {
            return Ok(Vec::new());
        };
        Ok(completions(&analysis, offset))
    }

    /// All inlay hints for a buffer.
    pub fn inlay_hint(&self, uri: &str) -> Result<Vec<InlayHint>, SessionError> {
        Ok(self
            .snapshot(uri)?
            .map(|a| inlay_hints(&a))
            .unwrap_or_default())
    }

    /// Overload candidates for the call at a 1-based position.
    pub fn matching_overloads(
        &self,
        uri: &str,
        line: u32,
        column: u32,
    ) -> Result<Vec<Arc<Signature>>, SessionError> {
        let Some((analysis, offset)) = self.locate(uri, line, column)? else {
            return Ok(Vec::new());
        };
        Ok(matching_overloads(&analysis, offset))
    }

    /// Committed version of a buffer's snapshot, if any.
    pub fn snapshot_version(&self, uri: &str) -> Result<Option<u64>, SessionError> {
        let inner = self.inner.read();
        if inner.disposed {
            return Err(SessionError::SessionClosed);
        }
        Ok(inner.snapshots.get(uri).map(|s| s.version))
    }

    /// Global snapshot counter (bumps on every committed update).
    pub fn snapshot_id(&self) -> Result<u64, SessionError> {
        let inner = self.inner.read();
        if inner.disposed {
            return Err(SessionError::SessionClosed);
        }
        Ok(inner.snapshot_id)
    }

    // ==================== lifecycle ====================

    pub fn state(&self) -> SessionState {
        let inner = self.inner.read();
        if inner.disposed {
            SessionState::Disposed
        } else if self.in_flight.load(Ordering::SeqCst) > 0 {
            SessionState::Updating
        } else {
            SessionState::Ready
        }
    }

    /// Dispose the session, dropping all buffers and snapshots. Further
    /// calls fail with [`SessionError::SessionClosed`]. Idempotent.
    pub fn dispose(&self) {
        let mut inner = self.inner.write();
        if inner.disposed {
            return;
        }
        inner.disposed = true;
        inner.buffers.clear();
        inner.snapshots.clear();
        tracing::debug!("session disposed");
    }

    /// Take (and clear) the most recent query fault.
    pub fn take_last_fault(&self) -> Option<QueryFault> {
        self.inner.write().last_fault.take()
    }

    // ==================== internals ====================

    /// Committed analysis of a buffer, for the protocol layer.
    pub(crate) fn analysis(&self, uri: &str) -> Result<Option<Arc<Analysis>>, SessionError> {
        self.snapshot(uri)
    }

    fn snapshot(&self, uri: &str) -> Result<Option<Arc<Analysis>>, SessionError> {
        let inner = self.inner.read();
        if inner.disposed {
            return Err(SessionError::SessionClosed);
        }
        Ok(inner.snapshots.get(uri).map(|s| s.analysis.clone()))
    }

    /// Resolve a 1-based position inside a buffer's snapshot. Invalid
    /// positions and missing snapshots record a fault and yield None.
    fn locate(
        &self,
        uri: &str,
        line: u32,
        column: u32,
    ) -> Result<Option<(Arc<Analysis>, TextSize)>, SessionError> {
        let Some(analysis) = self.snapshot(uri)? else {
            self.record_fault(QueryFault::NoSnapshot {
                uri: Arc::from(uri),
            });
            return Ok(None);
        };
        match analysis
            .line_index
            .offset_of_position(Position::new(line, column))
        {
            Some(offset) => Ok(Some((analysis, offset))),
            None => {
                self.record_fault(QueryFault::InvalidPosition { line, column });
                Ok(None)
            }
        }
    }

    fn record_fault(&self, fault: QueryFault) {
        tracing::debug!(%fault, "query fault");
        self.inner.write().last_fault = Some(fault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_query() {
        let session = Session::new();
        let outcome = session
            .update_source("main.py", "def f(x: int) -> int:\n    return x\n")
            .unwrap();
        assert_eq!(outcome.version, 1);
        assert!(outcome.committed);
        assert!(session.get_errors("main.py").unwrap().is_empty());
        let hover = session.query_type("main.py", 2, 12).unwrap().unwrap();
        assert!(hover.markdown.contains("int"));
    }

    #[test]
    fn test_versions_bump_even_for_identical_text() {
        let session = Session::new();
        let a = session.update_source("a.py", "x = 1\n").unwrap();
        let b = session.update_source("a.py", "x = 1\n").unwrap();
        assert_eq!(a.version, 1);
        assert_eq!(b.version, 2);
        assert_eq!(session.snapshot_version("a.py").unwrap(), Some(2));
        assert_eq!(session.snapshot_id().unwrap(), 2);
    }

    #[test]
    fn test_recheck_replaces_diagnostics() {
        let session = Session::new();
        session.update_source("a.py", "y = missing\n").unwrap();
        assert_eq!(session.get_errors("a.py").unwrap().len(), 1);
        session.update_source("a.py", "missing = 1\ny = missing\n").unwrap();
        assert!(session.get_errors("a.py").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_position_faults_not_errors() {
        let session = Session::new();
        session.update_source("a.py", "x = 1\n").unwrap();
        assert!(session.query_type("a.py", 0, 1).unwrap().is_none());
        assert_eq!(
            session.take_last_fault(),
            Some(QueryFault::InvalidPosition { line: 0, column: 1 })
        );
        // The fault is consumed.
        assert!(session.take_last_fault().is_none());
        assert!(session.query_type("a.py", 99, 1).unwrap().is_none());
        assert!(matches!(
            session.take_last_fault(),
            Some(QueryFault::InvalidPosition { line: 99, .. })
        ));
    }

    #[test]
    fn test_unknown_uri_yields_empty_results() {
        let session = Session::new();
        assert!(session.get_errors("nope.py").unwrap().is_empty());
        assert_eq!(&*session.get_text("nope.py").unwrap(), "");
        assert!(session.auto_complete("nope.py", 1, 1).unwrap().is_empty());
        assert!(matches!(
            session.take_last_fault(),
            Some(QueryFault::NoSnapshot { .. })
        ));
    }

    #[test]
    fn test_disposed_session_rejects_calls() {
        let session = Session::new();
        session.update_source("a.py", "x = 1\n").unwrap();
        session.dispose();
        assert_eq!(session.state(), SessionState::Disposed);
        assert_eq!(
            session.update_source("a.py", "x = 2\n"),
            Err(SessionError::SessionClosed)
        );
        assert_eq!(session.get_errors("a.py"), Err(SessionError::SessionClosed));
        // Idempotent.
        session.dispose();
        assert_eq!(session.state(), SessionState::Disposed);
    }

    #[test]
    fn test_state_ready_after_update() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Ready);
        session.update_source("a.py", "x = 1\n").unwrap();
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn test_concurrent_updates_converge() {
        use std::sync::Arc as StdArc;
        let session = StdArc::new(Session::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let session = session.clone();
            handles.push(std::thread::spawn(move || {
                let text = format!("x = {i}\n");
                session.update_source("a.py", &text).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        // The committed snapshot matches the latest buffer version.
        let version = session.snapshot_version("a.py").unwrap().unwrap();
        assert_eq!(version, 8);
        let text = session.get_text("a.py").unwrap();
        let hover = session.query_type("a.py", 1, 1).unwrap().unwrap();
        assert!(hover.markdown.contains("int"), "text was {text:?}");
    }
}
