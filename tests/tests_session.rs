//! Session lifecycle and snapshot semantics.
//!
//! Covers the core guarantees of the update/query loop:
//! - every update bumps the buffer version, identical text included
//! - queries answer from the last committed snapshot, never stale text
//! - a superseded update's analysis is discarded, not committed
//! - re-analysis replaces the diagnostic set wholesale
//! - a disposed session rejects everything and disposal is idempotent

use std::sync::Arc;

use pyrite::{QueryFault, Session, SessionError, SessionState};

const CLEAN: &str = "def f(x: int) -> int:\n    return x\n";

#[test]
fn test_update_then_query_roundtrip() {
    let session = Session::new();
    let outcome = session.update_source("main.py", CLEAN).unwrap();
    assert_eq!(outcome.version, 1);
    assert!(outcome.committed);

    assert!(session.get_errors("main.py").unwrap().is_empty());
    let hover = session.query_type("main.py", 2, 12).unwrap().unwrap();
    assert!(hover.markdown.contains("int"), "hover was {}", hover.markdown);
}

#[test]
fn test_identical_text_still_reanalyzes() {
    let session = Session::new();
    let first = session.update_source("a.py", CLEAN).unwrap();
    let second = session.update_source("a.py", CLEAN).unwrap();
    assert_eq!(first.version, 1);
    assert_eq!(second.version, 2);
    assert_eq!(session.snapshot_version("a.py").unwrap(), Some(2));
}

#[test]
fn test_queries_never_see_stale_results() {
    let session = Session::new();
    session.update_source("a.py", "x = 1\n").unwrap();
    let hover = session.query_type("a.py", 1, 1).unwrap().unwrap();
    assert!(hover.markdown.contains("int"));

    session.update_source("a.py", "x = 'text'\n").unwrap();
    let hover = session.query_type("a.py", 1, 1).unwrap().unwrap();
    assert!(
        hover.markdown.contains("str"),
        "expected the new analysis, got {}",
        hover.markdown
    );
}

#[test]
fn test_analysis_is_idempotent() {
    let session_a = Session::new();
    let session_b = Session::new();
    let text = "def f(x: int) -> str:\n    return x\nz = f(1)\nbad()\n";
    session_a.update_source("a.py", text).unwrap();
    session_b.update_source("a.py", text).unwrap();
    assert_eq!(
        session_a.get_errors("a.py").unwrap(),
        session_b.get_errors("a.py").unwrap()
    );
}

#[test]
fn test_recheck_replaces_diagnostics_wholesale() {
    let session = Session::new();
    session.update_source("a.py", "a = missing\nb = also_missing\n").unwrap();
    assert_eq!(session.get_errors("a.py").unwrap().len(), 2);

    session.update_source("a.py", "a = 1\nb = also_missing\n").unwrap();
    let errors = session.get_errors("a.py").unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("also_missing"));

    session.update_source("a.py", "a = 1\nb = 2\n").unwrap();
    assert!(session.get_errors("a.py").unwrap().is_empty());
}

#[test]
fn test_buffers_are_independent() {
    let session = Session::new();
    session.update_source("a.py", "x = missing\n").unwrap();
    session.update_source("b.py", "y = 1\n").unwrap();
    assert_eq!(session.get_errors("a.py").unwrap().len(), 1);
    assert!(session.get_errors("b.py").unwrap().is_empty());
}

#[test]
fn test_invalid_positions_record_faults() {
    let session = Session::new();
    session.update_source("a.py", "x = 1\n").unwrap();

    assert!(session.query_type("a.py", 0, 1).unwrap().is_none());
    assert_eq!(
        session.take_last_fault(),
        Some(QueryFault::InvalidPosition { line: 0, column: 1 })
    );

    assert!(session.goto_definition("a.py", 50, 1).unwrap().is_none());
    assert!(matches!(
        session.take_last_fault(),
        Some(QueryFault::InvalidPosition { line: 50, .. })
    ));

    // A valid query afterwards leaves no fault behind.
    assert!(session.query_type("a.py", 1, 1).unwrap().is_some());
    assert!(session.take_last_fault().is_none());
}

#[test]
fn test_dispose_rejects_further_calls() {
    let session = Session::new();
    session.update_source("a.py", "x = 1\n").unwrap();
    session.dispose();

    assert_eq!(session.state(), SessionState::Disposed);
    assert_eq!(
        session.update_source("a.py", "x = 2\n"),
        Err(SessionError::SessionClosed)
    );
    assert_eq!(session.get_errors("a.py"), Err(SessionError::SessionClosed));
    assert_eq!(session.snapshot_id(), Err(SessionError::SessionClosed));

    session.dispose();
    assert_eq!(session.state(), SessionState::Disposed);
}

#[test]
fn test_concurrent_updates_commit_latest_version() {
    let session = Arc::new(Session::new());
    let mut handles = Vec::new();
    for i in 0..16 {
        let session = session.clone();
        handles.push(std::thread::spawn(move || {
            session
                .update_source("a.py", &format!("value = {i}\n"))
                .unwrap()
        }));
    }
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Versions were allocated 1..=16 and the committed snapshot is the
    // newest one; at minimum the holder of version 16 committed.
    let mut versions: Vec<u64> = outcomes.iter().map(|o| o.version).collect();
    versions.sort_unstable();
    assert_eq!(versions, (1..=16).collect::<Vec<u64>>());
    assert_eq!(session.snapshot_version("a.py").unwrap(), Some(16));
    assert!(
        outcomes.iter().any(|o| o.version == 16 && o.committed),
        "latest update must commit"
    );
}

#[test]
fn test_concurrent_readers_during_updates() {
    let session = Arc::new(Session::new());
    session.update_source("a.py", "x = 1\n").unwrap();

    let writer = {
        let session = session.clone();
        std::thread::spawn(move || {
            for i in 0..50 {
                session
                    .update_source("a.py", &format!("x = {i}\n"))
                    .unwrap();
            }
        })
    };
    let reader = {
        let session = session.clone();
        std::thread::spawn(move || {
            for _ in 0..50 {
                // Every observed snapshot is internally consistent: the
                // buffer always types as int.
                let hover = session.query_type("a.py", 1, 1).unwrap().unwrap();
                assert!(hover.markdown.contains("int"));
            }
        })
    };
    writer.join().unwrap();
    reader.join().unwrap();
}
