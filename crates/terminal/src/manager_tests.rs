// SPDX-License-Identifier: MIT

use std::time::Duration;

use super::*;
use cw_core::ThreadId;

fn limits() -> TerminalLimits {
    TerminalLimits { max_sessions: 2, max_input_bytes: 1 << 20, max_scrollback_bytes: crate::scrollback::DEFAULT_MAX_SCROLLBACK_BYTES, idle_ttl: Duration::from_millis(50), sweep_interval: Duration::from_millis(10) }
}

#[tokio::test]
async fn opening_twice_for_the_same_thread_reuses_the_session() {
    let manager = TerminalManager::new("/bin/cat", limits());
    let thread = ThreadId::new();

    let first = manager.open_session(thread.clone(), std::env::temp_dir(), 80, 24).await.expect("open");
    assert!(!first.reused);

    let second = manager.open_session(thread, std::env::temp_dir(), 80, 24).await.expect("reopen");
    assert!(second.reused);
    assert_eq!(first.session.id, second.session.id);
}

#[tokio::test]
async fn session_cap_is_enforced() {
    let manager = TerminalManager::new("/bin/cat", limits());
    manager.open_session(ThreadId::new(), std::env::temp_dir(), 80, 24).await.expect("open 1");
    manager.open_session(ThreadId::new(), std::env::temp_dir(), 80, 24).await.expect("open 2");

    let err = manager.open_session(ThreadId::new(), std::env::temp_dir(), 80, 24).await.unwrap_err();
    assert!(matches!(err, TerminalError::TooManySessions(2)));
}

#[tokio::test]
async fn attach_replays_then_streams_live_output() {
    let manager = TerminalManager::new("/bin/cat", limits());
    let outcome = manager.open_session(ThreadId::new(), std::env::temp_dir(), 80, 24).await.expect("open");

    manager.write_input(&outcome.session.id, bytes::Bytes::from_static(b"hi\n")).await.expect("write");
    tokio::time::sleep(Duration::from_millis(200)).await;

    let attach = manager.attach_client(&outcome.session.id, -1).await.expect("attach");
    assert!(attach.replay.iter().any(|frame| matches!(frame, cw_core::TerminalFrame::Output { data, .. } if String::from_utf8_lossy(data).contains("hi"))));
}

#[tokio::test]
async fn detach_after_exit_reaps_the_session() {
    let manager = TerminalManager::new("/bin/cat", limits());
    let outcome = manager.open_session(ThreadId::new(), std::env::temp_dir(), 80, 24).await.expect("open");
    let attach = manager.attach_client(&outcome.session.id, -1).await.expect("attach");
    drop(attach.receiver);

    manager.close_session(&outcome.session.id, true).await.expect("close");
    tokio::time::sleep(Duration::from_millis(200)).await;
    manager.reap_if_idle(&outcome.session.id).await;
    manager.detach_client(&outcome.session.id).await;

    assert!(manager.get(&outcome.session.id).await.is_err());
}

#[tokio::test]
async fn unknown_session_operations_return_not_found() {
    let manager = TerminalManager::new("/bin/cat", limits());
    let bogus = cw_core::SessionId::new();
    assert!(manager.resize_session(&bogus, 80, 24).await.is_err());
    assert!(manager.write_input(&bogus, bytes::Bytes::new()).await.is_err());
}
