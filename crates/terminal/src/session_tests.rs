// SPDX-License-Identifier: MIT

use std::time::Duration;

use super::*;

fn thread_id() -> ThreadId {
    ThreadId::new()
}

#[tokio::test]
async fn writing_input_is_echoed_back_through_the_pty() {
    let handle = SessionHandle::spawn(thread_id(), "/bin/cat".into(), std::env::temp_dir(), 80, 24, crate::scrollback::DEFAULT_MAX_SCROLLBACK_BYTES).expect("spawn cat under a pty");
    let mut rx = handle.subscribe();

    handle.write_input(Bytes::from_static(b"hello\n"), 1 << 20).await.expect("write input");

    let frame = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.expect("frame arrives before timeout").expect("frame");
    match frame {
        TerminalFrame::Output { data, .. } => assert!(String::from_utf8_lossy(&data).contains("hello")),
        other => panic!("expected an output frame, got {other:?}"),
    }
}

#[tokio::test]
async fn closing_the_session_eventually_emits_an_exit_frame() {
    let handle = SessionHandle::spawn(thread_id(), "/bin/cat".into(), std::env::temp_dir(), 80, 24, crate::scrollback::DEFAULT_MAX_SCROLLBACK_BYTES).expect("spawn cat under a pty");
    let mut rx = handle.subscribe();
    handle.close(true).await;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        assert!(remaining > Duration::ZERO, "exit frame never arrived");
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Ok(TerminalFrame::Exit { .. })) => break,
            Ok(Ok(_)) => continue,
            _ => panic!("exit frame never arrived"),
        }
    }

    assert_eq!(handle.shared.lock().await.status, cw_core::TerminalStatus::Exited);
}

#[tokio::test]
async fn resize_clamps_to_the_documented_bounds() {
    let handle = SessionHandle::spawn(thread_id(), "/bin/cat".into(), std::env::temp_dir(), 80, 24, crate::scrollback::DEFAULT_MAX_SCROLLBACK_BYTES).expect("spawn cat under a pty");
    handle.resize(2, 2000).await.expect("resize");
    let guard = handle.shared.lock().await;
    assert_eq!(guard.cols, 10);
    assert_eq!(guard.rows, 300);
}

#[tokio::test]
async fn writing_input_larger_than_the_limit_is_rejected() {
    let handle = SessionHandle::spawn(thread_id(), "/bin/cat".into(), std::env::temp_dir(), 80, 24, crate::scrollback::DEFAULT_MAX_SCROLLBACK_BYTES).expect("spawn cat under a pty");
    let err = handle.write_input(Bytes::from_static(b"0123456789"), 4).await.unwrap_err();
    assert!(matches!(err, TerminalError::InputTooLarge(10, 4)));
}
