// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn parses_busy_marker_with_job_count() {
    let flags = ShellStateFlags::parse_marker_body("busy:2").expect("parses");
    assert!(flags.foreground_busy);
    assert_eq!(flags.background_jobs, 2);
}

#[test]
fn parses_idle_marker_with_zero_jobs() {
    let flags = ShellStateFlags::parse_marker_body("idle:0").expect("parses");
    assert!(!flags.foreground_busy);
    assert_eq!(flags.background_jobs, 0);
}

#[test]
fn rejects_malformed_marker() {
    assert!(ShellStateFlags::parse_marker_body("unknown:1").is_none());
    assert!(ShellStateFlags::parse_marker_body("busy").is_none());
    assert!(ShellStateFlags::parse_marker_body("busy:notanumber").is_none());
}

#[test]
fn new_session_starts_running_with_idle_shell_state() {
    let session = TerminalSession::new(ThreadId::from("TH-1"), 80, 24);
    assert_eq!(session.status, TerminalStatus::Running);
    assert_eq!(session.shell_state, ShellStateFlags::idle());
    assert!(session.exit_code.is_none());
}

#[test]
fn mark_exited_sets_status_and_code() {
    let mut session = TerminalSession::new(ThreadId::from("TH-1"), 80, 24);
    session.mark_exited(Some(0));
    assert_eq!(session.status, TerminalStatus::Exited);
    assert_eq!(session.exit_code, Some(0));
}

#[test]
fn output_frame_round_trips_base64_through_json() {
    let frame = TerminalFrame::Output { offset: 10, data: vec![0, 159, 146, 150] };
    let value = serde_json::to_value(&frame).expect("serialize");
    assert_eq!(value["type"], "output");
    let back: TerminalFrame = serde_json::from_value(value).expect("deserialize");
    match back {
        TerminalFrame::Output { offset, data } => {
            assert_eq!(offset, 10);
            assert_eq!(data, vec![0, 159, 146, 150]);
        }
        TerminalFrame::Exit { .. } => panic!("expected output frame"),
    }
}
