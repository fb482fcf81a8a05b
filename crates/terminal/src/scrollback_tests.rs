// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn replay_from_minus_one_returns_everything_retained() {
    let mut sb = Scrollback::new(DEFAULT_MAX_SCROLLBACK_BYTES);
    sb.push_output(b"a".to_vec());
    sb.push_output(b"b".to_vec());
    let frames = sb.replay(-1).expect("replay");
    assert_eq!(frames.len(), 2);
}

#[test]
fn replay_from_a_seen_cursor_returns_only_the_tail() {
    let mut sb = Scrollback::new(DEFAULT_MAX_SCROLLBACK_BYTES);
    sb.push_output(b"a".to_vec());
    sb.push_output(b"b".to_vec());
    sb.push_output(b"c".to_vec());
    let frames = sb.replay(0).expect("replay");
    assert_eq!(frames.len(), 2);
}

#[test]
fn eviction_keeps_the_byte_budget_but_never_drops_the_exit_frame() {
    let mut sb = Scrollback::new(4);
    sb.push_output(b"aaaa".to_vec());
    sb.push_output(b"bbbb".to_vec());
    sb.push_exit(Some(0));

    let frames = sb.replay(-1).expect("replay");
    assert!(matches!(frames.last(), Some(TerminalFrame::Exit { exit_code: Some(0), .. })));
}

#[test]
fn replay_past_the_retained_window_reports_cursor_expired() {
    let mut sb = Scrollback::new(4);
    for i in 0..10 {
        sb.push_output(vec![b'x'; 2]);
        let _ = i;
    }
    let err = sb.replay(0).unwrap_err();
    assert!(matches!(err, TerminalError::CursorExpired));
}

#[test]
fn replay_with_a_cursor_below_negative_one_is_rejected() {
    let sb = Scrollback::new(DEFAULT_MAX_SCROLLBACK_BYTES);
    let err = sb.replay(-2).unwrap_err();
    assert!(matches!(err, TerminalError::CursorExpired));
}

#[test]
fn replay_on_an_empty_scrollback_at_the_initial_cursor_is_empty_not_expired() {
    let sb = Scrollback::new(DEFAULT_MAX_SCROLLBACK_BYTES);
    let frames = sb.replay(-1).expect("replay");
    assert!(frames.is_empty());
}
