// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn queued_running_and_waiting_approval_are_active() {
    assert!(JobState::Queued.is_active());
    assert!(JobState::Running.is_active());
    assert!(JobState::WaitingApproval.is_active());
    assert!(!JobState::Queued.is_terminal());
}

#[test]
fn done_failed_and_cancelled_are_terminal() {
    assert!(JobState::Done.is_terminal());
    assert!(JobState::Failed.is_terminal());
    assert!(JobState::Cancelled.is_terminal());
    assert!(!JobState::Done.is_active());
}

#[test]
fn new_job_starts_queued_with_zeroed_counters() {
    let job = Job::new(ThreadId::from("TH-1"));
    assert_eq!(job.state, JobState::Queued);
    assert_eq!(job.next_seq, 0);
    assert_eq!(job.first_seq, 0);
    assert!(job.pending_approval_ids.is_empty());
    assert!(!job.finished_emitted);
    assert!(job.terminal_at.is_none());
}

#[test]
fn transition_to_terminal_stamps_terminal_at_once() {
    let mut job = Job::new(ThreadId::from("TH-1"));
    job.transition_to(JobState::Running);
    assert!(job.terminal_at.is_none());

    job.transition_to(JobState::Done);
    let first_stamp = job.terminal_at.expect("terminal_at set");

    // A later call while already terminal must not move the stamp.
    std::thread::sleep(std::time::Duration::from_millis(2));
    job.transition_to(JobState::Done);
    assert_eq!(job.terminal_at, Some(first_stamp));
}
