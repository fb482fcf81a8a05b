// SPDX-License-Identifier: MIT

use super::*;

fn sample_approval(kind: ApprovalKind) -> Approval {
    Approval::new(
        JobId::from("JOB-1"),
        ThreadId::from("TH-1"),
        kind,
        serde_json::json!(42),
        "execCommandApproval",
        serde_json::json!({"command": ["rm", "-rf", "build"]}),
    )
}

#[test]
fn new_approval_starts_unresolved() {
    let approval = sample_approval(ApprovalKind::CommandExecution);
    assert!(!approval.is_resolved());
}

#[test]
fn exec_policy_amendment_is_incompatible_with_file_change() {
    let amendment = DecisionValue::AcceptWithExecPolicyAmendment {
        amended_command: vec!["rm".into(), "build".into()],
    };
    assert!(amendment.compatible_with(ApprovalKind::CommandExecution));
    assert!(!amendment.compatible_with(ApprovalKind::FileChange));
}

#[test]
fn plain_decisions_are_compatible_with_either_kind() {
    for value in [DecisionValue::Accept, DecisionValue::AcceptForSession, DecisionValue::Decline, DecisionValue::Cancel] {
        assert!(value.compatible_with(ApprovalKind::CommandExecution));
        assert!(value.compatible_with(ApprovalKind::FileChange));
    }
}

#[test]
fn decision_value_as_str_matches_wire_tag() {
    assert_eq!(DecisionValue::Accept.as_str(), "accept");
    assert_eq!(DecisionValue::AcceptForSession.as_str(), "accept_for_session");
    assert_eq!(DecisionValue::Decline.as_str(), "decline");
    assert_eq!(DecisionValue::Cancel.as_str(), "cancel");
}
