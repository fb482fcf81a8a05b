// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn event_type_round_trips_through_json() {
    for (variant, expected) in [
        (EventType::JobCreated, "\"job.created\""),
        (EventType::ItemAgentMessageDelta, "\"item.agentMessage.delta\""),
        (
            EventType::ItemCommandExecutionOutputDelta,
            "\"item.commandExecution.outputDelta\"",
        ),
        (EventType::ApprovalRequired, "\"approval.required\""),
        (EventType::Error, "\"error\""),
    ] {
        let json = serde_json::to_string(&variant).expect("serialize");
        assert_eq!(json, expected);
        let back: EventType = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.as_str(), variant.as_str());
    }
}

#[test]
fn envelope_serializes_job_id_under_camel_case_key() {
    let job_id = JobId::from("JOB-abc");
    let envelope = EventEnvelope::new(EventType::JobState, job_id.clone(), 3, serde_json::json!({"state": "RUNNING"}));
    let value = serde_json::to_value(&envelope).expect("serialize");
    assert_eq!(value["jobId"], serde_json::json!(job_id.as_str()));
    assert_eq!(value["seq"], 3);
    assert_eq!(value["type"], "job.state");
}
