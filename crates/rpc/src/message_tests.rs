// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn id_without_method_classifies_as_response() {
    let msg = classify_line(r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#).expect("classify");
    match msg {
        IncomingMessage::Response(r) => {
            assert_eq!(r.id, serde_json::json!(1));
            assert_eq!(r.result, Some(serde_json::json!({"ok": true})));
            assert!(r.error.is_none());
        }
        _ => panic!("expected response"),
    }
}

#[test]
fn error_response_carries_jsonrpc_error_object() {
    let msg = classify_line(r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"nope"}}"#).expect("classify");
    match msg {
        IncomingMessage::Response(r) => {
            assert!(r.result.is_none());
            let error = r.error.expect("error present");
            assert_eq!(error.code, -32601);
        }
        _ => panic!("expected response"),
    }
}

#[test]
fn id_with_method_classifies_as_server_request() {
    let msg = classify_line(r#"{"jsonrpc":"2.0","id":"abc","method":"item/commandExecution/requestApproval","params":{}}"#)
        .expect("classify");
    match msg {
        IncomingMessage::ServerRequest(r) => {
            assert_eq!(r.id, serde_json::json!("abc"));
            assert_eq!(r.method, "item/commandExecution/requestApproval");
        }
        _ => panic!("expected server request"),
    }
}

#[test]
fn no_id_with_method_classifies_as_notification() {
    let msg = classify_line(r#"{"jsonrpc":"2.0","method":"turn/started","params":{"threadId":"TH-1"}}"#).expect("classify");
    match msg {
        IncomingMessage::Notification(n) => assert_eq!(n.method, "turn/started"),
        _ => panic!("expected notification"),
    }
}

#[test]
fn neither_id_nor_method_is_a_protocol_error() {
    let err = classify_line(r#"{"jsonrpc":"2.0","foo":"bar"}"#).unwrap_err();
    assert!(matches!(err, RpcError::Malformed(_)));
}

#[test]
fn response_with_neither_result_nor_error_is_malformed() {
    let err = classify_line(r#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
    assert!(matches!(err, RpcError::Malformed(_)));
}

#[test]
fn invalid_json_is_a_protocol_error() {
    let err = classify_line("not json at all").unwrap_err();
    assert!(matches!(err, RpcError::Malformed(_)));
}

#[test]
fn non_object_top_level_value_is_a_protocol_error() {
    let err = classify_line("[1, 2, 3]").unwrap_err();
    assert!(matches!(err, RpcError::Malformed(_)));
}

#[test]
fn outgoing_request_omits_absent_params() {
    let msg = OutgoingMessage::request(serde_json::json!(1), "thread/list", None);
    let line = msg.to_line().expect("serialize");
    assert!(!line.contains("params"));
    assert!(line.contains("\"method\":\"thread/list\""));
}
