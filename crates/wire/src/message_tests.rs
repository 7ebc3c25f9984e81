// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn encode_request_carries_type_tag() {
    let request = DapMessage::Request(DapRequest {
        seq: 7,
        command: "launch".to_string(),
        arguments: json!({"program": "/work/app.py"}),
    });

    let bytes = encode(&request).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["type"], "request");
    assert_eq!(value["seq"], 7);
    assert_eq!(value["command"], "launch");
    assert_eq!(value["arguments"]["program"], "/work/app.py");
}

#[test]
fn decode_response_envelope() {
    let raw = br#"{
        "seq": 12, "type": "response", "request_seq": 7, "success": true,
        "command": "launch", "body": {"ok": 1}
    }"#;

    match decode(raw).unwrap() {
        DapMessage::Response(resp) => {
            assert_eq!(resp.request_seq, 7);
            assert!(resp.success);
            assert_eq!(resp.body["ok"], 1);
        }
        other => panic!("expected response, got {:?}", other),
    }
}

#[test]
fn decode_failure_response_keeps_message() {
    let raw = br#"{"seq": 2, "type": "response", "request_seq": 1, "success": false,
                   "command": "evaluate", "message": "name 'x' is not defined"}"#;

    match decode(raw).unwrap() {
        DapMessage::Response(resp) => {
            assert!(!resp.success);
            assert_eq!(resp.message.as_deref(), Some("name 'x' is not defined"));
            assert_eq!(resp.body, serde_json::Value::Null);
        }
        other => panic!("expected response, got {:?}", other),
    }
}

#[test]
fn decode_event_envelope() {
    let raw = br#"{"seq": 3, "type": "event", "event": "stopped",
                   "body": {"reason": "breakpoint", "threadId": 1}}"#;

    match decode(raw).unwrap() {
        DapMessage::Event(event) => {
            assert_eq!(event.event, "stopped");
            assert_eq!(event.body["threadId"], 1);
        }
        other => panic!("expected event, got {:?}", other),
    }
}

#[test]
fn unknown_type_decodes_to_other() {
    let raw = br#"{"seq": 4, "type": "telemetry", "data": {}}"#;
    match decode(raw).unwrap() {
        DapMessage::Other { kind } => assert_eq!(kind, "telemetry"),
        other => panic!("expected other, got {:?}", other),
    }
}

#[test]
fn invalid_utf8_is_fatal() {
    let err = decode(&[0xff, 0xfe, b'{', b'}']).unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidUtf8));
}

#[test]
fn invalid_json_is_fatal() {
    let err = decode(b"{not json").unwrap_err();
    assert!(matches!(err, ProtocolError::InvalidJson(_)));
}

#[test]
fn round_trip_preserves_request() {
    let original = DapMessage::Request(DapRequest {
        seq: 99,
        command: "configurationDone".to_string(),
        arguments: json!({}),
    });
    let decoded = decode(&encode(&original).unwrap()).unwrap();
    assert_eq!(decoded, original);
}
