// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::Value;
use std::time::Duration;

#[test]
fn codes_match_boundary_contract() {
    let not_found = AdapterError::NotFound {
        language: "go".to_string(),
        install: "go install ...".to_string(),
    };
    assert_eq!(not_found.code(), "ADAPTER_NOT_FOUND");

    assert_eq!(AdapterError::Connection("x".to_string()).code(), "DAP_CONNECTION");

    let timeout = AdapterError::Timeout {
        command: "threads".to_string(),
        timeout: Duration::from_secs(30),
    };
    assert_eq!(timeout.code(), "DAP_TIMEOUT");

    let failed = AdapterError::RequestFailed {
        command: "evaluate".to_string(),
        message: "boom".to_string(),
        response: Value::Null,
    };
    assert_eq!(failed.code(), "DAP_REQUEST_FAILED");

    assert_eq!(AdapterError::LaunchFailed("x".to_string()).code(), "LAUNCH_FAILED");

    let unsupported = AdapterError::UnsupportedLanguage {
        language: "cobol".to_string(),
        supported: vec!["go".to_string(), "python".to_string()],
    };
    assert_eq!(unsupported.code(), "UNSUPPORTED_LANGUAGE");
}

#[test]
fn not_found_message_carries_install_instructions() {
    let err = AdapterError::NotFound {
        language: "python".to_string(),
        install: "pip install debugpy".to_string(),
    };
    let message = err.to_string();
    assert!(message.contains("python"));
    assert!(message.contains("pip install debugpy"));
}

#[test]
fn unsupported_message_lists_supported_languages() {
    let err = AdapterError::UnsupportedLanguage {
        language: "cobol".to_string(),
        supported: vec!["go".to_string(), "python".to_string()],
    };
    let message = err.to_string();
    assert!(message.contains("cobol"));
    assert!(message.contains("go, python"));
}
