// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_core::{AttachConfig, LaunchConfig};
use serde_json::json;

#[test]
fn launch_args_use_lldb_launch_schema() {
    let config = LaunchConfig::program("/work/target/debug/app").cwd("/work");
    let args = launch_args(&config).expect("launch args failed");

    assert_eq!(args["type"], "lldb");
    assert_eq!(args["request"], "launch");
    assert_eq!(args["program"], "/work/target/debug/app");
    assert_eq!(args["terminal"], "console");
    assert_eq!(args["stopOnEntry"], false);
}

#[test]
fn launch_args_pass_lldb_extras_through() {
    let config = LaunchConfig::program("/work/bin/app")
        .extra("sourceMap", json!({"/build": "/work"}))
        .extra("initCommands", json!(["settings set target.x86-disassembly-flavor intel"]))
        .extra("expressions", json!("native"));
    let args = launch_args(&config).expect("launch args failed");

    assert_eq!(args["sourceMap"], json!({"/build": "/work"}));
    assert_eq!(
        args["initCommands"],
        json!(["settings set target.x86-disassembly-flavor intel"])
    );
    assert_eq!(args["expressions"], "native");
}

#[test]
fn launch_args_require_program() {
    let err = launch_args(&LaunchConfig::default()).expect_err("expected failure");
    assert_eq!(err.code(), "LAUNCH_FAILED");
}

#[test]
fn attach_args_by_pid_wait_or_connect() {
    let by_pid = attach_args(&AttachConfig::process_id(1234));
    assert_eq!(by_pid["type"], "lldb");
    assert_eq!(by_pid["pid"], 1234);

    let mut wait = AttachConfig::default();
    wait.extra.insert("waitFor".to_string(), json!("my-app"));
    let by_wait = attach_args(&wait);
    assert_eq!(by_wait["waitFor"], "my-app");

    let remote = attach_args(&AttachConfig::port(13000));
    assert_eq!(remote["connect"]["port"], 13000);
}

#[cfg(unix)]
#[test]
fn extension_discovery_finds_codelldb_adapter() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let adapter_dir = dir.path().join("vadimcn.vscode-lldb-1.10.0").join("adapter");
    std::fs::create_dir_all(&adapter_dir).expect("mkdir failed");
    let binary = adapter_dir.join("codelldb");
    std::fs::write(&binary, b"#!/bin/sh\n").expect("write failed");

    let found = codelldb_in_extensions(dir.path()).expect("adapter not found");
    assert_eq!(found, binary);
}

#[test]
fn extension_discovery_handles_missing_directory() {
    assert!(codelldb_in_extensions(std::path::Path::new("/nonexistent/extensions")).is_none());
}
