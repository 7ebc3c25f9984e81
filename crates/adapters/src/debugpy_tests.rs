// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_core::{AttachConfig, LaunchConfig};
use serde_json::json;
use std::collections::HashMap;

#[test]
fn launch_args_always_neuter_the_tty() {
    let config = LaunchConfig::program("/work/app.py")
        .env(HashMap::from([("FOO".to_string(), "bar".to_string())]));
    let args = launch_args(&config).expect("launch args failed");

    assert_eq!(args["program"], "/work/app.py");
    assert_eq!(args["env"]["PYTHONUNBUFFERED"], "1");
    assert_eq!(args["env"]["TERM"], "dumb");
    assert_eq!(args["env"]["FOO"], "bar");
    assert_eq!(args["justMyCode"], false);
    assert_eq!(args["redirectOutput"], true);
    assert_eq!(args["console"], "internalConsole");
    assert_eq!(args["cwd"], ".");
}

#[test]
fn launch_args_accept_module_instead_of_program() {
    let config = LaunchConfig::module("pytest").cwd("/work");
    let args = launch_args(&config).expect("launch args failed");

    assert_eq!(args["module"], "pytest");
    assert_eq!(args["cwd"], "/work");
    assert!(args.get("program").is_none());
}

#[test]
fn launch_args_require_program_or_module() {
    let err = launch_args(&LaunchConfig::default()).expect_err("expected failure");
    assert_eq!(err.code(), "LAUNCH_FAILED");
    assert!(err.to_string().contains("program or module"));
}

#[test]
fn launch_args_pass_python_extras_through() {
    let config = LaunchConfig::program("/work/app.py")
        .extra("pythonArgs", json!(["-X", "dev"]))
        .extra("python", json!("/opt/py/bin/python3"));
    let args = launch_args(&config).expect("launch args failed");

    assert_eq!(args["pythonArgs"], json!(["-X", "dev"]));
    assert_eq!(args["python"], "/opt/py/bin/python3");
}

#[test]
fn attach_args_prefer_process_id_over_connect() {
    let by_pid = attach_args(&AttachConfig::process_id(4242));
    assert_eq!(by_pid["processId"], 4242);
    assert!(by_pid.get("connect").is_none());

    let by_port = attach_args(&AttachConfig::port(5678));
    assert_eq!(by_port["connect"]["host"], "127.0.0.1");
    assert_eq!(by_port["connect"]["port"], 5678);
    assert_eq!(by_port["justMyCode"], false);
}
