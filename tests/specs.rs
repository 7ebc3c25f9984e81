// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end relay scenarios driven through the session manager with the
//! scriptable fake adapter standing in for a real debugger.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use relay_adapters::{FakeAdapterRecorder, FakeBehavior};
use relay_core::{EventType, LaunchConfig, SessionState, SourceBreakpoint};
use relay_daemon::{RelayConfig, SessionConfig, SessionManager};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Relay {
    manager: Arc<SessionManager>,
    recorder: FakeAdapterRecorder,
    dir: TempDir,
}

fn relay_with(behavior: FakeBehavior, tune: impl FnOnce(&mut RelayConfig)) -> Relay {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let mut config = RelayConfig::with_data_dir(dir.path());
    tune(&mut config);

    let recorder = FakeAdapterRecorder::with_behavior(behavior);
    let manager = Arc::new(SessionManager::with_registry(config, recorder.registry()));
    Relay { manager, recorder, dir }
}

fn relay() -> Relay {
    relay_with(FakeBehavior::default(), |_| {})
}

#[tokio::test]
async fn s1_run_to_completion_captures_output() {
    let relay = relay();
    let session = relay
        .manager
        .create(SessionConfig::new(relay.dir.path().join("project")))
        .await
        .expect("create failed");

    session
        .launch(LaunchConfig::program("/work/hello.py"))
        .await
        .expect("launch failed");
    assert_eq!(session.state(), SessionState::Running);

    let adapter = relay.recorder.last().expect("no adapter");
    adapter.emit_output("stdout", "Hello, World!\n");
    adapter.emit_terminated();

    assert_eq!(session.state(), SessionState::Terminated);
    let page = session.output_page(0, 100, None);
    assert!(page.lines.iter().any(|l| l.content.contains("Hello, World!")));

    // The terminated event is retrievable by a polling client
    let events = session.get_events(Some(Duration::from_millis(100))).await;
    assert!(events.iter().any(|e| e.event_type == EventType::Terminated));
}

#[tokio::test]
async fn s2_breakpoint_pause_inspect_continue() {
    let relay = relay_with(
        FakeBehavior { stop_on_launch: true, ..FakeBehavior::default() },
        |_| {},
    );
    let session = relay
        .manager
        .create(SessionConfig::new(relay.dir.path().join("project")))
        .await
        .expect("create failed");

    // Breakpoint set before launch is pending
    let verdicts = session
        .set_breakpoints("/work/app.py", vec![SourceBreakpoint::new(4)])
        .await
        .expect("set failed");
    assert!(!verdicts[0].verified);
    assert_eq!(verdicts[0].message.as_deref(), Some("Pending launch"));

    // The handshake declares it and the debuggee stops on it
    session
        .launch(LaunchConfig::program("/work/app.py"))
        .await
        .expect("launch failed");
    assert_eq!(session.state(), SessionState::Paused);

    let adapter = relay.recorder.last().expect("no adapter");
    assert_eq!(adapter.breakpoints_for("/work/app.py").len(), 1);

    // Inspect the paused frame
    let frames = session.stack_trace(None, 0, 20).await.expect("stack trace failed");
    assert!(frames[0].name.contains("greet"));

    let scopes = session.scopes(frames[0].id).await.expect("scopes failed");
    let variables = session
        .variables(scopes[0].variables_reference, 0, 100)
        .await
        .expect("variables failed");
    assert!(variables.iter().any(|v| v.name == "name"));

    adapter.script_evaluation(
        "name.upper()",
        serde_json::json!({"result": "'WORLD'", "type": "str", "variablesReference": 0}),
    );
    let result = session
        .evaluate("name.upper()", Some(frames[0].id), "repl")
        .await
        .expect("evaluate failed");
    assert!(result["result"].as_str().unwrap_or_default().contains("WORLD"));

    // Continue to completion
    session.continue_execution(None).await.expect("continue failed");
    assert_eq!(session.state(), SessionState::Running);
    adapter.emit_terminated();
    assert_eq!(session.state(), SessionState::Terminated);
}

#[tokio::test]
async fn s4_step_into_and_out_between_pauses() {
    let relay = relay_with(
        FakeBehavior { stop_on_launch: true, ..FakeBehavior::default() },
        |_| {},
    );
    let session = relay
        .manager
        .create(SessionConfig::new(relay.dir.path().join("project")))
        .await
        .expect("create failed");

    session
        .launch(LaunchConfig::program("/work/app.py"))
        .await
        .expect("launch failed");
    assert_eq!(session.state(), SessionState::Paused);
    let adapter = relay.recorder.last().expect("no adapter");

    session.step_into(None).await.expect("step into failed");
    assert_eq!(session.state(), SessionState::Running);
    adapter.emit_stopped(1, "step");
    assert_eq!(session.state(), SessionState::Paused);

    session.step_out(None).await.expect("step out failed");
    adapter.emit_stopped(1, "step");
    assert_eq!(session.state(), SessionState::Paused);

    let calls = adapter.calls();
    assert!(calls.contains(&"stepIn:1".to_string()));
    assert!(calls.contains(&"stepOut:1".to_string()));
}

#[tokio::test]
async fn s5_graceful_restart_recovers_configuration() {
    let dir = tempfile::tempdir().expect("tempdir failed");
    let project = dir.path().join("project");
    std::fs::create_dir_all(&project).expect("mkdir failed");

    // First life: one session with a breakpoint and a watch
    let recorder1 = FakeAdapterRecorder::new();
    let manager1 = Arc::new(SessionManager::with_registry(
        RelayConfig::with_data_dir(dir.path()),
        recorder1.registry(),
    ));
    manager1.start().await.expect("start failed");

    let session = manager1.create(SessionConfig::new(&project)).await.expect("create failed");
    session
        .set_breakpoints("/work/app.py", vec![SourceBreakpoint::new(4).condition("i == 5")])
        .await
        .expect("set failed");
    session.add_watch("total");
    let id = session.id();
    drop(session);
    manager1.stop().await;

    // Second life: the session is recoverable with identical configuration
    let recorder2 = FakeAdapterRecorder::new();
    let manager2 = Arc::new(SessionManager::with_registry(
        RelayConfig::with_data_dir(dir.path()),
        recorder2.registry(),
    ));
    manager2.start().await.expect("start failed");

    let recoverable = manager2.list_recoverable().await;
    assert_eq!(recoverable.len(), 1);
    assert_eq!(recoverable[0].id, id);
    assert_eq!(recoverable[0].breakpoints.len(), 1);
    assert_eq!(recoverable[0].watch_expressions.len(), 1);

    let recovered = manager2.recover(id.as_str()).await.expect("recover failed");
    let breakpoints = recovered.breakpoints_snapshot();
    assert_eq!(breakpoints["/work/app.py"][0].line, 4);
    assert_eq!(breakpoints["/work/app.py"][0].condition.as_deref(), Some("i == 5"));
    assert_eq!(recovered.list_watches(), vec!["total"]);
    assert_eq!(recovered.state(), SessionState::Created);

    assert!(manager2.list_recoverable().await.is_empty());
    manager2.stop().await;
}

#[tokio::test]
async fn s6_output_eviction_keeps_newest_lines() {
    let relay = relay_with(FakeBehavior::default(), |config| {
        config.output_buffer_max_bytes = 50;
    });
    let session = relay
        .manager
        .create(SessionConfig::new(relay.dir.path().join("project")))
        .await
        .expect("create failed");
    session
        .launch(LaunchConfig::program("/work/noisy.py"))
        .await
        .expect("launch failed");

    let adapter = relay.recorder.last().expect("no adapter");
    for i in 0..10 {
        adapter.emit_output("stdout", &format!("line-{:04}\n", i)); // 10 bytes
    }

    let page = session.output_page(0, 100, None);
    assert!(page.truncated);
    assert!(session.output_dropped_lines() > 0);
    assert!(page.lines.len() < 10);

    // The surviving line numbers are the highest ones assigned
    let first_kept = page.lines.first().expect("empty page").line_number;
    assert_eq!(first_kept as usize, 10 - page.lines.len() + 1);
    assert_eq!(page.lines.last().expect("empty page").line_number, 10);
}

#[tokio::test]
async fn session_limit_boundary_is_exact() {
    let relay = relay_with(FakeBehavior::default(), |config| {
        config.max_sessions = 3;
    });
    let project = relay.dir.path().join("project");

    let mut sessions = Vec::new();
    for _ in 0..3 {
        sessions.push(
            relay.manager.create(SessionConfig::new(&project)).await.expect("create failed"),
        );
    }

    let err = relay
        .manager
        .create(SessionConfig::new(&project))
        .await
        .expect_err("expected limit");
    assert_eq!(err.code(), "SESSION_LIMIT_REACHED");

    relay
        .manager
        .terminate(sessions[0].id().as_str())
        .await
        .expect("terminate failed");
    relay.manager.create(SessionConfig::new(&project)).await.expect("create after free failed");
}
