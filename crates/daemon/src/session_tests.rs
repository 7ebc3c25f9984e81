// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_adapters::{FakeAdapterRecorder, FakeBehavior, FakeDebugAdapter};
use serde_json::json;

async fn fake_session(behavior: FakeBehavior) -> (Arc<Session>, Arc<FakeDebugAdapter>) {
    let recorder = FakeAdapterRecorder::with_behavior(behavior);
    let registry = recorder.registry();
    let session = Arc::new(Session::new(
        SessionId::new(),
        &SessionConfig::new("/work/project"),
        60,
        1024 * 1024,
    ));
    session
        .init_adapter(&registry, AdapterSettings::default())
        .await
        .expect("adapter init failed");
    let adapter = recorder.last().expect("no adapter constructed");
    (session, adapter)
}

#[tokio::test]
async fn new_session_starts_created_with_derived_name() {
    let session = Session::new(
        SessionId::from_string("sess-abcdef1234"),
        &SessionConfig::new("/work/project"),
        60,
        1024,
    );
    assert_eq!(session.state(), SessionState::Created);
    assert_eq!(session.name(), "session-abcdef12");
    assert_eq!(session.language(), "python");
    assert_eq!(session.timeout_minutes(), 60);
}

#[tokio::test]
async fn explicit_name_and_timeout_win() {
    let config = SessionConfig::new("/work").name("my-debug").timeout_minutes(5);
    let session = Session::new(SessionId::new(), &config, 60, 1024);
    assert_eq!(session.name(), "my-debug");
    assert_eq!(session.timeout_minutes(), 5);
}

#[tokio::test]
async fn breakpoints_before_launch_are_pending() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;

    let verdicts = session
        .set_breakpoints("/work/app.py", vec![SourceBreakpoint::new(4)])
        .await
        .expect("set failed");
    assert_eq!(verdicts.len(), 1);
    assert!(!verdicts[0].verified);
    assert_eq!(verdicts[0].message.as_deref(), Some("Pending launch"));

    // Not forwarded: the adapter is not launched yet
    assert!(adapter.breakpoints_for("/work/app.py").is_empty());
}

#[tokio::test]
async fn launch_declares_breakpoints_during_configuration_phase() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;

    session
        .set_breakpoints("/work/app.py", vec![SourceBreakpoint::new(4)])
        .await
        .expect("set failed");
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");

    assert_eq!(session.state(), SessionState::Running);
    let calls = adapter.calls();
    assert!(calls.contains(&"launch".to_string()));
    assert!(calls.contains(&"setBreakpoints:/work/app.py".to_string()));
    assert!(calls.contains(&"setExceptionBreakpoints:uncaught".to_string()));
    assert_eq!(adapter.breakpoints_for("/work/app.py").len(), 1);
}

#[tokio::test]
async fn launch_without_exception_filter_when_disabled() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;

    let config = LaunchConfig::program("/work/app.py").stop_on_exception(false);
    session.launch(config).await.expect("launch failed");

    assert!(!adapter.calls().iter().any(|c| c.starts_with("setExceptionBreakpoints")));
}

#[tokio::test]
async fn launch_requires_created_state() {
    let (session, _adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");

    let err = session
        .launch(LaunchConfig::program("/work/app.py"))
        .await
        .expect_err("expected failure");
    assert_eq!(err.code(), "INVALID_SESSION_STATE");
    assert!(err.to_string().contains("running"));
    assert!(err.to_string().contains("created"));
}

#[tokio::test]
async fn failed_launch_transitions_to_failed_and_reraises() {
    let behavior = FakeBehavior {
        fail_launch: Some("debuggee not found".to_string()),
        ..FakeBehavior::default()
    };
    let (session, _adapter) = fake_session(behavior).await;

    let err = session
        .launch(LaunchConfig::program("/missing"))
        .await
        .expect_err("expected failure");
    assert_eq!(err.code(), "LAUNCH_FAILED");
    assert!(err.to_string().contains("debuggee not found"));
    assert_eq!(session.state(), SessionState::Failed);
}

#[tokio::test]
async fn breakpoint_hit_during_handshake_leaves_session_paused() {
    let behavior = FakeBehavior { stop_on_launch: true, ..FakeBehavior::default() };
    let (session, _adapter) = fake_session(behavior).await;

    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");
    assert_eq!(session.state(), SessionState::Paused);
    assert_eq!(session.stop_reason().as_deref(), Some("breakpoint"));
    assert_eq!(session.current_thread_id(), Some(1));
}

#[tokio::test]
async fn attach_reaches_running() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.attach(AttachConfig::port(5678)).await.expect("attach failed");

    assert_eq!(session.state(), SessionState::Running);
    assert!(adapter.calls().contains(&"attach".to_string()));
}

#[tokio::test]
async fn stopped_event_records_thread_and_reason() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");

    adapter.emit_stopped(7, "step");
    assert_eq!(session.state(), SessionState::Paused);
    assert_eq!(session.current_thread_id(), Some(7));
    assert_eq!(session.stop_reason().as_deref(), Some("step"));

    // A duplicate stopped event must be swallowed, not kill anything
    adapter.emit_stopped(7, "step");
    assert_eq!(session.state(), SessionState::Paused);
}

#[tokio::test]
async fn terminated_event_is_terminal() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");

    adapter.emit_terminated();
    assert_eq!(session.state(), SessionState::Terminated);

    // Exited after terminated is swallowed
    adapter.emit(EventType::Exited, json!({"exitCode": 0}));
    assert_eq!(session.state(), SessionState::Terminated);
}

#[tokio::test]
async fn continue_clears_stop_state_and_runs() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");
    adapter.emit_stopped(3, "breakpoint");

    session.continue_execution(None).await.expect("continue failed");
    assert_eq!(session.state(), SessionState::Running);
    assert!(session.stop_reason().is_none());
    assert!(adapter.calls().contains(&"continue:3".to_string()));
}

#[tokio::test]
async fn continue_requires_paused() {
    let (session, _adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");

    let err = session.continue_execution(None).await.expect_err("expected failure");
    assert_eq!(err.code(), "INVALID_SESSION_STATE");
}

#[tokio::test]
async fn pause_issues_request_without_state_change() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");

    session.pause(None).await.expect("pause failed");
    assert_eq!(session.state(), SessionState::Running);
    assert!(adapter.calls().contains(&"pause:1".to_string()));

    // The subsequent stopped event is what changes the state
    adapter.emit_stopped(1, "pause");
    assert_eq!(session.state(), SessionState::Paused);
}

#[yare::parameterized(
    step_over = { "next" },
    step_into = { "stepIn" },
    step_out  = { "stepOut" },
)]
fn steps_require_paused_and_run(command: &str) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime failed");
    runtime.block_on(async {
        let (session, adapter) = fake_session(FakeBehavior::default()).await;
        session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");
        adapter.emit_stopped(2, "breakpoint");

        let result = match command {
            "next" => session.step_over(None).await,
            "stepIn" => session.step_into(None).await,
            _ => session.step_out(None).await,
        };
        result.expect("step failed");

        assert_eq!(session.state(), SessionState::Running);
        assert!(adapter.calls().contains(&format!("{command}:2")));

        // And from RUNNING the same step is illegal
        let err = match command {
            "next" => session.step_over(None).await,
            "stepIn" => session.step_into(None).await,
            _ => session.step_out(None).await,
        }
        .expect_err("expected failure");
        assert_eq!(err.code(), "INVALID_SESSION_STATE");
    });
}

#[tokio::test]
async fn breakpoints_after_launch_are_forwarded_and_verified() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");

    let verdicts = session
        .set_breakpoints("/work/app.py", vec![SourceBreakpoint::new(9).condition("i == 5")])
        .await
        .expect("set failed");
    assert_eq!(verdicts.len(), 1);
    assert!(verdicts[0].verified);
    assert_eq!(verdicts[0].line, Some(9));
    assert_eq!(adapter.breakpoints_for("/work/app.py")[0].condition.as_deref(), Some("i == 5"));
}

#[tokio::test]
async fn setting_same_breakpoints_twice_yields_same_verdicts() {
    let (session, _adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");

    let bps = vec![SourceBreakpoint::new(4), SourceBreakpoint::new(9)];
    let first = session.set_breakpoints("/work/app.py", bps.clone()).await.expect("set failed");
    let second = session.set_breakpoints("/work/app.py", bps).await.expect("set failed");
    assert_eq!(first, second);
}

#[tokio::test]
async fn inspection_ops_use_the_adapter_when_paused() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");
    adapter.emit_stopped(1, "breakpoint");

    let threads = session.threads().await.expect("threads failed");
    assert_eq!(threads[0].name, "MainThread");

    let frames = session.stack_trace(None, 0, 20).await.expect("stack trace failed");
    assert_eq!(frames[0].name, "greet");

    let scopes = session.scopes(frames[0].id).await.expect("scopes failed");
    assert_eq!(scopes[0].variables_reference, 1001);

    let variables =
        session.variables(scopes[0].variables_reference, 0, 100).await.expect("variables failed");
    assert_eq!(variables[0].name, "name");

    let result = session.evaluate("name.upper()", Some(frames[0].id), "repl").await
        .expect("evaluate failed");
    assert_eq!(result["result"], "<name.upper()>");
}

#[tokio::test]
async fn inspection_is_gated_to_running_or_paused() {
    let (session, _adapter) = fake_session(FakeBehavior::default()).await;

    let err = session.threads().await.expect_err("expected failure");
    assert_eq!(err.code(), "INVALID_SESSION_STATE");

    let err = session.evaluate("x", None, "repl").await.expect_err("expected failure");
    assert_eq!(err.code(), "INVALID_SESSION_STATE");
}

#[tokio::test]
async fn adding_a_duplicate_watch_is_a_no_op() {
    let (session, _adapter) = fake_session(FakeBehavior::default()).await;

    assert_eq!(session.add_watch("total"), vec!["total"]);
    assert_eq!(session.add_watch("len(items)"), vec!["total", "len(items)"]);
    assert_eq!(session.add_watch("total"), vec!["total", "len(items)"]);

    assert_eq!(session.remove_watch("total"), vec!["len(items)"]);
    assert_eq!(session.remove_watch("total"), vec!["len(items)"]);

    session.clear_watches();
    assert!(session.list_watches().is_empty());
}

#[tokio::test]
async fn evaluate_watches_is_empty_unless_paused() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.add_watch("total");

    assert!(session.evaluate_watches(None).await.is_empty());

    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");
    assert!(session.evaluate_watches(None).await.is_empty());

    adapter.emit_stopped(1, "breakpoint");
    let results = session.evaluate_watches(None).await;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].expression, "total");
    assert!(results[0].error.is_none());
}

#[tokio::test]
async fn watch_failures_are_captured_not_raised() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.add_watch("good");
    session.add_watch("broken");
    adapter.script_evaluation(
        "good",
        json!({"result": "42", "type": "int", "variablesReference": 0}),
    );
    adapter.script_evaluation_failure("broken", "name 'broken' is not defined");

    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");
    adapter.emit_stopped(1, "breakpoint");

    let results = session.evaluate_watches(None).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].result.as_deref(), Some("42"));
    assert_eq!(results[0].ty.as_deref(), Some("int"));
    assert!(results[1].error.as_deref().is_some_and(|e| e.contains("not defined")));
    assert!(results[1].result.is_none());
}

#[tokio::test]
async fn output_events_land_in_ring_and_queue() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");

    adapter.emit_output("stdout", "Hello, World!\n");
    adapter.emit_output("stderr", "warning\n");

    let page = session.output_page(0, 10, None);
    assert_eq!(page.lines.len(), 2);
    assert_eq!(page.lines[0].content, "Hello, World!\n");

    let stderr_only = session.output_page(0, 10, Some("stderr"));
    assert_eq!(stderr_only.lines.len(), 1);

    let events = session.get_events(None).await;
    assert_eq!(events.iter().filter(|e| e.event_type == EventType::Output).count(), 2);
}

#[tokio::test]
async fn persisted_round_trip_preserves_configuration() {
    let (session, _adapter) = fake_session(FakeBehavior::default()).await;
    session
        .set_breakpoints(
            "/work/app.py",
            vec![SourceBreakpoint::new(4), SourceBreakpoint::new(9).condition("i == 5")],
        )
        .await
        .expect("set failed");
    session.add_watch("total");
    session.add_watch("len(items)");

    let persisted = session.to_persisted(true);
    assert!(persisted.server_shutdown);
    assert_eq!(persisted.state, "created");

    let restored = Session::from_persisted(&persisted, 60, 1024 * 1024);
    assert_eq!(restored.id(), session.id());
    assert_eq!(restored.name(), session.name());
    assert_eq!(restored.project_root(), session.project_root());
    assert_eq!(restored.language(), session.language());
    assert_eq!(restored.breakpoints_snapshot(), session.breakpoints_snapshot());
    assert_eq!(restored.list_watches(), session.list_watches());
    assert_eq!(restored.state(), SessionState::Created);
}

#[tokio::test]
async fn to_info_reflects_debug_state() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");
    adapter.emit_stopped(2, "breakpoint");

    let info = session.to_info();
    assert_eq!(info.id, session.id());
    assert_eq!(info.state, SessionState::Paused);
    assert_eq!(info.current_thread_id, Some(2));
    assert_eq!(info.stop_reason.as_deref(), Some("breakpoint"));
    assert_eq!(info.project_root, "/work/project");
}

#[tokio::test]
async fn cleanup_disconnects_once_and_clears_buffers() {
    let (session, adapter) = fake_session(FakeBehavior::default()).await;
    session.launch(LaunchConfig::program("/work/app.py")).await.expect("launch failed");
    adapter.emit_output("stdout", "x");

    session.cleanup().await;
    assert_eq!(adapter.disconnect_count(), 1);
    assert_eq!(session.output_page(0, 10, None).lines.len(), 0);
    assert!(session.get_events(None).await.is_empty());

    // Second cleanup is a no-op: the adapter was already taken
    session.cleanup().await;
    assert_eq!(adapter.disconnect_count(), 1);
}
