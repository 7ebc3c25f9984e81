// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter subprocess plumbing: port allocation, spawn hygiene, and the
//! dial-back retry loop for server-mode adapters.

use crate::AdapterError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

const DIAL_ATTEMPTS: usize = 10;
const STDERR_TAIL_CHARS: usize = 500;

/// Pick an ephemeral free TCP port on the loopback interface.
pub(crate) fn free_port() -> Result<u16, AdapterError> {
    let listener = std::net::TcpListener::bind(("127.0.0.1", 0))
        .map_err(|e| AdapterError::Connection(format!("failed to allocate a port: {e}")))?;
    let port = listener
        .local_addr()
        .map_err(|e| AdapterError::Connection(format!("failed to read local addr: {e}")))?
        .port();
    Ok(port)
}

/// Spawn a server-mode adapter: stdin at /dev/null, stdout/stderr piped for
/// diagnostics, detached from any controlling terminal.
pub(crate) fn spawn_server(command: &Path, args: &[String]) -> Result<Child, AdapterError> {
    let mut cmd = Command::new(command);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    detach_from_tty(&mut cmd);

    cmd.spawn().map_err(|e| {
        AdapterError::Connection(format!("failed to spawn {}: {e}", command.display()))
    })
}

/// Spawn a stdio-mode adapter and hand back its pipe pair as the transport.
pub(crate) fn spawn_stdio(
    command: &Path,
    args: &[String],
) -> Result<(Child, ChildStdout, ChildStdin), AdapterError> {
    let mut cmd = Command::new(command);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    detach_from_tty(&mut cmd);

    let mut child = cmd.spawn().map_err(|e| {
        AdapterError::Connection(format!("failed to spawn {}: {e}", command.display()))
    })?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AdapterError::Connection("adapter stdout pipe missing".to_string()))?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| AdapterError::Connection("adapter stdin pipe missing".to_string()))?;
    Ok((child, stdout, stdin))
}

/// Dial back to a freshly spawned server-mode adapter with bounded retry.
///
/// A child that exits while we retry will never accept; its stderr tail is
/// surfaced instead of the connect error.
pub(crate) async fn connect_with_retry(
    port: u16,
    child: &mut Child,
    adapter: &str,
) -> Result<TcpStream, AdapterError> {
    let mut last_error = String::new();

    for attempt in 0..DIAL_ATTEMPTS {
        let dial = TcpStream::connect(("127.0.0.1", port));
        match tokio::time::timeout(Duration::from_secs(2), dial).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) => last_error = e.to_string(),
            Err(_) => last_error = "connect timed out".to_string(),
        }

        if let Ok(Some(status)) = child.try_wait() {
            let stderr = stderr_tail(child).await;
            return Err(AdapterError::Connection(format!(
                "{adapter} exited with {status} before accepting connections: {stderr}"
            )));
        }

        tokio::time::sleep(Duration::from_millis(100 * (attempt as u64 + 1))).await;
    }

    Err(AdapterError::Connection(format!(
        "failed to connect to {adapter} on port {port} after {DIAL_ATTEMPTS} attempts: {last_error}"
    )))
}

/// Read up to a capped tail of the child's stderr for error reports.
pub(crate) async fn stderr_tail(child: &mut Child) -> String {
    let Some(mut stderr) = child.stderr.take() else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = tokio::time::timeout(Duration::from_millis(500), stderr.read_to_end(&mut buf)).await;
    String::from_utf8_lossy(&buf).chars().take(STDERR_TAIL_CHARS).collect()
}

/// Stop a child that survived `disconnect`: terminate, wait up to 5 s, kill.
pub(crate) async fn shutdown_child(mut child: Child) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }

    terminate(&mut child);
    if tokio::time::timeout(Duration::from_secs(5), child.wait()).await.is_err() {
        let _ = child.kill().await;
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let _ = child.start_kill();
}

/// Detach the adapter (and everything it execs) from our terminal.
///
/// Debuggees that inherit terminal access can suspend the relay via
/// SIGTTIN/SIGTTOU; the child runs in its own session with those signals
/// ignored.
#[cfg(unix)]
#[allow(unsafe_code)]
fn detach_from_tty(cmd: &mut Command) {
    use nix::sys::signal::{signal, SigHandler, Signal};

    unsafe {
        cmd.pre_exec(|| {
            let _ = nix::unistd::setsid();
            let _ = signal(Signal::SIGTTIN, SigHandler::SigIgn);
            let _ = signal(Signal::SIGTTOU, SigHandler::SigIgn);
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn detach_from_tty(_cmd: &mut Command) {}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
