// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! DAP client: request/response correlation and event dispatch over one
//! framed transport.

use crate::AdapterError;
use parking_lot::Mutex;
use relay_wire::{decode, encode, read_frame, write_frame, DapMessage, DapRequest, DapResponse};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Read half of a DAP transport (TCP socket or child stdout).
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
/// Write half of a DAP transport (TCP socket or child stdin).
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Synchronous callback for raw DAP events: `(event name, body)`.
/// Invoked from the reader task in wire order; it must not block and it must
/// not kill the reader.
pub type RawEventCallback = Arc<dyn Fn(&str, &Value) + Send + Sync>;

struct ClientInner {
    next_seq: Mutex<i64>,
    pending: Mutex<HashMap<i64, oneshot::Sender<DapResponse>>>,
    writer: tokio::sync::Mutex<BoxedWriter>,
    closed: AtomicBool,
    default_timeout: Duration,
    event_callback: Option<RawEventCallback>,
}

/// Client for one DAP conversation.
///
/// Requests are written in issue order; responses are matched by
/// `request_seq`, so each caller sees exactly its own response regardless of
/// completion order. Events are dispatched in the exact order received.
pub struct DapClient {
    inner: Arc<ClientInner>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
}

impl DapClient {
    /// Start the client over a transport and begin the reader loop.
    pub fn start(
        reader: BoxedReader,
        writer: BoxedWriter,
        event_callback: Option<RawEventCallback>,
        default_timeout: Duration,
    ) -> Self {
        let inner = Arc::new(ClientInner {
            next_seq: Mutex::new(0),
            pending: Mutex::new(HashMap::new()),
            writer: tokio::sync::Mutex::new(writer),
            closed: AtomicBool::new(false),
            default_timeout,
            event_callback,
        });

        let task = tokio::spawn(read_loop(Arc::clone(&inner), reader));
        Self { inner, reader_task: Mutex::new(Some(task)) }
    }

    /// Send a request and await its response body.
    ///
    /// A non-success response fails with `DAP_REQUEST_FAILED` carrying the
    /// adapter's message; a timeout retires the seq so a late response is
    /// silently discarded.
    pub async fn send(
        &self,
        command: &str,
        arguments: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, AdapterError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(AdapterError::Connection("DAP client is closed".to_string()));
        }

        let seq = {
            let mut next = self.inner.next_seq.lock();
            *next += 1;
            *next
        };

        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().insert(seq, tx);

        let frame = encode(&DapMessage::Request(DapRequest {
            seq,
            command: command.to_string(),
            arguments,
        }))?;

        {
            let mut writer = self.inner.writer.lock().await;
            if let Err(e) = write_frame(&mut *writer, &frame).await {
                self.inner.pending.lock().remove(&seq);
                return Err(e.into());
            }
        }
        tracing::trace!(command, seq, "dap >>");

        let timeout = timeout.unwrap_or(self.inner.default_timeout);
        match tokio::time::timeout(timeout, rx).await {
            Err(_) => {
                self.inner.pending.lock().remove(&seq);
                Err(AdapterError::Timeout { command: command.to_string(), timeout })
            }
            Ok(Err(_)) => {
                Err(AdapterError::Connection("connection closed before response".to_string()))
            }
            Ok(Ok(response)) => {
                if response.success {
                    Ok(response.body)
                } else {
                    let message = response
                        .message
                        .clone()
                        .unwrap_or_else(|| "unknown error".to_string());
                    let raw = serde_json::to_value(&response).unwrap_or_default();
                    Err(AdapterError::RequestFailed {
                        command: command.to_string(),
                        message,
                        response: raw,
                    })
                }
            }
        }
    }

    /// Stop the client: cancel the reader, fail pending requests to unblock
    /// callers, and close the writer. Idempotent.
    pub async fn stop(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);

        if let Some(task) = self.reader_task.lock().take() {
            task.abort();
        }

        fail_pending(&self.inner);

        use tokio::io::AsyncWriteExt;
        let mut writer = self.inner.writer.lock().await;
        let _ = writer.shutdown().await;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

/// Drop all pending completion slots; receivers observe a closed channel and
/// surface a connection error.
fn fail_pending(inner: &ClientInner) {
    inner.pending.lock().clear();
}

async fn read_loop(inner: Arc<ClientInner>, reader: BoxedReader) {
    let mut reader = BufReader::new(reader);

    loop {
        match read_frame(&mut reader).await {
            Ok(None) => break,
            Ok(Some(body)) => match decode(&body) {
                Ok(DapMessage::Response(response)) => {
                    let slot = inner.pending.lock().remove(&response.request_seq);
                    match slot {
                        Some(tx) => {
                            let _ = tx.send(response);
                        }
                        None => {
                            tracing::trace!(
                                request_seq = response.request_seq,
                                "orphan response dropped"
                            );
                        }
                    }
                }
                Ok(DapMessage::Event(event)) => {
                    tracing::trace!(event = %event.event, "dap <<");
                    if let Some(callback) = &inner.event_callback {
                        callback(&event.event, &event.body);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "fatal DAP stream error");
                    break;
                }
            },
            Err(e) => {
                if !inner.closed.load(Ordering::SeqCst) {
                    tracing::warn!(error = %e, "DAP read failed");
                }
                break;
            }
        }
    }

    inner.closed.store(true, Ordering::SeqCst);
    fail_pending(&inner);
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
