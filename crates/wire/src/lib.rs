// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framed DAP transport.
//!
//! Wire format: `Content-Length: <N>\r\n\r\n` followed by N bytes of UTF-8
//! JSON. Headers other than `Content-Length` are ignored.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod framing;
mod message;

pub use framing::{read_frame, write_frame};
pub use message::{decode, encode, DapEvent, DapMessage, DapRequest, DapResponse};

use thiserror::Error;

/// Errors from the framed transport.
///
/// Everything except a clean EOF is fatal for the owning stream: the caller
/// must fail its pending requests and mark the transport closed.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream closed mid-message")]
    UnexpectedEof,

    #[error("invalid Content-Length header: {0}")]
    InvalidLength(String),

    #[error("message headers missing Content-Length")]
    MissingLength,

    #[error("message body is not valid UTF-8")]
    InvalidUtf8,

    #[error("message body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
