// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core domain types for the debug relay: session identifiers and state
//! machine, DAP passthrough shapes, breakpoints, debug events, launch
//! configuration, and the byte-budgeted output ring.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod breakpoint;
pub mod dap;
pub mod event;
pub mod id;
pub mod launch;
mod macros;
pub mod output;
pub mod session;
pub mod state;

pub use breakpoint::SourceBreakpoint;
pub use dap::{BreakpointVerdict, Scope, Source, StackFrame, Thread, Variable};
pub use event::{DebugEvent, EventType};
pub use launch::{AttachConfig, LaunchConfig};
pub use output::{OutputBuffer, OutputLine, OutputPage};
pub use session::SessionId;
pub use state::{IllegalTransition, SessionState};
