// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debug event types fanned out to session event queues.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Typed discriminant of a debug event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Stopped,
    Continued,
    Terminated,
    Exited,
    Output,
    Breakpoint,
    Thread,
    Module,
}

crate::simple_display! {
    EventType {
        Stopped => "stopped",
        Continued => "continued",
        Terminated => "terminated",
        Exited => "exited",
        Output => "output",
        Breakpoint => "breakpoint",
        Thread => "thread",
        Module => "module",
    }
}

impl EventType {
    /// Map a DAP event name onto the relay's event discriminant.
    ///
    /// Returns `None` for events the relay does not fan out (`initialized`,
    /// `process`, adapter-specific extensions).
    pub fn from_dap(event: &str) -> Option<EventType> {
        use EventType::*;
        match event {
            "stopped" => Some(Stopped),
            "continued" => Some(Continued),
            "terminated" => Some(Terminated),
            "exited" => Some(Exited),
            "output" => Some(Output),
            "breakpoint" => Some(Breakpoint),
            "thread" => Some(Thread),
            "module" => Some(Module),
            _ => None,
        }
    }
}

/// A debug event as delivered to pull-based consumers.
///
/// `data` is the opaque DAP event body; the relay does not interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl DebugEvent {
    pub fn new(event_type: EventType, data: serde_json::Value) -> Self {
        Self { event_type, timestamp: Utc::now(), data }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
