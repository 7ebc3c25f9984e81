// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle state of a debug session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Session exists, debug target not yet launched
    Created,
    /// Launch/attach handshake in progress
    Launching,
    /// Debug target is executing
    Running,
    /// Debug target is stopped (breakpoint, step, pause)
    Paused,
    /// Debug target has ended
    Terminated,
    /// Launch failed or the adapter died
    Failed,
}

crate::simple_display! {
    SessionState {
        Created => "created",
        Launching => "launching",
        Running => "running",
        Paused => "paused",
        Terminated => "terminated",
        Failed => "failed",
    }
}

impl SessionState {
    /// States reachable from this one. Terminal states have no successors.
    pub fn legal_successors(self) -> &'static [SessionState] {
        use SessionState::*;
        match self {
            Created => &[Launching, Failed],
            Launching => &[Running, Paused, Terminated, Failed],
            Running => &[Paused, Terminated, Failed],
            Paused => &[Running, Terminated, Failed],
            Terminated | Failed => &[],
        }
    }

    pub fn can_transition(self, to: SessionState) -> bool {
        self.legal_successors().contains(&to)
    }

    /// Validate a transition against the legal-transition table.
    pub fn check_transition(self, to: SessionState) -> Result<(), IllegalTransition> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(IllegalTransition { from: self, to })
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Terminated | SessionState::Failed)
    }

    /// Parse the lowercase tag used on the wire and in persisted files.
    pub fn parse(s: &str) -> Option<SessionState> {
        use SessionState::*;
        match s {
            "created" => Some(Created),
            "launching" => Some(Launching),
            "running" => Some(Running),
            "paused" => Some(Paused),
            "terminated" => Some(Terminated),
            "failed" => Some(Failed),
            _ => None,
        }
    }
}

/// Attempted transition not present in the legal-transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal session state transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: SessionState,
    pub to: SessionState,
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
