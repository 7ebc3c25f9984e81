// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte-budgeted ring buffer for captured debuggee output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Single captured output line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputLine {
    /// Monotone per-session line number, starting at 1. Never reused, even
    /// after eviction, so clients can page forward losslessly.
    pub line_number: u64,
    /// DAP output category: "stdout", "stderr", "console", "telemetry", ...
    pub category: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Paginated output response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPage {
    pub lines: Vec<OutputLine>,
    pub offset: usize,
    pub limit: usize,
    /// Total entries matching the filter, before slicing
    pub total: usize,
    pub has_more: bool,
    /// Sticky: true once any entry has been evicted for the byte budget
    pub truncated: bool,
}

/// FIFO of output lines bounded by a byte budget.
///
/// Appending past the budget evicts from the front. A single entry larger
/// than the whole budget drains the FIFO and is stored alone, transiently
/// exceeding the budget; the most recent output is never dropped.
#[derive(Debug)]
pub struct OutputBuffer {
    max_bytes: usize,
    entries: VecDeque<OutputLine>,
    current_bytes: usize,
    dropped: u64,
    line_counter: u64,
}

impl OutputBuffer {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            entries: VecDeque::new(),
            current_bytes: 0,
            dropped: 0,
            line_counter: 0,
        }
    }

    /// Append a line, evicting from the front until it fits.
    pub fn append(&mut self, category: &str, content: &str) {
        let entry_bytes = content.len();

        while self.current_bytes + entry_bytes > self.max_bytes && !self.entries.is_empty() {
            if let Some(evicted) = self.entries.pop_front() {
                self.current_bytes -= evicted.content.len();
                self.dropped += 1;
            }
        }

        self.line_counter += 1;
        self.entries.push_back(OutputLine {
            line_number: self.line_counter,
            category: category.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        });
        self.current_bytes += entry_bytes;
    }

    /// Page through buffered output, optionally filtered by category.
    pub fn get_page(&self, offset: usize, limit: usize, category: Option<&str>) -> OutputPage {
        let matches = |e: &OutputLine| category.is_none_or(|c| e.category == c);
        let total = self.entries.iter().filter(|e| matches(e)).count();
        let lines: Vec<OutputLine> = self
            .entries
            .iter()
            .filter(|e| matches(e))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        OutputPage {
            lines,
            offset,
            limit,
            total,
            has_more: offset + limit < total,
            truncated: self.dropped > 0,
        }
    }

    /// Entries with `line_number` greater than the given cursor, at most `limit`.
    pub fn get_since(&self, line_number: u64, limit: usize) -> OutputPage {
        let total = self.entries.iter().filter(|e| e.line_number > line_number).count();
        let lines: Vec<OutputLine> = self
            .entries
            .iter()
            .filter(|e| e.line_number > line_number)
            .take(limit)
            .cloned()
            .collect();

        OutputPage {
            lines,
            offset: 0,
            limit,
            total,
            has_more: total > limit,
            truncated: self.dropped > 0,
        }
    }

    /// Drop everything, including the line counter and truncation marker.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_bytes = 0;
        self.dropped = 0;
        self.line_counter = 0;
    }

    /// Current buffer size in bytes.
    pub fn size(&self) -> usize {
        self.current_bytes
    }

    /// Lines currently held.
    pub fn total_lines(&self) -> usize {
        self.entries.len()
    }

    /// Lines evicted for the byte budget.
    pub fn dropped_lines(&self) -> u64 {
        self.dropped
    }

    /// Line number of the most recent entry (cursor for `get_since`).
    pub fn last_line_number(&self) -> u64 {
        self.line_counter
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
