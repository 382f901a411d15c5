//! Host-facing interface: progress reporting and result delivery.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::models::Entry;

/// Severity of a message shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Receives status and progress updates from a running search
pub trait ProgressSink: Send + Sync {
    /// Replace the current status line
    fn set_status(&self, status: &str);

    /// Report that entry `current` of `total` is being delivered
    fn set_progress(&self, current: usize, total: usize);

    /// Show a message the user should read
    fn show_message(&self, message: &str, severity: Severity);
}

/// Receives the entries of a successful search
pub trait ResultSink: Send + Sync {
    fn add_entry(&self, entry: Entry);
}

/// A host that records everything it is told.
///
/// Handy for tests and for callers that want the results as plain values.
#[derive(Debug, Default)]
pub struct RecordingHost {
    statuses: Mutex<Vec<String>>,
    progress: Mutex<Vec<(usize, usize)>>,
    messages: Mutex<Vec<(String, Severity)>>,
    entries: Mutex<Vec<Entry>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn progress(&self) -> Vec<(usize, usize)> {
        self.progress.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressSink for RecordingHost {
    fn set_status(&self, status: &str) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push(status.to_string());
        }
    }

    fn set_progress(&self, current: usize, total: usize) {
        if let Ok(mut progress) = self.progress.lock() {
            progress.push((current, total));
        }
    }

    fn show_message(&self, message: &str, severity: Severity) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((message.to_string(), severity));
        }
    }
}

impl ResultSink for RecordingHost {
    fn add_entry(&self, entry: Entry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}
