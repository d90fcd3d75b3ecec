// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transfer record types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Status of a transfer.
///
/// Transitions only move forward: `Pending -> InProgress -> Completed|Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum TransferStatus {
    /// Registered, not yet started
    #[default]
    Pending,
    /// Subprocess running
    InProgress,
    /// Subprocess exited cleanly
    Completed,
    /// Subprocess failed, could not be spawned, or was cancelled
    Failed,
}

impl TransferStatus {
    /// Returns true if the transfer has finished (success or failure).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Completed | TransferStatus::Failed)
    }

    /// Returns true if the transfer still needs attention from the orchestrator.
    pub fn is_active(&self) -> bool {
        matches!(self, TransferStatus::Pending | TransferStatus::InProgress)
    }
}

/// One invocation of the copy tool for a single queued item.
#[derive(Debug, Clone, Serialize)]
pub struct Transfer {
    /// Caller-assigned identifier, unique within a manager
    pub id: String,
    /// `remote:path` source descriptor
    pub source: String,
    /// Local directory the tool copies into
    pub destination: PathBuf,
    pub status: TransferStatus,
    /// Progress percentage (0-100)
    pub progress: f64,
    pub bytes_copied: u64,
    pub bytes_total: u64,
    pub speed: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl Transfer {
    /// Create a pending transfer.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<PathBuf>,
        bytes_total: u64,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            destination: destination.into(),
            status: TransferStatus::Pending,
            progress: 0.0,
            bytes_copied: 0,
            bytes_total,
            speed: String::new(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    /// Wall-clock duration, once started. Running transfers measure up to now.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let start = self.started_at?;
        let end = self.finished_at.unwrap_or_else(Utc::now);
        Some(end - start)
    }
}

/// Counts of transfers by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
}

impl TransferStats {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.failed
    }

    /// True once nothing is pending or running.
    pub fn is_finished(&self) -> bool {
        self.pending == 0 && self.in_progress == 0
    }

    /// `(pending, in_progress, completed, failed)`
    pub fn as_tuple(&self) -> (usize, usize, usize, usize) {
        (self.pending, self.in_progress, self.completed, self.failed)
    }

    pub(crate) fn record(&mut self, status: TransferStatus) {
        match status {
            TransferStatus::Pending => self.pending += 1,
            TransferStatus::InProgress => self.in_progress += 1,
            TransferStatus::Completed => self.completed += 1,
            TransferStatus::Failed => self.failed += 1,
        }
    }
}
