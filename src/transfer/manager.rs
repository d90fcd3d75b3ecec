// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Registry of in-flight and finished transfers.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use indexmap::IndexMap;

use super::types::{Transfer, TransferStats, TransferStatus};
use crate::locks::{resilient_lock, resilient_read, resilient_write};

type Entry = Arc<Mutex<Transfer>>;

/// Thread-safe transfer registry.
///
/// The map itself sits behind one `RwLock` that is only held long enough to
/// insert or look up an entry. Each entry carries its own `Mutex`, so the
/// progress reader of one subprocess and the UI polling `stats()` never lose
/// each other's updates, and unrelated transfers do not contend.
///
/// Operations on an unknown ID are silent no-ops. A progress stream can
/// outlive the batch that owned it during shutdown and that must not panic.
#[derive(Debug, Default)]
pub struct TransferManager {
    transfers: RwLock<IndexMap<String, Entry>>,
}

impl TransferManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending transfer. Re-registering an existing ID is ignored.
    pub fn add(
        &self,
        id: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<PathBuf>,
        total_bytes: u64,
    ) {
        let id = id.into();
        let mut transfers = resilient_write(&self.transfers);
        if transfers.contains_key(&id) {
            tracing::debug!(transfer_id = %id, "transfer already registered");
            return;
        }
        let transfer = Transfer::new(id.clone(), source, destination, total_bytes);
        transfers.insert(id, Arc::new(Mutex::new(transfer)));
    }

    fn entry(&self, id: &str) -> Option<Entry> {
        resilient_read(&self.transfers).get(id).cloned()
    }

    /// Mark a pending transfer as started.
    pub fn start(&self, id: &str) {
        if let Some(entry) = self.entry(id) {
            let mut t = resilient_lock(&entry);
            if t.status == TransferStatus::Pending {
                t.status = TransferStatus::InProgress;
                t.started_at = Some(Utc::now());
            }
        }
    }

    /// Update the live fields of a running transfer.
    ///
    /// `bytes_total` only replaces the known total when it is positive.
    pub fn update_progress(
        &self,
        id: &str,
        progress: f64,
        bytes_copied: u64,
        bytes_total: u64,
        speed: &str,
    ) {
        let Some(entry) = self.entry(id) else {
            return;
        };
        let mut t = resilient_lock(&entry);
        if t.status != TransferStatus::InProgress {
            return;
        }
        t.progress = progress.clamp(0.0, 100.0);
        t.bytes_copied = bytes_copied;
        if bytes_total > 0 {
            t.bytes_total = bytes_total;
        }
        t.speed = speed.to_string();
    }

    /// Mark a transfer as completed.
    pub fn complete(&self, id: &str) {
        if let Some(entry) = self.entry(id) {
            let mut t = resilient_lock(&entry);
            if t.status.is_terminal() {
                return;
            }
            t.status = TransferStatus::Completed;
            t.progress = 100.0;
            t.finished_at = Some(Utc::now());
        }
    }

    /// Mark a transfer as failed with the given error.
    pub fn fail(&self, id: &str, error: impl Into<String>) {
        if let Some(entry) = self.entry(id) {
            let mut t = resilient_lock(&entry);
            if t.status.is_terminal() {
                return;
            }
            t.status = TransferStatus::Failed;
            t.error = Some(error.into());
            t.finished_at = Some(Utc::now());
        }
    }

    /// Snapshot of one transfer.
    pub fn get(&self, id: &str) -> Option<Transfer> {
        self.entry(id).map(|entry| resilient_lock(&entry).clone())
    }

    /// Snapshot of every transfer, in registration order.
    pub fn get_all(&self) -> Vec<Transfer> {
        let entries: Vec<Entry> = resilient_read(&self.transfers).values().cloned().collect();
        entries
            .iter()
            .map(|entry| resilient_lock(entry).clone())
            .collect()
    }

    /// Count transfers by status.
    pub fn stats(&self) -> TransferStats {
        let transfers = resilient_read(&self.transfers);
        let mut stats = TransferStats::default();
        for entry in transfers.values() {
            stats.record(resilient_lock(entry).status);
        }
        stats
    }

    pub fn len(&self) -> usize {
        resilient_read(&self.transfers).len()
    }

    pub fn is_empty(&self) -> bool {
        resilient_read(&self.transfers).is_empty()
    }
}
