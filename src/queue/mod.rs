// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Download queue.
//!
//! The queue holds the items the user picked in the file browser until a
//! batch is started. It is shared with the transfer orchestrator, which
//! mirrors per-item status into it, so every accessor takes the single
//! container lock and hands back copies rather than live references.
//!
//! Operations are linear scans. Queue sizes are bounded by what a person can
//! select interactively, so this stays cheap.

use std::sync::Mutex;

use crate::locks::resilient_lock;
use crate::rclone::FileItem;

/// Status of a queued item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ItemStatus {
    /// Waiting for the batch to reach it
    #[default]
    Pending,
    /// Being copied
    Downloading,
    /// Copied successfully
    Completed,
    /// Copy failed
    Error,
}

/// A file or directory selected for download.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueItem {
    pub remote: String,
    /// Path relative to the remote root. Unique together with `remote`.
    pub path: String,
    /// Display name (last path component)
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
    pub status: ItemStatus,
    /// Progress percentage (0-100)
    pub progress: f64,
    pub speed: String,
    pub error: Option<String>,
}

impl QueueItem {
    /// Build a pending item from a listing entry.
    pub fn new(remote: impl Into<String>, file: &FileItem) -> Self {
        Self {
            remote: remote.into(),
            path: file.path.clone(),
            name: file.name.clone(),
            size: file.byte_size(),
            is_dir: file.is_dir,
            status: ItemStatus::Pending,
            progress: 0.0,
            speed: String::new(),
            error: None,
        }
    }

    /// The `remote:path` source descriptor for this item.
    pub fn source(&self) -> String {
        crate::rclone::remote_spec(&self.remote, &self.path)
    }
}

/// Thread-safe, insertion-ordered download queue.
#[derive(Debug, Default)]
pub struct Queue {
    items: Mutex<Vec<QueueItem>>,
}

impl Queue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listing entry from `remote`.
    ///
    /// Returns `false` if the (remote, path) pair is already queued, in which
    /// case the queue is left untouched.
    pub fn add(&self, remote: &str, file: &FileItem) -> bool {
        let mut items = resilient_lock(&self.items);
        if items.iter().any(|i| i.remote == remote && i.path == file.path) {
            return false;
        }
        items.push(QueueItem::new(remote, file));
        tracing::debug!(remote = %remote, path = %file.path, "queued item");
        true
    }

    /// Remove the item at `index`. Out-of-range indices are ignored.
    pub fn remove(&self, index: usize) {
        let mut items = resilient_lock(&self.items);
        if index < items.len() {
            items.remove(index);
        }
    }

    /// Snapshot of all items in insertion order.
    pub fn items(&self) -> Vec<QueueItem> {
        resilient_lock(&self.items).clone()
    }

    pub fn len(&self) -> usize {
        resilient_lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        resilient_lock(&self.items).is_empty()
    }

    /// Remove every item.
    pub fn clear(&self) {
        resilient_lock(&self.items).clear();
    }

    /// Record progress for the item at `path` and mark it as downloading.
    pub fn update_progress(&self, path: &str, progress: f64, speed: &str) {
        let mut items = resilient_lock(&self.items);
        if let Some(item) = items.iter_mut().find(|i| i.path == path) {
            item.progress = progress;
            item.speed = speed.to_string();
            item.status = ItemStatus::Downloading;
        }
    }

    /// Set the status (and error) of the item at `path`.
    ///
    /// Completing an item pins its progress to 100.
    pub fn set_status(&self, path: &str, status: ItemStatus, error: Option<String>) {
        let mut items = resilient_lock(&self.items);
        if let Some(item) = items.iter_mut().find(|i| i.path == path) {
            if status == ItemStatus::Completed {
                item.progress = 100.0;
            }
            item.status = status;
            item.error = error;
        }
    }

    /// First pending item in insertion order.
    pub fn next_pending(&self) -> Option<QueueItem> {
        resilient_lock(&self.items)
            .iter()
            .find(|i| i.status == ItemStatus::Pending)
            .cloned()
    }

    pub fn has_pending(&self) -> bool {
        resilient_lock(&self.items)
            .iter()
            .any(|i| i.status == ItemStatus::Pending)
    }

    /// Sum of all item sizes in bytes.
    pub fn total_size(&self) -> u64 {
        resilient_lock(&self.items).iter().map(|i| i.size).sum()
    }

    pub fn contains(&self, remote: &str, path: &str) -> bool {
        resilient_lock(&self.items)
            .iter()
            .any(|i| i.remote == remote && i.path == path)
    }
}
