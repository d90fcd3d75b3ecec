// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Sequential batch driver.
//!
//! Items run one at a time in snapshot order. Each item gets its own copy
//! subprocess whose stderr feeds the progress decoder, which writes into the
//! [`TransferManager`]. A failed item never stops the batch. Cancelling the
//! batch token kills the running subprocess and prevents any further item
//! from starting.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::manager::TransferManager;
use super::progress::forward_progress;
use crate::queue::{ItemStatus, Queue, QueueItem};
use crate::rclone::RcloneClient;

/// Error recorded on the item that was running when the batch was cancelled.
pub const CANCELLED_ERROR: &str = "transfer cancelled";

/// Transfer ID for the item at `index` of a batch snapshot.
pub fn transfer_id(index: usize) -> String {
    format!("transfer_{}", index)
}

/// How one item ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

/// Summary of a finished (or cancelled) batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub completed: usize,
    pub failed: usize,
    /// Items never started because the batch was cancelled first
    pub skipped: usize,
    pub cancelled: bool,
}

/// Drives a snapshot of queue items through the copy tool.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    client: Arc<RcloneClient>,
    manager: Arc<TransferManager>,
    queue: Arc<Queue>,
    destination: PathBuf,
}

impl Orchestrator {
    pub fn new(
        client: Arc<RcloneClient>,
        manager: Arc<TransferManager>,
        queue: Arc<Queue>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            manager,
            queue,
            destination: destination.into(),
        }
    }

    /// Register every item with the manager as a pending transfer.
    ///
    /// Safe to call before [`Orchestrator::run`]; the run re-registers
    /// nothing that already exists.
    pub fn register(&self, items: &[QueueItem]) {
        for (index, item) in items.iter().enumerate() {
            self.manager
                .add(transfer_id(index), item.source(), self.destination.clone(), item.size);
        }
    }

    /// Run the batch to completion or cancellation.
    pub async fn run(&self, items: Vec<QueueItem>, cancel: CancellationToken) -> BatchOutcome {
        self.register(&items);
        tracing::info!(
            items = items.len(),
            destination = %self.destination.display(),
            "starting transfer batch"
        );

        let mut outcome = BatchOutcome::default();
        let total = items.len();

        for (index, item) in items.iter().enumerate() {
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                outcome.skipped = total - index;
                break;
            }

            let id = transfer_id(index);
            match self.copy_one(&id, item, &cancel).await {
                ItemOutcome::Completed => outcome.completed += 1,
                ItemOutcome::Failed(_) => outcome.failed += 1,
                ItemOutcome::Cancelled => {
                    outcome.cancelled = true;
                    outcome.failed += 1;
                    outcome.skipped = total - index - 1;
                    break;
                }
            }
        }

        tracing::info!(
            completed = outcome.completed,
            failed = outcome.failed,
            skipped = outcome.skipped,
            cancelled = outcome.cancelled,
            "transfer batch finished"
        );
        outcome
    }

    async fn copy_one(&self, id: &str, item: &QueueItem, cancel: &CancellationToken) -> ItemOutcome {
        let source = item.source();
        self.manager.start(id);
        self.queue.update_progress(&item.path, 0.0, "");
        tracing::debug!(transfer_id = %id, source = %source, "starting copy");

        let mut child = match self.client.copy_command(&source, &self.destination).spawn() {
            Ok(child) => child,
            Err(e) => {
                let error = format!("failed to start {}: {}", self.client.binary().display(), e);
                return self.record_failure(id, item, error);
            }
        };

        let reader = child.stderr.take().map(|stderr| {
            let manager = Arc::clone(&self.manager);
            let queue = Arc::clone(&self.queue);
            let transfer_id = id.to_string();
            let path = item.path.clone();
            tokio::spawn(async move {
                forward_progress(stderr, |update| {
                    tracing::debug!(
                        transfer_id = %transfer_id,
                        percent = update.percentage,
                        copied = update.bytes_copied,
                        "progress"
                    );
                    manager.update_progress(
                        &transfer_id,
                        update.percentage,
                        update.bytes_copied,
                        update.bytes_total,
                        "",
                    );
                    queue.update_progress(&path, update.percentage, "");
                })
                .await
            })
        });

        tokio::select! {
            status = child.wait() => {
                let detail = match reader {
                    Some(handle) => handle.await.ok().and_then(|r| r.ok()).flatten(),
                    None => None,
                };
                match status {
                    Ok(status) if status.success() => {
                        self.manager.complete(id);
                        self.queue.set_status(&item.path, ItemStatus::Completed, None);
                        tracing::info!(transfer_id = %id, source = %source, "transfer completed");
                        ItemOutcome::Completed
                    }
                    Ok(status) => {
                        let error = match detail {
                            Some(line) => format!("rclone {}: {}", status, line),
                            None => format!("rclone {}", status),
                        };
                        self.record_failure(id, item, error)
                    }
                    Err(e) => self.record_failure(id, item, format!("failed to wait for rclone: {}", e)),
                }
            }
            _ = cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(transfer_id = %id, error = %e, "failed to kill cancelled transfer");
                }
                if let Some(handle) = reader {
                    handle.abort();
                }
                self.manager.fail(id, CANCELLED_ERROR);
                self.queue.set_status(&item.path, ItemStatus::Error, Some(CANCELLED_ERROR.to_string()));
                tracing::warn!(transfer_id = %id, source = %source, "transfer cancelled");
                ItemOutcome::Cancelled
            }
        }
    }

    fn record_failure(&self, id: &str, item: &QueueItem, error: String) -> ItemOutcome {
        tracing::warn!(transfer_id = %id, source = %item.source(), error = %error, "transfer failed");
        self.manager.fail(id, error.clone());
        self.queue.set_status(&item.path, ItemStatus::Error, Some(error.clone()));
        ItemOutcome::Failed(error)
    }
}
