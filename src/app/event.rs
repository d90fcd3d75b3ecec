// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Events consumed by [`super::App::update`] and commands it returns.

use std::path::PathBuf;
use std::sync::Arc;

use crossterm::event::KeyEvent;
use tokio_util::sync::CancellationToken;

use crate::queue::{Queue, QueueItem};
use crate::rclone::FileItem;
use crate::transfer::{BatchOutcome, TransferManager};

/// Everything that can change application state.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    /// Result of a remote enumeration.
    RemotesLoaded(Result<Vec<String>, String>),
    /// Result of a directory listing for `remote:path`.
    FilesLoaded {
        remote: String,
        path: String,
        result: Result<Vec<FileItem>, String>,
    },
    /// A background transfer batch returned.
    BatchFinished(BatchOutcome),
    Tick,
    Resize(u16, u16),
}

/// Side effects requested by a transition. The event loop performs them and
/// reports back with further [`AppEvent`]s.
#[derive(Debug)]
pub enum Command {
    LoadRemotes,
    LoadFiles { remote: String, path: String },
    RunTransfers(TransferBatch),
    /// Deliver one [`AppEvent::Tick`] after the configured interval.
    ScheduleTick,
    Quit,
}

/// Everything the orchestrator needs to run a batch in the background.
#[derive(Debug)]
pub struct TransferBatch {
    pub items: Vec<QueueItem>,
    pub manager: Arc<TransferManager>,
    pub queue: Arc<Queue>,
    pub cancel: CancellationToken,
    pub destination: PathBuf,
}
