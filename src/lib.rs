// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! rfetch - browse rclone remotes and download in batches
//!
//! Pick a remote, walk its directories, select files and folders into a
//! queue, then run the queue as a sequential batch of `rclone copy` calls
//! with live progress.
//!
//! **Browse** -> **Queue** -> **Transfer**
//!
//! # Core Modules
//!
//! - [`app`] - State machine: screens, key handling, events and commands
//! - [`queue`] - Download queue shared with the transfer batch
//! - [`transfer`] - Transfer registry, progress decoding and batch orchestration
//! - [`rclone`] - Subprocess adapter for listing and copying
//! - [`ui`] - Terminal driver and rendering
//! - [`config`] - On-disk config and runtime settings
//! - [`error`] - User-facing error formatting

pub mod app;
pub mod config;
pub mod error;
pub mod locks;
pub mod queue;
pub mod rclone;
pub mod transfer;
pub mod ui;
pub mod utils;

pub use app::{App, AppEvent, Command, Screen};
pub use config::{Config, Settings};
pub use queue::{ItemStatus, Queue, QueueItem};
pub use rclone::{FileItem, RcloneClient};
pub use transfer::{
    parse_progress_line, BatchOutcome, Orchestrator, Transfer, TransferManager, TransferStats,
    TransferStatus,
};
