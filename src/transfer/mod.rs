// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transfer tracking and execution.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐
//! │ Orchestrator    │────▶│ rclone copy     │
//! │ (tokio task)    │     │ (subprocess)    │
//! └────────┬────────┘     └────────┬────────┘
//!          │                       │ stderr
//!          ▼                       ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ TransferManager │◀────│ progress        │
//! │ (registry)      │     │ decoder         │
//! └────────┬────────┘     └─────────────────┘
//!          │ stats() / get_all()
//!          ▼
//!     event loop (UI tick)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rfetch::queue::Queue;
//! use rfetch::rclone::{FileItem, RcloneClient};
//! use rfetch::transfer::{Orchestrator, TransferManager};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let queue = Arc::new(Queue::new());
//! queue.add("gdrive", &FileItem::file("report.pdf", "docs/report.pdf", 4096));
//!
//! let manager = Arc::new(TransferManager::new());
//! let orchestrator = Orchestrator::new(
//!     Arc::new(RcloneClient::default()),
//!     Arc::clone(&manager),
//!     Arc::clone(&queue),
//!     "/tmp/downloads",
//! );
//!
//! let outcome = orchestrator.run(queue.items(), CancellationToken::new()).await;
//! println!("{} completed, {:?}", outcome.completed, manager.stats());
//! # }
//! ```

pub mod manager;
pub mod orchestrator;
pub mod progress;
pub mod types;

pub use manager::TransferManager;
pub use orchestrator::{transfer_id, BatchOutcome, Orchestrator, CANCELLED_ERROR};
pub use progress::{forward_progress, parse_progress_line, parse_size, split_lines, LineSplitter, ProgressUpdate};
pub use types::{Transfer, TransferStats, TransferStatus};
