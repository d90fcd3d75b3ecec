// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Race Detection Tests for rfetch
//!
//! The queue and the transfer registry are written by background transfer
//! tasks while the UI reads them on every tick. These tests hammer both from
//! many tasks at once. They are also meant to be run under ThreadSanitizer.
//!
//! # Running with ThreadSanitizer
//!
//! ```bash
//! RUSTFLAGS="-Z sanitizer=thread" cargo +nightly test --target x86_64-unknown-linux-gnu --test race_detection_test
//! ```

use std::sync::Arc;
use std::time::Duration;

use rfetch::queue::{ItemStatus, Queue};
use rfetch::rclone::FileItem;
use rfetch::transfer::{TransferManager, TransferStatus};
use tokio::time::timeout;

// Test configuration
const CONCURRENCY_LEVEL: usize = 50;
const ITERATIONS_PER_TASK: usize = 50;
const TEST_TIMEOUT_SECS: u64 = 30;

async fn join_all(handles: Vec<tokio::task::JoinHandle<()>>) {
    let result = timeout(Duration::from_secs(TEST_TIMEOUT_SECS), async {
        for handle in handles {
            handle.await.expect("Task panicked");
        }
    })
    .await;
    assert!(result.is_ok(), "Test timed out");
}

// =============================================================================
// TRANSFER MANAGER
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_manager_progress_writers_and_stats_readers() {
    let manager = Arc::new(TransferManager::new());
    for i in 0..CONCURRENCY_LEVEL {
        manager.add(format!("transfer_{}", i), format!("remote:file{}", i), "/tmp", 1000);
    }

    let mut handles = vec![];

    // One writer per transfer, like one progress reader per subprocess
    for i in 0..CONCURRENCY_LEVEL {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            let id = format!("transfer_{}", i);
            manager.start(&id);
            for j in 0..ITERATIONS_PER_TASK {
                let pct = (j * 100 / ITERATIONS_PER_TASK) as f64;
                manager.update_progress(&id, pct, (j * 20) as u64, 1000, "");
                tokio::task::yield_now().await;
            }
            if i % 5 == 0 {
                manager.fail(&id, "simulated failure");
            } else {
                manager.complete(&id);
            }
        }));
    }

    // UI-style readers
    for _ in 0..4 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..ITERATIONS_PER_TASK {
                let stats = manager.stats();
                assert_eq!(stats.total(), CONCURRENCY_LEVEL, "stats must always sum to the total");
                let all = manager.get_all();
                assert_eq!(all.len(), CONCURRENCY_LEVEL);
                for t in &all {
                    assert!((0.0..=100.0).contains(&t.progress));
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    join_all(handles).await;

    let stats = manager.stats();
    assert_eq!(stats.as_tuple(), (0, 0, 40, 10));
    assert!(manager
        .get_all()
        .iter()
        .filter(|t| t.status == TransferStatus::Completed)
        .all(|t| t.progress == 100.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_manager_concurrent_duplicate_adds() {
    let manager = Arc::new(TransferManager::new());
    let mut handles = vec![];

    for i in 0..CONCURRENCY_LEVEL {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            for j in 0..ITERATIONS_PER_TASK {
                manager.add(format!("transfer_{}", j % 10), format!("remote:{}", i), "/tmp", 1);
            }
        }));
    }

    join_all(handles).await;
    assert_eq!(manager.len(), 10);
    assert_eq!(manager.stats().pending, 10);
}

// =============================================================================
// QUEUE
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queue_concurrent_adds_are_deduplicated() {
    let queue = Arc::new(Queue::new());
    let mut handles = vec![];

    for _ in 0..CONCURRENCY_LEVEL {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move {
            for j in 0..ITERATIONS_PER_TASK {
                let name = format!("file{}.bin", j % 20);
                queue.add("gdrive", &FileItem::file(name.clone(), name, 10));
            }
        }));
    }

    join_all(handles).await;
    assert_eq!(queue.len(), 20);
    assert_eq!(queue.total_size(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queue_status_writers_and_snapshot_readers() {
    let queue = Arc::new(Queue::new());
    for i in 0..CONCURRENCY_LEVEL {
        let name = format!("file{}", i);
        queue.add("gdrive", &FileItem::file(name.clone(), name, 1));
    }

    let mut handles = vec![];
    for i in 0..CONCURRENCY_LEVEL {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move {
            let path = format!("file{}", i);
            for j in 0..ITERATIONS_PER_TASK {
                queue.update_progress(&path, j as f64, "");
            }
            queue.set_status(&path, ItemStatus::Completed, None);
        }));
    }
    for _ in 0..4 {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..ITERATIONS_PER_TASK {
                assert_eq!(queue.items().len(), CONCURRENCY_LEVEL);
                let _ = queue.has_pending();
                tokio::task::yield_now().await;
            }
        }));
    }

    join_all(handles).await;
    assert!(!queue.has_pending());
    assert!(queue
        .items()
        .iter()
        .all(|i| i.status == ItemStatus::Completed && i.progress == 100.0));
}
