// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Poison-tolerant lock helpers.
//!
//! The queue and the transfer registry are shared between the event loop and
//! background tasks. If one of those tasks panics while holding a lock the
//! lock becomes poisoned; rather than taking the whole session down with it,
//! these helpers log the event and hand back the guard anyway. A stale
//! progress percentage is preferable to a crashed terminal left in raw mode.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::{Mutex, RwLock};
//! use rfetch::locks::{resilient_lock, resilient_read, resilient_write};
//!
//! let registry = RwLock::new(vec![1, 2, 3]);
//! assert_eq!(resilient_read(&registry).len(), 3);
//! resilient_write(&registry).push(4);
//!
//! let entry = Mutex::new(0u64);
//! *resilient_lock(&entry) += 1;
//! ```

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquire a read lock, recovering from poisoning if necessary.
#[inline]
pub fn resilient_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "rfetch::locks",
                event = "LOCK_POISONED_READ",
                "RwLock was poisoned during read acquisition. Recovering data; \
                 a background task panicked while holding this lock."
            );
            poisoned.into_inner()
        }
    }
}

/// Acquire a write lock, recovering from poisoning if necessary.
#[inline]
pub fn resilient_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "rfetch::locks",
                event = "LOCK_POISONED_WRITE",
                "RwLock was poisoned during write acquisition. Recovering data; \
                 a background task panicked while holding this lock."
            );
            poisoned.into_inner()
        }
    }
}

/// Acquire a mutex, recovering from poisoning if necessary.
///
/// Used for the queue container and for individual transfer entries.
#[inline]
pub fn resilient_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "rfetch::locks",
                event = "LOCK_POISONED_MUTEX",
                "Mutex was poisoned. Recovering data; \
                 a background task panicked while holding this lock."
            );
            poisoned.into_inner()
        }
    }
}
