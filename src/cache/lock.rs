//! Poisoned-lock recovery for the cache's interior mutability.
//!
//! A panic while holding a cache lock must not take every later request
//! down with it. The cached data is derived and recomputable, so
//! recovery just means taking the guard and carrying on.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockWriteGuard};

use tracing::warn;

fn note_poison(op: &'static str, kind: &'static str) {
    warn!(
        target: "rostra::cache",
        op,
        kind,
        "cache lock was poisoned; continuing with the recovered guard"
    );
}

pub(crate) fn rw_write<'a, T>(lock: &'a RwLock<T>, op: &'static str) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        note_poison(op, "rwlock");
        poisoned.into_inner()
    })
}

pub(crate) fn mutex_lock<'a, T>(lock: &'a Mutex<T>, op: &'static str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        note_poison(op, "mutex");
        poisoned.into_inner()
    })
}
