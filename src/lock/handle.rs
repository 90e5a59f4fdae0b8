//! Scoped exclusive handle on a registered resource.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use tokio::sync::OwnedMutexGuard;
use tracing::trace;

/// Exclusive lease on one resource from a [`LockRegistry`](super::LockRegistry).
///
/// The lease ends when the handle is dropped, whether the owning operation
/// returned, failed, or was aborted while suspended. Calling
/// [`Locked::release`] ends it early; since release consumes the handle it
/// can never happen twice.
pub struct Locked<T> {
    key: String,
    guard: OwnedMutexGuard<T>,
    acquired_at: Instant,
}

impl<T> Locked<T> {
    pub(super) fn new(key: String, guard: OwnedMutexGuard<T>) -> Self {
        trace!(key = %key, "Lock acquired");
        Self {
            key,
            guard,
            acquired_at: Instant::now(),
        }
    }

    /// Display form of the key this handle guards.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// How long the handle has been held.
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Shared access to the guarded value.
    pub fn get(&self) -> &T {
        &self.guard
    }

    /// Exclusive access to the guarded value.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.guard
    }

    /// Release the lease now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl<T> Deref for Locked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for Locked<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for Locked<T> {
    fn drop(&mut self) {
        trace!(
            key = %self.key,
            held_ms = self.acquired_at.elapsed().as_millis() as u64,
            "Lock released"
        );
    }
}

impl<T> fmt::Debug for Locked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locked")
            .field("key", &self.key)
            .field("held_for", &self.held_for())
            .finish()
    }
}
