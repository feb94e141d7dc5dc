// crates/loadgate-core/src/runtime/cancel.rs
// ============================================================================
// Module: Load Gate Cancellation
// Description: Cancellation token and interruptible blocking sleeper.
// Purpose: Let a build abort unwind polling waits immediately.
// Dependencies: crate::interfaces, std::sync
// ============================================================================

//! ## Overview
//! [`CancellationToken`] is shared between the host (which cancels on user
//! abort) and the [`ThreadSleeper`] used by the completion poller. Waits block
//! on a condition variable, so `cancel()` wakes a sleeping poller right away
//! instead of after the current interval.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use crate::interfaces::Interrupted;
use crate::interfaces::Sleeper;

// ============================================================================
// SECTION: Cancellation Token
// ============================================================================

/// Shared cancellation flag plus wake-up signal.
#[derive(Debug, Default)]
struct CancelState {
    /// True once cancellation was requested.
    cancelled: Mutex<bool>,
    /// Wakes waiters when cancellation is requested.
    notify: Condvar,
}

/// Clonable handle used to request and observe cancellation.
///
/// # Invariants
/// - Cancellation is sticky; a cancelled token never resets.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    /// Shared state across clones.
    inner: Arc<CancelState>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation and wakes every waiter.
    pub fn cancel(&self) {
        let mut cancelled =
            self.inner.cancelled.lock().unwrap_or_else(PoisonError::into_inner);
        *cancelled = true;
        drop(cancelled);
        self.inner.notify.notify_all();
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.inner.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Blocks for `duration` or until cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Interrupted`] when cancelled before the duration elapses.
    pub fn wait(&self, duration: Duration) -> Result<(), Interrupted> {
        let deadline = Instant::now().checked_add(duration);
        let mut cancelled =
            self.inner.cancelled.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if *cancelled {
                return Err(Interrupted);
            }
            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => duration,
            };
            if remaining.is_zero() {
                return Ok(());
            }
            let (guard, _) = self
                .inner
                .notify
                .wait_timeout(cancelled, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            cancelled = guard;
        }
    }
}

// ============================================================================
// SECTION: Thread Sleeper
// ============================================================================

/// Real-time sleeper that blocks the calling thread.
#[derive(Debug, Clone, Default)]
pub struct ThreadSleeper {
    /// Token observed during waits.
    token: CancellationToken,
}

impl ThreadSleeper {
    /// Creates a sleeper bound to the provided token.
    #[must_use]
    pub const fn new(token: CancellationToken) -> Self {
        Self {
            token,
        }
    }

    /// Returns the token this sleeper observes.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        self.token.wait(duration)
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
