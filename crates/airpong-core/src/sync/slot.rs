//! A single-slot, latest-wins, take-on-read hand-off cell.
//!
//! This is the only mutable structure shared between the radio receive
//! context and the main game loop.  It behaves like a capacity-1 channel
//! where a new write *overwrites* an unconsumed value instead of blocking:
//! the reader always sees the freshest snapshot and staleness stays bounded
//! by one write.
//!
//! # Why a bounded wait on the read side? (for beginners)
//!
//! The main loop runs at a fixed tick rate.  If the peer's packet for this
//! tick has not arrived yet, the loop must not stall waiting for it — a
//! dropped radio packet would freeze the game.  `take_within` therefore
//! waits on a condition variable for at most the caller's timeout (one tick
//! interval in practice) and then returns `None`, letting the loop fall
//! back to local prediction.  The writer side only ever holds the mutex for
//! the duration of a store, so the receive callback never blocks for long.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Single-writer/single-reader cell holding "the most recent value, or
/// none yet."
///
/// - [`store`](Self::store) overwrites any unconsumed value (latest-wins).
/// - [`take_within`](Self::take_within) consumes the value, leaving the
///   slot empty, so a given value is delivered to the reader at most once.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use airpong_core::LatestSlot;
///
/// let slot: LatestSlot<u32> = LatestSlot::new();
/// slot.store(5);
/// slot.store(6); // overwrites the unconsumed 5
/// assert_eq!(slot.take_within(Duration::from_millis(1)), Some(6));
/// assert_eq!(slot.take_now(), None);
/// ```
#[derive(Debug, Default)]
pub struct LatestSlot<T> {
    value: Mutex<Option<T>>,
    arrived: Condvar,
}

impl<T> LatestSlot<T> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            arrived: Condvar::new(),
        }
    }

    /// Stores a value, overwriting any unconsumed previous value, and wakes
    /// a reader blocked in [`take_within`](Self::take_within).
    ///
    /// Called from the receive context; holds the lock only for the
    /// assignment.
    pub fn store(&self, value: T) {
        let mut guard = self.value.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(value);
        self.arrived.notify_one();
    }

    /// Takes the current value, waiting up to `timeout` for one to arrive.
    ///
    /// Returns `None` on timeout.  Consuming leaves the slot empty until
    /// the next [`store`](Self::store).
    pub fn take_within(&self, timeout: Duration) -> Option<T> {
        let guard = self.value.lock().unwrap_or_else(|e| e.into_inner());
        let (mut guard, _timed_out) = self
            .arrived
            .wait_timeout_while(guard, timeout, |value| value.is_none())
            .unwrap_or_else(|e| e.into_inner());
        guard.take()
    }

    /// Takes the current value without waiting.
    pub fn take_now(&self) -> Option<T> {
        self.value
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// Discards any unconsumed value, e.g. when a match ends.
    pub fn clear(&self) {
        let _ = self.take_now();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
