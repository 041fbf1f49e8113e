//! Tick-ordering validation for received snapshots.
//!
//! # Why lock-step validation? (for beginners)
//!
//! Both devices simulate the same match and exchange one snapshot per tick
//! over a radio that can drop, delay, or reorder packets.  A snapshot is
//! only meaningful if it describes the tick the peer computed *in lock-step
//! with our previous tick*: applying an older snapshot would rewind the
//! match, and applying a newer one would mean we skipped simulation steps.
//!
//! The gate therefore sorts every received snapshot into one of three
//! verdicts:
//!
//! - **Stale** – the snapshot's counter is at or below the last counter we
//!   applied.  It is a duplicate or a delayed packet; discard it.
//! - **Apply** – the counter equals exactly `local_tick - 1`.  Apply it,
//!   and remember the counter so the same snapshot can never apply twice.
//! - **OutOfStep** – anything else.  Discard with a diagnostic trace only;
//!   the main loop falls back to local prediction for that tick.

/// Verdict for a received snapshot's tick counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickVerdict {
    /// In lock-step with our previous tick; apply it.
    Apply,
    /// Duplicate or delayed packet; discard silently.
    Stale,
    /// Neither stale nor in lock-step; discard with a trace.
    OutOfStep,
}

/// Per-session validator enforcing the ordering rules above.
///
/// One gate exists per match and is reset when a new match starts.
///
/// # Examples
///
/// ```rust
/// use airpong_core::{TickGate, TickVerdict};
///
/// let mut gate = TickGate::new();
/// assert_eq!(gate.evaluate(0, 1), TickVerdict::Apply);
/// // The same snapshot can never be applied again.
/// assert_eq!(gate.evaluate(0, 1), TickVerdict::Stale);
/// ```
#[derive(Debug, Default)]
pub struct TickGate {
    /// Counter of the last snapshot that was applied, if any.
    last_applied: Option<u32>,
}

impl TickGate {
    /// Creates a gate with no applied history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates a received snapshot counter against the local tick counter.
    ///
    /// Advances the applied history only when the verdict is
    /// [`TickVerdict::Apply`], so acceptance is exactly-once.
    pub fn evaluate(&mut self, remote_tick: u32, local_tick: u32) -> TickVerdict {
        if let Some(last) = self.last_applied {
            if remote_tick <= last {
                return TickVerdict::Stale;
            }
        }
        if local_tick > 0 && remote_tick == local_tick - 1 {
            self.last_applied = Some(remote_tick);
            TickVerdict::Apply
        } else {
            TickVerdict::OutOfStep
        }
    }

    /// Counter of the last applied snapshot, if any.  For diagnostics.
    pub fn last_applied(&self) -> Option<u32> {
        self.last_applied
    }

    /// Clears the applied history for a new match.
    pub fn reset(&mut self) {
        self.last_applied = None;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
