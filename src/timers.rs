//! One-shot timer queue for the sequencer.
//!
//! Each successful GET schedules two deferred actions for its slot:
//!
//! ```text
//!  t0 (GET ok) ───── +put_delay ─────▶ Put { value: !v }
//!      │
//!      └──────────── +observe_window ─▶ CancelObserve
//! ```
//!
//! Timers are relative, one-shot and non-renewable.  Every entry carries
//! the slot generation that was active when it was scheduled, so the
//! sequencer can drop timers whose handle has since been superseded.
//! The queue itself knows nothing about slots or transports beyond the
//! tag it stores; firing is pull-based via [`TimerQueue::pop_due`].

use heapless::Vec;
use log::debug;

use crate::error::TimerError;
use crate::resource::Transport;

/// Two actions per transport, with headroom for superseded cycles
/// whose entries have not come due yet.
pub const MAX_TIMERS: usize = 8;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Close the observation window.
    CancelObserve,
    /// Write the negation of the value read by GET.
    Put { value: bool },
}

impl TimerAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CancelObserve => "cancel-observe",
            Self::Put { .. } => "put",
        }
    }
}

/// A fired timer, as handed back to the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub transport: Transport,
    /// Slot generation captured at schedule time.
    pub generation: u32,
    pub action: TimerAction,
    pub deadline_ms: u64,
}

#[derive(Debug, Clone)]
struct TimerEntry {
    fired: FiredTimer,
    /// Insertion order, breaks ties between equal deadlines.
    seq: u64,
}

/// Fixed-capacity one-shot timer queue.
pub struct TimerQueue {
    entries: Vec<TimerEntry, MAX_TIMERS>,
    next_seq: u64,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Schedule `action` to fire at `now_ms + delay_ms`.
    pub fn schedule(
        &mut self,
        transport: Transport,
        generation: u32,
        action: TimerAction,
        now_ms: u64,
        delay_ms: u64,
    ) -> Result<u64, TimerError> {
        let deadline_ms = now_ms.saturating_add(delay_ms);
        let entry = TimerEntry {
            fired: FiredTimer {
                transport,
                generation,
                action,
                deadline_ms,
            },
            seq: self.next_seq,
        };
        self.entries.push(entry).map_err(|_| TimerError::QueueFull)?;
        self.next_seq += 1;
        debug!(
            "Timers: [{}] {} scheduled for t={}ms (gen {})",
            transport,
            action.label(),
            deadline_ms,
            generation
        );
        Ok(deadline_ms)
    }

    /// Remove and return the earliest timer due at or before `now_ms`.
    ///
    /// Call in a loop until it returns `None` to fire everything due, in
    /// deadline order (ties in scheduling order).
    pub fn pop_due(&mut self, now_ms: u64) -> Option<FiredTimer> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.fired.deadline_ms <= now_ms)
            .min_by_key(|(_, e)| (e.fired.deadline_ms, e.seq))
            .map(|(i, _)| i)?;
        Some(self.entries.swap_remove(idx).fired)
    }

    /// Drop every timer for `transport` scheduled under a generation other
    /// than `generation`.  Returns how many were discarded.
    pub fn discard_stale(&mut self, transport: Transport, generation: u32) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| e.fired.transport != transport || e.fired.generation == generation);
        before - self.entries.len()
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.fired.deadline_ms).min()
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pending timers for one transport.
    pub fn pending_for(&self, transport: Transport) -> usize {
        self.entries
            .iter()
            .filter(|e| e.fired.transport == transport)
            .count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
