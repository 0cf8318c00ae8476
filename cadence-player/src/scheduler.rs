//! Cooperative logical-timer scheduler
//!
//! All engine timers (countdown second, scroll frames, video reveal steps,
//! heartbeat, volume ramps) live on one virtual clock. The scheduler never
//! sleeps: the owner advances the clock and pops due timers one at a time,
//! so ordering is deterministic and tests need no wall-clock waits.
//!
//! **Ordering:** due time first, then timer kind (`K: Ord`), then scheduling
//! sequence. Giving the countdown kind the lowest rank makes it run before
//! any other timer due at the same instant.
//!
//! **Pausable timers:** `suspend_pausable()` freezes every pausable timer
//! with its remaining delay; `resume_pausable()` re-arms it relative to the
//! new current time. Timers scheduled while suspended start frozen.

use std::fmt::Debug;

/// Handle to a scheduled timer
pub type TimerId = u64;

#[derive(Debug, Clone)]
struct TimerEntry<K> {
    id: TimerId,
    kind: K,
    due_ms: u64,
    /// Repeat period; `None` for one-shot timers
    period_ms: Option<u64>,
    pausable: bool,
    /// Remaining delay while frozen
    suspended_remaining_ms: Option<u64>,
    seq: u64,
}

/// Virtual-clock timer wheel
#[derive(Debug)]
pub struct Scheduler<K> {
    now_ms: u64,
    next_id: TimerId,
    next_seq: u64,
    suspended: bool,
    timers: Vec<TimerEntry<K>>,
}

impl<K: Copy + Ord + Debug> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Ord + Debug> Scheduler<K> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            next_seq: 0,
            suspended: false,
            timers: Vec::new(),
        }
    }

    /// Current virtual time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Whether pausable timers are currently frozen
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Fire once after `delay_ms`
    pub fn schedule_once(&mut self, kind: K, delay_ms: u64, pausable: bool) -> TimerId {
        self.insert(kind, delay_ms, None, pausable)
    }

    /// Fire every `period_ms`, first after one full period
    pub fn schedule_repeating(&mut self, kind: K, period_ms: u64, pausable: bool) -> TimerId {
        // A zero period would make pop_due spin forever
        let period_ms = period_ms.max(1);
        self.insert(kind, period_ms, Some(period_ms), pausable)
    }

    fn insert(&mut self, kind: K, delay_ms: u64, period_ms: Option<u64>, pausable: bool) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let seq = self.bump_seq();

        let frozen = pausable && self.suspended;
        self.timers.push(TimerEntry {
            id,
            kind,
            due_ms: self.now_ms + delay_ms,
            period_ms,
            pausable,
            suspended_remaining_ms: frozen.then_some(delay_ms),
            seq,
        });
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Cancel one timer; returns false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    /// Cancel every timer of `kind`, returning how many were removed
    pub fn cancel_kind(&mut self, kind: K) -> usize {
        let before = self.timers.len();
        self.timers.retain(|t| t.kind != kind);
        before - self.timers.len()
    }

    /// Cancel everything (teardown)
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_scheduled(&self, kind: K) -> bool {
        self.timers.iter().any(|t| t.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Delay until `kind` next fires, frozen timers reporting their stored remainder
    pub fn remaining_ms(&self, kind: K) -> Option<u64> {
        self.timers
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| match t.suspended_remaining_ms {
                Some(remaining) => remaining,
                None => t.due_ms.saturating_sub(self.now_ms),
            })
            .min()
    }

    /// Freeze all pausable timers at their remaining delay
    pub fn suspend_pausable(&mut self) {
        if self.suspended {
            return;
        }
        self.suspended = true;
        let now = self.now_ms;
        for timer in self.timers.iter_mut().filter(|t| t.pausable) {
            timer.suspended_remaining_ms = Some(timer.due_ms.saturating_sub(now));
        }
    }

    /// Re-arm frozen timers relative to the current time
    pub fn resume_pausable(&mut self) {
        if !self.suspended {
            return;
        }
        self.suspended = false;
        let now = self.now_ms;
        for timer in self.timers.iter_mut() {
            if let Some(remaining) = timer.suspended_remaining_ms.take() {
                timer.due_ms = now + remaining;
            }
        }
    }

    /// Earliest due time among running timers
    pub fn next_due_ms(&self) -> Option<u64> {
        self.timers
            .iter()
            .filter(|t| t.suspended_remaining_ms.is_none())
            .map(|t| t.due_ms)
            .min()
    }

    /// Pop the next timer due at or before `limit_ms`
    ///
    /// Moves the clock to the timer's due time. Repeating timers are re-armed
    /// one period later; one-shot timers are removed.
    pub fn pop_due(&mut self, limit_ms: u64) -> Option<(TimerId, K)> {
        let position = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.suspended_remaining_ms.is_none() && t.due_ms <= limit_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.kind, t.seq))
            .map(|(i, _)| i)?;

        let due_ms = self.timers[position].due_ms;
        self.now_ms = self.now_ms.max(due_ms);

        let (id, kind) = (self.timers[position].id, self.timers[position].kind);
        match self.timers[position].period_ms {
            Some(period) => {
                let seq = self.bump_seq();
                let timer = &mut self.timers[position];
                timer.due_ms = due_ms + period;
                timer.seq = seq;
            }
            None => {
                self.timers.swap_remove(position);
            }
        }
        Some((id, kind))
    }

    /// Move the clock forward without firing anything
    pub fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}
