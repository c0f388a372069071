// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Clock and Timers
//!
//! The client is poll-driven, so timers are plain due times checked against
//! a [`Clock`] on every poll. Tests drive time with [`ManualClock`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Manually advanced clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        ManualClock {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Keyed one-shot timers.
///
/// Each key is either armed with a due time or idle. Arming an armed key
/// keeps the original due time, which is what makes debouncing work.
#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    timers: Vec<(K, i64)>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        TimerQueue { timers: Vec::new() }
    }
}

impl<K: PartialEq + Clone> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `key` to fire at `due_ms`. No-op if already armed.
    ///
    /// Returns `true` if the timer was newly armed.
    pub fn arm(&mut self, key: K, due_ms: i64) -> bool {
        if self.is_armed(&key) {
            return false;
        }
        self.timers.push((key, due_ms));
        true
    }

    /// Cancels `key`. Returns `true` if it was armed.
    pub fn cancel(&mut self, key: &K) -> bool {
        let before = self.timers.len();
        self.timers.retain(|(k, _)| k != key);
        self.timers.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    pub fn is_armed(&self, key: &K) -> bool {
        self.timers.iter().any(|(k, _)| k == key)
    }

    pub fn due_at(&self, key: &K) -> Option<i64> {
        self.timers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, due)| *due)
    }

    /// Earliest due time across all armed timers.
    pub fn next_due(&self) -> Option<i64> {
        self.timers.iter().map(|(_, due)| *due).min()
    }

    /// Removes and returns every timer due at `now_ms`, earliest first.
    pub fn pop_due(&mut self, now_ms: i64) -> Vec<K> {
        let mut due: Vec<(K, i64)> = Vec::new();
        let mut pending = Vec::with_capacity(self.timers.len());
        for (key, at) in self.timers.drain(..) {
            if at <= now_ms {
                due.push((key, at));
            } else {
                pending.push((key, at));
            }
        }
        self.timers = pending;
        due.sort_by_key(|(_, at)| *at);
        due.into_iter().map(|(key, _)| key).collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_is_noop_when_armed() {
        let mut timers = TimerQueue::new();
        assert!(timers.arm("pull", 200));
        assert!(!timers.arm("pull", 500));
        assert_eq!(timers.due_at(&"pull"), Some(200));
    }

    #[test]
    fn test_pop_due_returns_earliest_first() {
        let mut timers = TimerQueue::new();
        timers.arm("b", 300);
        timers.arm("a", 100);
        timers.arm("c", 900);

        assert!(timers.pop_due(99).is_empty());
        assert_eq!(timers.pop_due(300), vec!["a", "b"]);
        assert_eq!(timers.next_due(), Some(900));
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_cancel() {
        let mut timers = TimerQueue::new();
        timers.arm(1u8, 10);
        assert!(timers.cancel(&1));
        assert!(!timers.cancel(&1));
        assert!(timers.pop_due(100).is_empty());
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();
        clock.advance(250);
        assert_eq!(other.now_ms(), 1_250);
        other.set(5);
        assert_eq!(clock.now_ms(), 5);
    }
}
