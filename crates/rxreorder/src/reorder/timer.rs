// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Hole-timeout timers.
//!
//! The engine arms a per-(peer, tid) timer when a frame is buffered behind a
//! hole and cancels it synchronously with every release or flush. What
//! happens on expiry is up to the owner: call
//! [`ReorderEngine::on_hole_timeout`](super::ReorderEngine::on_hole_timeout).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{PeerId, Tid};

/// Per-(peer, tid) one-shot timer facility.
pub trait HoleTimer {
    /// Start the timer if it is not already running.
    fn arm(&mut self, peer: PeerId, tid: Tid);

    /// Stop the timer; no-op when not running.
    fn cancel(&mut self, peer: PeerId, tid: Tid);

    fn is_armed(&self, peer: PeerId, tid: Tid) -> bool;
}

/// Timer that never fires. Holes are only resolved by explicit flushes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTimer;

impl HoleTimer for NoopTimer {
    fn arm(&mut self, _peer: PeerId, _tid: Tid) {}

    fn cancel(&mut self, _peer: PeerId, _tid: Tid) {}

    fn is_armed(&self, _peer: PeerId, _tid: Tid) -> bool {
        false
    }
}

/// Poll-driven deadlines.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use rxreorder::{DeadlineTimers, HoleTimer, PeerId, Tid};
///
/// let mut timers = DeadlineTimers::new(Duration::from_millis(10));
/// timers.arm(PeerId(1), Tid::new(0));
/// assert!(timers.expired(Instant::now()).is_empty());
///
/// let later = Instant::now() + Duration::from_millis(11);
/// assert_eq!(timers.expired(later), vec![(PeerId(1), Tid::new(0))]);
/// ```
#[derive(Debug, Clone)]
pub struct DeadlineTimers {
    timeout: Duration,
    deadlines: HashMap<(PeerId, Tid), Instant>,
}

impl DeadlineTimers {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadlines: HashMap::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn expired(&mut self, now: Instant) -> Vec<(PeerId, Tid)> {
        let mut due: Vec<((PeerId, Tid), Instant)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(&key, &deadline)| (key, deadline))
            .collect();
        due.sort_by_key(|&(key, deadline)| (deadline, key));

        for (key, _) in &due {
            self.deadlines.remove(key);
        }
        due.into_iter().map(|(key, _)| key).collect()
    }

    /// Earliest pending deadline, for sleeping until the next poll.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

impl HoleTimer for DeadlineTimers {
    fn arm(&mut self, peer: PeerId, tid: Tid) {
        let timeout = self.timeout;
        self.deadlines
            .entry((peer, tid))
            .or_insert_with(|| Instant::now() + timeout);
    }

    fn cancel(&mut self, peer: PeerId, tid: Tid) {
        self.deadlines.remove(&(peer, tid));
    }

    fn is_armed(&self, peer: PeerId, tid: Tid) -> bool {
        self.deadlines.contains_key(&(peer, tid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_keeps_first_deadline() {
        let mut timers = DeadlineTimers::new(Duration::from_millis(50));
        timers.arm(PeerId(1), Tid::new(2));
        let first = timers.next_deadline().unwrap();
        timers.arm(PeerId(1), Tid::new(2));
        assert_eq!(timers.next_deadline(), Some(first));
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_cancel_prevents_expiry() {
        let mut timers = DeadlineTimers::new(Duration::from_millis(1));
        timers.arm(PeerId(1), Tid::new(0));
        assert!(timers.is_armed(PeerId(1), Tid::new(0)));
        timers.cancel(PeerId(1), Tid::new(0));
        assert!(!timers.is_armed(PeerId(1), Tid::new(0)));
        assert!(timers
            .expired(Instant::now() + Duration::from_secs(1))
            .is_empty());
    }

    #[test]
    fn test_expired_removes_entries() {
        let mut timers = DeadlineTimers::new(Duration::from_millis(5));
        timers.arm(PeerId(1), Tid::new(0));
        timers.arm(PeerId(2), Tid::new(7));
        let later = Instant::now() + Duration::from_millis(10);
        let fired = timers.expired(later);
        assert_eq!(fired.len(), 2);
        assert!(timers.is_empty());
        assert!(timers.expired(later).is_empty());
    }

    #[test]
    fn test_noop_timer_never_armed() {
        let mut timer = NoopTimer;
        timer.arm(PeerId(0), Tid::new(0));
        assert!(!timer.is_armed(PeerId(0), Tid::new(0)));
    }
}
