// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Counters for the reorder path.
//!
//! Every frame that enters the engine leaves through exactly one of two
//! doors, delivery or discard, so at quiescence
//! `frames_in == frames_delivered + frames_discarded + frames_buffered`.
//!
//! # Thread Safety
//!
//! All counters are `AtomicU64` with Relaxed ordering; the struct is shared
//! through `Arc` so a monitoring thread can snapshot it while the receive
//! path runs.

use std::sync::atomic::{AtomicU64, Ordering};

/// Reorder engine counters.
#[derive(Debug, Default)]
pub struct ReorderMetrics {
    /// MPDU chains parked in a reorder slot.
    mpdus_stored: AtomicU64,
    /// Frames handed to the delivery sink.
    frames_delivered: AtomicU64,
    /// Frames dropped (replay, duplicate, PN failure, flush-discard, teardown).
    frames_discarded: AtomicU64,
    duplicates: AtomicU64,
    replays: AtomicU64,
    pn_failures: AtomicU64,
    hole_timeouts: AtomicU64,
    sessions_opened: AtomicU64,
    sessions_closed: AtomicU64,
    session_open_failures: AtomicU64,
    /// Frames addressed to a peer that is not attached.
    unknown_peer_drops: AtomicU64,
}

/// Point-in-time copy of [`ReorderMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReorderMetricsSnapshot {
    pub mpdus_stored: u64,
    pub frames_delivered: u64,
    pub frames_discarded: u64,
    pub duplicates: u64,
    pub replays: u64,
    pub pn_failures: u64,
    pub hole_timeouts: u64,
    pub sessions_opened: u64,
    pub sessions_closed: u64,
    pub session_open_failures: u64,
    pub unknown_peer_drops: u64,
}

#[inline]
fn bump(counter: &AtomicU64, n: usize) {
    counter.fetch_add(n as u64, Ordering::Relaxed);
}

impl ReorderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_stored(&self) {
        bump(&self.mpdus_stored, 1);
    }

    pub fn record_delivered(&self, frames: usize) {
        bump(&self.frames_delivered, frames);
    }

    pub fn record_discarded(&self, frames: usize) {
        bump(&self.frames_discarded, frames);
    }

    pub fn record_duplicate(&self) {
        bump(&self.duplicates, 1);
    }

    pub fn record_replay(&self) {
        bump(&self.replays, 1);
    }

    pub fn record_pn_failure(&self) {
        bump(&self.pn_failures, 1);
    }

    pub fn record_hole_timeout(&self) {
        bump(&self.hole_timeouts, 1);
    }

    pub fn record_session_opened(&self) {
        bump(&self.sessions_opened, 1);
    }

    pub fn record_session_closed(&self) {
        bump(&self.sessions_closed, 1);
    }

    pub fn record_session_open_failure(&self) {
        bump(&self.session_open_failures, 1);
    }

    pub fn record_unknown_peer(&self, frames: usize) {
        bump(&self.unknown_peer_drops, frames);
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frames_delivered.load(Ordering::Relaxed)
    }

    pub fn frames_discarded(&self) -> u64 {
        self.frames_discarded.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> ReorderMetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        ReorderMetricsSnapshot {
            mpdus_stored: load(&self.mpdus_stored),
            frames_delivered: load(&self.frames_delivered),
            frames_discarded: load(&self.frames_discarded),
            duplicates: load(&self.duplicates),
            replays: load(&self.replays),
            pn_failures: load(&self.pn_failures),
            hole_timeouts: load(&self.hole_timeouts),
            sessions_opened: load(&self.sessions_opened),
            sessions_closed: load(&self.sessions_closed),
            session_open_failures: load(&self.session_open_failures),
            unknown_peer_drops: load(&self.unknown_peer_drops),
        }
    }
}
