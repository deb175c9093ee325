// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reorder engine: store, release, flush and recovery.
//!
//! Owns the peer/tid table, the fragment waitlist, the delivery sink and the
//! hole timer. Every method takes `&mut self`; callers serialize access per
//! subsystem (single-threaded dispatch, or [`SharedEngine`]).
//!
//! # Frame ownership
//!
//! A frame handed to the engine is, at any instant, in exactly one place:
//! a reorder slot, the fragment waitlist, the outgoing chain passed to
//! [`DeliverySink::deliver`], or the discard path (dropped and counted).
//!
//! # Release walk
//!
//! ```text
//!  next_release_index
//!        v
//!  [ 5 ][ 6 ][ _ ][ 8 ][ _ ][ _ ][ 3 ][ 4 ]     window = 8, mask = 7
//!   idx5 idx6 idx7 idx0 ...
//!
//!  release(5, 8): walk idx 5,6,7 -> chain 5 -> 6, next_release_index = 0
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use super::defrag::FragWaitlist;
use super::{
    DeadlineTimers, HoleTimer, NoopTimer, PeerId, PeerTidTable, ReorderMetrics, ReorderWindow,
    ReplayFilter, ReplayVerdict, SeqNum, Tid,
};
use crate::config::ReorderConfig;
use crate::frame::FrameChain;

/// Consumer of in-order frame chains.
///
/// The callee takes ownership of the chain. It runs while the engine is
/// borrowed mutably, so it must not call back into the same engine.
pub trait DeliverySink {
    fn deliver(&mut self, peer: PeerId, tid: Tid, chain: FrameChain);
}

impl<F> DeliverySink for F
where
    F: FnMut(PeerId, Tid, FrameChain),
{
    fn deliver(&mut self, peer: PeerId, tid: Tid, chain: FrameChain) {
        self(peer, tid, chain)
    }
}

/// Range argument of [`ReorderEngine::flush`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushRange {
    /// Slots `[start, end)` modulo the window size. Sequence numbers work
    /// too, since a slot index is `seq & mask`.
    Range { start: u16, end: u16 },
    /// The entire window, walked from the release pointer. The release
    /// pointer is reset to slot 0 afterwards (the block-ack window moved).
    All,
}

/// What [`ReorderEngine::flush`] does with the frames it walks over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushAction {
    Release,
    Discard,
}

/// Engine behind the coarse per-subsystem lock.
pub type SharedEngine<S, T = NoopTimer> = Arc<Mutex<ReorderEngine<S, T>>>;

/// Slots to visit: `count` slots from `start`, then `next_release_index = end`.
#[derive(Debug, Clone, Copy)]
struct Walk {
    start: u16,
    count: u16,
    end: u16,
}

impl Walk {
    /// Walk for `[start, end)`, both taken modulo the window size.
    ///
    /// Slot indices and sequence numbers are interchangeable here. Equal
    /// endpoints are an empty range; distinct endpoints that land on the same
    /// slot cover the whole window.
    fn for_range(window: &ReorderWindow, start: u16, end: u16) -> Self {
        let mask = window.mask();
        let (from, to) = (start & mask, end & mask);
        let count = match to.wrapping_sub(from) & mask {
            0 if SeqNum::new(start) != SeqNum::new(end) => window.window_size(),
            n => n,
        };
        Self {
            start: from,
            count,
            end: to,
        }
    }
}

/// Per-peer, per-tid receive reorder engine.
pub struct ReorderEngine<S, T = NoopTimer> {
    pub(super) config: ReorderConfig,
    pub(super) table: PeerTidTable,
    pub(super) defrag: FragWaitlist,
    /// Non-default slots held by open sessions.
    pub(super) slots_in_use: usize,
    pub(super) sink: S,
    pub(super) timer: T,
    pub(super) metrics: Arc<ReorderMetrics>,
}

impl<S: DeliverySink> ReorderEngine<S, NoopTimer> {
    /// Engine whose holes are only resolved by explicit flushes.
    pub fn new(config: ReorderConfig, sink: S) -> Self {
        Self::with_timer(config, sink, NoopTimer)
    }
}

impl<S: DeliverySink, T: HoleTimer> ReorderEngine<S, T> {
    pub fn with_timer(config: ReorderConfig, sink: S, timer: T) -> Self {
        let defrag = FragWaitlist::new(config.defrag_timeout());
        Self {
            config,
            table: PeerTidTable::new(),
            defrag,
            slots_in_use: 0,
            sink,
            timer,
            metrics: Arc::new(ReorderMetrics::new()),
        }
    }

    /// Put the engine behind a `parking_lot` mutex for multi-threaded callers.
    pub fn into_shared(self) -> SharedEngine<S, T> {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &ReorderConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<ReorderMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn table(&self) -> &PeerTidTable {
        &self.table
    }

    pub fn window(&self, peer: PeerId, tid: Tid) -> Option<&ReorderWindow> {
        self.table.get(peer, tid)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn slots_in_use(&self) -> usize {
        self.slots_in_use
    }

    /// Start tracking `peer` with every traffic id `Idle`.
    pub fn attach_peer(&mut self, peer: PeerId) {
        if self.table.attach(peer) {
            log::debug!("[ReorderEngine] {} attached", peer);
        }
    }

    /// Classify an arriving MPDU. Unknown peers have no history and pass.
    pub fn classify(&mut self, peer: PeerId, tid: Tid, seq_num: u16, retry: bool) -> ReplayVerdict {
        let Some(window) = self.table.get_mut(peer, tid) else {
            return ReplayVerdict::Ok;
        };
        let verdict = ReplayFilter::classify(window, tid, SeqNum::new(seq_num), retry);
        match verdict {
            ReplayVerdict::Ok => {}
            ReplayVerdict::Duplicate => {
                self.metrics.record_duplicate();
                log::trace!("[ReorderEngine] {} {}: duplicate seq {}", peer, tid, seq_num);
            }
            ReplayVerdict::Replay => {
                self.metrics.record_replay();
                log::debug!(
                    "[ReorderEngine] {} {}: replay seq {} (last released {:?})",
                    peer,
                    tid,
                    seq_num,
                    window.last_released().map(SeqNum::value)
                );
            }
        }
        verdict
    }

    /// Park one MPDU's chain in the slot of `seq_num`.
    ///
    /// Appends to the slot's chain when it is already occupied. Arms the hole
    /// timer when the frame lands anywhere but the release pointer.
    pub fn store(&mut self, peer: PeerId, tid: Tid, seq_num: u16, chain: FrameChain) {
        if chain.is_empty() {
            return;
        }
        let Some(window) = self.table.get_mut(peer, tid) else {
            log::warn!(
                "[ReorderEngine] {} {}: store for unknown peer, dropping {} frames",
                peer,
                tid,
                chain.len()
            );
            self.metrics.record_unknown_peer(chain.len());
            self.metrics.record_discarded(chain.len());
            return;
        };

        let idx = window.store(SeqNum::new(seq_num), chain);
        let behind_hole = window.is_aggregating() && idx != window.next_release_index();
        log::trace!(
            "[ReorderEngine] {} {}: stored seq {} in slot {} ({} occupied)",
            peer,
            tid,
            seq_num,
            idx,
            window.occupied()
        );
        self.metrics.record_stored();

        if behind_hole && !self.timer.is_armed(peer, tid) {
            self.timer.arm(peer, tid);
        }
    }

    /// Release slots `[start, end)` in order to the sink.
    ///
    /// Endpoints are taken modulo the window size, so both slot indices (as
    /// returned by [`first_hole`](Self::first_hole)) and sequence numbers are
    /// accepted. Sets the release pointer to `end`, splices every occupied
    /// slot of the range into one chain, records the head frame's sequence
    /// number as the last released one, and cancels the hole timer.
    pub fn release(&mut self, peer: PeerId, tid: Tid, start: u16, end: u16) {
        self.pn_indication(peer, tid, start, end, &[]);
    }

    /// Release `[start, end)` like [`release`](Self::release), dropping
    /// every slot whose sequence number failed the PN check.
    pub fn pn_indication(
        &mut self,
        peer: PeerId,
        tid: Tid,
        start: u16,
        end: u16,
        failing_seqs: &[u16],
    ) {
        let Some(window) = self.table.get(peer, tid) else {
            return;
        };
        let walk = Walk::for_range(window, start, end);
        self.release_walk(peer, tid, walk, failing_seqs);
    }

    /// Release or discard a range, or the whole window.
    ///
    /// Also drains the fragment waitlist of (peer, tid). When the window ends
    /// up empty, `last_released_seq` is reset to invalid.
    pub fn flush(&mut self, peer: PeerId, tid: Tid, range: FlushRange, action: FlushAction) {
        let Some(window) = self.table.get(peer, tid) else {
            return;
        };
        let walk = match range {
            FlushRange::Range { start, end } => Walk::for_range(window, start, end),
            FlushRange::All => Walk {
                start: window.next_release_index(),
                count: window.window_size(),
                end: 0,
            },
        };
        log::debug!(
            "[ReorderEngine] {} {}: flush {:?} {:?}",
            peer,
            tid,
            range,
            action
        );
        self.flush_walk(peer, tid, walk, action);
    }

    /// Index where the first hole after the release pointer begins.
    ///
    /// `release(peer, tid, pointer, first_hole)` forces out exactly the
    /// stalled run. Unknown peers behave like an `Idle` window (pointer 0).
    pub fn first_hole(&self, peer: PeerId, tid: Tid) -> u16 {
        self.table.get(peer, tid).map_or(0, ReorderWindow::first_hole)
    }

    /// Hole timer expired: force out the run stalled behind the hole.
    ///
    /// Releases from the release pointer up to [`first_hole`](Self::first_hole).
    /// When the walk finds no boundary but frames are buffered, the whole
    /// window is released. Goes through the release path, so the released
    /// run stays in the replay history.
    pub fn on_hole_timeout(&mut self, peer: PeerId, tid: Tid) {
        let Some(window) = self.table.get(peer, tid) else {
            self.timer.cancel(peer, tid);
            return;
        };
        if window.occupied() == 0 {
            self.timer.cancel(peer, tid);
            return;
        }

        let start = window.next_release_index();
        let boundary = window.first_hole();
        let count = if boundary == start {
            window.window_size()
        } else {
            boundary.wrapping_sub(start) & window.mask()
        };
        self.metrics.record_hole_timeout();
        log::debug!(
            "[ReorderEngine] {} {}: hole timeout, releasing slots {}..{}",
            peer,
            tid,
            start,
            boundary
        );
        let walk = Walk {
            start,
            count,
            end: boundary,
        };
        self.release_walk(peer, tid, walk, &[]);
    }

    /// Tear down every traffic id of `peer` (flush-discard) and forget it.
    pub fn cleanup_peer(&mut self, peer: PeerId) {
        if !self.table.contains(peer) {
            return;
        }
        for tid in Tid::all() {
            self.close_session(peer, tid);
            let stale_frags = self.defrag.drain(peer, tid).len();
            if stale_frags > 0 {
                self.metrics.record_discarded(stale_frags);
            }
            self.timer.cancel(peer, tid);
        }
        self.table.detach(peer);
        log::debug!("[ReorderEngine] {} detached", peer);
    }

    /// Splice the walked slots into one chain; `failing_seqs` are discarded.
    fn release_walk(&mut self, peer: PeerId, tid: Tid, walk: Walk, failing_seqs: &[u16]) {
        let Some(window) = self.table.get_mut(peer, tid) else {
            return;
        };
        window.set_next_release_index(walk.end);

        let mut out = FrameChain::new();
        let mut pn_dropped = 0usize;
        for step in 0..walk.count {
            let Some(mut chain) = window.take(walk.start.wrapping_add(step)) else {
                continue;
            };
            let failed = chain
                .head_seq()
                .is_some_and(|seq| failing_seqs.iter().any(|&f| SeqNum::new(f) == seq));
            if failed {
                log::warn!(
                    "[ReorderEngine] {} {}: PN check failed for seq {:?}, dropping {} frames",
                    peer,
                    tid,
                    chain.head_seq().map(SeqNum::value),
                    chain.len()
                );
                self.metrics.record_pn_failure();
                pn_dropped += chain.len();
            } else {
                out.append(&mut chain);
            }
        }

        if let Some(seq) = out.head_seq() {
            window.set_last_released(Some(seq));
        }
        let remaining = window.occupied();

        self.rearm(peer, tid, remaining);
        if pn_dropped > 0 {
            self.metrics.record_discarded(pn_dropped);
        }
        self.deliver(peer, tid, out);
    }

    fn flush_walk(&mut self, peer: PeerId, tid: Tid, walk: Walk, action: FlushAction) {
        let stale_frags = self.defrag.drain(peer, tid);
        if !stale_frags.is_empty() {
            self.metrics.record_discarded(stale_frags.len());
        }

        let Some(window) = self.table.get_mut(peer, tid) else {
            return;
        };
        window.set_next_release_index(walk.end);

        let mut out = FrameChain::new();
        let mut discarded = 0usize;
        for step in 0..walk.count {
            if let Some(mut chain) = window.take(walk.start.wrapping_add(step)) {
                match action {
                    FlushAction::Release => out.append(&mut chain),
                    FlushAction::Discard => discarded += chain.len(),
                }
            }
        }

        if let Some(seq) = out.head_seq() {
            window.set_last_released(Some(seq));
        }
        if window.occupied() == 0 {
            window.set_last_released(None);
        }
        let remaining = window.occupied();

        self.rearm(peer, tid, remaining);
        if discarded > 0 {
            self.metrics.record_discarded(discarded);
        }
        self.deliver(peer, tid, out);
    }

    /// Cancel the hole timer; restart it while frames stay buffered.
    fn rearm(&mut self, peer: PeerId, tid: Tid, remaining: usize) {
        self.timer.cancel(peer, tid);
        if remaining > 0 {
            self.timer.arm(peer, tid);
        }
    }

    pub(super) fn deliver(&mut self, peer: PeerId, tid: Tid, chain: FrameChain) {
        if chain.is_empty() {
            return;
        }
        self.metrics.record_delivered(chain.len());
        self.sink.deliver(peer, tid, chain);
    }
}

impl<S: DeliverySink> ReorderEngine<S, DeadlineTimers> {
    /// Engine with poll-driven hole timers set to `config.hole_timeout()`.
    pub fn with_deadline_timers(config: ReorderConfig, sink: S) -> Self {
        let timers = DeadlineTimers::new(config.hole_timeout());
        Self::with_timer(config, sink, timers)
    }

    /// Fire every hole timer due at `now`. Returns how many fired.
    pub fn poll_timeouts(&mut self, now: std::time::Instant) -> usize {
        let due = self.timer.expired(now);
        let fired = due.len();
        for (peer, tid) in due {
            self.on_hole_timeout(peer, tid);
        }
        fired
    }
}
