// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Block-ack session lifecycle: `Idle(1)` <-> `Aggregating(N)`.

use std::mem;

use super::engine::{DeliverySink, FlushAction, FlushRange, ReorderEngine};
use super::{HoleTimer, PeerId, ReorderWindow, SeqNum, Tid};
use crate::error::{Error, Result};

impl<S: DeliverySink, T: HoleTimer> ReorderEngine<S, T> {
    /// Open (or renegotiate) an aggregation session.
    ///
    /// The window is `requested_window` rounded up to a power of two and capped
    /// at 64. Frames buffered in a previous window are discarded. On failure
    /// (slot budget or allocation) nothing changes.
    ///
    /// An unknown peer is attached first.
    pub fn open_session(
        &mut self,
        peer: PeerId,
        tid: Tid,
        requested_window: u16,
        start_seq: u16,
    ) -> Result<()> {
        let size = ReorderWindow::rounded_window_size(requested_window) as usize;
        let charged = self.table.get(peer, tid).map_or(0, ReorderWindow::charged_slots);
        let projected = self.slots_in_use - charged + size;
        if projected > self.config.max_reorder_slots {
            self.metrics.record_session_open_failure();
            log::warn!(
                "[ReorderEngine] {} {}: window {} exceeds slot budget ({} of {} in use)",
                peer,
                tid,
                size,
                self.slots_in_use,
                self.config.max_reorder_slots
            );
            return Err(Error::ResourceLimitExceeded(format!(
                "reorder slots: {} requested, {} of {} in use",
                size, self.slots_in_use, self.config.max_reorder_slots
            )));
        }

        let fresh = match ReorderWindow::try_aggregating(requested_window, SeqNum::new(start_seq)) {
            Ok(window) => window,
            Err(err) => {
                self.metrics.record_session_open_failure();
                log::warn!("[ReorderEngine] {} {}: open_session failed: {}", peer, tid, err);
                return Err(err);
            }
        };

        if !self.table.contains(peer) {
            log::debug!("[ReorderEngine] {} attached by session open", peer);
        }
        let slot = self.table.get_or_attach(peer, tid);
        let mcast_last = slot.mcast_last_seq();
        let mut old = mem::replace(slot, fresh);
        slot.set_mcast_last_seq(mcast_last);

        let stale: usize = old.drain().iter().map(|chain| chain.len()).sum();
        if stale > 0 {
            log::debug!(
                "[ReorderEngine] {} {}: renegotiation dropped {} buffered frames",
                peer,
                tid,
                stale
            );
            self.metrics.record_discarded(stale);
        }
        let stale_frags = self.defrag.drain(peer, tid).len();
        if stale_frags > 0 {
            self.metrics.record_discarded(stale_frags);
        }
        self.timer.cancel(peer, tid);

        self.slots_in_use = projected;
        self.metrics.record_session_opened();
        log::debug!(
            "[ReorderEngine] {} {}: session open, window {} start {}",
            peer,
            tid,
            size,
            start_seq
        );
        Ok(())
    }

    /// Discard everything buffered and fall back to the idle window.
    ///
    /// Idempotent; closing an idle traffic id or an unknown peer is a no-op.
    pub fn close_session(&mut self, peer: PeerId, tid: Tid) {
        let Some(window) = self.table.get(peer, tid) else {
            return;
        };
        if !window.is_aggregating() && window.occupied() == 0 {
            return;
        }

        self.flush(peer, tid, FlushRange::All, FlushAction::Discard);

        let Some(slot) = self.table.get_mut(peer, tid) else {
            return;
        };
        let was_aggregating = slot.is_aggregating();
        let charged = slot.charged_slots();
        let mcast_last = slot.mcast_last_seq();
        *slot = ReorderWindow::idle();
        slot.set_mcast_last_seq(mcast_last);

        self.slots_in_use -= charged;
        self.timer.cancel(peer, tid);
        if was_aggregating {
            self.metrics.record_session_closed();
            log::debug!("[ReorderEngine] {} {}: session closed", peer, tid);
        }
    }
}
