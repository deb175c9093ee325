// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receive indication dispatch.
//!
//! One [`RxIndication`] carries everything the lower layer reported for a
//! (peer, tid) in one event: the MPDUs that arrived, and optionally a flush
//! and a release range computed by the hardware block-ack logic.
//!
//! ```text
//!  flush?  ->  per MPDU: classify -> { drop | deliver (mcast) | store }
//!                                       store on Idle window -> release [seq, seq+1)
//!          ->  release?
//! ```

use std::time::Instant;

use super::engine::{DeliverySink, FlushAction, FlushRange, ReorderEngine};
use super::{HoleTimer, PeerId, ReplayVerdict, Tid};
use crate::frame::{Frame, FrameChain};

/// One receive event for (peer, tid).
#[derive(Debug)]
pub struct RxIndication {
    pub peer: PeerId,
    pub tid: Tid,
    /// One chain per MPDU (A-MSDU sub-frames share one chain).
    pub mpdus: Vec<FrameChain>,
    /// Applied before any MPDU is looked at.
    pub flush: Option<(FlushRange, FlushAction)>,
    /// Sequence range `[start, end)` released after storing.
    pub release: Option<(u16, u16)>,
}

impl RxIndication {
    pub fn new(peer: PeerId, tid: Tid) -> Self {
        Self {
            peer,
            tid,
            mpdus: Vec::new(),
            flush: None,
            release: None,
        }
    }

    pub fn with_mpdu(mut self, chain: FrameChain) -> Self {
        self.mpdus.push(chain);
        self
    }

    pub fn with_flush(mut self, range: FlushRange, action: FlushAction) -> Self {
        self.flush = Some((range, action));
        self
    }

    pub fn with_release(mut self, start: u16, end: u16) -> Self {
        self.release = Some((start, end));
        self
    }
}

/// What [`ReorderEngine::indicate`] did with the MPDUs of one indication.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndicationSummary {
    /// MPDUs parked in an aggregating window.
    pub stored: usize,
    /// MPDUs handed to the sink without buffering (multicast, idle window).
    pub delivered_direct: usize,
    pub duplicates: usize,
    pub replays: usize,
    /// MPDUs dropped because the peer is not attached.
    pub dropped_unknown_peer: usize,
}

impl<S: DeliverySink, T: HoleTimer> ReorderEngine<S, T> {
    /// Dispatch one receive indication.
    pub fn indicate(&mut self, ind: RxIndication) -> IndicationSummary {
        let RxIndication {
            peer,
            tid,
            mpdus,
            flush,
            release,
        } = ind;
        let mut summary = IndicationSummary::default();

        if !self.table.contains(peer) {
            let frames: usize = mpdus.iter().map(FrameChain::len).sum();
            if frames > 0 {
                log::warn!(
                    "[ReorderEngine] {} {}: indication for unknown peer, dropping {} frames",
                    peer,
                    tid,
                    frames
                );
                self.metrics.record_unknown_peer(frames);
                self.metrics.record_discarded(frames);
            }
            summary.dropped_unknown_peer = mpdus.len();
            return summary;
        }

        if let Some((range, action)) = flush {
            self.flush(peer, tid, range, action);
        }

        for chain in mpdus {
            let Some(head) = chain.first() else {
                continue;
            };
            let seq = head.seq_num().value();
            let retry = head.desc.retry;

            match self.classify(peer, tid, seq, retry) {
                ReplayVerdict::Ok => {}
                ReplayVerdict::Duplicate => {
                    summary.duplicates += 1;
                    self.metrics.record_discarded(chain.len());
                    continue;
                }
                ReplayVerdict::Replay => {
                    summary.replays += 1;
                    self.metrics.record_discarded(chain.len());
                    continue;
                }
            }

            if tid.is_mcast() {
                summary.delivered_direct += 1;
                self.deliver(peer, tid, chain);
                continue;
            }

            let aggregating = self
                .table
                .get(peer, tid)
                .is_some_and(|window| window.is_aggregating());
            self.store(peer, tid, seq, chain);
            if aggregating {
                summary.stored += 1;
            } else {
                summary.delivered_direct += 1;
                self.release(peer, tid, seq, seq.wrapping_add(1));
            }
        }

        if let Some((start, end)) = release {
            self.release(peer, tid, start, end);
        }
        summary
    }

    /// Feed one 802.11 fragment through the reassembly waitlist.
    ///
    /// A completed MSDU is replay-checked and delivered directly; fragmented
    /// MSDUs never enter a reorder window. Returns the verdict for a completed
    /// MSDU, `None` while fragments are still pending or when the frame was
    /// dropped.
    pub fn fragment_indication(
        &mut self,
        peer: PeerId,
        tid: Tid,
        frame: Frame,
        now: Instant,
    ) -> Option<ReplayVerdict> {
        if !self.table.contains(peer) {
            self.metrics.record_unknown_peer(1);
            self.metrics.record_discarded(1);
            return None;
        }

        let outcome = self.defrag.insert(peer, tid, frame, now);
        if outcome.discarded > 0 {
            self.metrics.record_discarded(outcome.discarded);
        }
        let msdu = outcome.completed?;
        let head = msdu.first()?;
        let seq = head.seq_num().value();
        let retry = head.desc.retry;

        let verdict = self.classify(peer, tid, seq, retry);
        if verdict == ReplayVerdict::Ok {
            log::trace!(
                "[ReorderEngine] {} {}: reassembled seq {} from {} fragments",
                peer,
                tid,
                seq,
                msdu.len()
            );
            self.deliver(peer, tid, msdu);
        } else {
            self.metrics.record_discarded(msdu.len());
        }
        Some(verdict)
    }

    /// Drop fragment sets that waited past the defragmentation timeout.
    /// Returns the number of frames dropped.
    pub fn expire_fragments(&mut self, now: Instant) -> usize {
        let mut dropped = 0;
        for (peer, tid, frames) in self.defrag.expire(now) {
            log::debug!(
                "[ReorderEngine] {} {}: fragment set timed out, dropping {} frames",
                peer,
                tid,
                frames.len()
            );
            dropped += frames.len();
        }
        if dropped > 0 {
            self.metrics.record_discarded(dropped);
        }
        dropped
    }

    /// Fragment sets still waiting for more fragments.
    pub fn pending_fragments(&self) -> usize {
        self.defrag.len()
    }
}
