// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fragment reassembly waitlist.
//!
//! Collects the 802.11 fragments of one MSDU per (peer, tid) until the
//! fragment without more-fragments arrives. Only one MSDU per (peer, tid) can
//! be in flight; a fragment that does not continue the pending set (other
//! sequence number, skipped fragment number, non-consecutive PN on an
//! encrypted set) discards it.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use rxreorder::{Frame, FragWaitlist, PeerId, RxBuf, RxDesc, Tid};
//!
//! let mut waitlist = FragWaitlist::new(Duration::from_millis(100));
//! let frag = |n: u8, more: bool| {
//!     let desc = RxDesc { seq_num: 42, frag_num: n, more_frags: more, ..RxDesc::default() };
//!     Frame::new(RxBuf::from_slice(&[n; 4]), desc)
//! };
//!
//! let now = Instant::now();
//! assert!(waitlist.insert(PeerId(1), Tid::new(0), frag(0, true), now).completed.is_none());
//! let done = waitlist.insert(PeerId(1), Tid::new(0), frag(1, false), now).completed.unwrap();
//! assert_eq!(done.len(), 2);
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{PeerId, SeqNum, Tid};
use crate::config::PN_MASK;
use crate::frame::{Frame, FrameChain};

#[derive(Debug)]
struct PendingMsdu {
    seq: SeqNum,
    next_frag: u8,
    /// PN of the last fragment; `None` for an unencrypted set.
    last_pn: Option<u64>,
    frames: Vec<Frame>,
    deadline: Instant,
}

impl PendingMsdu {
    /// Whether `frame` is the next fragment of this set.
    fn continues(&self, frame: &Frame) -> bool {
        let security = &frame.desc.security;
        let pn_ok = match self.last_pn {
            Some(pn) => security.encrypted && security.pn == (pn + 1) & PN_MASK,
            None => !security.encrypted,
        };
        self.seq == frame.seq_num() && self.next_frag == frame.desc.frag_num && pn_ok
    }
}

fn pn_of(frame: &Frame) -> Option<u64> {
    let security = &frame.desc.security;
    security.encrypted.then_some(security.pn & PN_MASK)
}

/// Result of feeding one fragment to the waitlist.
#[derive(Debug, Default)]
pub struct DefragOutcome {
    /// All fragments of an MSDU, in fragment-number order.
    pub completed: Option<FrameChain>,
    /// Frames dropped while handling this fragment.
    pub discarded: usize,
}

/// Pending fragment sets keyed by (peer, tid).
#[derive(Debug)]
pub struct FragWaitlist {
    timeout: Duration,
    pending: HashMap<(PeerId, Tid), PendingMsdu>,
}

impl FragWaitlist {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: HashMap::new(),
        }
    }

    /// Feed one received fragment.
    pub fn insert(&mut self, peer: PeerId, tid: Tid, frame: Frame, now: Instant) -> DefragOutcome {
        let seq = frame.seq_num();
        let frag = frame.desc.frag_num;
        let more = frame.desc.more_frags;
        let key = (peer, tid);
        let mut outcome = DefragOutcome::default();

        // Unfragmented MSDU: nothing to wait for.
        if frag == 0 && !more {
            outcome.completed = Some(FrameChain::single(frame));
            return outcome;
        }

        match self.pending.remove(&key) {
            Some(mut entry) if entry.continues(&frame) => {
                entry.last_pn = pn_of(&frame);
                entry.frames.push(frame);
                if more {
                    entry.next_frag += 1;
                    self.pending.insert(key, entry);
                } else {
                    outcome.completed = Some(FrameChain::from(entry.frames));
                }
            }
            stale => {
                if let Some(entry) = stale {
                    log::warn!(
                        "[FragWaitlist] {} {}: dropping {} fragments of seq {} \
                         (got seq {} frag {})",
                        peer,
                        tid,
                        entry.frames.len(),
                        entry.seq,
                        seq,
                        frag
                    );
                    outcome.discarded += entry.frames.len();
                }
                if frag == 0 {
                    self.pending.insert(
                        key,
                        PendingMsdu {
                            seq,
                            next_frag: 1,
                            last_pn: pn_of(&frame),
                            frames: vec![frame],
                            deadline: now + self.timeout,
                        },
                    );
                } else {
                    log::warn!(
                        "[FragWaitlist] {} {}: stray fragment seq {} frag {}",
                        peer,
                        tid,
                        seq,
                        frag
                    );
                    outcome.discarded += 1;
                }
            }
        }
        outcome
    }

    /// Remove the pending set of (peer, tid), handing its frames back.
    pub fn drain(&mut self, peer: PeerId, tid: Tid) -> Vec<Frame> {
        self.pending
            .remove(&(peer, tid))
            .map(|entry| entry.frames)
            .unwrap_or_default()
    }

    /// Remove every pending set whose deadline passed; returns their frames.
    pub fn expire(&mut self, now: Instant) -> Vec<(PeerId, Tid, Vec<Frame>)> {
        let due: Vec<(PeerId, Tid)> = self
            .pending
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .map(|(key, _)| *key)
            .collect();

        due.into_iter()
            .filter_map(|(peer, tid)| {
                self.pending
                    .remove(&(peer, tid))
                    .map(|entry| (peer, tid, entry.frames))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
