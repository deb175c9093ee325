// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Duplicate and replay classification of arriving MPDUs.
//!
//! Multicast traffic is never reordered, so it only gets retry-based
//! duplicate suppression. Unicast traffic is compared against the last
//! released sequence number with the half-range test of [`SeqNum`].
//!
//! The filter never advances `last_released_seq`; only an actual release in
//! the engine does.

use super::{ReorderWindow, SeqNum, Tid};

/// Outcome of [`ReplayFilter::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayVerdict {
    /// Accept the MPDU.
    Ok,
    /// Retransmission of the multicast frame just accepted.
    Duplicate,
    /// Sequence number at or behind the release point.
    Replay,
}

/// Stateless classifier over a window's replay state.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayFilter;

impl ReplayFilter {
    /// Classify `seq` arriving on `tid` against `window`.
    ///
    /// For the multicast pseudo-id this records `seq` as the last accepted
    /// sequence number when the frame is accepted.
    pub fn classify(
        window: &mut ReorderWindow,
        tid: Tid,
        seq: SeqNum,
        retry: bool,
    ) -> ReplayVerdict {
        if tid.is_mcast() {
            if retry && window.mcast_last_seq() == Some(seq) {
                return ReplayVerdict::Duplicate;
            }
            window.set_mcast_last_seq(Some(seq));
            return ReplayVerdict::Ok;
        }

        match window.last_released() {
            None => ReplayVerdict::Ok,
            Some(last) if seq.is_newer_than(last) => ReplayVerdict::Ok,
            Some(_) => ReplayVerdict::Replay,
        }
    }
}
