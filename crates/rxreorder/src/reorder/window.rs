// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-(peer, tid) reorder window.
//!
//! A fixed-capacity circular slot array indexed by `seq & mask`. Each slot
//! owns the frame chain of one MPDU until it is released or discarded.
//!
//! # Lifecycle
//!
//! ```text
//! Idle (window = 1) --open_session--> Aggregating (window = N)
//!        ^                                   |
//!        +------ close_session / teardown ---+
//! ```
//!
//! Within `Aggregating` each slot cycles `Empty -> Occupied -> Empty`.

use super::SeqNum;
use crate::config::{IDLE_REORDER_WINDOW, MAX_REORDER_WINDOW};
use crate::error::{Error, Result};
use crate::frame::FrameChain;

/// Reorder state of one traffic id of one peer.
#[derive(Debug)]
pub struct ReorderWindow {
    /// `slots.len()` is the window size, always a power of two in `1..=64`.
    slots: Vec<Option<FrameChain>>,
    mask: u16,
    aggregating: bool,
    /// `None` until the first release, and again once the window is empty.
    last_released: Option<SeqNum>,
    next_release_index: u16,
    occupied: usize,
    /// Multicast pseudo-id only: last accepted sequence number.
    mcast_last_seq: Option<SeqNum>,
}

impl ReorderWindow {
    /// Window of a traffic id without a block-ack session.
    pub fn idle() -> Self {
        Self {
            slots: vec![None],
            mask: IDLE_REORDER_WINDOW - 1,
            aggregating: false,
            last_released: None,
            next_release_index: 0,
            occupied: 0,
            mcast_last_seq: None,
        }
    }

    /// Smallest power of two `>= requested`, capped at 64 (0 is treated as 1).
    pub fn rounded_window_size(requested: u16) -> u16 {
        requested
            .clamp(1, MAX_REORDER_WINDOW)
            .next_power_of_two()
    }

    /// Fresh aggregating window for a negotiated size and starting sequence.
    ///
    /// The slot array is allocated fallibly; on failure nothing else changes.
    pub fn try_aggregating(requested: u16, start_seq: SeqNum) -> Result<Self> {
        let size = Self::rounded_window_size(requested);
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(size as usize)
            .map_err(|_| Error::OutOfMemory {
                what: "reorder slots",
            })?;
        slots.resize_with(size as usize, || None);
        let mask = size - 1;
        Ok(Self {
            slots,
            mask,
            aggregating: true,
            last_released: None,
            next_release_index: start_seq.value() & mask,
            occupied: 0,
            mcast_last_seq: None,
        })
    }

    #[inline]
    pub fn window_size(&self) -> u16 {
        self.slots.len() as u16
    }

    #[inline]
    pub fn mask(&self) -> u16 {
        self.mask
    }

    #[inline]
    pub fn is_aggregating(&self) -> bool {
        self.aggregating
    }

    /// Number of occupied slots.
    #[inline]
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub fn last_released(&self) -> Option<SeqNum> {
        self.last_released
    }

    pub fn set_last_released(&mut self, seq: Option<SeqNum>) {
        self.last_released = seq;
    }

    #[inline]
    pub fn next_release_index(&self) -> u16 {
        self.next_release_index
    }

    pub fn set_next_release_index(&mut self, idx: u16) {
        self.next_release_index = idx & self.mask;
    }

    pub fn mcast_last_seq(&self) -> Option<SeqNum> {
        self.mcast_last_seq
    }

    pub fn set_mcast_last_seq(&mut self, seq: Option<SeqNum>) {
        self.mcast_last_seq = seq;
    }

    /// Slots this window charges against the reorder-slot budget.
    pub(crate) fn charged_slots(&self) -> usize {
        if self.aggregating {
            self.slots.len()
        } else {
            0
        }
    }

    #[inline]
    pub fn index_of(&self, seq: SeqNum) -> u16 {
        seq.value() & self.mask
    }

    pub fn is_occupied(&self, idx: u16) -> bool {
        self.slots[(idx & self.mask) as usize].is_some()
    }

    /// Park `chain` in the slot of `seq`, appending to an occupied slot.
    ///
    /// Returns the slot index.
    pub fn store(&mut self, seq: SeqNum, mut chain: FrameChain) -> u16 {
        let idx = self.index_of(seq);
        let slot = idx as usize;
        if let Some(existing) = self.slots[slot].as_mut() {
            existing.append(&mut chain);
        } else {
            self.slots[slot] = Some(chain);
            self.occupied += 1;
        }
        idx
    }

    /// Remove and return the chain held in slot `idx`.
    pub fn take(&mut self, idx: u16) -> Option<FrameChain> {
        let chain = self.slots[(idx & self.mask) as usize].take();
        if chain.is_some() {
            self.occupied -= 1;
        }
        chain
    }

    /// Exclusive boundary of the first occupied run after the release pointer.
    ///
    /// Skips the leading run of empty slots, then the following run of
    /// occupied slots, and returns the index where the next hole begins.
    /// Returns the release pointer unchanged when the walk wraps all the way
    /// around (no hole, or nothing buffered).
    pub fn first_hole(&self) -> u16 {
        let size = self.slots.len();
        let mut idx = self.next_release_index;
        let mut steps = 0;

        while steps < size && self.slots[idx as usize].is_none() {
            idx = (idx + 1) & self.mask;
            steps += 1;
        }
        while steps < size && self.slots[idx as usize].is_some() {
            idx = (idx + 1) & self.mask;
            steps += 1;
        }

        if steps >= size {
            self.next_release_index
        } else {
            idx
        }
    }

    /// Take every buffered chain, walking from the release pointer.
    pub fn drain(&mut self) -> Vec<FrameChain> {
        let size = self.window_size();
        let start = self.next_release_index;
        (0..size)
            .filter_map(|step| self.take(start.wrapping_add(step)))
            .collect()
    }
}

impl Default for ReorderWindow {
    fn default() -> Self {
        Self::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Frame, RxBuf, RxDesc};

    fn chain(seq: u16) -> FrameChain {
        FrameChain::single(Frame::new(RxBuf::from_slice(&[0; 8]), RxDesc::with_seq(seq)))
    }

    #[test]
    fn test_rounded_window_size() {
        let cases = [
            (0, 1),
            (1, 1),
            (2, 2),
            (3, 4),
            (25, 32),
            (32, 32),
            (33, 64),
            (64, 64),
            (65, 64),
            (256, 64),
            (u16::MAX, 64),
        ];
        for (requested, expected) in cases {
            assert_eq!(
                ReorderWindow::rounded_window_size(requested),
                expected,
                "requested {}",
                requested
            );
        }
    }

    #[test]
    fn test_try_aggregating_sets_mask_and_pointer() {
        let w = ReorderWindow::try_aggregating(25, SeqNum::new(100)).unwrap();
        assert_eq!(w.window_size(), 32);
        assert_eq!(w.mask(), 31);
        assert_eq!(w.next_release_index(), 100 & 31);
        assert!(w.is_aggregating());
        assert_eq!(w.last_released(), None);
        assert_eq!(w.charged_slots(), 32);
    }

    #[test]
    fn test_idle_window() {
        let w = ReorderWindow::idle();
        assert_eq!(w.window_size(), 1);
        assert_eq!(w.mask(), 0);
        assert!(!w.is_aggregating());
        assert_eq!(w.charged_slots(), 0);
    }

    #[test]
    fn test_store_appends_to_occupied_slot() {
        let mut w = ReorderWindow::try_aggregating(8, SeqNum::new(0)).unwrap();
        assert_eq!(w.store(SeqNum::new(3), chain(3)), 3);
        assert_eq!(w.store(SeqNum::new(3), chain(3)), 3);
        assert_eq!(w.occupied(), 1, "second store appends, no new slot");
        assert_eq!(w.take(3).unwrap().len(), 2);
        assert_eq!(w.occupied(), 0);
        assert!(w.take(3).is_none());
    }

    #[test]
    fn test_first_hole() {
        let mut w = ReorderWindow::try_aggregating(8, SeqNum::new(0)).unwrap();
        // Nothing buffered: pointer unchanged.
        assert_eq!(w.first_hole(), 0);

        // [_, 1, 2, _, 4, ...]: skip empty 0, occupied 1..3, hole at 3.
        w.store(SeqNum::new(1), chain(1));
        w.store(SeqNum::new(2), chain(2));
        w.store(SeqNum::new(4), chain(4));
        assert_eq!(w.first_hole(), 3);

        // Occupied at the pointer: boundary is still the first hole.
        w.store(SeqNum::new(0), chain(0));
        assert_eq!(w.first_hole(), 3);
    }

    #[test]
    fn test_first_hole_full_window_returns_pointer() {
        let mut w = ReorderWindow::try_aggregating(4, SeqNum::new(2)).unwrap();
        for seq in 0..4 {
            w.store(SeqNum::new(seq), chain(seq));
        }
        assert_eq!(w.first_hole(), 2);
    }

    #[test]
    fn test_first_hole_wraps() {
        let mut w = ReorderWindow::try_aggregating(8, SeqNum::new(6)).unwrap();
        w.store(SeqNum::new(7), chain(7));
        w.store(SeqNum::new(8), chain(8)); // slot 0
        assert_eq!(w.first_hole(), 1);
    }

    #[test]
    fn test_drain_walks_from_pointer() {
        let mut w = ReorderWindow::try_aggregating(4, SeqNum::new(2)).unwrap();
        for seq in [4u16, 1, 2, 3] {
            w.store(SeqNum::new(seq), chain(seq));
        }
        let order: Vec<u16> = w
            .drain()
            .iter()
            .flat_map(|c| c.seq_nums().collect::<Vec<_>>())
            .collect();
        assert_eq!(order, vec![2, 3, 4, 1]);
        assert_eq!(w.occupied(), 0);
    }
}
