// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! 12-bit cyclic sequence numbers.
//!
//! 802.11 MPDU sequence numbers wrap at 4096, so ordering is only meaningful
//! within half the space: `b` is newer than `a` when `(b - a) mod 4096` is in
//! `1..=2048`.

use std::fmt;

use crate::config::{SEQ_HALF_RANGE, SEQ_MASK};

/// MPDU sequence number, always reduced to 12 bits.
///
/// The space is cyclic, so there is no `Ord`; compare with
/// [`is_newer_than`](Self::is_newer_than) or [`distance_to`](Self::distance_to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SeqNum(u16);

impl SeqNum {
    /// Reduce `raw` to the 12-bit sequence space.
    #[inline]
    pub const fn new(raw: u16) -> Self {
        Self(raw & SEQ_MASK)
    }

    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    #[inline]
    pub const fn wrapping_add(self, n: u16) -> Self {
        Self::new(self.0.wrapping_add(n))
    }

    #[inline]
    pub const fn wrapping_sub(self, n: u16) -> Self {
        Self::new(self.0.wrapping_sub(n))
    }

    /// Forward distance from `self` to `other`, modulo 4096.
    #[inline]
    pub const fn distance_to(self, other: SeqNum) -> u16 {
        other.0.wrapping_sub(self.0) & SEQ_MASK
    }

    /// Half-range "newer-than" test used by the replay filter.
    ///
    /// `delta = (self - 1 - last) mod 4096`; anything above 2048 is stale.
    #[inline]
    pub const fn is_newer_than(self, last: SeqNum) -> bool {
        let delta = self.0.wrapping_sub(1).wrapping_sub(last.0) & SEQ_MASK;
        delta <= SEQ_HALF_RANGE
    }
}

impl From<u16> for SeqNum {
    fn from(raw: u16) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_masks_to_12_bits() {
        assert_eq!(SeqNum::new(4096).value(), 0);
        assert_eq!(SeqNum::new(0xFFFF).value(), 4095);
    }

    #[test]
    fn test_wrapping_arithmetic() {
        assert_eq!(SeqNum::new(4095).wrapping_add(1), SeqNum::new(0));
        assert_eq!(SeqNum::new(0).wrapping_sub(1), SeqNum::new(4095));
        assert_eq!(SeqNum::new(4090).distance_to(SeqNum::new(5)), 11);
        assert_eq!(SeqNum::new(5).distance_to(SeqNum::new(5)), 0);
    }

    #[test]
    fn test_newer_than_boundary() {
        let last = SeqNum::new(10);
        assert!(SeqNum::new(11).is_newer_than(last));
        assert!(!SeqNum::new(10).is_newer_than(last));
        // delta = 2047 and 2048 are still in the forward half
        assert!(SeqNum::new(2058).is_newer_than(last));
        assert!(SeqNum::new(2059).is_newer_than(last));
        // delta = 2049 is stale
        assert!(!SeqNum::new(2060).is_newer_than(last));
    }

    #[test]
    fn test_order_holds_across_wrap() {
        // Numerically smaller, yet newer.
        let (old, new) = (SeqNum::new(4095), SeqNum::new(1));
        assert!(new.is_newer_than(old));
        assert!(!old.is_newer_than(new));
        assert_eq!(old.distance_to(new), 2);
    }
}
