// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Peer and traffic-id handles.

use std::fmt;

use crate::config::{NUM_QOS_TIDS, NUM_TIDS};

/// Opaque handle of a link-layer peer station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u16);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer{}", self.0)
    }
}

/// Traffic id: QoS classes 0..=15 plus the multicast pseudo-id 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tid(u8);

impl Tid {
    /// Pseudo traffic id for broadcast/multicast frames.
    pub const MCAST: Tid = Tid(NUM_QOS_TIDS as u8);

    /// Build a traffic id.
    ///
    /// # Panics
    ///
    /// Panics when `raw >= 17`. Traffic ids come from trusted internal
    /// producers; an out-of-range value is a contract violation.
    #[inline]
    pub const fn new(raw: u8) -> Self {
        assert!((raw as usize) < NUM_TIDS, "traffic id out of range");
        Self(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_mcast(self) -> bool {
        self.0 as usize == NUM_QOS_TIDS
    }

    /// Every traffic id, QoS first, multicast last.
    pub fn all() -> impl Iterator<Item = Tid> {
        (0..NUM_TIDS as u8).map(Tid)
    }
}

impl fmt::Display for Tid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mcast() {
            write!(f, "tid-mcast")
        } else {
            write!(f, "tid{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tid_range() {
        assert_eq!(Tid::new(0).index(), 0);
        assert!(Tid::new(16).is_mcast());
        assert_eq!(Tid::MCAST, Tid::new(16));
        assert_eq!(Tid::all().count(), 17);
    }

    #[test]
    #[should_panic(expected = "traffic id out of range")]
    fn test_tid_out_of_range_panics() {
        let _ = Tid::new(17);
    }
}
