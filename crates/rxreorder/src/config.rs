// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global configuration for the receive path.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: 802.11 constants (sequence space, window limits,
//!   header sizes). **Never hardcode these elsewhere.**
//! - **Level 2 (Dynamic)**: [`ReorderConfig`] and [`MonitorConfig`], built in
//!   code or (feature `serde`) deserialized from a config file.
//!
//! # Example
//!
//! ```
//! use rxreorder::config::{ReorderConfig, MAX_REORDER_WINDOW};
//!
//! let config = ReorderConfig {
//!     hole_timeout_ms: 40,
//!     ..ReorderConfig::default()
//! };
//! assert_eq!(config.hole_timeout().as_millis(), 40);
//! assert_eq!(MAX_REORDER_WINDOW, 64);
//! ```

use std::time::Duration;

// =======================================================================
// Sequence space (IEEE 802.11-2020 Sec.9.2.4.4)
// =======================================================================

/// Sequence numbers are 12 bits wide.
pub const SEQ_MODULO: u16 = 4096;

/// Mask applied to raw sequence numbers.
pub const SEQ_MASK: u16 = SEQ_MODULO - 1;

/// Half of the sequence space; distances above this are "older".
pub const SEQ_HALF_RANGE: u16 = SEQ_MODULO / 2;

/// CCMP/GCMP packet numbers are 48 bits wide.
pub const PN_MASK: u64 = (1 << 48) - 1;

// =======================================================================
// Reorder windows
// =======================================================================

/// Largest block-ack reorder window the host buffers (HT block ack).
pub const MAX_REORDER_WINDOW: u16 = 64;

/// Window size of a traffic id without an aggregation session.
pub const IDLE_REORDER_WINDOW: u16 = 1;

/// QoS traffic ids 0..=15.
pub const NUM_QOS_TIDS: usize = 16;

/// QoS traffic ids plus the multicast pseudo-id.
pub const NUM_TIDS: usize = NUM_QOS_TIDS + 1;

// =======================================================================
// Frame layout (bytes)
// =======================================================================

/// Trailing frame check sequence on raw captures.
pub const FCS_LEN: usize = 4;

/// LLC/SNAP encapsulation header (AA AA 03 00 00 00 + ethertype).
pub const LLC_SNAP_LEN: usize = 8;

/// A-MSDU sub-frame header (DA, SA, length).
pub const AMSDU_SUBFRAME_HDR_LEN: usize = 14;

/// Ethernet II / 802.3 header as produced by hardware decapsulation.
pub const ETH_HLEN: usize = 14;

/// A-MSDU sub-frames are padded to this alignment.
pub const AMSDU_ALIGN: usize = 4;

// =======================================================================
// Runtime configuration
// =======================================================================

/// Reorder engine tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReorderConfig {
    /// How long a hole may block buffered frames before they are forced out.
    pub hole_timeout_ms: u64,
    /// How long an incomplete fragment set waits for its remaining fragments.
    pub defrag_timeout_ms: u64,
    /// Upper bound on reorder slots held by all open sessions together.
    pub max_reorder_slots: usize,
}

impl ReorderConfig {
    pub fn hole_timeout(&self) -> Duration {
        Duration::from_millis(self.hole_timeout_ms)
    }

    pub fn defrag_timeout(&self) -> Duration {
        Duration::from_millis(self.defrag_timeout_ms)
    }
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            hole_timeout_ms: 100,
            defrag_timeout_ms: 100,
            // 32 fully aggregated peers at 16 TIDs x 64 slots.
            max_reorder_slots: 32 * NUM_QOS_TIDS * MAX_REORDER_WINDOW as usize,
        }
    }
}

/// Monitor-mode restitching tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonitorConfig {
    /// Copy raw fragments into compact buffers instead of moving them.
    pub copy_raw_fragments: bool,
    /// Bytes of integrity check trailing the last raw fragment.
    pub fcs_len: usize,
    /// Headroom reserved in freshly allocated buffers.
    pub header_headroom: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            copy_raw_fragments: false,
            fcs_len: FCS_LEN,
            header_headroom: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_constants_consistent() {
        assert_eq!(SEQ_MASK, 0x0FFF);
        assert_eq!(SEQ_HALF_RANGE, 2048);
        assert!(MAX_REORDER_WINDOW.is_power_of_two());
    }

    #[test]
    fn test_defaults() {
        let config = ReorderConfig::default();
        assert_eq!(config.hole_timeout(), Duration::from_millis(100));
        assert_eq!(config.max_reorder_slots, 32768);

        let monitor = MonitorConfig::default();
        assert_eq!(monitor.fcs_len, FCS_LEN);
        assert!(!monitor.copy_raw_fragments);
    }
}
