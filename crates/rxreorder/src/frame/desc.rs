// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receive descriptor embedded in every frame.
//!
//! Only the handful of fields the reorder engine and the monitor restitcher
//! read are modelled; per-chip wire encodings are decoded upstream.

/// How the hardware presented the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecapFormat {
    /// Untouched 802.11 frame, FCS included.
    #[default]
    Raw,
    /// 802.11 header without QoS/HT control, payload keeps its LLC/SNAP.
    NativeWifi,
    /// Ethernet II header (DA, SA, ethertype); LLC/SNAP removed.
    EthernetII,
    /// IEEE 802.3 header (DA, SA, length); LLC/SNAP kept in the payload.
    Ieee8023,
}

/// Channel width the PPDU was received on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bandwidth {
    #[default]
    Mhz20,
    Mhz40,
    Mhz80,
    Mhz160,
}

/// PHY statistics reported on the first fragment of a capture unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhyStats {
    /// Combined RSSI in dBm.
    pub rssi_comb: i8,
    /// Per-chain RSSI in dBm (unused chains report `i8::MIN`).
    pub rssi_chain: [i8; 4],
    /// Legacy rate code or HT/VHT MCS index.
    pub mcs: u8,
    /// Spatial streams.
    pub nss: u8,
    pub bandwidth: Bandwidth,
    pub short_gi: bool,
    pub ldpc: bool,
    /// Center frequency in MHz.
    pub freq_mhz: u16,
    /// TSF timestamp at end of reception.
    pub tsf: u64,
}

/// Security fields of an MPDU. Key material never reaches this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SecurityInfo {
    pub encrypted: bool,
    pub key_id: u8,
    /// 48-bit packet number.
    pub pn: u64,
}

/// Receive descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RxDesc {
    /// 12-bit MPDU sequence number.
    pub seq_num: u16,
    /// 4-bit fragment number.
    pub frag_num: u8,
    pub more_frags: bool,
    pub retry: bool,
    pub decap: DecapFormat,
    /// First sub-frame of an MPDU / capture unit.
    pub first_msdu: bool,
    /// Last sub-frame of an MPDU / capture unit.
    pub last_msdu: bool,
    pub security: SecurityInfo,
    /// Present on the first fragment of a capture unit only.
    pub phy: Option<PhyStats>,
    /// Reconstructed 802.11 header (first fragment of decapsulated captures).
    pub hdr_status: Vec<u8>,
}

impl RxDesc {
    /// Descriptor for a single-MSDU MPDU with the given sequence number.
    pub fn with_seq(seq_num: u16) -> Self {
        Self {
            seq_num,
            first_msdu: true,
            last_msdu: true,
            ..Self::default()
        }
    }
}
