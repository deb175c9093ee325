// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! IEEE 802.11 MAC header helpers.
//!
//! Just enough header parsing for monitor restitching: header length from the
//! frame control field, DA/SA resolution from the DS bits, and the QoS control
//! A-MSDU-present bit.

/// Frame control bits (little-endian u16 at offset 0).
pub mod fc {
    pub const TYPE_MASK: u16 = 0x000C;
    pub const TYPE_DATA: u16 = 0x0008;
    pub const SUBTYPE_QOS: u16 = 0x0080;
    pub const TO_DS: u16 = 0x0100;
    pub const FROM_DS: u16 = 0x0200;
    pub const ORDER: u16 = 0x8000;
}

/// QoS control: A-MSDU present.
pub const QOS_CTL_AMSDU_PRESENT: u8 = 0x80;

/// Three-address header length.
pub const HDR_LEN_3ADDR: usize = 24;
pub const ADDR4_LEN: usize = 6;
pub const QOS_CTL_LEN: usize = 2;
pub const HT_CTL_LEN: usize = 4;

/// RFC 1042 LLC/SNAP prefix (ethertype follows).
pub const RFC1042_HEADER: [u8; 6] = [0xAA, 0xAA, 0x03, 0x00, 0x00, 0x00];

pub type MacAddr = [u8; 6];

#[inline]
pub fn frame_control(hdr: &[u8]) -> u16 {
    u16::from_le_bytes([hdr[0], hdr[1]])
}

#[inline]
pub fn is_data(fc: u16) -> bool {
    fc & fc::TYPE_MASK == fc::TYPE_DATA
}

#[inline]
pub fn is_qos_data(fc: u16) -> bool {
    is_data(fc) && fc & fc::SUBTYPE_QOS != 0
}

#[inline]
pub fn has_addr4(fc: u16) -> bool {
    fc & (fc::TO_DS | fc::FROM_DS) == (fc::TO_DS | fc::FROM_DS)
}

/// MAC header length implied by a frame control value.
///
/// Data frames only: 24 bytes, +6 with four addresses, +2 for QoS control,
/// +4 for HT control (QoS frames with the order bit).
pub fn hdr_len(fc: u16) -> usize {
    let mut len = HDR_LEN_3ADDR;
    if has_addr4(fc) {
        len += ADDR4_LEN;
    }
    if is_qos_data(fc) {
        len += QOS_CTL_LEN;
        if fc & fc::ORDER != 0 {
            len += HT_CTL_LEN;
        }
    }
    len
}

fn addr(hdr: &[u8], offset: usize) -> MacAddr {
    let mut out = [0u8; 6];
    out.copy_from_slice(&hdr[offset..offset + 6]);
    out
}

/// Destination address according to the DS bits.
pub fn da(hdr: &[u8]) -> MacAddr {
    let fc = frame_control(hdr);
    if fc & fc::TO_DS != 0 {
        addr(hdr, 16)
    } else {
        addr(hdr, 4)
    }
}

/// Source address according to the DS bits.
pub fn sa(hdr: &[u8]) -> MacAddr {
    let fc = frame_control(hdr);
    match (fc & fc::TO_DS != 0, fc & fc::FROM_DS != 0) {
        (_, false) => addr(hdr, 10),
        (false, true) => addr(hdr, 16),
        (true, true) => addr(hdr, 24),
    }
}

/// Offset of the QoS control field, if the header carries one.
pub fn qos_ctl_offset(fc: u16) -> Option<usize> {
    if !is_qos_data(fc) {
        return None;
    }
    Some(if has_addr4(fc) {
        HDR_LEN_3ADDR + ADDR4_LEN
    } else {
        HDR_LEN_3ADDR
    })
}

/// Whether the header's QoS control announces an A-MSDU payload.
pub fn is_amsdu(hdr: &[u8]) -> bool {
    let fc = frame_control(hdr);
    match qos_ctl_offset(fc) {
        Some(off) if hdr.len() > off => hdr[off] & QOS_CTL_AMSDU_PRESENT != 0,
        _ => false,
    }
}

/// Sequence number from the sequence control field.
pub fn seq_num(hdr: &[u8]) -> u16 {
    u16::from_le_bytes([hdr[22], hdr[23]]) >> 4
}
