// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure

//! Monitor capture restitching
//!
//! Drains a queue holding several capture units of different decap formats
//! and checks the rebuilt frames byte for byte.

use std::collections::VecDeque;

use rxreorder::ieee80211::{self, fc, RFC1042_HEADER};
use rxreorder::{
    BufAllocator, DecapFormat, Error, Frame, MonitorConfig, MonitorReassembler, PhyStats, RxBuf,
    RxDesc,
};

fn phy(mcs: u8) -> PhyStats {
    PhyStats {
        mcs,
        rssi_comb: -60,
        freq_mhz: 2437,
        ..PhyStats::default()
    }
}

fn fragment(bytes: &[u8], decap: DecapFormat, first: bool, last: bool, mcs: u8) -> Frame {
    let desc = RxDesc {
        decap,
        first_msdu: first,
        last_msdu: last,
        phy: first.then(|| phy(mcs)),
        ..RxDesc::default()
    };
    Frame::new(RxBuf::from_slice_with_headroom(bytes, 32), desc)
}

fn qos_header(fcv: u16) -> Vec<u8> {
    let mut hdr = vec![0u8; ieee80211::hdr_len(fcv)];
    hdr[..2].copy_from_slice(&fcv.to_le_bytes());
    hdr[22..24].copy_from_slice(&(77u16 << 4).to_le_bytes());
    hdr
}

fn ethernet(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0x10, 0x20, 0x30, 0x40, 0x50, 0x60];
    out.extend_from_slice(&[0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F]);
    out.extend_from_slice(&[0x86, 0xDD]);
    out.extend_from_slice(payload);
    out
}

#[test]
fn test_drain_mixed_queue() {
    let mut queue = VecDeque::new();

    // Unit 1: raw, two fragments, FCS on the last.
    let mut raw = qos_header(fc::TYPE_DATA | fc::SUBTYPE_QOS);
    raw.extend_from_slice(&[0xAB; 10]);
    queue.push_back(fragment(&raw, DecapFormat::Raw, true, false, 1));
    let tail = [0xCD, 0xCD, 0xF1, 0xF2, 0xF3, 0xF4];
    queue.push_back(fragment(&tail, DecapFormat::Raw, false, true, 0));

    // Unit 2: ethernet-decapsulated single MSDU.
    let mut eth = fragment(&ethernet(&[1, 2, 3, 4]), DecapFormat::EthernetII, true, true, 2);
    eth.desc.hdr_status = qos_header(fc::TYPE_DATA | fc::SUBTYPE_QOS | fc::TO_DS);
    queue.push_back(eth);

    let mut r = MonitorReassembler::new(MonitorConfig::default());
    let mut units = Vec::new();
    while !queue.is_empty() {
        units.push(r.reassemble(&mut queue).expect("unit"));
    }

    assert_eq!(units.len(), 2);

    let first = &units[0];
    assert_eq!(first.phy.mcs, 1);
    let bytes = first.to_contiguous();
    assert_eq!(bytes.len(), raw.len() + 2);
    assert_eq!(&bytes[raw.len()..], &[0xCD, 0xCD]);
    assert_eq!(ieee80211::seq_num(&bytes), 77);

    let second = &units[1];
    assert_eq!(second.phy.mcs, 2);
    assert_eq!(second.decap, DecapFormat::EthernetII);
    let bytes = second.to_contiguous();
    let hdr_len = second.head.len();
    assert_eq!(hdr_len, 26);
    assert_eq!(&bytes[hdr_len..hdr_len + 6], &RFC1042_HEADER);
    assert_eq!(&bytes[hdr_len + 6..hdr_len + 8], &[0x86, 0xDD]);
    assert_eq!(&bytes[hdr_len + 8..], &[1, 2, 3, 4]);

    let stats = r.stats();
    assert_eq!(stats.units, 2);
    assert_eq!(stats.raw_units, 1);
    assert_eq!(stats.decap_units, 1);
    assert_eq!(stats.fragments, 3);
}

#[test]
fn test_amsdu_layout_is_4_byte_aligned() {
    let mut queue = VecDeque::new();
    let payloads: [&[u8]; 3] = [&[1; 5], &[2; 9], &[3; 2]];
    for (i, payload) in payloads.iter().enumerate() {
        let mut frame = fragment(
            &ethernet(payload),
            DecapFormat::EthernetII,
            i == 0,
            i == payloads.len() - 1,
            3,
        );
        if i == 0 {
            frame.desc.hdr_status = qos_header(fc::TYPE_DATA | fc::SUBTYPE_QOS);
        }
        queue.push_back(frame);
    }

    let out = MonitorReassembler::new(MonitorConfig::default())
        .reassemble(&mut queue)
        .expect("amsdu");
    assert!(out.amsdu);
    assert!(ieee80211::is_amsdu(out.head.data()));

    // Walk the rebuilt A-MSDU body and check every sub-frame starts aligned.
    let body: Vec<u8> = out.ext.iter().flat_map(|b| b.data().to_vec()).collect();
    let mut offset = 0usize;
    for payload in payloads {
        assert_eq!(offset % 4, 0, "sub-frame at {}", offset);
        let len = u16::from_be_bytes([body[offset + 12], body[offset + 13]]) as usize;
        assert_eq!(len, 8 + payload.len());
        let msdu = &body[offset + 14..offset + 14 + len];
        assert_eq!(&msdu[..6], &RFC1042_HEADER);
        assert_eq!(&msdu[8..], payload);
        offset += 14 + len;
        offset = (offset + 3) & !3;
    }
}

struct Exhausted;

impl BufAllocator for Exhausted {
    fn alloc(&mut self, _capacity: usize, _headroom: usize) -> rxreorder::Result<RxBuf> {
        Err(Error::OutOfMemory { what: "capture buffer" })
    }
}

#[test]
fn test_allocation_failure_returns_ownership() {
    let mut queue = VecDeque::new();
    let mut first = fragment(&ethernet(&[9; 4]), DecapFormat::EthernetII, true, true, 0);
    first.desc.hdr_status = qos_header(fc::TYPE_DATA | fc::SUBTYPE_QOS);
    queue.push_back(first);

    let mut r = MonitorReassembler::with_allocator(MonitorConfig::default(), Exhausted);
    let err = r.reassemble(&mut queue).expect_err("no memory");
    assert!(matches!(err, Error::OutOfMemory { .. }));

    // The unit is still queued and intact; a working allocator succeeds.
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].buf.data(), ethernet(&[9; 4]).as_slice());
    let out = MonitorReassembler::new(MonitorConfig::default())
        .reassemble(&mut queue)
        .expect("retry");
    assert_eq!(out.ext[0].len(), 8 + 4);
}
