// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use std::collections::VecDeque;

use libfuzzer_sys::fuzz_target;
use rxreorder::{DecapFormat, Frame, MonitorConfig, MonitorReassembler, PhyStats, RxBuf, RxDesc};

const DECAPS: [DecapFormat; 4] = [
    DecapFormat::Raw,
    DecapFormat::NativeWifi,
    DecapFormat::EthernetII,
    DecapFormat::Ieee8023,
];

// Input: [flags, len, headroom, bytes...] per fragment. Restitching must
// either consume a whole unit or leave the queue untouched.
fuzz_target!(|data: &[u8]| {
    let mut queue = VecDeque::new();
    let mut rest = data;
    while rest.len() >= 3 {
        let (flags, len, headroom) = (rest[0], usize::from(rest[1]), usize::from(rest[2] & 0x3F));
        rest = &rest[3..];
        let take = len.min(rest.len());
        let (bytes, tail) = rest.split_at(take);
        rest = tail;

        let first = flags & 0x01 != 0;
        let desc = RxDesc {
            decap: DECAPS[usize::from(flags >> 1) & 0x03],
            first_msdu: first,
            last_msdu: flags & 0x08 != 0,
            phy: (flags & 0x10 != 0).then(PhyStats::default),
            hdr_status: if first { bytes.iter().take(36).copied().collect() } else { Vec::new() },
            ..RxDesc::default()
        };
        queue.push_back(Frame::new(RxBuf::from_slice_with_headroom(bytes, headroom), desc));
    }

    let config = MonitorConfig {
        copy_raw_fragments: data.first().is_some_and(|b| b & 0x80 != 0),
        ..MonitorConfig::default()
    };
    let mut reassembler = MonitorReassembler::new(config);

    while !queue.is_empty() {
        let before = queue.len();
        match reassembler.reassemble(&mut queue) {
            Ok(frame) => {
                assert!(queue.len() < before);
                assert_eq!(frame.to_contiguous().len(), frame.len());
            }
            Err(_) => {
                assert_eq!(queue.len(), before);
                queue.pop_front();
            }
        }
    }
});
