// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use std::cell::Cell;
use std::time::{Duration, Instant};

use libfuzzer_sys::fuzz_target;
use rxreorder::{
    FlushAction, FlushRange, Frame, FrameChain, PeerId, ReorderConfig, ReorderEngine, RxBuf,
    RxDesc, RxIndication, Tid,
};

fn frame(seq: u16, desc: RxDesc) -> Frame {
    Frame::new(RxBuf::from_slice(&seq.to_le_bytes()), RxDesc { seq_num: seq, ..desc })
}

// Each 5-byte record is one engine operation. Whatever the schedule, every
// frame fed in must end up delivered or counted as discarded.
fuzz_target!(|data: &[u8]| {
    let delivered = Cell::new(0u64);
    let sink = |_: PeerId, _: Tid, chain: FrameChain| {
        delivered.set(delivered.get() + chain.len() as u64);
    };
    let mut engine = ReorderEngine::new(ReorderConfig::default(), sink);
    let now = Instant::now();
    let mut frames_in = 0u64;

    for rec in data.chunks_exact(5) {
        let peer = PeerId(u16::from(rec[1] & 0x03));
        let tid = Tid::new((rec[1] >> 2) % 17);
        let a = u16::from_le_bytes([rec[2], rec[3]]) & 0x0FFF;
        let b = a.wrapping_add(u16::from(rec[4])) & 0x0FFF;

        match rec[0] % 10 {
            0 => engine.attach_peer(peer),
            1 => {
                let _ = engine.open_session(peer, tid, u16::from(rec[4]), a);
            }
            2 => engine.close_session(peer, tid),
            3 => {
                let desc = RxDesc {
                    retry: rec[4] & 1 != 0,
                    ..RxDesc::with_seq(a)
                };
                frames_in += 1;
                let mpdu = FrameChain::single(frame(a, desc));
                engine.indicate(RxIndication::new(peer, tid).with_mpdu(mpdu));
            }
            4 => engine.release(peer, tid, a, b),
            5 => {
                let range = if rec[4] & 0x80 != 0 {
                    FlushRange::All
                } else {
                    FlushRange::Range { start: a, end: b }
                };
                let action = if rec[4] & 1 != 0 {
                    FlushAction::Discard
                } else {
                    FlushAction::Release
                };
                engine.flush(peer, tid, range, action);
            }
            6 => engine.pn_indication(peer, tid, a, b, &[a, b.wrapping_sub(1) & 0x0FFF]),
            7 => engine.on_hole_timeout(peer, tid),
            8 => engine.cleanup_peer(peer),
            _ => {
                let desc = RxDesc {
                    frag_num: rec[4] & 0x03,
                    more_frags: rec[4] & 0x04 != 0,
                    ..RxDesc::with_seq(a)
                };
                frames_in += 1;
                engine.fragment_indication(peer, tid, frame(a, desc), now);
            }
        }
    }

    for peer in 0..4u16 {
        engine.cleanup_peer(PeerId(peer));
    }
    engine.expire_fragments(now + Duration::from_secs(3600));

    let metrics = engine.metrics();
    assert_eq!(metrics.frames_delivered(), delivered.get());
    assert_eq!(metrics.frames_delivered() + metrics.frames_discarded(), frames_in);
    assert_eq!(engine.slots_in_use(), 0);
});
