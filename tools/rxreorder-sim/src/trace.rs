// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON-lines trace format.
//!
//! One operation per line, tagged by `op`:
//!
//! ```text
//! {"op":"open","peer":1,"tid":0,"window":8,"start":100}
//! {"op":"mpdu","peer":1,"tid":0,"seq":102}
//! {"op":"release","peer":1,"tid":0,"start":100,"end":103}
//! {"op":"tick","ms":250}
//! ```

use std::time::{Duration, Instant};

use anyhow::{ensure, Result};
use rxreorder::config::NUM_TIDS;
use rxreorder::{
    DeadlineTimers, DeliverySink, FlushAction, FlushRange, Frame, FrameChain, PeerId,
    ReorderEngine, RxBuf, RxDesc, RxIndication, Tid,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TraceOp {
    Attach {
        peer: u16,
    },
    Open {
        peer: u16,
        tid: u8,
        window: u16,
        start: u16,
    },
    Close {
        peer: u16,
        tid: u8,
    },
    Mpdu {
        peer: u16,
        tid: u8,
        seq: u16,
        #[serde(default)]
        retry: bool,
        /// Frames in the MPDU (A-MSDU sub-frames).
        #[serde(default = "one")]
        subframes: usize,
        #[serde(default = "default_len")]
        len: usize,
    },
    Frag {
        peer: u16,
        tid: u8,
        seq: u16,
        frag: u8,
        #[serde(default)]
        more: bool,
    },
    Release {
        peer: u16,
        tid: u8,
        start: u16,
        end: u16,
    },
    Flush {
        peer: u16,
        tid: u8,
        /// Both bounds absent: the whole window.
        start: Option<u16>,
        end: Option<u16>,
        #[serde(default)]
        discard: bool,
    },
    Pn {
        peer: u16,
        tid: u8,
        start: u16,
        end: u16,
        #[serde(default)]
        failing: Vec<u16>,
    },
    Timeout {
        peer: u16,
        tid: u8,
    },
    Cleanup {
        peer: u16,
    },
    /// Fire every hole timer and fragment timeout due `ms` from now.
    Tick {
        ms: u64,
    },
}

fn one() -> usize {
    1
}

fn default_len() -> usize {
    64
}

fn tid(raw: u8) -> Result<Tid> {
    ensure!(
        usize::from(raw) < NUM_TIDS,
        "traffic id {} out of range (0..{})",
        raw,
        NUM_TIDS
    );
    Ok(Tid::new(raw))
}

fn frame(seq: u16, len: usize, desc: RxDesc) -> Frame {
    let mut bytes = vec![0u8; len];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = (seq as usize + i) as u8;
    }
    Frame::new(RxBuf::from_slice(&bytes), RxDesc { seq_num: seq, ..desc })
}

/// Apply one trace operation to the engine.
pub fn apply<S: DeliverySink>(
    engine: &mut ReorderEngine<S, DeadlineTimers>,
    op: TraceOp,
) -> Result<()> {
    match op {
        TraceOp::Attach { peer } => engine.attach_peer(PeerId(peer)),
        TraceOp::Open {
            peer,
            tid: t,
            window,
            start,
        } => engine.open_session(PeerId(peer), tid(t)?, window, start)?,
        TraceOp::Close { peer, tid: t } => engine.close_session(PeerId(peer), tid(t)?),
        TraceOp::Mpdu {
            peer,
            tid: t,
            seq,
            retry,
            subframes,
            len,
        } => {
            ensure!(subframes > 0, "mpdu {} has no sub-frames", seq);
            let mut chain = FrameChain::new();
            for i in 0..subframes {
                let desc = RxDesc {
                    retry,
                    first_msdu: i == 0,
                    last_msdu: i + 1 == subframes,
                    ..RxDesc::default()
                };
                chain.push(frame(seq, len, desc));
            }
            let indication = RxIndication::new(PeerId(peer), tid(t)?).with_mpdu(chain);
            let summary = engine.indicate(indication);
            log::debug!("mpdu {}: {:?}", seq, summary);
        }
        TraceOp::Frag {
            peer,
            tid: t,
            seq,
            frag,
            more,
        } => {
            let desc = RxDesc {
                frag_num: frag,
                more_frags: more,
                first_msdu: true,
                last_msdu: true,
                ..RxDesc::default()
            };
            let frame = frame(seq, 32, desc);
            let verdict = engine.fragment_indication(PeerId(peer), tid(t)?, frame, Instant::now());
            log::debug!("frag {}.{}: {:?}", seq, frag, verdict);
        }
        TraceOp::Release {
            peer,
            tid: t,
            start,
            end,
        } => engine.release(PeerId(peer), tid(t)?, start, end),
        TraceOp::Flush {
            peer,
            tid: t,
            start,
            end,
            discard,
        } => {
            let range = match (start, end) {
                (Some(start), Some(end)) => FlushRange::Range { start, end },
                (None, None) => FlushRange::All,
                _ => anyhow::bail!("flush needs both start and end, or neither"),
            };
            let action = if discard {
                FlushAction::Discard
            } else {
                FlushAction::Release
            };
            engine.flush(PeerId(peer), tid(t)?, range, action);
        }
        TraceOp::Pn {
            peer,
            tid: t,
            start,
            end,
            failing,
        } => engine.pn_indication(PeerId(peer), tid(t)?, start, end, &failing),
        TraceOp::Timeout { peer, tid: t } => engine.on_hole_timeout(PeerId(peer), tid(t)?),
        TraceOp::Cleanup { peer } => engine.cleanup_peer(PeerId(peer)),
        TraceOp::Tick { ms } => {
            let at = Instant::now() + Duration::from_millis(ms);
            let fired = engine.poll_timeouts(at);
            let expired = engine.expire_fragments(at);
            log::debug!("tick {}ms: {} hole timeouts, {} fragments expired", ms, fired, expired);
        }
    }
    Ok(())
}
