// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # rxreorder - Wireless LAN receive reordering
//!
//! Host-side receive path for block-ack aggregated 802.11 traffic: rebuilds
//! the per-station, per-traffic-class MPDU order from out-of-order link-layer
//! deliveries, rejects duplicates and replays with 12-bit cyclic sequence
//! arithmetic, and restitches hardware-segmented monitor captures into
//! complete frames.
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                      Indication dispatch                            |
//! |   RxIndication -> ReplayFilter -> ReorderEngine::store              |
//! +---------------------------------------------------------------------+
//! |                        Reorder state                                |
//! |   PeerTidTable -> ReorderWindow (slots[seq & mask] -> FrameChain)   |
//! +---------------------------------------------------------------------+
//! |                     Release / recovery                              |
//! |   release | flush | pn_indication | hole timeout -> DeliverySink    |
//! +---------------------------------------------------------------------+
//! |                   Passive capture (disjoint)                        |
//! |   Frame queue -> MonitorReassembler -> MonitorFrame + PhyStats      |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rxreorder::{
//!     Frame, FrameChain, PeerId, ReorderConfig, ReorderEngine, RxBuf, RxDesc, Tid,
//! };
//!
//! let mut delivered = Vec::new();
//! let sink = |_peer: PeerId, _tid: Tid, chain: FrameChain| delivered.extend(chain.seq_nums());
//! let mut engine = ReorderEngine::new(ReorderConfig::default(), sink);
//!
//! let peer = PeerId(1);
//! let tid = Tid::new(0);
//! engine.open_session(peer, tid, 8, 5).unwrap();
//!
//! for seq in [7u16, 5, 6] {
//!     let desc = RxDesc { seq_num: seq, last_msdu: true, ..RxDesc::default() };
//!     let frame = Frame::new(RxBuf::from_slice(&[0u8; 16]), desc);
//!     engine.store(peer, tid, seq, FrameChain::single(frame));
//! }
//! engine.release(peer, tid, 5, 8);
//! drop(engine);
//! assert_eq!(delivered, vec![5, 6, 7]);
//! ```
//!
//! ## Modules Overview
//!
//! - [`reorder`] - replay filter, reorder windows, sessions, engine
//! - [`monitor`] - passive-capture frame restitching
//! - [`frame`] - receive buffers, descriptors, frame chains
//! - [`ieee80211`] - 802.11 header helpers used by restitching
//! - [`config`] - constants and runtime configuration

pub mod config;
pub mod error;
pub mod frame;
pub mod ieee80211;
pub mod monitor;
pub mod reorder;

pub use config::{MonitorConfig, ReorderConfig};
pub use error::{Error, Result};
pub use frame::{
    Bandwidth, BufAllocator, DecapFormat, Frame, FrameChain, HeapAllocator, PhyStats, RxBuf,
    RxDesc, SecurityInfo,
};
pub use monitor::{reassemble_monitor, MonitorFrame, MonitorReassembler, MonitorStats};
pub use reorder::{
    DeadlineTimers, DeliverySink, FlushAction, FlushRange, FragWaitlist, HoleTimer,
    IndicationSummary, NoopTimer, PeerId, PeerTidTable, ReorderEngine, ReorderMetrics,
    ReorderMetricsSnapshot, ReorderWindow, ReplayFilter, ReplayVerdict, RxIndication, SeqNum,
    SharedEngine, Tid,
};
