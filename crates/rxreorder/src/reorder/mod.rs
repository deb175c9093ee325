// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Block-ack receive reordering.
//!
//! | Module | Role |
//! |--------|------|
//! | `seq` | 12-bit cyclic sequence arithmetic |
//! | `ids` | Peer and traffic-id handles |
//! | `window` | Circular slot array of one (peer, tid) |
//! | `table` | Peer -> 17 windows |
//! | `replay` | Duplicate / replay classification |
//! | `engine` | store, release, flush, pn_indication, first_hole |
//! | `session` | open_session / close_session |
//! | `indication` | Receive event dispatch and fragment path |
//! | `timer` | Hole timers |
//! | `defrag` | Fragment reassembly waitlist |
//! | `metrics` | Atomic counters |

mod defrag;
mod engine;
mod ids;
mod indication;
mod metrics;
mod replay;
mod seq;
mod session;
mod table;
mod timer;
mod window;

pub use defrag::{DefragOutcome, FragWaitlist};
pub use engine::{DeliverySink, FlushAction, FlushRange, ReorderEngine, SharedEngine};
pub use ids::{PeerId, Tid};
pub use indication::{IndicationSummary, RxIndication};
pub use metrics::{ReorderMetrics, ReorderMetricsSnapshot};
pub use replay::{ReplayFilter, ReplayVerdict};
pub use seq::SeqNum;
pub use table::{PeerTidTable, PeerTids};
pub use timer::{DeadlineTimers, HoleTimer, NoopTimer};
pub use window::ReorderWindow;
