// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Passive-capture (monitor mode) path.
//!
//! State-disjoint from [`crate::reorder`]: the two only share the receive
//! descriptor format.

mod reassembler;

use std::collections::VecDeque;

pub use reassembler::{MonitorFrame, MonitorReassembler, MonitorStats};

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::frame::Frame;

/// Restitch the capture unit at the front of `input` with default settings.
///
/// ```
/// use std::collections::VecDeque;
/// use rxreorder::{Frame, PhyStats, RxBuf, RxDesc};
///
/// let desc = RxDesc {
///     first_msdu: true,
///     last_msdu: true,
///     phy: Some(PhyStats::default()),
///     ..RxDesc::default()
/// };
/// let mut queue = VecDeque::from([Frame::new(RxBuf::from_slice(&[0xAB; 28]), desc)]);
///
/// let frame = rxreorder::monitor::reassemble_monitor(&mut queue).unwrap();
/// assert_eq!(frame.len(), 24); // FCS trimmed
/// assert!(queue.is_empty());
/// ```
pub fn reassemble_monitor(input: &mut VecDeque<Frame>) -> Result<MonitorFrame> {
    MonitorReassembler::new(MonitorConfig::default()).reassemble(input)
}
