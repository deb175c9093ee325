// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Restitching of hardware-segmented monitor captures.
//!
//! A capture unit is the run of queued frames up to and including the first
//! one flagged `last_msdu`. The first frame carries the PHY statistics and,
//! for decapsulated captures, the reconstructed 802.11 header in its status
//! area.
//!
//! Work is split in two phases. Planning peeks at the queue, validates the
//! unit and performs every allocation. Assembly then pops the unit and only
//! moves bytes, so a failure leaves the caller's queue exactly as it was.

use std::collections::VecDeque;

use crate::config::{MonitorConfig, AMSDU_ALIGN, AMSDU_SUBFRAME_HDR_LEN, ETH_HLEN, LLC_SNAP_LEN};
use crate::error::{Error, Result};
use crate::frame::{BufAllocator, DecapFormat, Frame, HeapAllocator, PhyStats, RxBuf};
use crate::ieee80211::{self, MacAddr, RFC1042_HEADER};

/// One restitched capture: head buffer, extension chain and PHY record.
#[derive(Debug)]
pub struct MonitorFrame {
    pub head: RxBuf,
    pub ext: Vec<RxBuf>,
    pub phy: PhyStats,
    pub decap: DecapFormat,
    /// Payload was rebuilt as an A-MSDU.
    pub amsdu: bool,
}

impl MonitorFrame {
    /// Total bytes over head and extension chain.
    pub fn len(&self) -> usize {
        self.head.len() + self.ext.iter().map(RxBuf::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Head followed by the extension chain.
    pub fn buffers(&self) -> impl Iterator<Item = &RxBuf> {
        std::iter::once(&self.head).chain(self.ext.iter())
    }

    /// Flatten into one contiguous byte vector.
    pub fn to_contiguous(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for buf in self.buffers() {
            out.extend_from_slice(buf.data());
        }
        out
    }
}

/// Counters kept by [`MonitorReassembler`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MonitorStats {
    pub units: u64,
    pub raw_units: u64,
    pub decap_units: u64,
    pub amsdu_units: u64,
    pub fragments: u64,
    /// Fragments duplicated into fresh buffers.
    pub copied_fragments: u64,
    pub failures: u64,
}

/// How one decapsulated sub-frame is rewritten.
struct SubframePlan {
    /// Hardware decap header bytes to pull.
    strip: usize,
    /// Padding, A-MSDU sub-frame header and LLC/SNAP, in wire order.
    prefix: Vec<u8>,
    /// Fresh buffer when the fragment lacks headroom for `prefix`.
    copy: Option<RxBuf>,
}

/// Rebuilds monitor captures from queued fragments.
#[derive(Debug)]
pub struct MonitorReassembler<A: BufAllocator = HeapAllocator> {
    config: MonitorConfig,
    alloc: A,
    stats: MonitorStats,
}

impl MonitorReassembler<HeapAllocator> {
    pub fn new(config: MonitorConfig) -> Self {
        Self::with_allocator(config, HeapAllocator)
    }
}

impl<A: BufAllocator> MonitorReassembler<A> {
    pub fn with_allocator(config: MonitorConfig, alloc: A) -> Self {
        Self {
            config,
            alloc,
            stats: MonitorStats::default(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.alloc
    }

    /// Restitch the capture unit at the front of `input`.
    ///
    /// On success the unit's frames are consumed. On failure nothing is
    /// consumed and every buffer allocated on the way is released.
    pub fn reassemble(&mut self, input: &mut VecDeque<Frame>) -> Result<MonitorFrame> {
        match self.try_reassemble(input) {
            Ok(frame) => {
                self.stats.units += 1;
                if frame.decap == DecapFormat::Raw {
                    self.stats.raw_units += 1;
                } else {
                    self.stats.decap_units += 1;
                }
                if frame.amsdu {
                    self.stats.amsdu_units += 1;
                }
                Ok(frame)
            }
            Err(err) => {
                self.stats.failures += 1;
                log::debug!("[MonitorReassembler] capture unit rejected: {}", err);
                Err(err)
            }
        }
    }

    fn try_reassemble(&mut self, input: &mut VecDeque<Frame>) -> Result<MonitorFrame> {
        let (count, phy, decap) = validate_unit(input)?;

        let frame = match decap {
            DecapFormat::Raw => self.restitch_raw(input, count, phy)?,
            _ => self.restitch_decap(input, count, phy, decap)?,
        };
        self.stats.fragments += count as u64;
        log::trace!(
            "[MonitorReassembler] {:?} unit: {} fragments, {} bytes",
            decap,
            count,
            frame.len()
        );
        Ok(frame)
    }

    /// Fragments already carry their 802.11 headers; drop the trailing FCS.
    fn restitch_raw(
        &mut self,
        input: &mut VecDeque<Frame>,
        count: usize,
        phy: PhyStats,
    ) -> Result<MonitorFrame> {
        let mut copies = Vec::new();
        if self.config.copy_raw_fragments {
            for frame in input.iter().take(count) {
                let mut copy = self.alloc.alloc(frame.buf.len(), 0)?;
                copy.extend_from_slice(frame.buf.data());
                copies.push(copy);
            }
        }

        let mut bufs: Vec<RxBuf> = if copies.is_empty() {
            input.drain(..count).map(|frame| frame.buf).collect()
        } else {
            input.drain(..count).for_each(drop);
            self.stats.copied_fragments += copies.len() as u64;
            copies
        };

        // The FCS may straddle the last two buffers.
        let mut fcs = self.config.fcs_len;
        for buf in bufs.iter_mut().rev() {
            if fcs == 0 {
                break;
            }
            let cut = fcs.min(buf.len());
            buf.trim(buf.len() - cut);
            fcs -= cut;
        }

        let mut bufs = bufs.into_iter();
        let head = bufs
            .next()
            .ok_or(Error::TruncatedCapture { fragments: 0 })?;
        Ok(MonitorFrame {
            head,
            ext: bufs.collect(),
            phy,
            decap: DecapFormat::Raw,
            amsdu: false,
        })
    }

    /// Rebuild the 802.11 header from the status area, then re-encapsulate
    /// every sub-frame behind it.
    fn restitch_decap(
        &mut self,
        input: &mut VecDeque<Frame>,
        count: usize,
        phy: PhyStats,
        decap: DecapFormat,
    ) -> Result<MonitorFrame> {
        let hdr_status = &input[0].desc.hdr_status;
        let hdr_len = ieee80211::hdr_len(ieee80211::frame_control(hdr_status));
        let mut header = hdr_status[..hdr_len].to_vec();
        let amsdu = ieee80211::is_amsdu(&header) || count > 1;
        if amsdu {
            if let Some(off) = ieee80211::qos_ctl_offset(ieee80211::frame_control(&header)) {
                header[off] |= ieee80211::QOS_CTL_AMSDU_PRESENT;
            }
        }

        // Planning: every fallible step happens before the queue is touched.
        let headroom = self.config.header_headroom;
        let mut head = self.alloc.alloc(headroom + header.len(), headroom)?;
        head.extend_from_slice(&header);

        let mut plans = Vec::with_capacity(count);
        let mut prev_subframe_len = 0usize;
        for (i, frame) in input.iter().take(count).enumerate() {
            let (strip, addrs, ethertype) = decap_header(&frame.buf, decap)?;
            let payload_len = frame.buf.len() - strip;

            let mut prefix = Vec::new();
            if amsdu {
                if i > 0 {
                    let pad = (AMSDU_ALIGN - prev_subframe_len % AMSDU_ALIGN) % AMSDU_ALIGN;
                    prefix.resize(pad, 0);
                }
                let llc_len = if ethertype.is_some() { LLC_SNAP_LEN } else { 0 };
                let msdu_len = llc_len + payload_len;
                let length = u16::try_from(msdu_len).map_err(|_| {
                    Error::MalformedCapture(format!(
                        "sub-frame {} too long for an A-MSDU ({} bytes)",
                        i, msdu_len
                    ))
                })?;
                let (da, sa) = addrs;
                prefix.extend_from_slice(&da);
                prefix.extend_from_slice(&sa);
                prefix.extend_from_slice(&length.to_be_bytes());
                prev_subframe_len = AMSDU_SUBFRAME_HDR_LEN + msdu_len;
            }
            if let Some(ethertype) = ethertype {
                prefix.extend_from_slice(&RFC1042_HEADER);
                prefix.extend_from_slice(&ethertype);
            }

            let copy = if frame.buf.headroom() + strip < prefix.len() {
                let room = headroom.max(prefix.len());
                let mut copy = self.alloc.alloc(room + payload_len, room)?;
                copy.extend_from_slice(&frame.buf.data()[strip..]);
                Some(copy)
            } else {
                None
            };
            plans.push(SubframePlan { strip, prefix, copy });
        }

        // Assembly: infallible.
        let mut ext = Vec::with_capacity(count);
        for (frame, plan) in input.drain(..count).zip(plans) {
            let mut buf = match plan.copy {
                Some(copy) => {
                    self.stats.copied_fragments += 1;
                    copy
                }
                None => {
                    let mut buf = frame.buf;
                    buf.pull(plan.strip);
                    buf
                }
            };
            let fitted = buf.push_front(&plan.prefix);
            debug_assert!(fitted, "sub-frame headroom planned");
            ext.push(buf);
        }

        Ok(MonitorFrame {
            head,
            ext,
            phy,
            decap,
            amsdu,
        })
    }
}

/// Check the unit at the front of `input` without consuming it.
///
/// Returns the unit's frame count, its PHY record and its decap format.
fn validate_unit(input: &VecDeque<Frame>) -> Result<(usize, PhyStats, DecapFormat)> {
    let first = input.front().ok_or(Error::EmptyCapture)?;
    let count = input
        .iter()
        .position(|frame| frame.desc.last_msdu)
        .map(|pos| pos + 1)
        .ok_or(Error::TruncatedCapture {
            fragments: input.len(),
        })?;

    let phy = first
        .desc
        .phy
        .ok_or_else(|| Error::MalformedCapture("first fragment has no PHY statistics".into()))?;

    let decap = first.desc.decap;
    if input.iter().take(count).any(|frame| frame.desc.decap != decap) {
        return Err(Error::MalformedCapture("mixed decap formats in one unit".into()));
    }

    if decap != DecapFormat::Raw {
        let status = &first.desc.hdr_status;
        if status.len() < 2 || status.len() < ieee80211::hdr_len(ieee80211::frame_control(status)) {
            return Err(Error::MalformedCapture(format!(
                "header status area too short ({} bytes)",
                status.len()
            )));
        }
    }
    Ok((count, phy, decap))
}

/// Hardware decap header of one sub-frame: bytes to strip, (DA, SA), and the
/// ethertype when LLC/SNAP must be re-inserted.
fn decap_header(
    buf: &RxBuf,
    decap: DecapFormat,
) -> Result<(usize, (MacAddr, MacAddr), Option<[u8; 2]>)> {
    let data = buf.data();
    let short = || {
        Error::MalformedCapture(format!("{:?} sub-frame too short ({} bytes)", decap, data.len()))
    };

    match decap {
        DecapFormat::EthernetII | DecapFormat::Ieee8023 => {
            if data.len() < ETH_HLEN {
                return Err(short());
            }
            let (da, sa) = eth_addrs(data);
            let ethertype = (decap == DecapFormat::EthernetII).then(|| [data[12], data[13]]);
            Ok((ETH_HLEN, (da, sa), ethertype))
        }
        DecapFormat::NativeWifi => {
            if data.len() < 2 {
                return Err(short());
            }
            let len = ieee80211::hdr_len(ieee80211::frame_control(data));
            if data.len() < len {
                return Err(short());
            }
            Ok((len, (ieee80211::da(data), ieee80211::sa(data)), None))
        }
        DecapFormat::Raw => Ok((0, ([0; 6], [0; 6]), None)),
    }
}

fn eth_addrs(data: &[u8]) -> (MacAddr, MacAddr) {
    let mut da = [0u8; 6];
    let mut sa = [0u8; 6];
    da.copy_from_slice(&data[0..6]);
    sa.copy_from_slice(&data[6..12]);
    (da, sa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RxDesc;
    use crate::ieee80211::fc;

    const DA: MacAddr = [0x02, 0, 0, 0, 0, 0xDA];
    const SA: MacAddr = [0x02, 0, 0, 0, 0, 0x5A];

    fn phy() -> PhyStats {
        PhyStats {
            rssi_comb: -42,
            mcs: 7,
            freq_mhz: 5180,
            ..PhyStats::default()
        }
    }

    fn desc(decap: DecapFormat, first: bool, last: bool) -> RxDesc {
        RxDesc {
            decap,
            first_msdu: first,
            last_msdu: last,
            phy: first.then(phy),
            ..RxDesc::default()
        }
    }

    fn qos_header() -> Vec<u8> {
        let fcv = fc::TYPE_DATA | fc::SUBTYPE_QOS | fc::FROM_DS;
        let mut hdr = vec![0u8; ieee80211::hdr_len(fcv)];
        hdr[..2].copy_from_slice(&fcv.to_le_bytes());
        hdr[4..10].copy_from_slice(&DA);
        hdr
    }

    fn eth_frame(payload: &[u8], headroom: usize) -> RxBuf {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&DA);
        bytes.extend_from_slice(&SA);
        bytes.extend_from_slice(&[0x08, 0x00]);
        bytes.extend_from_slice(payload);
        RxBuf::from_slice_with_headroom(&bytes, headroom)
    }

    struct FailAfter(usize);

    impl BufAllocator for FailAfter {
        fn alloc(&mut self, capacity: usize, headroom: usize) -> Result<RxBuf> {
            if self.0 == 0 {
                return Err(Error::OutOfMemory { what: "test buffer" });
            }
            self.0 -= 1;
            RxBuf::try_alloc(capacity, headroom)
        }
    }

    #[test]
    fn test_raw_unit_trims_fcs_and_moves_buffers() {
        let mut q = VecDeque::new();
        q.push_back(Frame::new(RxBuf::from_slice(&[1; 30]), desc(DecapFormat::Raw, true, false)));
        q.push_back(Frame::new(RxBuf::from_slice(&[2; 10]), desc(DecapFormat::Raw, false, true)));
        q.push_back(Frame::new(RxBuf::from_slice(&[3; 5]), desc(DecapFormat::Raw, true, true)));

        let mut r = MonitorReassembler::new(MonitorConfig::default());
        let out = r.reassemble(&mut q).unwrap();

        assert_eq!(out.len(), 36);
        assert_eq!(out.ext.len(), 1);
        assert_eq!(out.ext[0].len(), 6);
        assert_eq!(out.phy.rssi_comb, -42);
        assert_eq!(q.len(), 1);
        assert_eq!(r.stats().raw_units, 1);
    }

    #[test]
    fn test_raw_fcs_straddles_buffers() {
        let mut q = VecDeque::new();
        q.push_back(Frame::new(RxBuf::from_slice(&[1; 20]), desc(DecapFormat::Raw, true, false)));
        q.push_back(Frame::new(RxBuf::from_slice(&[2; 2]), desc(DecapFormat::Raw, false, true)));

        let out = MonitorReassembler::new(MonitorConfig::default())
            .reassemble(&mut q)
            .unwrap();
        assert_eq!(out.head.len(), 18);
        assert_eq!(out.ext[0].len(), 0);
    }

    #[test]
    fn test_raw_copy_failure_leaves_queue_intact() {
        let mut q = VecDeque::new();
        q.push_back(Frame::new(RxBuf::from_slice(&[1; 30]), desc(DecapFormat::Raw, true, false)));
        q.push_back(Frame::new(RxBuf::from_slice(&[2; 10]), desc(DecapFormat::Raw, false, true)));

        let config = MonitorConfig {
            copy_raw_fragments: true,
            ..MonitorConfig::default()
        };
        let mut r = MonitorReassembler::with_allocator(config, FailAfter(1));
        let err = r.reassemble(&mut q).unwrap_err();

        assert!(matches!(err, Error::OutOfMemory { .. }));
        assert_eq!(q.len(), 2);
        assert_eq!(q[0].buf.len(), 30);
        assert_eq!(r.stats().failures, 1);
    }

    #[test]
    fn test_ethernet_single_msdu_gets_snap() {
        let mut first = desc(DecapFormat::EthernetII, true, true);
        first.hdr_status = qos_header();
        let mut q = VecDeque::new();
        q.push_back(Frame::new(eth_frame(&[0xEE; 20], 32), first));

        let out = MonitorReassembler::new(MonitorConfig::default())
            .reassemble(&mut q)
            .unwrap();

        assert!(!out.amsdu);
        assert_eq!(out.head.data(), qos_header().as_slice());
        let body = out.ext[0].data();
        assert_eq!(&body[..6], &RFC1042_HEADER);
        assert_eq!(&body[6..8], &[0x08, 0x00]);
        assert_eq!(body.len(), LLC_SNAP_LEN + 20);
        assert_eq!(out.len(), 26 + 8 + 20);
    }

    #[test]
    fn test_ethernet_amsdu_subframes_are_padded() {
        let mut first = desc(DecapFormat::EthernetII, true, false);
        first.hdr_status = qos_header();
        let mut q = VecDeque::new();
        q.push_back(Frame::new(eth_frame(&[0x11; 3], 64), first));
        let last = desc(DecapFormat::EthernetII, false, true);
        q.push_back(Frame::new(eth_frame(&[0x22; 4], 64), last));

        let out = MonitorReassembler::new(MonitorConfig::default())
            .reassemble(&mut q)
            .unwrap();

        assert!(out.amsdu);
        let off = ieee80211::qos_ctl_offset(ieee80211::frame_control(out.head.data())).unwrap();
        assert_ne!(out.head.data()[off] & ieee80211::QOS_CTL_AMSDU_PRESENT, 0);

        // First: 14 (sub-frame hdr) + 8 (snap) + 3 = 25 bytes, no padding.
        let sub0 = out.ext[0].data();
        assert_eq!(sub0.len(), 25);
        assert_eq!(&sub0[..6], &DA);
        assert_eq!(&sub0[6..12], &SA);
        assert_eq!(u16::from_be_bytes([sub0[12], sub0[13]]), 11);

        // Second: 3 bytes of padding to round 25 up to 28.
        let sub1 = out.ext[1].data();
        assert_eq!(&sub1[..3], &[0, 0, 0]);
        assert_eq!(u16::from_be_bytes([sub1[15], sub1[16]]), 12);
        assert_eq!(sub1.len(), 3 + 14 + 8 + 4);
    }

    #[test]
    fn test_ieee8023_strips_without_snap() {
        let mut first = desc(DecapFormat::Ieee8023, true, true);
        first.hdr_status = qos_header();
        let mut q = VecDeque::new();
        q.push_back(Frame::new(eth_frame(&[0x33; 10], 0), first));

        let out = MonitorReassembler::new(MonitorConfig::default())
            .reassemble(&mut q)
            .unwrap();
        assert_eq!(out.ext[0].data(), &[0x33; 10]);
    }

    #[test]
    fn test_native_wifi_strips_80211_header() {
        let mut first = desc(DecapFormat::NativeWifi, true, true);
        first.hdr_status = qos_header();
        let fcv = fc::TYPE_DATA;
        let mut bytes = vec![0u8; ieee80211::hdr_len(fcv)];
        bytes[..2].copy_from_slice(&fcv.to_le_bytes());
        bytes.extend_from_slice(&[0x44; 12]);

        let mut q = VecDeque::new();
        q.push_back(Frame::new(RxBuf::from_slice(&bytes), first));
        let out = MonitorReassembler::new(MonitorConfig::default())
            .reassemble(&mut q)
            .unwrap();
        assert_eq!(out.ext[0].data(), &[0x44; 12]);
    }

    #[test]
    fn test_missing_headroom_copies_fragment() {
        let mut first = desc(DecapFormat::EthernetII, true, false);
        first.hdr_status = qos_header();
        let mut q = VecDeque::new();
        q.push_back(Frame::new(eth_frame(&[0x55; 8], 0), first));
        let last = desc(DecapFormat::EthernetII, false, true);
        q.push_back(Frame::new(eth_frame(&[0x66; 8], 0), last));

        let mut r = MonitorReassembler::new(MonitorConfig::default());
        let out = r.reassemble(&mut q).unwrap();

        assert_eq!(r.stats().copied_fragments, 2);
        assert_eq!(out.ext[0].len(), 14 + 8 + 8);
        // 30 rounds up to 32.
        assert_eq!(out.ext[1].len(), 2 + 14 + 8 + 8);
    }

    #[test]
    fn test_decap_allocation_failure_leaves_queue_intact() {
        let mut first = desc(DecapFormat::EthernetII, true, false);
        first.hdr_status = qos_header();
        let mut q = VecDeque::new();
        q.push_back(Frame::new(eth_frame(&[0x55; 8], 0), first));
        let last = desc(DecapFormat::EthernetII, false, true);
        q.push_back(Frame::new(eth_frame(&[0x66; 8], 0), last));

        // Header and first copy succeed, the second copy fails.
        let mut r = MonitorReassembler::with_allocator(MonitorConfig::default(), FailAfter(2));
        assert!(r.reassemble(&mut q).is_err());
        assert_eq!(q.len(), 2);
        assert_eq!(q[1].buf.len(), ETH_HLEN + 8);
    }

    #[test]
    fn test_oversized_amsdu_subframe_is_rejected() {
        let mut first = desc(DecapFormat::EthernetII, true, false);
        first.hdr_status = qos_header();
        let mut q = VecDeque::new();
        q.push_back(Frame::new(eth_frame(&vec![0x77; 70_000], 64), first));
        let last = desc(DecapFormat::EthernetII, false, true);
        q.push_back(Frame::new(eth_frame(&[0x66; 8], 64), last));

        let mut r = MonitorReassembler::new(MonitorConfig::default());
        assert!(matches!(r.reassemble(&mut q), Err(Error::MalformedCapture(_))));
        assert_eq!(q.len(), 2);
        assert_eq!(q[0].buf.len(), ETH_HLEN + 70_000);
    }

    #[test]
    fn test_validation_errors() {
        let mut r = MonitorReassembler::new(MonitorConfig::default());

        let mut q = VecDeque::new();
        assert!(matches!(r.reassemble(&mut q), Err(Error::EmptyCapture)));

        q.push_back(Frame::new(RxBuf::from_slice(&[0; 8]), desc(DecapFormat::Raw, true, false)));
        assert!(matches!(
            r.reassemble(&mut q),
            Err(Error::TruncatedCapture { fragments: 1 })
        ));

        q.clear();
        q.push_back(Frame::new(RxBuf::from_slice(&[0; 8]), desc(DecapFormat::Raw, false, true)));
        assert!(matches!(r.reassemble(&mut q), Err(Error::MalformedCapture(_))));

        q.clear();
        q.push_back(Frame::new(RxBuf::from_slice(&[0; 8]), desc(DecapFormat::Raw, true, false)));
        q.push_back(Frame::new(eth_frame(&[], 0), desc(DecapFormat::EthernetII, false, true)));
        assert!(matches!(r.reassemble(&mut q), Err(Error::MalformedCapture(_))));

        q.clear();
        q.push_back(Frame::new(eth_frame(&[], 0), desc(DecapFormat::EthernetII, true, true)));
        assert!(matches!(r.reassemble(&mut q), Err(Error::MalformedCapture(_))));

        assert_eq!(r.stats().failures, 5);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_to_contiguous_concatenates() {
        let mut q = VecDeque::new();
        q.push_back(Frame::new(RxBuf::from_slice(&[1, 2, 3]), desc(DecapFormat::Raw, true, false)));
        let last = desc(DecapFormat::Raw, false, true);
        q.push_back(Frame::new(RxBuf::from_slice(&[4, 5, 0, 0, 0, 0]), last));

        let out = MonitorReassembler::new(MonitorConfig::default())
            .reassemble(&mut q)
            .unwrap();
        assert_eq!(out.to_contiguous(), vec![1, 2, 3, 4, 5]);
    }
}
