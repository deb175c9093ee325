// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Frames and owned frame chains.

use super::{RxBuf, RxDesc};
use crate::reorder::SeqNum;

/// One receive buffer plus its descriptor.
///
/// Deliberately not `Clone`: a frame has exactly one owner (producer, reorder
/// slot, delivery chain or discard path) at any time.
#[derive(Debug)]
pub struct Frame {
    pub buf: RxBuf,
    pub desc: RxDesc,
}

impl Frame {
    pub fn new(buf: RxBuf, desc: RxDesc) -> Self {
        Self { buf, desc }
    }

    #[inline]
    pub fn seq_num(&self) -> SeqNum {
        SeqNum::new(self.desc.seq_num)
    }
}

/// Ordered, owned list of frames (one MPDU's sub-frames, or a release batch).
///
/// Appends always go to the tail; delivery order is the insertion order.
#[derive(Debug, Default)]
pub struct FrameChain {
    frames: Vec<Frame>,
}

impl FrameChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(frame: Frame) -> Self {
        Self {
            frames: vec![frame],
        }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Move every frame of `other` onto the tail of `self`.
    pub fn append(&mut self, other: &mut FrameChain) {
        self.frames.append(&mut other.frames);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn first(&self) -> Option<&Frame> {
        self.frames.first()
    }

    /// Sequence number of the head frame.
    pub fn head_seq(&self) -> Option<SeqNum> {
        self.first().map(Frame::seq_num)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// Raw sequence numbers of all frames, in chain order.
    pub fn seq_nums(&self) -> impl Iterator<Item = u16> + '_ {
        self.frames.iter().map(|f| f.desc.seq_num)
    }

    pub fn byte_len(&self) -> usize {
        self.frames.iter().map(|f| f.buf.len()).sum()
    }
}

impl From<Vec<Frame>> for FrameChain {
    fn from(frames: Vec<Frame>) -> Self {
        Self { frames }
    }
}

impl IntoIterator for FrameChain {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a FrameChain {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
