// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receive buffer with headroom, in the socket-buffer mould.
//!
//! Layout: `[ headroom | data (len) | tailroom ]`. Restitching pulls
//! hardware decap headers off the front and pushes 802.11 encapsulation back
//! into the reclaimed headroom, so both ends must be cheap.

use std::fmt;
use std::ops::Deref;

use crate::error::{Error, Result};

/// Owned receive buffer.
///
/// Not `Clone`: duplicating a buffer is an explicit, fallible allocation
/// ([`RxBuf::try_copy`]).
pub struct RxBuf {
    /// `[0..head]` headroom, `[head..head+len]` data, rest tailroom.
    storage: Vec<u8>,
    head: usize,
    len: usize,
}

impl RxBuf {
    /// Allocate `capacity` bytes with `headroom` reserved in front.
    ///
    /// Uses `try_reserve_exact`, so exhaustion surfaces as
    /// [`Error::OutOfMemory`] instead of aborting.
    pub fn try_alloc(capacity: usize, headroom: usize) -> Result<Self> {
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| Error::OutOfMemory {
                what: "receive buffer",
            })?;
        storage.resize(capacity, 0);
        Ok(Self {
            storage,
            head: headroom.min(capacity),
            len: 0,
        })
    }

    /// Wrap `data` with no headroom.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::from_slice_with_headroom(data, 0)
    }

    /// Wrap `data` behind `headroom` spare bytes.
    pub fn from_slice_with_headroom(data: &[u8], headroom: usize) -> Self {
        let mut storage = vec![0u8; headroom + data.len()];
        storage[headroom..].copy_from_slice(data);
        Self {
            storage,
            head: headroom,
            len: data.len(),
        }
    }

    /// Copy the data area into a fresh buffer with `headroom` in front.
    pub fn try_copy(&self, headroom: usize) -> Result<Self> {
        let mut copy = Self::try_alloc(headroom + self.len, headroom)?;
        copy.extend_from_slice(self.data());
        Ok(copy)
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.storage[self.head..self.head + self.len]
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.head..self.head + self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn headroom(&self) -> usize {
        self.head
    }

    #[inline]
    pub fn tailroom(&self) -> usize {
        self.storage.len() - (self.head + self.len)
    }

    /// Grow the data area by `n` bytes at the tail; `None` without tailroom.
    pub fn put(&mut self, n: usize) -> Option<&mut [u8]> {
        if self.tailroom() < n {
            return None;
        }
        let start = self.head + self.len;
        self.len += n;
        Some(&mut self.storage[start..start + n])
    }

    /// Append bytes, growing the storage when tailroom runs out.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        if self.tailroom() < bytes.len() {
            let missing = bytes.len() - self.tailroom();
            self.storage.resize(self.storage.len() + missing, 0);
        }
        let start = self.head + self.len;
        self.storage[start..start + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
    }

    /// Consume `n` bytes from the front (clamped to the data length).
    pub fn pull(&mut self, n: usize) {
        let n = n.min(self.len);
        self.head += n;
        self.len -= n;
    }

    /// Claim `n` bytes of headroom; `None` when not enough is left.
    pub fn push(&mut self, n: usize) -> Option<&mut [u8]> {
        if self.head < n {
            return None;
        }
        self.head -= n;
        self.len += n;
        Some(&mut self.storage[self.head..self.head + n])
    }

    /// Prepend `bytes` into the headroom. Returns `false` when it does not fit.
    pub fn push_front(&mut self, bytes: &[u8]) -> bool {
        match self.push(bytes.len()) {
            Some(dst) => {
                dst.copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    /// Shorten the data area to `len` bytes.
    pub fn trim(&mut self, len: usize) {
        self.len = self.len.min(len);
    }
}

impl Deref for RxBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.data()
    }
}

impl fmt::Debug for RxBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RxBuf")
            .field("len", &self.len)
            .field("headroom", &self.head)
            .field("tailroom", &self.tailroom())
            .finish()
    }
}

/// Source of fresh buffers for paths that must allocate mid-flight.
pub trait BufAllocator {
    /// Allocate an empty buffer of `capacity` bytes with `headroom` in front.
    fn alloc(&mut self, capacity: usize, headroom: usize) -> Result<RxBuf>;
}

/// Allocator backed by the global heap (`try_reserve_exact`).
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl BufAllocator for HeapAllocator {
    fn alloc(&mut self, capacity: usize, headroom: usize) -> Result<RxBuf> {
        RxBuf::try_alloc(capacity, headroom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_pull_push() {
        let mut buf = RxBuf::try_alloc(32, 8).unwrap();
        assert_eq!(buf.headroom(), 8);
        assert!(buf.is_empty());

        buf.put(4).unwrap().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(buf.data(), &[1, 2, 3, 4]);

        buf.pull(2);
        assert_eq!(buf.data(), &[3, 4]);
        assert_eq!(buf.headroom(), 10);

        assert!(buf.push_front(&[9, 9]));
        assert_eq!(buf.data(), &[9, 9, 3, 4]);
    }

    #[test]
    fn test_push_without_headroom_fails() {
        let mut buf = RxBuf::from_slice(&[1, 2, 3]);
        assert!(!buf.push_front(&[0]));
        assert_eq!(buf.data(), &[1, 2, 3]);
    }

    #[test]
    fn test_trim_and_extend() {
        let mut buf = RxBuf::from_slice(&[1, 2, 3, 4, 5, 6]);
        buf.trim(4);
        assert_eq!(buf.len(), 4);
        buf.extend_from_slice(&[7, 8]);
        assert_eq!(buf.data(), &[1, 2, 3, 4, 7, 8]);
    }

    #[test]
    fn test_try_copy_compacts_headroom() {
        let mut buf = RxBuf::from_slice_with_headroom(&[5, 6, 7], 2);
        buf.pull(1);
        let copy = buf.try_copy(16).unwrap();
        assert_eq!(copy.data(), &[6, 7]);
        assert_eq!(copy.headroom(), 16);
        assert_eq!(copy.tailroom(), 0);
    }
}
