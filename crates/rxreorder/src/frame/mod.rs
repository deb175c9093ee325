// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receive buffers, descriptors and frame chains.
//!
//! | Type | Role |
//! |------|------|
//! | [`RxBuf`] | Byte buffer with headroom for header surgery |
//! | [`RxDesc`] | Embedded receive descriptor (seq, decap, PHY, security) |
//! | [`Frame`] | Buffer + descriptor, exclusively owned |
//! | [`FrameChain`] | Ordered owned list of frames |
//! | [`BufAllocator`] | Fallible buffer source for mid-flight allocation |

mod buf;
mod chain;
mod desc;

pub use buf::{BufAllocator, HeapAllocator, RxBuf};
pub use chain::{Frame, FrameChain};
pub use desc::{Bandwidth, DecapFormat, PhyStats, RxDesc, SecurityInfo};
