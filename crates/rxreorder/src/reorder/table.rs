// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Peer -> per-traffic-id reorder windows.

use std::collections::HashMap;

use super::{PeerId, ReorderWindow, Tid};
use crate::config::NUM_TIDS;

/// The 17 windows of one peer (16 QoS + multicast pseudo-id).
#[derive(Debug)]
pub struct PeerTids {
    windows: [ReorderWindow; NUM_TIDS],
}

impl PeerTids {
    fn new() -> Self {
        Self {
            windows: std::array::from_fn(|_| ReorderWindow::idle()),
        }
    }

    #[inline]
    pub fn window(&self, tid: Tid) -> &ReorderWindow {
        &self.windows[tid.index()]
    }

    #[inline]
    pub fn window_mut(&mut self, tid: Tid) -> &mut ReorderWindow {
        &mut self.windows[tid.index()]
    }

    /// Frames still buffered across all traffic ids.
    pub fn occupied(&self) -> usize {
        self.windows.iter().map(ReorderWindow::occupied).sum()
    }
}

/// Reorder state for every attached peer.
#[derive(Debug, Default)]
pub struct PeerTidTable {
    peers: HashMap<PeerId, PeerTids>,
}

impl PeerTidTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `peer` with all windows `Idle`. Returns `false` if already known.
    pub fn attach(&mut self, peer: PeerId) -> bool {
        if self.peers.contains_key(&peer) {
            return false;
        }
        self.peers.insert(peer, PeerTids::new());
        true
    }

    /// Remove `peer`, handing back its windows.
    pub fn detach(&mut self, peer: PeerId) -> Option<PeerTids> {
        self.peers.remove(&peer)
    }

    pub fn contains(&self, peer: PeerId) -> bool {
        self.peers.contains_key(&peer)
    }

    pub fn get(&self, peer: PeerId, tid: Tid) -> Option<&ReorderWindow> {
        self.peers.get(&peer).map(|p| p.window(tid))
    }

    pub fn get_mut(&mut self, peer: PeerId, tid: Tid) -> Option<&mut ReorderWindow> {
        self.peers.get_mut(&peer).map(|p| p.window_mut(tid))
    }

    /// Window of (peer, tid), attaching `peer` first when it is unknown.
    pub fn get_or_attach(&mut self, peer: PeerId, tid: Tid) -> &mut ReorderWindow {
        self.peers
            .entry(peer)
            .or_insert_with(PeerTids::new)
            .window_mut(tid)
    }

    pub fn peer(&self, peer: PeerId) -> Option<&PeerTids> {
        self.peers.get(&peer)
    }

    /// Attached peers, in no particular order.
    pub fn peers(&self) -> impl Iterator<Item = PeerId> + '_ {
        self.peers.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
