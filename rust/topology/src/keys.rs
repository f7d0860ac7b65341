// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Position keys for edge identity across rebuilds.
//!
//! Vertex and edge indices shift whenever a vertex or face is removed, so
//! data attached to an edge (its curve) is carried across a rebuild by a key
//! derived from the quantized endpoint positions instead.

use crate::geometry::Vec2;

/// Quantization resolution for position keys.
pub const POSITION_QUANTUM: f32 = 1e-4;

/// Quantized key for a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey(u64);

impl PositionKey {
    pub fn new(position: Vec2) -> Self {
        let scale = 1.0 / POSITION_QUANTUM;
        let qx = (position.x * scale) as i32 as u32 as u64;
        let qy = (position.y * scale) as i32 as u32 as u64;
        PositionKey((qx << 32) | qy)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Direction-independent key for the edge between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgePositionKey(u64);

impl EdgePositionKey {
    pub fn new(p0: Vec2, p1: Vec2) -> Self {
        let k0 = PositionKey::new(p0).raw();
        let k1 = PositionKey::new(p1).raw();
        let (lo, hi) = if k0 < k1 { (k0, k1) } else { (k1, k0) };
        EdgePositionKey(lo ^ hi.wrapping_mul(31))
    }
}

/// Canonical `(min, max)` vertex index pair for an edge.
#[inline]
pub fn edge_vertices(v0: usize, v1: usize) -> (usize, usize) {
    if v0 < v1 {
        (v0, v1)
    } else {
        (v1, v0)
    }
}
