// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adjacency rebuild.
//!
//! Derives the edge list and all per-vertex/per-face derived fields from the
//! authoritative vertex and face arrays. The rebuild is total and
//! deterministic: the same vertices and faces always produce the same edges
//! in the same order.
//!
//! Edge selection is derived as well: an edge is selected when both of its
//! endpoints are.
//!
//! Curves are the only edge data that is not derivable. They are carried
//! across a rebuild in two ways:
//!
//! - a [`CurveSnapshot`] keyed by quantized endpoint positions, taken before
//!   any mutation that renumbers vertices. Each edge of the old list leaves
//!   one entry, and entries are handed out in edge order, so coincident edges
//!   keep their own curves;
//! - the frame's pending-curve queue, keyed by vertex index, for edges that
//!   did not exist before (e.g. the halves of a deferred edge split).

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::config::MAX_BONES;
use crate::frame::{EdgeData, Frame};
use crate::geometry::{edge_outward_normal, normalize_or_zero, polygon_centroid, Curve, Vec2, EPSILON};
use crate::keys::{edge_vertices, EdgePositionKey};

/// Summary of an adjacency rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdjacencyStats {
    pub edge_count: usize,
    pub island_count: usize,
    pub bone_count: usize,
    /// Edges that did not fit in the edge capacity.
    pub dropped_edges: usize,
    /// Face references ignored because the edge already had two faces.
    pub overfull_edges: usize,
}

impl AdjacencyStats {
    /// Returns `true` if the rebuilt edge list does not describe every face.
    pub fn is_lossy(&self) -> bool {
        self.dropped_edges > 0 || self.overfull_edges > 0
    }
}

/// Curves of the current edge list keyed by endpoint positions.
///
/// Edges sharing endpoint positions keep one entry each, in edge order.
#[derive(Debug, Clone, Default)]
pub struct CurveSnapshot {
    curves: FxHashMap<EdgePositionKey, SmallVec<[Curve; 1]>>,
}

impl CurveSnapshot {
    /// Number of curved edges captured.
    pub fn len(&self) -> usize {
        self.curves
            .values()
            .flatten()
            .filter(|c| c.is_curved())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First captured curve between `p0` and `p1`.
    pub fn get(&self, p0: Vec2, p1: Vec2) -> Option<&Curve> {
        self.curves
            .get(&EdgePositionKey::new(p0, p1))
            .and_then(|entries| entries.first())
            .filter(|c| c.is_curved())
    }

    /// Removes and returns the next captured curve between `p0` and `p1`.
    fn take(&mut self, p0: Vec2, p1: Vec2) -> Option<Curve> {
        let entries = self.curves.get_mut(&EdgePositionKey::new(p0, p1))?;
        if entries.is_empty() {
            return None;
        }
        Some(entries.remove(0))
    }
}

/// Disjoint-set forest over face indices.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            // path halving
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

impl Frame {
    /// Captures every curved edge by its endpoint positions.
    ///
    /// Take the snapshot while edge indices still match the vertex array;
    /// edges that reference missing vertices are skipped.
    pub fn snapshot_curves(&self) -> CurveSnapshot {
        let mut curves: FxHashMap<EdgePositionKey, SmallVec<[Curve; 1]>> = FxHashMap::default();
        for edge in &self.edges {
            let (Some(p0), Some(p1)) = (self.position(edge.v0), self.position(edge.v1)) else {
                continue;
            };
            curves
                .entry(EdgePositionKey::new(p0, p1))
                .or_default()
                .push(edge.curve);
        }
        // keys holding only straight edges restore nothing
        curves.retain(|_, entries| entries.iter().any(|c| c.is_curved()));
        CurveSnapshot { curves }
    }

    /// Rebuilds edges and derived data, keeping curves of edges whose
    /// endpoints did not move.
    pub fn rebuild_adjacency(&mut self) -> AdjacencyStats {
        let snapshot = self.snapshot_curves();
        self.rebuild_adjacency_with(snapshot)
    }

    /// Rebuilds edges and derived data, restoring curves from `snapshot`
    /// and then from the pending-curve queue (which is emptied).
    pub fn rebuild_adjacency_with(&mut self, mut snapshot: CurveSnapshot) -> AdjacencyStats {
        let mut stats = AdjacencyStats::default();

        self.edges.clear();
        self.edge_lookup.clear();
        for vertex in &mut self.vertices {
            vertex.edge_normal = Vec2::zeros();
            vertex.ref_count = 0;
        }

        for face_index in 0..self.faces.len() {
            let center = {
                let positions: Vec<Vec2> = self.faces[face_index]
                    .vertices
                    .iter()
                    .filter_map(|&v| self.position(v))
                    .collect();
                polygon_centroid(&positions)
            };
            self.faces[face_index].center = center;

            let n = self.faces[face_index].vertices.len();
            for i in 0..n {
                let a = self.faces[face_index].vertices[i];
                let b = self.faces[face_index].vertices[(i + 1) % n];
                self.link_edge(a, b, face_index, &mut stats);
            }
        }

        for edge in &mut self.edges {
            let (Some(p0), Some(p1)) = (
                self.vertices.get(edge.v0).map(|v| v.position),
                self.vertices.get(edge.v1).map(|v| v.position),
            ) else {
                continue;
            };
            if let Some(curve) = snapshot.take(p0, p1) {
                edge.curve = curve;
            }
        }

        for pending in std::mem::take(&mut self.pending_curves) {
            match self.edge_lookup.get(&edge_vertices(pending.v0, pending.v1)) {
                Some(&edge_index) => self.edges[edge_index].curve = pending.curve,
                None => tracing::debug!(
                    v0 = pending.v0,
                    v1 = pending.v1,
                    "pending curve has no edge after rebuild"
                ),
            }
        }

        for edge in &self.edges {
            for v in [edge.v0, edge.v1] {
                let vertex = &mut self.vertices[v];
                vertex.ref_count += 1;
                if edge.face_count == 1 {
                    vertex.edge_normal += edge.normal;
                }
            }
        }
        for vertex in &mut self.vertices {
            vertex.edge_normal = normalize_or_zero(vertex.edge_normal);
        }

        self.island_count = self.compute_islands();
        self.bone_count = self.count_bones();

        stats.edge_count = self.edges.len();
        stats.island_count = self.island_count;
        stats.bone_count = self.bone_count;

        if stats.is_lossy() {
            tracing::warn!(
                dropped = stats.dropped_edges,
                overfull = stats.overfull_edges,
                "adjacency rebuild is lossy"
            );
        }
        tracing::trace!(
            edges = stats.edge_count,
            islands = stats.island_count,
            faces = self.faces.len(),
            "rebuilt adjacency"
        );

        stats
    }

    /// Records that `face` walks the edge `a → b`.
    fn link_edge(&mut self, a: usize, b: usize, face: usize, stats: &mut AdjacencyStats) {
        if a >= self.vertices.len() || b >= self.vertices.len() {
            return;
        }

        let key = edge_vertices(a, b);
        if let Some(&edge_index) = self.edge_lookup.get(&key) {
            let edge = &mut self.edges[edge_index];
            if edge.face_count >= 2 {
                stats.overfull_edges += 1;
                return;
            }
            if edge.faces[0] > face {
                edge.faces[1] = edge.faces[0];
                edge.faces[0] = face;
            } else {
                edge.faces[1] = face;
            }
            edge.face_count = 2;
            return;
        }

        if self.edges.len() >= self.config.max_edges {
            stats.dropped_edges += 1;
            return;
        }

        let (va, vb) = (&self.vertices[a], &self.vertices[b]);
        let normal = edge_outward_normal(va.position, vb.position);
        let selected = va.selected && vb.selected;
        self.edge_lookup.insert(key, self.edges.len());
        self.edges.push(EdgeData {
            v0: key.0,
            v1: key.1,
            faces: [face, face],
            face_count: 1,
            normal,
            curve: Curve::straight(),
            selected,
        });
    }

    /// Labels each face with the root of its shared-vertex component.
    fn compute_islands(&mut self) -> usize {
        let mut sets = UnionFind::new(self.faces.len());
        let mut first_face: Vec<Option<usize>> = vec![None; self.vertices.len()];

        for (face_index, face) in self.faces.iter().enumerate() {
            for &v in &face.vertices {
                let Some(slot) = first_face.get_mut(v) else {
                    continue;
                };
                match *slot {
                    Some(first) => sets.union(first, face_index),
                    None => *slot = Some(face_index),
                }
            }
        }

        let mut roots = 0;
        for face_index in 0..self.faces.len() {
            let root = sets.find(face_index);
            if root == face_index {
                roots += 1;
            }
            self.faces[face_index].island = root;
        }
        roots
    }

    pub(crate) fn count_bones(&self) -> usize {
        let mut used = [false; MAX_BONES];
        for vertex in &self.vertices {
            for slot in &vertex.weights {
                if slot.weight > EPSILON && (slot.bone as usize) < MAX_BONES {
                    used[slot.bone as usize] = true;
                }
            }
        }
        used.iter().filter(|&&u| u).count()
    }
}
