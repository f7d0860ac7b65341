// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame storage: the authoritative vertex and face arrays of one key pose.
//!
//! A [`Frame`] owns its vertices and faces in index-addressed arrays bounded
//! by the [`EngineConfig`] capacities. Edges are derived: they are rebuilt
//! from the faces by [`Frame::rebuild_adjacency`](crate::adjacency) and never
//! edited in place. Face cycles reference vertices by index, so removing a
//! vertex renumbers every later one.
//!
//! ## Derived data
//!
//! `VertexData::edge_normal`, `VertexData::ref_count`, every [`EdgeData`],
//! `FaceData::center` and `FaceData::island` are recomputed on each rebuild.
//! Writes to them are overwritten.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::config::{EngineConfig, MAX_BONES, MAX_VERTEX_WEIGHTS};
use crate::error::{Error, Result};
use crate::geometry::{Curve, Vec2};
use crate::render::{OutlineCache, RenderMesh};

/// Vertex cycle of a face.
pub type FaceVertices = SmallVec<[usize; 8]>;

/// One bone influence. A slot with weight `<= EPSILON` is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VertexWeight {
    pub bone: u8,
    pub weight: f32,
}

/// Data stored for a vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    pub position: Vec2,
    pub weights: [VertexWeight; MAX_VERTEX_WEIGHTS],
    pub selected: bool,
    /// Normalized sum of the outward normals of adjacent boundary edges (derived).
    pub edge_normal: Vec2,
    /// Number of edges touching this vertex (derived).
    pub ref_count: usize,
}

impl VertexData {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            weights: [VertexWeight::default(); MAX_VERTEX_WEIGHTS],
            selected: false,
            edge_normal: Vec2::zeros(),
            ref_count: 0,
        }
    }
}

/// Derived edge between two vertices, `v0 < v1`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeData {
    pub v0: usize,
    pub v1: usize,
    /// Owning faces in ascending order; only the first `face_count` are valid.
    pub faces: [usize; 2],
    pub face_count: usize,
    /// Outward normal, meaningful for boundary edges.
    pub normal: Vec2,
    pub curve: Curve,
    pub selected: bool,
}

impl EdgeData {
    /// Owning faces as a slice.
    pub fn face_indices(&self) -> &[usize] {
        &self.faces[..self.face_count]
    }

    /// Returns `true` if exactly one face owns the edge.
    pub fn is_boundary(&self) -> bool {
        self.face_count == 1
    }

    /// Returns `true` if the same face is on both sides.
    pub fn is_slit(&self) -> bool {
        self.face_count == 2 && self.faces[0] == self.faces[1]
    }

    /// Returns `true` if `v` is one of the endpoints.
    pub fn touches(&self, v: usize) -> bool {
        self.v0 == v || self.v1 == v
    }
}

/// Data stored for a face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceData {
    /// Vertex cycle; CCW winding faces outward.
    pub vertices: FaceVertices,
    /// Palette color index.
    pub color: u8,
    pub opacity: f32,
    /// Legacy lighting normal; zero when unused.
    pub normal: Vec2,
    pub selected: bool,
    /// Area-weighted centroid (derived).
    pub center: Vec2,
    /// Connected-component label: the representative face index (derived).
    pub island: usize,
}

impl FaceData {
    pub fn new(vertices: impl IntoIterator<Item = usize>, color: u8) -> Self {
        Self {
            vertices: vertices.into_iter().collect(),
            color,
            opacity: 1.0,
            normal: Vec2::zeros(),
            selected: false,
            center: Vec2::zeros(),
            island: 0,
        }
    }

    /// Number of vertices in the cycle.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Position of `v` in the cycle.
    pub fn position_of(&self, v: usize) -> Option<usize> {
        self.vertices.iter().position(|&fv| fv == v)
    }

    /// Consecutive `(from, to)` vertex pairs around the cycle.
    pub fn edge_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Position `i` such that `(vertices[i], vertices[i + 1])` is the edge `a-b` in either direction.
    pub fn edge_position(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_pairs()
            .position(|(p, q)| (p == a && q == b) || (p == b && q == a))
    }
}

/// Curve queued by vertex pair, applied by the next adjacency rebuild.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingCurve {
    pub v0: usize,
    pub v1: usize,
    pub curve: Curve,
}

/// One animation frame of a mesh.
#[derive(Debug, Clone)]
pub struct Frame {
    pub(crate) config: EngineConfig,
    pub(crate) vertices: Vec<VertexData>,
    pub(crate) faces: Vec<FaceData>,
    pub(crate) edges: Vec<EdgeData>,
    pub(crate) edge_lookup: FxHashMap<(usize, usize), usize>,
    pub(crate) pending_curves: Vec<PendingCurve>,
    pub(crate) bone_count: usize,
    pub(crate) island_count: usize,
    /// Number of ticks this frame is held during playback.
    pub hold: u32,
    pub(crate) render_cache: Option<RenderMesh>,
    pub(crate) outline_cache: Option<OutlineCache>,
}

impl Frame {
    /// Creates an empty frame with the default capacities.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an empty frame with explicit capacities.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            vertices: Vec::new(),
            faces: Vec::new(),
            edges: Vec::new(),
            edge_lookup: FxHashMap::default(),
            pending_curves: Vec::new(),
            bone_count: 0,
            island_count: 0,
            hold: 0,
            render_cache: None,
            outline_cache: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Copy of this frame without cached render meshes.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.mark_dirty();
        copy
    }

    // --- Vertices ---

    pub fn vertices(&self) -> &[VertexData] {
        &self.vertices
    }

    pub fn vertex(&self, index: usize) -> Option<&VertexData> {
        self.vertices.get(index)
    }

    /// Mutable access to a vertex.
    ///
    /// Moving vertices changes edge normals and centroids; call
    /// [`Frame::rebuild_adjacency`] once the batch of moves is done.
    pub fn vertex_mut(&mut self, index: usize) -> Option<&mut VertexData> {
        self.mark_dirty();
        self.vertices.get_mut(index)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn position(&self, index: usize) -> Option<Vec2> {
        self.vertices.get(index).map(|v| v.position)
    }

    /// Appends a loose vertex.
    pub fn add_vertex(&mut self, position: Vec2) -> Result<usize> {
        self.ensure_vertex_capacity(1)?;
        self.vertices.push(VertexData::new(position));
        self.mark_dirty();
        Ok(self.vertices.len() - 1)
    }

    // --- Faces ---

    pub fn faces(&self) -> &[FaceData] {
        &self.faces
    }

    pub fn face(&self, index: usize) -> Option<&FaceData> {
        self.faces.get(index)
    }

    /// Mutable access to face attributes.
    ///
    /// Changing the vertex cycle through this handle requires a rebuild.
    pub fn face_mut(&mut self, index: usize) -> Option<&mut FaceData> {
        self.mark_dirty();
        self.faces.get_mut(index)
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Appends a face over existing vertices and rebuilds adjacency.
    ///
    /// Fails without touching the frame if an edge of the cycle already has
    /// two faces or the new edges would not fit.
    pub fn add_face(&mut self, vertices: &[usize], color: u8) -> Result<usize> {
        check_cycle(vertices)?;
        self.check_new_edges(vertices)?;
        let index = self.push_face(FaceData::new(vertices.iter().copied(), color))?;
        self.rebuild_adjacency();
        Ok(index)
    }

    /// Validates and appends a face without rebuilding.
    pub(crate) fn push_face(&mut self, face: FaceData) -> Result<usize> {
        self.ensure_face_capacity(1)?;
        if face.len() > self.config.max_face_vertices {
            return Err(Error::FaceVertexCapacity(self.config.max_face_vertices));
        }
        if let Some(&bad) = face.vertices.iter().find(|&&v| v >= self.vertices.len()) {
            return Err(Error::VertexOutOfRange(bad));
        }
        check_cycle(&face.vertices)?;
        self.faces.push(face);
        self.mark_dirty();
        Ok(self.faces.len() - 1)
    }

    /// Positions of a face's vertex cycle.
    pub fn face_positions(&self, index: usize) -> Option<Vec<Vec2>> {
        let face = self.faces.get(index)?;
        face.vertices
            .iter()
            .map(|&v| self.position(v))
            .collect()
    }

    // --- Edges (derived) ---

    pub fn edges(&self) -> &[EdgeData] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> Option<&EdgeData> {
        self.edges.get(index)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Sets the selection flag of an edge. Edge flags do not survive a rebuild
    /// unless re-derived from vertex selection.
    pub fn set_edge_selected(&mut self, index: usize, selected: bool) -> Result<()> {
        let edge = self
            .edges
            .get_mut(index)
            .ok_or(Error::EdgeOutOfRange(index))?;
        edge.selected = selected;
        Ok(())
    }

    /// Curves queued for the next rebuild.
    pub fn pending_curves(&self) -> &[PendingCurve] {
        &self.pending_curves
    }

    /// Queues a curve for the edge `v0-v1`, applied by the next rebuild.
    pub fn queue_curve(&mut self, v0: usize, v1: usize, curve: Curve) {
        self.pending_curves.push(PendingCurve { v0, v1, curve });
    }

    /// Distinct bones referenced by vertex weights, as of the last rebuild.
    pub fn bone_count(&self) -> usize {
        self.bone_count
    }

    /// Returns `true` if any vertex carries a bone weight.
    pub fn is_skinned(&self) -> bool {
        self.bone_count > 0
    }

    /// Number of connected face groups, as of the last rebuild.
    pub fn island_count(&self) -> usize {
        self.island_count
    }

    // --- Caches ---

    /// Drops cached render and outline meshes.
    pub fn mark_dirty(&mut self) {
        self.render_cache = None;
        self.outline_cache = None;
    }

    pub fn is_dirty(&self) -> bool {
        self.render_cache.is_none()
    }

    // --- Capacity checks ---

    pub(crate) fn ensure_vertex_capacity(&self, additional: usize) -> Result<()> {
        if self.vertices.len() + additional > self.config.max_vertices {
            return Err(Error::VertexCapacity(self.config.max_vertices));
        }
        Ok(())
    }

    pub(crate) fn ensure_face_capacity(&self, additional: usize) -> Result<()> {
        if self.faces.len() + additional > self.config.max_faces {
            return Err(Error::FaceCapacity(self.config.max_faces));
        }
        Ok(())
    }

    pub(crate) fn check_vertex(&self, index: usize) -> Result<()> {
        if index < self.vertices.len() {
            Ok(())
        } else {
            Err(Error::VertexOutOfRange(index))
        }
    }

    pub(crate) fn check_face(&self, index: usize) -> Result<()> {
        if index < self.faces.len() {
            Ok(())
        } else {
            Err(Error::FaceOutOfRange(index))
        }
    }

    pub(crate) fn check_edge(&self, index: usize) -> Result<&EdgeData> {
        self.edges.get(index).ok_or(Error::EdgeOutOfRange(index))
    }

    /// Checks that a new face walking `cycle` keeps every edge manifold and
    /// fits the edge capacity. Edges repeated within the cycle count once.
    pub(crate) fn check_new_edges(&self, cycle: &[usize]) -> Result<()> {
        let n = cycle.len();
        let mut added: SmallVec<[(usize, usize); 8]> = SmallVec::new();
        for i in 0..n {
            let (a, b) = (cycle[i], cycle[(i + 1) % n]);
            match self.edge_between(a, b) {
                Some(edge) if self.edges[edge].face_count >= 2 => {
                    return Err(Error::NonManifoldEdge(a, b));
                }
                Some(_) => {}
                None => {
                    let key = (a.min(b), a.max(b));
                    if !added.contains(&key) {
                        added.push(key);
                    }
                }
            }
        }
        if self.edges.len() + added.len() > self.config.max_edges {
            return Err(Error::EdgeCapacity(self.config.max_edges));
        }
        Ok(())
    }

    pub(crate) fn check_bone(bone: usize) -> Result<()> {
        if bone < MAX_BONES {
            Ok(())
        } else {
            Err(Error::BoneOutOfRange(bone))
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects cycles that cannot bound a face: fewer than three distinct
/// vertices, or a vertex followed by itself (the last one wraps to the first).
pub(crate) fn check_cycle(cycle: &[usize]) -> Result<()> {
    let n = cycle.len();
    if n < 3 {
        return Err(Error::NotEnoughVertices(n));
    }
    if let Some(i) = (0..n).find(|&i| cycle[i] == cycle[(i + 1) % n]) {
        return Err(Error::RepeatedVertex(cycle[i]));
    }
    let mut distinct: SmallVec<[usize; 8]> = cycle.iter().copied().collect();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < 3 {
        return Err(Error::NotEnoughVertices(distinct.len()));
    }
    Ok(())
}
