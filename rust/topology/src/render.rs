// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Render mesh output.
//!
//! The triangulator writes into a [`MeshBuilder`]; GPU upload belongs to the
//! host. [`RenderMesh`] is the in-crate builder used for the per-frame caches.

use crate::config::MAX_VERTEX_WEIGHTS;
use crate::geometry::{cross, Vec2};
use crate::query::Bounds;

/// Vertex emitted by the triangulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshVertex {
    pub position: Vec2,
    /// Draw depth in `[0.01, 1]`.
    pub depth: f32,
    pub opacity: f32,
    /// `(color, palette)` lookup into the palette texture.
    pub uv: Vec2,
    pub normal: Vec2,
    pub bone_indices: [u8; MAX_VERTEX_WEIGHTS],
    pub bone_weights: [f32; MAX_VERTEX_WEIGHTS],
}

impl MeshVertex {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            depth: 0.0,
            opacity: 1.0,
            uv: Vec2::zeros(),
            normal: Vec2::zeros(),
            bone_indices: [0; MAX_VERTEX_WEIGHTS],
            bone_weights: [0.0; MAX_VERTEX_WEIGHTS],
        }
    }
}

/// Sink for triangulated geometry.
pub trait MeshBuilder {
    /// Number of vertices added so far.
    fn vertex_count(&self) -> usize;

    fn add_vertex(&mut self, vertex: MeshVertex);

    /// Adds a triangle over previously added vertices.
    fn add_triangle(&mut self, a: u16, b: u16, c: u16);
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderMesh {
    pub vertices: Vec<MeshVertex>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u16>,
}

impl RenderMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(index_count),
        }
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Triangles as vertex index triples.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }

    /// Sum of signed triangle areas.
    pub fn signed_area(&self) -> f32 {
        self.triangles()
            .map(|[a, b, c]| {
                let pa = self.vertices[a].position;
                let pb = self.vertices[b].position;
                let pc = self.vertices[c].position;
                cross(pb - pa, pc - pa) * 0.5
            })
            .sum()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.vertices.iter().map(|v| v.position))
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }
}

impl MeshBuilder for RenderMesh {
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn add_vertex(&mut self, vertex: MeshVertex) {
        self.vertices.push(vertex);
    }

    fn add_triangle(&mut self, a: u16, b: u16, c: u16) {
        self.indices.extend_from_slice(&[a, b, c]);
    }
}

/// Cached outline mesh and the view zoom version it was built for.
#[derive(Debug, Clone)]
pub struct OutlineCache {
    pub mesh: RenderMesh,
    pub zoom_version: u64,
}
