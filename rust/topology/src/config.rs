// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine capacities and tunables.
//!
//! Defaults match the asset format limits. [`EngineConfig::from_env`] lets a
//! host override them through `VECMESH_*` environment variables.

use serde::{Deserialize, Serialize};

/// Maximum number of vertices in a frame.
pub const MAX_VERTICES: usize = 1024;
/// Maximum number of faces in a frame.
pub const MAX_FACES: usize = 256;
/// Maximum number of derived edges in a frame.
pub const MAX_EDGES: usize = 2048;
/// Maximum number of vertices in a single face.
pub const MAX_FACE_VERTICES: usize = 128;
/// Maximum number of animation frames in a mesh.
pub const MAX_FRAMES: usize = 32;
/// Number of bone weight slots per vertex.
pub const MAX_VERTEX_WEIGHTS: usize = 4;
/// Exclusive upper bound for bone indices.
pub const MAX_BONES: usize = 64;
/// Number of palette colors a face can reference.
pub const COLOR_COUNT: usize = 64;
/// Depth range stored on a mesh.
pub const MIN_DEPTH: i32 = 0;
pub const MAX_DEPTH: i32 = 100;

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Vertex capacity per frame.
    pub max_vertices: usize,
    /// Face capacity per frame.
    pub max_faces: usize,
    /// Edge capacity per frame.
    pub max_edges: usize,
    /// Vertex capacity per face.
    pub max_face_vertices: usize,
    /// Frame capacity per mesh.
    pub max_frames: usize,
    /// Line segments used to approximate a curved edge when triangulating and hit testing.
    pub curve_segments: usize,
    /// Outline width relative to the view's reference scale.
    pub outline_width: f32,
    /// Edge hit radius as a fraction of the vertex hit radius.
    pub edge_hit_scale: f32,
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::new();
        Self {
            max_vertices: env_or("VECMESH_MAX_VERTICES", defaults.max_vertices),
            max_faces: env_or("VECMESH_MAX_FACES", defaults.max_faces),
            max_edges: env_or("VECMESH_MAX_EDGES", defaults.max_edges),
            max_face_vertices: env_or("VECMESH_MAX_FACE_VERTICES", defaults.max_face_vertices),
            max_frames: env_or("VECMESH_MAX_FRAMES", defaults.max_frames),
            curve_segments: env_or("VECMESH_CURVE_SEGMENTS", defaults.curve_segments).max(1),
            outline_width: env_or("VECMESH_OUTLINE_WIDTH", defaults.outline_width),
            edge_hit_scale: env_or("VECMESH_EDGE_HIT_SCALE", defaults.edge_hit_scale),
        }
    }

    /// The built-in limits, ignoring the environment.
    pub const fn new() -> Self {
        Self {
            max_vertices: MAX_VERTICES,
            max_faces: MAX_FACES,
            max_edges: MAX_EDGES,
            max_face_vertices: MAX_FACE_VERTICES,
            max_frames: MAX_FRAMES,
            curve_segments: 8,
            outline_width: 0.015,
            edge_hit_scale: 0.75,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
