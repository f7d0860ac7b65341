// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON serialization for meshes.
//!
//! Only persisted data is written: vertex positions and weights, face
//! cycles and attributes, curves by vertex pair, frame holds and the
//! mesh-wide settings. Edges and every other derived field are rebuilt on
//! load, the same way the text loader finalizes a frame.

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, MAX_BONES, MAX_DEPTH, MAX_VERTEX_WEIGHTS, MIN_DEPTH};
use crate::error::{Error, Result};
use crate::frame::{FaceData, Frame, VertexData, VertexWeight};
use crate::geometry::{Curve, Vec2, EPSILON};
use crate::mesh::Mesh;

/// Serializable representation of a whole mesh.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub depth: i32,
    pub palette: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub skeleton: Option<String>,
    pub frames: Vec<FrameSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FrameSnapshot {
    #[serde(default)]
    pub hold: u32,
    pub vertices: Vec<VertexSnapshot>,
    pub faces: Vec<FaceSnapshot>,
    #[serde(default)]
    pub curves: Vec<EdgeCurveSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VertexSnapshot {
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub weights: Vec<WeightSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeightSnapshot {
    pub bone: u8,
    pub weight: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FaceSnapshot {
    pub vertices: Vec<usize>,
    pub color: u8,
    #[serde(default = "full_opacity")]
    pub opacity: f32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub normal: Option<[f32; 2]>,
}

/// Curve of the edge between two vertices.
#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeCurveSnapshot {
    pub v0: usize,
    pub v1: usize,
    pub curve: Curve,
}

fn full_opacity() -> f32 {
    1.0
}

impl Mesh {
    /// Serializes the mesh to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        let snapshot = self.to_snapshot();
        serde_json::to_string_pretty(&snapshot).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Creates a serializable snapshot of the mesh.
    pub fn to_snapshot(&self) -> MeshSnapshot {
        MeshSnapshot {
            depth: self.depth,
            palette: self.palette,
            skeleton: self.skeleton.clone(),
            frames: self.frames.iter().map(frame_snapshot).collect(),
        }
    }

    /// Deserializes a mesh from a JSON string with default capacities.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_config(json, EngineConfig::default())
    }

    pub fn from_json_with_config(json: &str, config: EngineConfig) -> Result<Self> {
        let snapshot: MeshSnapshot =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::from_snapshot(&snapshot, config)
    }

    /// Reconstructs a mesh from a snapshot, rebuilding every frame's edges.
    pub fn from_snapshot(snap: &MeshSnapshot, config: EngineConfig) -> Result<Self> {
        if snap.frames.len() > config.max_frames {
            return Err(Error::FrameCapacity(config.max_frames));
        }

        let frames = snap
            .frames
            .iter()
            .map(|fs| restore_frame(fs, config))
            .collect::<Result<Vec<_>>>()?;

        let mut mesh = Mesh::from_frames(config, frames);
        mesh.depth = snap.depth.clamp(MIN_DEPTH, MAX_DEPTH);
        mesh.palette = snap.palette;
        mesh.skeleton = snap.skeleton.clone();
        Ok(mesh)
    }
}

fn frame_snapshot(frame: &Frame) -> FrameSnapshot {
    let vertices = frame
        .vertices()
        .iter()
        .map(|v| VertexSnapshot {
            x: v.position.x,
            y: v.position.y,
            weights: v
                .weights
                .iter()
                .filter(|w| w.weight > EPSILON)
                .map(|w| WeightSnapshot {
                    bone: w.bone,
                    weight: w.weight,
                })
                .collect(),
        })
        .collect();

    let faces = frame
        .faces()
        .iter()
        .map(|f| FaceSnapshot {
            vertices: f.vertices.to_vec(),
            color: f.color,
            opacity: f.opacity,
            normal: (f.normal.norm_squared() > 0.0).then(|| [f.normal.x, f.normal.y]),
        })
        .collect();

    let curves = frame
        .edges()
        .iter()
        .filter(|e| e.curve.is_curved())
        .map(|e| EdgeCurveSnapshot {
            v0: e.v0,
            v1: e.v1,
            curve: e.curve,
        })
        .collect();

    FrameSnapshot {
        hold: frame.hold,
        vertices,
        faces,
        curves,
    }
}

fn restore_frame(snap: &FrameSnapshot, config: EngineConfig) -> Result<Frame> {
    let mut frame = Frame::with_config(config);
    frame.hold = snap.hold;

    frame.ensure_vertex_capacity(snap.vertices.len())?;
    for vs in &snap.vertices {
        let mut vertex = VertexData::new(Vec2::new(vs.x, vs.y));
        for (slot, ws) in vs.weights.iter().take(MAX_VERTEX_WEIGHTS).enumerate() {
            if usize::from(ws.bone) >= MAX_BONES {
                return Err(Error::BoneOutOfRange(usize::from(ws.bone)));
            }
            vertex.weights[slot] = VertexWeight {
                bone: ws.bone,
                weight: ws.weight.clamp(0.0, 1.0),
            };
        }
        frame.vertices.push(vertex);
    }

    for fs in &snap.faces {
        let mut face = FaceData::new(fs.vertices.iter().copied(), fs.color);
        face.opacity = fs.opacity.clamp(0.0, 1.0);
        if let Some([x, y]) = fs.normal {
            face.normal = Vec2::new(x, y);
        }
        frame.push_face(face)?;
    }

    for cs in &snap.curves {
        frame.queue_curve(cs.v0, cs.v1, cs.curve);
    }
    frame.rebuild_adjacency();
    Ok(frame)
}
