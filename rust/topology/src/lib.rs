// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # VecMesh Topology
//!
//! Editable 2D polygon-mesh topology for vector art.
//!
//! A [`Mesh`] holds one or more [`Frame`]s. Each frame stores vertices and
//! faces (vertex index cycles, counter-clockwise) in index-addressed arrays;
//! edges are derived from the faces and fully rebuilt after every structural
//! edit. Edges may carry a rational quadratic Bézier [`Curve`], which is kept
//! across rebuilds by keying it on the quantized endpoint positions.
//!
//! Editing operations (create/split/dissolve/extrude/duplicate, transforms,
//! bone weights) are methods on [`Frame`]. They validate everything before
//! mutating, so an `Err` leaves the frame untouched.
//!
//! ## Output
//!
//! Faces are ear-clipped into a [`RenderMesh`] (or any [`MeshBuilder`]) with
//! curved edges flattened. Meshes load and save in a line-oriented text
//! format and a JSON snapshot.

pub mod adjacency;
pub mod config;
pub mod construction;
pub mod dissolve;
pub mod error;
pub mod format;
pub mod frame;
pub mod geometry;
pub mod keys;
pub mod mesh;
pub mod query;
pub mod render;
pub mod selection;
pub mod serialization;
pub mod transform;
pub mod triangulate;
pub mod weights;

pub use adjacency::{AdjacencyStats, CurveSnapshot};
pub use config::EngineConfig;
pub use dissolve::DissolveOutcome;
pub use error::{Error, Result};
pub use frame::{EdgeData, FaceData, Frame, PendingCurve, VertexData, VertexWeight};
pub use geometry::{Curve, Vec2};
pub use hit_test::EdgeHit;
pub use keys::{EdgePositionKey, PositionKey};
pub use mesh::Mesh;
pub use query::Bounds;
pub use render::{MeshBuilder, MeshVertex, RenderMesh};
pub use selection::SelectionMode;
pub use serialization::MeshSnapshot;
pub use triangulate::RenderParams;
