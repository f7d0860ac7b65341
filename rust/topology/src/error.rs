// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for mesh editing and loading.
//!
//! Editing operations check every precondition before touching the frame, so
//! an `Err` always means the frame is unchanged and the caller can abort its
//! undo transaction.

/// Result type alias for mesh operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during mesh operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The vertex array is full.
    #[error("vertex capacity exhausted (max {0})")]
    VertexCapacity(usize),

    /// The face array is full.
    #[error("face capacity exhausted (max {0})")]
    FaceCapacity(usize),

    /// The edge array would overflow.
    #[error("edge capacity exhausted (max {0})")]
    EdgeCapacity(usize),

    /// A face would exceed the per-face vertex limit.
    #[error("face vertex capacity exhausted (max {0})")]
    FaceVertexCapacity(usize),

    /// The frame list is full.
    #[error("frame capacity exhausted (max {0})")]
    FrameCapacity(usize),

    /// A vertex index is outside `[0, vertex_count)`.
    #[error("vertex {0} out of range")]
    VertexOutOfRange(usize),

    /// An edge index is outside `[0, edge_count)`.
    #[error("edge {0} out of range")]
    EdgeOutOfRange(usize),

    /// A face index is outside `[0, face_count)`.
    #[error("face {0} out of range")]
    FaceOutOfRange(usize),

    /// A frame index is outside `[0, frame_count)`.
    #[error("frame {0} out of range")]
    FrameOutOfRange(usize),

    /// An edge between the two vertices already exists.
    #[error("edge between vertices {0} and {1} already exists")]
    EdgeExists(usize, usize),

    /// The operation would give an edge more than two faces.
    #[error("edge between vertices {0} and {1} already has two faces")]
    NonManifoldEdge(usize, usize),

    /// No face contains both vertices at non-adjacent positions.
    #[error("no face can be split between vertices {0} and {1}")]
    NoSharedFace(usize, usize),

    /// Fewer vertices than a face needs.
    #[error("need at least 3 vertices, got {0}")]
    NotEnoughVertices(usize),

    /// A face cycle visits the same vertex twice in a row.
    #[error("face cycle repeats vertex {0} consecutively")]
    RepeatedVertex(usize),

    /// Both sides of the edge belong to the same face.
    #[error("edge {0} is a slit edge and cannot be dissolved")]
    SlitEdge(usize),

    /// The edge is not referenced by any face.
    #[error("edge {0} has no faces")]
    DanglingEdge(usize),

    /// The last remaining frame cannot be removed.
    #[error("cannot delete the only frame")]
    LastFrame,

    /// Nothing is selected for a selection-based operation.
    #[error("nothing selected")]
    EmptySelection,

    /// A bone index is outside `[0, MAX_BONES)`.
    #[error("bone index {0} out of range")]
    BoneOutOfRange(usize),

    /// Malformed text input.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Convenience constructor for parse errors.
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}
