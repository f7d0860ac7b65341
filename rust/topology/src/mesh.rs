// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh asset: an ordered list of frames plus mesh-wide render settings.
//!
//! Editing always targets the current frame. [`Mesh::edit`] wraps one editing
//! transaction: on success the mesh is marked modified and atlas-dirty; on
//! error nothing changed and the caller can drop its undo record.

use crate::config::{EngineConfig, MAX_DEPTH, MIN_DEPTH};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::geometry::Vec2;
use crate::render::{OutlineCache, RenderMesh};
use crate::triangulate::RenderParams;

/// An editable polygon mesh with one or more animation frames.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) config: EngineConfig,
    pub(crate) frames: Vec<Frame>,
    pub(crate) current: usize,
    pub(crate) depth: i32,
    pub(crate) palette: u8,
    pub(crate) skeleton: Option<String>,
    position: Vec2,
    atlas: Option<String>,
    modified: bool,
    atlas_dirty: bool,
}

impl Mesh {
    /// Creates a mesh with one empty frame and default capacities.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            frames: vec![Frame::with_config(config)],
            current: 0,
            depth: MIN_DEPTH,
            palette: 0,
            skeleton: None,
            position: Vec2::zeros(),
            atlas: None,
            modified: false,
            atlas_dirty: false,
        }
    }

    /// Builds a mesh from already finalized frames. `frames` must not be empty.
    pub(crate) fn from_frames(config: EngineConfig, frames: Vec<Frame>) -> Self {
        let mut mesh = Self::with_config(config);
        if !frames.is_empty() {
            mesh.frames = frames;
        }
        mesh
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Frames ---

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn current_frame_index(&self) -> usize {
        self.current
    }

    pub fn current_frame(&self) -> &Frame {
        &self.frames[self.current]
    }

    /// Direct access to the current frame, bypassing modification tracking.
    pub fn current_frame_mut(&mut self) -> &mut Frame {
        &mut self.frames[self.current]
    }

    pub fn set_current_frame(&mut self, index: usize) -> Result<()> {
        if index >= self.frames.len() {
            return Err(Error::FrameOutOfRange(index));
        }
        self.current = index;
        Ok(())
    }

    /// Inserts a copy of frame `after` right behind it and makes it current.
    pub fn add_frame(&mut self, after: usize) -> Result<usize> {
        let source = self.frames.get(after).ok_or(Error::FrameOutOfRange(after))?;
        if self.frames.len() >= self.config.max_frames {
            return Err(Error::FrameCapacity(self.config.max_frames));
        }
        let copy = source.duplicate();
        self.frames.insert(after + 1, copy);
        self.current = after + 1;
        self.touch();
        Ok(self.current)
    }

    /// Removes a frame. The last remaining frame cannot be removed.
    pub fn delete_frame(&mut self, index: usize) -> Result<()> {
        if index >= self.frames.len() {
            return Err(Error::FrameOutOfRange(index));
        }
        if self.frames.len() == 1 {
            return Err(Error::LastFrame);
        }
        self.frames.remove(index);
        if self.current > index || self.current >= self.frames.len() {
            self.current = self.current.saturating_sub(1);
        }
        self.touch();
        Ok(())
    }

    /// Playback hold of a frame, in ticks.
    pub fn frame_hold(&self, index: usize) -> Option<u32> {
        self.frames.get(index).map(|f| f.hold)
    }

    pub fn set_frame_hold(&mut self, index: usize, hold: u32) -> Result<()> {
        let frame = self.frames.get_mut(index).ok_or(Error::FrameOutOfRange(index))?;
        frame.hold = hold;
        self.modified = true;
        Ok(())
    }

    // --- Editing ---

    /// Runs one editing transaction on the current frame.
    ///
    /// ```
    /// use vecmesh_topology::{Mesh, Vec2};
    ///
    /// let mut mesh = Mesh::new();
    /// let face = mesh
    ///     .edit(|frame| {
    ///         let a = frame.add_vertex(Vec2::new(0.0, 0.0))?;
    ///         let b = frame.add_vertex(Vec2::new(1.0, 0.0))?;
    ///         let c = frame.add_vertex(Vec2::new(0.0, 1.0))?;
    ///         frame.add_face(&[a, b, c], 0)
    ///     })
    ///     .unwrap();
    /// assert_eq!(face, 0);
    /// assert!(mesh.is_modified());
    /// ```
    pub fn edit<T>(&mut self, op: impl FnOnce(&mut Frame) -> Result<T>) -> Result<T> {
        let result = op(&mut self.frames[self.current]);
        match &result {
            Ok(_) => self.touch(),
            Err(err) => tracing::debug!(%err, frame = self.current, "edit rejected"),
        }
        result
    }

    fn touch(&mut self) {
        self.modified = true;
        self.atlas_dirty = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    // --- Mesh-wide settings ---

    /// Draw depth in `[MIN_DEPTH, MAX_DEPTH]`.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: i32) {
        self.depth = depth.clamp(MIN_DEPTH, MAX_DEPTH);
        self.mark_all_dirty();
        self.modified = true;
    }

    pub fn palette(&self) -> u8 {
        self.palette
    }

    pub fn set_palette(&mut self, palette: u8) {
        self.palette = palette;
        self.mark_all_dirty();
        self.modified = true;
    }

    pub fn skeleton_name(&self) -> Option<&str> {
        self.skeleton.as_deref()
    }

    pub fn set_skeleton_name(&mut self, name: Option<String>) {
        self.skeleton = name;
        self.modified = true;
    }

    /// Origin of the mesh in its parent space.
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Moves the origin to `origin` without moving the geometry in parent space.
    pub fn set_origin(&mut self, origin: Vec2) {
        let delta = self.position - origin;
        for frame in &mut self.frames {
            frame.offset_vertices(delta);
        }
        self.position = origin;
        self.touch();
    }

    /// Render parameters derived from depth and palette.
    pub fn render_params(&self) -> RenderParams {
        RenderParams::from_mesh_depth(self.depth, self.palette)
    }

    // --- Render caches ---

    /// Triangulated current frame, rebuilt only after the frame changed.
    pub fn render_mesh(&mut self) -> &RenderMesh {
        let params = self.render_params();
        let frame = &mut self.frames[self.current];
        if frame.render_cache.is_none() {
            frame.render_cache = Some(frame.build_render_mesh(&params));
        }
        frame.render_cache.get_or_insert_with(RenderMesh::new)
    }

    /// Edge outline of the current frame for the given view zoom.
    ///
    /// Rebuilt when the frame changed or `zoom_version` differs from the
    /// cached one.
    pub fn outline_mesh(&mut self, zoom_version: u64, zoom_ref_scale: f32) -> &RenderMesh {
        let half_width = zoom_ref_scale * self.config.outline_width * 0.5;
        let frame = &mut self.frames[self.current];
        let stale = frame
            .outline_cache
            .as_ref()
            .map_or(true, |cache| cache.zoom_version != zoom_version);
        if stale {
            frame.outline_cache = Some(OutlineCache {
                mesh: frame.build_outline_mesh(half_width),
                zoom_version,
            });
        }
        &frame
            .outline_cache
            .get_or_insert_with(|| OutlineCache {
                mesh: RenderMesh::new(),
                zoom_version,
            })
            .mesh
    }

    fn mark_all_dirty(&mut self) {
        for frame in &mut self.frames {
            frame.mark_dirty();
        }
    }

    // --- Atlas hooks ---

    /// Returns `true` if the mesh has faces but no atlas yet.
    pub fn needs_atlas_assignment(&self) -> bool {
        self.atlas.is_none() && self.frames.iter().any(|f| f.face_count() > 0)
    }

    pub fn atlas_name(&self) -> Option<&str> {
        self.atlas.as_deref()
    }

    pub fn assign_atlas(&mut self, name: impl Into<String>) {
        self.atlas = Some(name.into());
        self.atlas_dirty = true;
    }

    /// Returns whether the atlas needs regenerating and resets the flag.
    pub fn take_atlas_dirty(&mut self) -> bool {
        std::mem::take(&mut self.atlas_dirty)
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.edit(|frame| {
            for (x, y) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                frame.add_vertex(Vec2::new(x, y))?;
            }
            frame.add_face(&[0, 1, 2, 3], 5)
        })
        .unwrap();
        mesh
    }

    #[test]
    fn failed_edit_leaves_flags() {
        let mut mesh = Mesh::new();
        let result = mesh.edit(|frame| frame.add_face(&[0, 1, 2], 0));
        assert!(result.is_err());
        assert!(!mesh.is_modified());
        assert!(!mesh.take_atlas_dirty());
    }

    #[test]
    fn render_mesh_is_cached_until_edit() {
        let mut mesh = unit_square();
        mesh.set_depth(50);
        let triangles = mesh.render_mesh().triangle_count();
        assert_eq!(triangles, 2);
        assert_relative_eq!(mesh.render_mesh().signed_area(), 4.0);
        assert_relative_eq!(mesh.render_mesh().vertices[0].depth, 0.01 + 0.99 * 0.5);
        assert_relative_eq!(mesh.render_mesh().vertices[0].uv, Vec2::new(5.0, 0.0));
        assert!(!mesh.current_frame().is_dirty());

        mesh.edit(|frame| {
            let edge = frame.edge_between(0, 1).ok_or(Error::EdgeOutOfRange(0))?;
            frame.split_edge(edge, 0.5, false)
        })
        .unwrap();
        assert!(mesh.current_frame().is_dirty());
        assert_eq!(mesh.render_mesh().triangle_count(), 3);
    }

    #[test]
    fn outline_follows_zoom_version() {
        let mut mesh = unit_square();
        let width = |m: &RenderMesh| (m.vertices[1].position - m.vertices[0].position).norm();

        let first = width(mesh.outline_mesh(1, 1.0));
        assert_relative_eq!(first, mesh.config().outline_width, epsilon = 1e-6);
        assert_eq!(mesh.outline_mesh(1, 2.0).vertices.len(), 16);
        // same version keeps the cached mesh
        assert_relative_eq!(width(mesh.outline_mesh(1, 2.0)), first, epsilon = 1e-6);
        assert_relative_eq!(width(mesh.outline_mesh(2, 2.0)), 2.0 * first, epsilon = 1e-6);
    }

    #[test]
    fn frames_are_independent_copies() {
        let mut mesh = unit_square();
        let second = mesh.add_frame(0).unwrap();
        assert_eq!(second, 1);
        assert_eq!(mesh.current_frame_index(), 1);
        mesh.edit(|frame| {
            frame.select_vertex(0, true)?;
            frame.translate_selected(Vec2::new(-1.0, 0.0))
        })
        .unwrap();

        assert_relative_eq!(mesh.frames()[0].position(0).unwrap(), Vec2::new(-1.0, -1.0));
        assert_relative_eq!(mesh.frames()[1].position(0).unwrap(), Vec2::new(-2.0, -1.0));

        mesh.delete_frame(1).unwrap();
        assert_eq!(mesh.current_frame_index(), 0);
        assert!(matches!(mesh.delete_frame(0), Err(Error::LastFrame)));
        assert!(matches!(mesh.set_current_frame(3), Err(Error::FrameOutOfRange(3))));
    }

    #[test]
    fn frame_capacity_is_enforced() {
        let config = EngineConfig {
            max_frames: 2,
            ..EngineConfig::default()
        };
        let mut mesh = Mesh::with_config(config);
        mesh.add_frame(0).unwrap();
        assert!(matches!(mesh.add_frame(0), Err(Error::FrameCapacity(2))));
    }

    #[test]
    fn origin_shift_moves_every_frame() {
        let mut mesh = unit_square();
        mesh.add_frame(0).unwrap();
        mesh.set_origin(Vec2::new(1.0, 0.0));
        for frame in mesh.frames() {
            assert_relative_eq!(frame.position(0).unwrap(), Vec2::new(-2.0, -1.0));
        }
        assert_relative_eq!(mesh.position(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn atlas_hooks() {
        let mut mesh = Mesh::new();
        assert!(!mesh.needs_atlas_assignment());
        let mut mesh2 = unit_square();
        assert!(mesh2.needs_atlas_assignment());
        assert!(mesh2.take_atlas_dirty());
        assert!(!mesh2.take_atlas_dirty());
        mesh2.assign_atlas("props");
        assert!(!mesh2.needs_atlas_assignment());
        assert_eq!(mesh2.atlas_name(), Some("props"));
        mesh.set_depth(500);
        assert_eq!(mesh.depth(), MAX_DEPTH);
    }
}
