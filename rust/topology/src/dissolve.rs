// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology operations that remove vertices or faces.
//!
//! Removing a vertex renumbers every later vertex, which invalidates edge
//! indices. Each removal therefore snapshots curves by position first and
//! restores them after the rebuild. Batch variants take one snapshot, remove
//! from the highest index down and rebuild once.

use crate::error::{Error, Result};
use crate::frame::{FaceVertices, Frame};
use crate::keys::EdgePositionKey;
use crate::selection::SelectionMode;

/// What [`Frame::dissolve_edge`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DissolveOutcome {
    /// The edge bounded a triangle, which was removed.
    FaceDeleted,
    /// One endpoint was removed, joining its neighbors directly.
    EdgeCollapsed,
    /// The two faces on either side became one.
    FacesMerged,
}

impl Frame {
    /// Removes a face. Its vertices stay, possibly loose.
    pub fn delete_face(&mut self, face: usize) -> Result<()> {
        self.check_face(face)?;
        self.faces.remove(face);
        self.commit();
        Ok(())
    }

    /// Removes a vertex and splices it out of every face.
    ///
    /// Faces left with fewer than three vertices are removed. Later vertices
    /// shift down by one; curves survive through their endpoint positions.
    pub fn delete_vertex(&mut self, v: usize) -> Result<()> {
        self.check_vertex(v)?;
        let snapshot = self.snapshot_curves();
        self.remove_vertex(v);
        self.rebuild_adjacency_with(snapshot);
        self.mark_dirty();
        Ok(())
    }

    /// Dissolves an edge.
    ///
    /// - boundary of a triangle: the triangle is deleted;
    /// - boundary of a larger face: the edge is collapsed;
    /// - shared by two faces with no other common edge: the faces merge;
    /// - shared by two faces with more common edges: the edge is collapsed.
    ///
    /// Collapsing removes the endpoint with the lower reference count
    /// (`v0` on a tie).
    pub fn dissolve_edge(&mut self, edge: usize) -> Result<DissolveOutcome> {
        let e = self.check_edge(edge)?.clone();
        match e.face_count {
            0 => Err(Error::DanglingEdge(edge)),
            1 => {
                let face = e.faces[0];
                if self.faces[face].len() <= 3 {
                    self.delete_face(face)?;
                    Ok(DissolveOutcome::FaceDeleted)
                } else {
                    self.collapse_edge(edge)?;
                    Ok(DissolveOutcome::EdgeCollapsed)
                }
            }
            _ if e.is_slit() => Err(Error::SlitEdge(edge)),
            _ => {
                if self.shared_edge_count(e.faces[0], e.faces[1]) == 1 {
                    self.merge_faces(edge)?;
                    Ok(DissolveOutcome::FacesMerged)
                } else {
                    tracing::debug!(edge, "faces share several edges, collapsing instead of merging");
                    self.collapse_edge(edge)?;
                    Ok(DissolveOutcome::EdgeCollapsed)
                }
            }
        }
    }

    /// Removes the endpoint of `edge` with the lower reference count.
    pub fn collapse_edge(&mut self, edge: usize) -> Result<()> {
        let e = self.check_edge(edge)?;
        let victim = if self.vertices[e.v0].ref_count > self.vertices[e.v1].ref_count {
            e.v1
        } else {
            e.v0
        };
        self.delete_vertex(victim)
    }

    /// Splices the second face of a shared edge into the first and removes it.
    fn merge_faces(&mut self, edge: usize) -> Result<()> {
        let e = self.check_edge(edge)?;
        let (f0, f1) = (e.faces[0], e.faces[1]);
        let (a, b) = (e.v0, e.v1);

        let face0 = &self.faces[f0];
        let face1 = &self.faces[f1];
        let (n0, n1) = (face0.len(), face1.len());
        if n0 + n1 - 2 > self.config.max_face_vertices {
            return Err(Error::FaceVertexCapacity(self.config.max_face_vertices));
        }
        let (Some(pos0), Some(pos1)) = (face0.edge_position(a, b), face1.edge_position(a, b)) else {
            return Err(Error::DanglingEdge(edge));
        };

        // Walk the rest of face1 from the far side of the shared edge so the
        // spliced run goes from face0[pos0] around to face0[pos0 + 1].
        let same_direction = face0.vertices[pos0] == face1.vertices[pos1];
        let run: FaceVertices = (0..n1 - 2)
            .map(|i| {
                let index = if same_direction {
                    (pos1 + 2 * n1 - 1 - i) % n1
                } else {
                    (pos1 + 2 + i) % n1
                };
                face1.vertices[index]
            })
            .collect();

        let insert_at = pos0 + 1;
        let merged = &mut self.faces[f0].vertices;
        for (offset, v) in run.into_iter().enumerate() {
            merged.insert(insert_at + offset, v);
        }
        self.faces.remove(f1);
        self.commit();

        tracing::trace!(face = f0, removed = f1, "merged faces");
        Ok(())
    }

    /// Removes every selected vertex.
    pub fn dissolve_selected_vertices(&mut self) -> Result<()> {
        let selected = self.selected_vertices();
        if selected.is_empty() {
            return Err(Error::EmptySelection);
        }
        let snapshot = self.snapshot_curves();
        for &v in selected.iter().rev() {
            self.remove_vertex(v);
        }
        self.rebuild_adjacency_with(snapshot);
        self.mark_dirty();
        Ok(())
    }

    /// Removes every selected face.
    pub fn dissolve_selected_faces(&mut self) -> Result<()> {
        let selected = self.selected_faces();
        if selected.is_empty() {
            return Err(Error::EmptySelection);
        }
        for &f in selected.iter().rev() {
            self.faces.remove(f);
        }
        self.commit();
        Ok(())
    }

    /// Dissolves every selected edge, highest index first.
    ///
    /// Edges are tracked by endpoint positions because each dissolve
    /// renumbers the edge list. Slit edges and edges already consumed by an
    /// earlier dissolve are skipped. The batch runs on a working copy, so a
    /// failing dissolve leaves the frame as it was. Returns the number
    /// dissolved.
    pub fn dissolve_selected_edges(&mut self) -> Result<usize> {
        let keys: Vec<EdgePositionKey> = self
            .selected_edges()
            .into_iter()
            .rev()
            .filter_map(|e| self.edge_positions(e))
            .map(|(p0, p1)| EdgePositionKey::new(p0, p1))
            .collect();
        if keys.is_empty() {
            return Err(Error::EmptySelection);
        }

        let mut work = self.clone();
        let mut dissolved = 0;
        for key in keys {
            let Some(edge) = (0..work.edges.len()).find(|&e| {
                work.edge_positions(e)
                    .is_some_and(|(p0, p1)| EdgePositionKey::new(p0, p1) == key)
            }) else {
                continue;
            };
            match work.dissolve_edge(edge) {
                Ok(_) => dissolved += 1,
                Err(err @ (Error::SlitEdge(_) | Error::DanglingEdge(_))) => {
                    tracing::debug!(edge, %err, "skipping edge");
                }
                Err(err) => {
                    tracing::debug!(edge, %err, "edge batch rejected");
                    return Err(err);
                }
            }
        }
        *self = work;
        Ok(dissolved)
    }

    /// Dissolves the selection of the given kind.
    ///
    /// Afterwards, selected vertices left without any edge are removed, and
    /// the selection is re-derived from `mode` (cleared for edge mode).
    pub fn dissolve_selected(&mut self, mode: SelectionMode) -> Result<()> {
        if self.vertices.iter().all(|v| !v.selected) {
            return Err(Error::EmptySelection);
        }
        match mode {
            SelectionMode::Vertex => self.dissolve_selected_vertices()?,
            SelectionMode::Edge => {
                self.dissolve_selected_edges()?;
            }
            SelectionMode::Face => self.dissolve_selected_faces()?,
        }

        let orphans: Vec<usize> = self
            .vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.selected && v.ref_count == 0)
            .map(|(i, _)| i)
            .collect();
        if !orphans.is_empty() {
            let snapshot = self.snapshot_curves();
            for &v in orphans.iter().rev() {
                self.remove_vertex(v);
            }
            self.rebuild_adjacency_with(snapshot);
            tracing::debug!(count = orphans.len(), "removed orphaned vertices");
        }

        if mode == SelectionMode::Edge {
            self.clear_selection();
        }
        self.update_selection(mode);
        self.mark_dirty();
        Ok(())
    }

    /// Removes vertex `v` from faces and storage without rebuilding.
    fn remove_vertex(&mut self, v: usize) {
        self.faces.retain_mut(|face| {
            face.vertices.retain(|fv| *fv != v);
            face.len() >= 3
        });
        for face in &mut self.faces {
            for fv in face.vertices.iter_mut() {
                if *fv > v {
                    *fv -= 1;
                }
            }
        }
        self.vertices.remove(v);
    }
}
