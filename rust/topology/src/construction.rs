// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology operations that add vertices or faces.
//!
//! Every operation validates its inputs and capacities before mutating, then
//! rebuilds adjacency and drops the frame's render caches. An `Err` leaves the
//! frame untouched.

use rustc_hash::FxHashMap;

use crate::config::COLOR_COUNT;
use crate::error::{Error, Result};
use crate::frame::{check_cycle, FaceData, FaceVertices, Frame, VertexData};
use crate::geometry::{edge_point, split_bezier, Curve, Vec2};
use crate::selection::SelectionMode;
use crate::weights::interpolate_weights;

impl Frame {
    /// Creates a face over `vertices`, ordered by angle around their centroid.
    ///
    /// Fails if fewer than three distinct vertices are given, a vertex is
    /// repeated, the face or edge array is full, or any edge of the new cycle
    /// already has two faces. The face takes the most common color among
    /// faces owning its existing boundary edges.
    pub fn create_face(&mut self, vertices: &[usize]) -> Result<usize> {
        if vertices.len() < 3 {
            return Err(Error::NotEnoughVertices(vertices.len()));
        }
        for &v in vertices {
            self.check_vertex(v)?;
        }
        self.ensure_face_capacity(1)?;
        if vertices.len() > self.config.max_face_vertices {
            return Err(Error::FaceVertexCapacity(self.config.max_face_vertices));
        }

        let centroid = vertices
            .iter()
            .map(|&v| self.vertices[v].position)
            .sum::<Vec2>()
            / vertices.len() as f32;

        let mut ordered: Vec<(f32, usize)> = vertices
            .iter()
            .map(|&v| {
                let d = self.vertices[v].position - centroid;
                (d.y.atan2(d.x), v)
            })
            .collect();
        // stable: equal angles keep insertion order
        ordered.sort_by(|a, b| a.0.total_cmp(&b.0));
        let cycle: FaceVertices = ordered.into_iter().map(|(_, v)| v).collect();
        // repeated vertices share an angle and end up adjacent
        check_cycle(&cycle)?;
        if let Err(err) = self.check_new_edges(&cycle) {
            tracing::debug!(%err, "create face rejected");
            return Err(err);
        }

        let mut votes = [0usize; COLOR_COUNT];
        let n = cycle.len();
        for i in 0..n {
            let (a, b) = (cycle[i], cycle[(i + 1) % n]);
            let Some(edge) = self.edge_between(a, b).map(|e| &self.edges[e]) else {
                continue;
            };
            for &f in edge.face_indices() {
                let color = self.faces[f].color as usize;
                if color < COLOR_COUNT {
                    votes[color] += 1;
                }
            }
        }
        let color = votes
            .iter()
            .enumerate()
            .fold((0usize, 0usize), |best, (color, &count)| {
                if count > best.1 {
                    (color, count)
                } else {
                    best
                }
            })
            .0 as u8;

        self.faces.push(FaceData::new(cycle, color));
        self.commit();
        Ok(self.faces.len() - 1)
    }

    /// Creates a face from the selected vertices.
    pub fn create_face_from_selection(&mut self) -> Result<usize> {
        let selected = self.selected_vertices();
        self.create_face(&selected)
    }

    /// Cuts the face containing `v0` and `v1` along the chord between them.
    ///
    /// The new face takes the part of the cycle from the earlier position to
    /// the later one; attributes are copied from the original. Returns the
    /// index of the new chord edge.
    pub fn split_face(&mut self, v0: usize, v1: usize) -> Result<usize> {
        self.check_vertex(v0)?;
        self.check_vertex(v1)?;
        self.ensure_face_capacity(1)?;
        if v0 == v1 || self.edge_between(v0, v1).is_some() {
            return Err(Error::EdgeExists(v0, v1));
        }
        if self.edges.len() >= self.config.max_edges {
            return Err(Error::EdgeCapacity(self.config.max_edges));
        }

        let (face_index, pos0, pos1) = self
            .faces
            .iter()
            .enumerate()
            .find_map(|(i, f)| {
                let a = f.position_of(v0)?;
                let b = f.position_of(v1)?;
                Some((i, a.min(b), a.max(b)))
            })
            .ok_or(Error::NoSharedFace(v0, v1))?;

        let old = &self.faces[face_index];
        let mut new_face = old.clone();
        new_face.vertices = old.vertices[pos0..=pos1].iter().copied().collect();

        let mut kept: FaceVertices = old.vertices[..=pos0].iter().copied().collect();
        kept.extend(old.vertices[pos1..].iter().copied());

        self.faces[face_index].vertices = kept;
        self.faces.push(new_face);
        self.commit();

        self.edge_between(v0, v1)
            .ok_or(Error::EdgeCapacity(self.config.max_edges))
    }

    /// Inserts a vertex on `edge` at parameter `t` (from `v0` to `v1`).
    ///
    /// The vertex lands on the curve when the edge is curved. Bone weights are
    /// blended per bone. The vertex is spliced into every face using the edge,
    /// and a curved edge's curve is split between the two halves.
    ///
    /// With `defer_update` the rebuild is skipped and the half curves are
    /// queued for the next [`Frame::rebuild_adjacency`]; the caller must
    /// rebuild once after its batch of splits. Returns the new vertex index.
    pub fn split_edge(&mut self, edge: usize, t: f32, defer_update: bool) -> Result<usize> {
        let e = self.check_edge(edge)?.clone();
        self.ensure_vertex_capacity(1)?;
        let t = t.clamp(0.0, 1.0);

        let splice_points: Vec<(usize, Vec<usize>)> = self
            .faces
            .iter()
            .enumerate()
            .filter_map(|(face_index, face)| {
                let positions: Vec<usize> = face
                    .edge_pairs()
                    .enumerate()
                    .filter(|&(_, (a, b))| (a == e.v0 && b == e.v1) || (a == e.v1 && b == e.v0))
                    .map(|(i, _)| i)
                    .collect();
                (!positions.is_empty()).then_some((face_index, positions))
            })
            .collect();
        for (face_index, positions) in &splice_points {
            if self.faces[*face_index].len() + positions.len() > self.config.max_face_vertices {
                return Err(Error::FaceVertexCapacity(self.config.max_face_vertices));
            }
        }

        let v0 = &self.vertices[e.v0];
        let v1 = &self.vertices[e.v1];
        let (p0, p1) = (v0.position, v1.position);

        let mut vertex = VertexData::new(edge_point(p0, p1, &e.curve, t));
        vertex.weights = interpolate_weights(&v0.weights, &v1.weights, t);

        let new_index = self.vertices.len();
        self.vertices.push(vertex);

        for (face_index, positions) in splice_points {
            let face = &mut self.faces[face_index];
            for &pos in positions.iter().rev() {
                face.vertices.insert(pos + 1, new_index);
            }
        }

        if e.curve.is_curved() {
            let (left, right) = split_bezier(p0, p1, &e.curve, t);
            if defer_update {
                self.queue_curve(e.v0, new_index, left);
                self.queue_curve(new_index, e.v1, right);
            } else {
                self.rebuild_adjacency();
                for (a, b, curve) in [(e.v0, new_index, left), (new_index, e.v1, right)] {
                    if let Some(half) = self.edge_between(a, b) {
                        self.edges[half].curve = curve;
                    }
                }
            }
        } else if !defer_update {
            self.rebuild_adjacency();
        }

        self.mark_dirty();
        tracing::trace!(edge, t, vertex = new_index, deferred = defer_update, "split edge");
        Ok(new_index)
    }

    /// Splits every selected edge at its midpoint with a single rebuild.
    ///
    /// The new vertices are added to the selection. Returns them in edge order.
    pub fn subdivide_selected_edges(&mut self) -> Result<Vec<usize>> {
        let selected = self.selected_edges();
        if selected.is_empty() {
            return Err(Error::EmptySelection);
        }
        self.ensure_vertex_capacity(selected.len())?;
        for face in &self.faces {
            let added = face
                .edge_pairs()
                .filter(|&(a, b)| {
                    self.edge_between(a, b)
                        .is_some_and(|edge| self.edges[edge].selected)
                })
                .count();
            if face.len() + added > self.config.max_face_vertices {
                return Err(Error::FaceVertexCapacity(self.config.max_face_vertices));
            }
        }

        let mut created = Vec::with_capacity(selected.len());
        for edge in selected {
            let v = self.split_edge(edge, 0.5, true)?;
            self.vertices[v].selected = true;
            created.push(v);
        }

        self.commit();
        self.update_selection(SelectionMode::Vertex);
        Ok(created)
    }

    /// Extrudes the selected boundary edges.
    ///
    /// Every vertex touched by a selected edge is duplicated in place (copy
    /// deselected), and each edge gets a quad bridging it to its copy. The quad
    /// inherits color and normal from a face owning the source edge and is
    /// wound opposite to that face's traversal of the edge. Afterwards only
    /// the new outer edges are selected. Returns their indices.
    ///
    /// Fails if a selected edge already has two faces, since its quad would
    /// add a third.
    pub fn extrude_selected_edges(&mut self) -> Result<Vec<usize>> {
        let mut selected = Vec::new();
        for edge in self.edges.iter().filter(|e| e.selected) {
            if !edge.is_boundary() {
                return Err(Error::NonManifoldEdge(edge.v0, edge.v1));
            }
            selected.push((edge.v0, edge.v1));
        }
        if selected.is_empty() {
            return Err(Error::EmptySelection);
        }

        let mut sources: Vec<usize> = selected.iter().flat_map(|&(a, b)| [a, b]).collect();
        sources.sort_unstable();
        sources.dedup();

        self.ensure_vertex_capacity(sources.len())?;
        self.ensure_face_capacity(selected.len())?;
        // one outer edge per source edge, one bridge per source vertex
        if self.edges.len() + selected.len() + sources.len() > self.config.max_edges {
            return Err(Error::EdgeCapacity(self.config.max_edges));
        }

        let mut copies = FxHashMap::default();
        for &v in &sources {
            let mut copy = self.vertices[v].clone();
            copy.selected = false;
            copies.insert(v, self.vertices.len());
            self.vertices.push(copy);
        }

        let mut new_pairs = Vec::with_capacity(selected.len());
        for &(old_v0, old_v1) in &selected {
            let (new_v0, new_v1) = (copies[&old_v0], copies[&old_v1]);

            let owner = self.faces.iter().find_map(|f| {
                f.edge_pairs().find_map(|(a, b)| {
                    if a == old_v0 && b == old_v1 {
                        Some((f.color, f.normal, f.opacity, false))
                    } else if a == old_v1 && b == old_v0 {
                        Some((f.color, f.normal, f.opacity, true))
                    } else {
                        None
                    }
                })
            });
            let (color, normal, opacity, reversed) =
                owner.unwrap_or((0, Vec2::zeros(), 1.0, false));

            let cycle = if reversed {
                [old_v1, new_v1, new_v0, old_v0]
            } else {
                [old_v0, new_v0, new_v1, old_v1]
            };
            let mut quad = FaceData::new(cycle, color);
            quad.normal = normal;
            quad.opacity = opacity;
            self.faces.push(quad);
            new_pairs.push((new_v0, new_v1));
        }

        self.clear_selection();
        for &(a, b) in &new_pairs {
            self.vertices[a].selected = true;
            self.vertices[b].selected = true;
        }
        self.commit();
        self.update_selection(SelectionMode::Vertex);

        tracing::debug!(edges = new_pairs.len(), "extruded edges");
        Ok(new_pairs
            .iter()
            .filter_map(|&(a, b)| self.edge_between(a, b))
            .collect())
    }

    /// Clones the selected vertices and faces.
    ///
    /// Clones are selected and the originals deselected. A face is cloned only
    /// if all of its vertices are selected. Curves of edges between cloned
    /// vertices are copied to the matching clone edges. Returns the new vertex
    /// indices.
    pub fn duplicate_selected(&mut self) -> Result<Vec<usize>> {
        let vertices = self.selected_vertices();
        if vertices.is_empty() {
            return Err(Error::EmptySelection);
        }
        let faces: Vec<usize> = self
            .faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.selected && f.vertices.iter().all(|&v| self.vertices[v].selected))
            .map(|(i, _)| i)
            .collect();

        self.ensure_vertex_capacity(vertices.len())?;
        self.ensure_face_capacity(faces.len())?;
        let mut clone_edges: Vec<(usize, usize)> = faces
            .iter()
            .flat_map(|&f| self.faces[f].edge_pairs())
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        clone_edges.sort_unstable();
        clone_edges.dedup();
        if self.edges.len() + clone_edges.len() > self.config.max_edges {
            return Err(Error::EdgeCapacity(self.config.max_edges));
        }

        let mut remap = FxHashMap::default();
        for &v in &vertices {
            let copy = self.vertices[v].clone();
            self.vertices[v].selected = false;
            remap.insert(v, self.vertices.len());
            self.vertices.push(copy);
        }

        for &f in &faces {
            let mut copy = self.faces[f].clone();
            self.faces[f].selected = false;
            for v in copy.vertices.iter_mut() {
                *v = remap[v];
            }
            copy.selected = true;
            self.faces.push(copy);
        }

        let curves: Vec<(usize, usize, Curve)> = self
            .edges
            .iter()
            .filter(|e| e.curve.is_curved())
            .filter_map(|e| Some((*remap.get(&e.v0)?, *remap.get(&e.v1)?, e.curve)))
            .collect();
        let clones = &self.faces[self.faces.len() - faces.len()..];
        let queued: Vec<(usize, usize, Curve)> = curves
            .into_iter()
            .filter(|&(v0, v1, _)| clones.iter().any(|f| f.edge_position(v0, v1).is_some()))
            .collect();
        for (v0, v1, curve) in queued {
            self.queue_curve(v0, v1, curve);
        }

        self.commit();
        self.update_selection(SelectionMode::Face);
        // loose vertices have no face to carry their selection
        for &v in &vertices {
            let clone = remap[&v];
            if self.vertices[clone].ref_count == 0 {
                self.vertices[clone].selected = true;
            }
        }

        tracing::debug!(vertices = vertices.len(), faces = faces.len(), "duplicated selection");
        Ok(vertices.iter().map(|v| remap[v]).collect())
    }

    /// Rebuilds adjacency and drops render caches.
    pub(crate) fn commit(&mut self) {
        self.rebuild_adjacency();
        self.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{eval_quadratic_bezier, Curve};
    use approx::assert_relative_eq;

    fn square() -> Frame {
        let mut frame = Frame::new();
        for (x, y) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            frame.add_vertex(Vec2::new(x, y)).unwrap();
        }
        frame.add_face(&[0, 1, 2, 3], 0).unwrap();
        frame
    }

    #[test]
    fn create_face_orders_ccw() {
        let mut frame = Frame::new();
        for (x, y) in [(1.0, 1.0), (-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0)] {
            frame.add_vertex(Vec2::new(x, y)).unwrap();
        }
        let face = frame.create_face(&[0, 1, 2, 3]).unwrap();
        let positions = frame.face_positions(face).unwrap();
        assert_relative_eq!(crate::geometry::signed_area(&positions), 4.0);
    }

    #[test]
    fn create_face_takes_neighbor_color() {
        let mut frame = square();
        frame.face_mut(0).unwrap().color = 9;
        let v = frame.add_vertex(Vec2::new(0.0, -3.0)).unwrap();
        let face = frame.create_face(&[0, 1, v]).unwrap();
        assert_eq!(frame.face(face).unwrap().color, 9);
        assert_eq!(frame.edges()[frame.edge_between(0, 1).unwrap()].face_count, 2);
    }

    #[test]
    fn create_face_rejects_third_face_on_edge() {
        let mut frame = square();
        let below = frame.add_vertex(Vec2::new(0.0, -3.0)).unwrap();
        frame.create_face(&[0, 1, below]).unwrap();
        let other = frame.add_vertex(Vec2::new(0.0, -2.0)).unwrap();
        let before = frame.face_count();
        assert!(matches!(
            frame.create_face(&[0, 1, other]),
            Err(Error::NonManifoldEdge(_, _))
        ));
        assert_eq!(frame.face_count(), before);
    }

    #[test]
    fn split_face_along_diagonal() {
        let mut frame = square();
        let chord = frame.split_face(0, 2).unwrap();
        assert_eq!(frame.face_count(), 2);
        assert_eq!(frame.face(0).unwrap().vertices.as_slice(), &[0, 2, 3]);
        assert_eq!(frame.face(1).unwrap().vertices.as_slice(), &[0, 1, 2]);
        assert_eq!(frame.edges()[chord].face_count, 2);
    }

    #[test]
    fn split_face_rejects_existing_edge() {
        let mut frame = square();
        assert!(matches!(frame.split_face(0, 1), Err(Error::EdgeExists(0, 1))));
        let loose = frame.add_vertex(Vec2::new(5.0, 5.0)).unwrap();
        assert!(matches!(
            frame.split_face(0, loose),
            Err(Error::NoSharedFace(_, _))
        ));
        assert_eq!(frame.face_count(), 1);
    }

    #[test]
    fn split_straight_edge_at_midpoint() {
        let mut frame = square();
        let edge = frame.edge_between(0, 1).unwrap();
        let v = frame.split_edge(edge, 0.5, false).unwrap();
        assert_eq!(v, 4);
        assert_relative_eq!(frame.position(v).unwrap(), Vec2::new(0.0, -1.0));
        assert_eq!(frame.face(0).unwrap().vertices.as_slice(), &[0, 4, 1, 2, 3]);
        assert!(frame.edge_between(0, 1).is_none());
    }

    #[test]
    fn split_curved_edge_keeps_shape() {
        let mut frame = square();
        let edge = frame.edge_between(0, 1).unwrap();
        let curve = Curve::new(Vec2::new(0.0, -0.8), 1.0);
        frame.set_edge_curve(edge, curve).unwrap();
        let (p0, p1) = frame.edge_positions(edge).unwrap();
        let control = curve.control_point(p0, p1);

        let v = frame.split_edge(edge, 0.5, false).unwrap();
        let expected = eval_quadratic_bezier(p0, control, p1, 0.5, 1.0);
        assert_relative_eq!(frame.position(v).unwrap(), expected, epsilon = 1e-6);

        let left = frame.edge_between(0, v).unwrap();
        let right = frame.edge_between(v, 1).unwrap();
        assert!(frame.is_edge_curved(left));
        assert!(frame.is_edge_curved(right));
        // left half at s matches the original at s / 2
        let on_left = frame.edge_point(left, 0.5).unwrap();
        assert_relative_eq!(on_left, eval_quadratic_bezier(p0, control, p1, 0.25, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn deferred_split_queues_curves() {
        let mut frame = square();
        let edge = frame.edge_between(0, 1).unwrap();
        frame
            .set_edge_curve(edge, Curve::new(Vec2::new(0.0, -0.8), 1.0))
            .unwrap();
        let v = frame.split_edge(edge, 0.5, true).unwrap();
        assert_eq!(frame.pending_curves().len(), 2);
        // edge table is stale until the caller rebuilds
        assert_eq!(frame.edge_count(), 4);
        assert!(frame.edge_between(0, v).is_none());

        frame.rebuild_adjacency();
        assert!(frame.pending_curves().is_empty());
        assert!(frame.is_edge_curved(frame.edge_between(0, v).unwrap()));
        assert!(frame.is_edge_curved(frame.edge_between(v, 1).unwrap()));
    }

    #[test]
    fn split_shared_edge_updates_both_faces() {
        let mut frame = square();
        frame.split_face(0, 2).unwrap();
        let chord = frame.edge_between(0, 2).unwrap();
        let v = frame.split_edge(chord, 0.5, false).unwrap();
        assert_relative_eq!(frame.position(v).unwrap(), Vec2::new(0.0, 0.0));
        assert_eq!(frame.face(0).unwrap().len(), 4);
        assert_eq!(frame.face(1).unwrap().len(), 4);
        assert_eq!(frame.faces_with_vertex(v).len(), 2);
    }

    #[test]
    fn subdivide_selected_edges_once() {
        let mut frame = square();
        for v in 0..4 {
            frame.select_vertex(v, true).unwrap();
        }
        frame.update_selection(SelectionMode::Vertex);
        let created = frame.subdivide_selected_edges().unwrap();
        assert_eq!(created.len(), 4);
        assert_eq!(frame.face(0).unwrap().len(), 8);
        assert_eq!(frame.edge_count(), 8);
        assert!(created.iter().all(|&v| frame.vertex(v).unwrap().selected));
    }

    #[test]
    fn extrude_boundary_edge() {
        let mut frame = square();
        let edge = frame.edge_between(0, 1).unwrap();
        frame.set_edge_selected(edge, true).unwrap();
        let ref0 = frame.vertex(0).unwrap().ref_count;
        let ref1 = frame.vertex(1).unwrap().ref_count;
        let edges_before = frame.edge_count();

        let new_edges = frame.extrude_selected_edges().unwrap();

        assert_eq!(frame.vertex_count(), 6);
        assert_eq!(frame.face_count(), 2);
        assert_eq!(frame.edge_count(), edges_before + 3);
        assert_eq!(frame.face(1).unwrap().vertices.as_slice(), &[0, 4, 5, 1]);
        assert_eq!(frame.vertex(0).unwrap().ref_count, ref0 + 1);
        assert_eq!(frame.vertex(1).unwrap().ref_count, ref1 + 1);
        assert_eq!(new_edges.len(), 1);
        assert_eq!(frame.selected_edges(), new_edges);
        assert!(!frame.vertex(0).unwrap().selected);
    }

    #[test]
    fn extrude_requires_selection() {
        let mut frame = square();
        assert!(matches!(frame.extrude_selected_edges(), Err(Error::EmptySelection)));
    }

    #[test]
    fn duplicate_selected_face() {
        let mut frame = square();
        frame.select_face(0, true).unwrap();
        frame.update_selection(SelectionMode::Face);
        let edge = frame.edge_between(1, 2).unwrap();
        frame
            .set_edge_curve(edge, Curve::new(Vec2::new(0.5, 0.0), 1.0))
            .unwrap();

        let clones = frame.duplicate_selected().unwrap();
        assert_eq!(clones, vec![4, 5, 6, 7]);
        assert_eq!(frame.face_count(), 2);
        assert!(!frame.face(0).unwrap().selected);
        assert!(frame.face(1).unwrap().selected);
        assert_eq!(frame.face(1).unwrap().vertices.as_slice(), &[4, 5, 6, 7]);
        assert!(frame.is_edge_curved(frame.edge_between(5, 6).unwrap()));
        assert!(!frame.vertex(0).unwrap().selected);
    }

    #[test]
    fn create_face_rejects_repeated_vertex() {
        let mut frame = square();
        let v = frame.add_vertex(Vec2::new(0.0, -3.0)).unwrap();
        let edges = frame.edge_count();
        assert!(matches!(
            frame.create_face(&[0, 1, 1, v]),
            Err(Error::RepeatedVertex(1))
        ));
        assert!(matches!(
            frame.create_face(&[0, v, 0]),
            Err(Error::RepeatedVertex(0))
        ));
        assert_eq!(frame.face_count(), 1);
        assert_eq!(frame.edge_count(), edges);
    }

    #[test]
    fn create_face_respects_edge_capacity() {
        let config = crate::EngineConfig {
            max_edges: 5,
            ..Default::default()
        };
        let mut frame = Frame::with_config(config);
        for (x, y) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0), (0.0, -3.0)] {
            frame.add_vertex(Vec2::new(x, y)).unwrap();
        }
        frame.add_face(&[0, 1, 2, 3], 0).unwrap();
        // the triangle below shares 0-1 but needs two new edges
        assert!(matches!(
            frame.create_face(&[0, 1, 4]),
            Err(Error::EdgeCapacity(5))
        ));
        assert_eq!(frame.face_count(), 1);
    }

    #[test]
    fn extrude_rejects_interior_edge() {
        let mut frame = square();
        frame.split_face(0, 2).unwrap();
        let chord = frame.edge_between(0, 2).unwrap();
        frame.set_edge_selected(chord, true).unwrap();
        let vertices = frame.vertex_count();

        assert!(matches!(
            frame.extrude_selected_edges(),
            Err(Error::NonManifoldEdge(0, 2))
        ));
        assert_eq!(frame.vertex_count(), vertices);
        assert_eq!(frame.face_count(), 2);
    }

    #[test]
    fn extrude_respects_edge_capacity() {
        let config = crate::EngineConfig {
            max_edges: 6,
            ..Default::default()
        };
        let mut frame = Frame::with_config(config);
        for (x, y) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            frame.add_vertex(Vec2::new(x, y)).unwrap();
        }
        frame.add_face(&[0, 1, 2, 3], 0).unwrap();
        let edge = frame.edge_between(0, 1).unwrap();
        frame.set_edge_selected(edge, true).unwrap();

        // one outer edge and two bridges on top of four
        assert!(matches!(
            frame.extrude_selected_edges(),
            Err(Error::EdgeCapacity(6))
        ));
        assert_eq!(frame.vertex_count(), 4);
        assert_eq!(frame.edge_count(), 4);
    }

    #[test]
    fn duplicated_curves_are_independent() {
        let mut frame = square();
        frame.select_face(0, true).unwrap();
        frame.update_selection(SelectionMode::Face);
        let edge = frame.edge_between(1, 2).unwrap();
        frame
            .set_edge_curve(edge, Curve::new(Vec2::new(0.5, 0.0), 1.0))
            .unwrap();
        frame.duplicate_selected().unwrap();

        let clone_edge = frame.edge_between(5, 6).unwrap();
        frame.clear_edge_curve(clone_edge).unwrap();
        frame.rebuild_adjacency();
        assert!(!frame.is_edge_curved(frame.edge_between(5, 6).unwrap()));
        assert!(frame.is_edge_curved(frame.edge_between(1, 2).unwrap()));

        let clone_edge = frame.edge_between(5, 6).unwrap();
        frame
            .set_edge_curve(clone_edge, Curve::new(Vec2::new(0.2, 0.0), 1.0))
            .unwrap();
        frame.rebuild_adjacency();
        let original = frame.edge_between(1, 2).unwrap();
        let clone_edge = frame.edge_between(5, 6).unwrap();
        assert_relative_eq!(frame.edges()[original].curve.offset, Vec2::new(0.5, 0.0));
        assert_relative_eq!(frame.edges()[clone_edge].curve.offset, Vec2::new(0.2, 0.0));
    }
}
