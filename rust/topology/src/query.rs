// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Read-only queries over a frame's vertices, edges and faces.

use crate::frame::Frame;
use crate::geometry::{self, Curve, Vec2};
use crate::keys::edge_vertices;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// Bounds of a set of points, or `None` if empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.min = bounds.min.inf(&p);
            bounds.max = bounds.max.sup(&p);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

impl Frame {
    /// Index of the edge between two vertices, in either order.
    pub fn edge_between(&self, v0: usize, v1: usize) -> Option<usize> {
        self.edge_lookup.get(&edge_vertices(v0, v1)).copied()
    }

    /// Returns `true` if the edge carries a visible curve.
    pub fn is_edge_curved(&self, edge: usize) -> bool {
        self.edges.get(edge).is_some_and(|e| e.curve.is_curved())
    }

    /// Endpoint positions of an edge.
    pub fn edge_positions(&self, edge: usize) -> Option<(Vec2, Vec2)> {
        let e = self.edges.get(edge)?;
        Some((self.position(e.v0)?, self.position(e.v1)?))
    }

    /// Absolute Bézier control point of an edge (the midpoint when straight).
    pub fn edge_control_point(&self, edge: usize) -> Option<Vec2> {
        let (p0, p1) = self.edge_positions(edge)?;
        Some(self.edges[edge].curve.control_point(p0, p1))
    }

    /// Point at parameter `t` from `v0` to `v1`, following the curve if any.
    pub fn edge_point(&self, edge: usize, t: f32) -> Option<Vec2> {
        let (p0, p1) = self.edge_positions(edge)?;
        Some(geometry::edge_point(p0, p1, &self.edges[edge].curve, t))
    }

    /// Sets the curve of an edge. Takes effect immediately; survives
    /// rebuilds while the endpoints stay put.
    pub fn set_edge_curve(&mut self, edge: usize, curve: Curve) -> crate::Result<()> {
        self.check_edge(edge)?;
        self.edges[edge].curve = curve;
        self.mark_dirty();
        Ok(())
    }

    /// Makes an edge straight again.
    pub fn clear_edge_curve(&mut self, edge: usize) -> crate::Result<()> {
        self.set_edge_curve(edge, Curve::straight())
    }

    /// Position of `edge` in the face's cycle.
    pub fn face_edge_position(&self, face: usize, edge: usize) -> Option<usize> {
        let e = self.edges.get(edge)?;
        self.faces.get(face)?.edge_position(e.v0, e.v1)
    }

    /// Number of edges owned by exactly the two faces `f0` and `f1`.
    pub fn shared_edge_count(&self, f0: usize, f1: usize) -> usize {
        let (lo, hi) = if f0 <= f1 { (f0, f1) } else { (f1, f0) };
        self.edges
            .iter()
            .filter(|e| e.face_count == 2 && e.faces[0] == lo && e.faces[1] == hi)
            .count()
    }

    /// Indices of faces whose cycle contains `v`.
    pub fn faces_with_vertex(&self, v: usize) -> Vec<usize> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.vertices.contains(&v))
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns `true` if `v` lies on a boundary edge.
    pub fn is_boundary_vertex(&self, v: usize) -> bool {
        self.edges
            .iter()
            .any(|e| e.face_count == 1 && e.touches(v))
    }

    /// Vertices connected to `v` by an edge.
    pub fn vertex_neighbors(&self, v: usize) -> Vec<usize> {
        self.edges
            .iter()
            .filter(|e| e.touches(v))
            .map(|e| if e.v0 == v { e.v1 } else { e.v0 })
            .collect()
    }

    pub fn selected_vertices(&self) -> Vec<usize> {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.selected)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn selected_edges(&self) -> Vec<usize> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.selected)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn selected_faces(&self) -> Vec<usize> {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.selected)
            .map(|(i, _)| i)
            .collect()
    }

    /// Bounds of every vertex in the frame.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.vertices.iter().map(|v| v.position))
    }

    /// Bounds of the selected vertices.
    pub fn selection_bounds(&self) -> Option<Bounds> {
        Bounds::from_points(
            self.vertices
                .iter()
                .filter(|v| v.selected)
                .map(|v| v.position),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn edge_lookup_is_order_independent() {
        let frame = square();
        assert_eq!(frame.edge_between(2, 1), frame.edge_between(1, 2));
        assert!(frame.edge_between(0, 2).is_none());
    }

    #[test]
    fn straight_and_curved_edge_points() {
        let mut frame = square();
        let edge = frame.edge_between(0, 1).unwrap();
        assert_relative_eq!(frame.edge_point(edge, 0.5).unwrap(), Vec2::new(0.0, -1.0));
        assert!(!frame.is_edge_curved(edge));

        frame
            .set_edge_curve(edge, Curve::new(Vec2::new(0.0, -1.0), 1.0))
            .unwrap();
        assert!(frame.is_edge_curved(edge));
        assert_relative_eq!(frame.edge_control_point(edge).unwrap(), Vec2::new(0.0, -2.0));
        // half of the control offset at the midpoint for a standard quadratic
        assert_relative_eq!(frame.edge_point(edge, 0.5).unwrap(), Vec2::new(0.0, -1.5));
    }

    #[test]
    fn boundary_vertices_and_neighbors() {
        let frame = square();
        assert!(frame.is_boundary_vertex(0));
        let mut neighbors = frame.vertex_neighbors(0);
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![1, 3]);
    }

    #[test]
    fn bounds_cover_vertices() {
        let mut frame = square();
        let bounds = frame.bounds().unwrap();
        assert_relative_eq!(bounds.size(), Vec2::new(2.0, 2.0));
        assert!(frame.selection_bounds().is_none());

        frame.vertex_mut(2).unwrap().selected = true;
        let selected = frame.selection_bounds().unwrap();
        assert_relative_eq!(selected.center(), Vec2::new(1.0, 1.0));
    }
}
