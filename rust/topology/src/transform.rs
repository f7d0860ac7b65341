// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Affine transformations and face ordering.
//!
//! Transforms modify vertex positions in place. Faces and edges reference
//! vertices by index, so moving vertices moves everything built on them.
//! Curve offsets of edges whose endpoints both move are mapped through the
//! linear part of the transform so curved edges keep their shape.

use nalgebra::{Matrix2, Matrix3, Rotation2};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::geometry::{transform_point, Vec2};

impl Frame {
    /// Moves the selected vertices by `delta`.
    pub fn translate_selected(&mut self, delta: Vec2) -> Result<()> {
        self.transform_selected(&Matrix3::new_translation(&delta))
    }

    /// Applies a 2D affine transform (homogeneous 3x3) to the selected vertices.
    pub fn transform_selected(&mut self, matrix: &Matrix3<f32>) -> Result<()> {
        if self.vertices.iter().all(|v| !v.selected) {
            return Err(Error::EmptySelection);
        }

        let linear: Matrix2<f32> = matrix.fixed_view::<2, 2>(0, 0).into_owned();
        for edge in &mut self.edges {
            if self.vertices[edge.v0].selected && self.vertices[edge.v1].selected {
                edge.curve.offset = linear * edge.curve.offset;
            }
        }
        for vertex in self.vertices.iter_mut().filter(|v| v.selected) {
            vertex.position = transform_point(matrix, vertex.position);
        }

        self.commit();
        Ok(())
    }

    /// Rotates the selected vertices by `angle` radians around `pivot`.
    pub fn rotate_selected(&mut self, pivot: Vec2, angle: f32) -> Result<()> {
        let matrix = Matrix3::new_translation(&pivot)
            * Rotation2::new(angle).to_homogeneous()
            * Matrix3::new_translation(&-pivot);
        self.transform_selected(&matrix)
    }

    /// Scales the selected vertices relative to `pivot`.
    pub fn scale_selected(&mut self, pivot: Vec2, scale: Vec2) -> Result<()> {
        let matrix = Matrix3::new_translation(&pivot)
            * Matrix3::new_nonuniform_scaling(&scale)
            * Matrix3::new_translation(&-pivot);
        self.transform_selected(&matrix)
    }

    /// Moves every vertex by `delta`.
    pub fn offset_vertices(&mut self, delta: Vec2) {
        for vertex in &mut self.vertices {
            vertex.position += delta;
        }
        self.commit();
    }

    /// Moves the geometry so its bounds are centered on the origin.
    ///
    /// Returns the applied offset (zero for an empty frame).
    pub fn center(&mut self) -> Vec2 {
        let Some(bounds) = self.bounds() else {
            return Vec2::zeros();
        };
        let delta = -bounds.center();
        self.offset_vertices(delta);
        delta
    }

    /// Mirrors the selected vertices horizontally around the selection center.
    ///
    /// Selected faces have their cycle reversed so they stay counter-clockwise.
    pub fn flip_horizontal(&mut self) -> Result<()> {
        let Some(bounds) = self.selection_bounds() else {
            return Err(Error::EmptySelection);
        };
        let pivot = bounds.center();

        for edge in &mut self.edges {
            if self.vertices[edge.v0].selected && self.vertices[edge.v1].selected {
                edge.curve.offset.x = -edge.curve.offset.x;
            }
        }
        for vertex in self.vertices.iter_mut().filter(|v| v.selected) {
            vertex.position.x = 2.0 * pivot.x - vertex.position.x;
        }
        for face in self.faces.iter_mut().filter(|f| f.selected) {
            face.vertices.reverse();
        }

        self.commit();
        Ok(())
    }

    /// Exchanges two faces in draw order.
    pub fn swap_faces(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_face(a)?;
        self.check_face(b)?;
        self.faces.swap(a, b);
        self.commit();
        Ok(())
    }

    /// Moves each selected face one step toward the front, past an
    /// unselected neighbor.
    pub fn bring_forward(&mut self) -> Result<()> {
        self.require_selected_faces()?;
        for i in (0..self.faces.len().saturating_sub(1)).rev() {
            if self.faces[i].selected && !self.faces[i + 1].selected {
                self.faces.swap(i, i + 1);
            }
        }
        self.commit();
        Ok(())
    }

    /// Moves each selected face one step toward the back.
    pub fn send_backward(&mut self) -> Result<()> {
        self.require_selected_faces()?;
        for i in 1..self.faces.len() {
            if self.faces[i].selected && !self.faces[i - 1].selected {
                self.faces.swap(i, i - 1);
            }
        }
        self.commit();
        Ok(())
    }

    /// Moves the selected faces to the front, keeping their relative order.
    pub fn bring_to_front(&mut self) -> Result<()> {
        self.require_selected_faces()?;
        let (selected, rest): (Vec<_>, Vec<_>) = self.faces.drain(..).partition(|f| f.selected);
        self.faces = rest;
        self.faces.extend(selected);
        self.commit();
        Ok(())
    }

    /// Moves the selected faces to the back, keeping their relative order.
    pub fn send_to_back(&mut self) -> Result<()> {
        self.require_selected_faces()?;
        let (mut selected, rest): (Vec<_>, Vec<_>) = self.faces.drain(..).partition(|f| f.selected);
        selected.extend(rest);
        self.faces = selected;
        self.commit();
        Ok(())
    }

    /// Sets the palette color of every selected face. Returns how many changed.
    pub fn set_selected_face_color(&mut self, color: u8) -> usize {
        let mut count = 0;
        for face in self.faces.iter_mut().filter(|f| f.selected) {
            face.color = color;
            count += 1;
        }
        if count > 0 {
            self.mark_dirty();
        }
        count
    }

    /// Sets the opacity (clamped to `[0, 1]`) of every selected face.
    pub fn set_selected_face_opacity(&mut self, opacity: f32) -> usize {
        let opacity = opacity.clamp(0.0, 1.0);
        let mut count = 0;
        for face in self.faces.iter_mut().filter(|f| f.selected) {
            face.opacity = opacity;
            count += 1;
        }
        if count > 0 {
            self.mark_dirty();
        }
        count
    }

    fn require_selected_faces(&self) -> Result<()> {
        if self.faces.iter().any(|f| f.selected) {
            Ok(())
        } else {
            Err(Error::EmptySelection)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{signed_area, Curve};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn square() -> Frame {
        let mut frame = Frame::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            frame.add_vertex(Vec2::new(x, y)).unwrap();
        }
        frame.add_face(&[0, 1, 2, 3], 0).unwrap();
        frame
    }

    fn select_all_vertices(frame: &mut Frame) {
        for v in 0..frame.vertex_count() {
            frame.select_vertex(v, true).unwrap();
        }
    }

    #[test]
    fn translate_moves_only_selection() {
        let mut frame = square();
        frame.select_vertex(2, true).unwrap();
        frame.translate_selected(Vec2::new(10.0, 20.0)).unwrap();

        assert_relative_eq!(frame.position(2).unwrap(), Vec2::new(11.0, 21.0));
        assert_relative_eq!(frame.position(1).unwrap(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn translate_requires_selection() {
        let mut frame = square();
        assert!(matches!(
            frame.translate_selected(Vec2::new(1.0, 0.0)),
            Err(Error::EmptySelection)
        ));
    }

    #[test]
    fn rotate_around_offset_pivot() {
        let mut frame = square();
        frame.select_vertex(1, true).unwrap();
        // (1, 0) around (0, 0) by 90 degrees
        frame.rotate_selected(Vec2::zeros(), FRAC_PI_2).unwrap();
        assert_relative_eq!(frame.position(1).unwrap(), Vec2::new(0.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn scale_relative_to_pivot() {
        let mut frame = square();
        frame.select_vertex(2, true).unwrap();
        frame
            .scale_selected(Vec2::new(1.0, 0.0), Vec2::new(3.0, 2.0))
            .unwrap();
        assert_relative_eq!(frame.position(2).unwrap(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn transform_rotates_curve_offsets() {
        let mut frame = square();
        let edge = frame.edge_between(0, 1).unwrap();
        frame
            .set_edge_curve(edge, Curve::new(Vec2::new(0.0, -0.5), 1.0))
            .unwrap();
        select_all_vertices(&mut frame);
        frame.rotate_selected(Vec2::zeros(), FRAC_PI_2).unwrap();

        let edge = frame.edge_between(0, 1).unwrap();
        assert_relative_eq!(frame.edges()[edge].curve.offset, Vec2::new(0.5, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn center_uses_bounds() {
        let mut frame = square();
        let delta = frame.center();
        assert_relative_eq!(delta, Vec2::new(-0.5, -0.5));
        assert_relative_eq!(frame.bounds().unwrap().center(), Vec2::zeros());
        assert!(Frame::new().center() == Vec2::zeros());
    }

    #[test]
    fn flip_keeps_faces_ccw() {
        let mut frame = square();
        let edge = frame.edge_between(1, 2).unwrap();
        frame
            .set_edge_curve(edge, Curve::new(Vec2::new(0.4, 0.0), 1.0))
            .unwrap();
        frame.select_face(0, true).unwrap();
        frame.update_selection(crate::SelectionMode::Face);

        frame.flip_horizontal().unwrap();

        assert_relative_eq!(frame.position(1).unwrap(), Vec2::new(0.0, 0.0));
        let area = signed_area(&frame.face_positions(0).unwrap());
        assert_relative_eq!(area, 1.0);
        let edge = frame.edge_between(1, 2).unwrap();
        assert_relative_eq!(frame.edges()[edge].curve.offset, Vec2::new(-0.4, 0.0));
    }

    fn three_faces() -> Frame {
        let mut frame = Frame::new();
        for i in 0..9 {
            frame.add_vertex(Vec2::new(i as f32, (i % 3) as f32)).unwrap();
        }
        for (f, color) in [(0usize, 1u8), (3, 2), (6, 3)] {
            frame.add_face(&[f, f + 1, f + 2], color).unwrap();
        }
        frame
    }

    fn colors(frame: &Frame) -> Vec<u8> {
        frame.faces().iter().map(|f| f.color).collect()
    }

    #[test]
    fn reorder_selected_faces() {
        let mut frame = three_faces();
        frame.select_face(0, true).unwrap();
        frame.bring_forward().unwrap();
        assert_eq!(colors(&frame), vec![2, 1, 3]);
        frame.bring_to_front().unwrap();
        assert_eq!(colors(&frame), vec![2, 3, 1]);
        frame.send_backward().unwrap();
        assert_eq!(colors(&frame), vec![2, 1, 3]);
        frame.send_to_back().unwrap();
        assert_eq!(colors(&frame), vec![1, 2, 3]);

        frame.swap_faces(0, 2).unwrap();
        assert_eq!(colors(&frame), vec![3, 2, 1]);
        assert!(frame.swap_faces(0, 3).is_err());
    }

    #[test]
    fn face_color_and_opacity() {
        let mut frame = three_faces();
        frame.select_face(1, true).unwrap();
        assert_eq!(frame.set_selected_face_color(7), 1);
        assert_eq!(frame.set_selected_face_opacity(1.5), 1);
        assert_eq!(frame.face(1).unwrap().color, 7);
        assert_relative_eq!(frame.face(1).unwrap().opacity, 1.0);
        frame.clear_selection();
        assert_eq!(frame.set_selected_face_color(9), 0);
    }
}
