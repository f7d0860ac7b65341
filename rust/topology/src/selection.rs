// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Selection flags and propagation between element kinds.
//!
//! Selection lives on the elements themselves. After changing the flags of
//! one kind, [`Frame::update_selection`] derives the other kinds from it.

use crate::error::Result;
use crate::frame::Frame;

/// Which element kind drives selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    Vertex,
    Edge,
    Face,
}

impl Frame {
    pub fn select_vertex(&mut self, v: usize, selected: bool) -> Result<()> {
        self.check_vertex(v)?;
        self.vertices[v].selected = selected;
        Ok(())
    }

    pub fn select_face(&mut self, f: usize, selected: bool) -> Result<()> {
        self.check_face(f)?;
        self.faces[f].selected = selected;
        Ok(())
    }

    /// Clears every selection flag.
    pub fn clear_selection(&mut self) {
        self.vertices.iter_mut().for_each(|v| v.selected = false);
        self.edges.iter_mut().for_each(|e| e.selected = false);
        self.faces.iter_mut().for_each(|f| f.selected = false);
    }

    /// Selects every vertex, edge and face.
    pub fn select_all(&mut self) {
        self.vertices.iter_mut().for_each(|v| v.selected = true);
        self.edges.iter_mut().for_each(|e| e.selected = true);
        self.faces.iter_mut().for_each(|f| f.selected = true);
    }

    /// Derives the other element kinds' flags from `mode`'s flags.
    ///
    /// - `Vertex`: an edge or face is selected when all its vertices are.
    /// - `Edge`: a vertex is selected when a selected edge touches it; faces
    ///   follow the vertices.
    /// - `Face`: a vertex is selected when a selected face contains it;
    ///   edges follow the vertices.
    pub fn update_selection(&mut self, mode: SelectionMode) {
        match mode {
            SelectionMode::Vertex => {
                self.edges_from_vertices();
                self.faces_from_vertices();
            }
            SelectionMode::Edge => {
                self.vertices.iter_mut().for_each(|v| v.selected = false);
                for edge in self.edges.iter().filter(|e| e.selected) {
                    self.vertices[edge.v0].selected = true;
                    self.vertices[edge.v1].selected = true;
                }
                self.faces_from_vertices();
            }
            SelectionMode::Face => {
                self.vertices.iter_mut().for_each(|v| v.selected = false);
                for face in self.faces.iter().filter(|f| f.selected) {
                    for &v in &face.vertices {
                        if let Some(vertex) = self.vertices.get_mut(v) {
                            vertex.selected = true;
                        }
                    }
                }
                self.edges_from_vertices();
            }
        }
    }

    fn edges_from_vertices(&mut self) {
        for edge in &mut self.edges {
            edge.selected = self.vertices[edge.v0].selected && self.vertices[edge.v1].selected;
        }
    }

    fn faces_from_vertices(&mut self) {
        for face in &mut self.faces {
            face.selected = !face.vertices.is_empty()
                && face
                    .vertices
                    .iter()
                    .all(|&v| self.vertices.get(v).is_some_and(|vertex| vertex.selected));
        }
    }
}
