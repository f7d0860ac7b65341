// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Face triangulation.
//!
//! Each face is turned into triangles by ear clipping. Curved boundary edges
//! are first flattened into `curve_segments` straight pieces so the
//! triangles follow the curve; vertex attributes along a flattened edge are
//! interpolated between its endpoints.
//!
//! An ear is three consecutive points forming a CCW triangle that contains
//! no other remaining point. If a full scan finds no ear (numerically
//! degenerate or clockwise input) the rest of the polygon is fanned from its
//! first point, so a polygon of N points always yields N - 2 triangles.

use crate::config::{MAX_DEPTH, MAX_VERTEX_WEIGHTS, MIN_DEPTH};
use crate::frame::Frame;
use crate::geometry::{cross, eval_quadratic_bezier, normalize_or_zero, point_in_triangle, Vec2};
use crate::render::{MeshBuilder, MeshVertex, RenderMesh};
use crate::weights::{interpolate_weights, Weights};

/// Per-mesh parameters baked into every emitted vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    /// Draw depth in `[0.01, 1]`.
    pub depth: f32,
    /// Palette row for the color lookup.
    pub palette: u8,
}

impl RenderParams {
    /// Maps a mesh depth in `[MIN_DEPTH, MAX_DEPTH]` to a draw depth.
    pub fn from_mesh_depth(depth: i32, palette: u8) -> Self {
        let range = (MAX_DEPTH - MIN_DEPTH) as f32;
        Self {
            depth: 0.01 + 0.99 * (depth - MIN_DEPTH) as f32 / range,
            palette,
        }
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self::from_mesh_depth(0, 0)
    }
}

/// One point of a flattened face boundary.
#[derive(Debug, Clone, Copy)]
struct BoundaryPoint {
    position: Vec2,
    normal: Vec2,
    weights: Weights,
}

/// Triangulates a simple polygon by ear clipping.
///
/// Returns index triples into `points`. Always produces `points.len() - 2`
/// triangles for three or more points.
pub fn ear_clip(points: &[Vec2]) -> Vec<[usize; 3]> {
    let count = points.len();
    if count < 3 {
        return Vec::new();
    }

    let mut triangles = Vec::with_capacity(count - 2);
    let mut remaining: Vec<usize> = (0..count).collect();
    let mut current = 0;

    while remaining.len() > 3 {
        let mut found_ear = false;

        for _ in 0..remaining.len() {
            if is_ear(points, &remaining, current) {
                let n = remaining.len();
                let prev = (current + n - 1) % n;
                let next = (current + 1) % n;
                triangles.push([remaining[prev], remaining[current], remaining[next]]);

                remaining.remove(current);
                if current >= remaining.len() {
                    current = 0;
                }
                found_ear = true;
                break;
            }
            current = (current + 1) % remaining.len();
        }

        if !found_ear {
            tracing::trace!(remaining = remaining.len(), "no ear found, fanning");
            for i in 1..remaining.len() - 1 {
                triangles.push([remaining[0], remaining[i], remaining[i + 1]]);
            }
            return triangles;
        }
    }

    triangles.push([remaining[0], remaining[1], remaining[2]]);
    triangles
}

fn is_ear(points: &[Vec2], remaining: &[usize], ear: usize) -> bool {
    let n = remaining.len();
    let prev = (ear + n - 1) % n;
    let next = (ear + 1) % n;

    let a = points[remaining[prev]];
    let b = points[remaining[ear]];
    let c = points[remaining[next]];

    if cross(b - a, c - a) <= 0.0 {
        return false;
    }

    remaining
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != prev && i != ear && i != next)
        .all(|(_, &p)| !point_in_triangle(points[p], a, b, c))
}

impl Frame {
    /// Appends the triangles of one face to `builder`.
    ///
    /// Faces with fewer than three vertices contribute nothing. Returns the
    /// number of triangles emitted.
    pub fn triangulate_face<B: MeshBuilder>(
        &self,
        face_index: usize,
        params: &RenderParams,
        builder: &mut B,
    ) -> usize {
        let Some(face) = self.faces.get(face_index) else {
            return 0;
        };
        if face.len() < 3 {
            return 0;
        }

        let boundary = self.flatten_face(face_index);
        let base = builder.vertex_count();
        if base + boundary.len() > u16::MAX as usize + 1 {
            tracing::warn!(face = face_index, "render mesh index space exhausted, skipping face");
            return 0;
        }

        let uv = Vec2::new(f32::from(face.color), f32::from(params.palette));
        for point in &boundary {
            let mut vertex = MeshVertex::new(point.position);
            vertex.depth = params.depth;
            vertex.opacity = face.opacity;
            vertex.uv = uv;
            vertex.normal = point.normal;
            for (slot, weight) in point.weights.iter().enumerate() {
                vertex.bone_indices[slot] = weight.bone;
                vertex.bone_weights[slot] = weight.weight;
            }
            builder.add_vertex(vertex);
        }

        let positions: Vec<Vec2> = boundary.iter().map(|p| p.position).collect();
        let triangles = ear_clip(&positions);
        for [a, b, c] in &triangles {
            builder.add_triangle((base + a) as u16, (base + b) as u16, (base + c) as u16);
        }
        triangles.len()
    }

    /// Boundary points of a face with curved edges flattened.
    fn flatten_face(&self, face_index: usize) -> Vec<BoundaryPoint> {
        let face = &self.faces[face_index];
        let segments = self.config.curve_segments.max(1);
        let mut points = Vec::with_capacity(face.len());

        for (a, b) in face.edge_pairs() {
            let (Some(va), Some(vb)) = (self.vertices.get(a), self.vertices.get(b)) else {
                continue;
            };
            let curve = self
                .edge_between(a, b)
                .map(|e| self.edges[e].curve)
                .filter(|c| c.is_curved());

            let Some(curve) = curve else {
                points.push(BoundaryPoint {
                    position: va.position,
                    normal: va.edge_normal,
                    weights: va.weights,
                });
                continue;
            };

            let control = curve.control_point(va.position, vb.position);
            let weight = curve.effective_weight();
            for s in 0..segments {
                let t = s as f32 / segments as f32;
                points.push(BoundaryPoint {
                    position: eval_quadratic_bezier(va.position, control, vb.position, t, weight),
                    normal: normalize_or_zero(va.edge_normal * (1.0 - t) + vb.edge_normal * t),
                    weights: if s == 0 {
                        va.weights
                    } else {
                        interpolate_weights(&va.weights, &vb.weights, t)
                    },
                });
            }
        }

        points
    }

    /// Triangulates every face into a new mesh.
    pub fn build_render_mesh(&self, params: &RenderParams) -> RenderMesh {
        let mut mesh = RenderMesh::with_capacity(self.vertices.len(), self.faces.len() * 6);
        for face_index in 0..self.faces.len() {
            self.triangulate_face(face_index, params, &mut mesh);
        }
        tracing::debug!(
            faces = self.faces.len(),
            triangles = mesh.triangle_count(),
            "built render mesh"
        );
        mesh
    }

    /// One quad per edge, `half_width` to either side of the edge line.
    pub fn build_outline_mesh(&self, half_width: f32) -> RenderMesh {
        let mut mesh = RenderMesh::with_capacity(self.edges.len() * 4, self.edges.len() * 6);
        for edge in &self.edges {
            if mesh.vertices.len() + 4 > u16::MAX as usize + 1 {
                tracing::warn!("outline mesh index space exhausted");
                break;
            }
            let (Some(v0), Some(v1)) = (self.vertices.get(edge.v0), self.vertices.get(edge.v1)) else {
                continue;
            };
            let n = crate::geometry::perpendicular(normalize_or_zero(v1.position - v0.position));
            let base = mesh.vertices.len() as u16;

            for (position, source) in [
                (v0.position - n * half_width, v0),
                (v0.position + n * half_width, v0),
                (v1.position + n * half_width, v1),
                (v1.position - n * half_width, v1),
            ] {
                let mut vertex = MeshVertex::new(position);
                for slot in 0..MAX_VERTEX_WEIGHTS {
                    vertex.bone_indices[slot] = source.weights[slot].bone;
                    vertex.bone_weights[slot] = source.weights[slot].weight;
                }
                mesh.add_vertex(vertex);
            }
            mesh.add_triangle(base, base + 1, base + 3);
            mesh.add_triangle(base + 1, base + 2, base + 3);
        }
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{signed_area, Curve};
    use approx::assert_relative_eq;

    fn v(x: f32, y: f32) -> Vec2 {
        Vec2::new(x, y)
    }

    fn triangles_area(points: &[Vec2], triangles: &[[usize; 3]]) -> f32 {
        triangles
            .iter()
            .map(|&[a, b, c]| cross(points[b] - points[a], points[c] - points[a]) * 0.5)
            .sum()
    }

    #[test]
    fn convex_polygon() {
        let hexagon: Vec<Vec2> = (0..6)
            .map(|i| {
                let angle = i as f32 * std::f32::consts::TAU / 6.0;
                v(angle.cos(), angle.sin())
            })
            .collect();
        let triangles = ear_clip(&hexagon);
        assert_eq!(triangles.len(), 4);
        assert_relative_eq!(triangles_area(&hexagon, &triangles), signed_area(&hexagon), epsilon = 1e-5);
    }

    #[test]
    fn concave_polygon() {
        // L shape
        let points = [
            v(0.0, 0.0),
            v(2.0, 0.0),
            v(2.0, 1.0),
            v(1.0, 1.0),
            v(1.0, 2.0),
            v(0.0, 2.0),
        ];
        let triangles = ear_clip(&points);
        assert_eq!(triangles.len(), 4);
        assert_relative_eq!(triangles_area(&points, &triangles), 3.0, epsilon = 1e-5);
        for &[a, b, c] in &triangles {
            assert!(cross(points[b] - points[a], points[c] - points[a]) > 0.0);
        }
    }

    #[test]
    fn collinear_points_still_terminate() {
        let points = [v(0.0, 0.0), v(1.0, 0.0), v(2.0, 0.0), v(3.0, 0.0), v(1.5, 0.0)];
        let triangles = ear_clip(&points);
        assert_eq!(triangles.len(), 3);
    }

    #[test]
    fn too_few_points() {
        assert!(ear_clip(&[v(0.0, 0.0), v(1.0, 0.0)]).is_empty());
        assert_eq!(ear_clip(&[v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)]).len(), 1);
    }

    #[test]
    fn curved_edge_is_flattened() {
        let mut frame = Frame::new();
        for (x, y) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            frame.add_vertex(v(x, y)).unwrap();
        }
        frame.add_face(&[0, 1, 2, 3], 5).unwrap();
        let edge = frame.edge_between(0, 1).unwrap();
        frame
            .set_edge_curve(edge, Curve::new(v(0.0, -1.0), 1.0))
            .unwrap();

        let mut mesh = RenderMesh::new();
        let count = frame.triangulate_face(0, &RenderParams::default(), &mut mesh);

        // 8 points for the curved edge plus one per straight edge
        assert_eq!(mesh.vertices.len(), 11);
        assert_eq!(count, 9);
        // the bulge adds two thirds of the control triangle (1 * 2 / 2 * 2/3)
        assert_relative_eq!(mesh.signed_area(), 4.0 + 2.0 / 3.0, epsilon = 0.05);
        assert_relative_eq!(mesh.vertices[0].uv, v(5.0, 0.0));
    }

    #[test]
    fn outline_has_quad_per_edge() {
        let mut frame = Frame::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
            frame.add_vertex(v(x, y)).unwrap();
        }
        frame.add_face(&[0, 1, 2], 0).unwrap();
        let outline = frame.build_outline_mesh(0.1);
        assert_eq!(outline.vertices.len(), 12);
        assert_eq!(outline.triangle_count(), 6);
    }

    #[test]
    fn depth_mapping() {
        assert_relative_eq!(RenderParams::from_mesh_depth(0, 0).depth, 0.01);
        assert_relative_eq!(RenderParams::from_mesh_depth(100, 0).depth, 1.0);
    }
}
