// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-vertex bone weights.
//!
//! Each vertex has [`MAX_VERTEX_WEIGHTS`] slots of `(bone, weight)`. A bone
//! appears in at most one slot, slots with weight `<= EPSILON` are empty, and
//! the weights of a vertex sum to at most 1.

use crate::config::{MAX_BONES, MAX_VERTEX_WEIGHTS};
use crate::error::Result;
use crate::frame::{Frame, VertexWeight};
use crate::geometry::EPSILON;

/// Weight slots of one vertex.
pub type Weights = [VertexWeight; MAX_VERTEX_WEIGHTS];

/// Blends two weight sets per bone index.
///
/// The result covers the union of bones present on either side, each
/// weighted `a * (1 - t) + b * t`. Entries at or below epsilon are dropped and
/// the strongest [`MAX_VERTEX_WEIGHTS`] are kept.
pub fn interpolate_weights(a: &Weights, b: &Weights, t: f32) -> Weights {
    let mut blended = [0.0f32; MAX_BONES];
    let mut present = [false; MAX_BONES];

    for (slots, factor) in [(a, 1.0 - t), (b, t)] {
        for slot in slots.iter().filter(|s| s.weight > EPSILON) {
            let bone = slot.bone as usize;
            if bone < MAX_BONES {
                blended[bone] += slot.weight * factor;
                present[bone] = true;
            }
        }
    }

    strongest(
        (0..MAX_BONES)
            .filter(|&bone| present[bone])
            .map(|bone| (bone, blended[bone])),
    )
}

/// Packs the strongest `(bone, weight)` pairs into slots.
fn strongest(candidates: impl Iterator<Item = (usize, f32)>) -> Weights {
    let mut pairs: Vec<(usize, f32)> = candidates.filter(|&(_, w)| w > EPSILON).collect();
    pairs.sort_by(|x, y| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0)));

    let mut out = [VertexWeight::default(); MAX_VERTEX_WEIGHTS];
    for (slot, (bone, weight)) in out.iter_mut().zip(pairs) {
        *slot = VertexWeight {
            bone: bone as u8,
            weight,
        };
    }
    out
}

/// Scales weights down so they sum to at most 1.
pub fn cap_weight_sum(weights: &mut Weights) {
    let total: f32 = weights.iter().map(|w| w.weight.max(0.0)).sum();
    if total > 1.0 {
        for slot in weights.iter_mut() {
            slot.weight /= total;
        }
    }
}

impl Frame {
    /// Weight of `bone` on vertex `v` (0 when absent).
    pub fn vertex_weight(&self, v: usize, bone: usize) -> f32 {
        self.vertex(v)
            .and_then(|vertex| {
                vertex
                    .weights
                    .iter()
                    .find(|s| s.weight > EPSILON && s.bone as usize == bone)
            })
            .map_or(0.0, |s| s.weight)
    }

    /// Sets the weight of `bone` on vertex `v`, clamped to `[0, 1]`.
    ///
    /// Reuses the bone's slot, else an empty slot, else replaces the weakest
    /// slot if the new weight is stronger. A zero weight removes the bone.
    /// Other bones are scaled down if the total would exceed 1.
    pub fn set_vertex_weight(&mut self, v: usize, bone: usize, weight: f32) -> Result<()> {
        self.check_vertex(v)?;
        Frame::check_bone(bone)?;
        let weight = weight.clamp(0.0, 1.0);
        let slots = &mut self.vertices[v].weights;

        let target = slots
            .iter()
            .position(|s| s.weight > EPSILON && s.bone as usize == bone)
            .or_else(|| slots.iter().position(|s| s.weight <= EPSILON))
            .or_else(|| {
                let (weakest, slot) = slots
                    .iter()
                    .enumerate()
                    .min_by(|x, y| x.1.weight.total_cmp(&y.1.weight))?;
                (slot.weight < weight).then_some(weakest)
            });

        if let Some(index) = target {
            slots[index] = if weight > EPSILON {
                VertexWeight {
                    bone: bone as u8,
                    weight,
                }
            } else {
                VertexWeight::default()
            };

            // keep the sum at most 1 by scaling the other bones
            let others: f32 = slots
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != index)
                .map(|(_, s)| s.weight.max(0.0))
                .sum();
            let room = 1.0 - weight;
            if others > room && others > EPSILON {
                let scale = room / others;
                for (i, slot) in slots.iter_mut().enumerate() {
                    if i != index {
                        slot.weight *= scale;
                    }
                }
            }
        }

        self.refresh_weights();
        Ok(())
    }

    /// Adds `delta` to the weight of `bone` on vertex `v`.
    pub fn add_vertex_weight(&mut self, v: usize, bone: usize, delta: f32) -> Result<()> {
        let current = self.vertex_weight(v, bone);
        self.set_vertex_weight(v, bone, current + delta)
    }

    /// Binds vertex `v` fully to a single bone.
    pub fn set_single_bone(&mut self, v: usize, bone: usize) -> Result<()> {
        self.check_vertex(v)?;
        Frame::check_bone(bone)?;
        let mut weights = [VertexWeight::default(); MAX_VERTEX_WEIGHTS];
        weights[0] = VertexWeight {
            bone: bone as u8,
            weight: 1.0,
        };
        self.vertices[v].weights = weights;
        self.refresh_weights();
        Ok(())
    }

    /// Removes all bone weights from vertex `v`.
    pub fn clear_vertex_weights(&mut self, v: usize) -> Result<()> {
        self.check_vertex(v)?;
        self.vertices[v].weights = [VertexWeight::default(); MAX_VERTEX_WEIGHTS];
        self.refresh_weights();
        Ok(())
    }

    /// Replaces the weights of `v` with the average of its edge neighbors.
    ///
    /// Returns `false` when no neighbor carries a weight.
    pub fn infer_weights_from_neighbors(&mut self, v: usize) -> Result<bool> {
        self.check_vertex(v)?;
        let neighbors = self.vertex_neighbors(v);
        if neighbors.is_empty() {
            return Ok(false);
        }

        let mut totals = [0.0f32; MAX_BONES];
        for &n in &neighbors {
            for slot in self.vertices[n].weights.iter().filter(|s| s.weight > EPSILON) {
                if let Some(total) = totals.get_mut(slot.bone as usize) {
                    *total += slot.weight;
                }
            }
        }

        let count = neighbors.len() as f32;
        let mut weights = strongest(
            totals
                .iter()
                .enumerate()
                .map(|(bone, &total)| (bone, total / count)),
        );
        if weights.iter().all(|s| s.weight <= EPSILON) {
            return Ok(false);
        }
        cap_weight_sum(&mut weights);

        self.vertices[v].weights = weights;
        self.refresh_weights();
        Ok(true)
    }

    fn refresh_weights(&mut self) {
        self.bone_count = self.count_bones();
        self.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;
    use approx::assert_relative_eq;

    fn weights(pairs: &[(u8, f32)]) -> Weights {
        let mut out = [VertexWeight::default(); MAX_VERTEX_WEIGHTS];
        for (slot, &(bone, weight)) in out.iter_mut().zip(pairs) {
            *slot = VertexWeight { bone, weight };
        }
        out
    }

    fn weight_of(w: &Weights, bone: u8) -> f32 {
        w.iter()
            .find(|s| s.bone == bone && s.weight > EPSILON)
            .map_or(0.0, |s| s.weight)
    }

    #[test]
    fn interpolation_unions_bones() {
        let a = weights(&[(1, 1.0)]);
        let b = weights(&[(2, 0.6), (1, 0.4)]);
        let mid = interpolate_weights(&a, &b, 0.5);
        assert_relative_eq!(weight_of(&mid, 1), 0.7);
        assert_relative_eq!(weight_of(&mid, 2), 0.3);
        let total: f32 = mid.iter().map(|s| s.weight).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn interpolation_drops_vanishing_bones() {
        let a = weights(&[(1, 1.0)]);
        let b = weights(&[(2, 1.0)]);
        let end = interpolate_weights(&a, &b, 1.0);
        assert_relative_eq!(weight_of(&end, 1), 0.0);
        assert_relative_eq!(weight_of(&end, 2), 1.0);
    }

    #[test]
    fn set_weight_reuses_and_removes_slots() {
        let mut frame = Frame::new();
        let v = frame.add_vertex(Vec2::zeros()).unwrap();
        frame.set_vertex_weight(v, 5, 0.4).unwrap();
        frame.set_vertex_weight(v, 5, 0.6).unwrap();
        assert_relative_eq!(frame.vertex_weight(v, 5), 0.6);
        let used = frame.vertex(v).unwrap().weights.iter().filter(|s| s.weight > 0.0).count();
        assert_eq!(used, 1);
        assert_eq!(frame.bone_count(), 1);

        frame.add_vertex_weight(v, 5, -1.0).unwrap();
        assert_relative_eq!(frame.vertex_weight(v, 5), 0.0);
        assert_eq!(frame.bone_count(), 0);
    }

    #[test]
    fn full_slots_replace_weakest_only_when_stronger() {
        let mut frame = Frame::new();
        let v = frame.add_vertex(Vec2::zeros()).unwrap();
        for (bone, w) in [(0, 0.1), (1, 0.2), (2, 0.3), (3, 0.4)] {
            frame.set_vertex_weight(v, bone, w).unwrap();
        }
        frame.set_vertex_weight(v, 9, 0.05).unwrap();
        assert_relative_eq!(frame.vertex_weight(v, 9), 0.0);
        frame.set_vertex_weight(v, 9, 0.25).unwrap();
        assert_relative_eq!(frame.vertex_weight(v, 9), 0.25);
        assert_relative_eq!(frame.vertex_weight(v, 0), 0.0);
    }

    #[test]
    fn bone_index_is_checked() {
        let mut frame = Frame::new();
        let v = frame.add_vertex(Vec2::zeros()).unwrap();
        assert!(frame.set_vertex_weight(v, MAX_BONES, 1.0).is_err());
        assert!(frame.set_single_bone(v, 70).is_err());
    }

    #[test]
    fn infer_from_neighbors_averages() {
        let mut frame = Frame::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
            frame.add_vertex(Vec2::new(x, y)).unwrap();
        }
        frame.add_face(&[0, 1, 2], 0).unwrap();
        frame.set_single_bone(1, 2).unwrap();
        frame.set_single_bone(2, 4).unwrap();

        assert!(frame.infer_weights_from_neighbors(0).unwrap());
        assert_relative_eq!(frame.vertex_weight(0, 2), 0.5);
        assert_relative_eq!(frame.vertex_weight(0, 4), 0.5);
    }
}
