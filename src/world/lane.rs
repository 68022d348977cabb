//! Traversable lane: edges and lateral drift

use serde::{Deserialize, Serialize};

use super::layers::{LayerKind, LayerRegistry};
use crate::consts::HALF_CELL;

/// Lateral extent of the row being generated
///
/// The left border is `-left_edge + offset` and the right border is
/// `right_edge + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneState {
    pub left_edge: f32,
    pub right_edge: f32,
    pub offset: f32,
    pub max_offset: f32,
    pub min_edge_size: f32,
    pub max_edge_size: f32,
    /// The offset drifted this row
    pub shifted: bool,
}

impl LaneState {
    pub fn new(edge_size: f32, min_edge_size: f32, max_edge_size: f32, offset: f32, max_offset: f32) -> Self {
        Self {
            left_edge: edge_size,
            right_edge: edge_size,
            offset,
            max_offset,
            min_edge_size,
            max_edge_size,
            shifted: false,
        }
    }

    /// Restore symmetric edges and the starting offset
    pub fn reset(&mut self, edge_size: f32, offset: f32) {
        self.left_edge = edge_size;
        self.right_edge = edge_size;
        self.offset = offset;
        self.shifted = false;
    }

    pub fn left_border(&self) -> f32 {
        -self.left_edge + self.offset
    }

    pub fn right_border(&self) -> f32 {
        self.right_edge + self.offset
    }

    /// Advance one row: drift the offset, then vary the edges unless the
    /// offset moved
    pub fn randomize(&mut self, layers: &mut LayerRegistry, right_inset: f32) {
        self.shifted = false;
        self.drift_offset(layers);
        self.vary_edges(layers, right_inset);
    }

    fn drift_offset(&mut self, layers: &mut LayerRegistry) {
        let step = match layers.roll(LayerKind::XOffset) {
            Some("Left") => -HALF_CELL,
            Some("Right") => HALF_CELL,
            _ => return,
        };
        let next = self.offset + step;
        if next.abs() > self.max_offset {
            return;
        }
        self.offset = next;
        self.shifted = true;
    }

    fn vary_edges(&mut self, layers: &mut LayerRegistry, right_inset: f32) {
        if self.shifted {
            return;
        }
        let Some((index, label)) = layers.roll_entry(LayerKind::WorldEdge) else {
            return;
        };
        // Index 0 is the no-variation slot
        if index == 0 {
            return;
        }
        let delta = match label {
            "Expand" => HALF_CELL,
            "Contract" => -HALF_CELL,
            _ => 0.0,
        };
        self.left_edge = (self.left_edge + delta).clamp(self.min_edge_size, self.max_edge_size);
        self.right_edge = self.left_edge - right_inset;
    }
}
