//! Lateral occupancy tracking
//!
//! Lateral positions are quantised to half-cell integers at the boundary so
//! every map here has exact key equality.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{from_half_cells, to_half_cells};

/// Lateral position in half-cell units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneX(pub i32);

impl LaneX {
    pub fn from_world(x: f32) -> Self {
        LaneX(to_half_cells(x))
    }

    pub fn to_world(self) -> f32 {
        from_half_cells(self.0)
    }

    /// Shift by a number of half cells
    pub fn offset(self, half_cells: i32) -> Self {
        LaneX(self.0 + half_cells)
    }

    /// Inclusive half-cell range
    pub fn span(lo: LaneX, hi: LaneX) -> impl Iterator<Item = LaneX> {
        (lo.0..=hi.0).map(LaneX)
    }
}

/// Sparse set of occupied lateral cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyGrid {
    occupied: BTreeSet<LaneX>,
}

impl OccupancyGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_occupied(&self, x: LaneX) -> bool {
        self.occupied.contains(&x)
    }

    pub fn is_range_free(&self, lo: LaneX, hi: LaneX) -> bool {
        self.occupied.range(lo..=hi).next().is_none()
    }

    /// Occupy a cell; false if it was already taken
    pub fn occupy(&mut self, x: LaneX) -> bool {
        self.occupied.insert(x)
    }

    /// Free a cell; false if it was already free
    pub fn release(&mut self, x: LaneX) -> bool {
        self.occupied.remove(&x)
    }

    /// Occupy `lo..=hi` only if every cell is free
    pub fn try_reserve(&mut self, lo: LaneX, hi: LaneX) -> Option<Vec<LaneX>> {
        if !self.is_range_free(lo, hi) {
            return None;
        }
        let cells: Vec<LaneX> = LaneX::span(lo, hi).collect();
        self.occupied.extend(cells.iter().copied());
        Some(cells)
    }

    pub fn release_all(&mut self, cells: &[LaneX]) {
        for cell in cells {
            self.occupied.remove(cell);
        }
    }

    /// Replace one footprint with another in a single step
    ///
    /// Cells present in both sets are never released, so a neighbour can't
    /// claim them mid-swap.
    pub fn swap(&mut self, old: &[LaneX], new: &[LaneX]) {
        let keep: BTreeSet<LaneX> = new.iter().copied().collect();
        for cell in old {
            if !keep.contains(cell) {
                self.occupied.remove(cell);
            }
        }
        self.occupied.extend(keep);
    }

    pub fn occupied_cells(&self) -> impl Iterator<Item = LaneX> + '_ {
        self.occupied.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    pub fn clear(&mut self) {
        self.occupied.clear();
    }
}

/// What a column of the current batch holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChunkFlag {
    #[default]
    Empty,
    Obstacle,
}

/// Per-batch column flags, consulted while placing obstacles
#[derive(Debug, Clone, Default)]
pub struct ChunkRowFlags {
    flags: BTreeMap<LaneX, ChunkFlag>,
}

impl ChunkRowFlags {
    pub fn get(&self, x: LaneX) -> ChunkFlag {
        self.flags.get(&x).copied().unwrap_or_default()
    }

    pub fn set(&mut self, x: LaneX, flag: ChunkFlag) {
        self.flags.insert(x, flag);
    }

    pub fn is_empty_at(&self, x: LaneX) -> bool {
        self.get(x) == ChunkFlag::Empty
    }

    pub fn clear(&mut self) {
        self.flags.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_x_quantises() {
        assert_eq!(LaneX::from_world(1.5), LaneX(3));
        assert_eq!(LaneX(-3).to_world(), -1.5);
        assert_eq!(LaneX(2).offset(-3), LaneX(-1));
        assert_eq!(LaneX::span(LaneX(-1), LaneX(1)).count(), 3);
    }

    #[test]
    fn test_reserve_is_all_or_nothing() {
        let mut grid = OccupancyGrid::new();
        assert!(grid.try_reserve(LaneX(0), LaneX(4)).is_some());
        assert_eq!(grid.len(), 5);

        assert!(grid.try_reserve(LaneX(4), LaneX(8)).is_none());
        assert_eq!(grid.len(), 5);
        assert!(!grid.is_occupied(LaneX(5)));

        assert!(grid.try_reserve(LaneX(5), LaneX(6)).is_some());
    }

    #[test]
    fn test_swap_keeps_shared_cells() {
        let mut grid = OccupancyGrid::new();
        let old = grid.try_reserve(LaneX(0), LaneX(4)).unwrap();
        let new: Vec<LaneX> = LaneX::span(LaneX(1), LaneX(5)).collect();
        grid.swap(&old, &new);
        assert!(!grid.is_occupied(LaneX(0)));
        assert!(grid.is_occupied(LaneX(5)));
        assert_eq!(grid.len(), 5);
    }

    #[test]
    fn test_release_twice_is_harmless() {
        let mut grid = OccupancyGrid::new();
        grid.occupy(LaneX(2));
        assert!(grid.release(LaneX(2)));
        assert!(!grid.release(LaneX(2)));
        assert!(grid.is_empty());
    }

    #[test]
    fn test_row_flags_default_empty() {
        let mut flags = ChunkRowFlags::default();
        assert!(flags.is_empty_at(LaneX(7)));
        flags.set(LaneX(7), ChunkFlag::Obstacle);
        assert_eq!(flags.get(LaneX(7)), ChunkFlag::Obstacle);
        flags.clear();
        assert_eq!(flags.get(LaneX(7)), ChunkFlag::Empty);
    }
}
