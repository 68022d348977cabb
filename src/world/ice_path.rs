//! Ice path evolution
//!
//! Every active path is keyed by its root lane and advanced one row at a time:
//!
//! 1. Spawn pass: roll the spawn layer for each slot left to right and reserve
//!    the start footprint when the roll hits and the cells are free.
//! 2. Evolution pass: fresh paths emit the start shape; turning paths shift
//!    half a cell and then, like every other path, roll a transition
//!    (`Flat`, `Expand`, `Contract`, `Turn`, `End`). A transition that cannot
//!    be honoured falls back to `Flat`.
//! 3. Deletion pass: ended paths release whatever they still hold.
//!
//! The engine owns the occupancy grid; nothing else writes to it.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand_pcg::Pcg32;

use super::grid::{LaneX, OccupancyGrid};
use super::layers::{LayerKind, LayerRegistry, PathTransition};
use crate::assets::{AssetCatalog, PathShape};
use crate::consts::{MAX_PATH_SIZE_CLASS, MIN_PATH_SIZE_CLASS};
use crate::to_half_cells;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnDirection {
    #[default]
    None,
    Left,
    Right,
}

impl TurnDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnDirection::None => "None",
            TurnDirection::Left => "Left",
            TurnDirection::Right => "Right",
        }
    }

    /// Lateral step in half cells
    fn step(self) -> i32 {
        match self {
            TurnDirection::None => 0,
            TurnDirection::Left => -1,
            TurnDirection::Right => 1,
        }
    }
}

/// Generation-side state of one ice path
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveIcePath {
    pub root: LaneX,
    pub thickness: f32,
    pub size_class: u8,
    /// Y of the last row this path was placed on
    pub y: f32,
    pub shape_id: String,
    pub turn: TurnDirection,
    pub spawned: bool,
    /// Footprint cells, ascending
    pub occupied: Vec<LaneX>,
    /// Cells reserved ahead of a turn
    pub pending: BTreeSet<LaneX>,
}

impl ActiveIcePath {
    pub fn is_turning(&self) -> bool {
        self.turn != TurnDirection::None
    }

    fn half_thickness(&self) -> i32 {
        to_half_cells(self.thickness)
    }

    /// Every cell this path holds in the grid
    pub fn cells(&self) -> impl Iterator<Item = LaneX> + '_ {
        self.occupied.iter().chain(self.pending.iter()).copied()
    }
}

/// A shape to place for the current row
#[derive(Debug, Clone, PartialEq)]
pub struct PathPlacement {
    pub key: LaneX,
    pub shape_id: String,
    pub x: f32,
    pub y: f32,
    pub thickness: f32,
    pub size_class: u8,
    pub starting: bool,
}

impl PathPlacement {
    fn new(path: &ActiveIcePath, shape: &PathShape, y: f32, starting: bool) -> Self {
        Self {
            key: path.root,
            shape_id: shape.id.clone(),
            x: path.root.to_world() + shape.lateral_offset,
            y,
            thickness: shape.thickness,
            size_class: shape.size_class,
            starting,
        }
    }
}

/// Lateral borders of the row being evolved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBorders {
    pub left: f32,
    pub right: f32,
}

impl RowBorders {
    fn contains(&self, x: f32) -> bool {
        x >= self.left && x <= self.right
    }

    /// A cell with one unit of clearance on both sides
    fn fits_with_margin(&self, x: f32) -> bool {
        x - 1.0 >= self.left && x + 1.0 <= self.right
    }
}

#[derive(Debug, Clone)]
pub struct IcePathEngine {
    paths: BTreeMap<LaneX, ActiveIcePath>,
    grid: OccupancyGrid,
    turn_rng: Pcg32,
}

impl IcePathEngine {
    pub fn new(turn_rng: Pcg32) -> Self {
        Self {
            paths: BTreeMap::new(),
            grid: OccupancyGrid::new(),
            turn_rng,
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &ActiveIcePath> {
        self.paths.values()
    }

    pub fn path(&self, key: LaneX) -> Option<&ActiveIcePath> {
        self.paths.get(&key)
    }

    pub fn active_count(&self) -> usize {
        self.paths.len()
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn is_occupied(&self, x: LaneX) -> bool {
        self.grid.is_occupied(x)
    }

    /// Drop every path and free the grid
    pub fn clear(&mut self) {
        self.paths.clear();
        self.grid.clear();
    }

    /// Register a path at `root` if the start footprint is free
    pub fn try_spawn(&mut self, root: LaneX, start: &PathShape) -> bool {
        if self.paths.contains_key(&root) {
            return false;
        }
        let th = to_half_cells(start.thickness);
        let Some(cells) = self.grid.try_reserve(root.offset(-th), root.offset(th)) else {
            return false;
        };
        self.paths.insert(
            root,
            ActiveIcePath {
                root,
                thickness: start.thickness,
                size_class: start.size_class,
                y: 0.0,
                shape_id: String::new(),
                turn: TurnDirection::None,
                spawned: false,
                occupied: cells,
                pending: BTreeSet::new(),
            },
        );
        true
    }

    /// Advance every path by one row
    pub fn update_row(
        &mut self,
        y: f32,
        borders: RowBorders,
        layers: &mut LayerRegistry,
        catalog: &dyn AssetCatalog,
        start_shape_id: &str,
    ) -> Vec<PathPlacement> {
        let start = catalog
            .starting_path_shape(start_shape_id)
            .or_else(|| catalog.path_shape(start_shape_id));
        let Some(start) = start else {
            log::error!("Starting ice path shape '{}' not found", start_shape_id);
            return Vec::new();
        };

        self.spawn_pass(borders, layers, start);

        let mut placements = Vec::new();
        let mut ended = Vec::new();
        let keys: Vec<LaneX> = self.paths.keys().copied().collect();

        for key in keys {
            let Some(mut path) = self.paths.remove(&key) else {
                continue;
            };
            path.y = y;

            if !path.spawned {
                path.spawned = true;
                path.shape_id = start.id.clone();
                path.size_class = start.size_class;
                placements.push(PathPlacement::new(&path, start, y, true));
                self.paths.insert(path.root, path);
                continue;
            }

            if path.is_turning() {
                self.shift(&mut path);
            }

            if self.evolve(&mut path, y, borders, layers, catalog, &mut placements) {
                ended.push(path);
            } else {
                self.paths.insert(path.root, path);
            }
        }

        for path in ended {
            let cells: Vec<LaneX> = path.cells().collect();
            self.grid.release_all(&cells);
            log::debug!("Ice path at {:?} ended", path.root);
        }

        placements
    }

    fn spawn_pass(&mut self, borders: RowBorders, layers: &mut LayerRegistry, start: &PathShape) {
        let lo = LaneX::from_world(borders.left + 2.0);
        let hi = LaneX::from_world(borders.right);
        for x in lo.0..hi.0 {
            match layers.roll(LayerKind::IcePathSpawn) {
                None | Some("Empty") => continue,
                Some(_) => {}
            }
            self.try_spawn(LaneX(x), start);
        }
    }

    /// Move a turning path half a cell, swapping its footprint in one step
    fn shift(&mut self, path: &mut ActiveIcePath) {
        let step = path.turn.step();
        let old: Vec<LaneX> = path.cells().collect();
        let shifted: Vec<LaneX> = path.occupied.iter().map(|c| c.offset(step)).collect();
        self.grid.swap(&old, &shifted);

        path.occupied = shifted;
        path.pending.clear();
        path.root = path.root.offset(step);
        path.turn = TurnDirection::None;
    }

    /// Roll and apply this row's transition. Returns true if the path ended.
    fn evolve(
        &mut self,
        path: &mut ActiveIcePath,
        y: f32,
        borders: RowBorders,
        layers: &mut LayerRegistry,
        catalog: &dyn AssetCatalog,
        placements: &mut Vec<PathPlacement>,
    ) -> bool {
        let rolled = layers
            .roll(LayerKind::IcePath)
            .and_then(PathTransition::from_label)
            .unwrap_or(PathTransition::Flat);

        let applied = match rolled {
            PathTransition::Turn => self.try_turn(path, borders, catalog),
            PathTransition::Expand => self.try_expand(path, borders, catalog),
            PathTransition::Contract => self.try_contract(path, catalog),
            PathTransition::Flat | PathTransition::End => None,
        };
        if let Some(shape) = applied {
            placements.push(PathPlacement::new(path, shape, y, false));
            return false;
        }

        let mut transition = match rolled {
            PathTransition::End => PathTransition::End,
            _ => PathTransition::Flat,
        };
        if !borders.contains(path.root.to_world()) {
            transition = PathTransition::End;
        }

        let shape_id = format!("Path{}{}", path.size_class, transition.as_str());
        match catalog.path_shape(&shape_id) {
            Some(shape) => {
                path.shape_id = shape_id;
                placements.push(PathPlacement::new(path, shape, y, false));
            }
            None => log::warn!("Ice path shape '{}' not found", shape_id),
        }

        transition == PathTransition::End
    }

    fn try_turn<'a>(
        &mut self,
        path: &mut ActiveIcePath,
        borders: RowBorders,
        catalog: &'a dyn AssetCatalog,
    ) -> Option<&'a PathShape> {
        let direction = if self.turn_rng.random_bool(0.5) {
            TurnDirection::Left
        } else {
            TurnDirection::Right
        };
        let step = direction.step();
        let th = path.half_thickness();
        let lead = path.root.offset(step * (th + 1));
        let buffer = lead.offset(step);

        if self.grid.is_occupied(lead) || self.grid.is_occupied(buffer) {
            return None;
        }
        if !borders.fits_with_margin(lead.to_world()) {
            return None;
        }
        let shape_id = format!("Path{}Turn{}", path.size_class, direction.as_str());
        let shape = catalog.path_shape(&shape_id)?;

        self.grid.occupy(lead);
        self.grid.occupy(buffer);
        path.pending.insert(lead);
        path.pending.insert(buffer);
        path.turn = direction;
        path.shape_id = shape_id;
        Some(shape)
    }

    fn try_expand<'a>(
        &mut self,
        path: &mut ActiveIcePath,
        borders: RowBorders,
        catalog: &'a dyn AssetCatalog,
    ) -> Option<&'a PathShape> {
        if path.size_class >= MAX_PATH_SIZE_CLASS {
            return None;
        }
        let th = path.half_thickness();
        let left = path.root.offset(-(th + 1));
        let right = path.root.offset(th + 1);

        if self.grid.is_occupied(left) || self.grid.is_occupied(right) {
            return None;
        }
        if !borders.fits_with_margin(left.to_world()) || !borders.fits_with_margin(right.to_world()) {
            return None;
        }
        let shape_id = format!("Path{}Expand", path.size_class);
        let shape = catalog.path_shape(&shape_id)?;

        self.grid.occupy(left);
        self.grid.occupy(right);
        path.occupied.insert(0, left);
        path.occupied.push(right);
        path.thickness = shape.thickness;
        path.size_class = shape.size_class;
        path.shape_id = shape_id;
        Some(shape)
    }

    fn try_contract<'a>(
        &mut self,
        path: &mut ActiveIcePath,
        catalog: &'a dyn AssetCatalog,
    ) -> Option<&'a PathShape> {
        if path.size_class <= MIN_PATH_SIZE_CLASS {
            return None;
        }
        let shape_id = format!("Path{}Contract", path.size_class);
        let shape = catalog.path_shape(&shape_id)?;

        let th = path.half_thickness();
        let left = path.root.offset(-th);
        let right = path.root.offset(th);
        self.grid.release(left);
        self.grid.release(right);
        path.occupied.retain(|&c| c != left && c != right);
        path.thickness = shape.thickness;
        path.size_class = shape.size_class;
        path.shape_id = shape_id;
        Some(shape)
    }
}
