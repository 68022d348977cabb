//! Streaming world generator
//!
//! [`World`] generates rows in batches, keeps every live chunk, sprite and ice
//! path in id-keyed registries, and recycles them through their pools once
//! they scroll past the destroy line. The first chunk of each batch is armed
//! with a one-shot threshold; when it fires the next batch is generated, so
//! the slope streams forward indefinitely.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::Serialize;

use super::entity::MovementBounds;
use super::grid::ChunkRowFlags;
use super::ice_path::{IcePathEngine, PathPlacement, RowBorders};
use super::lane::LaneState;
use super::layers::{LayerKind, LayerRegistry};
use super::objects::{WorldChunk, WorldIcePath, WorldSprite};
use super::pool::{EntityId, ObjectPool, PoolStats, Poolable};
use super::state::{RngState, SimContext, WorldEvent};
use crate::assets::{AssetCatalog, PlayerFeed, SpriteLibrary};
use crate::consts::{FIXED_TICKS_PER_SEC, MPS_TO_KMH};
use crate::error::WorldGenError;
use crate::maps::{WeightIdentity, WeightedMapData};
use crate::settings::GeneratorSettings;

/// PCG stream used for turn directions
const TURN_STREAM: u64 = 64;

pub struct World {
    pub(super) settings: GeneratorSettings,
    pub(super) layers: LayerRegistry,
    pub(super) lane: LaneState,
    pub(super) engine: IcePathEngine,
    pub(super) row_flags: ChunkRowFlags,

    pub(super) chunk_pool: ObjectPool<WorldChunk>,
    pub(super) sprite_pool: ObjectPool<WorldSprite>,
    path_pool: ObjectPool<WorldIcePath>,

    pub(super) chunks: BTreeMap<EntityId, WorldChunk>,
    pub(super) sprites: BTreeMap<EntityId, WorldSprite>,
    ice_paths: BTreeMap<EntityId, WorldIcePath>,

    first_path: bool,
    first_path_shape_id: String,
    /// Most recently created chunk
    pub(super) lead_chunk: Option<EntityId>,
    /// Chunk holding the pending generation threshold
    armed_chunk: Option<EntityId>,
    max_chunk_width: f32,
    chunk_count: u64,
    path_count: u64,
    rows_generated: u64,

    distance_travelled: f32,
    last_distance: f32,
    kmh: f32,

    pub(super) events: Vec<WorldEvent>,
}

impl World {
    pub fn new(settings: GeneratorSettings) -> Result<Self, WorldGenError> {
        settings.validate()?;

        let lane = LaneState::new(
            settings.world_edge_size,
            settings.min_world_edge_size,
            settings.max_world_edge_size,
            settings.default_x_offset,
            settings.max_x_offset,
        );
        let turn_rng = RngState::new(settings.obstacle_seed, TURN_STREAM).to_rng();

        Ok(Self {
            chunk_pool: ObjectPool::new("chunks", settings.chunk_pool)?,
            sprite_pool: ObjectPool::new("sprites", settings.sprite_pool)?,
            path_pool: ObjectPool::new("ice_paths", settings.path_pool)?,
            layers: LayerRegistry::new(),
            lane,
            engine: IcePathEngine::new(turn_rng),
            row_flags: ChunkRowFlags::default(),
            chunks: BTreeMap::new(),
            sprites: BTreeMap::new(),
            ice_paths: BTreeMap::new(),
            first_path: true,
            first_path_shape_id: settings.first_path_shape_id.clone(),
            lead_chunk: None,
            armed_chunk: None,
            max_chunk_width: 0.0,
            chunk_count: 0,
            path_count: 0,
            rows_generated: 0,
            distance_travelled: 0.0,
            last_distance: 0.0,
            kmh: 0.0,
            events: Vec::new(),
            settings,
        })
    }

    // === Configuration ===

    /// Select a map: edge sizes, every weighted layer and the camera width
    pub fn apply_map(&mut self, map: &WeightedMapData) {
        log::info!("Applying map '{}'", map.name);
        self.set_world_edge_size(map.world_edge_size, map.min_world_edge_size);

        let seed = self.settings.obstacle_seed;
        let tables: [(LayerKind, &[WeightIdentity]); 7] = [
            (LayerKind::Obstacle, map.obstacle_weights.as_slice()),
            (LayerKind::ObstacleIce, map.ice_obstacle_weights.as_slice()),
            (LayerKind::IcePathSpawn, map.ice_path_spawn_weights.as_slice()),
            (LayerKind::IcePath, map.ice_path_weights.as_slice()),
            (LayerKind::WorldEdge, map.world_edge_weights.as_slice()),
            (LayerKind::XOffset, map.world_x_offset_weights.as_slice()),
            (LayerKind::SnowVariation, map.snow_variation_weights.as_slice()),
        ];
        for (kind, table) in tables {
            // Snow decoration stays unseeded so menus differ run to run
            let seed = if kind == LayerKind::SnowVariation { 0 } else { seed };
            self.layers.set_layer(kind, table, seed);
        }

        self.set_max_chunk_width(map.max_ice_path_width);
    }

    /// Replace one weighted layer (seed 0 draws from entropy)
    pub fn set_layer_weight(&mut self, kind: LayerKind, table: &[WeightIdentity], seed: u64) {
        self.layers.set_layer(kind, table, seed);
    }

    pub fn set_first_path_shape(&mut self, id: &str) {
        self.first_path_shape_id = id.to_string();
    }

    /// Starting (and largest) edge size plus the smallest edge size
    pub fn set_world_edge_size(&mut self, size: f32, min_size: f32) {
        self.settings.world_edge_size = size;
        self.settings.max_world_edge_size = size;
        self.settings.min_world_edge_size = min_size;
        self.lane.min_edge_size = min_size;
        self.lane.max_edge_size = size;
        self.lane.left_edge = size;
        self.lane.right_edge = size;
    }

    pub fn set_max_chunk_width(&mut self, width: f32) {
        self.max_chunk_width = width;
    }

    /// Broadcast a new world speed to every moving entity
    pub fn set_world_speed(&mut self, speed: f32) {
        self.settings.world_speed = speed;
        let effective = self.effective_speed();
        for chunk in self.chunks.values_mut() {
            chunk.object.set_speed(effective);
        }
        for sprite in self.sprites.values_mut().filter(|s| !s.is_chunked()) {
            sprite.object.set_speed(effective);
        }
        for path in self.ice_paths.values_mut() {
            path.object.set_speed(effective);
        }
        self.events.push(WorldEvent::WorldSpeedChanged(effective));
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.settings.time_scale = scale;
        self.set_world_speed(self.settings.world_speed);
    }

    pub(super) fn effective_speed(&self) -> f32 {
        self.settings.effective_world_speed()
    }

    pub(super) fn movement_bounds(&self) -> MovementBounds {
        MovementBounds::new(self.settings.world_destroy_y, self.settings.world_gen_y_height)
    }

    // === Generation ===

    /// Generate the next batch of rows below the last one
    pub fn generate_next_batch(&mut self, catalog: &dyn AssetCatalog, sprites: &dyn SpriteLibrary) {
        if self.first_path {
            self.chunk_count = 0;
            self.path_count = 0;
        }

        let start_y = if self.first_path {
            self.settings.world_origin_y
        } else {
            match self.lead_chunk.and_then(|id| self.chunks.get(&id)) {
                Some(chunk) => chunk.object.position.y - 1.0,
                None => {
                    log::warn!("Lead chunk missing, restarting rows at the world origin");
                    self.settings.world_origin_y
                }
            }
        };

        // Obstacle flags hold for the whole batch
        self.row_flags.clear();

        let rows = self.settings.forward_generation_distance;
        log::debug!("Generating {} rows from y={}", rows, start_y);

        for i in 0..rows {
            let y = start_y - i as f32;

            self.lane.randomize(&mut self.layers, self.settings.right_edge_inset);

            let chunk_id = self.create_chunk(y);
            self.generate_ice_paths(y, catalog);
            self.generate_chunk_obstacles(y, catalog, sprites);
            self.generate_row_edge(y, catalog, sprites);

            if i == 0 {
                if let Some(chunk) = self.chunks.get_mut(&chunk_id) {
                    chunk.object.arm_threshold();
                    self.armed_chunk = Some(chunk_id);
                }
            }

            self.chunk_count += 1;
            self.path_count += 1;
            self.rows_generated += 1;
            self.events.push(WorldEvent::RowGenerated {
                row: self.rows_generated,
                y,
            });
        }

        self.first_path = false;
    }

    fn create_chunk(&mut self, y: f32) -> EntityId {
        let speed = self.effective_speed();
        let bounds = self.movement_bounds();

        let mut chunk = self.chunk_pool.acquire();
        chunk.object.initialize(Vec2::new(0.0, y), speed, bounds);
        chunk.count_id = self.chunk_count;
        chunk.arm_offset_threshold(self.settings.x_offset_shift_height, self.lane.offset);

        let id = chunk.id();
        self.chunks.insert(id, chunk);
        self.lead_chunk = Some(id);
        id
    }

    fn generate_ice_paths(&mut self, y: f32, catalog: &dyn AssetCatalog) {
        let borders = RowBorders {
            left: self.lane.left_border(),
            right: self.lane.right_border(),
        };
        let placements = self.engine.update_row(
            y,
            borders,
            &mut self.layers,
            catalog,
            &self.first_path_shape_id,
        );
        for placement in &placements {
            self.spawn_ice_path(placement);
        }
    }

    fn spawn_ice_path(&mut self, placement: &PathPlacement) {
        let speed = self.effective_speed();
        let bounds = self.movement_bounds();

        let mut path = self.path_pool.acquire();
        path.object
            .initialize(Vec2::new(placement.x, placement.y), speed, bounds);
        path.shape_id = placement.shape_id.clone();
        path.lane = placement.key;
        path.thickness = placement.thickness;
        path.size_class = placement.size_class;
        path.starting = placement.starting;
        self.ice_paths.insert(path.id(), path);
    }

    /// Generate the next batch early when the AI racer closes in on the
    /// newest row
    pub fn check_ai_reached_gen_threshold(
        &mut self,
        y: f32,
        threshold: f32,
        catalog: &dyn AssetCatalog,
        sprites: &dyn SpriteLibrary,
    ) -> bool {
        let Some(lead_y) = self
            .lead_chunk
            .and_then(|id| self.chunks.get(&id))
            .map(|chunk| chunk.object.position.y)
        else {
            return false;
        };
        if y - lead_y >= threshold {
            return false;
        }

        self.events
            .push(WorldEvent::AiGenerationThresholdReached { y, threshold });
        self.disarm_pending_threshold();
        self.generate_next_batch(catalog, sprites);
        true
    }

    fn disarm_pending_threshold(&mut self) {
        if let Some(id) = self.armed_chunk.take()
            && let Some(chunk) = self.chunks.get_mut(&id)
        {
            chunk.object.disarm_threshold();
        }
    }

    // === Ticking ===

    /// Fixed-timestep movement and distance metrics
    pub fn fixed_update(&mut self, ctx: &SimContext) {
        if ctx.paused {
            return;
        }

        for chunk in self.chunks.values_mut() {
            chunk.object.fixed_update(ctx);
        }
        for sprite in self.sprites.values_mut() {
            match sprite.parent.and_then(|id| self.chunks.get(&id)) {
                Some(chunk) => sprite.object.position = chunk.object.position + sprite.local_offset,
                None => sprite.object.fixed_update(ctx),
            }
        }
        for path in self.ice_paths.values_mut() {
            path.object.fixed_update(ctx);
        }

        self.update_distance_travelled(self.effective_speed());
    }

    fn update_distance_travelled(&mut self, speed: f32) {
        self.distance_travelled += speed;
        self.events
            .push(WorldEvent::DistanceTravelled(self.distance_travelled));

        let metres_per_second = (self.distance_travelled - self.last_distance) * FIXED_TICKS_PER_SEC;
        self.kmh = metres_per_second * MPS_TO_KMH;
        self.events.push(WorldEvent::KmhUpdated(self.kmh));

        self.last_distance = self.distance_travelled;
    }

    /// Per-tick logic: destroy lines, thresholds, camera shifts and pool trim
    pub fn update(
        &mut self,
        ctx: &SimContext,
        catalog: &dyn AssetCatalog,
        sprites: &dyn SpriteLibrary,
        player: &dyn PlayerFeed,
    ) {
        if !ctx.paused {
            self.update_entities(ctx, catalog, sprites, player);
        }

        self.chunk_pool.trim();
        self.sprite_pool.trim();
        self.path_pool.trim();
    }

    fn update_entities(
        &mut self,
        ctx: &SimContext,
        catalog: &dyn AssetCatalog,
        sprites: &dyn SpriteLibrary,
        player: &dyn PlayerFeed,
    ) {
        let mut dead_chunks = Vec::new();
        let mut generate = false;
        let mut offset_shifts = 0;

        for (&id, chunk) in self.chunks.iter_mut() {
            let signals = chunk.object.update(ctx);
            if chunk.check_offset_threshold() {
                offset_shifts += 1;
            }
            if signals.reached_threshold && self.armed_chunk == Some(id) {
                generate = true;
            }
            if signals.destroy {
                dead_chunks.push(id);
            }
        }

        let dead_sprites: Vec<EntityId> = self
            .sprites
            .iter_mut()
            .filter(|(_, sprite)| !sprite.is_chunked())
            .filter_map(|(&id, sprite)| sprite.object.update(ctx).destroy.then_some(id))
            .collect();
        let dead_paths: Vec<EntityId> = self
            .ice_paths
            .iter_mut()
            .filter_map(|(&id, path)| path.object.update(ctx).destroy.then_some(id))
            .collect();

        for _ in 0..offset_shifts {
            self.evaluate_camera_shift(player);
        }

        for id in dead_chunks {
            self.release_chunk(id);
        }
        for id in dead_sprites {
            self.release_sprite(id);
        }
        for id in dead_paths {
            self.release_ice_path(id);
        }

        if generate {
            self.armed_chunk = None;
            self.generate_next_batch(catalog, sprites);
        }
    }

    /// Movement tick followed by the logic tick
    pub fn tick(
        &mut self,
        ctx: &SimContext,
        catalog: &dyn AssetCatalog,
        sprites: &dyn SpriteLibrary,
        player: &dyn PlayerFeed,
    ) {
        self.fixed_update(ctx);
        self.update(ctx, catalog, sprites, player);
    }

    fn evaluate_camera_shift(&mut self, player: &dyn PlayerFeed) {
        let left_edge = self.lane.offset - self.max_chunk_width;
        let right_edge = self.lane.offset + self.max_chunk_width;
        let player_x = player.player_x();
        let center = player_x.trunc() + 1.0;

        let near_left = (left_edge - player_x).abs() < self.settings.x_offset_player_diff;
        let near_right = (right_edge - player_x).abs() < self.settings.x_offset_player_diff;
        let near_center = center - player_x <= 1.0;

        if near_left || near_right || near_center {
            self.events
                .push(WorldEvent::CameraShiftRequested(player_x.trunc()));
        }
    }

    // === Release ===

    pub(super) fn release_chunk(&mut self, id: EntityId) {
        let Some(chunk) = self.chunks.remove(&id) else {
            return;
        };
        for child in &chunk.children {
            if let Some(sprite) = self.sprites.remove(child) {
                self.sprite_pool.release(sprite);
            }
        }
        if self.armed_chunk == Some(id) {
            self.armed_chunk = None;
        }
        self.chunk_pool.release(chunk);
    }

    pub(super) fn release_sprite(&mut self, id: EntityId) {
        let Some(sprite) = self.sprites.remove(&id) else {
            return;
        };
        if let Some(parent) = sprite.parent.and_then(|p| self.chunks.get_mut(&p)) {
            parent.children.retain(|&child| child != id);
        }
        self.sprite_pool.release(sprite);
    }

    fn release_ice_path(&mut self, id: EntityId) {
        if let Some(path) = self.ice_paths.remove(&id) {
            self.path_pool.release(path);
        }
    }

    /// Destroy everything and reset generation to a fresh world
    pub fn clear_world(&mut self) {
        log::info!("Clearing world");
        self.disarm_pending_threshold();

        let chunk_ids: Vec<EntityId> = self.chunks.keys().copied().collect();
        for id in chunk_ids {
            if let Some(chunk) = self.chunks.get_mut(&id) {
                chunk.object.set_as_destroyed();
            }
            self.release_chunk(id);
        }
        let sprite_ids: Vec<EntityId> = self.sprites.keys().copied().collect();
        for id in sprite_ids {
            self.release_sprite(id);
        }
        let path_ids: Vec<EntityId> = self.ice_paths.keys().copied().collect();
        for id in path_ids {
            self.release_ice_path(id);
        }

        self.engine.clear();
        self.row_flags.clear();
        self.lane
            .reset(self.settings.world_edge_size, self.settings.default_x_offset);
        self.lead_chunk = None;
        self.armed_chunk = None;
        self.chunk_count = 0;
        self.path_count = 0;
        self.distance_travelled = 0.0;
        self.last_distance = 0.0;
        self.first_path = true;

        self.events.push(WorldEvent::WorldCleared);
    }

    // === Accessors ===

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn lane(&self) -> &LaneState {
        &self.lane
    }

    pub fn ice_path_engine(&self) -> &IcePathEngine {
        &self.engine
    }

    pub fn chunks(&self) -> impl Iterator<Item = &WorldChunk> {
        self.chunks.values()
    }

    pub fn chunk(&self, id: EntityId) -> Option<&WorldChunk> {
        self.chunks.get(&id)
    }

    pub fn sprites(&self) -> impl Iterator<Item = &WorldSprite> {
        self.sprites.values()
    }

    pub fn sprite(&self, id: EntityId) -> Option<&WorldSprite> {
        self.sprites.get(&id)
    }

    pub fn ice_paths(&self) -> impl Iterator<Item = &WorldIcePath> {
        self.ice_paths.values()
    }

    pub fn lead_chunk(&self) -> Option<EntityId> {
        self.lead_chunk
    }

    pub fn armed_chunk(&self) -> Option<EntityId> {
        self.armed_chunk
    }

    pub fn is_first_path(&self) -> bool {
        self.first_path
    }

    pub fn rows_generated(&self) -> u64 {
        self.rows_generated
    }

    pub fn chunk_count_id(&self) -> u64 {
        self.chunk_count
    }

    pub fn path_count_id(&self) -> u64 {
        self.path_count
    }

    pub fn world_speed(&self) -> f32 {
        self.settings.world_speed
    }

    pub fn distance_travelled(&self) -> f32 {
        self.distance_travelled
    }

    pub fn kmh(&self) -> f32 {
        self.kmh
    }

    pub fn chunk_pool(&self) -> &ObjectPool<WorldChunk> {
        &self.chunk_pool
    }

    pub fn sprite_pool(&self) -> &ObjectPool<WorldSprite> {
        &self.sprite_pool
    }

    pub fn path_pool(&self) -> &ObjectPool<WorldIcePath> {
        &self.path_pool
    }

    pub fn summary(&self) -> WorldSummary {
        WorldSummary {
            rows_generated: self.rows_generated,
            active_chunks: self.chunks.len(),
            active_sprites: self.sprites.len(),
            active_ice_paths: self.ice_paths.len(),
            evolving_paths: self.engine.active_count(),
            occupied_cells: self.engine.grid().len(),
            left_border: self.lane.left_border(),
            right_border: self.lane.right_border(),
            distance_travelled: self.distance_travelled,
            kmh: self.kmh,
            chunk_pool: PoolSummary::of(&self.chunk_pool),
            sprite_pool: PoolSummary::of(&self.sprite_pool),
            path_pool: PoolSummary::of(&self.path_pool),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolSummary {
    pub inactive: usize,
    pub stats: PoolStats,
}

impl PoolSummary {
    fn of<T: Poolable>(pool: &ObjectPool<T>) -> Self {
        Self {
            inactive: pool.len(),
            stats: pool.stats(),
        }
    }
}

/// Snapshot of a running world
#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    pub rows_generated: u64,
    pub active_chunks: usize,
    pub active_sprites: usize,
    pub active_ice_paths: usize,
    pub evolving_paths: usize,
    pub occupied_cells: usize,
    pub left_border: f32,
    pub right_border: f32,
    pub distance_travelled: f32,
    pub kmh: f32,
    pub chunk_pool: PoolSummary,
    pub sprite_pool: PoolSummary,
    pub path_pool: PoolSummary,
}
