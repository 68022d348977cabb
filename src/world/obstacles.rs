//! Obstacle placement, border trees, snow decoration and effect sprites

use glam::Vec2;
use serde::Serialize;

use super::generator::World;
use super::grid::{ChunkFlag, LaneX};
use super::layers::LayerKind;
use super::objects::SortLayer;
use super::pool::{EntityId, Poolable};
use crate::assets::{
    AssetCatalog, CollisionKind, EffectsSink, ObstacleDefinition, RampParameters, SpriteLibrary,
    EMPTY_SPRITE_ID,
};

/// Reaction the player controller applies after hitting an obstacle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollisionResponse {
    pub kind: CollisionKind,
    pub speed_penalty: Option<f32>,
    pub stun_duration: Option<f32>,
    pub ramp: Option<RampParameters>,
    /// Hit landed within the obstacle's centre distance
    pub center_hit: bool,
    /// The obstacle sprite was released
    pub destroyed: bool,
}

impl World {
    // === Row contents ===

    pub(super) fn generate_chunk_obstacles(
        &mut self,
        y: f32,
        catalog: &dyn AssetCatalog,
        sprites: &dyn SpriteLibrary,
    ) {
        let left = self.lane.left_border();
        let right = self.lane.right_border();

        let mut x = left.trunc() + 1.0;
        while x < right {
            self.check_generate_obstacle(x, y, right, catalog, sprites);
            self.generate_snow_variation(x, y, sprites);
            x += 1.0;
        }
    }

    fn check_generate_obstacle(
        &mut self,
        x: f32,
        y: f32,
        right_border: f32,
        catalog: &dyn AssetCatalog,
        sprites: &dyn SpriteLibrary,
    ) {
        let Some(id) = self.layers.roll(LayerKind::Obstacle).map(str::to_string) else {
            return;
        };
        if id == "Empty" {
            return;
        }

        let cell = LaneX::from_world(x);
        if self.row_flags.get(cell) == ChunkFlag::Obstacle || self.engine.is_occupied(cell) {
            return;
        }

        let Some(def) = catalog.obstacle(&id) else {
            log::error!("Obstacle '{}' not found in catalog", id);
            return;
        };
        if def.is_right_extended() && !self.right_extension_fits(x, right_border) {
            return;
        }
        if def.is_top_extended() && !self.top_extension_fits(x, def, catalog) {
            return;
        }

        self.create_obstacle(&id, Vec2::new(x, y), catalog, sprites);
    }

    fn right_extension_fits(&self, x: f32, right_border: f32) -> bool {
        let next = x + 1.0;
        if next >= right_border {
            return false;
        }
        let cell = LaneX::from_world(next);
        if self.row_flags.get(cell) == ChunkFlag::Obstacle {
            return false;
        }
        !self.engine.is_occupied(cell) && !self.engine.is_occupied(cell.offset(1))
    }

    /// Obtrusive top parts must not share a flagged column. Top parts are not placed.
    fn top_extension_fits(&self, x: f32, def: &ObstacleDefinition, catalog: &dyn AssetCatalog) -> bool {
        let cell = LaneX::from_world(x);
        def.top_extended
            .iter()
            .filter(|part| catalog.obstacle(part).is_some_and(|p| p.obtrusive))
            .all(|_| self.row_flags.get(cell) != ChunkFlag::Obstacle)
    }

    /// Place an obstacle and its right-extension parts on the lead chunk
    pub fn create_obstacle(
        &mut self,
        id: &str,
        position: Vec2,
        catalog: &dyn AssetCatalog,
        sprites: &dyn SpriteLibrary,
    ) -> Option<EntityId> {
        let Some(def) = catalog.obstacle(id) else {
            log::error!("Obstacle '{}' not found in catalog", id);
            return None;
        };
        let placed = position + def.offset;

        for (i, part) in def.right_extended.iter().enumerate() {
            let part_pos = Vec2::new(placed.x + i as f32 + 1.0, placed.y);
            let part_cell = LaneX::from_world(part_pos.x);
            if !self.row_flags.is_empty_at(part_cell) {
                continue;
            }
            self.create_obstacle(part, part_pos, catalog, sprites);
            if catalog.obstacle(part).is_some_and(|p| p.obtrusive) {
                self.row_flags.set(part_cell, ChunkFlag::Obstacle);
            }
        }

        let layer = if def.impassable {
            SortLayer::Impassable
        } else {
            SortLayer::Obstacle
        };
        let sprite_id = self.spawn_chunked_sprite(&def.sprite_id, placed, layer, sprites)?;
        if let Some(sprite) = self.sprites.get_mut(&sprite_id) {
            sprite.obstacle_id = Some(def.id.clone());
            sprite.collider_enabled = true;
        }
        self.row_flags
            .set(LaneX::from_world(position.x), ChunkFlag::Obstacle);
        Some(sprite_id)
    }

    fn generate_snow_variation(&mut self, x: f32, y: f32, sprites: &dyn SpriteLibrary) {
        let Some((index, label)) = self.layers.roll_entry(LayerKind::SnowVariation) else {
            return;
        };
        // Index 0 is bare snow
        if index == 0 {
            return;
        }
        let sprite_id = label.to_string();
        self.spawn_chunked_sprite(&sprite_id, Vec2::new(x, y), SortLayer::Ground, sprites);
    }

    /// Border trees at both lane edges
    pub(super) fn generate_row_edge(
        &mut self,
        y: f32,
        catalog: &dyn AssetCatalog,
        sprites: &dyn SpriteLibrary,
    ) {
        let border_id = self.settings.border_obstacle_id.clone();
        let left = self.lane.left_border();
        let right = self.lane.right_border();
        self.create_obstacle(&border_id, Vec2::new(left, y), catalog, sprites);
        self.create_obstacle(&border_id, Vec2::new(right, y), catalog, sprites);
    }

    // === Sprites ===

    /// Sprite owned by the lead chunk; it follows the chunk and dies with it
    fn spawn_chunked_sprite(
        &mut self,
        sprite_id: &str,
        position: Vec2,
        layer: SortLayer,
        sprites: &dyn SpriteLibrary,
    ) -> Option<EntityId> {
        let Some(parent_id) = self.lead_chunk else {
            log::error!("No chunk to attach sprite '{}' to", sprite_id);
            return None;
        };
        let Some(parent) = self.chunks.get_mut(&parent_id) else {
            log::error!("Chunk {:?} missing while attaching '{}'", parent_id, sprite_id);
            return None;
        };

        let mut sprite = self.sprite_pool.acquire();
        sprite.object.initialize_static(position);
        sprite.sprite_id = sprite_id.to_string();
        sprite.animation = Some(sprites.animation_or_error(sprite_id));
        sprite.sort_layer = layer;
        sprite.parent = Some(parent_id);
        sprite.local_offset = position - parent.object.position;

        let id = sprite.id();
        parent.children.push(id);
        self.sprites.insert(id, sprite);
        Some(id)
    }

    /// Sprite that scrolls on its own and dies at the destroy line
    fn spawn_free_sprite(
        &mut self,
        sprite_id: &str,
        position: Vec2,
        layer: SortLayer,
        sprites: &dyn SpriteLibrary,
    ) -> EntityId {
        let speed = self.effective_speed();
        let bounds = self.movement_bounds();

        let mut sprite = self.sprite_pool.acquire();
        sprite.object.initialize(position, speed, bounds);
        sprite.sprite_id = sprite_id.to_string();
        sprite.animation = Some(sprites.animation_or_error(sprite_id));
        sprite.sort_layer = layer;

        let id = sprite.id();
        self.sprites.insert(id, sprite);
        id
    }

    pub fn create_player_trail(
        &mut self,
        position: Vec2,
        sprite_id: &str,
        sprites: &dyn SpriteLibrary,
    ) -> EntityId {
        self.spawn_free_sprite(sprite_id, position, SortLayer::Trail, sprites)
    }

    /// Carrier sprite for a particle effect; released again if the effect
    /// cannot be spawned
    pub fn create_pfx_sprite(
        &mut self,
        pfx_id: &str,
        position: Vec2,
        sprites: &dyn SpriteLibrary,
        effects: &mut dyn EffectsSink,
    ) -> Option<EntityId> {
        let id = self.spawn_free_sprite(EMPTY_SPRITE_ID, position, SortLayer::Effect, sprites);
        if effects.spawn_particle_effect(pfx_id, position) {
            return Some(id);
        }
        log::warn!("Particle effect '{}' failed to spawn", pfx_id);
        self.release_sprite(id);
        None
    }

    // === Collisions ===

    /// Fire an obstacle's collision effects and report how the player reacts
    pub fn notify_obstacle_collision(
        &mut self,
        sprite_id: EntityId,
        hit_x: f32,
        catalog: &dyn AssetCatalog,
        sprites: &dyn SpriteLibrary,
        effects: &mut dyn EffectsSink,
    ) -> Option<CollisionResponse> {
        let sprite = self.sprites.get(&sprite_id)?;
        let position = sprite.object.position;
        let obstacle_id = sprite.obstacle_id.as_deref()?;
        let Some(def) = catalog.obstacle(obstacle_id) else {
            log::error!("Collided obstacle '{}' not found in catalog", obstacle_id);
            return None;
        };

        let collision = &def.collision;
        let center = collision
            .center
            .as_ref()
            .filter(|c| (hit_x - position.x).abs() <= c.distance);

        let (speed_penalty, stun_duration, sfx_id, pfx_id) = match center {
            Some(c) => (
                Some(c.speed_penalty),
                c.stun_duration,
                c.sfx_id.as_deref().or(collision.sfx_id.as_deref()),
                c.pfx_id.as_deref().or(collision.pfx_id.as_deref()),
            ),
            None => (
                collision.speed_penalty,
                None,
                collision.sfx_id.as_deref(),
                collision.pfx_id.as_deref(),
            ),
        };

        if let Some(sfx) = sfx_id
            && !effects.play_sound(sfx)
        {
            log::warn!("Collision sound '{}' failed to play", sfx);
        }
        if let Some(pfx) = pfx_id {
            self.create_pfx_sprite(pfx, position, sprites, effects);
        }

        if def.destroy_on_collision {
            self.release_sprite(sprite_id);
        }

        Some(CollisionResponse {
            kind: collision.kind,
            speed_penalty,
            stun_duration,
            ramp: def.ramp,
            center_hit: center.is_some(),
            destroyed: def.destroy_on_collision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetPack, NoEffects, PathShape};
    use crate::maps::{WeightIdentity, WeightedMapData};
    use crate::settings::GeneratorSettings;
    use crate::world::WorldSprite;

    fn world_with_obstacles(obstacles: &[(&str, u32)]) -> World {
        let mut world = World::new(GeneratorSettings::default()).unwrap();
        let mut map = WeightedMapData::standard_arcade();
        map.obstacle_weights = obstacles
            .iter()
            .map(|&(n, w)| WeightIdentity::new(n, w))
            .collect();
        map.ice_path_spawn_weights = vec![WeightIdentity::new("Empty", 1)];
        map.world_edge_weights.clear();
        map.world_x_offset_weights.clear();
        map.snow_variation_weights.clear();
        world.apply_map(&map);
        world
    }

    fn obstacle_sprites<'a>(world: &'a World, id: &'a str) -> impl Iterator<Item = &'a WorldSprite> {
        world
            .sprites()
            .filter(move |s| s.obstacle_id.as_deref() == Some(id))
    }

    #[test]
    fn test_obstacle_flags_block_column_for_whole_batch() {
        let pack = AssetPack::standard();
        let mut world = world_with_obstacles(&[("Empty", 0), ("Stump", 1)]);
        world.generate_next_batch(&pack, &pack);

        let rows = world.settings().forward_generation_distance as usize;
        // Borders are -10 and 10: columns -9..=9, each filled once per batch
        assert_eq!(obstacle_sprites(&world, "Stump").count(), 19);
        assert!(obstacle_sprites(&world, "Stump").all(|s| s.object.position.y == 0.0));
        assert_eq!(obstacle_sprites(&world, "LargeTree").count(), rows * 2);

        // A new batch starts with clear flags
        world.generate_next_batch(&pack, &pack);
        assert_eq!(obstacle_sprites(&world, "Stump").count(), 38);
    }

    #[test]
    fn test_right_extended_obstacle_places_its_part() {
        let pack = AssetPack::standard();
        let mut world = world_with_obstacles(&[("Empty", 0), ("LogPile", 1)]);
        world.generate_next_batch(&pack, &pack);

        let piles: Vec<f32> = obstacle_sprites(&world, "LogPile")
            .map(|s| s.object.position.x)
            .collect();
        let ends = obstacle_sprites(&world, "LogPileEnd").count();
        // -9, -7, ..., 7 on the first row; later rows find every column flagged
        assert_eq!(piles.len(), 9);
        assert_eq!(piles.len(), ends);
        // The last column cannot fit an extension
        assert!(piles.iter().all(|&x| x + 1.0 < 10.0));
    }

    fn thin_shape() -> PathShape {
        PathShape {
            id: "Thin".to_string(),
            size_class: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_right_extension_rejected_by_ice() {
        let mut world = world_with_obstacles(&[("Empty", 1)]);
        assert!(world.right_extension_fits(-9.0, 10.0));
        assert!(world.right_extension_fits(-3.0, 10.0));

        // Ice on the extension column itself
        assert!(world.engine.try_spawn(LaneX::from_world(-8.0), &thin_shape()));
        assert!(!world.right_extension_fits(-9.0, 10.0));

        // Ice half a cell past the extension column
        assert!(world.engine.try_spawn(LaneX::from_world(-1.5), &thin_shape()));
        assert!(!world.right_extension_fits(-3.0, 10.0));
        assert!(world.right_extension_fits(-6.0, 10.0));
    }

    #[test]
    fn test_log_pile_skips_column_beside_ice() {
        let pack = AssetPack::standard();
        let mut world = world_with_obstacles(&[("Empty", 0), ("LogPile", 1)]);
        assert!(world.engine.try_spawn(LaneX::from_world(-8.0), &thin_shape()));
        world.generate_next_batch(&pack, &pack);

        let first_row: Vec<f32> = obstacle_sprites(&world, "LogPile")
            .filter(|s| s.object.position.y == 0.0)
            .map(|s| s.object.position.x)
            .collect();
        assert!(!first_row.contains(&-9.0));
        assert!(!first_row.contains(&-8.0));
        assert!(first_row.contains(&-7.0));
    }

    #[test]
    fn test_no_obstacle_lands_on_ice() {
        let pack = AssetPack::standard();
        let mut world = World::new(GeneratorSettings::default()).unwrap();
        let mut map = WeightedMapData::standard_arcade();
        map.obstacle_weights = vec![WeightIdentity::new("Empty", 1)];
        map.ice_obstacle_weights = vec![WeightIdentity::new("Empty", 0), WeightIdentity::new("Stump", 1)];
        map.ice_path_spawn_weights = vec![WeightIdentity::new("Empty", 5), WeightIdentity::new("Spawn", 1)];
        map.ice_path_weights = vec![WeightIdentity::new("Flat", 1)];
        world.apply_map(&map);
        world.generate_next_batch(&pack, &pack);

        assert!(world.ice_paths().count() > 0);
        assert_eq!(obstacle_sprites(&world, "Stump").count(), 0);
    }

    #[test]
    fn test_unknown_obstacle_is_skipped() {
        let pack = AssetPack::standard();
        let mut world = world_with_obstacles(&[("Boulder", 1)]);
        world.generate_next_batch(&pack, &pack);
        assert_eq!(world.sprites().filter(|s| s.is_obstacle()).count(), 24 * 2);
    }

    #[test]
    fn test_chunked_sprites_follow_their_chunk() {
        let pack = AssetPack::standard();
        let mut world = world_with_obstacles(&[("Empty", 1)]);
        world.generate_next_batch(&pack, &pack);
        world.set_world_speed(0.5);
        world.fixed_update(&Default::default());

        for sprite in world.sprites() {
            let parent = sprite.parent.and_then(|id| world.chunk(id)).unwrap();
            assert_eq!(sprite.object.position.y, parent.object.position.y);
        }
    }

    #[test]
    fn test_destroying_collision_releases_sprite() {
        let mut pack = AssetPack::standard();
        pack.add_obstacle(ObstacleDefinition {
            id: "Bush".to_string(),
            sprite_id: "bush".to_string(),
            destroy_on_collision: true,
            ..Default::default()
        });
        let mut world = world_with_obstacles(&[("Empty", 1)]);
        world.generate_next_batch(&pack, &pack);

        let bush = world
            .create_obstacle("Bush", Vec2::new(0.0, -23.0), &pack, &pack)
            .unwrap();
        let response = world
            .notify_obstacle_collision(bush, 0.0, &pack, &pack, &mut NoEffects)
            .unwrap();
        assert!(response.destroyed);
        assert!(world.sprite(bush).is_none());
        assert!(world.sprite_pool().contains(bush));
        assert!(world
            .chunks()
            .all(|chunk| !chunk.children.contains(&bush)));
    }

    #[test]
    fn test_collision_with_non_obstacle_is_ignored() {
        let pack = AssetPack::standard();
        let mut world = world_with_obstacles(&[("Empty", 1)]);
        let trail = world.create_player_trail(Vec2::ZERO, "trail-snow-straight", &pack);
        assert!(world
            .notify_obstacle_collision(trail, 0.0, &pack, &pack, &mut NoEffects)
            .is_none());
    }
}
