//! Pooled entity kinds: terrain chunks, sprites and ice path segments

use glam::Vec2;

use super::entity::WorldObject;
use super::grid::LaneX;
use super::pool::{EntityId, Poolable};
use crate::assets::AnimationHandle;

/// One generated row of terrain
#[derive(Debug, Clone)]
pub struct WorldChunk {
    pub object: WorldObject,
    /// Chunked sprites that move and die with this chunk
    pub children: Vec<EntityId>,
    /// Lateral offset the row was generated with
    pub x_offset: f32,
    /// Y at which the offset is evaluated against the player
    pub offset_correction_height: f32,
    offset_armed: bool,
    /// Generation order within the current world
    pub count_id: u64,
}

impl WorldChunk {
    pub fn arm_offset_threshold(&mut self, height: f32, x_offset: f32) {
        self.offset_correction_height = height;
        self.x_offset = x_offset;
        self.offset_armed = true;
    }

    /// True on the first call after the chunk rises past its correction height
    pub fn check_offset_threshold(&mut self) -> bool {
        if self.offset_armed
            && self.object.is_active()
            && self.object.position.y > self.offset_correction_height
        {
            self.offset_armed = false;
            return true;
        }
        false
    }
}

impl Poolable for WorldChunk {
    fn create(id: EntityId) -> Self {
        Self {
            object: WorldObject::new(id),
            children: Vec::new(),
            x_offset: 0.0,
            offset_correction_height: 0.0,
            offset_armed: false,
            count_id: 0,
        }
    }

    fn id(&self) -> EntityId {
        self.object.id
    }

    fn on_return(&mut self) {
        self.object.reset();
        self.children.clear();
        self.offset_armed = false;
        self.x_offset = 0.0;
    }
}

/// Draw order bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortLayer {
    #[default]
    Ground,
    Trail,
    Obstacle,
    /// Obstacles the player cannot pass through
    Impassable,
    Effect,
}

/// A sprite placed in the world: obstacle, decoration, trail or effect carrier
#[derive(Debug, Clone, Default)]
pub struct WorldSprite {
    pub object: WorldObject,
    pub sprite_id: String,
    pub animation: Option<AnimationHandle>,
    pub sort_layer: SortLayer,
    /// Obstacle definition id, for obstacle sprites
    pub obstacle_id: Option<String>,
    /// Owning chunk; chunked sprites follow it
    pub parent: Option<EntityId>,
    pub local_offset: Vec2,
    pub collider_enabled: bool,
}

impl WorldSprite {
    pub fn is_chunked(&self) -> bool {
        self.parent.is_some()
    }

    pub fn is_obstacle(&self) -> bool {
        self.obstacle_id.is_some()
    }
}

impl Poolable for WorldSprite {
    fn create(id: EntityId) -> Self {
        Self {
            object: WorldObject::new(id),
            ..Default::default()
        }
    }

    fn id(&self) -> EntityId {
        self.object.id
    }

    fn on_return(&mut self) {
        let id = self.object.id;
        *self = Self::create(id);
    }
}

/// One placed ice path shape
#[derive(Debug, Clone)]
pub struct WorldIcePath {
    pub object: WorldObject,
    pub shape_id: String,
    pub lane: LaneX,
    pub thickness: f32,
    pub size_class: u8,
    pub starting: bool,
}

impl Poolable for WorldIcePath {
    fn create(id: EntityId) -> Self {
        Self {
            object: WorldObject::new(id),
            shape_id: String::new(),
            lane: LaneX(0),
            thickness: 0.0,
            size_class: 0,
            starting: false,
        }
    }

    fn id(&self) -> EntityId {
        self.object.id
    }

    fn on_return(&mut self) {
        self.object.reset();
        self.shape_id.clear();
        self.starting = false;
    }
}
