//! Asset catalog and collaborator interfaces
//!
//! The generator never renders or plays anything itself. It looks shapes and
//! obstacles up through [`AssetCatalog`], resolves sprites through
//! [`SpriteLibrary`], fires effects through [`EffectsSink`] and reads the
//! player through [`PlayerFeed`]. [`AssetPack`] is the in-memory catalog used
//! by the demo runner and tests.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::WorldGenError;

/// Opaque handle to a sprite animation owned by the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationHandle(pub u32);

/// Collision category, used by the player controller to pick a reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionKind {
    #[default]
    None,
    Powder,
    Shrub,
    SmallTree,
    LargeTree,
    SmallRamp,
    Stump,
    LargeRamp,
}

/// Axis-aligned collider box relative to the obstacle origin
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColliderShape {
    pub size: Vec2,
    pub offset: Vec2,
}

/// Extra penalty applied when hitting the obstacle dead centre
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CenterCollision {
    pub distance: f32,
    pub speed_penalty: f32,
    /// Stun seconds (None = no stun)
    pub stun_duration: Option<f32>,
    pub sfx_id: Option<String>,
    pub pfx_id: Option<String>,
}

/// What happens when something collides with the obstacle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionEffects {
    pub kind: CollisionKind,
    pub speed_penalty: Option<f32>,
    pub sfx_id: Option<String>,
    pub pfx_id: Option<String>,
    pub center: Option<CenterCollision>,
}

/// Launch parameters for ramps
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RampParameters {
    pub soft_jump: bool,
    pub forward_power: f32,
    pub vertical_power: f32,
    pub vertical_max: f32,
}

/// Immutable catalog entry for an obstacle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleDefinition {
    pub id: String,
    pub sprite_id: String,
    /// Placement offset from the generated cell
    pub offset: Vec2,
    /// Blocks other placements in its column
    pub obtrusive: bool,
    pub impassable: bool,
    pub collider: ColliderShape,
    pub collision: CollisionEffects,
    pub ramp: Option<RampParameters>,
    pub air_collidable: bool,
    pub only_air_collidable: bool,
    pub destroy_on_collision: bool,
    /// Parts placed one column at a time to the right
    pub right_extended: Vec<String>,
    /// Parts stacked above the obstacle
    pub top_extended: Vec<String>,
}

impl ObstacleDefinition {
    pub fn is_right_extended(&self) -> bool {
        !self.right_extended.is_empty()
    }

    pub fn is_top_extended(&self) -> bool {
        !self.top_extended.is_empty()
    }
}

/// Catalog entry for an ice path shape
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathShape {
    pub id: String,
    pub sprite_id: String,
    /// Half-width of the path once this shape is placed
    pub thickness: f32,
    /// Size class once this shape is placed
    pub size_class: u8,
    /// Lateral placement correction
    pub lateral_offset: f32,
}

/// Obstacle and ice path shape lookup
pub trait AssetCatalog {
    fn obstacle(&self, id: &str) -> Option<&ObstacleDefinition>;

    fn path_shape(&self, id: &str) -> Option<&PathShape>;

    /// Shape used for the first row of a freshly spawned path
    fn starting_path_shape(&self, id: &str) -> Option<&PathShape>;

    fn require_obstacle(&self, id: &str) -> Result<&ObstacleDefinition, WorldGenError> {
        self.obstacle(id)
            .ok_or_else(|| WorldGenError::MissingObstacle(id.to_string()))
    }

    fn require_path_shape(&self, id: &str) -> Result<&PathShape, WorldGenError> {
        self.path_shape(id)
            .ok_or_else(|| WorldGenError::MissingPathShape(id.to_string()))
    }
}

/// Sprite animation lookup
pub trait SpriteLibrary {
    fn animation(&self, id: &str) -> Option<AnimationHandle>;

    /// Animation shown when a lookup fails
    fn error_animation(&self) -> AnimationHandle;

    fn animation_or_error(&self, id: &str) -> AnimationHandle {
        match self.animation(id) {
            Some(handle) => handle,
            None => {
                log::error!("Sprite animation '{}' not found", id);
                self.error_animation()
            }
        }
    }
}

/// Best-effort audio/particle triggers
pub trait EffectsSink {
    fn play_sound(&mut self, id: &str) -> bool;

    fn spawn_particle_effect(&mut self, id: &str, position: Vec2) -> bool;
}

/// Player state the generator needs
pub trait PlayerFeed {
    fn player_x(&self) -> f32;
}

impl PlayerFeed for f32 {
    fn player_x(&self) -> f32 {
        *self
    }
}

/// Effects sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEffects;

impl EffectsSink for NoEffects {
    fn play_sound(&mut self, _id: &str) -> bool {
        false
    }

    fn spawn_particle_effect(&mut self, _id: &str, _position: Vec2) -> bool {
        false
    }
}

/// Sprite id shown for missing animations
pub const ERROR_SPRITE_ID: &str = "error";
/// Sprite id for effect carriers
pub const EMPTY_SPRITE_ID: &str = "empty";

/// In-memory asset catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPack {
    pub obstacles: HashMap<String, ObstacleDefinition>,
    pub path_shapes: HashMap<String, PathShape>,
    pub starting_path_shapes: HashMap<String, PathShape>,
    /// Sprite names; a sprite's handle is its index
    pub sprites: Vec<String>,
}

impl AssetPack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_obstacle(&mut self, obstacle: ObstacleDefinition) {
        self.add_sprite(&obstacle.sprite_id);
        self.obstacles.insert(obstacle.id.clone(), obstacle);
    }

    pub fn add_path_shape(&mut self, shape: PathShape) {
        self.add_sprite(&shape.sprite_id);
        self.path_shapes.insert(shape.id.clone(), shape);
    }

    pub fn add_starting_path_shape(&mut self, shape: PathShape) {
        self.add_sprite(&shape.sprite_id);
        self.starting_path_shapes.insert(shape.id.clone(), shape.clone());
        self.path_shapes.entry(shape.id.clone()).or_insert(shape);
    }

    /// Register a sprite name, returning its handle
    pub fn add_sprite(&mut self, id: &str) -> AnimationHandle {
        if let Some(handle) = self.animation(id) {
            return handle;
        }
        self.sprites.push(id.to_string());
        AnimationHandle((self.sprites.len() - 1) as u32)
    }

    pub fn from_json(json: &str) -> Result<Self, WorldGenError> {
        let mut pack: Self = serde_json::from_str(json)?;
        pack.add_sprite(ERROR_SPRITE_ID);
        log::info!(
            "Loaded asset pack: {} obstacles, {} path shapes",
            pack.obstacles.len(),
            pack.path_shapes.len()
        );
        Ok(pack)
    }

    /// Catalog with the stock slope obstacles and ice path shapes
    pub fn standard() -> Self {
        let mut pack = Self::new();
        pack.add_sprite(ERROR_SPRITE_ID);
        pack.add_sprite(EMPTY_SPRITE_ID);
        for sprite in ["snow-lump-0", "snow-lump-1", "trail-snow-straight", "trail-ice-straight"] {
            pack.add_sprite(sprite);
        }

        let tree = |id: &str, sprite: &str, kind: CollisionKind, penalty: f32| ObstacleDefinition {
            id: id.to_string(),
            sprite_id: sprite.to_string(),
            obtrusive: true,
            impassable: kind == CollisionKind::LargeTree,
            collider: ColliderShape {
                size: Vec2::new(0.5, 0.4),
                offset: Vec2::new(0.0, -0.3),
            },
            collision: CollisionEffects {
                kind,
                speed_penalty: Some(penalty),
                sfx_id: Some("hit-tree".to_string()),
                pfx_id: Some("snow-burst".to_string()),
                center: Some(CenterCollision {
                    distance: 0.15,
                    speed_penalty: penalty * 2.0,
                    stun_duration: Some(0.75),
                    sfx_id: Some("hit-tree-hard".to_string()),
                    pfx_id: None,
                }),
            },
            ..Default::default()
        };

        pack.add_obstacle(tree("LargeTree", "large-tree-0", CollisionKind::LargeTree, 0.6));
        pack.add_obstacle(tree("SmallTree", "small-tree-0", CollisionKind::SmallTree, 0.4));
        pack.add_obstacle(ObstacleDefinition {
            id: "Shrub".to_string(),
            sprite_id: "small-shrub-0".to_string(),
            collision: CollisionEffects {
                kind: CollisionKind::Shrub,
                speed_penalty: Some(0.1),
                pfx_id: Some("snow-puff".to_string()),
                ..Default::default()
            },
            destroy_on_collision: true,
            ..Default::default()
        });
        pack.add_obstacle(ObstacleDefinition {
            id: "Stump".to_string(),
            sprite_id: "stump-0".to_string(),
            obtrusive: true,
            collision: CollisionEffects {
                kind: CollisionKind::Stump,
                speed_penalty: Some(0.3),
                sfx_id: Some("hit-stump".to_string()),
                ..Default::default()
            },
            air_collidable: true,
            ..Default::default()
        });
        pack.add_obstacle(ObstacleDefinition {
            id: "SmallRamp".to_string(),
            sprite_id: "small-ramp-0".to_string(),
            collision: CollisionEffects {
                kind: CollisionKind::SmallRamp,
                ..Default::default()
            },
            ramp: Some(RampParameters {
                soft_jump: true,
                forward_power: 0.2,
                vertical_power: 0.3,
                vertical_max: 1.0,
            }),
            ..Default::default()
        });
        pack.add_obstacle(ObstacleDefinition {
            id: "LogPile".to_string(),
            sprite_id: "log-pile-left".to_string(),
            obtrusive: true,
            impassable: true,
            collision: CollisionEffects {
                kind: CollisionKind::Stump,
                speed_penalty: Some(0.5),
                ..Default::default()
            },
            right_extended: vec!["LogPileEnd".to_string()],
            ..Default::default()
        });
        pack.add_obstacle(ObstacleDefinition {
            id: "LogPileEnd".to_string(),
            sprite_id: "log-pile-right".to_string(),
            obtrusive: true,
            impassable: true,
            collision: CollisionEffects {
                kind: CollisionKind::Stump,
                speed_penalty: Some(0.5),
                ..Default::default()
            },
            ..Default::default()
        });

        let shape = |id: &str, thickness: f32, size_class: u8, lateral_offset: f32| PathShape {
            id: id.to_string(),
            sprite_id: format!("ice-{}", id.to_lowercase()),
            thickness,
            size_class,
            lateral_offset,
        };

        pack.add_starting_path_shape(shape("Path1Start", 1.0, 1, 0.0));
        pack.add_path_shape(shape("Path1Flat", 1.0, 1, 0.0));
        pack.add_path_shape(shape("Path1Expand", 1.5, 2, 0.0));
        pack.add_path_shape(shape("Path1TurnLeft", 1.0, 1, -0.25));
        pack.add_path_shape(shape("Path1TurnRight", 1.0, 1, 0.25));
        pack.add_path_shape(shape("Path1End", 1.0, 1, 0.0));
        pack.add_path_shape(shape("Path2Flat", 1.5, 2, 0.0));
        pack.add_path_shape(shape("Path2Contract", 1.0, 1, 0.0));
        pack.add_path_shape(shape("Path2TurnLeft", 1.5, 2, -0.25));
        pack.add_path_shape(shape("Path2TurnRight", 1.5, 2, 0.25));
        pack.add_path_shape(shape("Path2End", 1.5, 2, 0.0));

        pack
    }
}

impl AssetCatalog for AssetPack {
    fn obstacle(&self, id: &str) -> Option<&ObstacleDefinition> {
        self.obstacles.get(id)
    }

    fn path_shape(&self, id: &str) -> Option<&PathShape> {
        self.path_shapes.get(id)
    }

    fn starting_path_shape(&self, id: &str) -> Option<&PathShape> {
        self.starting_path_shapes.get(id)
    }
}

impl SpriteLibrary for AssetPack {
    fn animation(&self, id: &str) -> Option<AnimationHandle> {
        self.sprites
            .iter()
            .position(|s| s == id)
            .map(|i| AnimationHandle(i as u32))
    }

    fn error_animation(&self) -> AnimationHandle {
        self.animation(ERROR_SPRITE_ID).unwrap_or(AnimationHandle(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_pack_has_every_transition_shape() {
        let pack = AssetPack::standard();
        for size in 1..=2 {
            for suffix in ["Flat", "End", "TurnLeft", "TurnRight"] {
                let id = format!("Path{size}{suffix}");
                assert!(pack.path_shape(&id).is_some(), "missing {id}");
            }
        }
        assert!(pack.path_shape("Path1Expand").is_some());
        assert!(pack.path_shape("Path2Contract").is_some());
        assert!(pack.path_shape("Path2Expand").is_none());
        assert!(pack.starting_path_shape("Path1Start").is_some());
    }

    #[test]
    fn test_missing_sprite_falls_back_to_error() {
        let pack = AssetPack::standard();
        let error = pack.error_animation();
        assert_eq!(pack.animation_or_error("does-not-exist"), error);
        assert_ne!(pack.animation_or_error("large-tree-0"), error);
    }

    #[test]
    fn test_require_obstacle_reports_missing_id() {
        let pack = AssetPack::standard();
        assert!(pack.require_obstacle("LargeTree").is_ok());
        assert_eq!(
            pack.require_obstacle("Boulder"),
            Err(WorldGenError::MissingObstacle("Boulder".to_string()))
        );
    }

    #[test]
    fn test_pack_json_round_trip_keeps_lookups() {
        let pack = AssetPack::standard();
        let json = serde_json::to_string(&pack).unwrap();
        let loaded = AssetPack::from_json(&json).unwrap();
        assert_eq!(loaded.obstacle("LogPile"), pack.obstacle("LogPile"));
        assert_eq!(loaded.animation("stump-0"), pack.animation("stump-0"));
    }
}
