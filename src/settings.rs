//! Generator settings and mode presets
//!
//! Loaded once at map-select time; the world reads them on every batch.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::WorldGenError;
use crate::world::PoolConfig;

/// Generation mode presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GenerationMode {
    #[default]
    Arcade,
    Menu,
    Tutorial,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Arcade => "Arcade",
            GenerationMode::Menu => "Menu",
            GenerationMode::Tutorial => "Tutorial",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "arcade" => Some(GenerationMode::Arcade),
            "menu" => Some(GenerationMode::Menu),
            "tutorial" => Some(GenerationMode::Tutorial),
            _ => None,
        }
    }

    /// Rows generated per batch in this mode
    pub fn forward_generation_distance(&self) -> u32 {
        match self {
            GenerationMode::Arcade | GenerationMode::Menu => WORLD_GEN_DEFAULT_DIST,
            GenerationMode::Tutorial => TUTORIAL_WORLD_GEN_DIST,
        }
    }
}

/// World generator tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub mode: GenerationMode,

    // === Randomness ===
    /// Seed shared by the seeded weighted layers (0 = entropy)
    pub obstacle_seed: u64,

    // === Streaming ===
    /// Rows generated per batch
    pub forward_generation_distance: u32,
    /// Y where the first row of a fresh world is placed
    pub world_origin_y: f32,
    /// Entities above this Y are destroyed
    pub world_destroy_y: f32,
    /// Lead chunk crossing this Y triggers the next batch
    pub world_gen_y_height: f32,
    /// World units scrolled per fixed tick
    pub world_speed: f32,
    /// Global time scale applied to world speed
    pub time_scale: f32,

    // === Lanes ===
    /// Starting edge size for a fresh world
    pub world_edge_size: f32,
    pub min_world_edge_size: f32,
    pub max_world_edge_size: f32,
    /// Right edge sits this far inside the left edge once edges vary
    pub right_edge_inset: f32,
    pub default_x_offset: f32,
    pub max_x_offset: f32,

    // === Camera shift ===
    /// Chunk Y at which its lateral offset is evaluated against the player
    pub x_offset_shift_height: f32,
    /// Player distance to an edge that requests a camera shift
    pub x_offset_player_diff: f32,

    // === Catalog ids ===
    pub border_obstacle_id: String,
    pub first_path_shape_id: String,

    // === Pools ===
    pub chunk_pool: PoolConfig,
    pub sprite_pool: PoolConfig,
    pub path_pool: PoolConfig,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            mode: GenerationMode::Arcade,

            obstacle_seed: DEFAULT_OBSTACLE_SEED,

            forward_generation_distance: WORLD_GEN_DEFAULT_DIST,
            world_origin_y: 0.0,
            world_destroy_y: 12.0,
            world_gen_y_height: 8.0,
            world_speed: 0.0,
            time_scale: 1.0,

            world_edge_size: 14.0,
            min_world_edge_size: 4.0,
            max_world_edge_size: 10.0,
            right_edge_inset: 2.0,
            default_x_offset: 0.0,
            max_x_offset: 12.0,

            x_offset_shift_height: 0.0,
            x_offset_player_diff: 0.0,

            border_obstacle_id: "LargeTree".to_string(),
            first_path_shape_id: "Path1Start".to_string(),

            chunk_pool: PoolConfig::new(32, 96),
            sprite_pool: PoolConfig::new(256, 1024),
            path_pool: PoolConfig::new(32, 128),
        }
    }
}

impl GeneratorSettings {
    /// Create settings for a mode (applies mode defaults)
    pub fn from_mode(mode: GenerationMode) -> Self {
        let mut settings = Self::default();
        settings.apply_mode(mode);
        settings
    }

    /// Apply a mode preset (updates mode-dependent settings)
    pub fn apply_mode(&mut self, mode: GenerationMode) {
        self.mode = mode;
        self.forward_generation_distance = mode.forward_generation_distance();
    }

    /// World speed after the time scale
    pub fn effective_world_speed(&self) -> f32 {
        self.world_speed * self.time_scale
    }

    /// Reject settings the generator cannot honour
    pub fn validate(&self) -> Result<(), WorldGenError> {
        if self.min_world_edge_size > self.max_world_edge_size {
            return Err(WorldGenError::InvalidConfig(format!(
                "min edge size {} exceeds max edge size {}",
                self.min_world_edge_size, self.max_world_edge_size
            )));
        }
        if self.max_x_offset < 0.0 {
            return Err(WorldGenError::InvalidConfig(format!(
                "max x offset {} is negative",
                self.max_x_offset
            )));
        }
        if self.forward_generation_distance == 0 {
            return Err(WorldGenError::InvalidConfig(
                "forward generation distance must be at least 1".to_string(),
            ));
        }
        if self.world_gen_y_height >= self.world_destroy_y {
            return Err(WorldGenError::InvalidConfig(format!(
                "generation threshold {} must lie below destroy line {}",
                self.world_gen_y_height, self.world_destroy_y
            )));
        }
        Ok(())
    }

    /// Parse settings from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, WorldGenError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        log::info!("Loaded generator settings ({} mode)", settings.mode.as_str());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, WorldGenError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip_names() {
        for mode in [GenerationMode::Arcade, GenerationMode::Menu, GenerationMode::Tutorial] {
            assert_eq!(GenerationMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(GenerationMode::from_str("nope"), None);
    }

    #[test]
    fn test_tutorial_preset_generates_fewer_rows() {
        let settings = GeneratorSettings::from_mode(GenerationMode::Tutorial);
        assert_eq!(settings.forward_generation_distance, TUTORIAL_WORLD_GEN_DIST);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = GeneratorSettings::from_json(r#"{ "obstacle_seed": 7 }"#).unwrap();
        assert_eq!(settings.obstacle_seed, 7);
        assert_eq!(settings.border_obstacle_id, "LargeTree");
    }

    #[test]
    fn test_inverted_edges_rejected() {
        let settings = GeneratorSettings {
            min_world_edge_size: 12.0,
            max_world_edge_size: 4.0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(WorldGenError::InvalidConfig(_))));
    }
}
