//! Per-map weight tables
//!
//! Each map supplies one weight list per generation layer. Lists are
//! index-aligned: entry `i` names the possibility drawn when the sampler
//! returns `i`.

use serde::{Deserialize, Serialize};

use crate::error::WorldGenError;

/// One weighted possibility of a layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightIdentity {
    pub name: String,
    pub weight: u32,
}

impl WeightIdentity {
    pub fn new(name: &str, weight: u32) -> Self {
        Self {
            name: name.to_string(),
            weight,
        }
    }
}

fn table(entries: &[(&str, u32)]) -> Vec<WeightIdentity> {
    entries
        .iter()
        .map(|&(name, weight)| WeightIdentity::new(name, weight))
        .collect()
}

/// Weight tables and lane sizes for one map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightedMapData {
    pub name: String,
    /// Starting (and maximum) edge size
    pub world_edge_size: f32,
    pub min_world_edge_size: f32,
    /// Half-width used when deciding camera shifts
    pub max_ice_path_width: f32,
    pub obstacle_weights: Vec<WeightIdentity>,
    pub ice_obstacle_weights: Vec<WeightIdentity>,
    pub snow_variation_weights: Vec<WeightIdentity>,
    pub ice_path_weights: Vec<WeightIdentity>,
    pub world_edge_weights: Vec<WeightIdentity>,
    pub world_x_offset_weights: Vec<WeightIdentity>,
    pub ice_path_spawn_weights: Vec<WeightIdentity>,
}

impl WeightedMapData {
    /// The default arcade slope
    pub fn standard_arcade() -> Self {
        Self {
            name: "Arcade".to_string(),
            world_edge_size: 10.0,
            min_world_edge_size: 4.0,
            max_ice_path_width: 8.0,
            obstacle_weights: table(&[
                ("Empty", 120),
                ("SmallTree", 6),
                ("Shrub", 5),
                ("Stump", 2),
                ("LargeTree", 3),
                ("SmallRamp", 1),
                ("LogPile", 1),
            ]),
            ice_obstacle_weights: table(&[("Empty", 60), ("Stump", 1)]),
            snow_variation_weights: table(&[("Empty", 40), ("snow-lump-0", 2), ("snow-lump-1", 1)]),
            ice_path_weights: table(&[
                ("Flat", 60),
                ("Expand", 6),
                ("Contract", 6),
                ("Turn", 10),
                ("End", 2),
            ]),
            world_edge_weights: table(&[("Flat", 20), ("Expand", 2), ("Contract", 2)]),
            world_x_offset_weights: table(&[("Flat", 30), ("Left", 1), ("Right", 1)]),
            ice_path_spawn_weights: table(&[("Empty", 400), ("Spawn", 1)]),
        }
    }

    /// Sparse, calm slope behind the main menu
    pub fn menu() -> Self {
        Self {
            name: "Menu".to_string(),
            world_edge_size: 10.0,
            min_world_edge_size: 4.0,
            max_ice_path_width: 8.0,
            obstacle_weights: table(&[("Empty", 200), ("SmallTree", 4), ("Shrub", 4)]),
            ice_obstacle_weights: table(&[("Empty", 1)]),
            snow_variation_weights: table(&[("Empty", 20), ("snow-lump-0", 1)]),
            ice_path_weights: table(&[("Flat", 40), ("Turn", 4), ("End", 1)]),
            world_edge_weights: Vec::new(),
            world_x_offset_weights: table(&[("Flat", 1)]),
            ice_path_spawn_weights: table(&[("Empty", 600), ("Spawn", 1)]),
        }
    }

    /// Obstacle-light tutorial slope
    pub fn tutorial() -> Self {
        Self {
            name: "Tutorial".to_string(),
            world_edge_size: 8.0,
            min_world_edge_size: 4.0,
            max_ice_path_width: 6.0,
            obstacle_weights: table(&[("Empty", 150), ("Shrub", 3)]),
            ice_obstacle_weights: table(&[("Empty", 1)]),
            snow_variation_weights: Vec::new(),
            ice_path_weights: table(&[("Flat", 1)]),
            world_edge_weights: Vec::new(),
            world_x_offset_weights: Vec::new(),
            ice_path_spawn_weights: table(&[("Empty", 1)]),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, WorldGenError> {
        let map: Self = serde_json::from_str(json)?;
        if map.min_world_edge_size > map.world_edge_size {
            return Err(WorldGenError::InvalidConfig(format!(
                "map {}: min edge size {} exceeds edge size {}",
                map.name, map.min_world_edge_size, map.world_edge_size
            )));
        }
        Ok(map)
    }

    pub fn to_json(&self) -> Result<String, WorldGenError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_maps_have_spawn_and_shape_tables() {
        for map in [
            WeightedMapData::standard_arcade(),
            WeightedMapData::menu(),
            WeightedMapData::tutorial(),
        ] {
            assert!(!map.ice_path_spawn_weights.is_empty(), "{}", map.name);
            assert!(!map.ice_path_weights.is_empty(), "{}", map.name);
            assert!(map.obstacle_weights.iter().map(|w| w.weight).sum::<u32>() > 0);
        }
    }

    #[test]
    fn test_map_from_json() {
        let json = r#"{
            "name": "Gully",
            "world_edge_size": 6.0,
            "min_world_edge_size": 3.0,
            "obstacle_weights": [{ "name": "Empty", "weight": 3 }, { "name": "Shrub", "weight": 1 }]
        }"#;
        let map = WeightedMapData::from_json(json).unwrap();
        assert_eq!(map.name, "Gully");
        assert_eq!(map.obstacle_weights[1], WeightIdentity::new("Shrub", 1));
        assert!(map.ice_path_weights.is_empty());
    }

    #[test]
    fn test_map_rejects_inverted_edges() {
        let json = r#"{ "name": "Bad", "world_edge_size": 2.0, "min_world_edge_size": 5.0 }"#;
        assert!(WeightedMapData::from_json(json).is_err());
    }
}
