//! Per-gameplay-layer weighted selection

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::random::WeightedSampler;
use super::state::RngState;
use crate::error::WorldGenError;
use crate::maps::WeightIdentity;

/// Random-selection channels used by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LayerKind {
    Obstacle,
    ObstacleIce,
    IcePath,
    SnowVariation,
    WorldEdge,
    XOffset,
    IcePathSpawn,
}

impl LayerKind {
    pub const ALL: [LayerKind; 7] = [
        LayerKind::Obstacle,
        LayerKind::ObstacleIce,
        LayerKind::IcePath,
        LayerKind::SnowVariation,
        LayerKind::WorldEdge,
        LayerKind::XOffset,
        LayerKind::IcePathSpawn,
    ];

    /// PCG stream selector, so layers sharing a seed draw independently
    pub fn stream(&self) -> u64 {
        *self as u64
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Obstacle => "Obstacle",
            LayerKind::ObstacleIce => "ObstacleIce",
            LayerKind::IcePath => "IcePath",
            LayerKind::SnowVariation => "SnowVariation",
            LayerKind::WorldEdge => "WorldEdge",
            LayerKind::XOffset => "XOffset",
            LayerKind::IcePathSpawn => "IcePathSpawn",
        }
    }
}

/// Shape transition labels of the ice path layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTransition {
    Flat,
    Expand,
    Contract,
    Turn,
    End,
}

impl PathTransition {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Flat" => Some(PathTransition::Flat),
            "Expand" => Some(PathTransition::Expand),
            "Contract" => Some(PathTransition::Contract),
            "Turn" => Some(PathTransition::Turn),
            "End" => Some(PathTransition::End),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PathTransition::Flat => "Flat",
            PathTransition::Expand => "Expand",
            PathTransition::Contract => "Contract",
            PathTransition::Turn => "Turn",
            PathTransition::End => "End",
        }
    }
}

/// A sampler paired with its index-aligned possibility labels
#[derive(Debug, Clone)]
pub struct WeightedLayer {
    sampler: WeightedSampler,
    possibilities: Vec<String>,
    seed: u64,
}

impl WeightedLayer {
    /// Build from parallel weight/label lists. Seed 0 draws from entropy.
    pub fn from_parts(
        weights: &[u32],
        possibilities: Vec<String>,
        rng: RngState,
    ) -> Result<Self, WorldGenError> {
        if weights.len() != possibilities.len() {
            return Err(WorldGenError::PossibilityMismatch {
                weights: weights.len(),
                possibilities: possibilities.len(),
            });
        }
        Ok(Self {
            sampler: WeightedSampler::new(weights, Some(rng.to_rng())),
            possibilities,
            seed: rng.seed,
        })
    }

    pub fn from_weights(table: &[WeightIdentity], rng: RngState) -> Self {
        let weights: Vec<u32> = table.iter().map(|w| w.weight).collect();
        Self {
            sampler: WeightedSampler::new(&weights, Some(rng.to_rng())),
            possibilities: table.iter().map(|w| w.name.clone()).collect(),
            seed: rng.seed,
        }
    }

    /// Draw an index into the possibility table
    ///
    /// Sampler errors are logged and yield `None`; so do indices past the
    /// end of the table.
    pub fn roll_index(&mut self) -> Option<usize> {
        match self.sampler.next() {
            Ok(index) if index < self.possibilities.len() => Some(index),
            Ok(_) => None,
            Err(err) => {
                log::warn!("Layer roll failed: {}", err);
                None
            }
        }
    }

    pub fn roll(&mut self) -> Option<&str> {
        self.roll_entry().map(|(_, label)| label)
    }

    /// Draw an index together with its label
    pub fn roll_entry(&mut self) -> Option<(usize, &str)> {
        let index = self.roll_index()?;
        self.possibilities
            .get(index)
            .map(|label| (index, label.as_str()))
    }

    pub fn possibilities(&self) -> &[String] {
        &self.possibilities
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Weighted layers keyed by kind
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    layers: HashMap<LayerKind, WeightedLayer>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a layer's table. An empty table removes the layer.
    pub fn set_layer(&mut self, kind: LayerKind, table: &[WeightIdentity], seed: u64) {
        if table.is_empty() {
            self.layers.remove(&kind);
            return;
        }
        log::debug!(
            "Layer {} set: {} possibilities, seed {}",
            kind.as_str(),
            table.len(),
            seed
        );
        let rng = RngState::new(seed, kind.stream());
        self.layers.insert(kind, WeightedLayer::from_weights(table, rng));
    }

    pub fn has(&self, kind: LayerKind) -> bool {
        self.layers.contains_key(&kind)
    }

    pub fn get(&self, kind: LayerKind) -> Result<&WeightedLayer, WorldGenError> {
        self.layers
            .get(&kind)
            .ok_or(WorldGenError::MissingLayer(kind))
    }

    /// Roll a layer's label; missing layers yield `None`
    pub fn roll(&mut self, kind: LayerKind) -> Option<&str> {
        self.layers.get_mut(&kind)?.roll()
    }

    pub fn roll_index(&mut self, kind: LayerKind) -> Option<usize> {
        self.layers.get_mut(&kind)?.roll_index()
    }

    pub fn roll_entry(&mut self, kind: LayerKind) -> Option<(usize, &str)> {
        self.layers.get_mut(&kind)?.roll_entry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, u32)]) -> Vec<WeightIdentity> {
        entries.iter().map(|&(n, w)| WeightIdentity::new(n, w)).collect()
    }

    #[test]
    fn test_mismatched_tables_rejected() {
        let result = WeightedLayer::from_parts(&[1, 2], vec!["a".to_string()], RngState::new(1, 0));
        assert!(matches!(
            result,
            Err(WorldGenError::PossibilityMismatch { weights: 2, possibilities: 1 })
        ));
    }

    #[test]
    fn test_roll_returns_label() {
        let mut layer = WeightedLayer::from_weights(&table(&[("Empty", 0), ("Spawn", 4)]), RngState::new(9, 0));
        assert_eq!(layer.roll(), Some("Spawn"));
        assert_eq!(layer.seed(), 9);
    }

    #[test]
    fn test_zero_weight_layer_rolls_nothing() {
        let mut layer = WeightedLayer::from_weights(&table(&[("Flat", 0), ("Turn", 0)]), RngState::new(2, 0));
        assert_eq!(layer.roll(), None);
    }

    #[test]
    fn test_seeded_layers_reproduce() {
        let weights = table(&[("Flat", 5), ("Left", 3), ("Right", 3)]);
        let mut a = LayerRegistry::new();
        let mut b = LayerRegistry::new();
        a.set_layer(LayerKind::XOffset, &weights, 10403);
        b.set_layer(LayerKind::XOffset, &weights, 10403);
        for _ in 0..50 {
            assert_eq!(
                a.roll(LayerKind::XOffset).map(str::to_string),
                b.roll(LayerKind::XOffset).map(str::to_string)
            );
        }
    }

    #[test]
    fn test_missing_layer_is_skipped() {
        let mut registry = LayerRegistry::new();
        assert_eq!(registry.roll(LayerKind::WorldEdge), None);
        assert!(matches!(
            registry.get(LayerKind::WorldEdge),
            Err(WorldGenError::MissingLayer(LayerKind::WorldEdge))
        ));

        registry.set_layer(LayerKind::WorldEdge, &table(&[("Flat", 1)]), 0);
        assert!(registry.has(LayerKind::WorldEdge));
        registry.set_layer(LayerKind::WorldEdge, &[], 0);
        assert!(!registry.has(LayerKind::WorldEdge));
    }

    #[test]
    fn test_transition_labels() {
        for label in ["Flat", "Expand", "Contract", "Turn", "End"] {
            let transition = PathTransition::from_label(label).unwrap();
            assert_eq!(transition.as_str(), label);
        }
        assert_eq!(PathTransition::from_label("Wiggle"), None);
    }
}
