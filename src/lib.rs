//! Downslope - procedural world generation for an endless downhill run
//!
//! Core modules:
//! - `world`: Deterministic generation engine (sampling, pools, ice paths, streaming)
//! - `settings`: Generator tunables and mode presets
//! - `maps`: Per-map weight tables
//! - `assets`: Catalog/effects collaborator interfaces and an in-memory catalog
//! - `error`: Error taxonomy

pub mod assets;
pub mod error;
pub mod maps;
pub mod settings;
pub mod world;

pub use error::WorldGenError;
pub use maps::{WeightIdentity, WeightedMapData};
pub use settings::{GenerationMode, GeneratorSettings};

/// Engine constants
pub mod consts {
    /// Fixed ticks per second, used for speed metrics
    pub const FIXED_TICKS_PER_SEC: f32 = 50.0;
    /// Metres per second to kilometres per hour
    pub const MPS_TO_KMH: f32 = 3.6;

    /// Lateral granularity of the occupancy grid (world units)
    pub const HALF_CELL: f32 = 0.5;
    /// Largest ice path size class
    pub const MAX_PATH_SIZE_CLASS: u8 = 2;
    /// Smallest ice path size class
    pub const MIN_PATH_SIZE_CLASS: u8 = 1;

    /// Default forward rows generated per batch
    pub const WORLD_GEN_DEFAULT_DIST: u32 = 24;
    /// Forward rows generated per batch in tutorial mode
    pub const TUTORIAL_WORLD_GEN_DIST: u32 = 8;
    /// Rows behind the AI opponent before geometry is destroyed
    pub const AI_WORLD_DESTROY_OFFSET: f32 = 4.0;

    /// Default seed shared by the seeded weighted layers
    pub const DEFAULT_OBSTACLE_SEED: u64 = 10403;
}

/// Convert a world-space lateral coordinate to half-cell units (rounded)
#[inline]
pub fn to_half_cells(x: f32) -> i32 {
    (x / consts::HALF_CELL).round() as i32
}

/// Convert half-cell units back to a world-space lateral coordinate
#[inline]
pub fn from_half_cells(half_cells: i32) -> f32 {
    half_cells as f32 * consts::HALF_CELL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_cell_conversion() {
        assert_eq!(to_half_cells(0.0), 0);
        assert_eq!(to_half_cells(1.5), 3);
        assert_eq!(to_half_cells(-2.0), -4);
        assert_eq!(from_half_cells(-3), -1.5);
        // Float noise snaps to the nearest half cell
        assert_eq!(to_half_cells(0.999_99), 2);
    }
}
