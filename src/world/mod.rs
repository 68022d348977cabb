//! Deterministic world generation module
//!
//! Everything that builds and streams the slope lives here:
//! - Seeded RNG only (one PCG stream per weighted layer)
//! - Stable iteration order (by lane key and entity ID)
//! - No rendering, audio or platform dependencies

pub mod entity;
pub mod generator;
pub mod grid;
pub mod ice_path;
pub mod lane;
pub mod layers;
pub mod objects;
pub mod obstacles;
pub mod pool;
pub mod random;
pub mod state;

pub use entity::{EntitySignals, EntityState, MovementBounds, WorldObject};
pub use generator::{PoolSummary, World, WorldSummary};
pub use grid::{ChunkFlag, ChunkRowFlags, LaneX, OccupancyGrid};
pub use ice_path::{ActiveIcePath, IcePathEngine, PathPlacement, RowBorders, TurnDirection};
pub use lane::LaneState;
pub use layers::{LayerKind, LayerRegistry, PathTransition, WeightedLayer};
pub use objects::{SortLayer, WorldChunk, WorldIcePath, WorldSprite};
pub use obstacles::CollisionResponse;
pub use pool::{EntityId, ObjectPool, PoolConfig, PoolStats, Poolable};
pub use random::WeightedSampler;
pub use state::{RngState, SimContext, WorldEvent};
