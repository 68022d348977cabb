//! World generation error types
//!
//! Per-row generation never propagates these: callers log and skip the cell.
//! They surface from constructors, loaders and direct sampler use.

use thiserror::Error;

use crate::world::LayerKind;

/// Errors that can occur while configuring or sampling the generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldGenError {
    /// Every weight in a distribution is zero, so nothing can be drawn.
    #[error("weighted distribution has zero total weight")]
    EmptyDistribution,

    /// Weights and possibility labels are not index-aligned.
    #[error("possibility table mismatch: {weights} weights for {possibilities} possibilities")]
    PossibilityMismatch {
        /// Number of weights supplied.
        weights: usize,
        /// Number of labels supplied.
        possibilities: usize,
    },

    /// No weighted layer registered for the requested kind.
    #[error("weighted layer {0:?} is not configured")]
    MissingLayer(LayerKind),

    /// Obstacle id absent from the asset catalog.
    #[error("obstacle not found: {0}")]
    MissingObstacle(String),

    /// Ice path shape id absent from the asset catalog.
    #[error("ice path shape not found: {0}")]
    MissingPathShape(String),

    /// Pool limits cannot be satisfied.
    #[error("pool {pool} misconfigured: {reason}")]
    PoolMisconfigured {
        /// Name of the pool.
        pool: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Settings, map or catalog data failed to parse or validate.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for WorldGenError {
    fn from(err: serde_json::Error) -> Self {
        WorldGenError::InvalidConfig(err.to_string())
    }
}
