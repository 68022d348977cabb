//! Simulation gates, outbound events and RNG seeding

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::AI_WORLD_DESTROY_OFFSET;

/// Process-wide gates read by every entity on a tick
///
/// Owned by the game controller and passed by reference into each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimContext {
    /// Suspends movement and logic updates
    pub paused: bool,
    /// Entities past their destroy line may be released
    pub world_destroy: bool,
    /// AI opponent Y, when one is racing
    pub ai_y: Option<f32>,
    /// How far above the AI an entity must be before it can be released
    pub ai_destroy_offset: f32,
}

impl Default for SimContext {
    fn default() -> Self {
        Self {
            paused: false,
            world_destroy: true,
            ai_y: None,
            ai_destroy_offset: AI_WORLD_DESTROY_OFFSET,
        }
    }
}

impl SimContext {
    pub fn is_above_ai(&self, y: f32) -> bool {
        self.ai_y
            .is_some_and(|ai_y| y > ai_y + self.ai_destroy_offset)
    }

    pub fn may_destroy(&self, y: f32) -> bool {
        self.world_destroy || self.is_above_ai(y)
    }
}

/// Notifications for collaborators, drained once per tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WorldEvent {
    /// A row finished generating
    RowGenerated { row: u64, y: f32 },
    WorldSpeedChanged(f32),
    WorldCleared,
    /// Total distance after a movement tick
    DistanceTravelled(f32),
    KmhUpdated(f32),
    /// The player is close to a lane edge; recentre the camera on this X
    CameraShiftRequested(f32),
    AiGenerationThresholdReached { y: f32, threshold: f32 },
}

/// Seed plus stream selector for a PCG generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64, stream: u64) -> Self {
        Self { seed, stream }
    }

    /// Build the generator; seed 0 draws from the thread-local generator
    pub fn to_rng(&self) -> Pcg32 {
        if self.seed == 0 {
            Pcg32::from_rng(&mut rand::rng())
        } else {
            Pcg32::new(self.seed, self.stream)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_destroy_gate() {
        let mut ctx = SimContext::default();
        assert!(ctx.may_destroy(0.0));

        ctx.world_destroy = false;
        assert!(!ctx.may_destroy(100.0));

        ctx.ai_y = Some(2.0);
        assert!(!ctx.may_destroy(5.0));
        assert!(ctx.may_destroy(6.5));
    }

    #[test]
    fn test_rng_streams_differ() {
        let mut a = RngState::new(10403, 1).to_rng();
        let mut b = RngState::new(10403, 2).to_rng();
        let mut a2 = RngState::new(10403, 1).to_rng();
        let xs: Vec<u32> = (0..8).map(|_| a.random()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.random()).collect();
        let xs2: Vec<u32> = (0..8).map(|_| a2.random()).collect();
        assert_ne!(xs, ys);
        assert_eq!(xs, xs2);
    }
}
