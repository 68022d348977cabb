//! Streaming world entity
//!
//! Every chunk, sprite and ice path wraps a [`WorldObject`]. It moves along a
//! fixed direction at world speed on the fixed tick, and its logic tick
//! reports when it crossed its generation threshold or destroy line. The
//! owner acts on the returned [`EntitySignals`]; the object never releases
//! itself.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pool::EntityId;
use super::state::SimContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EntityState {
    #[default]
    Uninitialized,
    Active,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementBounds {
    /// Unit scroll direction
    pub direction: Vec2,
    /// Past this Y the entity is destroyed
    pub max_y: f32,
    /// Past this Y the armed threshold fires once
    pub threshold_y: f32,
}

impl MovementBounds {
    pub fn new(max_y: f32, threshold_y: f32) -> Self {
        Self {
            direction: Vec2::Y,
            max_y,
            threshold_y,
        }
    }
}

/// What happened during one logic update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntitySignals {
    pub destroy: bool,
    pub reached_threshold: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    pub id: EntityId,
    pub position: Vec2,
    pub speed: f32,
    bounds: Option<MovementBounds>,
    state: EntityState,
    threshold_armed: bool,
}

impl WorldObject {
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            position: Vec2::ZERO,
            speed: 0.0,
            bounds: None,
            state: EntityState::Uninitialized,
            threshold_armed: false,
        }
    }

    /// Activate with movement
    pub fn initialize(&mut self, position: Vec2, speed: f32, bounds: MovementBounds) {
        self.position = position;
        self.speed = speed;
        self.bounds = Some(bounds);
        self.state = EntityState::Active;
        self.threshold_armed = false;
    }

    /// Activate without movement (parented entities follow their parent)
    pub fn initialize_static(&mut self, position: Vec2) {
        self.position = position;
        self.speed = 0.0;
        self.bounds = None;
        self.state = EntityState::Active;
        self.threshold_armed = false;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn velocity(&self) -> Vec2 {
        self.bounds
            .map_or(Vec2::ZERO, |bounds| bounds.direction * self.speed)
    }

    pub fn bounds(&self) -> Option<&MovementBounds> {
        self.bounds.as_ref()
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == EntityState::Active
    }

    /// Fixed-timestep movement
    pub fn fixed_update(&mut self, ctx: &SimContext) {
        if ctx.paused || !self.is_active() {
            return;
        }
        self.position += self.velocity();
    }

    /// Per-tick logic
    pub fn update(&mut self, ctx: &SimContext) -> EntitySignals {
        let mut signals = EntitySignals::default();
        if ctx.paused || !self.is_active() {
            return signals;
        }
        let Some(bounds) = self.bounds else {
            return signals;
        };

        if self.threshold_armed && self.position.y > bounds.threshold_y {
            self.threshold_armed = false;
            signals.reached_threshold = true;
        }

        if self.position.y > bounds.max_y && ctx.may_destroy(self.position.y) {
            self.state = EntityState::Destroyed;
            self.threshold_armed = false;
            signals.destroy = true;
        }

        signals
    }

    pub fn arm_threshold(&mut self) {
        self.threshold_armed = true;
    }

    pub fn disarm_threshold(&mut self) {
        self.threshold_armed = false;
    }

    pub fn is_threshold_armed(&self) -> bool {
        self.threshold_armed
    }

    /// Force the Destroyed state; false if the object was not active
    pub fn set_as_destroyed(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = EntityState::Destroyed;
        self.threshold_armed = false;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.id);
    }
}

impl Default for WorldObject {
    fn default() -> Self {
        WorldObject::new(EntityId(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moving(y: f32, speed: f32, max_y: f32) -> WorldObject {
        let mut obj = WorldObject::new(EntityId(1));
        obj.initialize(Vec2::new(0.0, y), speed, MovementBounds::new(max_y, max_y - 2.0));
        obj
    }

    #[test]
    fn test_crossing_max_y_destroys() {
        let ctx = SimContext::default();
        let mut obj = moving(9.9, 0.2, 10.0);
        assert!(!obj.update(&ctx).destroy);

        obj.fixed_update(&ctx);
        assert!((obj.position.y - 10.1).abs() < 1e-5);
        let signals = obj.update(&ctx);
        assert!(signals.destroy);
        assert_eq!(obj.state(), EntityState::Destroyed);

        // Destroyed objects stop reporting
        assert!(!obj.update(&ctx).destroy);
    }

    #[test]
    fn test_threshold_fires_once() {
        let ctx = SimContext::default();
        let mut obj = moving(7.5, 1.0, 10.0);
        obj.arm_threshold();
        assert!(!obj.update(&ctx).reached_threshold);

        obj.fixed_update(&ctx);
        assert!(obj.update(&ctx).reached_threshold);
        assert!(!obj.is_threshold_armed());

        obj.fixed_update(&ctx);
        assert!(!obj.update(&ctx).reached_threshold);
    }

    #[test]
    fn test_unarmed_threshold_is_silent() {
        let ctx = SimContext::default();
        let mut obj = moving(8.5, 0.0, 10.0);
        assert!(!obj.update(&ctx).reached_threshold);
    }

    #[test]
    fn test_pause_freezes_entity() {
        let ctx = SimContext {
            paused: true,
            ..Default::default()
        };
        let mut obj = moving(11.0, 1.0, 10.0);
        obj.fixed_update(&ctx);
        assert_eq!(obj.position.y, 11.0);
        assert_eq!(obj.update(&ctx), EntitySignals::default());
    }

    #[test]
    fn test_destroy_gate_closed_keeps_entity() {
        let ctx = SimContext {
            world_destroy: false,
            ..Default::default()
        };
        let mut obj = moving(12.0, 0.0, 10.0);
        assert!(!obj.update(&ctx).destroy);
        assert!(obj.is_active());
    }

    #[test]
    fn test_static_object_never_moves() {
        let ctx = SimContext::default();
        let mut obj = WorldObject::new(EntityId(4));
        obj.initialize_static(Vec2::new(2.0, 50.0));
        obj.fixed_update(&ctx);
        assert_eq!(obj.position, Vec2::new(2.0, 50.0));
        assert!(!obj.update(&ctx).destroy);
        assert!(obj.set_as_destroyed());
        assert!(!obj.set_as_destroyed());
        obj.reset();
        assert_eq!(obj.state(), EntityState::Uninitialized);
    }
}
