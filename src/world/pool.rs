//! Reusable entity pools
//!
//! A pool owns its inactive entities outright. `acquire` moves one out to the
//! caller's active registry and `release` moves it back, so an entity is only
//! ever in one place.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::WorldGenError;

/// Stable entity identifier, unique within one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Lifecycle hooks for pooled entities
pub trait Poolable {
    /// Construct a fresh, inactive entity
    fn create(id: EntityId) -> Self;

    fn id(&self) -> EntityId;

    /// Called when the entity leaves the pool
    fn on_acquire(&mut self) {}

    /// Disable and reset transient state before re-queueing
    fn on_return(&mut self);

    /// Called on entities dropped by a trim pass
    fn on_destroy_excess(&mut self) {}
}

/// Pool limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Trim tops the queue back up to this many inactive entities
    pub min_upkeep: usize,
    /// Trim destroys inactive entities beyond this many
    pub max_inactive: usize,
    /// Fill to `min_upkeep` at construction
    pub pre_pool: bool,
}

impl PoolConfig {
    pub fn new(min_upkeep: usize, max_inactive: usize) -> Self {
        Self {
            min_upkeep,
            max_inactive,
            pre_pool: false,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(16, 64)
    }
}

/// Lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub created: u64,
    pub acquired: u64,
    pub released: u64,
    pub destroyed: u64,
}

impl PoolStats {
    /// Entities currently checked out
    pub fn outstanding(&self) -> u64 {
        self.acquired - self.released
    }
}

/// Queue of inactive entities with an upkeep floor and an inactive ceiling
#[derive(Debug)]
pub struct ObjectPool<T: Poolable> {
    name: String,
    config: PoolConfig,
    inactive: VecDeque<T>,
    next_id: u32,
    stats: PoolStats,
}

impl<T: Poolable> ObjectPool<T> {
    pub fn new(name: &str, config: PoolConfig) -> Result<Self, WorldGenError> {
        if config.max_inactive < config.min_upkeep {
            return Err(WorldGenError::PoolMisconfigured {
                pool: name.to_string(),
                reason: format!(
                    "max inactive {} is below min upkeep {}",
                    config.max_inactive, config.min_upkeep
                ),
            });
        }

        let mut pool = Self {
            name: name.to_string(),
            config,
            inactive: VecDeque::with_capacity(config.min_upkeep),
            next_id: 0,
            stats: PoolStats::default(),
        };
        if config.pre_pool {
            while pool.inactive.len() < config.min_upkeep {
                pool.add_new();
            }
            log::debug!("Pool {} pre-pooled {} entities", pool.name, pool.inactive.len());
        }
        Ok(pool)
    }

    fn spawn(&mut self) -> T {
        let obj = T::create(EntityId(self.next_id));
        self.next_id += 1;
        self.stats.created += 1;
        obj
    }

    fn add_new(&mut self) {
        let mut obj = self.spawn();
        obj.on_return();
        self.inactive.push_back(obj);
    }

    /// Take an inactive entity, growing the pool on a miss
    pub fn acquire(&mut self) -> T {
        let mut obj = self.inactive.pop_front().unwrap_or_else(|| self.spawn());
        self.stats.acquired += 1;
        obj.on_acquire();
        obj
    }

    pub fn release(&mut self, mut obj: T) {
        obj.on_return();
        self.stats.released += 1;
        self.inactive.push_back(obj);
    }

    /// One maintenance pass: add one entity if below upkeep, then drop all
    /// excess above the inactive ceiling
    pub fn trim(&mut self) {
        if self.inactive.len() < self.config.min_upkeep {
            self.add_new();
        }

        let excess = self.inactive.len().saturating_sub(self.config.max_inactive);
        if excess > 0 {
            for mut obj in self.inactive.drain(..excess) {
                obj.on_destroy_excess();
            }
            self.stats.destroyed += excess as u64;
            log::debug!("Pool {} destroyed {} excess entities", self.name, excess);
        }
    }

    /// Inactive entities waiting in the queue
    pub fn len(&self) -> usize {
        self.inactive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inactive.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.inactive.iter().any(|obj| obj.id() == id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> PoolConfig {
        self.config
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[derive(Debug)]
    struct Token {
        id: EntityId,
        active: bool,
        returns: u32,
    }

    impl Poolable for Token {
        fn create(id: EntityId) -> Self {
            Self {
                id,
                active: true,
                returns: 0,
            }
        }

        fn id(&self) -> EntityId {
            self.id
        }

        fn on_acquire(&mut self) {
            self.active = true;
        }

        fn on_return(&mut self) {
            self.active = false;
            self.returns += 1;
        }
    }

    #[test]
    fn test_acquire_grows_on_miss() {
        let mut pool: ObjectPool<Token> = ObjectPool::new("tokens", PoolConfig::new(0, 4)).unwrap();
        assert!(pool.is_empty());
        let a = pool.acquire();
        let b = pool.acquire();
        assert_ne!(a.id, b.id);
        assert!(a.active);
        assert_eq!(pool.stats().created, 2);
        assert_eq!(pool.stats().outstanding(), 2);
    }

    #[test]
    fn test_release_reuses_entity() {
        let mut pool: ObjectPool<Token> = ObjectPool::new("tokens", PoolConfig::new(0, 4)).unwrap();
        let a = pool.acquire();
        let id = a.id;
        pool.release(a);
        assert!(pool.contains(id));
        let again = pool.acquire();
        assert_eq!(again.id, id);
        assert_eq!(again.returns, 1);
        assert_eq!(pool.stats().created, 1);
    }

    #[test]
    fn test_trim_tops_up_one_at_a_time() {
        let mut pool: ObjectPool<Token> = ObjectPool::new("tokens", PoolConfig::new(3, 8)).unwrap();
        pool.trim();
        assert_eq!(pool.len(), 1);
        pool.trim();
        pool.trim();
        pool.trim();
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_trim_destroys_all_excess() {
        let mut pool: ObjectPool<Token> = ObjectPool::new("tokens", PoolConfig::new(0, 2)).unwrap();
        let held: Vec<Token> = (0..6).map(|_| pool.acquire()).collect();
        for token in held {
            pool.release(token);
        }
        assert_eq!(pool.len(), 6);
        pool.trim();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.stats().destroyed, 4);
    }

    #[test]
    fn test_pre_pool_and_misconfiguration() {
        let config = PoolConfig {
            pre_pool: true,
            ..PoolConfig::new(5, 10)
        };
        let pool: ObjectPool<Token> = ObjectPool::new("tokens", config).unwrap();
        assert_eq!(pool.len(), 5);
        assert!(pool.iter_inactive_all_disabled());

        let bad: Result<ObjectPool<Token>, _> = ObjectPool::new("bad", PoolConfig::new(10, 2));
        assert!(matches!(bad, Err(WorldGenError::PoolMisconfigured { .. })));
    }

    impl ObjectPool<Token> {
        fn iter_inactive_all_disabled(&self) -> bool {
            self.inactive.iter().all(|t| !t.active)
        }
    }

    proptest! {
        #[test]
        fn pool_accounting_holds(ops in prop::collection::vec(0u8..3, 1..200), max in 0usize..8) {
            let mut pool: ObjectPool<Token> =
                ObjectPool::new("tokens", PoolConfig::new(0, max)).unwrap();
            let mut live: Vec<Token> = Vec::new();
            let mut acquires = 0usize;
            let mut releases = 0usize;

            for op in ops {
                match op {
                    0 => {
                        live.push(pool.acquire());
                        acquires += 1;
                    }
                    1 => {
                        if let Some(token) = live.pop() {
                            pool.release(token);
                            releases += 1;
                        }
                    }
                    _ => {
                        pool.trim();
                        prop_assert!(pool.len() <= max);
                    }
                }

                let distinct: HashSet<EntityId> = live.iter().map(|t| t.id).collect();
                prop_assert_eq!(distinct.len(), live.len());
                prop_assert!(live.len() <= acquires - releases);
                for token in &live {
                    prop_assert!(!pool.contains(token.id));
                }
            }
        }
    }
}
