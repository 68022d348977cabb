//! Weighted discrete sampling

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::WorldGenError;

/// Discrete distribution over `0..weights.len()`
///
/// Precomputes inclusive prefix sums once; every draw is a uniform integer in
/// `[0, total)` mapped back to its bucket with a binary search. Each sampler
/// owns its RNG stream so layers stay reproducible independently.
#[derive(Debug, Clone)]
pub struct WeightedSampler {
    cumulative: Vec<u64>,
    total: u64,
    rng: Pcg32,
}

impl WeightedSampler {
    /// Build a sampler. `None` seeds the stream from the thread-local generator.
    pub fn new(weights: &[u32], rng: Option<Pcg32>) -> Self {
        let mut total = 0u64;
        let cumulative = weights
            .iter()
            .map(|&w| {
                total += u64::from(w);
                total
            })
            .collect();

        Self {
            cumulative,
            total,
            rng: rng.unwrap_or_else(|| Pcg32::from_rng(&mut rand::rng())),
        }
    }

    pub fn seeded(weights: &[u32], seed: u64) -> Self {
        Self::new(weights, Some(Pcg32::seed_from_u64(seed)))
    }

    /// Draw the next index
    pub fn next(&mut self) -> Result<usize, WorldGenError> {
        if self.total == 0 {
            return Err(WorldGenError::EmptyDistribution);
        }
        let draw = self.rng.random_range(0..self.total);
        Ok(self.cumulative.partition_point(|&c| c <= draw))
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_weight_first() {
        let mut sampler = WeightedSampler::seeded(&[1, 0, 0], 1);
        for _ in 0..500 {
            assert_eq!(sampler.next(), Ok(0));
        }
    }

    #[test]
    fn test_single_weight_last() {
        let mut sampler = WeightedSampler::seeded(&[0, 0, 1], 1);
        for _ in 0..500 {
            assert_eq!(sampler.next(), Ok(2));
        }
    }

    #[test]
    fn test_zero_total_is_an_error() {
        let mut sampler = WeightedSampler::seeded(&[0, 0], 3);
        assert_eq!(sampler.next(), Err(WorldGenError::EmptyDistribution));

        let mut empty = WeightedSampler::seeded(&[], 3);
        assert!(empty.is_empty());
        assert_eq!(empty.next(), Err(WorldGenError::EmptyDistribution));
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = WeightedSampler::seeded(&[3, 5, 2, 9], 10403);
        let mut b = WeightedSampler::seeded(&[3, 5, 2, 9], 10403);
        for _ in 0..100 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn test_unseeded_sampler_draws() {
        let mut sampler = WeightedSampler::new(&[1, 1], None);
        assert!(sampler.next().unwrap() < 2);
    }

    proptest! {
        #[test]
        fn next_always_in_range(
            weights in prop::collection::vec(0u32..50, 1..12),
            seed in any::<u64>(),
        ) {
            prop_assume!(weights.iter().any(|&w| w > 0));
            let mut sampler = WeightedSampler::seeded(&weights, seed);
            for _ in 0..64 {
                let index = sampler.next().unwrap();
                prop_assert!(index < weights.len());
                prop_assert!(weights[index] > 0);
            }
        }

        #[test]
        fn frequencies_converge(
            weights in prop::collection::vec(1u32..20, 2..6),
            seed in any::<u64>(),
        ) {
            const DRAWS: usize = 20_000;
            let mut sampler = WeightedSampler::seeded(&weights, seed);
            let mut counts = vec![0usize; weights.len()];
            for _ in 0..DRAWS {
                counts[sampler.next().unwrap()] += 1;
            }
            let total: u32 = weights.iter().sum();
            for (count, weight) in counts.iter().zip(&weights) {
                let expected = f64::from(*weight) / f64::from(total);
                let observed = *count as f64 / DRAWS as f64;
                prop_assert!((expected - observed).abs() < 0.03);
            }
        }
    }
}
