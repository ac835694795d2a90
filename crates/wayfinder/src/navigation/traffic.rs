//! Traffic delay used by route recalculation.
//!
//! A real deployment would query a live traffic service. The default model
//! draws a bounded uniform delay, seeded for reproducibility when asked.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Supplies the extra delay, in seconds, found by a recalculation.
pub trait TrafficModel: Send {
    /// Delay to add to the session's accumulated delay.
    fn sample_delay(&mut self) -> u64;
}

impl<F> TrafficModel for F
where
    F: FnMut() -> u64 + Send,
{
    fn sample_delay(&mut self) -> u64 {
        self()
    }
}

/// Uniformly distributed delay within fixed bounds.
#[derive(Debug, Clone)]
pub struct RandomTraffic {
    rng: SmallRng,
    min_secs: u64,
    max_secs: u64,
}

impl RandomTraffic {
    /// Create a model drawing from `min_secs..=max_secs`.
    ///
    /// If `seed` is 0 the generator is seeded from entropy, otherwise the
    /// sequence is reproducible. Bounds given in the wrong order are swapped.
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64, seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self {
            rng,
            min_secs: min_secs.min(max_secs),
            max_secs: max_secs.max(min_secs),
        }
    }

    /// The inclusive bounds.
    #[must_use]
    pub fn bounds(&self) -> (u64, u64) {
        (self.min_secs, self.max_secs)
    }
}

impl TrafficModel for RandomTraffic {
    fn sample_delay(&mut self) -> u64 {
        self.rng.gen_range(self.min_secs..=self.max_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_within_bounds() {
        let mut model = RandomTraffic::new(30, 300, 42);
        for _ in 0..1000 {
            let delay = model.sample_delay();
            assert!((30..=300).contains(&delay));
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = RandomTraffic::new(0, 600, 7);
        let mut b = RandomTraffic::new(0, 600, 7);
        for _ in 0..20 {
            assert_eq!(a.sample_delay(), b.sample_delay());
        }
    }

    #[test]
    fn test_swapped_bounds() {
        let model = RandomTraffic::new(100, 10, 1);
        assert_eq!(model.bounds(), (10, 100));
    }

    #[test]
    fn test_degenerate_range() {
        let mut model = RandomTraffic::new(60, 60, 0);
        assert_eq!(model.sample_delay(), 60);
    }

    #[test]
    fn test_closure_model() {
        let mut calls: u64 = 0;
        let mut model = move || {
            calls += 1;
            calls * 10
        };
        assert_eq!(TrafficModel::sample_delay(&mut model), 10);
        assert_eq!(TrafficModel::sample_delay(&mut model), 20);
    }
}
