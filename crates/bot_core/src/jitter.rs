//! Seeded randomness for placement offsets, pylon picks and learning
//! exploration. The same seed always produces the same sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::math::{Fixed, Vec2Fixed};

/// Resolution of random directions produced by [`Jitter::on_distance`].
const DIRECTION_RESOLUTION: i32 = 1024;

/// Deterministic jitter source owned by the controller.
#[derive(Debug, Clone)]
pub struct Jitter(StdRng);

impl Jitter {
    /// Create a source from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }

    /// Uniform integer in `0..max`. Zero when `max` is zero.
    pub fn offset(&mut self, max: u32) -> u32 {
        if max == 0 {
            0
        } else {
            self.0.random_range(0..max)
        }
    }

    /// Uniform index into a collection of `len` items.
    ///
    /// Returns `None` for an empty collection.
    pub fn pick(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.0.random_range(0..len))
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.0.random_bool(p.clamp(0.0, 1.0))
    }

    /// A point exactly `distance` away from `center` in a random direction.
    pub fn on_distance(&mut self, center: Vec2Fixed, distance: Fixed) -> Vec2Fixed {
        loop {
            let dx = self.0.random_range(-DIRECTION_RESOLUTION..=DIRECTION_RESOLUTION);
            let dy = self.0.random_range(-DIRECTION_RESOLUTION..=DIRECTION_RESOLUTION);
            if dx != 0 || dy != 0 {
                let direction = Vec2Fixed::from_ints(dx, dy).normalize();
                return center + direction.scale(distance);
            }
        }
    }
}
