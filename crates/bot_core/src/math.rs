//! Fixed-point geometry for rally points, placement hints and attack targets.
//!
//! Positions never go through floating point so that the same seed and the
//! same snapshots always yield bit-identical commands.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all positional math.
///
/// 32 integer bits and 32 fractional bits.
pub type Fixed = I32F32;

/// Fixed-point 2D position or direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes as the raw bit representation (i64) so values survive
/// serialization exactly.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer map coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Normalize to unit length. The zero vector stays zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.dot(self);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }

    /// Step `distance` from `self` in the direction of `target`.
    ///
    /// Returns `self` when both points coincide.
    #[must_use]
    pub fn towards(self, target: Self, distance: Fixed) -> Self {
        self + (target - self).normalize().scale(distance)
    }
}

/// Square root of a fixed-point number by binary search.
fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::from_num(1) {
        value
    } else {
        Fixed::from_num(1)
    };

    for _ in 0..32 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn epsilon() -> Fixed {
        Fixed::from_num(1) / Fixed::from_num(10000)
    }

    #[test]
    fn test_distance_squared() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_towards_moves_exact_distance_along_axis() {
        let base = Vec2Fixed::from_ints(10, 10);
        let center = Vec2Fixed::from_ints(10, 60);

        let moved = base.towards(center, Fixed::from_num(5));
        assert_eq!(moved.x, Fixed::from_num(10));
        assert!((moved.y - Fixed::from_num(15)).abs() < epsilon());
    }

    #[test]
    fn test_towards_same_point_is_identity() {
        let p = Vec2Fixed::from_ints(7, -3);
        assert_eq!(p.towards(p, Fixed::from_num(9)), p);
    }

    #[test]
    fn test_normalize_preserves_direction() {
        let norm = Vec2Fixed::from_ints(3, 4).normalize();

        let len_sq = norm.dot(norm);
        assert!(
            (len_sq - Fixed::from_num(1)).abs() < epsilon(),
            "normalized length² should be ~1, got {:?}",
            len_sq
        );

        let ratio_diff = (norm.x * Fixed::from_num(4)) - (norm.y * Fixed::from_num(3));
        assert!(ratio_diff.abs() < epsilon());
    }

    #[test]
    fn test_fixed_serde_is_exact() {
        let v = Vec2Fixed::new(Fixed::from_num(1) / Fixed::from_num(3), Fixed::from_num(-2));
        let text = ron::to_string(&v).unwrap();
        let back: Vec2Fixed = ron::from_str(&text).unwrap();
        assert_eq!(v, back);
    }
}
