use std::f32::consts::{FRAC_PI_2, PI};
use std::{fmt, ops};

use bevy_math::{Dir2, Vec2};

use super::Angle;

/// An absolute directional bearing, clockwise from true north.
#[derive(Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Heading(
    Angle, // always -PI < heading <= PI
);

impl Heading {
    /// Heading north.
    pub const NORTH: Self = Self(Angle::new(0.));
    /// Heading east.
    pub const EAST: Self = Self(Angle::new(FRAC_PI_2));
    /// Heading south.
    pub const SOUTH: Self = Self(Angle::new(PI));
    /// Heading west.
    pub const WEST: Self = Self(Angle::new(-FRAC_PI_2));

    /// Returns the heading of the vector, where x is east and y is north.
    ///
    /// Returns a NaN heading if and only if the argument is zero or contains NaN components.
    #[must_use]
    pub fn from_vec2(vec: Vec2) -> Self { Self(Angle::new(vec.x.atan2(vec.y))) }

    /// Converts the heading into a direction vector.
    #[must_use]
    pub fn into_dir2(self) -> Dir2 {
        let (x, y) = self.0.0.sin_cos();
        Dir2::from_xy_unchecked(x, y)
    }

    /// Creates a heading from an absolute bearing.
    #[must_use]
    pub fn from_degrees(degrees: f32) -> Self { Self::from_radians(Angle::from_degrees(degrees)) }

    /// Creates a heading from an absolute bearing in radians.
    #[must_use]
    pub fn from_radians(radians: Angle) -> Self { Self(radians.normalize_signed()) }

    /// Returns the heading in degrees in the range 0..360.
    #[must_use]
    pub fn degrees(self) -> f32 {
        let degrees = self.0.into_degrees();
        if degrees < 0. { degrees + 360. } else { degrees }
    }

    /// Returns the heading in radians in the range `-STRAIGHT < value <= STRAIGHT`.
    #[must_use]
    pub fn radians(self) -> Angle { self.0 }

    /// The signed angle to turn from `self` to `other` through the shorter direction.
    ///
    /// Positive values are clockwise. The output is in the range `-STRAIGHT < value <= STRAIGHT`.
    #[must_use]
    pub fn closest_distance(self, other: Self) -> Angle { (other.0 - self.0).normalize_signed() }

    /// The reverse direction.
    #[must_use]
    pub fn opposite(self) -> Self { Self::from_radians(self.0 + Angle::STRAIGHT) }
}

impl Default for Heading {
    fn default() -> Self { Self::NORTH }
}

impl fmt::Debug for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Heading").field(&self.degrees()).finish()
    }
}

impl ops::Add<Angle> for Heading {
    type Output = Self;

    fn add(self, rhs: Angle) -> Self { Self::from_radians(self.0 + rhs) }
}

impl ops::Sub<Angle> for Heading {
    type Output = Self;

    fn sub(self, rhs: Angle) -> Self { Self::from_radians(self.0 - rhs) }
}
