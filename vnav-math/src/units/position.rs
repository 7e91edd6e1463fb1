use std::cmp::Ordering;
use std::{fmt, ops};

use super::Length;

/// An altitude above mean sea level.
///
/// Differences between two altitudes are heights, i.e. [`Length`]s.
#[derive(Clone, Copy, PartialEq, PartialOrd, Default, serde::Serialize)]
pub struct Position<T>(pub Length<T>);

impl<'de> serde::Deserialize<'de> for Position<f32> {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        <Length<f32> as serde::Deserialize<'de>>::deserialize(d).map(Self)
    }
}

/// Height of one flight level.
const FLIGHT_LEVEL: Length<f32> = Length::from_feet(100.0);

impl Position<f32> {
    pub const SEA_LEVEL: Self = Self(Length::ZERO);

    #[must_use]
    pub const fn from_amsl_feet(z: f32) -> Self { Self(Length::from_feet(z)) }

    #[must_use]
    pub const fn from_amsl_meters(z: f32) -> Self { Self(Length::from_meters(z)) }

    #[must_use]
    pub fn amsl(self) -> Length<f32> { self.0 }

    /// Altitude in hundreds of feet, without rounding.
    #[must_use]
    pub fn flight_level(self) -> f32 { self.0 / FLIGHT_LEVEL }

    #[must_use]
    pub fn min(self, other: Self) -> Self { Self(self.0.min(other.0)) }

    #[must_use]
    pub fn max(self, other: Self) -> Self { Self(self.0.max(other.0)) }

    /// Total order over altitudes, for sorting.
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.into_meters().total_cmp(&other.0.into_meters())
    }

    /// Position of `self` between `low` and `high`, where 0 is `low` and 1 is `high`.
    #[must_use]
    pub fn ratio_between(self, low: Self, high: Self) -> f32 {
        self.0.ratio_between(low.0, high.0)
    }
}

impl fmt::Debug for Position<f32> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} ft AMSL", self.0.into_feet())
    }
}

impl ops::Add<Length<f32>> for Position<f32> {
    type Output = Self;

    fn add(self, height: Length<f32>) -> Self { Self(self.0 + height) }
}

impl ops::AddAssign<Length<f32>> for Position<f32> {
    fn add_assign(&mut self, height: Length<f32>) { *self = *self + height; }
}

impl ops::Sub<Length<f32>> for Position<f32> {
    type Output = Self;

    fn sub(self, height: Length<f32>) -> Self { Self(self.0 - height) }
}

impl ops::SubAssign<Length<f32>> for Position<f32> {
    fn sub_assign(&mut self, height: Length<f32>) { *self = *self - height; }
}

impl ops::Sub for Position<f32> {
    type Output = Length<f32>;

    fn sub(self, other: Self) -> Length<f32> { self.0 - other.0 }
}
