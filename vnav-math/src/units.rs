use std::f32::consts::{FRAC_PI_2, PI, TAU};
use std::marker::PhantomData;
use std::time::Duration;
use std::{cmp, fmt, iter, ops};

use bevy_math::{Dir2, Vec2, VectorSpace};

mod display;
pub use display::{LengthUnit, SpeedUnit, UnitEnum, format_with_unit};
mod heading;
pub use heading::Heading;
mod position;
pub use position::Position;


/// Converts nautical miles to feet.
pub const FEET_PER_NM: f32 = 6076.12;
/// Converts nautical miles to meter.
pub const METERS_PER_NM: f32 = 1852.;
/// Converts feet to meters.
pub const METERS_PER_FOOT: f32 = 0.3048;
/// Converts minutes to seconds.
pub const SECONDS_PER_MINUTE: f32 = 60.;
/// Converts hours to seconds.
pub const SECONDS_PER_HOUR: f32 = 3600.;

/// A dimensioned scalar or vector.
///
/// `Base` distinguishes lengths from angles,
/// `Dt` counts the number of time derivatives.
pub struct Quantity<T, Base, Dt>(pub T, pub PhantomData<(Base, Dt)>);

impl<T, Base, Dt> Quantity<T, Base, Dt> {
    pub const fn new(value: T) -> Self { Self(value, PhantomData) }
}

impl<T: VectorSpace, Base, Dt> Quantity<T, Base, Dt> {
    pub const ZERO: Self = Self(T::ZERO, PhantomData);
}

impl<T: Default, Base, Dt> Default for Quantity<T, Base, Dt> {
    fn default() -> Self { Self(T::default(), PhantomData) }
}

impl<T: Clone, Base, Dt> Clone for Quantity<T, Base, Dt> {
    fn clone(&self) -> Self { Self(self.0.clone(), PhantomData) }
}

impl<T: Copy, Base, Dt> Copy for Quantity<T, Base, Dt> {}

impl<T: PartialEq, Base, Dt> PartialEq for Quantity<T, Base, Dt> {
    fn eq(&self, other: &Self) -> bool { self.0 == other.0 }
}

impl<T: PartialOrd, Base, Dt> PartialOrd for Quantity<T, Base, Dt> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> { self.0.partial_cmp(&other.0) }
}

impl<T: ops::Add<Output = T>, Base, Dt> ops::Add for Quantity<T, Base, Dt> {
    type Output = Self;

    fn add(self, other: Self) -> Self { Self(self.0 + other.0, PhantomData) }
}

impl<T: ops::AddAssign, Base, Dt> ops::AddAssign for Quantity<T, Base, Dt> {
    fn add_assign(&mut self, other: Self) { self.0 += other.0; }
}

impl<T: ops::Sub<Output = T>, Base, Dt> ops::Sub for Quantity<T, Base, Dt> {
    type Output = Self;

    fn sub(self, other: Self) -> Self { Self(self.0 - other.0, PhantomData) }
}

impl<T: ops::SubAssign, Base, Dt> ops::SubAssign for Quantity<T, Base, Dt> {
    fn sub_assign(&mut self, other: Self) { self.0 -= other.0; }
}

impl<T: ops::Neg<Output = T>, Base, Dt> ops::Neg for Quantity<T, Base, Dt> {
    type Output = Self;

    fn neg(self) -> Self { Self(-self.0, PhantomData) }
}

impl<T: ops::Mul<f32, Output = T>, Base, Dt> ops::Mul<f32> for Quantity<T, Base, Dt> {
    type Output = Self;

    fn mul(self, other: f32) -> Self { Self(self.0 * other, PhantomData) }
}

impl<T: ops::Div<f32, Output = T>, Base, Dt> ops::Div<f32> for Quantity<T, Base, Dt> {
    type Output = Self;

    fn div(self, other: f32) -> Self { Self(self.0 / other, PhantomData) }
}

/// Dimensionless ratio of two quantities of the same unit.
impl<T: ops::Div, Base, Dt> ops::Div for Quantity<T, Base, Dt> {
    type Output = T::Output;

    fn div(self, other: Self) -> T::Output { self.0 / other.0 }
}

impl<T: ops::Rem<Output = T>, Base, Dt> ops::Rem for Quantity<T, Base, Dt> {
    type Output = Self;

    fn rem(self, other: Self) -> Self { Self(self.0 % other.0, PhantomData) }
}

impl<T: Default + ops::Add<Output = T>, Base, Dt> iter::Sum for Quantity<T, Base, Dt> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |sum, value| sum + value)
    }
}

/// Used as `Dt` in `Quantity` to indicate that the unit is not a rate of change.
pub struct DtZero;
/// Used as `Dt` in `Quantity` to indicate that the unit is the rate of change of `Quantity<Dt=Dt>`.
pub struct Ddt<Dt>(Dt);

pub type DtOne = Ddt<DtZero>;
pub type DtTwo = Ddt<DtOne>;

impl<T: ops::Mul<f32, Output = T>, Base, Dt> ops::Mul<Duration> for Quantity<T, Base, Ddt<Dt>> {
    type Output = Quantity<T, Base, Dt>;

    fn mul(self, other: Duration) -> Self::Output {
        Quantity(self.0 * other.as_secs_f32(), PhantomData)
    }
}

impl<T: ops::Div<f32, Output = T>, Base, Dt> ops::Div<Duration> for Quantity<T, Base, Dt> {
    type Output = Quantity<T, Base, Ddt<Dt>>;

    fn div(self, other: Duration) -> Self::Output {
        Quantity(self.0 / other.as_secs_f32(), PhantomData)
    }
}

impl<Base, Dt> Quantity<f32, Base, Dt> {
    /// Time needed to cover `self` at the constant rate `rate`.
    ///
    /// Returns `None` if the result is negative, infinite or NaN.
    #[must_use]
    pub fn try_div(self, rate: Quantity<f32, Base, Ddt<Dt>>) -> Option<Duration> {
        Duration::try_from_secs_f32(self.0 / rate.0).ok()
    }

    #[must_use]
    pub fn is_positive(self) -> bool { self.0 > 0. }

    #[must_use]
    pub fn is_negative(self) -> bool { self.0 < 0. }

    #[must_use]
    pub fn is_finite(self) -> bool { self.0.is_finite() }

    #[must_use]
    pub fn abs(self) -> Self { Self(self.0.abs(), PhantomData) }

    #[must_use]
    pub fn copysign(self, other: Self) -> Self { Self(self.0.copysign(other.0), PhantomData) }

    #[must_use]
    pub fn min(self, other: Self) -> Self { Self(self.0.min(other.0), PhantomData) }

    #[must_use]
    pub fn max(self, other: Self) -> Self { Self(self.0.max(other.0), PhantomData) }

    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self(self.0.clamp(min.0, max.0), PhantomData)
    }

    /// Inverse lerp function.
    #[must_use]
    pub fn ratio_between(self, start: Self, end: Self) -> f32 {
        (self.0 - start.0) / (end.0 - start.0)
    }

    #[must_use]
    pub fn lerp(self, other: Self, s: f32) -> Self {
        Self(self.0 + (other.0 - self.0) * s, PhantomData)
    }

    /// Returns the vector of magnitude `self` pointing towards `heading`.
    #[must_use]
    pub fn with_heading(self, heading: Heading) -> Quantity<Vec2, Base, Dt> {
        Quantity(heading.into_dir2() * self.0, PhantomData)
    }
}

impl<Base, Dt> Quantity<f32, Base, Ddt<Dt>> {
    /// Multiplies by a time span expressed in seconds,
    /// which may be negative unlike [`Duration`].
    #[must_use]
    pub fn mul_secs(self, secs: f32) -> Quantity<f32, Base, Dt> {
        Quantity(self.0 * secs, PhantomData)
    }
}

impl<Base, Dt> ops::Mul<Heading> for Quantity<f32, Base, Dt> {
    type Output = Quantity<Vec2, Base, Dt>;

    fn mul(self, heading: Heading) -> Self::Output { self.with_heading(heading) }
}

impl<Base, Dt> Quantity<Vec2, Base, Dt> {
    /// The eastward component.
    #[must_use]
    pub fn x(self) -> Quantity<f32, Base, Dt> { Quantity(self.0.x, PhantomData) }

    /// The northward component.
    #[must_use]
    pub fn y(self) -> Quantity<f32, Base, Dt> { Quantity(self.0.y, PhantomData) }

    /// Returns the vector component projected along `dir`.
    #[must_use]
    pub fn project_onto_dir(self, dir: Dir2) -> Quantity<f32, Base, Dt> {
        Quantity(self.0.dot(*dir), PhantomData)
    }

    /// Returns the heading of the vector, or `None` if the vector is zero.
    #[must_use]
    pub fn heading(self) -> Option<Heading> {
        (self.0 != Vec2::ZERO && self.0.is_finite()).then(|| Heading::from_vec2(self.0))
    }

    #[must_use]
    pub fn lerp(self, other: Self, s: f32) -> Self { Self(self.0.lerp(other.0, s), PhantomData) }
}

pub struct LengthBase;

/// A distance quantity. Internal representation is in nautical miles.
pub type Length<T> = Quantity<T, LengthBase, DtZero>;

/// A linear speed (rate of [length](Length) change) quantity.
pub type Speed<T> = Quantity<T, LengthBase, DtOne>;

/// A linear acceleration (rate of linear [speed](Speed) change) quantity.
pub type Accel<T> = Quantity<T, LengthBase, DtTwo>;

pub struct AngleBase;

/// A relative angle. Internal representation is in radians.
pub type Angle = Quantity<f32, AngleBase, DtZero>;

impl fmt::Debug for Length<f32> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Length")
            .field("nm", &self.into_nm())
            .field("feet", &self.into_feet())
            .finish()
    }
}

impl fmt::Debug for Speed<f32> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Speed")
            .field("knots", &self.into_knots())
            .field("m/s", &self.into_meter_per_sec())
            .field("fpm", &self.into_fpm())
            .finish()
    }
}

impl fmt::Debug for Speed<Vec2> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Speed")
            .field("east.knots", &self.x().into_knots())
            .field("north.knots", &self.y().into_knots())
            .finish()
    }
}

impl fmt::Debug for Accel<f32> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accel").field("m/s2", &self.into_meters_per_sec2()).finish()
    }
}

impl fmt::Debug for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Angle").field("degrees", &self.into_degrees()).finish()
    }
}

impl Length<f32> {
    #[must_use]
    pub const fn into_nm(self) -> f32 { self.0 }

    #[must_use]
    pub const fn from_nm(nm: f32) -> Self { Self(nm, PhantomData) }

    #[must_use]
    pub const fn into_feet(self) -> f32 { self.0 * FEET_PER_NM }

    #[must_use]
    pub const fn from_feet(feet: f32) -> Self { Self(feet / FEET_PER_NM, PhantomData) }

    #[must_use]
    pub const fn into_meters(self) -> f32 { self.0 * METERS_PER_NM }

    #[must_use]
    pub const fn from_meters(meters: f32) -> Self { Self(meters / METERS_PER_NM, PhantomData) }

    #[must_use]
    pub const fn from_km(km: f32) -> Self { Self(km / (METERS_PER_NM / 1000.), PhantomData) }
}

impl Speed<f32> {
    #[must_use]
    pub const fn into_knots(self) -> f32 { self.0 * SECONDS_PER_HOUR }

    #[must_use]
    pub const fn from_knots(knots: f32) -> Self { Self(knots / SECONDS_PER_HOUR, PhantomData) }

    #[must_use]
    pub const fn into_meter_per_sec(self) -> f32 { self.0 * METERS_PER_NM }

    #[must_use]
    pub const fn from_meter_per_sec(mps: f32) -> Self { Self(mps / METERS_PER_NM, PhantomData) }

    #[must_use]
    pub const fn into_fpm(self) -> f32 { self.0 * (SECONDS_PER_MINUTE * FEET_PER_NM) }

    #[must_use]
    pub const fn from_fpm(fpm: f32) -> Self {
        Self(fpm / (SECONDS_PER_MINUTE * FEET_PER_NM), PhantomData)
    }
}

impl Speed<Vec2> {
    /// Creates a velocity from its eastward and northward components in knots.
    #[must_use]
    pub fn from_knots_vec2(east: f32, north: f32) -> Self {
        Self(Vec2::new(east, north) / SECONDS_PER_HOUR, PhantomData)
    }
}

impl Accel<f32> {
    #[must_use]
    pub const fn into_meters_per_sec2(self) -> f32 { self.0 * METERS_PER_NM }

    #[must_use]
    pub const fn from_meters_per_sec2(mps2: f32) -> Self { Self(mps2 / METERS_PER_NM, PhantomData) }

    #[must_use]
    pub const fn from_fpm_per_sec(fpm: f32) -> Self {
        Self(fpm / (SECONDS_PER_MINUTE * FEET_PER_NM), PhantomData)
    }
}

impl Angle {
    pub const RIGHT: Self = Self(FRAC_PI_2, PhantomData);
    pub const STRAIGHT: Self = Self(PI, PhantomData);

    #[must_use]
    pub const fn from_radians(radians: f32) -> Self { Self(radians, PhantomData) }

    #[must_use]
    pub const fn into_radians(self) -> f32 { self.0 }

    #[must_use]
    pub const fn from_degrees(degrees: f32) -> Self { Self(degrees.to_radians(), PhantomData) }

    #[must_use]
    pub fn into_degrees(self) -> f32 { self.0.to_degrees() }

    #[must_use]
    pub fn sin(self) -> f32 { self.0.sin() }

    #[must_use]
    pub fn cos(self) -> f32 { self.0.cos() }

    #[must_use]
    pub fn tan(self) -> f32 { self.0.tan() }

    /// Normalizes the angle into the range `-STRAIGHT < value <= STRAIGHT`.
    #[must_use]
    pub fn normalize_signed(self) -> Self {
        let mut value = self.0 % TAU;
        if value > PI {
            value -= TAU;
        } else if value <= -PI {
            value += TAU;
        }
        Self(value, PhantomData)
    }
}

impl<T: serde::Serialize, Base, Dt> serde::Serialize for Quantity<T, Base, Dt> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de, Base, Dt> serde::Deserialize<'de> for Quantity<f32, Base, Dt> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let value = f32::deserialize(deserializer)?;

        if !value.is_finite() {
            return Err(<D::Error as serde::de::Error>::custom("non-finite quantity"));
        }

        Ok(Self(value, PhantomData))
    }
}

#[derive(Clone)]
pub struct QuantityMetadataWithUnit<T, U> {
    pub default:   T,
    pub unit:      U,
    pub min:       T,
    pub max:       T,
    pub precision: Option<T>,
}

bevy_mod_config::impl_scalar_config_field!(
    Speed<f32>,
    SpeedMetadata,
    |metadata: &SpeedMetadata| metadata.default,
    'a => Speed<f32>,
    |&value: &Speed<f32>| value,
);

pub type SpeedMetadata = QuantityMetadataWithUnit<Speed<f32>, SpeedUnit>;
impl Default for SpeedMetadata {
    fn default() -> Self {
        Self {
            default:   Speed::from_fpm(1500.0),
            unit:      SpeedUnit::FeetPerMinute,
            min:       Speed::from_fpm(0.0),
            max:       Speed::from_fpm(6000.0),
            precision: Some(Speed::from_fpm(100.0)),
        }
    }
}

bevy_mod_config::impl_scalar_config_field!(
    Angle,
    AngleMetadata,
    |metadata: &AngleMetadata| metadata.default,
    'a => Angle,
    |&value: &Angle| value,
);

#[derive(Clone)]
pub struct AngleMetadata {
    pub default: Angle,
    pub min:     Angle,
    pub max:     Angle,
}

impl Default for AngleMetadata {
    fn default() -> Self { Self { default: Angle::ZERO, min: Angle::ZERO, max: Angle::RIGHT } }
}
