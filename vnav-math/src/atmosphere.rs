//! International Standard Atmosphere and airspeed conversions.
//!
//! All intermediate computation is in SI units.

use crate::units::Position;
use crate::{Accel, Speed};

#[cfg(test)]
mod tests;

/// Altitude of the tropopause.
pub const TROPOPAUSE_ALTITUDE: Position<f32> = Position::from_amsl_meters(11000.0);

/// Standard pressure at sea level, in Pa.
pub const ISA_SEA_LEVEL_PRESSURE: f32 = 101325.0;

/// Standard temperature at sea level, in K.
pub const ISA_SEA_LEVEL_TEMPERATURE: f32 = 288.15;

/// Standard air density at sea level, in kg/m^3.
pub const ISA_SEA_LEVEL_AIR_DENSITY: f32 = 1.225;

/// Standard pressure at the tropopause, in Pa.
pub const ISA_TROPOPAUSE_PRESSURE: f32 = 22632.06;

/// Standard temperature at and above the tropopause, in K.
pub const ISA_TROPOPAUSE_TEMPERATURE: f32 = 216.65;

/// Temperature gradient in the troposphere, in K/m.
///
/// Negative because temperature decreases with altitude.
pub const ISA_LAPSE_RATE: f32 = -0.0065;

/// Specific gas constant for dry air, in SI unit (J/kg/K).
pub const DRY_AIR_GAS_CONSTANT: f32 = 287.05287;

/// Ratio of specific heats of air.
pub const HEAT_CAPACITY_RATIO: f32 = 1.4;

/// Standard gravity at Earth's surface.
pub const EARTH_SURFACE_GRAVITY: Accel<f32> = Accel::from_meters_per_sec2(9.80665);

/// Exponent of the barometric formula in the troposphere, `-g0 / (beta * R)`.
const TROPOSPHERE_EXPONENT: f32 =
    -EARTH_SURFACE_GRAVITY.into_meters_per_sec2() / (ISA_LAPSE_RATE * DRY_AIR_GAS_CONSTANT);

/// Ambient air properties at an altitude.
#[derive(Debug, Clone, Copy)]
pub struct Atmosphere {
    /// Static pressure in Pa.
    pub pressure:    f32,
    /// Air density in kg/m^3.
    pub density:     f32,
    /// Static temperature in K.
    pub temperature: f32,
}

/// Computes the standard atmosphere at a geometric altitude.
#[must_use]
pub fn isa(altitude: Position<f32>) -> Atmosphere {
    let meters = altitude.amsl().into_meters();

    let (temperature, pressure) = if altitude <= TROPOPAUSE_ALTITUDE {
        let temperature = ISA_SEA_LEVEL_TEMPERATURE + ISA_LAPSE_RATE * meters;
        let pressure = ISA_SEA_LEVEL_PRESSURE
            * (temperature / ISA_SEA_LEVEL_TEMPERATURE).powf(TROPOSPHERE_EXPONENT);
        (temperature, pressure)
    } else {
        let above = meters - TROPOPAUSE_ALTITUDE.amsl().into_meters();
        let pressure = ISA_TROPOPAUSE_PRESSURE
            * (-EARTH_SURFACE_GRAVITY.into_meters_per_sec2()
                / (DRY_AIR_GAS_CONSTANT * ISA_TROPOPAUSE_TEMPERATURE)
                * above)
                .exp();
        (ISA_TROPOPAUSE_TEMPERATURE, pressure)
    };

    Atmosphere { pressure, density: pressure / (DRY_AIR_GAS_CONSTANT * temperature), temperature }
}

impl Atmosphere {
    /// Local speed of sound.
    #[must_use]
    pub fn speed_of_sound(&self) -> Speed<f32> {
        Speed::from_meter_per_sec(
            (HEAT_CAPACITY_RATIO * DRY_AIR_GAS_CONSTANT * self.temperature).sqrt(),
        )
    }

    /// Converts calibrated airspeed to true airspeed using compressible flow.
    ///
    /// The sign of the input is preserved.
    #[must_use]
    pub fn cas_to_tas(&self, cas: Speed<f32>) -> Speed<f32> {
        let cas_mps = cas.into_meter_per_sec();
        let impact = ISA_SEA_LEVEL_PRESSURE
            * ((1.0
                + ISA_SEA_LEVEL_AIR_DENSITY * cas_mps * cas_mps / (7.0 * ISA_SEA_LEVEL_PRESSURE))
                .powf(3.5)
                - 1.0);
        let tas_mps = (7.0 * self.pressure / self.density
            * ((1.0 + impact / self.pressure).powf(2.0 / 7.0) - 1.0))
            .max(0.0)
            .sqrt();
        Speed::from_meter_per_sec(tas_mps.copysign(cas_mps))
    }

    /// Converts true airspeed to calibrated airspeed using compressible flow.
    ///
    /// The sign of the input is preserved.
    #[must_use]
    pub fn tas_to_cas(&self, tas: Speed<f32>) -> Speed<f32> {
        let tas_mps = tas.into_meter_per_sec();
        let impact = self.pressure
            * ((1.0 + self.density * tas_mps * tas_mps / (7.0 * self.pressure)).powf(3.5) - 1.0);
        let cas_mps = (7.0 * ISA_SEA_LEVEL_PRESSURE / ISA_SEA_LEVEL_AIR_DENSITY
            * ((1.0 + impact / ISA_SEA_LEVEL_PRESSURE).powf(2.0 / 7.0) - 1.0))
            .max(0.0)
            .sqrt();
        Speed::from_meter_per_sec(cas_mps.copysign(tas_mps))
    }

    #[must_use]
    pub fn mach_to_tas(&self, mach: f32) -> Speed<f32> { self.speed_of_sound() * mach }

    #[must_use]
    pub fn tas_to_mach(&self, tas: Speed<f32>) -> f32 { tas / self.speed_of_sound() }

    #[must_use]
    pub fn mach_to_cas(&self, mach: f32) -> Speed<f32> { self.tas_to_cas(self.mach_to_tas(mach)) }

    #[must_use]
    pub fn cas_to_mach(&self, cas: Speed<f32>) -> f32 { self.tas_to_mach(self.cas_to_tas(cas)) }
}
