//! Airspeed targets expressed either as CAS or as Mach number.

use math::{Atmosphere, Position, Speed, isa};

/// A speed target as flown by the autopilot.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum SpeedTarget {
    /// Calibrated airspeed.
    Cas(Speed<f32>),
    /// Mach number.
    Mach(f32),
}

impl SpeedTarget {
    /// Whether this target holds Mach rather than CAS.
    #[must_use]
    pub fn is_mach(self) -> bool { matches!(self, Self::Mach(_)) }

    #[must_use]
    pub fn to_tas(self, atmosphere: &Atmosphere) -> Speed<f32> {
        match self {
            Self::Cas(cas) => atmosphere.cas_to_tas(cas),
            Self::Mach(mach) => atmosphere.mach_to_tas(mach),
        }
    }

    #[must_use]
    pub fn to_cas(self, atmosphere: &Atmosphere) -> Speed<f32> {
        match self {
            Self::Cas(cas) => cas,
            Self::Mach(mach) => atmosphere.mach_to_cas(mach),
        }
    }

    /// True airspeed of this target at a standard-atmosphere altitude.
    #[must_use]
    pub fn tas_at(self, altitude: Position<f32>) -> Speed<f32> { self.to_tas(&isa(altitude)) }

    /// Calibrated airspeed of this target at a standard-atmosphere altitude.
    #[must_use]
    pub fn cas_at(self, altitude: Position<f32>) -> Speed<f32> { self.to_cas(&isa(altitude)) }

    /// Returns the slower of two targets as flown at `altitude`.
    #[must_use]
    pub fn slower_at(self, other: Self, altitude: Position<f32>) -> Self {
        let atmosphere = isa(altitude);
        if other.to_tas(&atmosphere) < self.to_tas(&atmosphere) { other } else { self }
    }
}
