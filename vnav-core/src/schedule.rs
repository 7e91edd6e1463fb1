//! The BADA descent speed schedule.

use math::{Position, Speed};

use crate::perf::{EngineType, Performance};
use crate::speed::SpeedTarget;

#[cfg(test)]
mod tests;

/// Altitudes at which the jet and turboprop schedule changes speed, in ascending order.
///
/// Each value is the highest altitude of its band.
pub const STEP_ALTITUDES: [Position<f32>; 7] = [
    Position::from_amsl_feet(999.0),
    Position::from_amsl_feet(1499.0),
    Position::from_amsl_feet(1999.0),
    Position::from_amsl_feet(2999.0),
    Position::from_amsl_feet(5999.0),
    Position::from_amsl_feet(9999.0),
    Position::from_amsl_feet(26000.0),
];

/// Above this altitude the schedule holds a Mach number.
pub const MACH_TRANSITION: Position<f32> = Position::from_amsl_feet(26000.0);

/// Aircraft heavier than this (max mass in kg) descend at the lower Mach number.
const HEAVY_MAX_MASS: f32 = 7000.0;

/// Scheduled descent speed at `altitude`.
#[must_use]
pub fn schedule(perf: &Performance, altitude: Position<f32>) -> SpeedTarget {
    match perf.envelope().engine {
        EngineType::Jet | EngineType::Turboprop => turbine_schedule(perf, altitude),
        EngineType::Piston => piston_schedule(perf, altitude),
    }
}

fn turbine_schedule(perf: &Performance, altitude: Position<f32>) -> SpeedTarget {
    let envelope = perf.envelope();
    let landing = envelope.min_speeds.landing * perf.mass_correction();
    let feet = altitude.amsl().into_feet();

    let cas = if feet <= 999.0 {
        landing + Speed::from_knots(5.0)
    } else if feet <= 1499.0 {
        landing + Speed::from_knots(10.0)
    } else if feet <= 1999.0 {
        landing + Speed::from_knots(20.0)
    } else if feet <= 2999.0 {
        landing + Speed::from_knots(50.0)
    } else if feet <= 5999.0 {
        envelope.descent.cas_low.min(Speed::from_knots(220.0))
    } else if feet <= 9999.0 {
        envelope.descent.cas_high.min(Speed::from_knots(250.0))
    } else if altitude <= MACH_TRANSITION {
        Speed::from_knots(280.0)
    } else if envelope.max_mass > HEAVY_MAX_MASS {
        return SpeedTarget::Mach(0.78);
    } else {
        return SpeedTarget::Mach(0.82);
    };

    SpeedTarget::Cas(cas)
}

fn piston_schedule(perf: &Performance, altitude: Position<f32>) -> SpeedTarget {
    let envelope = perf.envelope();
    let feet = altitude.amsl().into_feet();

    if feet <= 1499.0 {
        SpeedTarget::Cas(envelope.min_speeds.landing * perf.mass_correction())
    } else if feet <= 9999.0 {
        SpeedTarget::Cas(envelope.descent.cas_low)
    } else if altitude <= envelope.descent.transition_altitude {
        SpeedTarget::Cas(envelope.descent.cas_high)
    } else {
        SpeedTarget::Mach(envelope.descent.mach)
    }
}
