use math::{Accel, Position, Speed, isa};

use super::{
    DescentSpeeds, EngineType, Envelope, FlightPhase, MinSpeeds, PerformanceModel, ThrustDrag,
    VertTrend,
};

/// Ratio of the minimum takeoff speed to the takeoff stall speed.
const TAKEOFF_MIN_SPEED_RATIO: f32 = 1.2;
/// Ratio of the minimum speed to the stall speed in other phases.
const MIN_SPEED_RATIO: f32 = 1.3;

/// A BADA 3 operations performance coefficient set.
///
/// Units follow the BADA file conventions: masses in kg, areas in m^2,
/// speeds in knots CAS and altitudes in feet.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BadaCoefficients {
    pub engine:              EngineType,
    pub reference_mass:      f32,
    pub max_mass:            f32,
    pub max_mach:            f32,
    pub max_altitude_ft:     f32,
    pub wing_area:           f32,
    pub stall_speeds_kt:     StallSpeeds,
    pub cruise:              DragPolar,
    pub approach:            DragPolar,
    pub landing:             DragPolar,
    /// Parasitic drag coefficient of the extended landing gear.
    pub gear_drag:           f32,
    pub max_climb_thrust:    MaxClimbThrust,
    pub descent_thrust:      DescentThrust,
    pub descent_cas_low_kt:  f32,
    pub descent_cas_high_kt: f32,
    pub descent_mach:        f32,
    /// Maximum longitudinal acceleration in m/s^2.
    #[serde(default = "default_max_accel")]
    pub max_accel:           f32,
}

fn default_max_accel() -> f32 { 2.0 * math::METERS_PER_FOOT }

/// Stall speeds per configuration, in knots CAS.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StallSpeeds {
    pub takeoff:       f32,
    pub initial_climb: f32,
    pub cruise:        f32,
    pub approach:      f32,
    pub landing:       f32,
}

/// A parabolic drag polar `cd0 + cd2 * cl^2`.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct DragPolar {
    pub cd0: f32,
    pub cd2: f32,
}

impl DragPolar {
    #[must_use]
    pub fn drag_coef(self, lift_coef: f32) -> f32 { self.cd0 + self.cd2 * lift_coef * lift_coef }

    fn is_specified(self) -> bool { self.cd0 != 0.0 }
}

/// Maximum climb thrust coefficients.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaxClimbThrust {
    pub c1: f32,
    pub c2: f32,
    pub c3: f32,
}

impl MaxClimbThrust {
    /// Maximum climb thrust in newtons.
    #[must_use]
    pub fn thrust(self, engine: EngineType, altitude: Position<f32>, tas: Speed<f32>) -> f32 {
        let feet = altitude.amsl().into_feet();
        let knots = tas.into_knots().max(1.0);
        let Self { c1, c2, c3 } = self;

        match engine {
            EngineType::Jet => c1 * (1.0 - feet / c2 + c3 * feet * feet),
            EngineType::Turboprop => c1 / knots * (1.0 - feet / c2) + c3,
            EngineType::Piston => c1 * (1.0 - feet / c2) + c3 / knots,
        }
    }
}

/// Descent thrust as fractions of the maximum climb thrust.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DescentThrust {
    pub high:                   f32,
    pub low:                    f32,
    pub approach:               f32,
    pub landing:                f32,
    pub transition_altitude_ft: f32,
}

impl DescentThrust {
    /// The fraction of maximum climb thrust applied in `phase` at `altitude`.
    #[must_use]
    pub fn factor(self, phase: FlightPhase, altitude: Position<f32>) -> f32 {
        if altitude > Position::from_amsl_feet(self.transition_altitude_ft) {
            return self.high;
        }

        match phase {
            FlightPhase::Approach => self.approach,
            FlightPhase::Landing => self.landing,
            _ => self.low,
        }
    }
}

/// Raised when a coefficient set cannot describe a physical aircraft.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoefficientError {
    #[error("coefficient {0} must be finite")]
    NonFinite(&'static str),
    #[error("coefficient {0} must be positive")]
    NonPositive(&'static str),
}

/// A [`PerformanceModel`] backed by [`BadaCoefficients`].
#[derive(Debug, Clone)]
pub struct BadaModel {
    coefficients: BadaCoefficients,
    envelope:     Envelope,
}

impl BadaModel {
    #[must_use]
    pub fn coefficients(&self) -> &BadaCoefficients { &self.coefficients }
}

impl TryFrom<BadaCoefficients> for BadaModel {
    type Error = CoefficientError;

    fn try_from(coefficients: BadaCoefficients) -> Result<Self, CoefficientError> {
        let c = &coefficients;
        let positive = [
            ("reference_mass", c.reference_mass),
            ("max_mass", c.max_mass),
            ("max_mach", c.max_mach),
            ("max_altitude_ft", c.max_altitude_ft),
            ("wing_area", c.wing_area),
            ("stall_speeds_kt.takeoff", c.stall_speeds_kt.takeoff),
            ("stall_speeds_kt.initial_climb", c.stall_speeds_kt.initial_climb),
            ("stall_speeds_kt.cruise", c.stall_speeds_kt.cruise),
            ("stall_speeds_kt.approach", c.stall_speeds_kt.approach),
            ("stall_speeds_kt.landing", c.stall_speeds_kt.landing),
            ("max_climb_thrust.c1", c.max_climb_thrust.c1),
            ("max_climb_thrust.c2", c.max_climb_thrust.c2),
            ("descent_cas_low_kt", c.descent_cas_low_kt),
            ("descent_cas_high_kt", c.descent_cas_high_kt),
            ("descent_mach", c.descent_mach),
            ("max_accel", c.max_accel),
        ];
        let finite = [
            ("cruise.cd0", c.cruise.cd0),
            ("cruise.cd2", c.cruise.cd2),
            ("approach.cd0", c.approach.cd0),
            ("approach.cd2", c.approach.cd2),
            ("landing.cd0", c.landing.cd0),
            ("landing.cd2", c.landing.cd2),
            ("gear_drag", c.gear_drag),
            ("max_climb_thrust.c3", c.max_climb_thrust.c3),
            ("descent_thrust.high", c.descent_thrust.high),
            ("descent_thrust.low", c.descent_thrust.low),
            ("descent_thrust.approach", c.descent_thrust.approach),
            ("descent_thrust.landing", c.descent_thrust.landing),
            ("descent_thrust.transition_altitude_ft", c.descent_thrust.transition_altitude_ft),
        ];

        for (name, value) in positive.into_iter().chain(finite) {
            if !value.is_finite() {
                return Err(CoefficientError::NonFinite(name));
            }
        }
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(CoefficientError::NonPositive(name));
            }
        }

        let stall = c.stall_speeds_kt;
        let envelope = Envelope {
            engine:         c.engine,
            reference_mass: c.reference_mass,
            max_mass:       c.max_mass,
            max_mach:       c.max_mach,
            max_altitude:   Position::from_amsl_feet(c.max_altitude_ft),
            min_speeds:     MinSpeeds {
                takeoff:       Speed::from_knots(stall.takeoff * TAKEOFF_MIN_SPEED_RATIO),
                initial_climb: Speed::from_knots(stall.initial_climb * MIN_SPEED_RATIO),
                cruise:        Speed::from_knots(stall.cruise * MIN_SPEED_RATIO),
                approach:      Speed::from_knots(stall.approach * MIN_SPEED_RATIO),
                landing:       Speed::from_knots(stall.landing * MIN_SPEED_RATIO),
            },
            descent:        DescentSpeeds {
                cas_low:             Speed::from_knots(c.descent_cas_low_kt),
                cas_high:            Speed::from_knots(c.descent_cas_high_kt),
                mach:                c.descent_mach,
                transition_altitude: Position::from_amsl_feet(
                    c.descent_thrust.transition_altitude_ft,
                ),
            },
            max_accel:      Accel::from_meters_per_sec2(c.max_accel),
        };

        Ok(Self { coefficients, envelope })
    }
}

impl PerformanceModel for BadaModel {
    fn envelope(&self) -> &Envelope { &self.envelope }

    fn thrust_drag(
        &self,
        phase: FlightPhase,
        altitude: Position<f32>,
        tas: Speed<f32>,
        mass: f32,
        trend: VertTrend,
    ) -> ThrustDrag {
        let c = &self.coefficients;
        let atmosphere = isa(altitude);
        let tas_mps = tas.into_meter_per_sec().max(1.0);
        let dynamic_force = 0.5 * atmosphere.density * tas_mps * tas_mps * c.wing_area;
        let lift_coef = mass * math::EARTH_SURFACE_GRAVITY.into_meters_per_sec2() / dynamic_force;

        let drag_coef = match phase {
            FlightPhase::Approach if c.approach.is_specified() => c.approach.drag_coef(lift_coef),
            FlightPhase::Landing if c.landing.is_specified() => {
                c.landing.drag_coef(lift_coef) + c.gear_drag
            }
            _ => c.cruise.drag_coef(lift_coef),
        };
        let drag = drag_coef * dynamic_force;

        let max_thrust = c.max_climb_thrust.thrust(c.engine, altitude, tas);
        let thrust = match trend {
            VertTrend::Climb => max_thrust,
            VertTrend::Level => drag,
            VertTrend::Descent => max_thrust * c.descent_thrust.factor(phase, altitude),
        };

        ThrustDrag { thrust, drag }
    }
}
