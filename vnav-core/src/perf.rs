//! Aircraft performance: flight phases, thrust, drag and the energy share factor.
//!
//! The guidance engine treats the performance model as a black box behind [`PerformanceModel`].
//! [`BadaModel`] is the built-in implementation driven by a BADA-style coefficient set.

use std::sync::Arc;

use bevy::ecs::component::Component;
use math::{
    Accel, DRY_AIR_GAS_CONSTANT, EARTH_SURFACE_GRAVITY, HEAT_CAPACITY_RATIO, ISA_LAPSE_RATE,
    Position, Speed, TROPOPAUSE_ALTITUDE,
};

mod bada;
pub use bada::{
    BadaCoefficients, BadaModel, CoefficientError, DescentThrust, DragPolar, MaxClimbThrust,
    StallSpeeds,
};

#[cfg(test)]
pub(crate) mod testing;

/// Propulsion class of an aircraft type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EngineType {
    Jet,
    Turboprop,
    Piston,
}

/// Flight phase of the BADA phase taxonomy.
///
/// Variants are ordered by restrictiveness.
/// When several phase predicates hold at once, the greatest one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::EnumIter)]
pub enum FlightPhase {
    Takeoff,
    InitialClimb,
    Cruise,
    Approach,
    Landing,
    Ground,
}

/// Direction of vertical motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertTrend {
    Climb,
    Level,
    Descent,
}

impl VertTrend {
    /// Classifies a vertical rate.
    #[must_use]
    pub fn of(vert_rate: Speed<f32>) -> Self {
        if vert_rate.is_positive() {
            Self::Climb
        } else if vert_rate.is_negative() {
            Self::Descent
        } else {
            Self::Level
        }
    }

    fn at_least_level(self) -> bool { matches!(self, Self::Climb | Self::Level) }

    fn at_most_level(self) -> bool { matches!(self, Self::Descent | Self::Level) }
}

/// Direction of airspeed change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedTrend {
    Accelerate,
    Constant,
    Decelerate,
}

/// The airspeed quantity held constant by the autothrottle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedHold {
    Mach,
    Cas,
}

/// Thrust and drag forces, in newtons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrustDrag {
    pub thrust: f32,
    pub drag:   f32,
}

impl ThrustDrag {
    /// Vertical rate resulting from the excess power of these forces.
    ///
    /// `mass` is in kilograms. The result is negative when drag exceeds thrust.
    #[must_use]
    pub fn vert_rate(self, tas: Speed<f32>, mass: f32, energy_share: f32) -> Speed<f32> {
        let excess_power = (self.thrust - self.drag) * tas.into_meter_per_sec();
        Speed::from_meter_per_sec(
            excess_power / (mass * EARTH_SURFACE_GRAVITY.into_meters_per_sec2()) * energy_share,
        )
    }
}

/// Minimum calibrated airspeeds per flight phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinSpeeds {
    pub takeoff:       Speed<f32>,
    pub initial_climb: Speed<f32>,
    pub cruise:        Speed<f32>,
    pub approach:      Speed<f32>,
    pub landing:       Speed<f32>,
}

/// Reference speeds of the nominal descent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescentSpeeds {
    /// Descent CAS below 10000 ft.
    pub cas_low:             Speed<f32>,
    /// Descent CAS above 10000 ft.
    pub cas_high:            Speed<f32>,
    /// Descent Mach number.
    pub mach:                f32,
    /// Altitude at which descent thrust switches from the high to the low setting.
    pub transition_altitude: Position<f32>,
}

/// Flight envelope limits of an aircraft type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub engine:         EngineType,
    /// Reference mass in kg.
    pub reference_mass: f32,
    /// Maximum mass in kg.
    pub max_mass:       f32,
    pub max_mach:       f32,
    pub max_altitude:   Position<f32>,
    pub min_speeds:     MinSpeeds,
    pub descent:        DescentSpeeds,
    /// Magnitude of the maximum longitudinal acceleration.
    pub max_accel:      Accel<f32>,
}

impl Envelope {
    /// Minimum speed of the given phase.
    #[must_use]
    pub fn min_speed(&self, phase: FlightPhase) -> Speed<f32> {
        match phase {
            FlightPhase::Takeoff | FlightPhase::Ground => self.min_speeds.takeoff,
            FlightPhase::InitialClimb => self.min_speeds.initial_climb,
            FlightPhase::Cruise => self.min_speeds.cruise,
            FlightPhase::Approach => self.min_speeds.approach,
            FlightPhase::Landing => self.min_speeds.landing,
        }
    }
}

/// Per-type physical constants and performance functions.
pub trait PerformanceModel: Send + Sync + 'static {
    fn envelope(&self) -> &Envelope;

    /// Classifies the flight phase from altitude, calibrated airspeed and vertical trend.
    fn phase(&self, altitude: Position<f32>, cas: Speed<f32>, trend: VertTrend) -> FlightPhase {
        classify_phase(self.envelope(), altitude, cas, trend)
    }

    /// Computes thrust and drag at the given state.
    ///
    /// `mass` is in kilograms.
    fn thrust_drag(
        &self,
        phase: FlightPhase,
        altitude: Position<f32>,
        tas: Speed<f32>,
        mass: f32,
        trend: VertTrend,
    ) -> ThrustDrag;

    /// Fraction of excess power spent on climbing or descending.
    fn energy_share_factor(
        &self,
        altitude: Position<f32>,
        mach: f32,
        hold: SpeedHold,
        speed: SpeedTrend,
        trend: VertTrend,
    ) -> f32 {
        energy_share_factor(altitude, mach, hold, speed, trend)
    }
}

/// Performance data of an aircraft.
#[derive(Component, Clone)]
pub struct Performance {
    pub model: Arc<dyn PerformanceModel>,
    /// Current mass in kg.
    pub mass:  f32,
}

impl Performance {
    #[must_use]
    pub fn envelope(&self) -> &Envelope { self.model.envelope() }

    /// Scaling of reference speeds for the current mass, `sqrt(mass / reference_mass)`.
    #[must_use]
    pub fn mass_correction(&self) -> f32 {
        (self.mass / self.envelope().reference_mass.max(1.0)).max(0.0).sqrt()
    }

    #[must_use]
    pub fn max_accel(&self) -> Accel<f32> { self.envelope().max_accel }
}

/// Classifies the flight phase per BADA 3 conventions.
#[must_use]
pub fn classify_phase(
    envelope: &Envelope,
    altitude: Position<f32>,
    cas: Speed<f32>,
    trend: VertTrend,
) -> FlightPhase {
    let feet = altitude.amsl().into_feet();
    let cruise_margin = envelope.min_speeds.cruise + Speed::from_knots(10.0);
    let approach_margin = envelope.min_speeds.approach + Speed::from_knots(10.0);

    let takeoff = feet < 400.0 && cas > Speed::from_knots(30.0) && trend.at_least_level();
    let initial_climb = (400.0..2000.0).contains(&feet) && trend == VertTrend::Climb;
    let cruise = (feet >= 2000.0 && trend.at_least_level())
        || feet > 8000.0
        || (trend.at_most_level() && cas >= cruise_margin);
    let approach = feet > 1.0
        && trend.at_most_level()
        && ((feet <= 8000.0 && cas < cruise_margin)
            || (feet <= 3000.0 && cas >= approach_margin && cas < cruise_margin));
    let landing = feet <= 3000.0 && cas < approach_margin && trend.at_most_level();
    let ground = feet <= 1.0;

    [
        (takeoff, FlightPhase::Takeoff),
        (initial_climb, FlightPhase::InitialClimb),
        (cruise, FlightPhase::Cruise),
        (approach, FlightPhase::Approach),
        (landing, FlightPhase::Landing),
        (ground, FlightPhase::Ground),
    ]
    .into_iter()
    .filter_map(|(matches, phase)| matches.then_some(phase))
    .max()
    .unwrap_or(FlightPhase::Takeoff)
}

/// `gamma * R * beta / (2 * g0)`.
const ESF_TEMPERATURE_TERM: f32 = HEAT_CAPACITY_RATIO * DRY_AIR_GAS_CONSTANT * ISA_LAPSE_RATE
    / (2.0 * EARTH_SURFACE_GRAVITY.into_meters_per_sec2());

/// `(gamma - 1) / 2`.
const ESF_GAMMA_1: f32 = (HEAT_CAPACITY_RATIO - 1.0) / 2.0;

/// `gamma / (gamma - 1)`.
const ESF_GAMMA_2: f32 = HEAT_CAPACITY_RATIO / (HEAT_CAPACITY_RATIO - 1.0);

/// Energy share factor per BADA 3.
///
/// Returns 1 when the aircraft is neither climbing nor descending while changing speed.
#[must_use]
pub fn energy_share_factor(
    altitude: Position<f32>,
    mach: f32,
    hold: SpeedHold,
    speed: SpeedTrend,
    trend: VertTrend,
) -> f32 {
    match (speed, trend) {
        (SpeedTrend::Constant, _) => constant_speed_esf(altitude, mach, hold),
        (SpeedTrend::Accelerate, VertTrend::Climb)
        | (SpeedTrend::Decelerate, VertTrend::Descent) => 0.3,
        (SpeedTrend::Decelerate, VertTrend::Climb)
        | (SpeedTrend::Accelerate, VertTrend::Descent) => 1.7,
        (_, VertTrend::Level) => 1.0,
    }
}

fn constant_speed_esf(altitude: Position<f32>, mach: f32, hold: SpeedHold) -> f32 {
    let mach2 = mach * mach;
    let above_tropopause = altitude > TROPOPAUSE_ALTITUDE;
    let compressibility = || {
        let base = 1.0 + ESF_GAMMA_1 * mach2;
        base.powf(-1.0 / (HEAT_CAPACITY_RATIO - 1.0)) * (base.powf(ESF_GAMMA_2) - 1.0)
    };

    match (hold, above_tropopause) {
        (SpeedHold::Mach, true) => 1.0,
        (SpeedHold::Mach, false) => 1.0 / (1.0 + ESF_TEMPERATURE_TERM * mach2),
        (SpeedHold::Cas, false) => {
            1.0 / (1.0 + ESF_TEMPERATURE_TERM * mach2 + compressibility())
        }
        (SpeedHold::Cas, true) => 1.0 / (1.0 + compressibility()),
    }
}
