use std::time::Duration;

use math::{Accel, Length, Position, Speed, isa};
use smallvec::SmallVec;

use crate::perf::{FlightPhase, Performance, SpeedHold, SpeedTrend, ThrustDrag, VertTrend};
use crate::schedule::{self, MACH_TRANSITION, STEP_ALTITUDES};
use crate::speed::SpeedTarget;

/// Height of one descent table segment.
pub const SEGMENT_HEIGHT: Length<f32> = Length::from_feet(100.0);

/// Altitude sampled for the schedule speed above the highest step altitude.
const ABOVE_MACH_TRANSITION: Position<f32> = Position::from_amsl_feet(28600.0);

/// Time step of the deceleration segment simulation.
const DECEL_STEP: Duration = Duration::from_secs(1);
/// Deceleration flown in a deceleration segment.
const DECEL_RATE: Accel<f32> = Accel::from_meters_per_sec2(0.5);
/// Energy share factor of a decelerating descent.
const DECEL_ENERGY_SHARE: f32 = 0.3;
/// Upper bound of simulation steps in a deceleration segment.
const MAX_DECEL_STEPS: usize = 600;
/// Speeds closer than this are considered equal when decelerating.
const SPEED_TOLERANCE: Speed<f32> = Speed::from_meter_per_sec(0.01);

/// Reference vertical acceleration when entering the descent.
const VERTICAL_ACCEL: Accel<f32> = Accel::from_fpm_per_sec(300.0);

/// Flight path angles are floored to this value before dividing by them.
const MIN_GAMMA: f32 = 1e-4;
/// Ground speeds are floored to this value before dividing by them.
const MIN_GROUND_SPEED: Speed<f32> = Speed::from_meter_per_sec(0.1);

/// Nominal descent state in one altitude segment.
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    /// Bottom of the segment.
    pub altitude:     Position<f32>,
    /// Speed target flown in the segment.
    pub speed:        SpeedTarget,
    pub cas:          Speed<f32>,
    pub tas:          Speed<f32>,
    pub mach:         f32,
    pub phase:        FlightPhase,
    pub energy_share: f32,
    pub forces:       ThrustDrag,
    /// Nominal rate of descent, negative when descending.
    pub vert_rate:    Speed<f32>,
    /// True airspeed used for the path angle.
    ///
    /// Below the Mach transition this is capped at the airspeed flown at build time.
    pub path_tas:     Speed<f32>,
    /// Still-air flight path angle as a ratio of height to distance.
    pub gamma:        f32,
}

/// A speed reduction of the schedule at a step altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecelSegment {
    pub altitude: Position<f32>,
    /// Speed below the step altitude.
    pub slow:     SpeedTarget,
    /// Speed above the step altitude.
    pub fast:     SpeedTarget,
}

/// Difference between a deceleration segment and the nominal descent over the same altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecelCorrection {
    /// Distance flown in addition to the nominal profile.
    pub extra_distance:  Length<f32>,
    /// Altitude change during the deceleration, negative when descending.
    pub altitude_change: Length<f32>,
}

/// The nominal descent performance of one aircraft, per [`SEGMENT_HEIGHT`] of altitude.
#[derive(Clone)]
pub struct DescentTable {
    segments: Vec<Segment>,
    decel:    SmallVec<[DecelSegment; 8]>,
    perf:     Performance,
    /// Aircraft altitude at build time.
    altitude: Position<f32>,
    /// Aircraft calibrated airspeed at build time.
    cas:      Speed<f32>,
}

impl DescentTable {
    /// Tabulates the descent of an aircraft currently at `altitude` and `tas`.
    ///
    /// If `override_cas` is set, every segment flies that airspeed
    /// instead of the schedule, and no deceleration segments are generated.
    #[must_use]
    pub fn build(
        perf: &Performance,
        altitude: Position<f32>,
        tas: Speed<f32>,
        override_cas: Option<Speed<f32>>,
    ) -> Self {
        let altitude = altitude.max(Position::SEA_LEVEL);
        let cas = isa(altitude).tas_to_cas(tas);
        let path_cas_cap = (altitude <= MACH_TRANSITION).then_some(cas);

        let segments = (0..segment_count(altitude))
            .map(|index| {
                let speed = match override_cas {
                    Some(cas) => SpeedTarget::Cas(cas),
                    None => schedule::schedule(perf, segment_bottom(index)),
                };
                build_segment(perf, segment_bottom(index), speed, path_cas_cap)
            })
            .collect();

        let decel = if override_cas.is_some() {
            SmallVec::new()
        } else {
            decel_segments(perf, altitude, cas)
        };

        Self { segments, decel, perf: perf.clone(), altitude, cas }
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] { &self.segments }

    #[must_use]
    pub fn decel_segments(&self) -> &[DecelSegment] { &self.decel }

    /// Aircraft altitude when the table was built.
    #[must_use]
    pub fn top(&self) -> Position<f32> { self.altitude }

    /// Index of the segment containing `altitude`, clamped to the table.
    #[must_use]
    pub fn index_at(&self, altitude: Position<f32>) -> usize {
        segment_index(altitude).min(self.segments.len().saturating_sub(1))
    }

    /// Segment containing `altitude`, clamped to the table.
    #[must_use]
    pub fn segment_at(&self, altitude: Position<f32>) -> Option<&Segment> {
        self.segments.get(self.index_at(altitude))
    }

    /// Flight path angle of a segment with the given wind component along track.
    #[must_use]
    pub fn gamma(&self, index: usize, tailwind: Speed<f32>) -> f32 {
        let Some(segment) = self.segments.get(index.min(self.segments.len().saturating_sub(1)))
        else {
            return MIN_GAMMA;
        };
        let ground_speed = (segment.path_tas + tailwind).max(MIN_GROUND_SPEED);
        (segment.vert_rate.abs() / ground_speed).max(MIN_GAMMA)
    }

    /// Whether a deceleration segment is flown by this aircraft.
    ///
    /// Segments towards a Mach target always apply.
    /// Otherwise the aircraft must not already be slower than the upper speed.
    #[must_use]
    pub fn decel_applies(&self, segment: &DecelSegment) -> bool {
        segment.fast.is_mach()
            || segment.fast.cas_at(segment.altitude) <= self.cas + SPEED_TOLERANCE
    }

    /// Horizontal distance to descend from `high` to `low` on the nominal profile.
    #[must_use]
    pub fn nominal_distance(
        &self,
        low: Position<f32>,
        high: Position<f32>,
        tailwind: Speed<f32>,
    ) -> Length<f32> {
        let low = low.max(Position::SEA_LEVEL);
        if high <= low {
            return Length::ZERO;
        }

        let first = segment_index(low);
        let last = segment_index(high);
        if first == last {
            return (high - low) / self.gamma(first, tailwind);
        }

        let mut distance = (segment_bottom(first + 1) - low) / self.gamma(first, tailwind);
        for index in first + 1..last {
            distance += SEGMENT_HEIGHT / self.gamma(index, tailwind);
        }
        distance + (high - segment_bottom(last)) / self.gamma(last, tailwind)
    }

    /// Simulates decelerating from `fast` to `slow` while descending from `altitude`.
    #[must_use]
    pub fn decel_segment(
        &self,
        altitude: Position<f32>,
        slow: SpeedTarget,
        fast: SpeedTarget,
        tailwind: Speed<f32>,
    ) -> DecelCorrection {
        let model = &self.perf.model;
        let mass = self.perf.mass;
        let slow_cas = slow.cas_at(altitude);
        let step_limit = self.perf.max_accel().abs() * DECEL_STEP;

        let mut cas = fast.cas_at(altitude);
        let mut altitude_change = Length::ZERO;
        let mut distance = Length::ZERO;

        for _ in 0..MAX_DECEL_STEPS {
            if cas - slow_cas <= SPEED_TOLERANCE {
                break;
            }

            let current = altitude + altitude_change;
            let atmosphere = isa(current);
            let target_tas = atmosphere.cas_to_tas(slow_cas);
            let current_tas = atmosphere.cas_to_tas(cas);
            let tas = if current_tas - target_tas > step_limit {
                current_tas - DECEL_RATE * DECEL_STEP
            } else {
                target_tas
            };
            cas = atmosphere.tas_to_cas(tas);

            let phase = model.phase(current, cas, VertTrend::Level);
            let forces = model.thrust_drag(phase, current, tas, mass, VertTrend::Descent);
            altitude_change += forces.vert_rate(tas, mass, DECEL_ENERGY_SHARE) * DECEL_STEP;
            distance += (tas + tailwind).max(Speed::ZERO) * DECEL_STEP;
        }

        let nominal = self.nominal_distance(altitude + altitude_change, altitude, tailwind);
        DecelCorrection { extra_distance: distance - nominal, altitude_change }
    }

    /// Altitude lost and distance flown while the vertical rate builds up at `altitude`.
    ///
    /// Returns `(altitude_loss, distance)`.
    #[must_use]
    pub fn vertical_transition(&self, altitude: Position<f32>) -> (Length<f32>, Length<f32>) {
        let index = self.index_at(altitude).saturating_sub(1);
        let Some(segment) = self.segments.get(index) else { return (Length::ZERO, Length::ZERO) };

        let rate = segment.vert_rate.into_meter_per_sec();
        let accel = VERTICAL_ACCEL.into_meters_per_sec2();
        (
            Length::from_meters(rate * rate / (2.0 * accel)),
            Length::from_meters(segment.tas.into_meter_per_sec() * rate.abs() / accel),
        )
    }
}

/// Number of segments covering sea level up to one segment above `altitude`.
fn segment_count(altitude: Position<f32>) -> usize {
    // tolerate rounding noise from unit conversion on exact multiples
    let ratio = altitude.amsl() / SEGMENT_HEIGHT - 1e-4;
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // non-negative after max
    let count = ratio.ceil().max(0.0) as usize + 1;
    count
}

pub(super) fn segment_index(altitude: Position<f32>) -> usize {
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // non-negative after max
    let index = (altitude.amsl() / SEGMENT_HEIGHT).floor().max(0.0) as usize;
    index
}

pub(super) fn segment_bottom(index: usize) -> Position<f32> {
    #[expect(clippy::cast_precision_loss)] // segment counts are small
    let height = SEGMENT_HEIGHT * index as f32;
    Position::SEA_LEVEL + height
}

fn build_segment(
    perf: &Performance,
    altitude: Position<f32>,
    speed: SpeedTarget,
    path_cas_cap: Option<Speed<f32>>,
) -> Segment {
    let model = &perf.model;
    let atmosphere = isa(altitude);
    let cas = speed.to_cas(&atmosphere);
    let tas = speed.to_tas(&atmosphere);
    let mach = atmosphere.tas_to_mach(tas);

    let phase = model.phase(altitude, cas, VertTrend::Descent);
    let hold = if speed.is_mach() { SpeedHold::Mach } else { SpeedHold::Cas };
    let energy_share = model.energy_share_factor(
        altitude,
        mach,
        hold,
        SpeedTrend::Constant,
        VertTrend::Descent,
    );
    let forces = model.thrust_drag(phase, altitude, tas, perf.mass, VertTrend::Descent);
    let vert_rate = forces.vert_rate(tas, perf.mass, energy_share);

    let path_tas = match path_cas_cap {
        Some(cap) if cap < cas => atmosphere.cas_to_tas(cap),
        _ => tas,
    };
    let gamma = (vert_rate.abs() / path_tas.max(MIN_GROUND_SPEED)).max(MIN_GAMMA);

    Segment {
        altitude,
        speed,
        cas,
        tas,
        mach,
        phase,
        energy_share,
        forces,
        vert_rate,
        path_tas,
        gamma,
    }
}

/// Deceleration segments at the schedule step altitudes below `altitude`.
fn decel_segments(
    perf: &Performance,
    altitude: Position<f32>,
    cas: Speed<f32>,
) -> SmallVec<[DecelSegment; 8]> {
    let speeds: SmallVec<[SpeedTarget; 8]> = STEP_ALTITUDES
        .iter()
        .chain([&ABOVE_MACH_TRANSITION])
        .map(|&step| schedule::schedule(perf, step))
        .collect();

    let mut segments = SmallVec::new();
    for (index, &step) in STEP_ALTITUDES.iter().enumerate() {
        let (Some(&slow), Some(&fast)) = (speeds.get(index), speeds.get(index + 1)) else {
            continue;
        };
        if slow == fast {
            continue;
        }

        if altitude > MACH_TRANSITION {
            segments.push(DecelSegment { altitude: step, slow, fast });
            continue;
        }
        if step > altitude {
            continue;
        }

        let slow_cas = slow.cas_at(step);
        let fast_cas = fast.cas_at(step);
        if fast_cas <= cas {
            segments.push(DecelSegment { altitude: step, slow, fast });
        } else if slow_cas < cas {
            // already slower than the schedule, so only decelerate from the current speed
            segments.push(DecelSegment { altitude: step, slow, fast: SpeedTarget::Cas(cas) });
        }
    }
    segments
}
