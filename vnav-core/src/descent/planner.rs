use std::iter;

use bevy::log::debug;
use math::geo::{self, LatLon, PathStep};
use math::{Length, LengthUnit, Position, Speed, format_with_unit};
use smallvec::SmallVec;

use super::profile::{DecelCorrection, DescentTable, segment_bottom, segment_index};
use crate::perf::Performance;
use crate::route::{Restriction, Route};
use crate::speed::SpeedTarget;
use crate::wind::{self, WindField};

/// Maximum distance between two wind samples along a path.
const WIND_SAMPLE_STEP: Length<f32> = Length::from_nm(1.0);

/// Available distances are floored to this value before dividing by them.
const MIN_DISTANCE: Length<f32> = Length::from_meters(1.0);

/// State of the previous plan that affects the next one.
///
/// The planner returns the carry for the next plan in [`DescentPlan::carry`].
/// It takes effect once the aircraft passes the constrained waypoint of that plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DescentCarry {
    /// The previous constraint could be passed in a continuous descent.
    pub continuous: bool,
    /// The previous constraint requested geometric descent afterwards.
    pub geometric:  bool,
}

/// How the descent towards the next altitude constraint is flown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum PlanMode {
    /// No descent is planned.
    #[default]
    Idle,
    /// Descend at the nominal profile from a top of descent.
    Discrete {
        /// Distance before the countdown waypoint at which the descent starts.
        distance:  Length<f32>,
        /// Number of waypoint passages before the countdown waypoint becomes active.
        countdown: u32,
    },
    /// Descend now along a constant flight path angle.
    Geometric {
        /// Height lost per horizontal distance.
        steepness: f32,
    },
    /// Keep descending from the previous constraint without leveling off.
    Continuous,
}

/// Input of [`plan`].
pub struct PlanInput<'a> {
    pub perf:           &'a Performance,
    pub route:          &'a Route,
    pub wind:           &'a dyn WindField,
    pub position:       LatLon,
    pub altitude:       Position<f32>,
    pub true_airspeed:  Speed<f32>,
    /// Manually selected airspeed that replaces the speed schedule.
    pub speed_override: Option<Speed<f32>>,
    pub carry:          DescentCarry,
}

/// A descent plan towards the next altitude constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescentPlan {
    /// Route index of the first waypoint with an altitude constraint.
    pub constrained_index: usize,
    /// Altitude to reach at the constrained waypoint.
    pub target_altitude:   Position<f32>,
    pub mode:              PlanMode,
    /// Height lost per horizontal distance on the nominal profile.
    pub gradient:          f32,
    /// Carry for the plan computed after passing the constrained waypoint.
    pub carry:             DescentCarry,
}

/// Plans the descent to the first altitude constraint at or after the active waypoint.
///
/// Returns `None` if there is no such constraint.
#[must_use]
pub fn plan(input: &PlanInput) -> Option<DescentPlan> {
    let route = input.route;
    let active = route.active_index()?;
    let restricted: SmallVec<[usize; 8]> = route.restricted_from(active).collect();
    let &nearest = restricted.first()?;

    let table = DescentTable::build(
        input.perf,
        input.altitude,
        input.true_airspeed,
        input.speed_override,
    );

    let resolved = resolve_constraints(&table, route, &restricted, input.wind)?;
    let target_altitude = resolved.altitude - resolved.correction;
    let carry = DescentCarry { continuous: resolved.continuous, geometric: resolved.geometric };
    let height = input.altitude - resolved.altitude;

    let legs: SmallVec<[Length<f32>; 8]> =
        (active..nearest).map(|index| route.leg_length(index).unwrap_or(Length::ZERO)).collect();
    let to_nearest: Length<f32> = legs.iter().copied().sum();
    let to_active =
        route.get(active).map_or(Length::ZERO, |wp| input.position.distance(wp.position));
    let available = to_active + to_nearest;

    let points: Vec<LatLon> =
        iter::once(input.position).chain(route.positions(active, nearest)).collect();
    let walker = Walker::new(&table, &points, input.wind);
    let (transition_height, transition_distance) = table.vertical_transition(input.altitude);
    let waypoint_speed = route.get(nearest).and_then(|wp| wp.speed);
    let descent =
        walker.distance(resolved.altitude, input.altitude - transition_height, waypoint_speed);
    let required = descent + transition_distance + resolved.overshoot;
    let gradient = (height / required.max(MIN_DISTANCE)).max(0.0);

    let mode = if input.carry.continuous {
        PlanMode::Continuous
    } else if required > available || (input.carry.geometric && !resolved.continuous) {
        let steepness = height / available.max(MIN_DISTANCE);
        debug!(
            "Geometric descent to {target_altitude:?}: {} required but {} available, \
             steepness {steepness}",
            format_with_unit(LengthUnit::NauticalMiles, required),
            format_with_unit(LengthUnit::NauticalMiles, available),
        );
        PlanMode::Geometric { steepness }
    } else {
        let mut distance = required - to_nearest;
        let mut countdown = 0;
        for &leg in &legs {
            if distance >= Length::ZERO {
                break;
            }
            distance += leg;
            countdown += 1;
        }
        PlanMode::Discrete { distance, countdown }
    };

    Some(DescentPlan { constrained_index: nearest, target_altitude, mode, gradient, carry })
}

struct Resolved {
    altitude:   Position<f32>,
    /// Distance by which the last deceleration overshoots the constrained waypoint.
    overshoot:  Length<f32>,
    /// Altitude already lost in that deceleration when passing the waypoint.
    correction: Length<f32>,
    continuous: bool,
    geometric:  bool,
}

/// Walks the constrained waypoints backwards and resolves the altitude at the nearest one.
fn resolve_constraints(
    table: &DescentTable,
    route: &Route,
    restricted: &[usize],
    wind: &dyn WindField,
) -> Option<Resolved> {
    let mut resolved: Option<(usize, Resolved)> = None;

    for &index in restricted.iter().rev() {
        let waypoint = route.get(index)?;
        let constraint = waypoint.altitude?;
        let fixed = Resolved {
            altitude:   constraint.altitude,
            overshoot:  Length::ZERO,
            correction: Length::ZERO,
            continuous: false,
            geometric:  waypoint.force_geometric,
        };

        let next = match resolved {
            Some((next_index, ref next)) if constraint.restriction != Restriction::At => {
                let points: Vec<LatLon> = route.positions(index, next_index).collect();
                let available = route.distance_between(index, next_index) - next.overshoot;
                let reach = Walker::new(table, &points, wind).reach(next.altitude, available);

                let feasible = match constraint.restriction {
                    Restriction::AtOrBelow => reach.altitude <= constraint.altitude,
                    Restriction::AtOrAbove => reach.altitude >= constraint.altitude,
                    Restriction::At => false,
                };
                if feasible {
                    Resolved {
                        altitude:   reach.altitude,
                        overshoot:  reach.overshoot,
                        correction: reach.correction,
                        continuous: true,
                        geometric:  waypoint.force_geometric,
                    }
                } else {
                    fixed
                }
            }
            _ => fixed,
        };
        resolved = Some((index, next));
    }

    resolved.map(|(_, resolved)| resolved)
}

/// Altitude reachable at a waypoint when climbing backwards along the nominal profile.
struct Reach {
    altitude:   Position<f32>,
    overshoot:  Length<f32>,
    correction: Length<f32>,
}

/// Integrates a descent table along a path, from the end of the path backwards.
struct Walker<'a> {
    table: &'a DescentTable,
    wind:  &'a dyn WindField,
    track: WindTrack,
}

impl<'a> Walker<'a> {
    fn new(table: &'a DescentTable, points: &[LatLon], wind: &'a dyn WindField) -> Self {
        Self { table, wind, track: WindTrack::new(points) }
    }

    fn gamma(&self, index: usize, distance: Length<f32>, altitude: Position<f32>) -> f32 {
        self.table.gamma(index, self.track.tailwind(self.wind, distance, altitude))
    }

    /// Cursor over the deceleration segments above `altitude`.
    fn decel_cursor(&self, altitude: Position<f32>) -> usize {
        self.table.decel_segments().partition_point(|segment| segment.altitude < altitude)
    }

    /// Applies the next deceleration segment if `altitude` has passed above it.
    fn cross_decel(
        &self,
        cursor: &mut usize,
        altitude: Position<f32>,
        distance: Length<f32>,
    ) -> Option<DecelCorrection> {
        let segment = *self.table.decel_segments().get(*cursor)?;
        if altitude <= segment.altitude || !self.table.decel_applies(&segment) {
            return None;
        }

        *cursor += 1;
        let tailwind = self.track.tailwind(self.wind, distance, segment.altitude);
        Some(self.table.decel_segment(segment.altitude, segment.slow, segment.fast, tailwind))
    }

    /// Highest altitude from which `target` is reached after descending over `available`.
    fn reach(&self, target: Position<f32>, available: Length<f32>) -> Reach {
        let top = self.table.top();
        let mut cursor = self.decel_cursor(target);
        let mut altitude = target.max(Position::SEA_LEVEL);
        let mut index = segment_index(altitude);
        let mut distance = Length::ZERO;

        while altitude < top && index < self.table.segments().len() {
            let gamma = self.gamma(index, distance, altitude);
            let next = segment_bottom(index + 1).min(top);
            let step = (next - altitude) / gamma;
            if distance + step >= available {
                let altitude = altitude + (available - distance).max(Length::ZERO) * gamma;
                return Reach { altitude, overshoot: Length::ZERO, correction: Length::ZERO };
            }

            distance += step;
            altitude = next;
            index += 1;

            let before = distance;
            if let Some(decel) = self.cross_decel(&mut cursor, altitude, distance) {
                distance += decel.extra_distance;
                if distance > available {
                    let flown = (available - before) / (distance - before);
                    return Reach {
                        altitude,
                        overshoot: distance - available,
                        correction: decel.altitude_change.abs() * (1.0 - flown),
                    };
                }
            }
        }

        Reach { altitude: top, overshoot: Length::ZERO, correction: Length::ZERO }
    }

    /// Distance required to descend from `from` to `target`.
    ///
    /// If the constrained waypoint has a speed constraint slower than the profile speed,
    /// the deceleration towards it is included.
    fn distance(
        &self,
        target: Position<f32>,
        from: Position<f32>,
        waypoint_speed: Option<SpeedTarget>,
    ) -> Length<f32> {
        let mut distance = Length::ZERO;

        if let Some(speed) = waypoint_speed
            && let Some(segment) = self.table.segment_at(target)
            && segment.speed.cas_at(target) > speed.cas_at(target)
        {
            let tailwind = self.track.tailwind(self.wind, Length::ZERO, target);
            let decel = self.table.decel_segment(target, speed, segment.speed, tailwind);
            distance += decel.extra_distance;
        }

        let mut cursor = self.decel_cursor(target);
        let mut altitude = target.max(Position::SEA_LEVEL);
        let mut index = segment_index(altitude);

        while altitude < from && index < self.table.segments().len() {
            let gamma = self.gamma(index, distance, altitude);
            let next = segment_bottom(index + 1).min(from);
            distance += (next - altitude) / gamma;
            altitude = next;
            index += 1;

            if let Some(decel) = self.cross_decel(&mut cursor, altitude, distance) {
                distance += decel.extra_distance;
            }
        }

        distance
    }
}

/// Wind sampling points of a path, indexed by the distance from the end of the path.
struct WindTrack {
    /// Steps in reverse order of travel,
    /// each with its distance from the end of the path to its far edge.
    steps: Vec<(Length<f32>, PathStep)>,
}

impl WindTrack {
    fn new(points: &[LatLon]) -> Self {
        let mut from_end = Length::ZERO;
        let steps = geo::sample_path(points, WIND_SAMPLE_STEP)
            .into_iter()
            .rev()
            .map(|step| {
                from_end += step.length;
                (from_end, step)
            })
            .collect();
        Self { steps }
    }

    /// Tailwind at `from_end` before the end of the path.
    ///
    /// Beyond the start of the path the first step applies.
    fn tailwind(
        &self,
        wind: &dyn WindField,
        from_end: Length<f32>,
        altitude: Position<f32>,
    ) -> Speed<f32> {
        let index = self.steps.partition_point(|&(edge, _)| edge < from_end);
        match self.steps.get(index).or_else(|| self.steps.last()) {
            Some((_, step)) => wind::tailwind(wind.at(step.position, altitude), step.heading),
            None => Speed::ZERO,
        }
    }
}
