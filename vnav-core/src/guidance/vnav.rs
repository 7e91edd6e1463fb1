//! Vertical navigation towards the next altitude constraint.
//!
//! Climbs commit as soon as a higher constraint is activated.
//! Descents are deferred to the top of descent computed by the [planner](crate::descent).

use std::time::Duration;

use bevy::log::debug;
use math::{Length, LengthUnit, Position, Speed, SpeedUnit, format_with_unit};

use super::{FmsState, VerticalTrigger, VnavRate};
use crate::aircraft::{Kinematics, Modes};
use crate::descent::{self, PlanInput, PlanMode};
use crate::perf::Performance;
use crate::route::Route;
use crate::wind::WindField;

#[cfg(test)]
mod tests;

/// Altitude differences within this margin need no vertical action.
const LEVEL_MARGIN: Length<f32> = Length::from_feet(10.0);

const MIN_TIME_DISTANCE: Length<f32> = Length::from_meters(0.1);

const MIN_GROUND_SPEED: Speed<f32> = Speed::from_meter_per_sec(0.01);

pub(super) struct Input<'a> {
    pub perf:           &'a Performance,
    pub route:          &'a Route,
    pub wind:           &'a dyn WindField,
    pub kinematics:     &'a Kinematics,
    /// The aircraft is in takeoff mode.
    pub takeoff:        bool,
    /// Calibrated airspeed replacing the speed schedule in descent planning.
    pub speed_override: Option<Speed<f32>>,
    pub std_steepness:  f32,
}

/// Computes the vertical profile for the active leg.
pub(super) fn compute(input: &Input, modes: &mut Modes, fms: &mut FmsState) {
    let constraint = input
        .route
        .active_index()
        .and_then(|active| Some((active, input.route.next_altitude_constraint(active)?)));
    let Some((active, (index, constraint))) = constraint.filter(|_| modes.vnav) else {
        fms.trigger = VerticalTrigger::Never;
        return;
    };

    let kinematics = input.kinematics;
    let target = constraint.altitude;

    if kinematics.altitude > target + LEVEL_MARGIN && !input.takeoff {
        if fms.constraint_passed || fms.needs_replan {
            replan(input, fms);
            fms.constraint_passed = false;
            fms.needs_replan = false;
        }
        modes.descending = true;
    } else if kinematics.altitude < target - LEVEL_MARGIN {
        modes.descending = false;
        fms.target_altitude = Some(target);
        fms.constrained_index = Some(index);
        fms.trigger = VerticalTrigger::Now;
        fms.countdown = 0;
        fms.mode = PlanMode::Idle;
        fms.vnav_rate = VnavRate::Fixed(climb_rate(input, active, index, target));
    } else {
        fms.trigger = VerticalTrigger::Never;
    }
}

/// Vertical rate that reaches `target` at the constrained waypoint `index`,
/// but no slower than the standard climb gradient.
fn climb_rate(input: &Input, active: usize, index: usize, target: Position<f32>) -> Speed<f32> {
    let kinematics = input.kinematics;
    let to_active = input
        .route
        .get(active)
        .map_or(Length::ZERO, |waypoint| kinematics.position.distance(waypoint.position));
    let distance = (to_active + input.route.distance_between(active, index)).max(MIN_TIME_DISTANCE);
    let ground_speed = kinematics.ground_speed.max(MIN_GROUND_SPEED);
    let time_to_go = distance.try_div(ground_speed).unwrap_or(Duration::MAX);

    let standard = kinematics.ground_speed * input.std_steepness;
    let direct = (target - kinematics.altitude) / time_to_go;
    standard.max(direct)
}

fn replan(input: &Input, fms: &mut FmsState) {
    let kinematics = input.kinematics;
    let plan = descent::plan(&PlanInput {
        perf:           input.perf,
        route:          input.route,
        wind:           input.wind,
        position:       kinematics.position,
        altitude:       kinematics.altitude,
        true_airspeed:  kinematics.true_airspeed,
        speed_override: input.speed_override,
        carry:          fms.carry,
    });

    let Some(plan) = plan else {
        fms.mode = PlanMode::Idle;
        fms.trigger = VerticalTrigger::Never;
        fms.target_altitude = None;
        fms.constrained_index = None;
        return;
    };

    debug!(
        "Planned descent to {} at {}: {:?}",
        format_with_unit(LengthUnit::Feet, plan.target_altitude.amsl()),
        format_with_unit(SpeedUnit::Knots, kinematics.ground_speed),
        plan.mode
    );

    fms.mode = plan.mode;
    fms.target_altitude = Some(plan.target_altitude);
    fms.constrained_index = Some(plan.constrained_index);
    fms.pending_carry = plan.carry;
    fms.countdown = 0;

    let (trigger, gradient) = match plan.mode {
        PlanMode::Idle => (VerticalTrigger::Never, plan.gradient),
        PlanMode::Discrete { distance, countdown } => {
            fms.countdown = countdown;
            (VerticalTrigger::Within(distance), plan.gradient)
        }
        PlanMode::Geometric { steepness } => (VerticalTrigger::Now, steepness),
        PlanMode::Continuous => (VerticalTrigger::Now, plan.gradient),
    };
    fms.trigger = trigger;
    fms.vnav_rate = VnavRate::Gradient(-gradient);
}
