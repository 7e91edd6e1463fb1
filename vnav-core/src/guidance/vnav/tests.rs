use math::geo::LatLon;
use math::{Heading, Length, Position, Speed, isa};

use super::{Input, compute};
use crate::aircraft::{Kinematics, Modes};
use crate::descent::PlanMode;
use crate::guidance::{FmsState, VerticalTrigger, VnavRate};
use crate::perf::Performance;
use crate::perf::testing::jet;
use crate::route::{Restriction, Route, Waypoint};
use crate::wind::Calm;

const ORIGIN: LatLon = LatLon::new(0.0, 0.0);
const STEEPNESS: f32 = 0.0494;

fn north(nm: f32) -> LatLon { ORIGIN.destination(Heading::NORTH, Length::from_nm(nm)) }

fn kinematics(altitude_ft: f32, ground_speed: Speed<f32>) -> Kinematics {
    let altitude = Position::from_amsl_feet(altitude_ft);
    Kinematics {
        position: ORIGIN,
        altitude,
        track: Heading::NORTH,
        true_airspeed: ground_speed,
        ground_speed,
        cas: isa(altitude).tas_to_cas(ground_speed),
        vert_rate: Speed::ZERO,
    }
}

fn constrained(nm: f32, altitude_ft: f32, restriction: Restriction) -> Route {
    Route::new(vec![
        Waypoint::new("CNSTR", north(nm))
            .with_altitude(Position::from_amsl_feet(altitude_ft), restriction),
    ])
}

fn managed() -> Modes { Modes { lnav: true, vnav: true, vnav_speed: true, descending: false } }

fn run(perf: &Performance, route: &Route, kinematics: &Kinematics, modes: &mut Modes) -> FmsState {
    let mut fms = FmsState::new();
    run_with(perf, route, kinematics, modes, &mut fms);
    fms
}

fn run_with(
    perf: &Performance,
    route: &Route,
    kinematics: &Kinematics,
    modes: &mut Modes,
    fms: &mut FmsState,
) {
    let input = Input {
        perf,
        route,
        wind: &Calm,
        kinematics,
        takeoff: false,
        speed_override: None,
        std_steepness: STEEPNESS,
    };
    compute(&input, modes, fms);
}

#[test]
fn climb_commits_immediately() {
    let perf = jet();
    let route = constrained(30.0, 15000.0, Restriction::AtOrAbove);
    let kinematics = kinematics(5000.0, Speed::from_knots(250.0));
    let mut modes = managed();

    let fms = run(&perf, &route, &kinematics, &mut modes);

    assert!(!modes.descending);
    assert_eq!(fms.trigger, VerticalTrigger::Now);
    assert_eq!(fms.target_altitude, Some(Position::from_amsl_feet(15000.0)));
    let VnavRate::Fixed(rate) = fms.vnav_rate else {
        panic!("expected fixed climb rate, got {:?}", fms.vnav_rate);
    };
    // 10000 ft over 30 nm at 250 kt
    rate.assert_near(Speed::from_fpm(1388.9), Speed::from_fpm(2.0))
        .expect("reach the constraint at the waypoint");
}

#[test]
fn climb_no_slower_than_standard_gradient() {
    let perf = jet();
    let route = constrained(30.0, 6000.0, Restriction::AtOrAbove);
    let ground_speed = Speed::from_knots(250.0);
    let kinematics = kinematics(5000.0, ground_speed);
    let mut modes = managed();

    let fms = run(&perf, &route, &kinematics, &mut modes);
    assert_eq!(fms.vnav_rate, VnavRate::Fixed(ground_speed * STEEPNESS));
}

#[test]
fn descent_waits_for_top_of_descent() {
    let perf = jet();
    let route = constrained(80.0, 10000.0, Restriction::AtOrBelow);
    let kinematics = kinematics(35000.0, Speed::from_meter_per_sec(250.0));
    let mut modes = managed();

    let fms = run(&perf, &route, &kinematics, &mut modes);

    assert!(modes.descending);
    assert!(!fms.needs_replan);
    let PlanMode::Discrete { distance, countdown } = fms.mode else {
        panic!("expected discrete descent, got {:?}", fms.mode);
    };
    assert_eq!(countdown, 0);
    assert_eq!(fms.trigger, VerticalTrigger::Within(distance));
    assert!(!fms.trigger.fires(Length::from_nm(80.0)));
    assert!(fms.trigger.fires(Length::ZERO));

    let VnavRate::Gradient(gradient) = fms.vnav_rate else {
        panic!("expected gradient, got {:?}", fms.vnav_rate);
    };
    assert!(gradient < 0.0);
}

#[test]
fn descent_plan_kept_between_constraints() {
    let perf = jet();
    let route = constrained(80.0, 10000.0, Restriction::AtOrBelow);
    let kinematics = kinematics(35000.0, Speed::from_meter_per_sec(250.0));
    let mut modes = managed();
    let mut fms = run(&perf, &route, &kinematics, &mut modes);

    fms.mode = PlanMode::Idle;
    run_with(&perf, &route, &kinematics, &mut modes, &mut fms);
    assert_eq!(fms.mode, PlanMode::Idle, "no replan without passing a constraint");

    fms.constraint_passed = true;
    run_with(&perf, &route, &kinematics, &mut modes, &mut fms);
    assert!(matches!(fms.mode, PlanMode::Discrete { .. }), "{:?}", fms.mode);
    assert!(!fms.constraint_passed);
}

#[test]
fn geometric_descent_engages_now() {
    let perf = jet();
    let route = constrained(5.0, 10000.0, Restriction::AtOrBelow);
    let kinematics = kinematics(35000.0, Speed::from_meter_per_sec(250.0));
    let mut modes = managed();

    let fms = run(&perf, &route, &kinematics, &mut modes);

    let PlanMode::Geometric { steepness } = fms.mode else {
        panic!("expected geometric descent, got {:?}", fms.mode);
    };
    assert_eq!(fms.trigger, VerticalTrigger::Now);
    assert_eq!(fms.vnav_rate, VnavRate::Gradient(-steepness));
}

#[test]
fn no_action_when_level_or_unmanaged() {
    let perf = jet();
    let route = constrained(30.0, 10000.0, Restriction::At);

    let mut modes = managed();
    let fms = run(&perf, &route, &kinematics(10005.0, Speed::from_knots(250.0)), &mut modes);
    assert_eq!(fms.trigger, VerticalTrigger::Never);

    let mut modes = Modes { vnav: false, ..managed() };
    let fms = run(&perf, &route, &kinematics(5000.0, Speed::from_knots(250.0)), &mut modes);
    assert_eq!(fms.trigger, VerticalTrigger::Never);

    let mut modes = managed();
    let unconstrained = Route::new(vec![Waypoint::new("FREE", north(30.0))]);
    let fms = run(&perf, &unconstrained, &kinematics(5000.0, Speed::from_knots(250.0)), &mut modes);
    assert_eq!(fms.trigger, VerticalTrigger::Never);
}
