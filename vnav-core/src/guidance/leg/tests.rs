use std::time::Duration;

use math::{Accel, Angle, Heading, Length, Position, Speed, isa};

use super::{Approach, accel_distance, anticipation, bank_for_radius, turn_distance, turn_radius};
use crate::route::TurnMode;

const BANK: Angle = Angle::from_degrees(25.0);
const MARGIN: Duration = Duration::from_secs(4);

#[test]
fn straight_leg_has_no_anticipation() {
    let radius = turn_radius(Speed::from_knots(250.0), BANK);
    assert_eq!(anticipation(radius, Heading::NORTH, Heading::NORTH), Length::ZERO);
}

#[test]
fn right_angle_anticipates_one_radius() {
    let radius = turn_radius(Speed::from_meter_per_sec(100.0), BANK);
    radius
        .assert_near(Length::from_meters(2186.8), Length::from_meters(1.0))
        .expect("v^2 / (g tan 25deg)");
    anticipation(radius, Heading::NORTH, Heading::EAST)
        .assert_near(radius, Length::from_meters(0.1))
        .expect("tan 45deg = 1");
}

#[test]
fn reduced_turn_speed_scales_distance() {
    let altitude = Position::from_amsl_feet(10000.0);
    let tas = Speed::from_meter_per_sec(250.0);
    let turn = TurnMode::FlyTurn {
        radius: Some(Length::from_nm(3.0)),
        speed:  Some(Speed::from_knots(180.0)),
    };

    let nominal = anticipation(turn_radius(tas, BANK), Heading::NORTH, Heading::EAST);
    let ratio = isa(altitude).cas_to_tas(Speed::from_knots(180.0)) / tas;
    turn_distance(tas, BANK, Heading::NORTH, Heading::EAST, turn, altitude)
        .assert_near(nominal * (ratio * ratio), Length::from_meters(1.0))
        .expect("scaled by (turn TAS / TAS)^2");
}

#[test]
fn specified_radius_without_speed() {
    let turn = TurnMode::FlyTurn { radius: Some(Length::from_nm(3.0)), speed: None };
    let distance = turn_distance(
        Speed::from_knots(250.0),
        BANK,
        Heading::NORTH,
        Heading::EAST,
        turn,
        Position::from_amsl_feet(5000.0),
    );
    distance.assert_near(Length::from_nm(3.0), Length::from_meters(1.0)).expect("radius replaced");
}

#[test]
fn non_positive_radius_is_ignored() {
    let tas = Speed::from_knots(250.0);
    let altitude = Position::from_amsl_feet(5000.0);
    let turn = TurnMode::FlyTurn { radius: Some(Length::from_nm(-1.0)), speed: None };
    assert_eq!(
        turn_distance(tas, BANK, Heading::NORTH, Heading::EAST, turn, altitude),
        turn_distance(tas, BANK, Heading::NORTH, Heading::EAST, TurnMode::FlyBy, altitude),
    );
}

#[test]
fn bank_for_specified_radius() {
    bank_for_radius(Speed::from_knots(180.0), Length::from_nm(3.0))
        .assert_near(Angle::from_degrees(8.94), Angle::from_degrees(0.05))
        .expect("atan(v^2 / (R g))");
}

#[test]
fn accel_distance_is_symmetric() {
    let accel = Accel::from_meters_per_sec2(0.5);
    let slow = Speed::from_meter_per_sec(100.0);
    let fast = Speed::from_meter_per_sec(200.0);

    let decel = accel_distance(fast, slow, accel);
    decel.assert_near(Length::from_meters(30000.0), Length::from_meters(1.0)).expect("dv^2 / 2a");
    assert_eq!(decel, accel_distance(slow, fast, -accel));
    assert!(accel_distance(slow, fast, Accel::ZERO).into_meters().is_finite());
}

fn approach(distance_nm: f32, bearing: Heading, turn_nm: f32, fly_over: bool) -> Approach {
    Approach {
        distance: Length::from_nm(distance_nm),
        bearing,
        track: Heading::NORTH,
        ground_speed: Speed::from_knots(250.0),
        turn_distance: Length::from_nm(turn_nm),
        fly_over,
    }
}

#[test]
fn fly_by_within_turn_distance() {
    assert!(approach(1.0, Heading::NORTH, 1.5, false).is_reached(MARGIN));
    assert!(!approach(2.0, Heading::NORTH, 1.5, false).is_reached(MARGIN));
}

#[test]
fn fly_over_within_margin() {
    // 250 kt for 4 s is 0.28 nm
    assert!(!approach(0.3, Heading::NORTH, 1.5, true).is_reached(MARGIN));
    assert!(approach(0.2, Heading::NORTH, 1.5, true).is_reached(MARGIN));
}

#[test]
fn waypoint_behind() {
    assert!(approach(0.2, Heading::SOUTH, 0.0, false).is_reached(MARGIN));
    assert!(!approach(0.5, Heading::SOUTH, 0.0, false).is_reached(MARGIN));
    assert!(!approach(5.0, Heading::SOUTH, 1.0, false).is_reached(MARGIN));
}
