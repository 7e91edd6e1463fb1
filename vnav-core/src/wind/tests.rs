use bevy::math::Vec2;
use math::geo::LatLon;
use math::{Heading, Position, Speed};

use super::{Calm, Layered, Uniform, Wind, WindField, tailwind};

const ORIGIN: LatLon = LatLon::new(0.0, 0.0);

#[test]
fn calm_is_zero() {
    assert_eq!(Calm.at(ORIGIN, Position::from_amsl_feet(10000.0)), Speed::ZERO);
}

#[test]
fn tailwind_projection() {
    let westerly = Speed::from_knots_vec2(20.0, 0.0);

    tailwind(westerly, Heading::EAST)
        .assert_near(Speed::from_knots(20.0), Speed::from_knots(0.01))
        .expect("full tailwind when tracking east");
    tailwind(westerly, Heading::WEST)
        .assert_near(Speed::from_knots(-20.0), Speed::from_knots(0.01))
        .expect("full headwind when tracking west");
    tailwind(westerly, Heading::NORTH)
        .assert_near(Speed::ZERO, Speed::from_knots(0.01))
        .expect("pure crosswind when tracking north");
}

#[test]
fn uniform_resource() {
    let wind = Wind(Box::new(Uniform(Speed::from_knots_vec2(0.0, 30.0))));
    wind.tailwind(ORIGIN, Position::from_amsl_feet(5000.0), Heading::SOUTH)
        .assert_near(Speed::from_knots(-30.0), Speed::from_knots(0.01))
        .expect("southerly wind is a headwind when tracking south");
}

#[test]
fn layered_interpolates_between_layers() {
    let layered = Layered::new(vec![
        (Position::from_amsl_feet(30000.0), Speed::from_knots_vec2(100.0, 0.0)),
        (Position::from_amsl_feet(10000.0), Speed::from_knots_vec2(20.0, 0.0)),
    ]);

    let mid = layered.at(ORIGIN, Position::from_amsl_feet(20000.0));
    mid.x()
        .assert_near(Speed::from_knots(60.0), Speed::from_knots(0.01))
        .expect("halfway between layers");
    mid.y().assert_near(Speed::ZERO, Speed::from_knots(0.01)).expect("no northward component");
}

#[test]
fn layered_holds_outside_layers() {
    let layered = Layered::new(vec![
        (Position::from_amsl_feet(10000.0), Speed::from_knots_vec2(20.0, 0.0)),
        (Position::from_amsl_feet(30000.0), Speed::from_knots_vec2(100.0, 0.0)),
    ]);

    layered
        .at(ORIGIN, Position::SEA_LEVEL)
        .x()
        .assert_near(Speed::from_knots(20.0), Speed::from_knots(0.01))
        .expect("lowest layer below the profile");
    layered
        .at(ORIGIN, Position::from_amsl_feet(40000.0))
        .x()
        .assert_near(Speed::from_knots(100.0), Speed::from_knots(0.01))
        .expect("highest layer above the profile");
}

#[test]
fn default_wind_is_calm() {
    let wind = Wind::default();
    assert_eq!(wind.0.at(ORIGIN, Position::SEA_LEVEL), Speed::<Vec2>::ZERO);
}
