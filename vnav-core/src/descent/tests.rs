use math::geo::LatLon;
use math::{Heading, Length, Position, Speed, isa};

use super::{DescentCarry, DescentPlan, DescentTable, PlanInput, PlanMode, plan};
use crate::perf::testing::jet;
use crate::route::{Restriction, Route, Waypoint};
use crate::speed::SpeedTarget;
use crate::wind::Calm;

const ORIGIN: LatLon = LatLon::new(0.0, 0.0);

fn north(nm: f32) -> LatLon { ORIGIN.destination(Heading::NORTH, Length::from_nm(nm)) }

fn cruise_altitude() -> Position<f32> { Position::from_amsl_feet(35000.0) }

fn cruise_tas() -> Speed<f32> { Speed::from_meter_per_sec(250.0) }

fn plan_route(route: &Route, carry: DescentCarry) -> Option<DescentPlan> {
    let perf = jet();
    plan(&PlanInput {
        perf: &perf,
        route,
        wind: &Calm,
        position: ORIGIN,
        altitude: cruise_altitude(),
        true_airspeed: cruise_tas(),
        speed_override: None,
        carry,
    })
}

fn single_constraint(nm: f32) -> Route {
    Route::new(vec![
        Waypoint::new("BOTTM", north(nm))
            .with_altitude(Position::from_amsl_feet(10000.0), Restriction::AtOrBelow),
    ])
}

#[test]
fn table_length() {
    let perf = jet();
    let table = DescentTable::build(&perf, cruise_altitude(), cruise_tas(), None);
    assert_eq!(table.segments().len(), 351);

    let table = DescentTable::build(
        &perf,
        Position::from_amsl_feet(12345.0),
        Speed::from_knots(300.0),
        None,
    );
    assert_eq!(table.segments().len(), 125);
}

#[test]
fn table_tas_matches_cas() {
    let perf = jet();
    let table = DescentTable::build(&perf, cruise_altitude(), cruise_tas(), None);

    for segment in table.segments() {
        let atmosphere = isa(segment.altitude);
        segment
            .tas
            .assert_near(atmosphere.cas_to_tas(segment.cas), Speed::from_knots(0.5))
            .unwrap_or_else(|err| panic!("segment at {:?}: {err:?}", segment.altitude));
        assert!(segment.vert_rate.is_negative(), "no descent at {:?}", segment.altitude);
        assert!(segment.gamma > 0.0);
    }
}

#[test]
fn table_follows_override() {
    let perf = jet();
    let table = DescentTable::build(
        &perf,
        Position::from_amsl_feet(15000.0),
        Speed::from_knots(300.0),
        Some(Speed::from_knots(230.0)),
    );

    assert!(table.decel_segments().is_empty());
    for segment in table.segments() {
        assert_eq!(segment.speed, SpeedTarget::Cas(Speed::from_knots(230.0)));
    }
}

#[test]
fn decel_segments_from_cruise() {
    let perf = jet();
    let table = DescentTable::build(&perf, cruise_altitude(), cruise_tas(), None);

    let altitudes: Vec<f32> = table
        .decel_segments()
        .iter()
        .map(|segment| segment.altitude.amsl().into_feet().round())
        .collect();
    assert_eq!(altitudes, [999.0, 1499.0, 1999.0, 2999.0, 5999.0, 9999.0, 26000.0]);

    let top = table.decel_segments().last().expect("segment at mach transition");
    assert!(top.fast.is_mach());
    assert!(table.decel_applies(top));
}

#[test]
fn decel_segments_when_slow() {
    let perf = jet();
    // 240 kt at 8000 ft is slower than the 250 kt band above 6000 ft
    let altitude = Position::from_amsl_feet(8000.0);
    let tas = isa(altitude).cas_to_tas(Speed::from_knots(240.0));
    let table = DescentTable::build(&perf, altitude, tas, None);

    let step = table
        .decel_segments()
        .iter()
        .find(|segment| (segment.altitude.amsl().into_feet() - 5999.0).abs() < 1.0)
        .expect("segment at 5999 ft");
    let SpeedTarget::Cas(fast) = step.fast else { panic!("expected CAS, got {:?}", step.fast) };
    fast.assert_near(Speed::from_knots(240.0), Speed::from_knots(0.5))
        .expect("deceleration starts from the current airspeed");
}

#[test]
fn decel_segment_adds_distance() {
    let perf = jet();
    let table = DescentTable::build(&perf, cruise_altitude(), cruise_tas(), None);
    let correction = table.decel_segment(
        Position::from_amsl_feet(9999.0),
        SpeedTarget::Cas(Speed::from_knots(250.0)),
        SpeedTarget::Cas(Speed::from_knots(280.0)),
        Speed::ZERO,
    );

    assert!(correction.altitude_change.is_negative());
    assert!(correction.extra_distance.is_positive(), "{correction:?}");
}

#[test]
fn scenario_discrete_top_of_descent() {
    let route = single_constraint(80.0);
    let plan = plan_route(&route, DescentCarry::default()).expect("constraint ahead");

    assert_eq!(plan.constrained_index, 0);
    plan.target_altitude
        .assert_near(Position::from_amsl_feet(10000.0), Length::from_feet(1.0))
        .expect("descend to the constraint");

    let PlanMode::Discrete { distance, countdown } = plan.mode else {
        panic!("expected discrete descent, got {:?}", plan.mode);
    };
    assert_eq!(countdown, 0);
    assert!(distance.is_positive(), "{distance:?}");
    assert!(distance < Length::from_nm(80.0), "{distance:?}");
    assert!(plan.gradient > 0.0);
}

#[test]
fn scenario_geometric_when_too_close() {
    let route = single_constraint(5.0);
    let plan = plan_route(&route, DescentCarry::default()).expect("constraint ahead");

    let PlanMode::Geometric { steepness } = plan.mode else {
        panic!("expected geometric descent, got {:?}", plan.mode);
    };
    let standard = Length::from_feet(3000.0) / Length::from_nm(10.0);
    assert!(steepness > standard, "steepness {steepness} should exceed {standard}");
    assert!(steepness > plan.gradient);
}

#[test]
fn planner_is_idempotent() {
    let route = single_constraint(80.0);
    let first = plan_route(&route, DescentCarry::default());
    let second = plan_route(&route, DescentCarry::default());
    assert_eq!(first, second);
}

#[test]
fn countdown_over_intermediate_waypoints() {
    let direct = plan_route(&single_constraint(80.0), DescentCarry::default())
        .expect("constraint ahead");
    let PlanMode::Discrete { distance: direct_distance, .. } = direct.mode else {
        panic!("expected discrete descent, got {:?}", direct.mode);
    };

    let route = Route::new(vec![
        Waypoint::new("ALPHA", north(10.0)),
        Waypoint::new("BRAVO", north(20.0)),
        Waypoint::new("BOTTM", north(80.0))
            .with_altitude(Position::from_amsl_feet(10000.0), Restriction::AtOrBelow),
    ]);
    let plan = plan_route(&route, DescentCarry::default()).expect("constraint ahead");
    assert_eq!(plan.constrained_index, 2);

    let PlanMode::Discrete { distance, countdown } = plan.mode else {
        panic!("expected discrete descent, got {:?}", plan.mode);
    };
    assert_eq!(countdown, 2);
    distance
        .assert_near(direct_distance, Length::from_nm(0.05))
        .expect("same top of descent before the last leg");
}

#[test]
fn carry_forces_mode() {
    let route = single_constraint(80.0);

    let plan = plan_route(&route, DescentCarry { continuous: true, geometric: false })
        .expect("constraint ahead");
    assert_eq!(plan.mode, PlanMode::Continuous);

    let plan = plan_route(&route, DescentCarry { continuous: false, geometric: true })
        .expect("constraint ahead");
    assert!(matches!(plan.mode, PlanMode::Geometric { .. }), "{:?}", plan.mode);
}

#[test]
fn geometric_carry_yields_to_continuous_descent() {
    let route = Route::new(vec![
        Waypoint::new("UPPER", north(80.0))
            .with_altitude(Position::from_amsl_feet(30000.0), Restriction::AtOrBelow),
        Waypoint::new("LOWER", north(120.0))
            .with_altitude(Position::from_amsl_feet(10000.0), Restriction::At),
    ]);
    let fresh = plan_route(&route, DescentCarry::default()).expect("constraint ahead");
    assert!(fresh.carry.continuous, "{fresh:?}");
    assert!(matches!(fresh.mode, PlanMode::Discrete { .. }), "{:?}", fresh.mode);

    let carried = plan_route(&route, DescentCarry { continuous: false, geometric: true })
        .expect("constraint ahead");
    assert_eq!(carried.mode, fresh.mode);
}

#[test]
fn at_or_below_resolves_to_reachable_altitude() {
    let route = Route::new(vec![
        Waypoint::new("UPPER", north(20.0))
            .with_altitude(Position::from_amsl_feet(30000.0), Restriction::AtOrBelow),
        Waypoint::new("LOWER", north(40.0))
            .with_altitude(Position::from_amsl_feet(10000.0), Restriction::At),
    ]);
    let plan = plan_route(&route, DescentCarry::default()).expect("constraint ahead");

    assert_eq!(plan.constrained_index, 0);
    assert!(plan.target_altitude > Position::from_amsl_feet(15000.0), "{plan:?}");
    assert!(plan.target_altitude < Position::from_amsl_feet(25000.0), "{plan:?}");
    assert!(plan.carry.continuous);
}

#[test]
fn at_or_below_clamps_when_unreachable() {
    let route = Route::new(vec![
        Waypoint::new("UPPER", north(20.0))
            .with_altitude(Position::from_amsl_feet(15000.0), Restriction::AtOrBelow),
        Waypoint::new("LOWER", north(40.0))
            .with_altitude(Position::from_amsl_feet(10000.0), Restriction::At),
    ]);
    let plan = plan_route(&route, DescentCarry::default()).expect("constraint ahead");

    plan.target_altitude
        .assert_near(Position::from_amsl_feet(15000.0), Length::from_feet(1.0))
        .expect("clamped to the constraint");
    assert!(!plan.carry.continuous);
}

#[test]
fn forced_geometric_carries() {
    let mut route = single_constraint(80.0);
    route.set_force_geometric(0, true).expect("index in range");
    let plan = plan_route(&route, DescentCarry::default()).expect("constraint ahead");
    assert!(plan.carry.geometric);
}

#[test]
fn no_constraint_no_plan() {
    let route = Route::new(vec![Waypoint::new("ALPHA", north(10.0))]);
    assert!(plan_route(&route, DescentCarry::default()).is_none());
    assert!(plan_route(&Route::default(), DescentCarry::default()).is_none());
}
