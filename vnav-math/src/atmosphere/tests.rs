use crate::{
    ISA_SEA_LEVEL_PRESSURE, ISA_TROPOPAUSE_PRESSURE, ISA_TROPOPAUSE_TEMPERATURE, Position, Speed,
    TROPOPAUSE_ALTITUDE, isa,
};

#[test]
fn sea_level_is_standard() {
    let atmosphere = isa(Position::SEA_LEVEL);
    assert!((atmosphere.pressure - ISA_SEA_LEVEL_PRESSURE).abs() < 1.0);
    assert!((atmosphere.density - 1.225).abs() < 1e-3);

    atmosphere
        .cas_to_tas(Speed::from_knots(250.0))
        .assert_near(Speed::from_knots(250.0), Speed::from_knots(0.1))
        .expect("CAS equals TAS at sea level");
    atmosphere
        .speed_of_sound()
        .assert_near(Speed::from_knots(661.5), Speed::from_knots(0.5))
        .expect("sea level speed of sound");
}

#[test]
fn tropopause_is_continuous() {
    let below = isa(TROPOPAUSE_ALTITUDE);
    assert!((below.pressure - ISA_TROPOPAUSE_PRESSURE).abs() < 5.0);
    assert!((below.temperature - ISA_TROPOPAUSE_TEMPERATURE).abs() < 0.01);

    let above = isa(Position::from_amsl_meters(11001.0));
    assert!((above.pressure - below.pressure).abs() < 5.0);
    assert!((above.temperature - ISA_TROPOPAUSE_TEMPERATURE).abs() < f32::EPSILON);
}

#[test]
fn fl100_true_airspeed() {
    isa(Position::from_amsl_feet(10000.0))
        .cas_to_tas(Speed::from_knots(200.0))
        .assert_near(Speed::from_knots(231.6), Speed::from_knots(0.3))
        .expect("TAS at FL100");
}

#[test]
fn fl350_mach_conversion() {
    let atmosphere = isa(Position::from_amsl_feet(35000.0));
    atmosphere
        .mach_to_tas(0.78)
        .assert_near(Speed::from_knots(449.6), Speed::from_knots(0.5))
        .expect("TAS for M0.78");
    atmosphere
        .mach_to_cas(0.78)
        .assert_near(Speed::from_knots(264.4), Speed::from_knots(0.5))
        .expect("CAS for M0.78");
}

#[test]
fn conversion_preserves_sign() {
    let atmosphere = isa(Position::from_amsl_feet(18000.0));
    let tas = atmosphere.cas_to_tas(Speed::from_knots(-250.0));
    assert!(tas.is_negative());
    atmosphere
        .tas_to_cas(tas)
        .assert_near(Speed::from_knots(-250.0), Speed::from_knots(0.1))
        .expect("negative CAS converts back");
}
