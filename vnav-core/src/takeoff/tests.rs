use std::sync::Arc;

use math::{Position, Speed};

use super::{TableError, Takeoff, TakeoffProfile, TakeoffRow, TakeoffTable};

fn row(flight_level: f32, ias_kt: f32, roc_fpm: f32) -> TakeoffRow {
    TakeoffRow { flight_level, ias_kt, roc_fpm }
}

fn table() -> TakeoffTable {
    TakeoffTable::try_from(vec![row(0.0, 150.0, 2500.0), row(50.0, 250.0, 2000.0)])
        .expect("valid table")
}

#[test]
fn interpolates_between_rows() {
    let (ias, roc) = table().ias_roc(Position::from_amsl_feet(2500.0));
    ias.assert_near(Speed::from_knots(200.0), Speed::from_knots(0.01)).expect("halfway ias");
    roc.assert_near(Speed::from_fpm(2250.0), Speed::from_fpm(0.1)).expect("halfway roc");
}

#[test]
fn holds_outside_rows() {
    let table = TakeoffTable::try_from(vec![row(10.0, 160.0, 2500.0), row(50.0, 250.0, 2000.0)])
        .expect("valid table");

    let (ias, roc) = table.ias_roc(Position::SEA_LEVEL);
    ias.assert_near(Speed::from_knots(160.0), Speed::from_knots(0.01)).expect("first row ias");
    roc.assert_near(Speed::from_fpm(2500.0), Speed::from_fpm(0.1)).expect("first row roc");

    let (ias, roc) = table.ias_roc(Position::from_amsl_feet(8000.0));
    ias.assert_near(Speed::from_knots(250.0), Speed::from_knots(0.01)).expect("last row ias");
    assert_eq!(roc, Speed::ZERO);
}

#[test]
fn rejects_invalid_rows() {
    assert_eq!(TakeoffTable::try_from(Vec::new()), Err(TableError::Empty));
    assert_eq!(
        TakeoffTable::try_from(vec![row(0.0, f32::NAN, 0.0)]),
        Err(TableError::NonFinite(0))
    );
    assert_eq!(
        TakeoffTable::try_from(vec![row(10.0, 150.0, 0.0), row(10.0, 160.0, 0.0)]),
        Err(TableError::Unordered(1))
    );
}

#[test]
fn deserialize_validates() {
    let table: TakeoffTable = serde_json::from_str(
        r#"[{"flight_level": 0, "ias_kt": 150, "roc_fpm": 2500},
            {"flight_level": 50, "ias_kt": 250, "roc_fpm": 2000}]"#,
    )
    .expect("valid table");
    assert_eq!(table, self::table());

    let unordered = serde_json::from_str::<TakeoffTable>(
        r#"[{"flight_level": 50, "ias_kt": 150, "roc_fpm": 2500},
            {"flight_level": 0, "ias_kt": 250, "roc_fpm": 2000}]"#,
    );
    assert!(unordered.is_err());
}

#[test]
fn speed_capped_by_constraint() {
    let takeoff = Takeoff { profile: Arc::new(table()), min_speed: Speed::from_knots(140.0) };
    let altitude = Position::from_amsl_feet(5000.0);

    assert_eq!(takeoff.speed(altitude, None), Speed::from_knots(250.0));
    assert_eq!(takeoff.speed(altitude, Some(Speed::from_knots(210.0))), Speed::from_knots(210.0));
}

#[test]
fn vert_rate_on_ground_and_airborne() {
    let takeoff = Takeoff { profile: Arc::new(table()), min_speed: Speed::from_knots(140.0) };

    assert_eq!(
        takeoff.vert_rate(Position::SEA_LEVEL, Speed::from_knots(60.0), false),
        Some(Speed::ZERO)
    );

    let rotating = takeoff
        .vert_rate(Position::SEA_LEVEL, Speed::from_knots(138.0), false)
        .expect("not holding altitude");
    rotating.assert_near(Speed::from_fpm(2500.0), Speed::from_fpm(0.1)).expect("first row roc");

    assert_eq!(
        takeoff.vert_rate(Position::from_amsl_feet(3000.0), Speed::from_knots(200.0), true),
        None
    );
}
