use math::{Position, Speed};

use super::{STEP_ALTITUDES, schedule};
use crate::perf::Performance;
use crate::perf::testing::{jet, piston};
use crate::speed::SpeedTarget;

fn assert_cas(perf: &Performance, feet: f32, knots: f32) {
    let SpeedTarget::Cas(cas) = schedule(perf, Position::from_amsl_feet(feet)) else {
        panic!("expected CAS at {feet} ft");
    };
    cas.assert_near(Speed::from_knots(knots), Speed::from_knots(0.01))
        .unwrap_or_else(|err| panic!("schedule at {feet} ft: {err:?}"));
}

#[test]
fn jet_bands() {
    let perf = jet();
    // landing minimum speed is 1.3 * 105 kt
    assert_cas(&perf, 500.0, 141.5);
    assert_cas(&perf, 1200.0, 146.5);
    assert_cas(&perf, 1800.0, 156.5);
    assert_cas(&perf, 2500.0, 186.5);
    assert_cas(&perf, 5000.0, 220.0);
    assert_cas(&perf, 8000.0, 250.0);
    assert_cas(&perf, 20000.0, 280.0);
    assert_eq!(schedule(&perf, Position::from_amsl_feet(30000.0)), SpeedTarget::Mach(0.78));
}

#[test]
fn jet_bands_scale_with_mass() {
    let mut perf = jet();
    perf.mass = 64000.0 * 1.21;
    assert_cas(&perf, 500.0, 136.5 * 1.1 + 5.0);
    assert_cas(&perf, 5000.0, 220.0);
}

#[test]
fn jet_monotonic_below_mach_transition() {
    let perf = jet();
    let mut previous = Speed::ZERO;
    for hundreds in 0..=260 {
        #[expect(clippy::cast_precision_loss)] // small integers
        let altitude = Position::from_amsl_feet(hundreds as f32 * 100.0);
        let cas = schedule(&perf, altitude).cas_at(altitude);
        assert!(cas >= previous, "schedule drops to {cas:?} at {altitude:?}");
        previous = cas;
    }
}

#[test]
fn jet_steps_at_step_altitudes() {
    let perf = jet();
    for step in STEP_ALTITUDES {
        let below = schedule(&perf, step);
        let above = schedule(&perf, step + math::Length::from_feet(1.0));
        assert_ne!(below, above, "no speed change across {step:?}");
    }
}

#[test]
fn piston_bands() {
    let perf = piston();
    assert_cas(&perf, 1000.0, 48.0 * 1.3);
    assert_cas(&perf, 5000.0, 120.0);
    assert_cas(&perf, 11000.0, 130.0);
    assert_eq!(schedule(&perf, Position::from_amsl_feet(15000.0)), SpeedTarget::Mach(0.25));
}
