use std::sync::Arc;

use super::{
    BadaCoefficients, BadaModel, DescentThrust, DragPolar, EngineType, MaxClimbThrust,
    Performance, StallSpeeds,
};

/// A twin jet roughly the size of an A320.
pub(crate) fn jet_coefficients() -> BadaCoefficients {
    BadaCoefficients {
        engine:              EngineType::Jet,
        reference_mass:      64000.0,
        max_mass:            77000.0,
        max_mach:            0.82,
        max_altitude_ft:     39800.0,
        wing_area:           122.6,
        stall_speeds_kt:     StallSpeeds {
            takeoff:       110.0,
            initial_climb: 115.0,
            cruise:        140.0,
            approach:      110.0,
            landing:       105.0,
        },
        cruise:              DragPolar { cd0: 0.03, cd2: 0.04 },
        approach:            DragPolar { cd0: 0.035, cd2: 0.045 },
        landing:             DragPolar { cd0: 0.08, cd2: 0.05 },
        gear_drag:           0.02,
        max_climb_thrust:    MaxClimbThrust { c1: 1.4e5, c2: 5e4, c3: 1e-10 },
        descent_thrust:      DescentThrust {
            high:                   0.02,
            low:                    0.02,
            approach:               0.03,
            landing:                0.05,
            transition_altitude_ft: 10000.0,
        },
        descent_cas_low_kt:  290.0,
        descent_cas_high_kt: 290.0,
        descent_mach:        0.78,
        max_accel:           2.0 * math::METERS_PER_FOOT,
    }
}

/// A light single-engine piston aircraft.
pub(crate) fn piston_coefficients() -> BadaCoefficients {
    BadaCoefficients {
        engine:              EngineType::Piston,
        reference_mass:      1100.0,
        max_mass:            1200.0,
        max_mach:            0.3,
        max_altitude_ft:     18000.0,
        wing_area:           16.2,
        stall_speeds_kt:     StallSpeeds {
            takeoff:       50.0,
            initial_climb: 55.0,
            cruise:        60.0,
            approach:      50.0,
            landing:       48.0,
        },
        cruise:              DragPolar { cd0: 0.025, cd2: 0.05 },
        approach:            DragPolar::default(),
        landing:             DragPolar { cd0: 0.05, cd2: 0.06 },
        gear_drag:           0.0,
        max_climb_thrust:    MaxClimbThrust { c1: 5000.0, c2: 3e4, c3: 1e5 },
        descent_thrust:      DescentThrust {
            high:                   0.05,
            low:                    0.05,
            approach:               0.1,
            landing:                0.1,
            transition_altitude_ft: 12000.0,
        },
        descent_cas_low_kt:  120.0,
        descent_cas_high_kt: 130.0,
        descent_mach:        0.25,
        max_accel:           2.0 * math::METERS_PER_FOOT,
    }
}

fn performance(coefficients: BadaCoefficients, mass: f32) -> Performance {
    let model = BadaModel::try_from(coefficients).expect("fixture coefficients are valid");
    Performance { model: Arc::new(model), mass }
}

pub(crate) fn jet() -> Performance { performance(jet_coefficients(), 64000.0) }

pub(crate) fn piston() -> Performance { performance(piston_coefficients(), 1100.0) }
