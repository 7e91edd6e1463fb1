//! Speed solver for required times of arrival.

use std::time::Duration;

use math::{Accel, Atmosphere, Length, Speed};
use ordered_float::OrderedFloat;


/// Acceleration magnitudes are raised to at least this value.
const MIN_ACCEL: Accel<f32> = Accel::from_meters_per_sec2(0.01);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RtaError {
    #[error("the required time of arrival has already passed")]
    Elapsed,
}

/// Computes the ground speed that covers `distance` in exactly `remaining`.
///
/// The aircraft is modelled to change speed at `max_accel` from `ground_speed` to the result,
/// then hold the result until arrival.
/// If no such speed exists, the average speed `distance / remaining` is returned.
pub fn solve(
    ground_speed: Speed<f32>,
    distance: Length<f32>,
    remaining: Duration,
    max_accel: Accel<f32>,
) -> Result<Speed<f32>, RtaError> {
    let dt = remaining.as_secs_f32();
    if dt <= 0.0 {
        return Err(RtaError::Elapsed);
    }

    let v0 = ground_speed.into_meter_per_sec();
    let dx = distance.into_meters();
    let magnitude = max_accel.abs().max(MIN_ACCEL).into_meters_per_sec2();
    let ax = if v0 * dt < dx { magnitude } else { -magnitude };

    // dx = (v0 + v1) / 2 * t_accel + v1 * (dt - t_accel), where t_accel = (v1 - v0) / ax
    let a = -0.5 / ax;
    let b = v0 / ax + dt;
    let c = -0.5 * v0 * v0 / ax - dx;
    let discriminant = b * b - 4.0 * a * c;

    let root = (discriminant >= 0.0)
        .then(|| {
            let sqrt = discriminant.sqrt();
            [(-b - sqrt) / (2.0 * a), (-b + sqrt) / (2.0 * a)]
                .into_iter()
                .filter(|&v1| {
                    let accel_time = (v1 - v0) / ax;
                    accel_time >= 0.0 && dt - accel_time >= 0.0
                })
                .min_by_key(|&v1| OrderedFloat((v1 - v0).abs()))
        })
        .flatten();

    Ok(Speed::from_meter_per_sec(root.unwrap_or(dx / dt)))
}

/// Calibrated airspeed to fly for the ground speed computed by [`solve`].
///
/// `tailwind` is the wind component along the current track.
pub fn solve_cas(
    atmosphere: &Atmosphere,
    ground_speed: Speed<f32>,
    distance: Length<f32>,
    remaining: Duration,
    max_accel: Accel<f32>,
    tailwind: Speed<f32>,
) -> Result<Speed<f32>, RtaError> {
    let target = solve(ground_speed, distance, remaining, max_accel)?;
    Ok(atmosphere.tas_to_cas((target - tailwind).max(Speed::ZERO)))
}
