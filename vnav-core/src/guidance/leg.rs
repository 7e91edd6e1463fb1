//! Turn and leg geometry.

use std::time::Duration;

use math::{Accel, Angle, EARTH_SURFACE_GRAVITY, Heading, Length, Position, Speed, isa};

use crate::route::TurnMode;

#[cfg(test)]
mod tests;

/// Course changes are capped at this angle when anticipating a turn.
const MAX_ANTICIPATED_TURN: Angle = Angle::from_degrees(170.0);

/// Acceleration magnitudes are raised to at least this value.
const MIN_ACCEL: Accel<f32> = Accel::from_meters_per_sec2(0.001);

/// Radius of a coordinated turn at `speed` with `bank`.
#[must_use]
pub fn turn_radius(speed: Speed<f32>, bank: Angle) -> Length<f32> {
    let speed = speed.into_meter_per_sec();
    let tan = bank.tan().max(f32::EPSILON);
    Length::from_meters(speed * speed / (EARTH_SURFACE_GRAVITY.into_meters_per_sec2() * tan))
}

/// Distance before the waypoint at which a turn of `radius` from `inbound` to `outbound` starts.
#[must_use]
pub fn anticipation(radius: Length<f32>, inbound: Heading, outbound: Heading) -> Length<f32> {
    let change = inbound.closest_distance(outbound).abs().min(MAX_ANTICIPATED_TURN);
    radius * (change * 0.5).tan()
}

/// Turn anticipation distance for a waypoint flown with `turn`.
///
/// A specified turn radius replaces the radius derived from `bank`.
/// A turn speed slower than `tas` shrinks the nominal distance by the square of the speed ratio.
#[must_use]
pub fn turn_distance(
    tas: Speed<f32>,
    bank: Angle,
    inbound: Heading,
    outbound: Heading,
    turn: TurnMode,
    altitude: Position<f32>,
) -> Length<f32> {
    let nominal = anticipation(turn_radius(tas, bank), inbound, outbound);

    if let Some(turn_speed) = turn.speed() {
        let turn_tas = isa(altitude).cas_to_tas(turn_speed);
        if turn_tas < tas && tas.is_positive() {
            let ratio = turn_tas / tas;
            return nominal * (ratio * ratio);
        }
    }

    match turn.radius() {
        Some(radius) => anticipation(radius, inbound, outbound),
        None => nominal,
    }
}

/// Bank angle that flies a turn of `radius` at `speed`.
#[must_use]
pub fn bank_for_radius(speed: Speed<f32>, radius: Length<f32>) -> Angle {
    let speed = speed.into_meter_per_sec();
    let radius = radius.into_meters().max(1.0);
    let gravity = EARTH_SURFACE_GRAVITY.into_meters_per_sec2();
    Angle::from_radians((speed * speed / (radius * gravity)).atan())
}

/// Distance flown while changing speed from `from` to `to` at `accel`.
#[must_use]
pub fn accel_distance(from: Speed<f32>, to: Speed<f32>, accel: Accel<f32>) -> Length<f32> {
    let (from, to) = (from.into_meter_per_sec(), to.into_meter_per_sec());
    let accel = accel.abs().max(MIN_ACCEL).into_meters_per_sec2();
    Length::from_meters(0.5 * (to * to - from * from).abs() / accel)
}

/// Geometry of the aircraft relative to its active waypoint.
pub struct Approach {
    pub distance:      Length<f32>,
    /// Bearing from the aircraft to the waypoint.
    pub bearing:       Heading,
    pub track:         Heading,
    pub ground_speed:  Speed<f32>,
    pub turn_distance: Length<f32>,
    pub fly_over:      bool,
}

impl Approach {
    /// Whether the waypoint counts as passed.
    #[must_use]
    pub fn is_reached(&self, margin: Duration) -> bool {
        let margin = self.ground_speed.abs() * margin;

        let behind = self.track.closest_distance(self.bearing).abs() > Angle::RIGHT;
        if behind && self.distance < self.turn_distance + margin {
            return true;
        }

        if self.fly_over { self.distance < margin } else { self.distance < self.turn_distance }
    }
}
