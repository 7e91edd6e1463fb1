//! Spherical-earth geodesy.

use crate::{Heading, Length};


/// Earth radius in nautical miles, used for distance calculations.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// A point on the earth surface, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self { Self { lat, lon } }

    /// Great-circle distance using the haversine formula.
    #[must_use]
    pub fn distance(self, other: Self) -> Length<f32> {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().min(1.0).asin();

        #[expect(clippy::cast_possible_truncation)] // f32 is precise enough for route distances
        let nm = (EARTH_RADIUS_NM * c) as f32;
        Length::from_nm(nm)
    }

    /// Initial great-circle course from `self` to `other`.
    ///
    /// Returns north if the two points coincide.
    #[must_use]
    pub fn bearing(self, other: Self) -> Heading {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lon = (other.lon - self.lon).to_radians();

        let x = delta_lon.sin() * lat2.cos();
        let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

        if x == 0.0 && y == 0.0 {
            return Heading::NORTH;
        }

        #[expect(clippy::cast_possible_truncation)] // f32 is precise enough for headings
        let degrees = x.atan2(y).to_degrees() as f32;
        Heading::from_degrees(degrees)
    }

    /// The point reached by travelling `distance` from `self` along the initial course `heading`.
    #[must_use]
    pub fn destination(self, heading: Heading, distance: Length<f32>) -> Self {
        let lat1 = self.lat.to_radians();
        let lon1 = self.lon.to_radians();
        let course = f64::from(heading.radians().into_radians());
        let arc = f64::from(distance.into_nm()) / EARTH_RADIUS_NM;

        let lat2 = (lat1.sin() * arc.cos() + lat1.cos() * arc.sin() * course.cos()).asin();
        let lon2 = lon1
            + (course.sin() * arc.sin() * lat1.cos()).atan2(arc.cos() - lat1.sin() * lat2.sin());

        Self { lat: lat2.to_degrees(), lon: (lon2.to_degrees() + 540.0) % 360.0 - 180.0 }
    }
}

/// One step of a polyline split by [`sample_path`].
#[derive(Debug, Clone, Copy)]
pub struct PathStep {
    /// Midpoint of the step.
    pub position: LatLon,
    /// Course flown over the step.
    pub heading:  Heading,
    /// Length of the step.
    pub length:   Length<f32>,
}

/// Splits the polyline through `points` into steps no longer than `max_step`.
///
/// Steps are returned in the order of travel.
#[must_use]
pub fn sample_path(points: &[LatLon], max_step: Length<f32>) -> Vec<PathStep> {
    let mut steps = Vec::new();

    for pair in points.windows(2) {
        let &[from, to] = pair else { continue };
        let leg_length = from.distance(to);
        if leg_length <= Length::ZERO {
            continue;
        }

        let heading = from.bearing(to);
        #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // small positive count
        let count = (leg_length / max_step.max(Length::from_nm(0.01))).ceil().max(1.0) as usize;
        #[expect(clippy::cast_precision_loss)] // `count` is expected to be small
        let step_length = leg_length / count as f32;

        for index in 0..count {
            #[expect(clippy::cast_precision_loss)] // `index` is expected to be small
            let position = from.destination(heading, step_length * (index as f32 + 0.5));
            steps.push(PathStep { position, heading, length: step_length });
        }
    }

    steps
}
