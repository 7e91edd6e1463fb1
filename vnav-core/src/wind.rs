//! Wind field providers used for along-track wind correction.

use bevy::ecs::resource::Resource;
use bevy::math::Vec2;
use math::geo::LatLon;
use math::{Heading, Position, Speed};

#[cfg(test)]
mod tests;

/// A source of wind vectors.
pub trait WindField: Send + Sync + 'static {
    /// The wind velocity at a point, as the direction the air moves towards.
    ///
    /// The x component is eastward and the y component is northward.
    fn at(&self, position: LatLon, altitude: Position<f32>) -> Speed<Vec2>;
}

/// No wind anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calm;

impl WindField for Calm {
    fn at(&self, _: LatLon, _: Position<f32>) -> Speed<Vec2> { Speed::ZERO }
}

/// The same wind everywhere.
#[derive(Debug, Clone, Copy)]
pub struct Uniform(pub Speed<Vec2>);

impl WindField for Uniform {
    fn at(&self, _: LatLon, _: Position<f32>) -> Speed<Vec2> { self.0 }
}

/// A horizontally uniform wind that varies with altitude.
///
/// The wind is interpolated linearly between layers
/// and held constant below the lowest and above the highest layer.
#[derive(Debug, Clone)]
pub struct Layered {
    layers: Vec<(Position<f32>, Speed<Vec2>)>,
}

impl Layered {
    /// Creates a profile from `(altitude, wind)` pairs in any order.
    #[must_use]
    pub fn new(mut layers: Vec<(Position<f32>, Speed<Vec2>)>) -> Self {
        layers.sort_by(|(a, _), (b, _)| a.total_cmp(b));
        Self { layers }
    }
}

impl WindField for Layered {
    fn at(&self, _: LatLon, altitude: Position<f32>) -> Speed<Vec2> {
        let upper = self.layers.partition_point(|&(layer, _)| layer <= altitude);

        match (upper.checked_sub(1).and_then(|i| self.layers.get(i)), self.layers.get(upper)) {
            (None, None) => Speed::ZERO,
            (Some(&(_, wind)), None) | (None, Some(&(_, wind))) => wind,
            (Some(&(low_alt, low)), Some(&(high_alt, high))) => {
                low.lerp(high, altitude.ratio_between(low_alt, high_alt))
            }
        }
    }
}

/// The wind field in effect for all aircraft.
#[derive(Resource)]
pub struct Wind(pub Box<dyn WindField>);

impl Default for Wind {
    fn default() -> Self { Self(Box::new(Calm)) }
}

impl Wind {
    /// Wind component along `track`, positive for tailwind.
    #[must_use]
    pub fn tailwind(
        &self,
        position: LatLon,
        altitude: Position<f32>,
        track: Heading,
    ) -> Speed<f32> {
        tailwind(self.0.at(position, altitude), track)
    }
}

/// Projects a wind vector onto `track`, positive for tailwind.
#[must_use]
pub fn tailwind(wind: Speed<Vec2>, track: Heading) -> Speed<f32> {
    wind.project_onto_dir(track.into_dir2())
}
