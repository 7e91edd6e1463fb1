//! Takeoff climb performance.
//!
//! While an aircraft carries a [`Takeoff`] component,
//! its speed and vertical rate follow the takeoff profile instead of the managed guidance.

use std::sync::Arc;

use bevy::ecs::component::Component;
use math::{Length, Position, Speed};

#[cfg(test)]
mod tests;

/// The aircraft is considered airborne above this height.
const AIRBORNE_HEIGHT: Length<f32> = Length::from_meters(1.0);

/// The aircraft is considered airborne above this fraction of the minimum takeoff speed.
const AIRBORNE_SPEED_RATIO: f32 = 0.97;

/// A source of takeoff climb speeds.
pub trait TakeoffProfile: Send + Sync + 'static {
    /// Indicated airspeed and rate of climb to fly at `altitude`.
    fn ias_roc(&self, altitude: Position<f32>) -> (Speed<f32>, Speed<f32>);
}

/// One row of a [`TakeoffTable`].
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TakeoffRow {
    pub flight_level: f32,
    pub ias_kt:       f32,
    pub roc_fpm:      f32,
}

impl TakeoffRow {
    fn ias(self) -> Speed<f32> { Speed::from_knots(self.ias_kt) }

    fn roc(self) -> Speed<f32> { Speed::from_fpm(self.roc_fpm) }
}

/// A takeoff profile interpolated from rows sorted by flight level.
///
/// Below the first row, the first row applies.
/// Above the last row, its airspeed is held without climbing further.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "Vec<TakeoffRow>", into = "Vec<TakeoffRow>")]
pub struct TakeoffTable {
    rows: Vec<TakeoffRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("takeoff table has no rows")]
    Empty,
    #[error("row {0} of the takeoff table is not finite")]
    NonFinite(usize),
    #[error("row {0} of the takeoff table is not above the previous row")]
    Unordered(usize),
}

impl TryFrom<Vec<TakeoffRow>> for TakeoffTable {
    type Error = TableError;

    fn try_from(rows: Vec<TakeoffRow>) -> Result<Self, TableError> {
        if rows.is_empty() {
            return Err(TableError::Empty);
        }

        for (index, row) in rows.iter().enumerate() {
            if ![row.flight_level, row.ias_kt, row.roc_fpm].iter().all(|v| v.is_finite()) {
                return Err(TableError::NonFinite(index));
            }
        }

        if let Some(index) =
            rows.windows(2).position(|pair| pair[1].flight_level <= pair[0].flight_level)
        {
            return Err(TableError::Unordered(index + 1));
        }

        Ok(Self { rows })
    }
}

impl From<TakeoffTable> for Vec<TakeoffRow> {
    fn from(table: TakeoffTable) -> Self { table.rows }
}

impl TakeoffProfile for TakeoffTable {
    fn ias_roc(&self, altitude: Position<f32>) -> (Speed<f32>, Speed<f32>) {
        let level = altitude.flight_level();
        let upper = self.rows.partition_point(|row| row.flight_level <= level);

        match (upper.checked_sub(1).and_then(|i| self.rows.get(i)), self.rows.get(upper)) {
            (None, None) => (Speed::ZERO, Speed::ZERO),
            (None, Some(&first)) => (first.ias(), first.roc()),
            (Some(&last), None) if level > last.flight_level => (last.ias(), Speed::ZERO),
            (Some(&last), None) => (last.ias(), last.roc()),
            (Some(&low), Some(&high)) => {
                let ratio = (level - low.flight_level) / (high.flight_level - low.flight_level);
                (low.ias().lerp(high.ias(), ratio), low.roc().lerp(high.roc(), ratio))
            }
        }
    }
}

/// Takeoff mode of an aircraft.
#[derive(Component, Clone)]
pub struct Takeoff {
    pub profile:   Arc<dyn TakeoffProfile>,
    /// Minimum calibrated airspeed for takeoff.
    pub min_speed: Speed<f32>,
}

impl Takeoff {
    /// Whether the aircraft has left the ground for the purpose of the climb override.
    #[must_use]
    pub fn is_airborne(&self, altitude: Position<f32>, cas: Speed<f32>) -> bool {
        altitude.amsl() >= AIRBORNE_HEIGHT || cas >= self.min_speed * AIRBORNE_SPEED_RATIO
    }

    /// Speed to fly at `altitude`, capped by the speed constraint of the next waypoint.
    #[must_use]
    pub fn speed(&self, altitude: Position<f32>, constraint: Option<Speed<f32>>) -> Speed<f32> {
        let (ias, _) = self.profile.ias_roc(altitude);
        match constraint {
            Some(constraint) if constraint.is_positive() => ias.min(constraint),
            _ => ias,
        }
    }

    /// Vertical rate override, or `None` while the commanded altitude is being held.
    #[must_use]
    pub fn vert_rate(
        &self,
        altitude: Position<f32>,
        cas: Speed<f32>,
        holding_altitude: bool,
    ) -> Option<Speed<f32>> {
        if holding_altitude {
            return None;
        }
        if !self.is_airborne(altitude, cas) {
            return Some(Speed::ZERO);
        }
        Some(self.profile.ias_roc(altitude).1)
    }
}
