//! Flight plan routes and their waypoints.

use std::time::Duration;

use bevy::ecs::component::Component;
use math::geo::LatLon;
use math::{Length, Position, Speed};

use crate::speed::SpeedTarget;


/// The ordered waypoints an aircraft flies, with the active waypoint index.
///
/// The active index is always within bounds unless the route is empty.
#[derive(Component, Debug, Clone, Default)]
pub struct Route {
    waypoints:       Vec<Waypoint>,
    active:          usize,
    /// Whether the last waypoint was set as the destination.
    has_destination: bool,
}

/// Result of [`Route::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The waypoint at the new index is now active.
    Next(usize),
    /// The active waypoint was the last one. The index is unchanged.
    End,
}

impl Route {
    #[must_use]
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self { waypoints, active: 0, has_destination: false }
    }

    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] { &self.waypoints }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.waypoints.is_empty() }

    #[must_use]
    pub fn len(&self) -> usize { self.waypoints.len() }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Waypoint> { self.waypoints.get(index) }

    /// Index of the active waypoint, or `None` if the route is empty.
    #[must_use]
    pub fn active_index(&self) -> Option<usize> { (!self.is_empty()).then_some(self.active) }

    #[must_use]
    pub fn active(&self) -> Option<&Waypoint> { self.waypoints.get(self.active) }

    /// Whether the active waypoint is the final one of the route.
    #[must_use]
    pub fn is_last_active(&self) -> bool { self.active + 1 >= self.waypoints.len() }

    /// Activates the waypoint after the active one, if there is any.
    pub fn advance(&mut self) -> Advance {
        if self.active + 1 < self.waypoints.len() {
            self.active += 1;
            Advance::Next(self.active)
        } else {
            Advance::End
        }
    }

    /// Great-circle length of the leg from waypoint `index` to the next one.
    #[must_use]
    pub fn leg_length(&self, index: usize) -> Option<Length<f32>> {
        let from = self.waypoints.get(index)?;
        let to = self.waypoints.get(index + 1)?;
        Some(from.position.distance(to.position))
    }

    /// Along-route distance from waypoint `from` to waypoint `to`.
    ///
    /// Returns zero if `to` is not after `from`.
    #[must_use]
    pub fn distance_between(&self, from: usize, to: usize) -> Length<f32> {
        (from..to).filter_map(|index| self.leg_length(index)).sum()
    }

    /// Positions of the waypoints from `from` to `to` inclusive.
    pub fn positions(&self, from: usize, to: usize) -> impl Iterator<Item = LatLon> + '_ {
        self.waypoints.iter().take(to.saturating_add(1)).skip(from).map(|wp| wp.position)
    }

    /// The first waypoint at or after `from` with an altitude constraint.
    #[must_use]
    pub fn next_altitude_constraint(&self, from: usize) -> Option<(usize, AltitudeConstraint)> {
        self.waypoints
            .iter()
            .enumerate()
            .skip(from)
            .find_map(|(index, wp)| Some((index, wp.altitude?)))
    }

    /// The first waypoint at or after `from` with a required time of arrival.
    #[must_use]
    pub fn next_rta(&self, from: usize) -> Option<(usize, Duration)> {
        self.waypoints.iter().enumerate().skip(from).find_map(|(index, wp)| Some((index, wp.rta?)))
    }

    /// Indices of waypoints at or after `from` with an altitude constraint.
    pub fn restricted_from(&self, from: usize) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.waypoints
            .iter()
            .enumerate()
            .skip(from)
            .filter(|(_, wp)| wp.altitude.is_some())
            .map(|(index, _)| index)
    }

    /// Index of the first waypoint at or after the active one named `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.waypoints.iter().enumerate().skip(self.active).find_map(|(index, wp)| {
            (wp.name == name).then_some(index)
        })
    }

    /// Appends a waypoint before the destination, if there is one.
    pub fn push(&mut self, waypoint: Waypoint) -> usize {
        let index = if self.has_destination {
            self.waypoints.len().saturating_sub(1)
        } else {
            self.waypoints.len()
        };
        self.waypoints.insert(index, waypoint);
        if index < self.active {
            self.active += 1;
        }
        index
    }

    /// Inserts a waypoint before the waypoint at `index`.
    ///
    /// Inserting before the active waypoint keeps the same waypoint active.
    pub fn insert(&mut self, index: usize, waypoint: Waypoint) -> Result<(), RouteError> {
        if index > self.waypoints.len() {
            return Err(RouteError::IndexOutOfRange { index, len: self.waypoints.len() });
        }
        self.waypoints.insert(index, waypoint);
        if index < self.active {
            self.active += 1;
        }
        Ok(())
    }

    /// Sets the final waypoint of the route, replacing the previous destination.
    pub fn set_destination(&mut self, waypoint: Waypoint) {
        if self.has_destination
            && let Some(last) = self.waypoints.last_mut()
        {
            *last = waypoint;
        } else {
            self.waypoints.push(waypoint);
            self.has_destination = true;
        }
    }

    /// Makes the waypoint at `index` active, skipping all waypoints before it.
    pub fn direct_to(&mut self, index: usize) -> Result<(), RouteError> {
        if index >= self.waypoints.len() {
            return Err(RouteError::IndexOutOfRange { index, len: self.waypoints.len() });
        }
        self.active = index;
        Ok(())
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut Waypoint, RouteError> {
        let len = self.waypoints.len();
        self.waypoints.get_mut(index).ok_or(RouteError::IndexOutOfRange { index, len })
    }

    pub fn set_rta(&mut self, index: usize, rta: Option<Duration>) -> Result<(), RouteError> {
        self.get_mut(index)?.rta = rta;
        Ok(())
    }

    pub fn set_force_geometric(&mut self, index: usize, force: bool) -> Result<(), RouteError> {
        self.get_mut(index)?.force_geometric = force;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("waypoint index {index} is out of range for a route of {len} waypoints")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no waypoint named {0:?} ahead on the route")]
    UnknownWaypoint(String),
}

/// A point on a route.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Waypoint {
    pub name:            String,
    pub position:        LatLon,
    pub altitude:        Option<AltitudeConstraint>,
    /// Speed to fly on the leg after this waypoint.
    pub speed:           Option<SpeedTarget>,
    /// Required time of arrival, measured from simulation start.
    pub rta:             Option<Duration>,
    pub turn:            TurnMode,
    /// Always descend geometrically after passing this waypoint.
    pub force_geometric: bool,
    /// Opaque commands run by the command layer when this waypoint is passed.
    pub actions:         Vec<String>,
}

impl Waypoint {
    #[must_use]
    pub fn new(name: impl Into<String>, position: LatLon) -> Self {
        Self {
            name: name.into(),
            position,
            altitude: None,
            speed: None,
            rta: None,
            turn: TurnMode::FlyBy,
            force_geometric: false,
            actions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_altitude(mut self, altitude: Position<f32>, restriction: Restriction) -> Self {
        self.altitude = Some(AltitudeConstraint { altitude, restriction });
        self
    }

    #[must_use]
    pub fn with_speed(mut self, speed: SpeedTarget) -> Self {
        self.speed = Some(speed);
        self
    }

    #[must_use]
    pub fn with_rta(mut self, rta: Duration) -> Self {
        self.rta = Some(rta);
        self
    }

    #[must_use]
    pub fn with_turn(mut self, turn: TurnMode) -> Self {
        self.turn = turn;
        self
    }

    #[must_use]
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }
}

/// An altitude constraint at a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AltitudeConstraint {
    pub altitude:    Position<f32>,
    pub restriction: Restriction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Restriction {
    #[default]
    At,
    AtOrAbove,
    AtOrBelow,
}

/// How the aircraft turns onto the leg after a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub enum TurnMode {
    /// Start turning before the waypoint.
    #[default]
    FlyBy,
    /// Overfly the waypoint before turning.
    FlyOver,
    /// Fly a turn of the given radius and speed.
    FlyTurn {
        /// Non-positive values are treated as absent.
        radius: Option<Length<f32>>,
        /// Calibrated airspeed to fly through the turn.
        speed:  Option<Speed<f32>>,
    },
}

impl TurnMode {
    /// The specified turn radius, if positive.
    #[must_use]
    pub fn radius(self) -> Option<Length<f32>> {
        match self {
            Self::FlyTurn { radius: Some(radius), .. } if radius.is_positive() => Some(radius),
            _ => None,
        }
    }

    /// The specified turn speed, if positive.
    #[must_use]
    pub fn speed(self) -> Option<Speed<f32>> {
        match self {
            Self::FlyTurn { speed: Some(speed), .. } if speed.is_positive() => Some(speed),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_fly_turn(self) -> bool { matches!(self, Self::FlyTurn { .. }) }
}
