//! Commands that modify the route and autopilot selections of an aircraft.
//!
//! Each command can be queued on an aircraft entity as an [`EntityCommand`],
//! which logs a warning if the command is rejected.
//! `try_apply` applies the command directly and reports the rejection.

use std::time::Duration;

use bevy::ecs::change_detection::Mut;
use bevy::ecs::component::{Component, Mutable};
use bevy::ecs::entity::Entity;
use bevy::ecs::system::EntityCommand;
use bevy::ecs::world::EntityWorldMut;
use bevy::log::warn;
use math::{Heading, Position, Speed};

use super::FmsState;
use crate::aircraft::{Kinematics, ManualOverride, Modes, Selected};
use crate::route::{Route, RouteError, Waypoint};
use crate::speed::SpeedTarget;
use crate::takeoff::Takeoff;


#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("{0:?} is not an aircraft")]
    NotAircraft(Entity),
    #[error("the route is empty")]
    EmptyRoute,
    #[error("VNAV requires LNAV")]
    VnavWithoutLnav,
    #[error(transparent)]
    Route(#[from] RouteError),
}

fn get_mut<'a, T: Component<Mutability = Mutable>>(
    entity: &'a mut EntityWorldMut,
) -> Result<Mut<'a, T>, CommandError> {
    let id = entity.id();
    entity.get_mut::<T>().ok_or(CommandError::NotAircraft(id))
}

fn get<'a, T: Component>(entity: &'a EntityWorldMut) -> Result<&'a T, CommandError> {
    entity.get::<T>().ok_or(CommandError::NotAircraft(entity.id()))
}

fn warn_rejected(kind: &str, entity: Entity, result: Result<(), CommandError>) {
    if let Err(err) = result {
        warn!("{kind} rejected for {entity:?}: {err}");
    }
}

macro_rules! commands {
    ($($ty:ident),* $(,)?) => {
        /// Any of the aircraft commands in this module.
        #[derive(derive_more::From)]
        pub enum Command {
            $($ty($ty),)*
        }

        impl Command {
            pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
                match self {
                    $(Self::$ty(command) => command.try_apply(entity),)*
                }
            }
        }

        impl EntityCommand for Command {
            fn apply(self, mut entity: EntityWorldMut) {
                let result = self.try_apply(&mut entity);
                warn_rejected("Command", entity.id(), result);
            }
        }

        $(
            impl EntityCommand for $ty {
                fn apply(self, mut entity: EntityWorldMut) {
                    let result = self.try_apply(&mut entity);
                    warn_rejected(stringify!($ty), entity.id(), result);
                }
            }
        )*
    };
}

commands!(
    DirectTo,
    AppendWaypoint,
    InsertWaypoint,
    SetRta,
    ForceGeometric,
    SetDestination,
    SelectAltitude,
    SelectHeading,
    SelectSpeed,
    SelectVertRate,
    SetLnav,
    SetVnav,
    SetVnavSpeed,
    SetTakeoff,
    DismissOverride,
);

/// Looks up a waypoint at or after the active one.
fn find(route: &Route, name: &str) -> Result<usize, CommandError> {
    route.find(name).ok_or_else(|| RouteError::UnknownWaypoint(name.to_owned()).into())
}

/// Activates the first waypoint of a route that was empty before.
fn activate_if_first(entity: &mut EntityWorldMut, was_empty: bool) -> Result<(), CommandError> {
    if was_empty {
        let mut fms = get_mut::<FmsState>(entity)?;
        fms.reactivate = true;
        fms.needs_replan = true;
    }
    Ok(())
}

/// Flies directly to a waypoint ahead on the route and engages LNAV.
pub struct DirectTo {
    pub name: String,
}

impl DirectTo {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        {
            let mut route = get_mut::<Route>(entity)?;
            let index = find(&route, &self.name)?;
            route.direct_to(index)?;
        }

        get_mut::<Modes>(entity)?.lnav = true;
        let mut fms = get_mut::<FmsState>(entity)?;
        fms.reactivate = true;
        fms.needs_replan = true;
        Ok(())
    }
}

/// Appends a waypoint before the destination.
pub struct AppendWaypoint {
    pub waypoint: Waypoint,
}

impl AppendWaypoint {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        let was_empty = {
            let mut route = get_mut::<Route>(entity)?;
            let was_empty = route.is_empty();
            route.push(self.waypoint);
            was_empty
        };
        activate_if_first(entity, was_empty)
    }
}

/// Inserts a waypoint before the named waypoint.
pub struct InsertWaypoint {
    pub before:   String,
    pub waypoint: Waypoint,
}

impl InsertWaypoint {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        let mut route = get_mut::<Route>(entity)?;
        let index = find(&route, &self.before)?;
        route.insert(index, self.waypoint)?;
        Ok(())
    }
}

/// Sets or clears the required time of arrival at the named waypoint.
pub struct SetRta {
    pub name: String,
    /// Time of arrival, measured from simulation start.
    pub rta:  Option<Duration>,
}

impl SetRta {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        let mut route = get_mut::<Route>(entity)?;
        let index = find(&route, &self.name)?;
        route.set_rta(index, self.rta)?;
        Ok(())
    }
}

/// Requests geometric descent after passing the named waypoint.
pub struct ForceGeometric {
    pub name:  String,
    pub force: bool,
}

impl ForceGeometric {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        let mut route = get_mut::<Route>(entity)?;
        let index = find(&route, &self.name)?;
        route.set_force_geometric(index, self.force)?;
        Ok(())
    }
}

/// Sets the final waypoint of the route.
pub struct SetDestination {
    pub waypoint: Waypoint,
}

impl SetDestination {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        let was_empty = {
            let mut route = get_mut::<Route>(entity)?;
            let was_empty = route.is_empty();
            route.set_destination(self.waypoint);
            was_empty
        };
        activate_if_first(entity, was_empty)
    }
}

/// Selects an altitude manually, disengaging VNAV.
pub struct SelectAltitude {
    pub altitude: Position<f32>,
}

impl SelectAltitude {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        get_mut::<Selected>(entity)?.altitude = self.altitude;
        get_mut::<Modes>(entity)?.vnav = false;
        get_mut::<ManualOverride>(entity)?.altitude = true;
        Ok(())
    }
}

/// Selects a heading manually, disengaging LNAV and VNAV.
pub struct SelectHeading {
    pub heading: Heading,
}

impl SelectHeading {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        get_mut::<Selected>(entity)?.heading = self.heading;
        {
            let mut modes = get_mut::<Modes>(entity)?;
            modes.lnav = false;
            modes.vnav = false;
        }
        get_mut::<ManualOverride>(entity)?.heading = true;
        Ok(())
    }
}

/// Selects a speed manually, disengaging managed speed.
///
/// The selected speed also replaces the speed schedule in descent planning until dismissed.
pub struct SelectSpeed {
    pub speed: SpeedTarget,
}

impl SelectSpeed {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        get_mut::<Selected>(entity)?.speed = self.speed;
        get_mut::<Modes>(entity)?.vnav_speed = false;
        get_mut::<ManualOverride>(entity)?.speed = Some(self.speed);
        Ok(())
    }
}

/// Selects the vertical rate towards the selected altitude, disengaging VNAV.
pub struct SelectVertRate {
    /// `None` restores the configured default rate.
    pub vert_rate: Option<Speed<f32>>,
}

impl SelectVertRate {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        get_mut::<Selected>(entity)?.vert_rate = self.vert_rate;
        get_mut::<Modes>(entity)?.vnav = false;
        get_mut::<ManualOverride>(entity)?.vert_rate = true;
        Ok(())
    }
}

/// Engages or disengages lateral navigation.
///
/// Disengaging LNAV also disengages VNAV.
pub struct SetLnav(pub bool);

impl SetLnav {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        if self.0 && get::<Route>(entity)?.is_empty() {
            return Err(CommandError::EmptyRoute);
        }

        let was_on = {
            let mut modes = get_mut::<Modes>(entity)?;
            let was_on = modes.lnav;
            modes.lnav = self.0;
            modes.vnav &= self.0;
            was_on
        };

        if self.0 && !was_on {
            get_mut::<FmsState>(entity)?.reactivate = true;
        }
        Ok(())
    }
}

/// Engages or disengages vertical navigation together with managed speed.
pub struct SetVnav(pub bool);

impl SetVnav {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        if self.0 {
            if get::<Route>(entity)?.is_empty() {
                return Err(CommandError::EmptyRoute);
            }
            if !get::<Modes>(entity)?.lnav {
                return Err(CommandError::VnavWithoutLnav);
            }
        }

        {
            let mut modes = get_mut::<Modes>(entity)?;
            modes.vnav = self.0;
            modes.vnav_speed = self.0;
        }

        if self.0 {
            let mut fms = get_mut::<FmsState>(entity)?;
            fms.recompute = true;
            fms.needs_replan = true;
        }
        Ok(())
    }
}

/// Engages or disengages managed speed.
pub struct SetVnavSpeed(pub bool);

impl SetVnavSpeed {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        get_mut::<Modes>(entity)?.vnav_speed = self.0;
        Ok(())
    }
}

/// Enters or leaves takeoff mode.
pub struct SetTakeoff(pub Option<Takeoff>);

impl SetTakeoff {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        get::<Kinematics>(entity)?;

        match self.0 {
            Some(takeoff) => {
                entity.insert(takeoff);
            }
            None => {
                entity.remove::<Takeoff>();
            }
        }
        Ok(())
    }
}

/// Dismisses all manual overrides and restores the managed modes they replaced.
///
/// The descent profile is rebuilt on the next tick.
pub struct DismissOverride;

impl DismissOverride {
    pub fn try_apply(self, entity: &mut EntityWorldMut) -> Result<(), CommandError> {
        let has_route = !get::<Route>(entity)?.is_empty();
        let manual = {
            let mut manual = get_mut::<ManualOverride>(entity)?;
            std::mem::take(&mut *manual)
        };

        let reactivate = {
            let mut modes = get_mut::<Modes>(entity)?;
            let reactivate = manual.heading && has_route && !modes.lnav;
            if manual.heading {
                modes.lnav |= has_route;
            }
            if manual.altitude || manual.vert_rate {
                modes.vnav = modes.lnav;
            }
            if manual.speed.is_some() {
                modes.vnav_speed = true;
            }
            reactivate
        };

        let mut fms = get_mut::<FmsState>(entity)?;
        fms.needs_replan = true;
        if reactivate {
            fms.reactivate = true;
        } else {
            fms.recompute = true;
        }
        Ok(())
    }
}
