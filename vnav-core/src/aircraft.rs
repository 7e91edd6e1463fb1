//! Per-aircraft state consumed and produced by the guidance systems.
//!
//! An aircraft entity is created with [`SpawnCommand`],
//! which inserts every component the [`guidance`](crate::guidance) plugin queries.

use bevy::ecs::component::Component;
use bevy::ecs::entity::Entity;
use bevy::ecs::message::Message;
use bevy::ecs::system::EntityCommand;
use bevy::ecs::world::EntityWorldMut;
use math::geo::LatLon;
use math::{Heading, Position, Speed};

use crate::guidance::{ActiveLeg, FmsState, Guidance};
use crate::perf::Performance;
use crate::route::Route;
use crate::speed::SpeedTarget;
use crate::takeoff::Takeoff;

/// Current flight state, maintained by the flight dynamics outside this crate.
#[derive(Component, Debug, Clone, Copy)]
pub struct Kinematics {
    pub position:      LatLon,
    pub altitude:      Position<f32>,
    /// Direction of the ground velocity.
    pub track:         Heading,
    pub true_airspeed: Speed<f32>,
    pub ground_speed:  Speed<f32>,
    /// Calibrated airspeed.
    pub cas:           Speed<f32>,
    pub vert_rate:     Speed<f32>,
}

/// Autopilot mode switches.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modes {
    /// Lateral navigation along the route.
    pub lnav:       bool,
    /// Vertical navigation towards route altitude constraints. Requires `lnav`.
    pub vnav:       bool,
    /// Managed speed from constraints and the speed schedule.
    pub vnav_speed: bool,
    /// The aircraft is descending towards a lower altitude constraint.
    pub descending: bool,
}

/// Targets selected on the autopilot.
///
/// While the managed modes are engaged, guidance writes its decisions back here,
/// so that the last managed values are held when a mode disengages.
#[derive(Component, Debug, Clone, Copy)]
pub struct Selected {
    pub altitude:  Position<f32>,
    pub heading:   Heading,
    pub speed:     SpeedTarget,
    /// Magnitude of the vertical rate towards `altitude`.
    /// The configured default rate is used if unset.
    pub vert_rate: Option<Speed<f32>>,
}

/// Manual selections that replaced a managed target until dismissed.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualOverride {
    pub heading:   bool,
    pub altitude:  bool,
    pub vert_rate: bool,
    /// The manually selected speed, which also replaces the speed schedule in descent planning.
    pub speed:     Option<SpeedTarget>,
}

impl ManualOverride {
    #[must_use]
    pub fn is_empty(&self) -> bool { *self == Self::default() }
}

pub struct SpawnCommand {
    pub kinematics:  Kinematics,
    pub performance: Performance,
    pub route:       Route,
    pub modes:       Modes,
    /// Initial selected speed. Defaults to the current calibrated airspeed.
    pub speed:       Option<SpeedTarget>,
    pub takeoff:     Option<Takeoff>,
}

impl EntityCommand for SpawnCommand {
    fn apply(self, mut entity: EntityWorldMut) {
        let kinematics = self.kinematics;
        let selected = Selected {
            altitude:  kinematics.altitude,
            heading:   kinematics.track,
            speed:     self.speed.unwrap_or(SpeedTarget::Cas(kinematics.cas)),
            vert_rate: None,
        };

        let mut modes = self.modes;
        modes.lnav &= !self.route.is_empty();
        modes.vnav &= modes.lnav;

        entity.insert((
            kinematics,
            self.performance,
            self.route,
            modes,
            selected,
            ManualOverride::default(),
            ActiveLeg::default(),
            FmsState::new(),
            Guidance::holding(&selected),
        ));
        if let Some(takeoff) = self.takeoff {
            entity.insert(takeoff);
        }

        let entity_id = entity.id();
        entity.world_scope(|world| world.write_message(SpawnMessage(entity_id)));
    }
}

/// Sent when an aircraft entity is spawned.
#[derive(Message)]
pub struct SpawnMessage(pub Entity);
