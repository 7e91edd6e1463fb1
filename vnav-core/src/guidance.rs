//! The flight management guidance loop.
//!
//! Every tick, each aircraft runs through the [`SystemSets`] in order:
//! waypoint sequencing, RTA speed, vertical guidance, speed guidance,
//! and finally the [`Guidance`] output consumed by the autopilot.

use std::marker::PhantomData;
use std::time::Duration;

use bevy::app::{self, App, Plugin};
use bevy::ecs::component::Component;
use bevy::ecs::entity::Entity;
use bevy::ecs::message::{Message, MessageWriter};
use bevy::ecs::query::{Has, QueryData};
use bevy::ecs::schedule::{IntoScheduleConfigs, SystemSet};
use bevy::ecs::system::{Query, Res};
use bevy::log::{debug, trace};
use bevy::time::{self, Time};
use bevy_mod_config::{AppExt, Config, ConfigFieldFor, Manager, ReadConfig};
use itertools::Itertools;
use math::{Angle, Heading, Length, Position, Speed, SpeedUnit, isa};
use strum::IntoEnumIterator;

use crate::aircraft::{Kinematics, ManualOverride, Modes, Selected, SpawnMessage};
use crate::descent::{DescentCarry, PlanMode};
use crate::perf::Performance;
use crate::route::{Advance, Route, TurnMode};
use crate::rta;
use crate::schedule::schedule;
use crate::speed::SpeedTarget;
use crate::takeoff::Takeoff;
use crate::try_log_return;
use crate::wind::Wind;

pub mod command;
pub mod leg;
mod vnav;


/// Vertical navigation engages this close to the waypoint when LNAV is off.
const VNAV_WITHOUT_LNAV_DISTANCE: Length<f32> = Length::from_meters(185.2);

/// The aircraft is on the current leg if its track is within this angle of the waypoint bearing.
const ON_LEG_TOLERANCE: Angle = Angle::from_degrees(2.0);

/// Selected vertical rates below this magnitude fall back to the configured default.
const MIN_SELECTED_VERT_RATE: Speed<f32> = Speed::from_meter_per_sec(0.1);

/// The commanded altitude is considered held within this tolerance.
const ALTITUDE_HOLD_TOLERANCE: Length<f32> = Length::from_feet(10.0);

/// The speed schedule only overrides a slower selected speed beyond this ratio.
const SCHEDULE_OVERSPEED_RATIO: f32 = 1.01;

pub struct Plug<M>(PhantomData<M>);

impl<M> Default for Plug<M> {
    fn default() -> Self { Self(PhantomData) }
}

impl<M: Manager + Default> Plugin for Plug<M>
where
    Conf: ConfigFieldFor<M>,
{
    fn build(&self, app: &mut App) {
        app.init_config::<M, Conf>("vnav:guidance");
        app.init_resource::<Wind>();
        app.add_message::<SpawnMessage>();
        app.add_message::<WaypointPassed>();

        for (before, after) in SystemSets::iter().tuple_windows() {
            app.configure_sets(app::Update, before.before(after));
        }

        app.add_systems(app::Update, sequence_system.in_set(SystemSets::Sequence));
        app.add_systems(app::Update, rta_system.in_set(SystemSets::Rta));
        app.add_systems(app::Update, vertical_system.in_set(SystemSets::Vertical));
        app.add_systems(app::Update, speed_system.in_set(SystemSets::Speed));
        app.add_systems(app::Update, materialize_system.in_set(SystemSets::Materialize));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SystemSet, strum::EnumIter)]
pub enum SystemSets {
    /// Waypoint passage, leg activation and descent planning.
    Sequence,
    /// Speed targets for required times of arrival.
    Rta,
    /// Vertical rate and altitude commands.
    Vertical,
    /// Speed target reconciliation.
    Speed,
    /// Writes the [`Guidance`] output.
    Materialize,
}

#[derive(Config)]
#[config(expose(read))]
pub struct Conf {
    /// Vertical rate towards a selected altitude when no vertical rate is selected.
    #[config(default = Speed::from_fpm(1500.0), min = Speed::ZERO, max = Speed::from_fpm(6000.0), unit = SpeedUnit::FeetPerMinute)]
    pub default_vert_rate: Speed<f32>,
    /// Bank angle assumed when anticipating turns.
    #[config(default = Angle::from_degrees(25.0), min = Angle::from_degrees(5.0), max = Angle::from_degrees(45.0))]
    pub nominal_bank:      Angle,
    /// Height gained per horizontal distance on a standard climb.
    #[config(default = 0.0494, min = 0.01, max = 0.2)]
    pub std_steepness:     f32,
    /// Fly-over waypoints are passed within this much flight time.
    #[config(default = Duration::from_secs(4))]
    pub flyover_margin:    Duration,
}

/// Sent when an aircraft passes a waypoint.
#[derive(Message)]
pub struct WaypointPassed {
    pub aircraft: Entity,
    /// Route index of the passed waypoint.
    pub index:    usize,
    pub name:     String,
    /// Commands attached to the waypoint, to be run by the command layer.
    pub actions:  Vec<String>,
}

/// Guidance output for the autopilot.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Guidance {
    pub track:         Heading,
    pub altitude:      Position<f32>,
    /// Signed vertical rate towards `altitude`.
    pub vert_rate:     Speed<f32>,
    pub speed:         SpeedTarget,
    pub true_airspeed: Speed<f32>,
    /// Bank angle of a specified-radius turn in progress.
    pub bank:          Option<Angle>,
    pub active_index:  Option<usize>,
    pub active_name:   Option<String>,
    pub mode:          PlanMode,
}

impl Guidance {
    /// Output that holds the selected targets.
    #[must_use]
    pub fn holding(selected: &Selected) -> Self {
        Self {
            track:         selected.heading,
            altitude:      selected.altitude,
            vert_rate:     Speed::ZERO,
            speed:         selected.speed,
            true_airspeed: selected.speed.tas_at(selected.altitude),
            bank:          None,
            active_index:  None,
            active_name:   None,
            mode:          PlanMode::Idle,
        }
    }
}

/// Constraints and turn data of the active leg, refreshed when a waypoint is activated.
#[derive(Component, Debug, Clone, Default)]
pub struct ActiveLeg {
    /// Course into the active waypoint.
    pub bearing:           Heading,
    pub length:            Length<f32>,
    /// Distance before the active waypoint at which the turn onto the next leg starts.
    pub turn_distance:     Length<f32>,
    pub turn:              TurnMode,
    /// Calibrated airspeed for the turn at the active waypoint.
    pub turn_speed:        Option<Speed<f32>>,
    /// Turn speed of the previous waypoint, held until established on this leg.
    pub old_turn_speed:    Option<Speed<f32>>,
    pub turning_to_next:   bool,
    pub turning_from_last: bool,
    /// Speed constraint of the current leg.
    pub speed:             Option<SpeedTarget>,
    /// Speed constraint at the active waypoint.
    pub next_speed:        Option<SpeedTarget>,
    pub is_last:           bool,
}

/// When the vertical command of VNAV engages.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum VerticalTrigger {
    /// No vertical action is pending.
    #[default]
    Never,
    /// Engage immediately.
    Now,
    /// Engage within this distance of the active waypoint.
    Within(Length<f32>),
}

impl VerticalTrigger {
    #[must_use]
    pub fn fires(self, distance: Length<f32>) -> bool {
        match self {
            Self::Never => false,
            Self::Now => true,
            Self::Within(trigger) => distance < trigger,
        }
    }
}

/// Vertical rate flown once VNAV engages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VnavRate {
    /// Height change per horizontal distance, negative when descending.
    Gradient(f32),
    Fixed(Speed<f32>),
}

impl VnavRate {
    #[must_use]
    pub fn at(self, ground_speed: Speed<f32>) -> Speed<f32> {
        match self {
            Self::Gradient(gradient) => ground_speed * gradient,
            Self::Fixed(rate) => rate,
        }
    }
}

/// Flight management scratch state, owned by the guidance systems.
#[derive(Component, Debug, Clone)]
pub struct FmsState {
    pub distance_to_waypoint: Length<f32>,
    pub bearing_to_waypoint:  Heading,
    pub mode:                 PlanMode,
    pub trigger:              VerticalTrigger,
    /// Waypoint passages before `trigger` applies.
    pub countdown:            u32,
    pub vnav_rate:            VnavRate,
    /// Altitude constraint that VNAV flies towards.
    pub target_altitude:      Option<Position<f32>>,
    /// Route index of the waypoint the current descent plan is constrained by.
    pub constrained_index:    Option<usize>,
    /// Carry in effect for the next descent plan.
    pub carry:                DescentCarry,
    /// Carry that takes effect after passing `constrained_index`.
    pub pending_carry:        DescentCarry,
    /// The last passed waypoint had an altitude constraint.
    pub constraint_passed:    bool,
    /// Rebuild the descent plan at the next VNAV computation.
    pub needs_replan:         bool,
    /// Activate the active waypoint again at the next tick.
    pub reactivate:           bool,
    /// Rerun the VNAV computation for the active leg at the next tick.
    pub recompute:            bool,
    pub bank:                 Option<Angle>,
}

impl FmsState {
    /// State of a newly spawned aircraft, which activates its first waypoint on the next tick.
    #[must_use]
    pub fn new() -> Self {
        Self {
            distance_to_waypoint: Length::ZERO,
            bearing_to_waypoint:  Heading::NORTH,
            mode:                 PlanMode::Idle,
            trigger:              VerticalTrigger::Never,
            countdown:            0,
            vnav_rate:            VnavRate::Fixed(Speed::ZERO),
            target_altitude:      None,
            constrained_index:    None,
            carry:                DescentCarry::default(),
            pending_carry:        DescentCarry::default(),
            constraint_passed:    false,
            needs_replan:         true,
            reactivate:           true,
            recompute:            false,
            bank:                 None,
        }
    }
}

impl Default for FmsState {
    fn default() -> Self { Self::new() }
}

#[derive(QueryData)]
#[query_data(mutable)]
struct SequenceQuery {
    entity:     Entity,
    kinematics: &'static Kinematics,
    perf:       &'static Performance,
    route:      &'static mut Route,
    modes:      &'static mut Modes,
    selected:   &'static mut Selected,
    manual:     &'static ManualOverride,
    leg:        &'static mut ActiveLeg,
    fms:        &'static mut FmsState,
    takeoff:    Has<Takeoff>,
}

impl SequenceQueryItem<'_, '_> {
    fn vnav_input<'a>(&'a self, conf: &ConfRead, wind: &'a Wind) -> vnav::Input<'a> {
        vnav::Input {
            perf:           self.perf,
            route:          &self.route,
            wind:           wind.0.as_ref(),
            kinematics:     self.kinematics,
            takeoff:        self.takeoff,
            speed_override: self.manual.speed.map(|speed| speed.cas_at(self.kinematics.altitude)),
            std_steepness:  conf.std_steepness,
        }
    }

    /// Loads the data of the active waypoint into the active leg.
    fn activate(&mut self, conf: &ConfRead, wind: &Wind) {
        let Some(index) = self.route.active_index() else { return };
        let waypoint = try_log_return!(
            self.route.get(index),
            expect "active index {} of {:?} to be within its route", index, self.entity
        );
        let kinematics = self.kinematics;

        let leg = &mut *self.leg;
        leg.turning_from_last = leg.turning_to_next;
        leg.turning_to_next = false;
        leg.old_turn_speed = leg.turn_speed;
        leg.turn = waypoint.turn;
        leg.turn_speed = waypoint.turn.speed();
        leg.next_speed = waypoint.speed;
        leg.is_last = self.route.is_last_active();

        let from = index
            .checked_sub(1)
            .and_then(|prev| self.route.get(prev))
            .map_or(kinematics.position, |prev| prev.position);
        leg.bearing = from.bearing(waypoint.position);
        leg.length = from.distance(waypoint.position);
        leg.turn_distance = self.route.get(index + 1).map_or(Length::ZERO, |next| {
            leg::turn_distance(
                kinematics.true_airspeed,
                conf.nominal_bank,
                leg.bearing,
                waypoint.position.bearing(next.position),
                waypoint.turn,
                kinematics.altitude,
            )
        });

        self.fms.distance_to_waypoint = kinematics.position.distance(waypoint.position);
        self.fms.bearing_to_waypoint = kinematics.position.bearing(waypoint.position);

        self.modes.vnav &= self.modes.lnav;
        if self.modes.vnav_speed
            && let Some(speed) = leg.speed
        {
            self.selected.speed = speed;
        }

        self.compute_vnav(conf, wind);
    }

    fn compute_vnav(&mut self, conf: &ConfRead, wind: &Wind) {
        let mut modes = *self.modes;
        let mut fms = self.fms.clone();
        vnav::compute(&self.vnav_input(conf, wind), &mut modes, &mut fms);
        *self.modes = modes;
        *self.fms = fms;
    }

    /// Passes the active waypoint and activates the next one.
    fn pass(&mut self, conf: &ConfRead, wind: &Wind, passed: &mut MessageWriter<WaypointPassed>) {
        let Some(index) = self.route.active_index() else { return };
        let waypoint = try_log_return!(
            self.route.get(index),
            expect "active index {} of {:?} to be within its route", index, self.entity
        );

        passed.write(WaypointPassed {
            aircraft: self.entity,
            index,
            name: waypoint.name.clone(),
            actions: waypoint.actions.clone(),
        });

        let had_constraint = waypoint.altitude.is_some();
        self.fms.bank = waypoint.turn.radius().map(|radius| {
            let speed = waypoint.turn.speed().map_or(self.kinematics.true_airspeed, |cas| {
                isa(self.kinematics.altitude).cas_to_tas(cas)
            });
            leg::bank_for_radius(speed, radius)
        });

        self.leg.speed = self.leg.next_speed;
        if self.fms.constrained_index == Some(index) {
            self.fms.carry = self.fms.pending_carry;
        }

        match self.route.advance() {
            Advance::Next(_) => {
                self.fms.constraint_passed = had_constraint;
                self.fms.countdown = self.fms.countdown.saturating_sub(1);
                self.activate(conf, wind);
            }
            Advance::End => {
                debug!("{:?} passed the last waypoint, disengaging LNAV", self.entity);
                if self.modes.vnav_speed
                    && let Some(speed) = self.leg.speed
                {
                    self.selected.speed = speed;
                }
                self.modes.lnav = false;
                self.modes.vnav = false;
                self.modes.vnav_speed = false;
                self.leg.is_last = true;
            }
        }
    }
}

fn sequence_system(
    time: Res<Time<time::Virtual>>,
    conf: ReadConfig<Conf>,
    wind: Res<Wind>,
    mut query: Query<SequenceQuery>,
    mut passed: MessageWriter<WaypointPassed>,
) {
    if time.is_paused() {
        return;
    }

    let conf = conf.read();

    for mut aircraft in &mut query {
        let Some(waypoint) = aircraft.route.active() else { continue };
        let position = waypoint.position;
        let kinematics = aircraft.kinematics;
        aircraft.fms.distance_to_waypoint = kinematics.position.distance(position);
        aircraft.fms.bearing_to_waypoint = kinematics.position.bearing(position);

        if aircraft.fms.reactivate {
            aircraft.fms.reactivate = false;
            aircraft.fms.recompute = false;
            aircraft.activate(&conf, &wind);
            continue;
        }
        if aircraft.fms.recompute {
            aircraft.fms.recompute = false;
            aircraft.compute_vnav(&conf, &wind);
        }

        if !aircraft.modes.lnav {
            continue;
        }

        let approach = leg::Approach {
            distance:      aircraft.fms.distance_to_waypoint,
            bearing:       aircraft.fms.bearing_to_waypoint,
            track:         kinematics.track,
            ground_speed:  kinematics.ground_speed,
            turn_distance: aircraft.leg.turn_distance,
            fly_over:      matches!(aircraft.leg.turn, TurnMode::FlyOver),
        };
        if approach.is_reached(conf.flyover_margin) {
            aircraft.pass(&conf, &wind, &mut passed);
        }
    }
}

#[derive(QueryData)]
#[query_data(mutable)]
struct RtaQuery {
    kinematics: &'static Kinematics,
    perf:       &'static Performance,
    route:      &'static Route,
    modes:      &'static Modes,
    leg:        &'static ActiveLeg,
    fms:        &'static FmsState,
    selected:   &'static mut Selected,
}

fn rta_system(time: Res<Time<time::Virtual>>, wind: Res<Wind>, mut query: Query<RtaQuery>) {
    if time.is_paused() {
        return;
    }

    let now = time.elapsed();

    query.par_iter_mut().for_each(|mut aircraft| {
        if aircraft.leg.speed.is_some() {
            return;
        }
        let Some(active) = aircraft.route.active_index() else { return };
        let Some((rta_index, rta)) = aircraft.route.next_rta(active) else { return };

        let kinematics = aircraft.kinematics;
        let distance =
            aircraft.fms.distance_to_waypoint + aircraft.route.distance_between(active, rta_index);
        let tailwind = wind.tailwind(kinematics.position, kinematics.altitude, kinematics.track);

        match rta::solve_cas(
            &isa(kinematics.altitude),
            kinematics.ground_speed,
            distance,
            rta.saturating_sub(now),
            aircraft.perf.max_accel(),
            tailwind,
        ) {
            Ok(cas) => {
                if aircraft.modes.vnav_speed {
                    aircraft.selected.speed = SpeedTarget::Cas(cas);
                }
            }
            Err(err) => trace!("RTA at waypoint {rta_index} not applied: {err}"),
        }
    });
}

#[derive(QueryData)]
#[query_data(mutable)]
struct VerticalQuery {
    kinematics: &'static Kinematics,
    modes:      &'static Modes,
    leg:        &'static ActiveLeg,
    fms:        &'static FmsState,
    takeoff:    Option<&'static Takeoff>,
    selected:   &'static mut Selected,
    guidance:   &'static mut Guidance,
}

fn vertical_system(
    time: Res<Time<time::Virtual>>,
    conf: ReadConfig<Conf>,
    mut query: Query<VerticalQuery>,
) {
    if time.is_paused() {
        return;
    }

    let conf = conf.read();

    query.par_iter_mut().for_each(|mut aircraft| {
        let kinematics = aircraft.kinematics;
        let fms = aircraft.fms;
        let distance = fms.distance_to_waypoint;

        let engage = if aircraft.modes.lnav {
            fms.countdown == 0 && fms.trigger.fires(distance)
        } else {
            distance <= VNAV_WITHOUT_LNAV_DISTANCE.max(aircraft.leg.turn_distance)
        };

        let mut vert_rate = None;
        if aircraft.modes.vnav
            && engage
            && let Some(target) = fms.target_altitude
        {
            aircraft.selected.altitude = target;
            vert_rate = Some(fms.vnav_rate.at(kinematics.ground_speed));
        }

        let altitude = aircraft.selected.altitude;
        let mut vert_rate = vert_rate.unwrap_or_else(|| {
            let rate = aircraft
                .selected
                .vert_rate
                .filter(|rate| rate.abs() > MIN_SELECTED_VERT_RATE)
                .unwrap_or(conf.default_vert_rate)
                .abs();
            if altitude < kinematics.altitude { -rate } else { rate }
        });

        if let Some(takeoff) = aircraft.takeoff {
            let holding = (altitude - kinematics.altitude).abs() < ALTITUDE_HOLD_TOLERANCE;
            if let Some(rate) = takeoff.vert_rate(kinematics.altitude, kinematics.cas, holding) {
                vert_rate = rate;
            }
        }

        aircraft.guidance.altitude = altitude;
        aircraft.guidance.vert_rate = vert_rate;
    });
}

#[derive(QueryData)]
#[query_data(mutable)]
struct SpeedQuery {
    kinematics: &'static Kinematics,
    perf:       &'static Performance,
    modes:      &'static Modes,
    manual:     &'static ManualOverride,
    takeoff:    Option<&'static Takeoff>,
    leg:        &'static mut ActiveLeg,
    fms:        &'static mut FmsState,
    selected:   &'static mut Selected,
}

fn speed_system(time: Res<Time<time::Virtual>>, mut query: Query<SpeedQuery>) {
    if time.is_paused() {
        return;
    }

    query.par_iter_mut().for_each(|mut aircraft| {
        let kinematics = aircraft.kinematics;
        let altitude = kinematics.altitude;
        let atmosphere = isa(altitude);
        let tas = kinematics.true_airspeed;
        let modes = *aircraft.modes;
        let managed = modes.lnav && modes.vnav && modes.vnav_speed;
        let distance = aircraft.fms.distance_to_waypoint;
        let max_accel = aircraft.perf.max_accel();

        let mut scheduled = schedule(aircraft.perf, altitude);
        if let Some(manual) = aircraft.manual.speed
            && scheduled.to_tas(&atmosphere)
                > manual.to_tas(&atmosphere) * SCHEDULE_OVERSPEED_RATIO
        {
            scheduled = manual;
        }

        let leg = &mut *aircraft.leg;

        let turn_speed = leg.turn_speed.filter(|_| leg.turn.is_fly_turn());
        let use_turn_speed = leg.turning_to_next
            || turn_speed.is_some_and(|cas| {
                let lookahead = leg::accel_distance(tas, atmosphere.cas_to_tas(cas), max_accel);
                managed && distance < lookahead + leg.turn_distance
            });
        leg.turning_to_next |= use_turn_speed;

        let use_next_speed = leg.next_speed.is_some_and(|next| {
            let lookahead = leg::accel_distance(tas, next.to_tas(&atmosphere), max_accel);
            managed
                && distance < lookahead
                && (!modes.descending
                    || scheduled.to_tas(&atmosphere) > next.to_tas(&atmosphere))
        });

        let track_error = kinematics.track.closest_distance(aircraft.fms.bearing_to_waypoint);
        let on_leg = track_error.abs() < ON_LEG_TOLERANCE;
        let old_turn_speed = leg.old_turn_speed.filter(|_| !on_leg);
        if on_leg {
            leg.old_turn_speed = None;
            aircraft.fms.bank = None;
        }
        leg.turning_from_last &= old_turn_speed.is_some();

        let mut speed = aircraft.selected.speed;
        if let Some(cas) = turn_speed.filter(|_| use_turn_speed) {
            speed = SpeedTarget::Cas(cas);
        } else if let Some(next) = leg.next_speed.filter(|_| use_next_speed) {
            speed = next;
        } else if let Some(constraint) = leg.speed.filter(|_| modes.vnav_speed) {
            let schedule_slower =
                scheduled.to_tas(&atmosphere) < constraint.to_tas(&atmosphere);
            speed = if schedule_slower && modes.descending { scheduled } else { constraint };
        } else if modes.vnav_speed && modes.descending {
            speed = scheduled;
        }

        if let Some(cas) = old_turn_speed.filter(|_| managed) {
            speed = SpeedTarget::Cas(cas);
        }

        if let Some(takeoff) = aircraft.takeoff {
            let constraint = leg.next_speed.map(|next| next.to_cas(&atmosphere));
            speed = SpeedTarget::Cas(takeoff.speed(altitude, constraint));
        }

        aircraft.selected.speed = speed;
    });
}

#[derive(QueryData)]
#[query_data(mutable)]
struct MaterializeQuery {
    kinematics: &'static Kinematics,
    route:      &'static Route,
    modes:      &'static Modes,
    selected:   &'static mut Selected,
    fms:        &'static FmsState,
    guidance:   &'static mut Guidance,
}

fn materialize_system(time: Res<Time<time::Virtual>>, mut query: Query<MaterializeQuery>) {
    if time.is_paused() {
        return;
    }

    query.par_iter_mut().for_each(|mut aircraft| {
        if aircraft.modes.lnav {
            aircraft.selected.heading = aircraft.fms.bearing_to_waypoint;
        }
        let selected = &*aircraft.selected;
        let guidance = &mut *aircraft.guidance;

        guidance.track = selected.heading;
        guidance.speed = selected.speed;
        guidance.true_airspeed = selected.speed.tas_at(aircraft.kinematics.altitude);
        guidance.bank = aircraft.fms.bank;
        guidance.mode = aircraft.fms.mode;

        guidance.active_index = aircraft.route.active_index();
        let name = aircraft.route.active().map(|waypoint| waypoint.name.as_str());
        if guidance.active_name.as_deref() != name {
            guidance.active_name = name.map(String::from);
        }
    });
}
