#![cfg_attr(feature = "precommit-checks", deny(warnings, clippy::pedantic, clippy::dbg_macro))]

pub mod aircraft;
pub mod descent;
pub mod guidance;
pub mod perf;
pub mod route;
pub mod rta;
pub mod schedule;
pub mod speed;
pub mod takeoff;
pub mod try_log;
pub use try_log::TryLog;
pub mod wind;
