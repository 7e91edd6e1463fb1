//! Descent path computation.
//!
//! [`profile`] tabulates the nominal descent performance of one aircraft per 100 ft of altitude.
//! [`planner`] walks the route against that table to place the top of descent.

pub mod planner;
pub mod profile;

pub use planner::{DescentCarry, DescentPlan, PlanInput, PlanMode, plan};
pub use profile::{DecelCorrection, DecelSegment, DescentTable, SEGMENT_HEIGHT, Segment};

#[cfg(test)]
mod tests;
