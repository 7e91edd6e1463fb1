//! Error-logging fallbacks for values that guidance expects to be present.
//!
//! A missing value here indicates a bug elsewhere, but a single broken aircraft
//! must not stop the guidance loop, so the expectation is logged and the caller bails out.

use std::fmt;

/// Evaluates to the value of `$expr`,
/// or logs the formatted expectation and evaluates `$otherwise` instead.
///
/// ```ignore
/// let waypoint = try_log!(route.get(index), expect "waypoint {} exists" (index) or continue);
/// ```
#[macro_export]
macro_rules! try_log {
    (
        $expr:expr,
        expect $expectation:literal $(($($arg:expr),* $(,)?))?
        or $otherwise:expr
    ) => {
        match $crate::TryLog::ok_or_log(
            $expr,
            format_args!($expectation $(, $($arg),*)?),
        ) {
            Some(value) => value,
            None => $otherwise,
        }
    };
}

pub use try_log;

/// Shorthand for [`try_log!`] that returns from the enclosing function.
#[macro_export]
macro_rules! try_log_return {
    ($expr:expr, expect $expectation:literal $(, $($arg:expr),*)? $(,)?) => {
        $crate::try_log!($expr, expect $expectation $(($($arg),*))? or return)
    };
}

pub use try_log_return;

/// A fallible value accepted by [`try_log!`].
pub trait TryLog<T>: Sized {
    /// Converts to `Some` on success, or logs `expectation` with the failure reason.
    fn ok_or_log(self, expectation: fmt::Arguments<'_>) -> Option<T>;
}

impl<T> TryLog<T> for Option<T> {
    fn ok_or_log(self, expectation: fmt::Arguments<'_>) -> Option<T> {
        if self.is_none() {
            bevy::log::error!("Expected {expectation}");
        }
        self
    }
}

impl<T, E: fmt::Display> TryLog<T> for Result<T, E> {
    fn ok_or_log(self, expectation: fmt::Arguments<'_>) -> Option<T> {
        self.inspect_err(|err| bevy::log::error!("Expected {expectation}: {err}")).ok()
    }
}
