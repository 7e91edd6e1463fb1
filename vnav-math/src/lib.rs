use std::fmt;

mod units;
pub use units::*;

mod atmosphere;
pub use atmosphere::*;

pub mod geo;

/// Returned by `assert_near` when two values are further apart than the tolerance.
#[derive(Debug, thiserror::Error)]
#[error("{actual:?} is not within {epsilon:?} of {expect:?}")]
pub struct AssertApproxError<T: fmt::Debug, E: fmt::Debug = T> {
    pub actual:  T,
    pub expect:  T,
    pub epsilon: E,
}

impl<Base, Dt> Quantity<f32, Base, Dt>
where
    Self: fmt::Debug,
{
    /// Checks that `self` is within `epsilon` of `other`.
    pub fn assert_near(self, other: Self, epsilon: Self) -> Result<(), AssertApproxError<Self>> {
        if (self - other).abs() > epsilon || !self.is_finite() {
            Err(AssertApproxError { actual: self, expect: other, epsilon })
        } else {
            Ok(())
        }
    }
}

impl Position<f32> {
    /// Checks that `self` is within `epsilon` of `other`.
    pub fn assert_near(
        self,
        other: Self,
        epsilon: Length<f32>,
    ) -> Result<(), AssertApproxError<Self, Length<f32>>> {
        if (self - other).abs() > epsilon || !self.0.is_finite() {
            Err(AssertApproxError { actual: self, expect: other, epsilon })
        } else {
            Ok(())
        }
    }
}

impl Heading {
    /// Checks that `self` is within `epsilon` of `other` in either direction.
    pub fn assert_near(
        self,
        other: Self,
        epsilon: Angle,
    ) -> Result<(), AssertApproxError<Self, Angle>> {
        if self.closest_distance(other).abs() > epsilon {
            Err(AssertApproxError { actual: self, expect: other, epsilon })
        } else {
            Ok(())
        }
    }
}
