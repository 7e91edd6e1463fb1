use crate::{Length, Speed};

/// A unit that guidance logs or configures a quantity in.
pub trait UnitEnum: Copy + Into<&'static str> {
    type Quantity;

    /// Magnitude of `quantity` expressed in this unit.
    fn magnitude(self, quantity: Self::Quantity) -> f32;
}

/// Units of altitudes and along-track distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
pub enum LengthUnit {
    #[strum(serialize = "ft")]
    Feet,
    #[strum(serialize = "nmi")]
    NauticalMiles,
}

impl UnitEnum for LengthUnit {
    type Quantity = Length<f32>;

    fn magnitude(self, quantity: Length<f32>) -> f32 {
        match self {
            Self::Feet => quantity.into_feet(),
            Self::NauticalMiles => quantity.into_nm(),
        }
    }
}

/// Units of airspeeds and vertical rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr)]
pub enum SpeedUnit {
    #[strum(serialize = "kn")]
    Knots,
    #[strum(serialize = "fpm")]
    FeetPerMinute,
}

impl UnitEnum for SpeedUnit {
    type Quantity = Speed<f32>;

    fn magnitude(self, quantity: Speed<f32>) -> f32 {
        match self {
            Self::Knots => quantity.into_knots(),
            Self::FeetPerMinute => quantity.into_fpm(),
        }
    }
}

/// Formats a quantity with the suffix of the unit.
pub fn format_with_unit<U: UnitEnum>(unit: U, value: U::Quantity) -> String {
    let suffix: &'static str = unit.into();
    format!("{:.1} {suffix}", unit.magnitude(value))
}
