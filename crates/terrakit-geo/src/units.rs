//! Linear and angular units.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Meters spanned by one degree of longitude at the equator (WGS84).
pub const METERS_PER_DEGREE: f64 = 111_319.490_793_273_57;

/// Units of an SRS axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Degrees,
    Meters,
}

impl Units {
    /// Meters represented by one of these units, measured at the equator.
    #[must_use]
    pub fn to_meters(self) -> f64 {
        match self {
            Self::Degrees => METERS_PER_DEGREE,
            Self::Meters => 1.0,
        }
    }

    /// Convert `value` expressed in these units into `to` units.
    ///
    /// Angular/linear conversion uses the equatorial approximation, which is
    /// what resolution comparisons across profiles expect.
    #[must_use]
    pub fn convert_to(self, to: Units, value: f64) -> f64 {
        if self == to {
            value
        } else {
            value * self.to_meters() / to.to_meters()
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degrees => f.write_str("degrees"),
            Self::Meters => f.write_str("meters"),
        }
    }
}
