//! Error types for geodetic operations.

use std::fmt;

use crate::Srs;

/// Errors that can occur when building georeferenced values.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    /// A value lies outside the range its container allows.
    OutOfRange {
        /// What was being checked.
        context: &'static str,
        /// The offending value.
        detail: String,
    },
    /// Extent coordinates are not finite or are inverted.
    InvalidExtent {
        /// Why the extent was rejected.
        detail: String,
    },
    /// The SRS definition string is not recognized.
    UnknownSrs(String),
    /// The profile name is not recognized.
    UnknownProfile(String),
    /// No horizontal transform exists between two SRSs.
    UnsupportedTransform {
        /// Source SRS.
        from: Srs,
        /// Target SRS.
        to: Srs,
    },
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { context, detail } => {
                write!(f, "{context} out of range: {detail}")
            }
            Self::InvalidExtent { detail } => write!(f, "invalid extent: {detail}"),
            Self::UnknownSrs(def) => write!(f, "unknown spatial reference \"{def}\""),
            Self::UnknownProfile(name) => write!(f, "unknown profile \"{name}\""),
            Self::UnsupportedTransform { from, to } => {
                write!(f, "no horizontal transform from {from} to {to}")
            }
        }
    }
}

impl std::error::Error for GeoError {}

/// Result type for geodetic operations.
pub type GeoResult<T> = Result<T, GeoError>;
