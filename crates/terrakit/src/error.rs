//! Error types for the terrakit crate.

use std::fmt;

use terrakit_geo::GeoError;

/// Result type for terrakit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in terrakit operations.
#[derive(Debug)]
pub enum Error {
    /// A georeferenced value could not be built.
    Geo(GeoError),
    /// A configuration value is missing or malformed.
    Config {
        /// The configuration key involved.
        key: String,
        /// Description of what was wrong.
        detail: String,
    },
    /// Serializing or parsing a configuration document failed.
    Serialization {
        /// Context for where the error occurred.
        context: &'static str,
        /// The error message.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Geo(e) => write!(f, "geo error: {e}"),
            Error::Config { key, detail } => write!(f, "invalid config \"{key}\": {detail}"),
            Error::Serialization { context, message } => {
                write!(f, "failed to serialize {context}: {message}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Geo(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GeoError> for Error {
    fn from(e: GeoError) -> Self {
        Error::Geo(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization {
            context: "config",
            message: e.to_string(),
        }
    }
}
