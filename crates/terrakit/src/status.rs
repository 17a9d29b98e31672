//! Status values stored on long-lived objects such as layers.

use std::fmt;

/// Category of a [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusCode {
    /// The operation succeeded.
    #[default]
    NoError,
    /// A needed resource could not be reached, or the request was canceled.
    ResourceUnavailable,
    /// The object cannot provide the requested service.
    ServiceUnavailable,
    /// Settings or metadata are invalid.
    ConfigurationError,
    /// Any other failure.
    GeneralError,
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoError => "no error",
            Self::ResourceUnavailable => "resource unavailable",
            Self::ServiceUnavailable => "service unavailable",
            Self::ConfigurationError => "configuration error",
            Self::GeneralError => "general error",
        };
        f.write_str(name)
    }
}

/// Outcome of an operation, kept on the object it describes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Status {
    code: StatusCode,
    message: String,
}

impl Status {
    /// A successful status.
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    /// A failed status with a message.
    #[must_use]
    pub fn error(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Whether the code is [`StatusCode::NoError`].
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::NoError
    }

    /// Whether the status reports a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        !self.is_ok()
    }

    /// Category of the outcome.
    #[must_use]
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Human-readable detail; empty on success.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}
