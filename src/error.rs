use std::fmt;

use crate::phase::Phase;
use crate::sink::SinkError;

/// Errors that can be returned by this crate.
///
/// Note that a policy returning an out-of-range decision is not represented
/// here: that is a programming error and aborts the request with an
/// [`InvalidDecision`] panic instead.
#[derive(Debug)]
pub enum Error {
    /// A built-in policy was configured with invalid parameters
    Config(ConfigError),
    /// Writing to a response sink failed
    Sink(SinkError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "configuration error: {}", e),
            Error::Sink(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Sink(e) => Some(e),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<SinkError> for Error {
    fn from(e: SinkError) -> Self {
        Error::Sink(e)
    }
}

/// A decision value outside `0` and `400..=599`.
///
/// This is the panic payload raised when a policy breaks its contract. It is
/// never converted into a response status. Tests can recover it with
/// `std::panic::catch_unwind` and `downcast_ref::<InvalidDecision>()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidDecision {
    /// The offending value returned by the policy
    pub value: i32,
    /// The decision point that produced it
    pub phase: Phase,
}

impl InvalidDecision {
    /// Creates a new invalid decision record.
    pub fn new(value: i32, phase: Phase) -> Self {
        Self { value, phase }
    }
}

impl fmt::Display for InvalidDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unexpected status code {} at {} decision",
            self.value, self.phase
        )
    }
}

impl std::error::Error for InvalidDecision {}

/// Invalid parameters passed to a built-in policy constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    kind: ConfigErrorKind,
    message: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    pub fn new(kind: ConfigErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ConfigErrorKind {
        self.kind
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// The kind of configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// A failure rate was not a probability in `[0, 1]`
    RateOutOfRange,
    /// A failure status was not in `400..=599`
    StatusOutOfRange,
}

impl fmt::Display for ConfigErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErrorKind::RateOutOfRange => write!(f, "rate out of range"),
            ConfigErrorKind::StatusOutOfRange => write!(f, "status out of range"),
        }
    }
}
