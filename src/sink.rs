use std::fmt;

use http::{Response, StatusCode};

/// Error returned when writing body bytes to a sink fails.
///
/// # Examples
///
/// ```
/// use resilience_core::{SinkError, SinkErrorKind};
///
/// let error = SinkError::new(SinkErrorKind::Closed);
/// assert_eq!(error.kind(), SinkErrorKind::Closed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkError {
    kind: SinkErrorKind,
    message: Option<String>,
}

impl SinkError {
    /// Creates a new sink error with the specified kind.
    pub fn new(kind: SinkErrorKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    /// Creates a new sink error with a custom message.
    pub fn with_message(kind: SinkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: Some(message.into()),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> SinkErrorKind {
        self.kind
    }

    /// Returns the error message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(msg) = &self.message {
            write!(f, "sink error ({}): {}", self.kind, msg)
        } else {
            write!(f, "sink error ({})", self.kind)
        }
    }
}

impl std::error::Error for SinkError {}

/// Kind of sink error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkErrorKind {
    /// The underlying transport failed.
    Io,
    /// The response has already been finished.
    Closed,
}

impl fmt::Display for SinkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Closed => write!(f, "sink closed"),
        }
    }
}

/// The response-writing surface a handler talks to.
///
/// A sink has two operations: fixing the status line and streaming body
/// bytes. The host server provides the real sink; the fault injector hands
/// downstream handlers a [`ResponseGuard`](crate::ResponseGuard) that
/// implements the same trait.
///
/// Implementations are expected to follow the usual server conventions:
/// the first status committed wins, and writing body bytes before any
/// status commits `200 OK`.
pub trait ResponseSink {
    /// Commits the response status.
    fn commit_status(&mut self, status: StatusCode);

    /// Writes body bytes, returning how many were accepted.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the underlying transport rejects the write.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, SinkError>;
}

impl<S: ResponseSink + ?Sized> ResponseSink for &mut S {
    fn commit_status(&mut self, status: StatusCode) {
        (**self).commit_status(status);
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        (**self).write_bytes(data)
    }
}

impl<S: ResponseSink + ?Sized> ResponseSink for Box<S> {
    fn commit_status(&mut self, status: StatusCode) {
        (**self).commit_status(status);
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        (**self).write_bytes(data)
    }
}

/// An in-memory sink that records what a client would observe.
///
/// `RecordingSink` behaves like a server response: the first committed
/// status sticks, and a body write before any status implies `200 OK`. It
/// additionally counts how many times `commit_status` was called on it so
/// tests can verify that a wrapper commits exactly once.
///
/// # Examples
///
/// ```
/// use resilience_core::{RecordingSink, ResponseSink};
/// use http::StatusCode;
///
/// let mut sink = RecordingSink::new();
/// sink.write_bytes(b"hello").unwrap();
///
/// assert_eq!(sink.status(), Some(StatusCode::OK));
/// assert_eq!(sink.body(), b"hello");
/// ```
#[derive(Debug, Default)]
pub struct RecordingSink {
    status: Option<StatusCode>,
    body: Vec<u8>,
    commit_calls: usize,
    closed: bool,
}

impl RecordingSink {
    /// Creates an empty sink with no status committed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns how many times `commit_status` was called.
    pub fn commit_calls(&self) -> usize {
        self.commit_calls
    }

    /// Rejects any further body writes with [`SinkErrorKind::Closed`].
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Converts the recording into an `http::Response`.
    ///
    /// A sink that never saw a status or body yields `200 OK`, matching
    /// what a server sends when a handler returns without writing.
    pub fn into_response(self) -> Response<Vec<u8>> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        response
    }
}

impl ResponseSink for RecordingSink {
    fn commit_status(&mut self, status: StatusCode) {
        self.commit_calls += 1;
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        if self.closed {
            return Err(SinkError::new(SinkErrorKind::Closed));
        }
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
        Ok(data.len())
    }
}
