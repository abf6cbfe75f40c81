//! Unified error type.

use std::fmt;

/// The error type returned by squared's fallible operations.
///
/// Request-level failures (bad input, unknown route) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: binding the listener, registering metrics, or an
/// overrun shutdown grace period.
#[derive(Debug)]
pub enum Error {
    /// Binding or accepting on the TCP listener failed.
    Io(std::io::Error),
    /// A metric could not be registered (duplicate name).
    Metrics(prometheus::Error),
    /// In-flight connections did not drain within the shutdown grace period.
    ShutdownTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Metrics(e) => write!(f, "metrics: {e}"),
            Self::ShutdownTimeout => f.write_str("graceful shutdown timed out"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Metrics(e) => Some(e),
            Self::ShutdownTimeout => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<prometheus::Error> for Error {
    fn from(e: prometheus::Error) -> Self {
        Self::Metrics(e)
    }
}
