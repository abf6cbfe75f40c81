//! Listener configuration from the environment.

use std::net::SocketAddr;

use tracing::warn;

/// Port used when `PORT` is unset or unparseable.
pub const DEFAULT_PORT: u16 = 8080;

/// Runtime configuration. Read once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
}

impl Config {
    /// Reads `PORT` from the environment, falling back to [`DEFAULT_PORT`].
    pub fn from_env() -> Self {
        Self::from_port(std::env::var("PORT").ok().as_deref())
    }

    fn from_port(value: Option<&str>) -> Self {
        let port = match value {
            Some(raw) => match raw.parse() {
                Ok(port) => port,
                Err(_) => {
                    warn!(value = raw, "unparseable PORT, using {DEFAULT_PORT}");
                    DEFAULT_PORT
                }
            },
            None => DEFAULT_PORT,
        };
        Self { port }
    }

    /// Address the listener binds: all interfaces, configured port.
    pub fn addr(self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}
