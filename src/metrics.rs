//! Prometheus metrics for the service.
//!
//! One registry, explicitly owned, constructed at startup and shared by
//! `Arc` between the router wiring and the handlers that record events. No
//! global or default registry is touched.

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::error::Error;

/// The service metrics registry.
///
/// Counters are atomic; recording from concurrent request tasks needs no
/// locking and loses no updates.
pub struct Metrics {
    registry: Registry,
    square_calls: IntCounter,
}

impl Metrics {
    /// Registers all service metrics with a fresh registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (duplicate names).
    pub fn new() -> Result<Self, Error> {
        let registry = Registry::new();

        let square_calls = IntCounter::new(
            "square_endpoint_total_calls",
            "The total number of times square endpoint was called",
        )?;
        registry.register(Box::new(square_calls.clone()))?;

        Ok(Self {
            registry,
            square_calls,
        })
    }

    /// Counts one call to the square endpoint. Incremented on entry, so
    /// calls that fail input validation are counted too.
    pub fn record_square_call(&self) {
        self.square_calls.inc();
    }

    /// Renders every registered metric in the Prometheus text exposition
    /// format.
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            tracing::error!("failed to encode metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
