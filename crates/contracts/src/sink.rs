//! BroadcastSink trait - dispatcher output interface
//!
//! Defines the abstract interface for sinks.

use crate::{BroadcastError, EmittedRecord};

/// Record output trait
///
/// All sink implementations must implement this trait. Connection setup,
/// retry policy and credentials belong to the implementation; `send` is
/// expected to surface failures rather than swallow them, since the
/// dispatcher stops on the first error.
#[trait_variant::make(BroadcastSink: Send)]
pub trait LocalBroadcastSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Transmit one record
    ///
    /// # Errors
    /// Returns send error (should include context)
    async fn send(&mut self, record: &EmittedRecord) -> Result<(), BroadcastError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), BroadcastError>;
}
