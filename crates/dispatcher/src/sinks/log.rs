//! LogSink - logs each record via tracing

use contracts::{BroadcastError, BroadcastSink, EmittedRecord};
use tracing::{info, instrument};

/// Sink that logs records for dry-runs and debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl BroadcastSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_send",
        skip(self, record),
        fields(sink = %self.name, destination = %record.destination)
    )]
    async fn send(&mut self, record: &EmittedRecord) -> Result<(), BroadcastError> {
        info!(
            sink = %self.name,
            destination = %record.destination,
            instrument = record.instrument.as_deref().unwrap_or("-"),
            name = record.name.as_deref().unwrap_or("-"),
            value = %record.value,
            "Record emitted"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), BroadcastError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
