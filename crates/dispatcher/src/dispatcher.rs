//! Dispatcher - main loop draining the scheduler into a sink

use std::time::{Duration, Instant};

use contracts::{BroadcastError, BroadcastSink, Pacer};
use observability::{
    record_batch, record_record_sent, record_send_failure, EmissionAggregator, EmissionSummary,
};
use scheduler::Scheduler;
use tracing::{debug, info, instrument};

/// Summary of a finished (bounded) dispatch run
#[derive(Debug, Clone)]
pub struct DispatchStats {
    /// Records handed to the sink
    pub records_sent: u64,
    /// Ticks processed
    pub ticks: u64,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Per-destination emission summary
    pub summary: EmissionSummary,
}

impl DispatchStats {
    /// Average records per second over the run
    pub fn rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.records_sent as f64 / secs
        } else {
            0.0
        }
    }
}

/// The dispatcher: owns the sink handle, consumes the scheduler's sequence
pub struct Dispatcher<S> {
    sink: S,
    max_records: Option<u64>,
}

impl<S: BroadcastSink> Dispatcher<S> {
    /// Create a dispatcher over a sink
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            max_records: None,
        }
    }

    /// Stop after this many records (0 = unlimited)
    pub fn with_max_records(mut self, max_records: u64) -> Self {
        self.max_records = if max_records == 0 {
            None
        } else {
            Some(max_records)
        };
        self
    }

    /// Run the dispatch loop
    ///
    /// One tick at a time: build the batch, send every record in order,
    /// then pause for one period. Sink failures propagate unchanged; with
    /// no record bound the loop only ends on error or task cancellation.
    #[instrument(name = "dispatcher_run", skip_all, fields(sink = self.sink.name()))]
    pub async fn run<P: Pacer>(
        mut self,
        mut scheduler: Scheduler,
        mut pacer: P,
    ) -> Result<DispatchStats, BroadcastError> {
        let started = Instant::now();
        let period = scheduler.period();
        let mut aggregator = EmissionAggregator::new();
        let mut records_sent: u64 = 0;

        info!(
            sink = self.sink.name(),
            period_ms = period.as_millis() as u64,
            "Dispatcher started"
        );

        loop {
            let tick = scheduler.tick();
            let batch = scheduler.next_batch();
            record_batch(tick, batch.len());
            aggregator.update(batch.iter().map(|r| r.destination.as_str()));

            for record in &batch {
                if let Err(e) = self.sink.send(record).await {
                    record_record_sent(&record.destination, false);
                    record_send_failure(self.sink.name());
                    return Err(e);
                }
                record_record_sent(&record.destination, true);
                records_sent += 1;

                if records_sent.is_multiple_of(100) {
                    debug!(records = records_sent, "Dispatcher progress");
                }

                if self.max_records.is_some_and(|max| records_sent >= max) {
                    let stats = DispatchStats {
                        records_sent,
                        ticks: scheduler.tick(),
                        duration: started.elapsed(),
                        summary: aggregator.summary(),
                    };
                    info!(records = records_sent, "Record bound reached, closing sink");
                    self.sink.close().await?;
                    return Ok(stats);
                }
            }

            pacer.pause(period).await;
        }
    }
}
