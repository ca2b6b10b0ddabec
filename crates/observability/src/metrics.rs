//! Emission metric helpers
//!
//! Recorded per tick and per record sent; aggregated in memory for the
//! end-of-run summary.

use std::collections::HashMap;

use metrics::{counter, gauge, histogram};

/// Record one scheduler batch
///
/// Called once per tick, after the due-set is built.
pub fn record_batch(tick: u64, due: usize) {
    counter!("broadcaster_ticks_total").increment(1);
    gauge!("broadcaster_last_tick").set(tick as f64);
    histogram!("broadcaster_batch_size").record(due as f64);
}

/// Record one record handed to a sink
pub fn record_record_sent(destination: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "broadcaster_records_dispatched_total",
        "destination" => destination.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a failed send before the dispatch loop unwinds
pub fn record_send_failure(sink_name: &str) {
    counter!(
        "broadcaster_send_failures_total",
        "sink" => sink_name.to_string()
    )
    .increment(1);
}

/// Emission aggregator
///
/// Aggregates in memory for statistics and summary output.
#[derive(Debug, Clone, Default)]
pub struct EmissionAggregator {
    /// Ticks processed
    pub ticks: u64,
    /// Records sent
    pub total_records: u64,
    /// Empty batches (no item due that tick)
    pub idle_ticks: u64,
    /// Records sent per destination
    pub per_destination: HashMap<String, u64>,
}

impl EmissionAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Update aggregate statistics with one tick's batch
    pub fn update<'a>(&mut self, destinations: impl IntoIterator<Item = &'a str>) {
        self.ticks += 1;
        let mut due = 0u64;
        for destination in destinations {
            due += 1;
            *self
                .per_destination
                .entry(destination.to_string())
                .or_insert(0) += 1;
        }
        self.total_records += due;
        if due == 0 {
            self.idle_ticks += 1;
        }
    }

    /// Generate a summary report
    pub fn summary(&self) -> EmissionSummary {
        EmissionSummary {
            ticks: self.ticks,
            total_records: self.total_records,
            idle_ticks: self.idle_ticks,
            records_per_tick: if self.ticks > 0 {
                self.total_records as f64 / self.ticks as f64
            } else {
                0.0
            },
            per_destination: self.per_destination.clone(),
        }
    }

    /// Reset statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Emission summary
#[derive(Debug, Clone, Default)]
pub struct EmissionSummary {
    pub ticks: u64,
    pub total_records: u64,
    pub idle_ticks: u64,
    pub records_per_tick: f64,
    pub per_destination: HashMap<String, u64>,
}
