//! Tick-driven due-set generator.
//!
//! The "runs forever" broadcast loop is modeled as an explicit state
//! machine: state is the tick counter plus the compiled catalogue, and
//! `next_batch` produces one tick's worth of due records. Pacing between
//! ticks lives in the dispatcher, so batches can be produced and tested
//! without wall-clock waits.

use std::time::Duration;

use contracts::{BroadcastError, Catalogue, EmittedRecord, PayloadSource, SignalValue};
use tracing::{instrument, trace};

use crate::expr::Template;

/// Default tick period Δ: the finest granularity any item's frequency can
/// be honored at.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
enum CompiledPayload {
    Literal(SignalValue),
    Template(Template),
}

#[derive(Debug, Clone)]
struct CompiledItem {
    /// Ticks between successive emissions; 0 marks a one-shot item
    skip: u64,
    instrument: Option<String>,
    name: Option<String>,
    payload: CompiledPayload,
}

#[derive(Debug, Clone)]
struct CompiledDestination {
    destination: String,
    items: Vec<CompiledItem>,
}

/// Frequency-driven scheduling generator
///
/// Produces one eagerly-built, ordered batch of due records per tick.
/// Deterministic: two schedulers over the same catalogue produce identical
/// tick-aligned schedules from tick 0. There is no way to resume a
/// scheduler mid-run; recreating one restarts at tick 0 (which also
/// re-fires one-shot items).
#[derive(Debug)]
pub struct Scheduler {
    plan: Vec<CompiledDestination>,
    period: Duration,
    tick: u64,
}

impl Scheduler {
    /// Compile a catalogue with the default tick period
    ///
    /// # Errors
    /// Fails when an item's expression template does not parse; the error
    /// names the offending destination and item.
    pub fn new(catalogue: &Catalogue) -> Result<Self, BroadcastError> {
        Self::with_period(catalogue, DEFAULT_TICK_PERIOD)
    }

    /// Compile a catalogue with a custom tick period
    pub fn with_period(catalogue: &Catalogue, period: Duration) -> Result<Self, BroadcastError> {
        if period.is_zero() {
            return Err(BroadcastError::catalogue_validation(
                "tick period",
                "tick period must be > 0",
            ));
        }

        let delta = period.as_secs_f64();
        let mut plan = Vec::with_capacity(catalogue.len());

        for entry in catalogue {
            let mut items = Vec::with_capacity(entry.items.len());
            for (idx, item) in entry.items.iter().enumerate() {
                let payload = match &item.payload {
                    PayloadSource::Literal(value) => {
                        CompiledPayload::Literal(SignalValue::Json(value.clone()))
                    }
                    PayloadSource::Expression(template) => {
                        let compiled = Template::parse(template).map_err(|e| {
                            BroadcastError::expression(
                                entry.destination.clone(),
                                item.name
                                    .clone()
                                    .unwrap_or_else(|| format!("item[{idx}]")),
                                e.to_string(),
                            )
                        })?;
                        CompiledPayload::Template(compiled)
                    }
                };

                items.push(CompiledItem {
                    // Quantize frequency to whole ticks, rounding up; only
                    // an exact zero stays zero (one-shot)
                    skip: (item.frequency / delta).ceil() as u64,
                    instrument: item.instrument.clone(),
                    name: item.name.clone(),
                    payload,
                });
            }
            plan.push(CompiledDestination {
                destination: entry.destination.clone(),
                items,
            });
        }

        Ok(Self {
            plan,
            period,
            tick: 0,
        })
    }

    /// Current tick (the one the next batch will be built for)
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Tick period Δ
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Build the due-set for an arbitrary tick without advancing state
    ///
    /// Destinations iterate in catalogue order, items in list order.
    /// Values resolve at yield time against elapsed time `tick * Δ`.
    pub fn batch_for(&self, tick: u64) -> Vec<EmittedRecord> {
        let elapsed = tick as f64 * self.period.as_secs_f64();
        let mut batch = Vec::new();

        for dest in &self.plan {
            for item in &dest.items {
                let due = if item.skip == 0 {
                    tick == 0
                } else {
                    tick % item.skip == 0
                };
                if !due {
                    continue;
                }

                let value = match &item.payload {
                    CompiledPayload::Literal(value) => value.clone(),
                    CompiledPayload::Template(template) => template.eval(elapsed),
                };

                batch.push(EmittedRecord {
                    destination: dest.destination.clone(),
                    instrument: item.instrument.clone(),
                    name: item.name.clone(),
                    value,
                });
            }
        }

        batch
    }

    /// Produce the batch for the current tick, then advance the counter
    #[instrument(level = "trace", name = "scheduler_next_batch", skip(self), fields(tick = self.tick))]
    pub fn next_batch(&mut self) -> Vec<EmittedRecord> {
        let batch = self.batch_for(self.tick);
        trace!(tick = self.tick, due = batch.len(), "Batch built");
        self.tick += 1;
        batch
    }
}
