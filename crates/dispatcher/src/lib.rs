//! # Dispatcher
//!
//! Record dispatch module.
//!
//! Responsibilities:
//! - Drain the scheduler's per-tick batches
//! - Forward each record to the sink, one at a time, in emission order
//! - Pace the tick loop via the injected `Pacer`
//!
//! The dispatcher does not batch, reorder, deduplicate or retry: the first
//! sink failure propagates and stops the run.

pub mod dispatcher;
pub mod pacer;
pub mod sinks;

pub use contracts::{BroadcastSink, EmittedRecord, Pacer};
pub use dispatcher::{DispatchStats, Dispatcher};
pub use pacer::{NoopPacer, TokioPacer};
pub use sinks::{LogSink, PgProcedureSink, PgSinkConfig, StompSink, StompSinkConfig};
