//! Sink implementations
//!
//! Contains LogSink, StompSink, and PgProcedureSink.

mod database;
mod log;
mod stomp;

pub use self::database::{PgProcedureSink, PgSinkConfig};
pub use self::log::LogSink;
pub use self::stomp::{StompSink, StompSinkConfig};
