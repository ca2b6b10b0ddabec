//! # Scheduler
//!
//! Frequency-driven scheduling generator - the core of the broadcaster.
//!
//! Responsibilities:
//! - Convert a catalogue plus a discrete tick counter into ordered,
//!   per-tick batches of due records
//! - Compile and evaluate the closed expression mini-language for
//!   value templates
//!
//! ## Usage
//!
//! ```
//! use contracts::Catalogue;
//! use scheduler::Scheduler;
//!
//! let catalogue: Catalogue = serde_json::from_str(
//!     r#"{"queue": [{"frequency": 1, "message": "ping"}]}"#,
//! ).unwrap();
//!
//! let mut scheduler = Scheduler::new(&catalogue).unwrap();
//! let batch = scheduler.next_batch();
//! assert_eq!(batch[0].destination, "queue");
//! ```

mod expr;
mod scheduler;

pub use crate::scheduler::{Scheduler, DEFAULT_TICK_PERIOD};
pub use expr::{ExprError, Template};

// Re-export contracts types
pub use contracts::{Catalogue, EmittedRecord, SignalValue};
