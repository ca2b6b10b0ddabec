//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - The scheduler clock is a discrete tick counter (`u64`), spaced one
//!   tick period apart (default 0.5 s)
//! - Elapsed simulated time is `tick * period` (seconds, f64)

mod catalogue;
mod error;
mod pacer;
mod record;
mod sink;

pub use catalogue::*;
pub use error::*;
pub use pacer::*;
pub use record::*;
pub use sink::*;
