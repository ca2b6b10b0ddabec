//! Pacer trait - replaceable inter-tick delay strategy
//!
//! The scheduler's "sleep Δ between ticks" is injected so tests can drive
//! the tick loop without wall-clock waits.

use std::time::Duration;

/// Inter-tick pacing strategy
#[trait_variant::make(Pacer: Send)]
pub trait LocalPacer {
    /// Suspend for one tick period
    async fn pause(&mut self, period: Duration);
}
