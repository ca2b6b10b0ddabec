//! Pacer implementations.

use std::time::Duration;

use contracts::Pacer;

/// Wall-clock pacing: suspends for one tick period between batches
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

impl Pacer for TokioPacer {
    async fn pause(&mut self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// No-op pacing, for tests and bounded dry-runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPacer;

impl Pacer for NoopPacer {
    async fn pause(&mut self, _period: Duration) {}
}
