//! Periodic scan scheduling.
//!
//! Runs one [`MonitorCycle`] per tick. Cycles never overlap: a tick that
//! falls due while a cycle is still running is skipped. Shutdown is only
//! observed between cycles, so an in-flight cycle always gets to save.

use std::future::Future;

use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::cycle::MonitorCycle;
use crate::error::Result;

pub struct MonitorScheduler {
    cycle: MonitorCycle,
    period: Duration,
}

impl MonitorScheduler {
    pub fn new(cycle: MonitorCycle, period: Duration) -> Self {
        Self { cycle, period }
    }

    /// Run cycles until `shutdown` resolves, then return the cycle.
    ///
    /// Cycle errors are logged and the loop continues on schedule. On
    /// shutdown a registry left unsaved by a failed cycle is saved once more;
    /// that final failure is the only error returned.
    pub async fn run<F>(mut self, shutdown: F) -> Result<MonitorCycle>
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        self.cycle.note("Network monitor started");
        tracing::info!(period_secs = self.period.as_secs(), "Scheduler started");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.cycle.run_once().await {
                tracing::error!(error = %e, "Monitor cycle failed");
            }
        }

        self.cycle.note("Monitor stopped by user");
        self.cycle.flush()?;
        Ok(self.cycle)
    }
}
