//! Liveness monitor
//!
//! Probes every registered connection on a fixed interval and evicts the
//! ones that did not answer the previous probe.

use crate::connection::{ConnectionRegistry, Liveness};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Outcome of one monitor tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Connections that were sent a probe
    pub probed: usize,
    /// Connections closed and removed for not answering
    pub evicted: usize,
}

/// Periodic ping/pong liveness monitor
pub struct LivenessMonitor {
    /// Registry being monitored
    registry: Arc<ConnectionRegistry>,
    /// Tick period
    interval: Duration,
    /// Cancelled on stop
    cancel: CancellationToken,
    /// Background task, present while running
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LivenessMonitor {
    /// Create a monitor; nothing runs until [`start`](Self::start)
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>, interval: Duration) -> Self {
        Self {
            registry,
            interval,
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// Spawn the ticking task
    ///
    /// The first tick fires one full interval after start. Starting twice,
    /// or after [`stop`](Self::stop), does nothing.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.task.lock();
        if task.is_some() || self.cancel.is_cancelled() {
            tracing::warn!("Liveness monitor already started or stopped");
            return;
        }

        let monitor = Arc::clone(self);
        *task = Some(tokio::spawn(async move {
            monitor.run().await;
        }));

        tracing::info!(interval_ms = self.interval.as_millis(), "Liveness monitor started");
    }

    /// Cancel the ticking task; repeated calls are no-ops
    pub fn stop(&self) {
        let Some(task) = self.task.lock().take() else {
            self.cancel.cancel();
            return;
        };

        self.cancel.cancel();
        // the loop exits at its next poll; abort covers a tick in progress
        task.abort();

        tracing::info!("Liveness monitor stopped");
    }

    /// Check if the ticking task is running
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && self.task.lock().is_some()
    }

    /// Get the tick period
    pub fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep();
                }
            }
        }

        tracing::debug!("Liveness monitor loop ended");
    }

    /// Run one tick
    ///
    /// Alive connections move to pending and get a probe; connections still
    /// pending from the previous tick are closed and unregistered.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for connection in self.registry.snapshot() {
            match connection.begin_probe() {
                Liveness::Alive => {
                    report.probed += 1;
                    if let Err(e) = connection.probe() {
                        tracing::debug!(
                            client_id = %connection.id(),
                            error = %e,
                            "Failed to send probe"
                        );
                    }
                }
                Liveness::PendingProbe => {
                    tracing::info!(
                        client_id = %connection.id(),
                        age_ms = connection.age().as_millis(),
                        "Evicting unresponsive connection"
                    );
                    connection.close();
                    self.registry.unregister(connection.id());
                    report.evicted += 1;
                }
            }
        }

        if report.evicted > 0 {
            tracing::info!(
                probed = report.probed,
                evicted = report.evicted,
                "Liveness sweep evicted connections"
            );
        } else {
            tracing::trace!(probed = report.probed, "Liveness sweep");
        }

        report
    }
}

impl Drop for LivenessMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for LivenessMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivenessMonitor")
            .field("interval", &self.interval)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
