//! Repeating tasks bound to a view's lifetime.

use std::future::Future;
use std::time::Duration;

use telemetry::metrics;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default refresh period of the notifications feed.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest period a poller runs at. Shorter periods are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Poller configuration.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between ticks. The first tick fires immediately.
    pub period: Duration,
    /// Name used in logs.
    pub name: &'static str,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_POLL_INTERVAL,
            name: "poller",
        }
    }
}

/// Runs a tick closure on a fixed period until its token is cancelled.
pub struct Poller {
    config: PollerConfig,
}

impl Poller {
    pub fn new(mut config: PollerConfig) -> Self {
        config.period = config.period.max(MIN_POLL_INTERVAL);
        Self { config }
    }

    pub fn every(period: Duration) -> Self {
        Self::new(PollerConfig {
            period,
            ..Default::default()
        })
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    /// Spawns the polling task.
    ///
    /// `tick` receives the 1-based tick number. A tick in flight when the
    /// token is cancelled is dropped, and no further tick starts.
    pub fn spawn<F, Fut>(self, token: CancellationToken, mut tick: F) -> JoinHandle<u64>
    where
        F: FnMut(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let PollerConfig { period, name } = self.config;
        tokio::spawn(async move {
            metrics().active_pollers.inc();
            info!(poller = name, period_ms = period.as_millis() as u64, "Poller started");

            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks = 0u64;

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                ticks += 1;
                metrics().poll_ticks.inc();
                debug!(poller = name, tick = ticks, "Poll tick");

                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tick(ticks) => {}
                }
            }

            metrics().active_pollers.dec();
            info!(poller = name, ticks, "Poller stopped");
            ticks
        })
    }
}
