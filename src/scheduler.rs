//! Expiry scheduler
//!
//! The session machine never reads the clock to decide expiry; this
//! collaborator does. On a fixed tick it compares the injected clock against
//! the active poll's deadline and invokes the (idempotent) expire operation
//! once the deadline has passed. [`ExpiryScheduler::tick`] is a plain call so
//! tests drive it directly with a manual clock; [`ExpiryScheduler::spawn`]
//! wraps it in a background task for real deployments.

use crate::clock::Clock;
use crate::session::SessionHandle;
use crate::store::SnapshotStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default tick period; the one-second cadence a countdown display needs.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct ExpiryScheduler<S, C, K> {
    session: SessionHandle<S, C>,
    clock: K,
    period: Duration,
}

impl<S, C, K> ExpiryScheduler<S, C, K>
where
    S: SnapshotStore,
    C: Clock,
    K: Clock,
{
    pub fn new(session: SessionHandle<S, C>, clock: K) -> Self {
        Self {
            session,
            clock,
            period: DEFAULT_TICK_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Run one expiry check. Returns whether this check closed the poll.
    pub fn tick(&self) -> bool {
        match self.session.active_deadline() {
            Some(deadline) if self.clock.now() >= deadline => self.session.expire_poll(),
            _ => false,
        }
    }

    /// Tick until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                () = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if self.tick() {
                        tracing::debug!("Expiry tick closed the current poll");
                    }
                }
            }
        }
    }

    /// Spawn [`Self::run`] as a background task.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()>
    where
        S: 'static,
        C: 'static,
        K: 'static,
    {
        tokio::spawn(self.run(shutdown))
    }
}
