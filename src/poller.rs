//! Generic background polling of stateless external APIs.
//!
//! A [`BackgroundPoller`] fetches on a fixed interval, drops items it has
//! already handled, and hands the rest to a [`PollHandler`] in fetch order.
//! A failed fetch is logged and retried on the next tick. Cancellation is
//! observed while waiting, never in the middle of a fetch/handle cycle.

use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::dedup::DeduplicationTracker;
use crate::error::Result;
use crate::shutdown::ShutdownListener;

/// An external API that lists recent items.
#[async_trait]
pub trait PollSource: Send + Sync {
    /// The item type returned by one fetch.
    type Item: Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch the most recent items, oldest first.
    async fn fetch(&self) -> Result<Vec<Self::Item>>;

    /// Stable identifier used for deduplication.
    fn item_id(&self, item: &Self::Item) -> String;
}

/// Receives each new item exactly once per process lifetime.
#[async_trait]
pub trait PollHandler<T>: Send + Sync {
    /// Handle one new item.
    async fn handle(&self, item: T);
}

/// Tuning for one poller instance.
#[derive(Debug, Clone, Copy)]
pub struct PollerOptions {
    /// Time between fetches.
    pub interval: Duration,
    /// How many handled ids to remember.
    pub dedup_capacity: usize,
    /// Record the first successful fetch without handling it, so a restart
    /// does not replay history.
    pub prime_on_start: bool,
}

/// Cancellable fetch → dedup → handle loop.
pub struct BackgroundPoller<S, H> {
    source: S,
    handler: H,
    options: PollerOptions,
    seen: DeduplicationTracker,
    primed: bool,
}

impl<S, H> BackgroundPoller<S, H>
where
    S: PollSource + 'static,
    H: PollHandler<S::Item> + 'static,
{
    /// Build a poller; nothing runs until [`BackgroundPoller::spawn`] or [`BackgroundPoller::run`].
    pub fn new(source: S, handler: H, options: PollerOptions) -> Self {
        Self {
            source,
            handler,
            seen: DeduplicationTracker::new(options.dedup_capacity),
            primed: !options.prime_on_start,
            options,
        }
    }

    /// Run on its own task.
    pub fn spawn(self, shutdown: ShutdownListener) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Poll until `shutdown` fires.
    pub async fn run(mut self, mut shutdown: ShutdownListener) {
        let name = self.source.name();
        info!(source = name, interval_secs = self.options.interval.as_secs(), "poller started");

        let mut tick = interval(self.options.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                () = shutdown.triggered() => break,
            }
            match self.poll_once().await {
                Ok(0) => {}
                Ok(handled) => debug!(source = name, handled, "poll handled new items"),
                Err(e) => warn!(source = name, error = %e, "poll failed; retrying next interval"),
            }
        }
        info!(source = name, "poller stopping");
    }

    /// One fetch/handle cycle. Returns how many items reached the handler.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let items = self.source.fetch().await?;

        if !self.primed {
            for item in &items {
                self.seen.record(self.source.item_id(item));
            }
            self.primed = true;
            debug!(source = self.source.name(), primed = items.len(), "recorded backlog without handling");
            return Ok(0);
        }

        let mut handled = 0;
        for item in items {
            let id = self.source.item_id(&item);
            if self.seen.seen(&id) {
                continue;
            }
            self.handler.handle(item).await;
            self.seen.record(id);
            handled += 1;
        }
        Ok(handled)
    }
}
