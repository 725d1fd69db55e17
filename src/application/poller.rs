//! Drives metric collection for every group in the catalog.
//!
//! One-shot groups run once, concurrently, during [`Poller::start`]. Each
//! periodic group then gets its own task with its own timer; a group never has
//! more than one collection in flight and ticks that fire during a slow
//! collection are skipped rather than queued.

use crate::application::collection;
use crate::domain::catalog::{MetricCatalog, MetricGroup};
use crate::domain::errors::StatError;
use crate::domain::ports::{Emitter, StatSource};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub struct Poller {
    catalog: Arc<MetricCatalog>,
    source: Arc<dyn StatSource>,
    emitter: Arc<dyn Emitter>,
}

impl Poller {
    pub fn new(
        catalog: Arc<MetricCatalog>,
        source: Arc<dyn StatSource>,
        emitter: Arc<dyn Emitter>,
    ) -> Self {
        Self {
            catalog,
            source,
            emitter,
        }
    }

    /// Collects every one-shot group, then starts one timer task per periodic group.
    ///
    /// One-shot groups are complete by the time this returns, so they always
    /// precede the first periodic tick.
    pub async fn start(self) -> PollerHandle {
        let manual = self.catalog.manual_groups().map(|group| {
            run_group(
                group,
                &self.catalog,
                self.source.as_ref(),
                self.emitter.as_ref(),
            )
        });
        let manual_samples: usize = join_all(manual).await.into_iter().sum();
        info!(
            "Poller: One-shot groups collected ({} samples)",
            manual_samples
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = Vec::new();

        for group in self.catalog.polling_groups() {
            let Some(period) = group.interval() else {
                continue;
            };

            tasks.push(tokio::spawn(poll_group(
                group.clone(),
                period,
                Arc::clone(&self.catalog),
                Arc::clone(&self.source),
                Arc::clone(&self.emitter),
                shutdown_rx.clone(),
            )));
        }

        info!("Poller: {} polling groups started", tasks.len());

        PollerHandle {
            shutdown_tx,
            tasks,
            manual_samples,
        }
    }
}

/// Handle to the running periodic tasks.
///
/// Dropping the handle closes the shutdown channel, which stops every periodic
/// task; keep it alive for as long as polling should continue.
#[must_use = "dropping the handle stops all periodic polling"]
pub struct PollerHandle {
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    manual_samples: usize,
}

impl PollerHandle {
    /// Number of samples emitted by the one-shot groups at start-up
    pub fn manual_samples(&self) -> usize {
        self.manual_samples
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Stops every timer and waits for in-flight collections to finish
    pub async fn shutdown(self) {
        info!("Poller: Stopping {} polling groups...", self.tasks.len());
        let _ = self.shutdown_tx.send(true);

        for task in self.tasks {
            if let Err(e) = task.await {
                warn!("Poller: Polling task ended abnormally: {}", e);
            }
        }

        info!("Poller: Stopped.");
    }
}

async fn poll_group(
    group: MetricGroup,
    period: Duration,
    catalog: Arc<MetricCatalog>,
    source: Arc<dyn StatSource>,
    emitter: Arc<dyn Emitter>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("Poller: {} polling every {:?}", group.id, period);

    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // Shutdown first: a tick missed during a slow collection is already
            // ready and must not start another collection after the stop signal
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                // Awaited inline: the next tick cannot start until this one is done
                run_group(&group, &catalog, source.as_ref(), emitter.as_ref()).await;
            }
        }
    }

    debug!("Poller: {} stopped", group.id);
}

/// Runs one collection for `group` and publishes the conforming samples.
/// Returns the number of samples handed to the emitter.
async fn run_group(
    group: &MetricGroup,
    catalog: &MetricCatalog,
    source: &dyn StatSource,
    emitter: &dyn Emitter,
) -> usize {
    let started = std::time::Instant::now();
    let collection = collection::collect(group.collector, source).await;

    for failure in &collection.failures {
        log_failure(&group.id, failure);
    }

    let mut published = 0;
    for sample in collection.samples {
        if let Err(e) = catalog.conforms(&sample) {
            error!("Poller: {} dropped a sample: {}", group.id, e);
            continue;
        }
        emitter.publish(sample);
        published += 1;
    }

    debug!(
        "Poller: {} published {} samples in {:?}",
        group.id,
        published,
        started.elapsed()
    );
    published
}

fn log_failure(group_id: &str, failure: &StatError) {
    match failure {
        StatError::Unsupported { .. } => debug!("Poller: {} skipped: {}", group_id, failure),
        StatError::Inconsistent { .. } | StatError::Malformed { .. } => {
            warn!("Poller: {} omitted a metric: {}", group_id, failure)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registration::{PluginOptions, build_catalog};
    use crate::infrastructure::mock::{RecordingEmitter, StaticStatSource};

    fn catalog(poll_rate: u64) -> Arc<MetricCatalog> {
        Arc::new(build_catalog(&PluginOptions::default().with_poll_rate(poll_rate)).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_groups_collected_before_start_returns() {
        let source = Arc::new(StaticStatSource::healthy());
        let emitter = Arc::new(RecordingEmitter::new());

        let handle = Poller::new(catalog(1000), source.clone(), emitter.clone())
            .start()
            .await;

        assert_eq!(handle.manual_samples(), 4);
        assert_eq!(emitter.len(), 4);
        assert_eq!(source.call_count("scheduling_counters"), 0);
        assert_eq!(handle.task_count(), 2);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_groups_follow_poll_rate() {
        let source = Arc::new(StaticStatSource::healthy());
        let emitter = Arc::new(RecordingEmitter::new());

        let handle = Poller::new(catalog(1000), source.clone(), emitter.clone())
            .start()
            .await;

        time::sleep(Duration::from_millis(5500)).await;

        assert_eq!(source.call_count("scheduling_counters"), 5);
        assert_eq!(source.call_count("memory_breakdown"), 5);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_collection_skips_missed_ticks() {
        // First collection starts at 1000ms and runs until 4500ms, spanning
        // the 2000, 3000 and 4000 deadlines
        let source = Arc::new(
            StaticStatSource::healthy()
                .with_first_call_latency("scheduling_counters", Duration::from_millis(3500)),
        );
        let emitter = Arc::new(RecordingEmitter::new());

        let handle = Poller::new(catalog(1000), source.clone(), emitter.clone())
            .start()
            .await;

        time::sleep(Duration::from_millis(5200)).await;

        // One late tick at 4500, then back on the grid at 5000. Queued ticks
        // would add two more collections at 4500.
        assert_eq!(source.call_count("scheduling_counters"), 3);
        // The memory group has its own timer and is not held back
        assert_eq!(source.call_count("memory_breakdown"), 5);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_collection_never_overlaps_itself() {
        let source =
            Arc::new(StaticStatSource::healthy().with_latency(Duration::from_millis(2500)));
        let emitter = Arc::new(RecordingEmitter::new());

        let handle = Poller::new(catalog(1000), source.clone(), emitter.clone())
            .start()
            .await;

        // Internal collections take 7500ms (three slow accessors), so only the
        // one started at 1000ms may be in flight by now
        time::sleep(Duration::from_millis(5500)).await;
        assert_eq!(source.call_count("scheduling_counters"), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_timers() {
        let source = Arc::new(StaticStatSource::healthy());
        let emitter = Arc::new(RecordingEmitter::new());

        let handle = Poller::new(catalog(1000), source.clone(), emitter.clone())
            .start()
            .await;

        time::sleep(Duration::from_millis(1500)).await;
        handle.shutdown().await;
        let after_shutdown = source.call_count("scheduling_counters");

        time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(source.call_count("scheduling_counters"), after_shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_wins_over_ready_tick() {
        let source = Arc::new(
            StaticStatSource::healthy()
                .with_first_call_latency("scheduling_counters", Duration::from_millis(3500)),
        );
        let emitter = Arc::new(RecordingEmitter::new());

        let handle = Poller::new(catalog(1000), source.clone(), emitter.clone())
            .start()
            .await;

        // Shutdown is requested while the slow first collection is in flight;
        // its missed tick is ready as soon as the collection ends
        time::sleep(Duration::from_millis(2000)).await;
        handle.shutdown().await;

        assert_eq!(source.call_count("scheduling_counters"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_polling() {
        let source = Arc::new(StaticStatSource::healthy());
        let emitter = Arc::new(RecordingEmitter::new());

        let handle = Poller::new(catalog(1000), source.clone(), emitter.clone())
            .start()
            .await;
        drop(handle);

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(source.call_count("scheduling_counters"), 0);
    }
}
