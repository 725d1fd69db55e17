//! Runtime internals: scheduling, reductions, GC, port IO, uptime and entity counts.

use crate::application::collection::Collection;
use crate::application::registration::PluginOptions;
use crate::domain::catalog::{Cadence, CollectorKind, MetricDef, MetricGroup, Unit};
use crate::domain::derived;
use crate::domain::ports::StatSource;
use crate::domain::sample::Sample;

pub const GROUP_ID: &str = "vm_internal_polling_metrics";

pub const ACTIVE_TASK_KEY: &str = "vm.internal.active_task";
pub const RUN_QUEUE_KEY: &str = "vm.internal.run_queue";
pub const CONTEXT_SWITCH_KEY: &str = "vm.internal.context_switch";
pub const REDUCTION_KEY: &str = "vm.internal.reduction";
pub const GC_KEY: &str = "vm.internal.gc";
pub const PORT_IO_KEY: &str = "vm.internal.port_io";
pub const UPTIME_KEY: &str = "vm.internal.uptime";
pub const SYSTEM_COUNTS_KEY: &str = "vm.internal.system_counts";

pub fn group(options: &PluginOptions) -> MetricGroup {
    let name = |suffix: &str| options.metric_name(suffix);

    MetricGroup::new(
        GROUP_ID,
        Cadence::Periodic(options.poll_interval()),
        CollectorKind::Internal,
        vec![
            MetricDef::new(
                name("stats.active_task.count"),
                ACTIVE_TASK_KEY,
                "The number of active tasks in the run queues, split into normal and dirty schedulers.",
                "count",
            )
            .with_tags(&["type"]),
            MetricDef::new(
                name("stats.run_queue.count"),
                RUN_QUEUE_KEY,
                "The number of tasks that are ready to run on all available run queues.",
                "count",
            )
            .with_tags(&["type"]),
            MetricDef::new(
                name("stats.context_switch.count"),
                CONTEXT_SWITCH_KEY,
                "The total number of context switches since the system started.",
                "count",
            ),
            MetricDef::new(
                name("stats.reduction.count"),
                REDUCTION_KEY,
                "The total number of reductions since the system started.",
                "count",
            ),
            MetricDef::new(
                name("stats.gc.count"),
                GC_KEY,
                "The total number of garbage collections since the system started.",
                "count",
            ),
            MetricDef::new(
                name("stats.gc.reclaimed.count"),
                GC_KEY,
                "The total number of words reclaimed by garbage collection since the system started.",
                "words_reclaimed",
            ),
            MetricDef::new(
                name("stats.port_io.byte.count"),
                PORT_IO_KEY,
                "The total number of bytes sent and received through ports.",
                "bytes",
            )
            .with_tags(&["type"])
            .with_unit(Unit::Byte),
            MetricDef::new(
                name("stats.uptime.milliseconds.count"),
                UPTIME_KEY,
                "The total number of wall clock milliseconds that have passed since the system started.",
                "milliseconds",
            )
            .with_unit(Unit::Millisecond),
            MetricDef::new(
                name("stats.port.count"),
                SYSTEM_COUNTS_KEY,
                "A count of how many ports are currently active.",
                "port",
            ),
            MetricDef::new(
                name("stats.process.count"),
                SYSTEM_COUNTS_KEY,
                "A count of how many processes are currently alive.",
                "process",
            ),
            MetricDef::new(
                name("stats.atom.count"),
                SYSTEM_COUNTS_KEY,
                "A count of how many atoms are currently allocated.",
                "atom",
            ),
            MetricDef::new(
                name("stats.ets.count"),
                SYSTEM_COUNTS_KEY,
                "A count of how many ETS tables currently exist.",
                "ets",
            ),
        ],
    )
}

pub async fn collect(source: &dyn StatSource) -> Collection {
    let mut collection = Collection::default();

    if let Some(counters) = collection.record(source.scheduling_counters().await) {
        push_split(
            &mut collection,
            ACTIVE_TASK_KEY,
            "active_task",
            counters.active_tasks,
            counters.active_tasks_all,
        );
        push_split(
            &mut collection,
            RUN_QUEUE_KEY,
            "run_queue",
            counters.run_queue,
            counters.run_queue_all,
        );
    }

    if let Some(counters) = collection.record(source.since_start_counters().await) {
        collection.push(
            Sample::new(CONTEXT_SWITCH_KEY).measure("count", counters.context_switches as f64),
        );
        collection.push(Sample::new(REDUCTION_KEY).measure("count", counters.reductions as f64));
        collection.push(
            Sample::new(GC_KEY)
                .measure("count", counters.gc_count as f64)
                .measure("words_reclaimed", counters.gc_words_reclaimed as f64),
        );
        collection.push(
            Sample::new(PORT_IO_KEY)
                .measure("bytes", counters.io_in_bytes as f64)
                .tag("type", "input"),
        );
        collection.push(
            Sample::new(PORT_IO_KEY)
                .measure("bytes", counters.io_out_bytes as f64)
                .tag("type", "output"),
        );
        collection.push(
            Sample::new(UPTIME_KEY).measure("milliseconds", counters.wall_clock_ms as f64),
        );
    }

    if let Some(counts) = collection.record(source.counts().await) {
        collection.push(
            Sample::new(SYSTEM_COUNTS_KEY)
                .measure("process", counts.process as f64)
                .measure("port", counts.port as f64)
                .measure("atom", counts.atom as f64)
                .measure("ets", counts.ets as f64),
        );
    }

    collection
}

/// Publishes the normal count as-is and the dirty count as `all - normal`
fn push_split(collection: &mut Collection, key: &str, metric: &str, normal: u64, all: u64) {
    collection.push(
        Sample::new(key)
            .measure("count", normal as f64)
            .tag("type", "normal"),
    );

    match derived::dirty_split(metric, all, normal) {
        Ok(dirty) => collection.push(
            Sample::new(key)
                .measure("count", dirty as f64)
                .tag("type", "dirty"),
        ),
        Err(e) => collection.fail(e),
    }
}
