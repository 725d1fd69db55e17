use crate::application::collection::Collection;
use crate::application::registration::PluginOptions;
use crate::domain::catalog::{Cadence, CollectorKind, MetricDef, MetricGroup};
use crate::domain::ports::StatSource;
use crate::domain::sample::Sample;

pub const GROUP_ID: &str = "vm_scheduler_topology_manual_metrics";
pub const KEY: &str = "vm.scheduler_topology";

pub fn group(options: &PluginOptions) -> MetricGroup {
    MetricGroup::new(
        GROUP_ID,
        Cadence::OneShot,
        CollectorKind::SchedulerTopology,
        vec![
            MetricDef::new(
                options.metric_name("system.dirty_cpu_schedulers.info"),
                KEY,
                "The total number of dirty CPU scheduler threads used by the runtime.",
                "dirty_cpu_schedulers",
            ),
            MetricDef::new(
                options.metric_name("system.dirty_cpu_schedulers_online.info"),
                KEY,
                "The total number of dirty CPU schedulers that are online.",
                "dirty_cpu_schedulers_online",
            ),
            MetricDef::new(
                options.metric_name("system.dirty_io_schedulers.info"),
                KEY,
                "The total number of dirty I/O schedulers used to execute I/O bound native functions.",
                "dirty_io_schedulers",
            ),
            MetricDef::new(
                options.metric_name("system.schedulers.info"),
                KEY,
                "The number of scheduler threads used by the runtime.",
                "schedulers",
            ),
            MetricDef::new(
                options.metric_name("system.schedulers_online.info"),
                KEY,
                "The number of scheduler threads that are online.",
                "schedulers_online",
            ),
        ],
    )
}

pub async fn collect(source: &dyn StatSource) -> Collection {
    let mut collection = Collection::default();

    if let Some(topology) = collection.record(source.scheduler_topology().await) {
        collection.push(
            Sample::new(KEY)
                .measure("dirty_cpu_schedulers", topology.dirty_cpu as f64)
                .measure(
                    "dirty_cpu_schedulers_online",
                    topology.dirty_cpu_online as f64,
                )
                .measure("dirty_io_schedulers", topology.dirty_io as f64)
                .measure("schedulers", topology.schedulers as f64)
                .measure("schedulers_online", topology.schedulers_online as f64),
        );
    }

    collection
}
