use crate::application::collection::Collection;
use crate::application::registration::PluginOptions;
use crate::domain::catalog::{Cadence, CollectorKind, MetricDef, MetricGroup};
use crate::domain::ports::StatSource;
use crate::domain::sample::Sample;

pub const GROUP_ID: &str = "vm_cpu_topology_manual_metrics";
pub const KEY: &str = "vm.cpu_topology";

pub fn group(options: &PluginOptions) -> MetricGroup {
    MetricGroup::new(
        GROUP_ID,
        Cadence::OneShot,
        CollectorKind::CpuTopology,
        vec![
            MetricDef::new(
                options.metric_name("system.logical_processors.info"),
                KEY,
                "The total number of logical processors on the host machine.",
                "logical_processors",
            ),
            MetricDef::new(
                options.metric_name("system.logical_processors_available.info"),
                KEY,
                "The total number of logical processors available to the runtime.",
                "logical_processors_available",
            ),
            MetricDef::new(
                options.metric_name("system.logical_processors_online.info"),
                KEY,
                "The total number of logical processors online on the host machine.",
                "logical_processors_online",
            ),
        ],
    )
}

pub async fn collect(source: &dyn StatSource) -> Collection {
    let mut collection = Collection::default();

    if let Some(topology) = collection.record(source.topology().await) {
        collection.push(
            Sample::new(KEY)
                .measure("logical_processors", topology.logical_processors as f64)
                .measure("logical_processors_available", topology.available as f64)
                .measure("logical_processors_online", topology.online as f64),
        );
    }

    collection
}
