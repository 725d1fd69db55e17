use crate::application::collection::Collection;
use crate::application::registration::PluginOptions;
use crate::domain::catalog::{Cadence, CollectorKind, MetricDef, MetricGroup};
use crate::domain::ports::StatSource;
use crate::domain::sample::Sample;

pub const GROUP_ID: &str = "vm_system_limits_manual_metrics";
pub const KEY: &str = "vm.system_limits";

pub fn group(options: &PluginOptions) -> MetricGroup {
    MetricGroup::new(
        GROUP_ID,
        Cadence::OneShot,
        CollectorKind::SystemLimits,
        vec![
            MetricDef::new(
                options.metric_name("system.ets_limit.info"),
                KEY,
                "The maximum number of ETS tables allowed.",
                "ets",
            ),
            MetricDef::new(
                options.metric_name("system.port_limit.info"),
                KEY,
                "The maximum number of ports that can exist simultaneously.",
                "port",
            ),
            MetricDef::new(
                options.metric_name("system.process_limit.info"),
                KEY,
                "The maximum number of processes that can exist simultaneously.",
                "process",
            ),
            MetricDef::new(
                options.metric_name("system.atom_limit.info"),
                KEY,
                "The maximum number of atoms allowed.",
                "atom",
            ),
            MetricDef::new(
                options.metric_name("system.thread_pool_size.info"),
                KEY,
                "The number of async threads in the async thread pool used for driver calls.",
                "thread_pool_size",
            ),
        ],
    )
}

pub async fn collect(source: &dyn StatSource) -> Collection {
    let mut collection = Collection::default();

    if let Some(limits) = collection.record(source.limits().await) {
        collection.push(
            Sample::new(KEY)
                .measure("ets", limits.ets as f64)
                .measure("port", limits.port as f64)
                .measure("process", limits.process as f64)
                .measure("atom", limits.atom as f64)
                .measure("thread_pool_size", limits.thread_pool_size as f64),
        );
    }

    collection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::StaticStatSource;

    #[tokio::test]
    async fn test_limits_sample() {
        let collection = collect(&StaticStatSource::healthy()).await;

        assert_eq!(collection.samples.len(), 1);
        let sample = &collection.samples[0];
        assert_eq!(sample.measurements.len(), 5);
        assert_eq!(sample.measurement("process"), Some(262144.0));
        assert!(sample.tags.is_empty());
    }
}
