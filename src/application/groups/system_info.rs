//! Static build facts: feature flags, word size and major version.

use crate::application::collection::Collection;
use crate::application::registration::PluginOptions;
use crate::domain::catalog::{Cadence, CollectorKind, MetricDef, MetricGroup, Unit};
use crate::domain::derived::{flag_value, major_version};
use crate::domain::errors::StatError;
use crate::domain::ports::StatSource;
use crate::domain::sample::Sample;

pub const GROUP_ID: &str = "vm_system_info_manual_metrics";
pub const KEY: &str = "vm.system_info";

pub fn group(options: &PluginOptions) -> MetricGroup {
    MetricGroup::new(
        GROUP_ID,
        Cadence::OneShot,
        CollectorKind::SystemInfo,
        vec![
            MetricDef::new(
                options.metric_name("system.smp_support.info"),
                KEY,
                "Whether the runtime was built with symmetric multiprocessing support (1) or not (0).",
                "smp_support",
            ),
            MetricDef::new(
                options.metric_name("system.thread_support.info"),
                KEY,
                "Whether the runtime was built with thread support (1) or not (0).",
                "thread_support",
            ),
            MetricDef::new(
                options.metric_name("system.time_correction_support.info"),
                KEY,
                "Whether the runtime has time correction enabled (1) or not (0).",
                "time_correction_support",
            ),
            MetricDef::new(
                options.metric_name("system.word_size_bytes.info"),
                KEY,
                "The size of a runtime word in bytes.",
                "word_size_bytes",
            )
            .with_unit(Unit::Byte),
            MetricDef::new(
                options.metric_name("system.version.info"),
                KEY,
                "The major version of the runtime.",
                "version",
            ),
        ],
    )
}

pub async fn collect(source: &dyn StatSource) -> Collection {
    let mut collection = Collection::default();

    let Some(flags) = collection.record(source.feature_flags().await) else {
        return collection;
    };

    let mut sample = Sample::new(KEY)
        .measure("smp_support", flag_value(flags.smp))
        .measure("thread_support", flag_value(flags.threads))
        .measure("time_correction_support", flag_value(flags.time_correction))
        .measure("word_size_bytes", flags.word_size as f64);

    // A missing or bad version string only drops the version measurement
    match flags.version.as_deref().map(major_version) {
        Some(Ok(major)) => sample = sample.measure("version", major as f64),
        Some(Err(e)) => collection.fail(e),
        None => collection.fail(StatError::unsupported("version")),
    }

    collection.push(sample);
    collection
}
