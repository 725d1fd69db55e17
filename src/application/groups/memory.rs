//! Memory allocated by the runtime, one sample per category.

use crate::application::collection::Collection;
use crate::application::registration::PluginOptions;
use crate::domain::catalog::{Cadence, CollectorKind, MetricDef, MetricGroup, Unit};
use crate::domain::errors::StatError;
use crate::domain::ports::StatSource;
use crate::domain::sample::Sample;

pub const GROUP_ID: &str = "vm_memory_polling_metrics";

/// Categories published from the memory breakdown, in publication order
pub const CATEGORIES: [&str; 6] = ["total", "atom", "binary", "code", "ets", "processes"];

pub fn publication_key(category: &str) -> String {
    format!("vm.memory.{}", category)
}

pub fn group(options: &PluginOptions) -> MetricGroup {
    let def = |suffix: &str, category: &str, description: &str| {
        MetricDef::new(
            options.metric_name(suffix),
            publication_key(category),
            description,
            category,
        )
        .with_unit(Unit::Byte)
    };

    MetricGroup::new(
        GROUP_ID,
        Cadence::Periodic(options.poll_interval()),
        CollectorKind::Memory,
        vec![
            def(
                "memory.allocated.bytes",
                "total",
                "The total amount of memory currently allocated.",
            ),
            def(
                "memory.atom.total.bytes",
                "atom",
                "The total amount of memory currently allocated for atoms.",
            ),
            def(
                "memory.binary.total.bytes",
                "binary",
                "The total amount of memory currently allocated for binaries.",
            ),
            def(
                "memory.code.total.bytes",
                "code",
                "The total amount of memory currently allocated for loaded code.",
            ),
            def(
                "memory.ets.total.bytes",
                "ets",
                "The total amount of memory currently allocated for ETS tables.",
            ),
            def(
                "memory.processes.total.bytes",
                "processes",
                "The total amount of memory currently allocated for processes.",
            ),
        ],
    )
}

pub async fn collect(source: &dyn StatSource) -> Collection {
    let mut collection = Collection::default();

    let Some(breakdown) = collection.record(source.memory_breakdown().await) else {
        return collection;
    };

    for category in CATEGORIES {
        match breakdown.get(category) {
            Some(bytes) => collection.push(
                Sample::new(publication_key(category)).measure(category, *bytes as f64),
            ),
            None => collection.fail(StatError::unsupported(format!("memory.{}", category))),
        }
    }

    collection
}
