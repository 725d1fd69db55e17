//! Prometheus gauges built from the metric catalog.
//!
//! Every `MetricDef` becomes one gauge family; published samples are routed to
//! the families declared for their publication key.

use crate::domain::catalog::{MetricCatalog, MetricDef};
use crate::domain::sample::Sample;
use prometheus::{GaugeVec, Opts, Registry, TextEncoder};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::warn;

struct Series {
    publication_key: String,
    value_field: String,
    name: String,
    labels: Vec<String>,
    gauge: GaugeVec,
}

/// Last-value exporter for published samples
#[derive(Clone)]
pub struct SampleExporter {
    registry: Arc<Registry>,
    series: Arc<Vec<Series>>,
    latest: Arc<Mutex<BTreeMap<String, f64>>>,
    applied: Arc<AtomicU64>,
}

impl SampleExporter {
    /// Registers one gauge family per metric definition in the catalog
    pub fn new(catalog: &MetricCatalog) -> anyhow::Result<Self> {
        let registry = Registry::new();
        let mut series = Vec::new();

        for def in catalog.definitions() {
            let name = prometheus_name(&def.name);
            let labels: Vec<String> = def.tags.iter().cloned().collect();
            let label_refs: Vec<&str> = labels.iter().map(String::as_str).collect();

            let gauge = GaugeVec::new(Opts::new(name.clone(), help_text(def)), &label_refs)?;
            registry.register(Box::new(gauge.clone()))?;

            series.push(Series {
                publication_key: def.publication_key.clone(),
                value_field: def.value_field.clone(),
                name,
                labels,
                gauge,
            });
        }

        Ok(Self {
            registry: Arc::new(registry),
            series: Arc::new(series),
            latest: Arc::new(Mutex::new(BTreeMap::new())),
            applied: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Sets every gauge the sample feeds. Returns the number of series updated.
    pub fn apply(&self, sample: &Sample) -> usize {
        let mut updated = 0;

        for series in self
            .series
            .iter()
            .filter(|s| s.publication_key == sample.publication_key)
        {
            let Some(value) = sample.measurement(&series.value_field) else {
                continue;
            };

            let mut label_values = Vec::with_capacity(series.labels.len());
            for label in &series.labels {
                match sample.tags.get(label) {
                    Some(v) => label_values.push(v.as_str()),
                    None => {
                        warn!(
                            "SampleExporter: {} is missing tag {} for {}",
                            sample.publication_key, label, series.name
                        );
                        break;
                    }
                }
            }
            if label_values.len() != series.labels.len() {
                continue;
            }

            series
                .gauge
                .with_label_values(label_values.as_slice())
                .set(value);
            if let Ok(mut latest) = self.latest.lock() {
                latest.insert(series_id(&series.name, &series.labels, &label_values), value);
            }
            updated += 1;
        }

        self.applied.fetch_add(1, Ordering::Relaxed);
        updated
    }

    /// Render all gauges in Prometheus text format
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    /// Last value of every series that has received a sample
    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.latest
            .lock()
            .map(|latest| latest.clone())
            .unwrap_or_default()
    }

    pub fn samples_applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    pub fn series_count(&self) -> usize {
        self.series.len()
    }
}

/// Maps a dotted metric name onto the Prometheus name charset
pub fn prometheus_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == ':' { c } else { '_' })
        .collect();
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn help_text(def: &MetricDef) -> String {
    match def.unit {
        Some(unit) => format!("{} ({})", def.description, unit.as_str()),
        None => def.description.clone(),
    }
}

fn series_id(name: &str, labels: &[String], values: &[&str]) -> String {
    if labels.is_empty() {
        return name.to_string();
    }
    let pairs: Vec<String> = labels
        .iter()
        .zip(values)
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect();
    format!("{}{{{}}}", name, pairs.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registration::{PluginOptions, build_catalog};

    fn exporter() -> SampleExporter {
        let catalog = build_catalog(&PluginOptions::default()).expect("catalog");
        SampleExporter::new(&catalog).expect("Failed to create exporter")
    }

    #[test]
    fn test_prometheus_name() {
        assert_eq!(
            prometheus_name("vmpulse.vm.memory.allocated.bytes"),
            "vmpulse_vm_memory_allocated_bytes"
        );
        assert_eq!(prometheus_name("my-app.stats"), "my_app_stats");
        assert_eq!(prometheus_name("9lives"), "_9lives");
    }

    #[test]
    fn test_registers_every_definition() {
        let catalog = build_catalog(&PluginOptions::default()).unwrap();
        let exporter = SampleExporter::new(&catalog).unwrap();
        assert_eq!(exporter.series_count(), catalog.metric_count());
    }

    #[test]
    fn test_tagged_sample_sets_labelled_gauge() {
        let exporter = exporter();
        let sample = Sample::new("vm.internal.run_queue")
            .measure("count", 4.0)
            .tag("type", "dirty");

        assert_eq!(exporter.apply(&sample), 1);

        let output = exporter.render();
        assert!(output.contains("vmpulse_vm_stats_run_queue_count{type=\"dirty\"} 4"));
        assert_eq!(
            exporter
                .snapshot()
                .get("vmpulse_vm_stats_run_queue_count{type=\"dirty\"}"),
            Some(&4.0)
        );
    }

    #[test]
    fn test_shared_key_updates_each_field() {
        let exporter = exporter();
        let sample = Sample::new("vm.internal.gc")
            .measure("count", 12.0)
            .measure("words_reclaimed", 4096.0);

        assert_eq!(exporter.apply(&sample), 2);

        let output = exporter.render();
        assert!(output.contains("vmpulse_vm_stats_gc_count 12"));
        assert!(output.contains("vmpulse_vm_stats_gc_reclaimed_count 4096"));
        assert_eq!(exporter.samples_applied(), 1);
    }

    #[test]
    fn test_missing_tag_is_not_exported() {
        let exporter = exporter();
        let sample = Sample::new("vm.internal.active_task").measure("count", 1.0);
        assert_eq!(exporter.apply(&sample), 0);
        assert!(exporter.snapshot().is_empty());
    }

    #[test]
    fn test_help_includes_unit() {
        let exporter = exporter();
        exporter.apply(&Sample::new("vm.memory.total").measure("total", 1000.0));
        let output = exporter.render();
        assert!(output.contains("The total amount of memory currently allocated. (bytes)"));
    }
}
