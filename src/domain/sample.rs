use serde::Serialize;
use std::collections::BTreeMap;

/// A single point-in-time reading handed to the event pipeline.
///
/// Samples carry no timestamp of their own; the publish time is the sample time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub publication_key: String,
    pub measurements: BTreeMap<String, f64>,
    pub tags: BTreeMap<String, String>,
}

impl Sample {
    pub fn new(publication_key: impl Into<String>) -> Self {
        Self {
            publication_key: publication_key.into(),
            measurements: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Adds a measurement, replacing any previous value for the same field
    pub fn measure(mut self, field: impl Into<String>, value: f64) -> Self {
        self.measurements.insert(field.into(), value);
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn measurement(&self, field: &str) -> Option<f64> {
        self.measurements.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_measurements_and_tags() {
        let sample = Sample::new("vm.internal.run_queue")
            .measure("count", 3.0)
            .tag("type", "normal");

        assert_eq!(sample.publication_key, "vm.internal.run_queue");
        assert_eq!(sample.measurement("count"), Some(3.0));
        assert_eq!(sample.tags.get("type").map(String::as_str), Some("normal"));
        assert!(!sample.is_empty());
    }

    #[test]
    fn test_sample_serialization() {
        let sample = Sample::new("vm.memory.total").measure("total", 1000.0);
        let json = serde_json::to_string(&sample).expect("Failed to serialize");
        assert!(json.contains("vm.memory.total"));
        assert!(json.contains("\"total\":1000.0"));
    }
}
