//! Typed metric catalog.
//!
//! The catalog is built once from static declarations, validated up front and
//! never mutated afterwards. Descriptions and units are metadata for the
//! exporter only; they have no effect on collection.

use crate::domain::errors::CatalogError;
use crate::domain::sample::Sample;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Unit {
    Byte,
    Millisecond,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Byte => "bytes",
            Unit::Millisecond => "milliseconds",
        }
    }
}

/// How often a group is collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Collected exactly once at start-up
    OneShot,
    /// Collected every interval
    Periodic(Duration),
}

/// Identifies the collection routine behind a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CollectorKind {
    Internal,
    Memory,
    CpuTopology,
    SystemLimits,
    SystemInfo,
    SchedulerTopology,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDef {
    pub name: String,
    pub publication_key: String,
    pub description: String,
    pub value_field: String,
    pub tags: BTreeSet<String>,
    pub unit: Option<Unit>,
}

impl MetricDef {
    pub fn new(
        name: impl Into<String>,
        publication_key: impl Into<String>,
        description: impl Into<String>,
        value_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            publication_key: publication_key.into(),
            description: description.into(),
            value_field: value_field.into(),
            tags: BTreeSet::new(),
            unit: None,
        }
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricGroup {
    pub id: String,
    pub cadence: Cadence,
    pub collector: CollectorKind,
    pub metrics: Vec<MetricDef>,
}

impl MetricGroup {
    pub fn new(
        id: impl Into<String>,
        cadence: Cadence,
        collector: CollectorKind,
        metrics: Vec<MetricDef>,
    ) -> Self {
        Self {
            id: id.into(),
            cadence,
            collector,
            metrics,
        }
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self.cadence, Cadence::Periodic(_))
    }

    pub fn interval(&self) -> Option<Duration> {
        match self.cadence {
            Cadence::Periodic(interval) => Some(interval),
            Cadence::OneShot => None,
        }
    }

    /// Distinct publication keys declared by this group, in declaration order
    pub fn publication_keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.metrics
            .iter()
            .map(|m| m.publication_key.as_str())
            .filter(|key| seen.insert(*key))
            .collect()
    }
}

/// Immutable, validated set of metric groups
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    groups: Vec<MetricGroup>,
}

impl MetricCatalog {
    pub fn new(groups: Vec<MetricGroup>) -> Result<Self, CatalogError> {
        let mut group_ids = HashSet::new();
        let mut names = HashSet::new();
        let mut key_owner: HashMap<&str, &str> = HashMap::new();
        let mut key_tags: HashMap<&str, &BTreeSet<String>> = HashMap::new();

        for group in &groups {
            if !group_ids.insert(group.id.as_str()) {
                return Err(CatalogError::DuplicateGroup {
                    id: group.id.clone(),
                });
            }
            if group.metrics.is_empty() {
                return Err(CatalogError::EmptyGroup {
                    id: group.id.clone(),
                });
            }
            if group.interval() == Some(Duration::ZERO) {
                return Err(CatalogError::ZeroInterval {
                    id: group.id.clone(),
                });
            }

            for def in &group.metrics {
                if !names.insert(def.name.as_str()) {
                    return Err(CatalogError::DuplicateMetric {
                        name: def.name.clone(),
                    });
                }
                if def.value_field.trim().is_empty() {
                    return Err(CatalogError::EmptyValueField {
                        name: def.name.clone(),
                    });
                }

                let key = def.publication_key.as_str();
                match key_owner.get(key) {
                    Some(owner) if *owner != group.id => {
                        return Err(CatalogError::SharedPublicationKey {
                            key: key.to_string(),
                            first: owner.to_string(),
                            second: group.id.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        key_owner.insert(key, group.id.as_str());
                    }
                }

                match key_tags.get(key) {
                    Some(tags) if **tags != def.tags => {
                        return Err(CatalogError::InconsistentTags {
                            key: key.to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        key_tags.insert(key, &def.tags);
                    }
                }
            }
        }

        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[MetricGroup] {
        &self.groups
    }

    pub fn polling_groups(&self) -> impl Iterator<Item = &MetricGroup> {
        self.groups.iter().filter(|g| g.is_periodic())
    }

    pub fn manual_groups(&self) -> impl Iterator<Item = &MetricGroup> {
        self.groups.iter().filter(|g| !g.is_periodic())
    }

    pub fn group(&self, id: &str) -> Option<&MetricGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &MetricDef> {
        self.groups.iter().flat_map(|g| g.metrics.iter())
    }

    pub fn definitions_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a MetricDef> {
        self.definitions().filter(move |d| d.publication_key == key)
    }

    pub fn metric_count(&self) -> usize {
        self.definitions().count()
    }

    /// Checks a sample against the declarations for its publication key.
    ///
    /// Measurements must be a subset of the declared value fields and the tag keys
    /// must be exactly the declared tags.
    pub fn conforms(&self, sample: &Sample) -> Result<(), CatalogError> {
        let key = sample.publication_key.as_str();
        let defs: Vec<&MetricDef> = self.definitions_for(key).collect();
        let mismatch = |reason: String| CatalogError::SampleMismatch {
            key: key.to_string(),
            reason,
        };

        let Some(first) = defs.first() else {
            return Err(mismatch("unknown publication key".to_string()));
        };

        if sample.measurements.is_empty() {
            return Err(mismatch("no measurements".to_string()));
        }

        for field in sample.measurements.keys() {
            if !defs.iter().any(|d| &d.value_field == field) {
                return Err(mismatch(format!("undeclared measurement {}", field)));
            }
        }

        let tag_keys: BTreeSet<String> = sample.tags.keys().cloned().collect();
        if tag_keys != first.tags {
            return Err(mismatch(format!(
                "tags {:?} do not match declared {:?}",
                tag_keys, first.tags
            )));
        }

        Ok(())
    }
}
