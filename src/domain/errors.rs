use thiserror::Error;

/// Failures raised while reading or deriving a value from the monitored runtime.
///
/// None of these stop a collection: the affected metric is left out of the tick
/// and the rest of the group is still published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatError {
    #[error("Unsupported: {fact} is not exposed by this runtime")]
    Unsupported { fact: String },

    #[error("Inconsistent: {metric} would be negative (all={all} < normal={normal})")]
    Inconsistent {
        metric: String,
        all: u64,
        normal: u64,
    },

    #[error("Malformed: {metric} could not be parsed from {raw:?}")]
    Malformed { metric: String, raw: String },
}

impl StatError {
    pub fn unsupported(fact: impl Into<String>) -> Self {
        StatError::Unsupported { fact: fact.into() }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, StatError::Unsupported { .. })
    }
}

/// Errors raised while building the metric catalog or checking a sample against it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Duplicate metric group id: {id}")]
    DuplicateGroup { id: String },

    #[error("Metric group {id} declares no metrics")]
    EmptyGroup { id: String },

    #[error("Metric group {id} has a zero polling interval")]
    ZeroInterval { id: String },

    #[error("Duplicate metric name: {name}")]
    DuplicateMetric { name: String },

    #[error("Metric {name} has an empty value field")]
    EmptyValueField { name: String },

    #[error("Publication key {key} is declared by groups {first} and {second}")]
    SharedPublicationKey {
        key: String,
        first: String,
        second: String,
    },

    #[error("Metrics published under {key} declare different tag sets")]
    InconsistentTags { key: String },

    #[error("Sample for {key} does not match the catalog: {reason}")]
    SampleMismatch { key: String, reason: String },
}

/// Errors raised while handing a sample to the event pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    #[error("Emitter unavailable for {key}: {reason}")]
    Unavailable { key: String, reason: String },
}
