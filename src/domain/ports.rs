use crate::domain::errors::StatError;
use crate::domain::sample::Sample;
use crate::domain::stats::{
    CpuTopology, FeatureFlags, MemoryBreakdown, SchedulerTopology, SchedulingCounters,
    SinceStartCounters, SystemCounts, SystemLimits,
};
use async_trait::async_trait;

/// Read-only view over the monitored runtime's introspection facilities.
///
/// Every accessor is a query with no observable side effects and must be safe to
/// call from several groups at once. A fact the runtime does not expose is
/// reported as [`StatError::Unsupported`].
#[async_trait]
pub trait StatSource: Send + Sync {
    async fn memory_breakdown(&self) -> Result<MemoryBreakdown, StatError>;
    async fn counts(&self) -> Result<SystemCounts, StatError>;
    async fn scheduling_counters(&self) -> Result<SchedulingCounters, StatError>;
    async fn since_start_counters(&self) -> Result<SinceStartCounters, StatError>;
    async fn limits(&self) -> Result<SystemLimits, StatError>;
    async fn topology(&self) -> Result<CpuTopology, StatError>;
    async fn scheduler_topology(&self) -> Result<SchedulerTopology, StatError>;
    async fn feature_flags(&self) -> Result<FeatureFlags, StatError>;
}

/// Hands completed samples to the external event pipeline.
///
/// Fire-and-forget: implementations must not block on downstream consumption and
/// drop the sample when the pipeline cannot take it.
pub trait Emitter: Send + Sync {
    fn publish(&self, sample: Sample);
}
