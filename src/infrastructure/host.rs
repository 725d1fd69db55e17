//! Stat source over the current process and its tokio runtime.
//!
//! Only the facts the host can answer are reported; the rest are `Unsupported`.
//! The tokio worker pool has no auxiliary scheduler class, so dirty counts are zero.

use crate::domain::errors::StatError;
use crate::domain::ports::StatSource;
use crate::domain::stats::{
    CpuTopology, FeatureFlags, MemoryBreakdown, SchedulerTopology, SchedulingCounters,
    SinceStartCounters, SystemCounts, SystemLimits,
};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use sysinfo::{ProcessesToUpdate, System};
use tokio::runtime::{Handle, RuntimeFlavor, RuntimeMetrics};

pub struct HostStatSource {
    system: Mutex<System>,
    runtime: Option<Handle>,
}

impl HostStatSource {
    /// Captures the tokio runtime of the calling context, if any
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();

        Self {
            system: Mutex::new(system),
            runtime: Handle::try_current().ok(),
        }
    }

    fn system(&self, fact: &str) -> Result<MutexGuard<'_, System>, StatError> {
        self.system
            .lock()
            .map_err(|_| StatError::unsupported(fact))
    }

    fn runtime_metrics(&self, fact: &str) -> Result<RuntimeMetrics, StatError> {
        self.runtime
            .as_ref()
            .map(Handle::metrics)
            .ok_or_else(|| StatError::unsupported(fact))
    }

    fn available_parallelism(fact: &str) -> Result<u64, StatError> {
        std::thread::available_parallelism()
            .map(|n| n.get() as u64)
            .map_err(|_| StatError::unsupported(fact))
    }
}

impl Default for HostStatSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatSource for HostStatSource {
    async fn memory_breakdown(&self) -> Result<MemoryBreakdown, StatError> {
        let pid = sysinfo::get_current_pid()
            .map_err(|_| StatError::unsupported("memory_breakdown"))?;

        let mut system = self.system("memory_breakdown")?;
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let process = system
            .process(pid)
            .ok_or_else(|| StatError::unsupported("memory_breakdown"))?;

        let mut breakdown = MemoryBreakdown::new();
        breakdown.insert("total".to_string(), process.memory());
        Ok(breakdown)
    }

    async fn counts(&self) -> Result<SystemCounts, StatError> {
        Err(StatError::unsupported("counts"))
    }

    async fn scheduling_counters(&self) -> Result<SchedulingCounters, StatError> {
        let metrics = self.runtime_metrics("scheduling_counters")?;
        let active = metrics.num_alive_tasks() as u64;
        let queued = metrics.global_queue_depth() as u64;

        Ok(SchedulingCounters {
            active_tasks: active,
            active_tasks_all: active,
            run_queue: queued,
            run_queue_all: queued,
        })
    }

    async fn since_start_counters(&self) -> Result<SinceStartCounters, StatError> {
        Err(StatError::unsupported("since_start_counters"))
    }

    async fn limits(&self) -> Result<SystemLimits, StatError> {
        Err(StatError::unsupported("limits"))
    }

    async fn topology(&self) -> Result<CpuTopology, StatError> {
        let logical = {
            let mut system = self.system("topology")?;
            system.refresh_cpu_all();
            system.cpus().len() as u64
        };
        if logical == 0 {
            return Err(StatError::unsupported("topology"));
        }

        Ok(CpuTopology {
            logical_processors: logical,
            available: Self::available_parallelism("topology")?,
            online: logical,
        })
    }

    async fn scheduler_topology(&self) -> Result<SchedulerTopology, StatError> {
        let workers = self.runtime_metrics("scheduler_topology")?.num_workers() as u64;

        Ok(SchedulerTopology {
            dirty_cpu: 0,
            dirty_cpu_online: 0,
            dirty_io: 0,
            schedulers: workers,
            schedulers_online: workers,
        })
    }

    async fn feature_flags(&self) -> Result<FeatureFlags, StatError> {
        let parallelism = Self::available_parallelism("feature_flags")?;

        let flavor = self
            .runtime
            .as_ref()
            .map(Handle::runtime_flavor)
            .ok_or_else(|| StatError::unsupported("feature_flags"))?;

        Ok(FeatureFlags {
            smp: parallelism > 1,
            threads: flavor == RuntimeFlavor::MultiThread,
            // std::time::Instant is monotonic on every supported platform
            time_correction: true,
            word_size: std::mem::size_of::<usize>() as u64,
            version: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::groups::system_info;

    #[tokio::test]
    async fn test_host_reports_total_memory() {
        let source = HostStatSource::new();
        let breakdown = source.memory_breakdown().await.expect("memory");
        assert!(breakdown.get("total").copied().unwrap_or(0) > 0);
        assert!(breakdown.get("atom").is_none());
    }

    #[tokio::test]
    async fn test_host_scheduling_has_no_dirty_work() {
        let source = HostStatSource::new();
        let counters = source.scheduling_counters().await.expect("counters");
        assert_eq!(counters.active_tasks, counters.active_tasks_all);
        assert_eq!(counters.run_queue, counters.run_queue_all);
    }

    #[tokio::test]
    async fn test_host_unsupported_facts() {
        let source = HostStatSource::new();
        assert!(source.counts().await.unwrap_err().is_unsupported());
        assert!(source.limits().await.unwrap_err().is_unsupported());
        assert!(source.since_start_counters().await.unwrap_err().is_unsupported());
    }

    #[test]
    fn test_host_without_runtime() {
        let source = HostStatSource::new();
        let result = tokio_test::block_on(source.scheduler_topology());
        assert!(result.unwrap_err().is_unsupported());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_host_feature_flags() {
        let flags = HostStatSource::new().feature_flags().await.expect("flags");
        assert_eq!(flags.word_size, std::mem::size_of::<usize>() as u64);
        assert!(flags.threads);
        assert_eq!(flags.version, None);
    }

    #[tokio::test]
    async fn test_host_current_thread_runtime_has_no_thread_support() {
        let flags = HostStatSource::new().feature_flags().await.expect("flags");
        assert!(!flags.threads);
    }

    #[tokio::test]
    async fn test_host_system_info_sample_has_no_version() {
        let source = HostStatSource::new();
        let collection = system_info::collect(&source).await;

        assert_eq!(collection.samples.len(), 1);
        let sample = &collection.samples[0];
        assert_eq!(sample.measurement("version"), None);
        assert!(sample.measurement("word_size_bytes").is_some());
        assert!(collection.failures.iter().all(StatError::is_unsupported));
    }

    #[tokio::test]
    async fn test_host_cpu_topology_after_light_refresh() {
        let topology = HostStatSource::new().topology().await.expect("topology");
        assert!(topology.logical_processors > 0);
        assert!(topology.available > 0);
    }
}
