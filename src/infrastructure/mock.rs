//! In-memory doubles for the runtime and the event pipeline.
//!
//! `StaticStatSource` also backs the server's `mock` source mode.

use crate::domain::errors::StatError;
use crate::domain::ports::{Emitter, StatSource};
use crate::domain::sample::Sample;
use crate::domain::stats::{
    CpuTopology, FeatureFlags, MemoryBreakdown, SchedulerTopology, SchedulingCounters,
    SinceStartCounters, SystemCounts, SystemLimits,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// A stat source returning fixed readings.
///
/// Individual accessors can be switched to `Unsupported`, and an artificial
/// latency can be added to every call (or to the first call of one accessor)
/// to simulate a slow runtime.
pub struct StaticStatSource {
    memory: MemoryBreakdown,
    counts: SystemCounts,
    scheduling: SchedulingCounters,
    since_start: SinceStartCounters,
    limits: SystemLimits,
    topology: CpuTopology,
    scheduler_topology: SchedulerTopology,
    feature_flags: FeatureFlags,
    unsupported: HashSet<&'static str>,
    latency: Duration,
    first_call_latency: HashMap<&'static str, Duration>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl StaticStatSource {
    /// Readings of a small, healthy runtime
    pub fn healthy() -> Self {
        let memory = [
            ("total", 1000),
            ("atom", 100),
            ("binary", 50),
            ("code", 200),
            ("ets", 30),
            ("processes", 400),
        ]
        .into_iter()
        .map(|(category, bytes)| (category.to_string(), bytes))
        .collect();

        Self {
            memory,
            counts: SystemCounts {
                process: 42,
                port: 7,
                atom: 12000,
                ets: 20,
            },
            scheduling: SchedulingCounters {
                active_tasks: 3,
                active_tasks_all: 5,
                run_queue: 1,
                run_queue_all: 2,
            },
            since_start: SinceStartCounters {
                context_switches: 9000,
                reductions: 123456,
                gc_count: 300,
                gc_words_reclaimed: 65536,
                io_in_bytes: 2048,
                io_out_bytes: 4096,
                wall_clock_ms: 60000,
            },
            limits: SystemLimits {
                ets: 8192,
                port: 65536,
                process: 262144,
                atom: 1048576,
                thread_pool_size: 1,
            },
            topology: CpuTopology {
                logical_processors: 8,
                available: 8,
                online: 8,
            },
            scheduler_topology: SchedulerTopology {
                dirty_cpu: 8,
                dirty_cpu_online: 8,
                dirty_io: 10,
                schedulers: 8,
                schedulers_online: 8,
            },
            feature_flags: FeatureFlags {
                smp: true,
                threads: true,
                time_correction: true,
                word_size: 8,
                version: Some("26".to_string()),
            },
            unsupported: HashSet::new(),
            latency: Duration::ZERO,
            first_call_latency: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_memory(mut self, memory: MemoryBreakdown) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_scheduling(mut self, scheduling: SchedulingCounters) -> Self {
        self.scheduling = scheduling;
        self
    }

    pub fn with_scheduler_topology(mut self, scheduler_topology: SchedulerTopology) -> Self {
        self.scheduler_topology = scheduler_topology;
        self
    }

    pub fn with_feature_flags(mut self, feature_flags: FeatureFlags) -> Self {
        self.feature_flags = feature_flags;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delays only the first call of the named accessor
    pub fn with_first_call_latency(mut self, accessor: &'static str, latency: Duration) -> Self {
        self.first_call_latency.insert(accessor, latency);
        self
    }

    /// Makes the named accessor (e.g. `"topology"`) fail with `Unsupported`
    pub fn unsupported(mut self, accessor: &'static str) -> Self {
        self.unsupported.insert(accessor);
        self
    }

    /// How many times the named accessor has been called
    pub fn call_count(&self, accessor: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(accessor).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    async fn read<T: Clone>(&self, accessor: &'static str, value: &T) -> Result<T, StatError> {
        let call = match self.calls.lock() {
            Ok(mut calls) => {
                let count = calls.entry(accessor).or_insert(0);
                *count += 1;
                *count
            }
            Err(_) => 0,
        };

        let latency = match self.first_call_latency.get(accessor) {
            Some(first) if call == 1 => *first,
            _ => self.latency,
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.unsupported.contains(accessor) {
            return Err(StatError::unsupported(accessor));
        }
        Ok(value.clone())
    }
}

impl Default for StaticStatSource {
    fn default() -> Self {
        Self::healthy()
    }
}

#[async_trait]
impl StatSource for StaticStatSource {
    async fn memory_breakdown(&self) -> Result<MemoryBreakdown, StatError> {
        self.read("memory_breakdown", &self.memory).await
    }

    async fn counts(&self) -> Result<SystemCounts, StatError> {
        self.read("counts", &self.counts).await
    }

    async fn scheduling_counters(&self) -> Result<SchedulingCounters, StatError> {
        self.read("scheduling_counters", &self.scheduling).await
    }

    async fn since_start_counters(&self) -> Result<SinceStartCounters, StatError> {
        self.read("since_start_counters", &self.since_start).await
    }

    async fn limits(&self) -> Result<SystemLimits, StatError> {
        self.read("limits", &self.limits).await
    }

    async fn topology(&self) -> Result<CpuTopology, StatError> {
        self.read("topology", &self.topology).await
    }

    async fn scheduler_topology(&self) -> Result<SchedulerTopology, StatError> {
        self.read("scheduler_topology", &self.scheduler_topology)
            .await
    }

    async fn feature_flags(&self) -> Result<FeatureFlags, StatError> {
        self.read("feature_flags", &self.feature_flags).await
    }
}

/// Emitter that keeps every published sample for later assertions
#[derive(Default)]
pub struct RecordingEmitter {
    samples: Mutex<Vec<Sample>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.samples
            .lock()
            .map(|samples| samples.clone())
            .unwrap_or_default()
    }

    pub fn samples_for(&self, publication_key: &str) -> Vec<Sample> {
        self.samples()
            .into_iter()
            .filter(|s| s.publication_key == publication_key)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Emitter for RecordingEmitter {
    fn publish(&self, sample: Sample) {
        if let Ok(mut samples) = self.samples.lock() {
            samples.push(sample);
        }
    }
}
