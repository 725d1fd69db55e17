//! Raw readings returned by a [`StatSource`](crate::domain::ports::StatSource).
//!
//! These live only for the duration of one collection and are never stored.

use std::collections::BTreeMap;

/// Bytes allocated per memory category (`total`, `atom`, `binary`, ...)
pub type MemoryBreakdown = BTreeMap<String, u64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemCounts {
    pub process: u64,
    pub port: u64,
    pub atom: u64,
    pub ets: u64,
}

/// Task and run queue counts. The `_all` fields include auxiliary (dirty) work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulingCounters {
    pub active_tasks: u64,
    pub active_tasks_all: u64,
    pub run_queue: u64,
    pub run_queue_all: u64,
}

/// Cumulative counters owned by the runtime, counted from its start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SinceStartCounters {
    pub context_switches: u64,
    pub reductions: u64,
    pub gc_count: u64,
    pub gc_words_reclaimed: u64,
    pub io_in_bytes: u64,
    pub io_out_bytes: u64,
    pub wall_clock_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemLimits {
    pub ets: u64,
    pub port: u64,
    pub process: u64,
    pub atom: u64,
    pub thread_pool_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTopology {
    pub logical_processors: u64,
    pub available: u64,
    pub online: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchedulerTopology {
    pub dirty_cpu: u64,
    pub dirty_cpu_online: u64,
    pub dirty_io: u64,
    pub schedulers: u64,
    pub schedulers_online: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    pub smp: bool,
    pub threads: bool,
    pub time_correction: bool,
    pub word_size: u64,
    /// Runtime release string; `None` when the runtime does not expose one
    pub version: Option<String>,
}
