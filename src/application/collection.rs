use crate::application::groups;
use crate::domain::catalog::CollectorKind;
use crate::domain::errors::StatError;
use crate::domain::ports::StatSource;
use crate::domain::sample::Sample;

/// Outcome of one collection routine run: what was measured and what was skipped
#[derive(Debug, Default)]
pub struct Collection {
    pub samples: Vec<Sample>,
    pub failures: Vec<StatError>,
}

impl Collection {
    pub fn push(&mut self, sample: Sample) {
        if !sample.is_empty() {
            self.samples.push(sample);
        }
    }

    pub fn fail(&mut self, error: StatError) {
        self.failures.push(error);
    }

    /// Keeps the reading on success, records the failure otherwise
    pub fn record<T>(&mut self, result: Result<T, StatError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }
}

/// Runs the collection routine behind `kind` against `source`
pub async fn collect(kind: CollectorKind, source: &dyn StatSource) -> Collection {
    match kind {
        CollectorKind::Internal => groups::internal::collect(source).await,
        CollectorKind::Memory => groups::memory::collect(source).await,
        CollectorKind::CpuTopology => groups::cpu_topology::collect(source).await,
        CollectorKind::SystemLimits => groups::system_limits::collect(source).await,
        CollectorKind::SystemInfo => groups::system_info::collect(source).await,
        CollectorKind::SchedulerTopology => groups::scheduler_topology::collect(source).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_value_or_failure() {
        let mut collection = Collection::default();

        assert_eq!(collection.record::<u64>(Ok(7)), Some(7));
        assert_eq!(
            collection.record::<u64>(Err(StatError::unsupported("counts"))),
            None
        );

        assert_eq!(collection.failures.len(), 1);
        assert!(collection.failures[0].is_unsupported());
    }

    #[test]
    fn test_push_ignores_empty_samples() {
        let mut collection = Collection::default();
        collection.push(Sample::new("vm.system_info"));
        collection.push(Sample::new("vm.system_info").measure("word_size_bytes", 8.0));
        assert_eq!(collection.samples.len(), 1);
    }
}
