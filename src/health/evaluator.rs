//! Degraded mode evaluation
//!
//! Runs every metric check against a [`ProviderHandle`] and folds the results
//! into a single decision: stay silent, or emit one warning naming every
//! metric.

use std::fmt;

use tracing::{debug, info, warn};

use super::check::{CheckResult, Metric, ThresholdTable, evaluate_reading};
use crate::provider::ProviderHandle;

/// Result of one metric check, with the value that was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricReading {
    /// The metric that was checked
    pub metric: Metric,
    /// Outcome of the check
    pub result: CheckResult,
    /// Observed value; `None` when the result is [`CheckResult::Unknown`]
    pub value: Option<u64>,
}

/// Results for all metrics from a single evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// One reading per metric, in report order
    pub readings: Vec<MetricReading>,
}

impl Snapshot {
    /// Returns true if any metric is confirmed bad
    pub fn has_bad(&self) -> bool {
        self.readings.iter().any(|r| r.result.is_bad())
    }

    /// Returns the result for `metric`, if it was checked
    pub fn result(&self, metric: Metric) -> Option<CheckResult> {
        self.readings
            .iter()
            .find(|r| r.metric == metric)
            .map(|r| r.result)
    }

    /// Counts readings with the given result
    pub fn count(&self, result: CheckResult) -> usize {
        self.readings.iter().filter(|r| r.result == result).count()
    }
}

/// The consolidated warning for a host in degraded mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedWarning {
    /// Every metric result, including unknown ones
    pub snapshot: Snapshot,
    pub(crate) table: ThresholdTable,
}

impl fmt::Display for DegradedWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::reporter::format_warning(&self.snapshot, &self.table))
    }
}

/// Outcome of a degraded mode check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    /// Provider was not ready; nothing was queried
    Skipped,
    /// No metric is confirmed bad
    Healthy(Snapshot),
    /// At least one metric is confirmed bad
    Degraded(DegradedWarning),
}

impl Assessment {
    /// Returns the metric results, unless the check was skipped
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match self {
            Assessment::Skipped => None,
            Assessment::Healthy(snapshot) => Some(snapshot),
            Assessment::Degraded(warning) => Some(&warning.snapshot),
        }
    }

    /// Returns the warning for a degraded host
    pub fn warning(&self) -> Option<&DegradedWarning> {
        match self {
            Assessment::Degraded(warning) => Some(warning),
            _ => None,
        }
    }

    /// Returns the exit code for this assessment
    /// 0 = healthy or skipped, 2 = degraded
    pub fn exit_code(&self) -> i32 {
        match self {
            Assessment::Degraded(_) => 2,
            _ => 0,
        }
    }
}

/// Evaluates host configuration against a threshold table
///
/// Holds no state of its own between calls; every run re-reads live values.
#[derive(Debug)]
pub struct DegradedModeEvaluator<'a> {
    handle: &'a ProviderHandle,
    table: ThresholdTable,
}

impl<'a> DegradedModeEvaluator<'a> {
    /// Creates an evaluator using the default threshold table
    pub fn new(handle: &'a ProviderHandle) -> Self {
        Self::with_table(handle, ThresholdTable::default())
    }

    /// Creates an evaluator using the given threshold table
    pub fn with_table(handle: &'a ProviderHandle, table: ThresholdTable) -> Self {
        Self { handle, table }
    }

    /// Returns the threshold table results are judged against
    pub fn table(&self) -> &ThresholdTable {
        &self.table
    }

    /// Evaluates every metric without logging
    ///
    /// Returns `None` without touching the provider if it is not ready.
    pub fn snapshot(&self) -> Option<Snapshot> {
        if !self.handle.is_ready() {
            return None;
        }

        let readings = self
            .table
            .entries()
            .iter()
            .map(|threshold| {
                let (result, value) = evaluate_reading(
                    true,
                    || self.handle.query(threshold.metric),
                    |v| threshold.rule.accepts(v),
                );
                debug!(metric = threshold.metric.key(), %result, ?value, "Host metric checked");
                MetricReading {
                    metric: threshold.metric,
                    result,
                    value,
                }
            })
            .collect();

        Some(Snapshot { readings })
    }

    /// Runs the check and logs the outcome
    ///
    /// Logs one info line when skipped and one warning when degraded; a
    /// healthy host logs nothing above debug.
    pub fn assess(&self) -> Assessment {
        let Some(snapshot) = self.snapshot() else {
            info!("Host resource provider unavailable, skipping degraded mode check");
            return Assessment::Skipped;
        };

        if snapshot.has_bad() {
            let warning = DegradedWarning {
                snapshot,
                table: self.table.clone(),
            };
            warn!("{}", warning);
            Assessment::Degraded(warning)
        } else {
            debug!(
                unknown = snapshot.count(CheckResult::Unknown),
                "Host configuration acceptable"
            );
            Assessment::Healthy(snapshot)
        }
    }

    /// Runs the check, returning the warning if the host is degraded
    pub fn run_degraded_mode_check(&self) -> Option<DegradedWarning> {
        match self.assess() {
            Assessment::Degraded(warning) => Some(warning),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{InitError, QueryError, ResourceProvider, UNLIMITED};

    struct Values([Result<u64, ()>; 4]);

    impl Values {
        fn get(&self, i: usize, metric: Metric) -> Result<u64, QueryError> {
            self.0[i].map_err(|_| QueryError::Unsupported { metric })
        }
    }

    impl ResourceProvider for Values {
        fn open_file_limit(&self) -> Result<u64, QueryError> {
            self.get(0, Metric::OpenFiles)
        }

        fn process_limit(&self) -> Result<u64, QueryError> {
            self.get(1, Metric::Processes)
        }

        fn address_space_limit(&self) -> Result<u64, QueryError> {
            self.get(2, Metric::AddressSpace)
        }

        fn total_swap(&self) -> Result<u64, QueryError> {
            self.get(3, Metric::Swap)
        }
    }

    fn handle(values: [Result<u64, ()>; 4]) -> ProviderHandle {
        let handle = ProviderHandle::new(move || -> Result<Box<dyn ResourceProvider>, InitError> {
            Ok(Box::new(Values(values)))
        });
        handle.initialize();
        handle
    }

    #[test]
    fn test_all_good_is_healthy() {
        let handle = handle([Ok(UNLIMITED), Ok(UNLIMITED), Ok(UNLIMITED), Ok(0)]);
        let evaluator = DegradedModeEvaluator::new(&handle);

        let assessment = evaluator.assess();
        assert!(matches!(assessment, Assessment::Healthy(_)));
        assert_eq!(assessment.exit_code(), 0);
        assert!(evaluator.run_degraded_mode_check().is_none());
    }

    #[test]
    fn test_all_unknown_is_healthy() {
        let handle = handle([Err(()), Err(()), Err(()), Err(())]);
        let evaluator = DegradedModeEvaluator::new(&handle);

        let assessment = evaluator.assess();
        let snapshot = assessment.snapshot().unwrap();
        assert_eq!(snapshot.count(CheckResult::Unknown), 4);
        assert!(assessment.warning().is_none());
    }

    #[test]
    fn test_unknown_values_are_not_recorded() {
        let handle = handle([Ok(1024), Err(()), Ok(UNLIMITED), Ok(0)]);
        let snapshot = DegradedModeEvaluator::new(&handle).snapshot().unwrap();

        assert_eq!(snapshot.readings[0].value, Some(1024));
        assert_eq!(snapshot.readings[1].value, None);
        assert_eq!(snapshot.result(Metric::Processes), Some(CheckResult::Unknown));
    }

    #[test]
    fn test_bad_metric_produces_warning() {
        let handle = handle([Ok(1024), Err(()), Ok(UNLIMITED), Ok(0)]);
        let warning = DegradedModeEvaluator::new(&handle)
            .run_degraded_mode_check()
            .unwrap();

        assert_eq!(warning.snapshot.readings.len(), 4);
        assert_eq!(warning.snapshot.result(Metric::OpenFiles), Some(CheckResult::Bad));
    }

    #[test]
    fn test_unavailable_provider_is_skipped() {
        let handle = ProviderHandle::new(|| -> Result<Box<dyn ResourceProvider>, InitError> {
            Err(InitError::Unsupported { platform: "test" })
        });
        handle.initialize();

        let evaluator = DegradedModeEvaluator::new(&handle);
        assert_eq!(evaluator.assess(), Assessment::Skipped);
        assert!(evaluator.snapshot().is_none());
    }
}
