//! Degraded mode health check
//!
//! Inspects operating-system configuration that hurts reliability or latency
//! under load (low descriptor/process limits, a capped address space, swap)
//! and reports it once at startup. Nothing here can fail the host process:
//! anything that cannot be determined is reported as unknown.
//!
//! # Example
//!
//! ```no_run
//! use hostcheck::health::{DegradedModeEvaluator, ThresholdTable};
//! use hostcheck::provider::{ProviderHandle, SystemLoader};
//!
//! let handle = ProviderHandle::system(SystemLoader::default());
//! handle.initialize();
//!
//! let evaluator = DegradedModeEvaluator::with_table(&handle, ThresholdTable::default());
//! if let Some(warning) = evaluator.run_degraded_mode_check() {
//!     eprintln!("{warning}");
//! }
//! ```

pub mod check;
pub mod evaluator;
pub mod reporter;

pub use check::{CheckResult, Metric, Rule, Threshold, ThresholdTable, evaluate};
pub use evaluator::{Assessment, DegradedModeEvaluator, DegradedWarning, MetricReading, Snapshot};
pub use reporter::{format_line, format_report, format_warning, print_report};

use crate::config::HostCheckConfig;
use crate::provider::{ProviderHandle, SystemLoader};

/// Initializes a system provider and runs the degraded mode check once
pub fn run_startup_check(config: &HostCheckConfig) -> Assessment {
    let handle = ProviderHandle::system(SystemLoader::new(config.limit_kind));
    handle.initialize();

    DegradedModeEvaluator::with_table(&handle, ThresholdTable::from_config(config)).assess()
}
