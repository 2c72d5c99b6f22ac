//! Tri-state check results, metrics and their acceptance rules

use std::fmt;

use crate::config::{HostCheckConfig, ThresholdConfig};
use crate::provider::{QueryError, UNLIMITED};

/// Outcome of a single metric check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckResult {
    /// Value was read and is acceptable
    Good,
    /// Value was read and is not acceptable
    Bad,
    /// Value could not be determined
    Unknown,
}

impl CheckResult {
    /// Returns true only for a confirmed bad value
    pub fn is_bad(&self) -> bool {
        matches!(self, CheckResult::Bad)
    }

    /// Returns the result as an upper-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckResult::Good => "GOOD",
            CheckResult::Bad => "BAD",
            CheckResult::Unknown => "UNKNOWN",
        }
    }

    /// Returns the result as a colored string
    pub fn as_colored_str(&self) -> String {
        use colored::Colorize;
        match self {
            CheckResult::Good => self.as_str().green().to_string(),
            CheckResult::Bad => self.as_str().red().to_string(),
            CheckResult::Unknown => self.as_str().yellow().to_string(),
        }
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A host setting inspected by the degraded mode check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Maximum open file descriptors
    OpenFiles,
    /// Maximum processes/threads for the user
    Processes,
    /// Maximum virtual address space
    AddressSpace,
    /// Total configured swap
    Swap,
}

impl Metric {
    /// All metrics, in report order
    pub const ALL: [Metric; 4] = [
        Metric::OpenFiles,
        Metric::Processes,
        Metric::AddressSpace,
        Metric::Swap,
    ];

    /// Stable machine-readable key
    pub fn key(&self) -> &'static str {
        match self {
            Metric::OpenFiles => "open_files",
            Metric::Processes => "processes",
            Metric::AddressSpace => "address_space",
            Metric::Swap => "swap",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Metric::OpenFiles => "open file limit",
            Metric::Processes => "process limit",
            Metric::AddressSpace => "address space limit",
            Metric::Swap => "swap",
        }
    }

    /// Formats an observed value in this metric's unit
    pub fn format_value(&self, value: u64) -> String {
        match self {
            Metric::Swap => format!("{} bytes", value),
            _ if value == UNLIMITED => "unlimited".to_string(),
            _ => value.to_string(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Acceptance rule applied to an observed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Unlimited, or at least the given value
    AtLeast(u64),
    /// Only unlimited is acceptable
    Unlimited,
    /// Only zero is acceptable
    Zero,
}

impl Rule {
    /// Returns true if `value` satisfies this rule
    pub fn accepts(&self, value: u64) -> bool {
        match *self {
            Rule::AtLeast(min) => value == UNLIMITED || value >= min,
            Rule::Unlimited => value == UNLIMITED,
            Rule::Zero => value == 0,
        }
    }

    /// Short description of what is required, used in warning text
    pub fn requirement(&self) -> String {
        match self {
            Rule::AtLeast(0) => "any".to_string(),
            Rule::AtLeast(min) => format!(">= {}", min),
            Rule::Unlimited => "unlimited".to_string(),
            Rule::Zero => "none".to_string(),
        }
    }
}

/// One row of the threshold table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    /// The metric this row applies to
    pub metric: Metric,
    /// Rule its value must satisfy
    pub rule: Rule,
}

/// Acceptance rules for every metric, in report order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdTable {
    entries: [Threshold; 4],
}

impl ThresholdTable {
    /// Minimum open file descriptors
    pub const MIN_OPEN_FILES: u64 = 10_000;

    /// Minimum processes/threads
    pub const MIN_PROCESSES: u64 = 32_768;

    /// Builds the table from configured policy
    pub fn from_config(config: &HostCheckConfig) -> Self {
        Self::from_thresholds(&config.thresholds)
    }

    /// Builds the table from threshold settings
    pub fn from_thresholds(t: &ThresholdConfig) -> Self {
        let address_space = if t.require_unlimited_address_space {
            Rule::Unlimited
        } else {
            Rule::AtLeast(0)
        };
        let swap = if t.allow_swap {
            Rule::AtLeast(0)
        } else {
            Rule::Zero
        };

        Self {
            entries: [
                Threshold {
                    metric: Metric::OpenFiles,
                    rule: Rule::AtLeast(t.min_open_files),
                },
                Threshold {
                    metric: Metric::Processes,
                    rule: Rule::AtLeast(t.min_processes),
                },
                Threshold {
                    metric: Metric::AddressSpace,
                    rule: address_space,
                },
                Threshold {
                    metric: Metric::Swap,
                    rule: swap,
                },
            ],
        }
    }

    /// Returns every entry, in report order
    pub fn entries(&self) -> &[Threshold] {
        &self.entries
    }

    /// Returns the rule for `metric`
    pub fn rule(&self, metric: Metric) -> Rule {
        self.entries
            .iter()
            .find(|t| t.metric == metric)
            .map(|t| t.rule)
            .unwrap_or(Rule::AtLeast(0))
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self::from_thresholds(&ThresholdConfig::default())
    }
}

/// Evaluates one metric
///
/// `ready` gates the query: when false, `query` is never called.
pub fn evaluate<Q, A>(ready: bool, query: Q, acceptable: A) -> CheckResult
where
    Q: FnOnce() -> Result<u64, QueryError>,
    A: FnOnce(u64) -> bool,
{
    evaluate_reading(ready, query, acceptable).0
}

/// Like [`evaluate`], also returning the observed value
pub(crate) fn evaluate_reading<Q, A>(
    ready: bool,
    query: Q,
    acceptable: A,
) -> (CheckResult, Option<u64>)
where
    Q: FnOnce() -> Result<u64, QueryError>,
    A: FnOnce(u64) -> bool,
{
    if !ready {
        return (CheckResult::Unknown, None);
    }

    match query() {
        Ok(value) if acceptable(value) => (CheckResult::Good, Some(value)),
        Ok(value) => (CheckResult::Bad, Some(value)),
        Err(_) => (CheckResult::Unknown, None),
    }
}
