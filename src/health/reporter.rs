//! Formatting and reporting for degraded mode assessments

use colored::Colorize;
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use super::check::{CheckResult, ThresholdTable};
use super::evaluator::{Assessment, MetricReading, Snapshot};

/// Formats the single-line warning listing every metric and its result
///
/// Example: `Host is running in degraded mode: open file limit=BAD (1024,
/// need >= 10000), process limit=UNKNOWN, address space limit=GOOD
/// (unlimited), swap=GOOD (0 bytes)`
pub fn format_warning(snapshot: &Snapshot, table: &ThresholdTable) -> String {
    let parts: Vec<String> = snapshot
        .readings
        .iter()
        .map(|reading| format_reading(reading, table))
        .collect();

    format!("Host is running in degraded mode: {}", parts.join(", "))
}

fn format_reading(reading: &MetricReading, table: &ThresholdTable) -> String {
    let label = reading.metric.label();
    match (reading.result, reading.value) {
        (CheckResult::Bad, Some(value)) => format!(
            "{}={} ({}, need {})",
            label,
            reading.result,
            reading.metric.format_value(value),
            table.rule(reading.metric).requirement()
        ),
        (_, Some(value)) => format!(
            "{}={} ({})",
            label,
            reading.result,
            reading.metric.format_value(value)
        ),
        (_, None) => format!("{}={}", label, reading.result),
    }
}

/// Formats an assessment as a single plain line
///
/// A degraded assessment is rendered against the thresholds it was evaluated
/// with.
pub fn format_line(assessment: &Assessment) -> String {
    match assessment {
        Assessment::Skipped => {
            "Degraded mode check skipped: host resource provider unavailable".to_string()
        }
        Assessment::Healthy(snapshot) => {
            let unknown = snapshot.count(CheckResult::Unknown);
            if unknown > 0 {
                format!(
                    "Host configuration acceptable ({} of {} checks could not be determined)",
                    unknown,
                    snapshot.readings.len()
                )
            } else {
                "Host configuration acceptable".to_string()
            }
        }
        Assessment::Degraded(warning) => warning.to_string(),
    }
}

/// Formats an assessment as a pretty table
pub fn format_report(assessment: &Assessment, table: &ThresholdTable) -> String {
    let Some(snapshot) = assessment.snapshot() else {
        return format!("{}\n", format_line(assessment).yellow());
    };

    let mut builder = Builder::default();
    builder.push_record(["Metric", "Result", "Value", "Required"]);

    for reading in &snapshot.readings {
        let value = reading
            .value
            .map(|v| reading.metric.format_value(v))
            .unwrap_or_else(|| "-".to_string());
        builder.push_record([
            reading.metric.label().to_string(),
            reading.result.as_colored_str(),
            value,
            table.rule(reading.metric).requirement(),
        ]);
    }

    let mut rendered = builder.build();
    rendered
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    let mut output = String::new();
    output.push_str(&rendered.to_string());
    output.push('\n');

    output.push_str(&format_summary(assessment, snapshot));

    output
}

/// Formats the summary section of the report
fn format_summary(assessment: &Assessment, snapshot: &Snapshot) -> String {
    let mut summary = String::new();

    summary.push_str(&format!("\n{}\n", "Summary".bold().underline()));
    summary.push_str(&format!("  Total checks: {}\n", snapshot.readings.len()));
    summary.push_str(&format!(
        "  {} Good: {}\n",
        "✓".green(),
        snapshot.count(CheckResult::Good)
    ));

    let unknown = snapshot.count(CheckResult::Unknown);
    if unknown > 0 {
        summary.push_str(&format!("  {} Unknown: {}\n", "?".yellow(), unknown));
    }

    let bad = snapshot.count(CheckResult::Bad);
    if bad > 0 {
        summary.push_str(&format!("  {} Bad: {}\n", "✗".red(), bad));
    }

    summary.push('\n');
    match assessment {
        Assessment::Degraded(_) => {
            summary.push_str(&format!("  {}\n", "Overall: DEGRADED".red().bold()));
        }
        _ if unknown > 0 => {
            summary.push_str(&format!(
                "  {}\n",
                "Overall: ACCEPTABLE (partially unknown)".yellow().bold()
            ));
        }
        _ => {
            summary.push_str(&format!("  {}\n", "Overall: ACCEPTABLE".green().bold()));
        }
    }

    summary
}

/// Prints an assessment to stdout
pub fn print_report(assessment: &Assessment, table: &ThresholdTable) {
    println!("{}", format_report(assessment, table));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdConfig;
    use crate::health::check::Metric;
    use crate::health::evaluator::DegradedWarning;
    use crate::provider::UNLIMITED;

    fn snapshot() -> Snapshot {
        Snapshot {
            readings: vec![
                MetricReading {
                    metric: Metric::OpenFiles,
                    result: CheckResult::Bad,
                    value: Some(1024),
                },
                MetricReading {
                    metric: Metric::Processes,
                    result: CheckResult::Unknown,
                    value: None,
                },
                MetricReading {
                    metric: Metric::AddressSpace,
                    result: CheckResult::Good,
                    value: Some(UNLIMITED),
                },
                MetricReading {
                    metric: Metric::Swap,
                    result: CheckResult::Good,
                    value: Some(0),
                },
            ],
        }
    }

    #[test]
    fn test_warning_lists_every_metric() {
        let line = format_warning(&snapshot(), &ThresholdTable::default());

        assert_eq!(
            line,
            "Host is running in degraded mode: open file limit=BAD (1024, need >= 10000), \
             process limit=UNKNOWN, address space limit=GOOD (unlimited), swap=GOOD (0 bytes)"
        );
    }

    #[test]
    fn test_skipped_line() {
        let line = format_line(&Assessment::Skipped);
        assert!(line.contains("skipped"));
    }

    #[test]
    fn test_degraded_line_uses_warning_thresholds() {
        let strict = ThresholdTable::from_thresholds(&ThresholdConfig {
            min_open_files: 65_536,
            ..ThresholdConfig::default()
        });
        let assessment = Assessment::Degraded(DegradedWarning {
            snapshot: snapshot(),
            table: strict,
        });

        let line = format_line(&assessment);
        assert!(line.contains("need >= 65536"), "{line}");
        assert!(!line.contains("need >= 10000"), "{line}");
    }

    #[test]
    fn test_report_contains_all_metrics() {
        let assessment = Assessment::Healthy(snapshot());
        let report = format_report(&assessment, &ThresholdTable::default());

        for metric in Metric::ALL {
            assert!(report.contains(metric.label()), "missing {metric}");
        }
        assert!(report.contains("Unknown: 1"));
    }
}
