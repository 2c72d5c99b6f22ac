//! hostcheck
//!
//! Reports operating-system configuration that degrades server reliability.
//! Run with: RUST_LOG=debug hostcheck --format table

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;

use hostcheck::build_info;
use hostcheck::config::HostCheckConfig;
use hostcheck::health::{self, DegradedModeEvaluator, ThresholdTable};
use hostcheck::provider::{ProviderHandle, SystemLoader};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// One consolidated line
    Line,
    /// Table with a summary
    Table,
}

#[derive(Debug, Parser)]
#[command(name = "hostcheck", version, long_version = build_info::long_version())]
struct Cli {
    /// Configuration profile (falls back to HOSTCHECK_PROFILE, then "release")
    #[arg(long)]
    profile: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Number of times to run the check
    #[arg(long, default_value_t = 1)]
    repeat: u32,
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.profile {
        Some(profile) => HostCheckConfig::load(profile),
        None => HostCheckConfig::load_from_env(),
    }
    .context("Failed to load hostcheck configuration")?;

    info!(profile = %config.profile, limit_kind = ?config.limit_kind, "Starting host check");

    let handle = ProviderHandle::system(SystemLoader::new(config.limit_kind));
    let ready = handle.initialize();
    info!(ready, "Host resource provider initialized");

    let table = ThresholdTable::from_config(&config);
    let evaluator = DegradedModeEvaluator::with_table(&handle, table);

    let mut exit_code = 0;
    for _ in 0..cli.repeat.max(1) {
        let assessment = evaluator.assess();
        match cli.format {
            Format::Line => println!("{}", health::format_line(&assessment)),
            Format::Table => health::print_report(&assessment, evaluator.table()),
        }
        exit_code = assessment.exit_code();
    }

    Ok(ExitCode::from(exit_code as u8))
}
