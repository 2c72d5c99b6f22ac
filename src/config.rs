//! Host check configuration
//!
//! Supports multiple profiles (debug, release) with different thresholds.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::health::ThresholdTable;

/// Which resource limit value to report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    /// The limit currently enforced on the process
    #[default]
    Soft,
    /// The ceiling the soft limit may be raised to
    Hard,
}

/// Acceptance policy for each metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Minimum open file descriptors
    pub min_open_files: u64,
    /// Minimum processes/threads
    pub min_processes: u64,
    /// Whether a finite address space limit counts as bad
    pub require_unlimited_address_space: bool,
    /// Whether configured swap is acceptable
    pub allow_swap: bool,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_open_files: ThresholdTable::MIN_OPEN_FILES,
            min_processes: ThresholdTable::MIN_PROCESSES,
            require_unlimited_address_space: true,
            allow_swap: false,
        }
    }
}

/// Host check configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCheckConfig {
    /// The active profile (debug, release, etc.)
    pub profile: String,
    /// Which limit value the system provider reports
    #[serde(default)]
    pub limit_kind: LimitKind,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

impl HostCheckConfig {
    /// Loads configuration based on the specified profile
    ///
    /// Sources, later ones overriding earlier:
    /// 1. config/{profile}.toml
    /// 2. Environment variables with prefix HOSTCHECK_
    ///    (e.g., HOSTCHECK_THRESHOLDS__MIN_OPEN_FILES=65536)
    ///
    /// Config files are searched for in:
    /// 1. Next to the executable
    /// 2. In the current directory (./config)
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Self::find_config_dir().as_deref(), profile)
    }

    /// Loads configuration from an explicit config directory
    pub fn load_from(config_dir: Option<&Path>, profile: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(dir) = config_dir {
            let profile_path = dir.join(profile);
            builder = builder.add_source(File::from(profile_path.as_path()).required(false));
        } else {
            builder =
                builder.add_source(File::with_name(&format!("config/{}", profile)).required(false));
        }

        // Use __ as separator for nested fields (e.g., HOSTCHECK_THRESHOLDS__ALLOW_SWAP)
        builder = builder.add_source(
            Environment::with_prefix("HOSTCHECK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.set_override("profile", profile)?.build()?;

        config.try_deserialize()
    }

    /// Finds the config directory by searching in multiple locations
    fn find_config_dir() -> Option<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            let config_dir = exe_dir.join("config");
            if config_dir.exists() {
                return Some(config_dir);
            }
        }

        let cwd_config = PathBuf::from("config");
        if cwd_config.exists() {
            return Some(cwd_config);
        }

        None
    }

    /// Loads configuration using the HOSTCHECK_PROFILE environment variable,
    /// defaulting to "release"
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let profile = std::env::var("HOSTCHECK_PROFILE").unwrap_or_else(|_| "release".to_string());
        Self::load(&profile)
    }
}

impl Default for HostCheckConfig {
    fn default() -> Self {
        Self::load("release").unwrap_or_else(|_| Self {
            profile: "release".to_string(),
            limit_kind: LimitKind::Soft,
            thresholds: ThresholdConfig::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_missing_file_uses_builtin_policy() {
        let dir = tempfile::tempdir().unwrap();
        let config = HostCheckConfig::load_from(Some(dir.path()), "nonexistent").unwrap();

        assert_eq!(config.profile, "nonexistent");
        assert_eq!(config.limit_kind, LimitKind::Soft);
        assert_eq!(config.thresholds, ThresholdConfig::default());
    }

    #[test]
    fn test_profile_file_overrides_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("staging.toml"),
            r#"
limit_kind = "hard"

[thresholds]
min_open_files = 65536
allow_swap = true
"#,
        )
        .unwrap();

        let config = HostCheckConfig::load_from(Some(dir.path()), "staging").unwrap();

        assert_eq!(config.profile, "staging");
        assert_eq!(config.limit_kind, LimitKind::Hard);
        assert_eq!(config.thresholds.min_open_files, 65_536);
        assert_eq!(config.thresholds.min_processes, 32_768);
        assert!(config.thresholds.allow_swap);
        assert!(config.thresholds.require_unlimited_address_space);
    }

    #[test]
    fn test_invalid_limit_kind_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.toml"), "limit_kind = \"medium\"\n").unwrap();

        assert!(HostCheckConfig::load_from(Some(dir.path()), "broken").is_err());
    }
}
