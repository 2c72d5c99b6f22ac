//! Host configuration checks
//!
//! Detects operating-system settings that degrade a server's reliability or
//! performance before it starts serving traffic.

/// Build-time information (timestamp, target, compiler)
pub mod build_info;

/// Threshold and provider configuration
pub mod config;

/// Degraded mode evaluation and reporting
pub mod health;

/// OS resource limit provider
pub mod provider;
