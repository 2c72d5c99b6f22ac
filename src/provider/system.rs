//! Provider backed by the host operating system
//!
//! Resource limits come from `getrlimit(2)`; swap size comes from `sysinfo`.

use sysinfo::System;

use super::{InitError, ProviderLoader, QueryError, ResourceProvider};
use crate::config::LimitKind;
use crate::health::check::Metric;

/// Loads a [`SystemProvider`] reporting the configured limit kind
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLoader {
    kind: LimitKind,
}

impl SystemLoader {
    /// Creates a loader for providers reporting `kind` limits
    pub fn new(kind: LimitKind) -> Self {
        Self { kind }
    }
}

impl ProviderLoader for SystemLoader {
    fn load(&self) -> Result<Box<dyn ResourceProvider>, InitError> {
        SystemProvider::new(self.kind).map(|p| Box::new(p) as Box<dyn ResourceProvider>)
    }
}

/// Reads live resource limits and swap configuration from the host
#[derive(Debug)]
pub struct SystemProvider {
    kind: LimitKind,
}

impl SystemProvider {
    /// Probes the host once; fails if limits or memory statistics are not
    /// available on this platform
    pub fn new(kind: LimitKind) -> Result<Self, InitError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(InitError::Unsupported {
                platform: std::env::consts::OS,
            });
        }

        rlimit::probe()?;

        Ok(Self { kind })
    }
}

impl ResourceProvider for SystemProvider {
    fn open_file_limit(&self) -> Result<u64, QueryError> {
        rlimit::read(Metric::OpenFiles, self.kind)
    }

    fn process_limit(&self) -> Result<u64, QueryError> {
        rlimit::read(Metric::Processes, self.kind)
    }

    fn address_space_limit(&self) -> Result<u64, QueryError> {
        rlimit::read(Metric::AddressSpace, self.kind)
    }

    fn total_swap(&self) -> Result<u64, QueryError> {
        let mut sys = System::new();
        sys.refresh_memory();
        swap_reading(sys.total_memory(), sys.total_swap())
    }
}

/// Validates a swap total read from memory statistics
///
/// sysinfo leaves every counter at zero when the statistics cannot be read,
/// so zero total memory means the swap size is unknown rather than zero.
fn swap_reading(total_memory: u64, total_swap: u64) -> Result<u64, QueryError> {
    if total_memory == 0 {
        return Err(QueryError::Failed("memory statistics could not be read".to_string()));
    }
    Ok(total_swap)
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "freebsd"
))]
mod rlimit {
    use crate::config::LimitKind;
    use crate::health::check::Metric;
    use crate::provider::{InitError, QueryError, UNLIMITED};

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    type Resource = libc::__rlimit_resource_t;
    #[cfg(not(all(target_os = "linux", target_env = "gnu")))]
    type Resource = libc::c_int;

    fn resource(metric: Metric) -> Option<Resource> {
        match metric {
            Metric::OpenFiles => Some(libc::RLIMIT_NOFILE),
            Metric::Processes => Some(libc::RLIMIT_NPROC),
            Metric::AddressSpace => Some(libc::RLIMIT_AS),
            Metric::Swap => None,
        }
    }

    pub(super) fn probe() -> Result<(), InitError> {
        read(Metric::OpenFiles, LimitKind::Soft)
            .map(|_| ())
            .map_err(|e| InitError::Unavailable(e.to_string()))
    }

    pub(super) fn read(metric: Metric, kind: LimitKind) -> Result<u64, QueryError> {
        let resource = resource(metric).ok_or(QueryError::Unsupported { metric })?;

        let mut limit = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: getrlimit only writes into the rlimit struct we own.
        let ret = unsafe { libc::getrlimit(resource, &mut limit) };
        if ret != 0 {
            return Err(QueryError::Os {
                metric,
                source: std::io::Error::last_os_error(),
            });
        }

        let value = match kind {
            LimitKind::Soft => limit.rlim_cur,
            LimitKind::Hard => limit.rlim_max,
        };

        // rlim_t is u32 on 32-bit Linux and i64 on FreeBSD
        if value == libc::RLIM_INFINITY {
            Ok(UNLIMITED)
        } else {
            Ok(value as u64)
        }
    }
}

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "freebsd"
)))]
mod rlimit {
    use crate::config::LimitKind;
    use crate::health::check::Metric;
    use crate::provider::{InitError, QueryError};

    pub(super) fn probe() -> Result<(), InitError> {
        Err(InitError::Unsupported {
            platform: std::env::consts::OS,
        })
    }

    pub(super) fn read(metric: Metric, _kind: LimitKind) -> Result<u64, QueryError> {
        Err(QueryError::Unsupported { metric })
    }
}
