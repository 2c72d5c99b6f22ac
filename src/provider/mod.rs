//! Host resource provider
//!
//! Wraps the operating-system facility that reports resource limits and swap
//! configuration behind a narrow "query or fail" contract. The facility is
//! loaded at most once per [`ProviderHandle`]; afterwards the handle is either
//! ready (individual queries may still fail) or permanently unavailable.

use std::fmt;
use std::sync::OnceLock;

use thiserror::Error;
use tracing::info;

use crate::health::check::Metric;

pub mod system;

pub use system::{SystemLoader, SystemProvider};

/// Value reported for a limit that is not configured ("unlimited")
pub const UNLIMITED: u64 = u64::MAX;

/// Errors raised while loading the OS facility
#[derive(Debug, Error)]
pub enum InitError {
    /// The facility does not exist on this platform
    #[error("resource limits are not supported on {platform}")]
    Unsupported { platform: &'static str },
    /// The facility exists but could not be brought up
    #[error("resource provider unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by an individual metric query
#[derive(Debug, Error)]
pub enum QueryError {
    /// The provider was never initialized, or initialization failed
    #[error("resource provider is not ready")]
    NotReady,
    /// The underlying system call failed
    #[error("failed to query {metric}: {source}")]
    Os {
        metric: Metric,
        #[source]
        source: std::io::Error,
    },
    /// The metric is not available on this host
    #[error("{metric} is not supported on this host")]
    Unsupported { metric: Metric },
    /// Any other provider failure
    #[error("{0}")]
    Failed(String),
}

/// Capability surface of the OS introspection facility
///
/// Limits are reported as raw values with [`UNLIMITED`] standing in for "no
/// limit configured". Swap is reported in bytes.
pub trait ResourceProvider: Send + Sync {
    /// Maximum number of open file descriptors
    fn open_file_limit(&self) -> Result<u64, QueryError>;

    /// Maximum number of processes/threads
    fn process_limit(&self) -> Result<u64, QueryError>;

    /// Maximum virtual address space, in bytes
    fn address_space_limit(&self) -> Result<u64, QueryError>;

    /// Total configured swap, in bytes
    fn total_swap(&self) -> Result<u64, QueryError>;
}

/// Acquires a [`ResourceProvider`]
pub trait ProviderLoader {
    /// Attempts to bring up the provider
    fn load(&self) -> Result<Box<dyn ResourceProvider>, InitError>;
}

impl<F> ProviderLoader for F
where
    F: Fn() -> Result<Box<dyn ResourceProvider>, InitError>,
{
    fn load(&self) -> Result<Box<dyn ResourceProvider>, InitError> {
        self()
    }
}

/// Owned handle to the provider plus its one-time readiness state
pub struct ProviderHandle {
    loader: Box<dyn ProviderLoader + Send + Sync>,
    native: OnceLock<Option<Box<dyn ResourceProvider>>>,
}

impl ProviderHandle {
    /// Creates an uninitialized handle that will use `loader` on first
    /// [`initialize`](Self::initialize)
    pub fn new<L>(loader: L) -> Self
    where
        L: ProviderLoader + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            native: OnceLock::new(),
        }
    }

    /// Creates a handle backed by the host operating system
    pub fn system(loader: SystemLoader) -> Self {
        Self::new(loader)
    }

    /// Loads the provider, once. Later calls return the cached outcome.
    ///
    /// Failure is expected on some platforms and containers, so it is logged
    /// at info level and reported as `false`.
    pub fn initialize(&self) -> bool {
        self.native
            .get_or_init(|| {
                info!("Initializing host resource provider");
                match self.loader.load() {
                    Ok(provider) => Some(provider),
                    Err(e) => {
                        info!(error = %e, "Could not initialize host resource provider");
                        None
                    }
                }
            })
            .is_some()
    }

    /// Returns true once [`initialize`](Self::initialize) has succeeded
    pub fn is_ready(&self) -> bool {
        matches!(self.native.get(), Some(Some(_)))
    }

    fn provider(&self) -> Result<&dyn ResourceProvider, QueryError> {
        match self.native.get() {
            Some(Some(provider)) => Ok(provider.as_ref()),
            _ => Err(QueryError::NotReady),
        }
    }

    /// Queries the open file descriptor limit
    pub fn query_open_file_limit(&self) -> Result<u64, QueryError> {
        self.provider()?.open_file_limit()
    }

    /// Queries the process/thread limit
    pub fn query_process_limit(&self) -> Result<u64, QueryError> {
        self.provider()?.process_limit()
    }

    /// Queries the address space limit
    pub fn query_address_space_limit(&self) -> Result<u64, QueryError> {
        self.provider()?.address_space_limit()
    }

    /// Queries total configured swap
    pub fn query_total_swap(&self) -> Result<u64, QueryError> {
        self.provider()?.total_swap()
    }

    /// Dispatches to the query for `metric`
    pub fn query(&self, metric: Metric) -> Result<u64, QueryError> {
        match metric {
            Metric::OpenFiles => self.query_open_file_limit(),
            Metric::Processes => self.query_process_limit(),
            Metric::AddressSpace => self.query_address_space_limit(),
            Metric::Swap => self.query_total_swap(),
        }
    }
}

impl fmt::Debug for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.native.get() {
            None => "uninitialized",
            Some(Some(_)) => "ready",
            Some(None) => "unavailable",
        };
        f.debug_struct("ProviderHandle").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Fixed;

    impl ResourceProvider for Fixed {
        fn open_file_limit(&self) -> Result<u64, QueryError> {
            Ok(UNLIMITED)
        }

        fn process_limit(&self) -> Result<u64, QueryError> {
            Ok(4096)
        }

        fn address_space_limit(&self) -> Result<u64, QueryError> {
            Err(QueryError::Unsupported {
                metric: Metric::AddressSpace,
            })
        }

        fn total_swap(&self) -> Result<u64, QueryError> {
            Ok(0)
        }
    }

    fn counting_loader(
        loads: Arc<AtomicUsize>,
        succeed: bool,
    ) -> impl Fn() -> Result<Box<dyn ResourceProvider>, InitError> + Send + Sync {
        move || {
            loads.fetch_add(1, Ordering::SeqCst);
            if succeed {
                Ok(Box::new(Fixed) as Box<dyn ResourceProvider>)
            } else {
                Err(InitError::Unavailable("library missing".to_string()))
            }
        }
    }

    #[test]
    fn test_initialize_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let handle = ProviderHandle::new(counting_loader(loads.clone(), true));

        assert!(!handle.is_ready());
        assert!(handle.initialize());
        assert!(handle.initialize());
        assert!(handle.is_ready());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_initialize_is_cached() {
        let loads = Arc::new(AtomicUsize::new(0));
        let handle = ProviderHandle::new(counting_loader(loads.clone(), false));

        assert!(!handle.initialize());
        assert!(!handle.initialize());
        assert!(!handle.is_ready());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_query_before_initialize_is_not_ready() {
        let loads = Arc::new(AtomicUsize::new(0));
        let handle = ProviderHandle::new(counting_loader(loads.clone(), true));

        assert!(matches!(handle.query_open_file_limit(), Err(QueryError::NotReady)));
        assert!(matches!(handle.query_total_swap(), Err(QueryError::NotReady)));
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_query_after_failed_initialize_is_not_ready() {
        let handle = ProviderHandle::new(counting_loader(Arc::new(AtomicUsize::new(0)), false));
        handle.initialize();

        assert!(matches!(handle.query_process_limit(), Err(QueryError::NotReady)));
    }

    #[test]
    fn test_unlimited_sentinel_passes_through() {
        let handle = ProviderHandle::new(counting_loader(Arc::new(AtomicUsize::new(0)), true));
        handle.initialize();

        assert_eq!(handle.query_open_file_limit().unwrap(), UNLIMITED);
        assert_eq!(handle.query(Metric::Processes).unwrap(), 4096);
        assert!(matches!(
            handle.query(Metric::AddressSpace),
            Err(QueryError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_debug_shows_state() {
        let handle = ProviderHandle::new(counting_loader(Arc::new(AtomicUsize::new(0)), false));
        assert!(format!("{handle:?}").contains("uninitialized"));
        handle.initialize();
        assert!(format!("{handle:?}").contains("unavailable"));
    }
}
