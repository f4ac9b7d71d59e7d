//! Engine configuration
//!
//! All tunables live in one explicit struct handed to the engine at
//! construction time; nothing is read from ambient process state.
use std::path::PathBuf;

/// Hard per-call deadline, in seconds
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 600;

/// Width of one time slice, in seconds (one day)
pub const DEFAULT_SLICE_SECONDS: u64 = 86_400;

/// How long cache entries for open-ended queries stay valid, in days
pub const DEFAULT_CACHE_VALIDITY_DAYS: u32 = 3;

/// Default export range: this many days back from today
pub const DEFAULT_LOOKBACK_DAYS: u32 = 7;

/// Configuration for the audit export engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Program invoked by the CLI transport (an already-authenticated
    /// provider CLI)
    pub executor_program: PathBuf,
    /// Hard deadline applied to every single query
    pub call_timeout_secs: u64,
    /// Width of the time slices the export range is partitioned into
    pub slice_seconds: u64,
    /// Whether responses are cached on disk
    pub cache_enabled: bool,
    /// Directory holding the cache index and payload files
    pub cache_dir: Option<PathBuf>,
    /// Age limit for cached responses of queries without explicit time bounds
    pub cache_validity_days: u32,
    /// Default export range when the caller does not supply dates
    pub lookback_days: u32,
    /// Region identifier used to scope cache keys
    pub region: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            executor_program: PathBuf::from("oci"),
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            slice_seconds: DEFAULT_SLICE_SECONDS,
            cache_enabled: false,
            cache_dir: None,
            cache_validity_days: DEFAULT_CACHE_VALIDITY_DAYS,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            region: None,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with all defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executor program for the CLI transport
    #[must_use]
    pub fn with_executor(mut self, program: impl Into<PathBuf>) -> Self {
        self.executor_program = program.into();
        self
    }

    /// Override the per-call deadline
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.call_timeout_secs = secs;
        self
    }

    /// Override the time slice width
    #[must_use]
    pub fn with_slice_seconds(mut self, secs: u64) -> Self {
        self.slice_seconds = secs;
        self
    }

    /// Enable response caching in the given directory
    #[must_use]
    pub fn with_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_enabled = true;
        self.cache_dir = Some(dir.into());
        self
    }

    /// Override the validity window for open-ended cache entries
    #[must_use]
    pub fn with_cache_validity_days(mut self, days: u32) -> Self {
        self.cache_validity_days = days;
        self
    }

    /// Override the default lookback used when no dates are supplied
    #[must_use]
    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// Scope cache keys to a region
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.call_timeout_secs, 600);
        assert_eq!(config.slice_seconds, 86_400);
        assert_eq!(config.cache_validity_days, 3);
        assert!(!config.cache_enabled);
        assert!(config.cache_dir.is_none());
        assert!(config.region.is_none());
    }

    #[test]
    fn test_with_cache_enables_caching() {
        let config = EngineConfig::new().with_cache("/tmp/audit-cache");
        assert!(config.cache_enabled);
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/audit-cache")));
    }

    #[test]
    fn test_builder_chaining() {
        let config = EngineConfig::new()
            .with_executor("/usr/local/bin/oci")
            .with_timeout_secs(30)
            .with_slice_seconds(3_600)
            .with_region("eu-frankfurt-1");
        assert_eq!(config.executor_program, PathBuf::from("/usr/local/bin/oci"));
        assert_eq!(config.call_timeout_secs, 30);
        assert_eq!(config.slice_seconds, 3_600);
        assert_eq!(config.region.as_deref(), Some("eu-frankfurt-1"));
    }
}
