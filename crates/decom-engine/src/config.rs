//! Configuration types for the sweep engine

use std::time::Duration;

/// Retry policy for transient provider errors
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum delete calls per resource before the attempt times out
    pub max_attempts: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Cap for exponential delay growth
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Worker pool limits
#[derive(Debug, Clone)]
pub struct ConcurrencyConfig {
    /// Maximum `(region, kind)` partitions in flight at once,
    /// independent of resource count
    pub max_workers: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self { max_workers: 8 }
    }
}

/// Timeouts applied during execution
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Per provider call (exists / clear / delete)
    pub op_timeout: Duration,
    /// Whole-phase ceiling; an elapsed phase is abandoned as incomplete
    /// rather than hanging the run
    pub phase_timeout: Option<Duration>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_secs(60),
            phase_timeout: Some(Duration::from_secs(1800)),
        }
    }
}

/// Configuration for one sweep run
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub retry: RetryConfig,
    pub concurrency: ConcurrencyConfig,
    pub timeouts: TimeoutConfig,
    /// Pause between phases so the provider's listings converge before
    /// the next phase reads them
    pub barrier_delay: Duration,
    /// Representative region for the verification recount
    pub verify_region: String,
    /// Credential profiles whose accounts are policy-restricted; the
    /// whole run is skipped for them
    pub restricted_profiles: Vec<String>,
    /// Simulate deletions without calling the delete primitive
    pub dry_run: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            timeouts: TimeoutConfig::default(),
            barrier_delay: Duration::from_secs(30),
            verify_region: "us-east-1".to_string(),
            restricted_profiles: Vec::new(),
            // Safety default: destruction must be opted into
            dry_run: true,
        }
    }
}

impl SweepConfig {
    /// True when the account's profile is policy-restricted.
    pub fn is_restricted(&self, profile: &str) -> bool {
        self.restricted_profiles.iter().any(|p| p == profile)
    }
}
