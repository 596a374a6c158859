//! Idempotent destruction of a single resource
//!
//! Uniform steps across resource kinds: existence pre-check, best-effort
//! clearing of blocking configuration, then the delete call with bounded
//! exponential backoff. Every step is safe to run more than once, so a
//! resumed run can replay any attempt that never reached a terminal
//! state.

use crate::config::SweepConfig;
use crate::provider::{DeletePrimitive, ProviderError};
use crate::retry::{backoff_delays, sleep_cancellable};
use decom_common::{AttemptKey, AttemptStatus, DestructionAttempt, ResourceRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Reason recorded when the pre-check or delete finds nothing to remove
pub const REASON_ALREADY_ABSENT: &str = "already absent";

/// Reason recorded for dry-run attempts
pub const REASON_SIMULATED: &str = "simulated";

/// Executes the destroy operation for one resource at a time
pub struct DestroyerUnit {
    primitive: Arc<dyn DeletePrimitive>,
    max_attempts: u32,
    op_timeout: Duration,
    dry_run: bool,
    retry: crate::config::RetryConfig,
}

impl DestroyerUnit {
    pub fn new(primitive: Arc<dyn DeletePrimitive>, config: &SweepConfig) -> Self {
        Self {
            primitive,
            max_attempts: config.retry.max_attempts.max(1),
            op_timeout: config.timeouts.op_timeout,
            dry_run: config.dry_run,
            retry: config.retry.clone(),
        }
    }

    /// Destroy one resource, producing its journal attempt.
    ///
    /// Never panics and never returns early with an unrecorded error:
    /// every outcome maps to an attempt status. Cancellation leaves the
    /// attempt `Pending` for the next run.
    pub async fn destroy(
        &self,
        record: &ResourceRecord,
        phase: u8,
        cancel: &CancellationToken,
    ) -> DestructionAttempt {
        let key = AttemptKey::for_record(record);
        let mut attempt = DestructionAttempt::begin(key, phase);

        if self.dry_run {
            debug!(resource = %record.id, kind = %record.kind, "[DRY RUN] Would delete");
            return attempt.finish(
                AttemptStatus::Succeeded,
                Some(REASON_SIMULATED.to_string()),
            );
        }

        if cancel.is_cancelled() {
            return attempt;
        }

        // Idempotency pre-check: nothing to do if the resource is gone.
        match timeout(self.op_timeout, self.primitive.exists(record)).await {
            Ok(Ok(false)) => {
                debug!(resource = %record.id, kind = %record.kind, "Already absent");
                return attempt.finish(
                    AttemptStatus::Succeeded,
                    Some(REASON_ALREADY_ABSENT.to_string()),
                );
            }
            Ok(Ok(true)) => {}
            Ok(Err(e)) if e.is_not_found() => {
                return attempt.finish(
                    AttemptStatus::Succeeded,
                    Some(REASON_ALREADY_ABSENT.to_string()),
                );
            }
            Ok(Err(e)) => {
                // Pre-check is advisory; the delete call settles it.
                warn!(resource = %record.id, error = %e, "Existence check failed");
            }
            Err(_) => {
                warn!(resource = %record.id, "Existence check timed out");
            }
        }

        self.clear_blocking(record).await;

        let mut delays = backoff_delays(&self.retry);

        for attempt_number in 1..=self.max_attempts {
            attempt.attempt_number = attempt_number;

            if cancel.is_cancelled() {
                return attempt;
            }

            match timeout(self.op_timeout, self.primitive.delete(record)).await {
                Ok(Ok(())) => {
                    info!(resource = %record.id, kind = %record.kind, "Deleted");
                    return attempt.finish(AttemptStatus::Succeeded, None);
                }
                Ok(Err(e)) if e.is_not_found() => {
                    debug!(resource = %record.id, "Already deleted");
                    return attempt.finish(
                        AttemptStatus::Succeeded,
                        Some(REASON_ALREADY_ABSENT.to_string()),
                    );
                }
                Ok(Err(e)) if e.is_transient() => {
                    if attempt_number == self.max_attempts {
                        warn!(
                            resource = %record.id,
                            attempts = attempt_number,
                            error = %e,
                            "Retry ceiling reached"
                        );
                        return attempt.finish_with_error(
                            AttemptStatus::TimedOut,
                            Some("retry ceiling exceeded".to_string()),
                            e.to_string(),
                        );
                    }
                    let delay = delays.next().unwrap_or(self.retry.max_delay);
                    debug!(
                        resource = %record.id,
                        attempt = attempt_number,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Transient error, retrying"
                    );
                    if !sleep_cancellable(delay, cancel).await {
                        return attempt;
                    }
                }
                Ok(Err(e)) => {
                    warn!(resource = %record.id, kind = %record.kind, error = %e, "Delete failed");
                    let reason = terminal_reason(&e);
                    return attempt.finish_with_error(
                        AttemptStatus::Failed,
                        Some(reason.to_string()),
                        e.to_string(),
                    );
                }
                Err(_) => {
                    warn!(
                        resource = %record.id,
                        timeout_secs = self.op_timeout.as_secs(),
                        "Delete call timed out"
                    );
                    return attempt.finish(
                        AttemptStatus::TimedOut,
                        Some("delete call timed out".to_string()),
                    );
                }
            }
        }

        attempt
    }

    /// Clear configuration that blocks deletion.
    ///
    /// Best-effort: absent configuration is the expected case and other
    /// failures are left for the delete call to surface properly.
    async fn clear_blocking(&self, record: &ResourceRecord) {
        match timeout(self.op_timeout, self.primitive.clear_blocking_config(record)).await {
            Ok(Ok(())) => {}
            Ok(Err(ProviderError::NotConfigured)) => {
                debug!(resource = %record.id, "No blocking configuration to clear");
            }
            Ok(Err(e)) if e.is_not_found() => {
                debug!(resource = %record.id, "Blocking configuration already gone");
            }
            Ok(Err(e)) => {
                warn!(resource = %record.id, error = %e, "Failed to clear blocking configuration");
            }
            Err(_) => {
                warn!(resource = %record.id, "Clearing blocking configuration timed out");
            }
        }
    }
}

fn terminal_reason(error: &ProviderError) -> &'static str {
    match error {
        ProviderError::AccessDenied(_) => "access denied",
        ProviderError::PolicyRestricted(_) => "policy restricted",
        _ => "provider error",
    }
}
