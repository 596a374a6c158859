//! Backoff schedules and cancellation-aware sleeping
//!
//! Delay schedules come from `backon::ExponentialBuilder`, consumed as a
//! plain iterator so the destroyer can interleave delays with its own
//! outcome classification.

use crate::config::RetryConfig;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Build the delay iterator for one resource's retry loop.
pub fn backoff_delays(config: &RetryConfig) -> impl Iterator<Item = Duration> {
    use backon::BackoffBuilder;

    backon::ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .with_jitter()
        .build()
}

/// Sleep for `delay`, returning `false` if cancelled first.
pub async fn sleep_cancellable(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = cancel.cancelled() => false,
    }
}
