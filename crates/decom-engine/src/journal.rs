//! Run journal: the single shared record of destruction outcomes
//!
//! All concurrent workers write here, keyed by resource, under a mutex.
//! Terminal attempts are mirrored to the [`JournalStore`] so a later run
//! can resume: settled resources (succeeded or preserved) are never
//! re-attempted, while failed and timed-out ones are retried.

pub mod sqlite;

use async_trait::async_trait;
use decom_common::{AttemptKey, DestructionAttempt, RunSummary};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub use sqlite::SqliteJournalStore;

/// Durable keyed storage for attempts across runs
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Upsert one terminal attempt for the account
    async fn append(
        &self,
        run_id: &str,
        account_id: &str,
        attempt: &DestructionAttempt,
    ) -> anyhow::Result<()>;

    /// Read the latest recorded attempt per resource for the account
    async fn load_prior(&self, account_id: &str) -> anyhow::Result<Vec<DestructionAttempt>>;
}

/// In-run journal threaded through the scheduler and returned with the
/// report; never a process-wide singleton.
pub struct RunJournal {
    run_id: String,
    account_id: String,
    inner: Mutex<HashMap<AttemptKey, DestructionAttempt>>,
    store: Option<Arc<dyn JournalStore>>,
}

impl RunJournal {
    pub fn new(
        run_id: impl Into<String>,
        account_id: impl Into<String>,
        store: Option<Arc<dyn JournalStore>>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            account_id: account_id.into(),
            inner: Mutex::new(HashMap::new()),
            store,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Seed the journal with settled attempts from a previous run.
    ///
    /// Unsettled prior attempts (failed, timed out, pending) are dropped
    /// so the resources become eligible again.
    pub async fn preload(&self, prior: Vec<DestructionAttempt>) {
        let mut inner = self.inner.lock().await;
        for attempt in prior {
            if attempt.status.is_settled() {
                inner.insert(attempt.key.clone(), attempt);
            }
        }
    }

    /// True when the resource already reached a settled outcome.
    pub async fn is_settled(&self, key: &AttemptKey) -> bool {
        self.inner
            .lock()
            .await
            .get(key)
            .map(|a| a.status.is_settled())
            .unwrap_or(false)
    }

    /// Upsert an attempt; terminal attempts are mirrored to the store.
    ///
    /// Store failures are logged and swallowed: losing durability must
    /// not abort destruction that already happened.
    pub async fn record(&self, attempt: DestructionAttempt) {
        {
            let mut inner = self.inner.lock().await;
            inner.insert(attempt.key.clone(), attempt.clone());
        }

        if attempt.status.is_terminal() {
            if let Some(store) = &self.store {
                if let Err(e) = store.append(&self.run_id, &self.account_id, &attempt).await {
                    warn!(
                        resource = %attempt.key,
                        error = %e,
                        "Failed to persist journal entry"
                    );
                }
            }
            debug!(
                resource = %attempt.key,
                status = attempt.status.as_str(),
                "Journal entry recorded"
            );
        }
    }

    /// Snapshot of every attempt recorded so far
    pub async fn attempts(&self) -> Vec<DestructionAttempt> {
        self.inner.lock().await.values().cloned().collect()
    }

    /// Aggregate counts derived from the journal
    pub async fn summary(&self) -> RunSummary {
        let inner = self.inner.lock().await;
        RunSummary::from_attempts(inner.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decom_common::{AttemptStatus, ResourceKind};

    fn key(id: &str) -> AttemptKey {
        AttemptKey {
            kind: ResourceKind::S3Bucket,
            resource_id: id.to_string(),
            region: "global".to_string(),
        }
    }

    fn attempt(id: &str, status: AttemptStatus) -> DestructionAttempt {
        DestructionAttempt::begin(key(id), 0).finish(status, None)
    }

    #[tokio::test]
    async fn preload_keeps_only_settled_attempts() {
        let journal = RunJournal::new("run-1", "111122223333", None);
        journal
            .preload(vec![
                attempt("done", AttemptStatus::Succeeded),
                attempt("kept", AttemptStatus::Skipped),
                attempt("flaky", AttemptStatus::TimedOut),
                attempt("denied", AttemptStatus::Failed),
            ])
            .await;

        assert!(journal.is_settled(&key("done")).await);
        assert!(journal.is_settled(&key("kept")).await);
        assert!(!journal.is_settled(&key("flaky")).await);
        assert!(!journal.is_settled(&key("denied")).await);
        assert_eq!(journal.attempts().await.len(), 2);
    }

    #[tokio::test]
    async fn record_updates_by_key() {
        let journal = RunJournal::new("run-1", "111122223333", None);

        journal.record(attempt("bucket", AttemptStatus::TimedOut)).await;
        journal.record(attempt("bucket", AttemptStatus::Succeeded)).await;

        let attempts = journal.attempts().await;
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].status, AttemptStatus::Succeeded);
    }

    #[tokio::test]
    async fn summary_reflects_journal() {
        let journal = RunJournal::new("run-1", "111122223333", None);
        journal.record(attempt("a", AttemptStatus::Succeeded)).await;
        journal.record(attempt("b", AttemptStatus::Skipped)).await;

        let summary = journal.summary().await;
        assert_eq!(summary.totals.deleted, 1);
        assert_eq!(summary.totals.preserved, 1);
    }
}
