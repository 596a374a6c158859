//! Run summary projection over the journal

use crate::attempt::{AttemptStatus, DestructionAttempt};
use crate::resource_kind::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts for one slice of the journal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub deleted: usize,
    pub preserved: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub pending: usize,
}

impl OutcomeCounts {
    fn record(&mut self, status: AttemptStatus) {
        match status {
            AttemptStatus::Succeeded => self.deleted += 1,
            AttemptStatus::Skipped => self.preserved += 1,
            AttemptStatus::Failed => self.failed += 1,
            AttemptStatus::TimedOut => self.timed_out += 1,
            AttemptStatus::Pending => self.pending += 1,
        }
    }
}

/// Aggregate counts derived from the journal
///
/// A pure projection: computed from attempts, never separately mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub totals: OutcomeCounts,
    pub by_kind: BTreeMap<String, OutcomeCounts>,
    pub by_region: BTreeMap<String, OutcomeCounts>,
}

impl RunSummary {
    /// Build the summary from a journal snapshot.
    pub fn from_attempts<'a>(attempts: impl IntoIterator<Item = &'a DestructionAttempt>) -> Self {
        let mut summary = Self::default();
        for attempt in attempts {
            summary.totals.record(attempt.status);
            summary
                .by_kind
                .entry(attempt.key.kind.as_str().to_string())
                .or_default()
                .record(attempt.status);
            summary
                .by_region
                .entry(attempt.key.region.clone())
                .or_default()
                .record(attempt.status);
        }
        summary
    }

    /// Counts for one kind, zero if the kind never appeared.
    pub fn kind_counts(&self, kind: ResourceKind) -> OutcomeCounts {
        self.by_kind.get(kind.as_str()).copied().unwrap_or_default()
    }
}
