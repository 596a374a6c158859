//! Destruction attempts and their terminal statuses

use crate::record::ResourceRecord;
use crate::resource_kind::ResourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Journal key identifying one resource across runs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptKey {
    pub kind: ResourceKind,
    pub resource_id: String,
    /// Region sentinel: `global` for region-less resources
    pub region: String,
}

impl AttemptKey {
    pub fn for_record(record: &ResourceRecord) -> Self {
        Self {
            kind: record.kind,
            resource_id: record.id.clone(),
            region: record.region_key().to_string(),
        }
    }
}

impl std::fmt::Display for AttemptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.kind, self.region, self.resource_id)
    }
}

/// Outcome of one destruction attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptStatus {
    /// Not yet reached a terminal state; eligible for a future run
    Pending,
    /// Resource is gone (deleted, already absent, or simulated)
    Succeeded,
    /// Terminal provider error; retrying is pointless
    Failed,
    /// Preserved by classification; never destroyed
    Skipped,
    /// Retry ceiling or per-call timeout exhausted; retry next run
    TimedOut,
}

impl AttemptStatus {
    /// Terminal statuses are immutable once recorded.
    pub fn is_terminal(self) -> bool {
        !matches!(self, AttemptStatus::Pending)
    }

    /// Settled resources are never re-attempted by a resumed run.
    ///
    /// `Failed` and `TimedOut` stay unsettled so a future run retries
    /// them.
    pub fn is_settled(self) -> bool {
        matches!(self, AttemptStatus::Succeeded | AttemptStatus::Skipped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Pending => "pending",
            AttemptStatus::Succeeded => "succeeded",
            AttemptStatus::Failed => "failed",
            AttemptStatus::Skipped => "skipped",
            AttemptStatus::TimedOut => "timed_out",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let status = match s {
            "pending" => AttemptStatus::Pending,
            "succeeded" => AttemptStatus::Succeeded,
            "failed" => AttemptStatus::Failed,
            "skipped" => AttemptStatus::Skipped,
            "timed_out" => AttemptStatus::TimedOut,
            _ => return None,
        };
        Some(status)
    }
}

/// One record of trying to delete (or deciding to preserve) one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestructionAttempt {
    pub key: AttemptKey,
    /// Destruction phase the resource was scheduled in
    pub phase: u8,
    pub status: AttemptStatus,
    /// Short outcome qualifier: `already absent`, `simulated`,
    /// preservation reason, ...
    pub reason: Option<String>,
    /// Provider error detail for failed/timed-out attempts
    pub error: Option<String>,
    /// 1-based count of delete calls issued
    pub attempt_number: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl DestructionAttempt {
    /// Fresh pending attempt for a scheduled resource
    pub fn begin(key: AttemptKey, phase: u8) -> Self {
        Self {
            key,
            phase,
            status: AttemptStatus::Pending,
            reason: None,
            error: None,
            attempt_number: 0,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Skipped-preserved attempt, terminal on creation
    pub fn preserved(key: AttemptKey, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            key,
            phase: 0,
            status: AttemptStatus::Skipped,
            reason: Some(reason.into()),
            error: None,
            attempt_number: 0,
            started_at: now,
            ended_at: Some(now),
        }
    }

    /// Move to a terminal status, stamping the end time.
    pub fn finish(mut self, status: AttemptStatus, reason: Option<String>) -> Self {
        self.status = status;
        self.reason = reason;
        self.ended_at = Some(Utc::now());
        self
    }

    /// Terminal failure with error detail
    pub fn finish_with_error(
        mut self,
        status: AttemptStatus,
        reason: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        self.error = Some(error.into());
        self.finish(status, reason)
    }
}
