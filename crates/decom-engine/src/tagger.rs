//! Preservation tagging
//!
//! Resources preserved by category or name pattern get explicit
//! `decom:preserve` / `decom:reason` tags written back, so later runs
//! (and anyone auditing the account) see the decision without re-running
//! pattern matching. Best-effort throughout.

use crate::classifier::PreservationDecision;
use crate::provider::TagWriter;
use decom_common::tags::{has_preserve_tag, TAG_PRESERVE, TAG_PRESERVE_VALUE, TAG_REASON};
use decom_common::ResourceRecord;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counts from one tagging sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaggingReport {
    pub tagged: usize,
    pub already_tagged: usize,
    pub failed: usize,
}

/// Writes preservation markers onto preserved resources
pub struct PreservationTagger {
    writer: Arc<dyn TagWriter>,
}

impl PreservationTagger {
    pub fn new(writer: Arc<dyn TagWriter>) -> Self {
        Self { writer }
    }

    /// Tag every preserved resource that does not already carry the
    /// marker. Failures are logged and counted, never fatal.
    pub async fn tag_preserved(
        &self,
        preserved: &[(ResourceRecord, PreservationDecision)],
    ) -> TaggingReport {
        let mut report = TaggingReport::default();

        for (record, decision) in preserved {
            if record
                .tags
                .as_deref()
                .is_some_and(has_preserve_tag)
            {
                report.already_tagged += 1;
                continue;
            }

            let tags = [
                (TAG_PRESERVE.to_string(), TAG_PRESERVE_VALUE.to_string()),
                (TAG_REASON.to_string(), decision.reason.clone()),
            ];

            match self.writer.apply_tags(record, &tags).await {
                Ok(()) => {
                    debug!(resource = %record.id, reason = %decision.reason, "Tagged for preservation");
                    report.tagged += 1;
                }
                Err(e) => {
                    warn!(resource = %record.id, error = %e, "Failed to apply preservation tag");
                    report.failed += 1;
                }
            }
        }

        info!(
            tagged = report.tagged,
            already_tagged = report.already_tagged,
            failed = report.failed,
            "Preservation tagging complete"
        );

        report
    }
}
