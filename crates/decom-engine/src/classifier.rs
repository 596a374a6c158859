//! Preservation classification
//!
//! Decides, per resource, whether it survives the sweep. Rules are
//! evaluated in order with first match winning; a failed tag lookup
//! always resolves to preserve, never to delete.

use crate::provider::{ProviderError, TagLookup};
use decom_common::tags::{has_preserve_tag, preserved_name_reason};
use decom_common::ResourceRecord;
use std::sync::Arc;
use tracing::warn;

/// Classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreservationOutcome {
    Preserve,
    Delete,
}

/// Decision for one resource, with the rule that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreservationDecision {
    pub outcome: PreservationOutcome,
    pub reason: String,
}

impl PreservationDecision {
    fn preserve(reason: impl Into<String>) -> Self {
        Self {
            outcome: PreservationOutcome::Preserve,
            reason: reason.into(),
        }
    }

    fn delete() -> Self {
        Self {
            outcome: PreservationOutcome::Delete,
            reason: "no preservation match".to_string(),
        }
    }

    pub fn is_preserve(&self) -> bool {
        self.outcome == PreservationOutcome::Preserve
    }
}

/// Tag availability for a resource at classification time
#[derive(Debug, Clone)]
pub enum TagState<'a> {
    /// Tags were retrieved (possibly empty)
    Known(&'a [(String, String)]),
    /// Tag retrieval failed; fail-safe rules apply
    LookupFailed,
}

/// Classify one resource. Total and pure: same inputs, same decision.
///
/// Rule order, first match wins:
/// 1. explicit preservation tag
/// 2. always-preserved resource catalogue
/// 3. preserved-name pattern on id or ARN
/// 4. delete
///
/// A failed tag lookup short-circuits to preserve. Misclassifying a
/// to-keep resource as delete is unrecoverable; the reverse merely
/// leaves residue.
pub fn classify(record: &ResourceRecord, tags: TagState<'_>) -> PreservationDecision {
    match tags {
        TagState::Known(tags) => {
            if has_preserve_tag(tags) {
                return PreservationDecision::preserve("explicit preservation tag");
            }
        }
        TagState::LookupFailed => {
            return PreservationDecision::preserve("tag lookup failed");
        }
    }

    if record.kind.is_protected() {
        return PreservationDecision::preserve("protected resource category");
    }

    if let Some(reason) = preserved_name_reason(&record.id) {
        return PreservationDecision::preserve(format!("name pattern match: {reason}"));
    }
    if let Some(arn) = &record.arn {
        if let Some(reason) = preserved_name_reason(arn) {
            return PreservationDecision::preserve(format!("name pattern match: {reason}"));
        }
    }

    PreservationDecision::delete()
}

/// Classifier that resolves missing tags through the lookup collaborator
pub struct PreservationClassifier {
    tag_lookup: Arc<dyn TagLookup>,
}

impl PreservationClassifier {
    pub fn new(tag_lookup: Arc<dyn TagLookup>) -> Self {
        Self { tag_lookup }
    }

    /// Classify a record, fetching tags when the scan did not capture
    /// them. Lookup errors resolve to preserve.
    pub async fn classify(&self, record: &ResourceRecord) -> PreservationDecision {
        if let Some(tags) = &record.tags {
            return classify(record, TagState::Known(tags));
        }

        match self.tag_lookup.resource_tags(record).await {
            Ok(tags) => classify(record, TagState::Known(&tags)),
            Err(e) => {
                warn!(
                    resource = %record.id,
                    kind = %record.kind,
                    error = %e,
                    "Tag lookup failed, preserving resource"
                );
                classify(record, TagState::LookupFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use decom_common::tags::{TAG_PRESERVE, TAG_PRESERVE_VALUE};
    use decom_common::ResourceKind;

    fn preserve_tags() -> Vec<(String, String)> {
        vec![(TAG_PRESERVE.to_string(), TAG_PRESERVE_VALUE.to_string())]
    }

    #[test]
    fn explicit_tag_wins() {
        let record = ResourceRecord::new(ResourceKind::S3Bucket, "app-data", None);
        let tags = preserve_tags();
        let decision = classify(&record, TagState::Known(&tags));
        assert!(decision.is_preserve());
        assert_eq!(decision.reason, "explicit preservation tag");
    }

    #[test]
    fn protected_category_without_tags() {
        let record = ResourceRecord::new(ResourceKind::IamRole, "deploy-role", None);
        let decision = classify(&record, TagState::Known(&[]));
        assert!(decision.is_preserve());
        assert_eq!(decision.reason, "protected resource category");
    }

    #[test]
    fn name_pattern_on_id() {
        let record = ResourceRecord::new(
            ResourceKind::CloudFormationStack,
            "aws-controltower-BaselineCloudTrail",
            Some("us-east-1"),
        );
        let decision = classify(&record, TagState::Known(&[]));
        assert!(decision.is_preserve());
        assert!(decision.reason.starts_with("name pattern match"));
    }

    #[test]
    fn name_pattern_on_arn() {
        let mut record = ResourceRecord::new(ResourceKind::S3Bucket, "mail-archive", None);
        record.arn = Some("arn:aws:s3:::mail.modulairhr.com".to_string());
        let decision = classify(&record, TagState::Known(&[]));
        assert!(decision.is_preserve());
    }

    #[test]
    fn unmatched_resource_is_deleted() {
        let record =
            ResourceRecord::new(ResourceKind::Ec2Instance, "i-0abc123", Some("us-west-2"));
        let decision = classify(&record, TagState::Known(&[]));
        assert_eq!(decision.outcome, PreservationOutcome::Delete);
        assert_eq!(decision.reason, "no preservation match");
    }

    #[test]
    fn lookup_failure_preserves_regardless_of_name() {
        // A plain app instance that would otherwise be deleted
        let record =
            ResourceRecord::new(ResourceKind::Ec2Instance, "i-0abc123", Some("us-west-2"));
        let decision = classify(&record, TagState::LookupFailed);
        assert!(decision.is_preserve());
        assert_eq!(decision.reason, "tag lookup failed");
    }

    #[test]
    fn deterministic_for_same_input() {
        let record = ResourceRecord::new(ResourceKind::LambdaFunction, "fn-report", Some("eu-west-1"));
        let first = classify(&record, TagState::Known(&[]));
        let second = classify(&record, TagState::Known(&[]));
        assert_eq!(first, second);
    }

    struct FailingLookup;

    #[async_trait]
    impl TagLookup for FailingLookup {
        async fn resource_tags(
            &self,
            _record: &ResourceRecord,
        ) -> Result<Vec<(String, String)>, ProviderError> {
            Err(ProviderError::Throttled)
        }
    }

    #[tokio::test]
    async fn classifier_applies_fail_safe_on_lookup_error() {
        let classifier = PreservationClassifier::new(Arc::new(FailingLookup));
        let record = ResourceRecord::new(ResourceKind::Ec2Instance, "i-untagged", Some("us-east-1"));
        let decision = classifier.classify(&record).await;
        assert!(decision.is_preserve());
        assert_eq!(decision.reason, "tag lookup failed");
    }

    #[tokio::test]
    async fn classifier_prefers_scan_time_tags() {
        // Lookup would fail, but the record already carries tags
        let classifier = PreservationClassifier::new(Arc::new(FailingLookup));
        let record = ResourceRecord::new(ResourceKind::Ec2Instance, "i-tagged", Some("us-east-1"))
            .with_tags(vec![]);
        let decision = classifier.classify(&record).await;
        assert_eq!(decision.outcome, PreservationOutcome::Delete);
    }
}
