//! Provider error taxonomy and collaborator traits
//!
//! The engine reaches the cloud provider exclusively through the traits
//! in this module, and classifies provider failures by error code rather
//! than by string matching on debug output.

use async_trait::async_trait;
use decom_common::{Account, ResourceKind, ResourceRecord};
use thiserror::Error;

/// Provider error categories driving retry and journal outcomes
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Resource does not exist (already gone; counts as success in cleanup)
    #[error("Resource not found: {resource_id}")]
    NotFound { resource_id: String },

    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Resource still has dependent objects (retryable; dependents may be
    /// mid-deletion)
    #[error("Resource has dependent objects")]
    DependencyConflict,

    /// Caller lacks permission; retrying is pointless
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// A service control policy forbids the operation
    #[error("Operation restricted by policy: {0}")]
    PolicyRestricted(String),

    /// Blocking configuration (policy, lifecycle, protection flag) is not
    /// present on the resource; nothing to clear
    #[error("Configuration not present")]
    NotConfigured,

    /// Generic provider error with code and message
    #[error("Provider error: {message}")]
    Api {
        code: Option<String>,
        message: String,
    },
}

impl ProviderError {
    /// Check if this error means the resource is already gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }

    /// Check if this error is worth retrying with backoff
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderError::Throttled | ProviderError::DependencyConflict
        )
    }

    /// Check if this is a terminal error that must not be retried
    pub fn is_terminal(&self) -> bool {
        !self.is_transient() && !self.is_not_found()
    }
}

/// Known provider error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidInstanceID.NotFound",
    "InvalidVolume.NotFound",
    "InvalidSnapshot.NotFound",
    "InvalidGroup.NotFound",
    "InvalidVpcID.NotFound",
    "InvalidInternetGatewayID.NotFound",
    "NatGatewayNotFound",
    "NoSuchBucket",
    "NoSuchKey",
    "ResourceNotFoundException",
    "DBInstanceNotFound",
    "DBClusterNotFoundFault",
    "ClusterNotFoundException",
    "StackNotFound",
];

/// Known provider error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Known provider error codes for dependency conflicts (resource in use)
const DEPENDENCY_CODES: &[&str] = &[
    "DependencyViolation",
    "ResourceInUse",
    "ResourceInUseException",
    "InvalidDBInstanceState",
];

/// Known provider error codes for missing permissions
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "NotAuthorized",
];

/// Known provider error codes for policy-level restrictions
const POLICY_CODES: &[&str] = &[
    "OperationNotPermitted",
    "ScpViolation",
    "OrganizationsPolicyViolation",
];

/// Classify a provider error from its error code.
pub fn classify_provider_code(code: Option<&str>, message: Option<&str>) -> ProviderError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => ProviderError::NotFound {
            resource_id: message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => ProviderError::Throttled,
        Some(c) if DEPENDENCY_CODES.contains(&c) => ProviderError::DependencyConflict,
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => ProviderError::AccessDenied(message),
        Some(c) if POLICY_CODES.contains(&c) => ProviderError::PolicyRestricted(message),
        _ => ProviderError::Api {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Supplies a complete resource snapshot for one account
///
/// An absent or unreadable inventory is the only fatal error in the
/// engine; it aborts the run before any destructive call is issued.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn snapshot(&self, account: &Account) -> anyhow::Result<Vec<ResourceRecord>>;
}

/// Fetches tags for resources whose scan-time tags were unavailable
#[async_trait]
pub trait TagLookup: Send + Sync {
    async fn resource_tags(
        &self,
        record: &ResourceRecord,
    ) -> Result<Vec<(String, String)>, ProviderError>;
}

/// Applies tags to resources (used by the preservation tagger)
#[async_trait]
pub trait TagWriter: Send + Sync {
    async fn apply_tags(
        &self,
        record: &ResourceRecord,
        tags: &[(String, String)],
    ) -> Result<(), ProviderError>;
}

/// Idempotent delete operations for one provider
///
/// Implementations dispatch on `record.kind`. Every operation must be
/// safe to call more than once.
#[async_trait]
pub trait DeletePrimitive: Send + Sync {
    /// Existence pre-check; `Ok(false)` means the resource is already gone
    async fn exists(&self, record: &ResourceRecord) -> Result<bool, ProviderError>;

    /// Clear configuration that blocks deletion: disable termination or
    /// deletion protection, detach attachments, empty container-like
    /// resources. `NotFound`/`NotConfigured` are expected outcomes.
    async fn clear_blocking_config(&self, record: &ResourceRecord) -> Result<(), ProviderError>;

    /// Issue the delete call
    async fn delete(&self, record: &ResourceRecord) -> Result<(), ProviderError>;
}

/// Recounts residue for the verification pass
#[async_trait]
pub trait ResidueProbe: Send + Sync {
    /// Count resources of one kind, optionally scoped to a region
    async fn count(
        &self,
        kind: ResourceKind,
        region: Option<&str>,
    ) -> Result<usize, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_provider_code(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
            assert!(!err.is_terminal());
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_provider_code(Some(code), Some("msg"));
            assert!(err.is_transient(), "Expected transient for code: {code}");
            assert!(matches!(err, ProviderError::Throttled));
        }
    }

    #[test]
    fn dependency_codes() {
        for code in DEPENDENCY_CODES {
            let err = classify_provider_code(Some(code), Some("attached"));
            assert!(err.is_transient(), "Expected transient for code: {code}");
            assert!(matches!(err, ProviderError::DependencyConflict));
        }
    }

    #[test]
    fn access_denied_codes() {
        for code in ACCESS_DENIED_CODES {
            let err = classify_provider_code(Some(code), Some("msg"));
            assert!(err.is_terminal(), "Expected terminal for code: {code}");
            assert!(matches!(err, ProviderError::AccessDenied(_)));
        }
    }

    #[test]
    fn policy_codes() {
        for code in POLICY_CODES {
            let err = classify_provider_code(Some(code), Some("msg"));
            assert!(err.is_terminal(), "Expected terminal for code: {code}");
            assert!(matches!(err, ProviderError::PolicyRestricted(_)));
        }
    }

    #[test]
    fn unknown_and_missing_codes_are_terminal() {
        let err = classify_provider_code(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, ProviderError::Api { .. }));
        assert!(err.is_terminal());

        let err2 = classify_provider_code(None, Some("something failed"));
        assert!(matches!(err2, ProviderError::Api { code: None, .. }));
    }

    #[test]
    fn variant_checks() {
        assert!(ProviderError::Throttled.is_transient());
        assert!(ProviderError::DependencyConflict.is_transient());
        assert!(!ProviderError::AccessDenied("no".into()).is_transient());
        assert!(ProviderError::PolicyRestricted("scp".into()).is_terminal());
        assert!(
            ProviderError::NotFound {
                resource_id: "i-1".into()
            }
            .is_not_found()
        );
        assert!(!ProviderError::NotConfigured.is_transient());
    }
}
