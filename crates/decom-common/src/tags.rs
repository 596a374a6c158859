//! Preservation tag constants and preserved-name patterns
//!
//! Resources that must survive decommissioning carry these tags, applied
//! either by operators or by the preservation tagger.
//!
//! ## Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `decom:preserve` | `"true"` marks the resource as preserved |
//! | `decom:reason` | Human-readable reason the resource is preserved |

/// Tag key marking a resource as preserved
pub const TAG_PRESERVE: &str = "decom:preserve";

/// Tag value signalling preservation
pub const TAG_PRESERVE_VALUE: &str = "true";

/// Tag key carrying the preservation reason
pub const TAG_REASON: &str = "decom:reason";

/// Name fragments that mark a resource as preserved, with the reason.
///
/// Matched case-insensitively against resource ids and ARNs. These cover
/// the organizational scaffolding that must outlive the account sweep:
/// landing-zone plumbing, SSO and service-linked identity naming, the
/// company domain, and billing constructs.
pub const PRESERVE_PATTERNS: &[(&str, &str)] = &[
    ("controltower", "Control Tower landing zone resource"),
    ("aws-landing-zone", "Landing Zone resource"),
    ("organizationaccountaccessrole", "Organization management role"),
    ("awsreservedsso", "SSO managed resource"),
    ("aws-service-role", "Service-linked role"),
    ("modulairhr.com", "Company domain resource"),
    ("modulairhr", "Company resource"),
    ("aws-budgets", "Budgets resource"),
    ("savings-plan", "Savings Plan resource"),
];

/// Look up the preservation reason for a name, if any pattern matches.
pub fn preserved_name_reason(name: &str) -> Option<&'static str> {
    let lowered = name.to_lowercase();
    PRESERVE_PATTERNS
        .iter()
        .find(|(pattern, _)| lowered.contains(pattern))
        .map(|(_, reason)| *reason)
}

/// Check a tag set for the explicit preservation marker.
pub fn has_preserve_tag(tags: &[(String, String)]) -> bool {
    tags.iter()
        .any(|(k, v)| k == TAG_PRESERVE && v == TAG_PRESERVE_VALUE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_match_case_insensitively() {
        assert!(preserved_name_reason("AWSControlTowerExecution").is_some());
        assert!(preserved_name_reason("aws-controltower-BaselineCloudTrail").is_some());
        assert!(preserved_name_reason("StackSet-AWS-Landing-Zone-Baseline").is_some());
        assert!(preserved_name_reason("OrganizationAccountAccessRole").is_some());
        assert!(preserved_name_reason("mail.modulairhr.com").is_some());
        assert!(preserved_name_reason("app-server-prod").is_none());
    }

    #[test]
    fn preserve_tag_requires_exact_pair() {
        let tagged = vec![(TAG_PRESERVE.to_string(), TAG_PRESERVE_VALUE.to_string())];
        assert!(has_preserve_tag(&tagged));

        let wrong_value = vec![(TAG_PRESERVE.to_string(), "yes".to_string())];
        assert!(!has_preserve_tag(&wrong_value));

        let unrelated = vec![("team".to_string(), "platform".to_string())];
        assert!(!has_preserve_tag(&unrelated));
        assert!(!has_preserve_tag(&[]));
    }
}
