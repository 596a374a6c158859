//! Post-run verification
//!
//! Recounts a small fixed set of high-signal resource kinds after the
//! sweep. Residue is a warning, not an error: the journal already
//! explains legitimately incomplete destruction (failed or timed-out
//! attempts).

use crate::provider::ResidueProbe;
use decom_common::{Account, ResourceKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Residue count for one sampled resource kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidueCount {
    pub kind: ResourceKind,
    pub region: Option<String>,
    pub count: usize,
}

/// Recounts sampled resource kinds after destruction completes
pub struct VerificationPass {
    probe: Arc<dyn ResidueProbe>,
    sample_region: String,
}

impl VerificationPass {
    pub fn new(probe: Arc<dyn ResidueProbe>, sample_region: impl Into<String>) -> Self {
        Self {
            probe,
            sample_region: sample_region.into(),
        }
    }

    /// Recount the sampled kinds and report non-zero residue.
    ///
    /// Probe errors are logged and the sample skipped; verification
    /// never fails the run.
    pub async fn verify(&self, account: &Account) -> Vec<ResidueCount> {
        let samples: [(ResourceKind, Option<&str>); 2] = [
            (ResourceKind::S3Bucket, None),
            (ResourceKind::Ec2Instance, Some(self.sample_region.as_str())),
        ];

        let mut residue = Vec::new();

        for (kind, region) in samples {
            match self.probe.count(kind, region).await {
                Ok(count) => {
                    if count == 0 {
                        info!(account = %account.id, kind = %kind, "Verified clean");
                    } else {
                        warn!(
                            account = %account.id,
                            kind = %kind,
                            region = region.unwrap_or("global"),
                            count,
                            "Residue remains after sweep"
                        );
                    }
                    residue.push(ResidueCount {
                        kind,
                        region: region.map(str::to_string),
                        count,
                    });
                }
                Err(e) => {
                    warn!(
                        account = %account.id,
                        kind = %kind,
                        error = %e,
                        "Verification recount failed"
                    );
                }
            }
        }

        residue
    }
}
