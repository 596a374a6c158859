//! Shared test collaborators for scheduler integration tests
//!
//! `FakeCloud` implements every provider trait against an in-memory
//! resource set and records each primitive call in order, so tests can
//! assert both outcomes and call sequencing.

use async_trait::async_trait;
use decom_common::{Account, ResourceKind, ResourceRecord};
use decom_engine::config::{RetryConfig, SweepConfig, TimeoutConfig};
use decom_engine::provider::{
    DeletePrimitive, InventorySource, ProviderError, ResidueProbe, TagLookup,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Initialize test logging once; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One recorded primitive call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Exists(String),
    Clear(String),
    Delete(String),
}

/// In-memory cloud with scripted failures
#[derive(Default)]
pub struct FakeCloud {
    resources: Mutex<Vec<ResourceRecord>>,
    calls: Mutex<Vec<Call>>,
    /// Resource ids whose tag lookup fails
    pub fail_tags_for: HashSet<String>,
    /// Resource ids denied by IAM on delete
    pub deny_delete: HashSet<String>,
    /// Remaining transient delete failures per resource id
    transient: Mutex<HashMap<String, u32>>,
}

impl FakeCloud {
    pub fn with_resources(resources: Vec<ResourceRecord>) -> Self {
        Self {
            resources: Mutex::new(resources),
            ..Default::default()
        }
    }

    /// Script `count` transient failures before deletes of `id` succeed
    pub fn fail_transiently(&self, id: &str, count: u32) {
        self.transient.lock().unwrap().insert(id.to_string(), count);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Order of successful-path delete calls, by resource id
    pub fn delete_order(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn remaining_ids(&self) -> Vec<String> {
        self.resources
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl InventorySource for FakeCloud {
    async fn snapshot(&self, _account: &Account) -> anyhow::Result<Vec<ResourceRecord>> {
        Ok(self.resources.lock().unwrap().clone())
    }
}

#[async_trait]
impl TagLookup for FakeCloud {
    async fn resource_tags(
        &self,
        record: &ResourceRecord,
    ) -> Result<Vec<(String, String)>, ProviderError> {
        if self.fail_tags_for.contains(&record.id) {
            return Err(ProviderError::Throttled);
        }
        Ok(Vec::new())
    }
}

#[async_trait]
impl DeletePrimitive for FakeCloud {
    async fn exists(&self, record: &ResourceRecord) -> Result<bool, ProviderError> {
        self.log(Call::Exists(record.id.clone()));
        let present = self
            .resources
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.kind == record.kind && r.id == record.id);
        Ok(present)
    }

    async fn clear_blocking_config(&self, record: &ResourceRecord) -> Result<(), ProviderError> {
        self.log(Call::Clear(record.id.clone()));
        Err(ProviderError::NotConfigured)
    }

    async fn delete(&self, record: &ResourceRecord) -> Result<(), ProviderError> {
        self.log(Call::Delete(record.id.clone()));

        if self.deny_delete.contains(&record.id) {
            return Err(ProviderError::AccessDenied("sweeper".to_string()));
        }

        {
            let mut transient = self.transient.lock().unwrap();
            if let Some(remaining) = transient.get_mut(&record.id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(ProviderError::Throttled);
                }
            }
        }

        let mut resources = self.resources.lock().unwrap();
        let before = resources.len();
        resources.retain(|r| !(r.kind == record.kind && r.id == record.id));
        if resources.len() == before {
            return Err(ProviderError::NotFound {
                resource_id: record.id.clone(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ResidueProbe for FakeCloud {
    async fn count(
        &self,
        kind: ResourceKind,
        _region: Option<&str>,
    ) -> Result<usize, ProviderError> {
        Ok(self
            .resources
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.kind == kind)
            .count())
    }
}

/// Sweep config tuned for tests: live mode, no barriers, tiny retries
pub fn test_config() -> SweepConfig {
    SweepConfig {
        dry_run: false,
        barrier_delay: Duration::ZERO,
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        },
        timeouts: TimeoutConfig {
            op_timeout: Duration::from_secs(5),
            phase_timeout: None,
        },
        ..Default::default()
    }
}

pub fn account() -> Account {
    Account::new("111122223333", "Development-Admin")
}
