//! Top-level destruction scheduling
//!
//! Drives one account through Planning → Executing(phase) → Barrier →
//! Verifying → Done. Individual resource failures never abort a phase or
//! the run; only an unreadable inventory is fatal, and it aborts before
//! any destructive call is issued.

use crate::classifier::PreservationClassifier;
use crate::config::SweepConfig;
use crate::destroyer::DestroyerUnit;
use crate::fanout::RegionFanOut;
use crate::journal::{JournalStore, RunJournal};
use crate::planner;
use crate::provider::{DeletePrimitive, InventorySource, ResidueProbe, TagLookup, TagWriter};
use crate::retry::sleep_cancellable;
use crate::tagger::PreservationTagger;
use crate::verify::{ResidueCount, VerificationPass};
use anyhow::{Context as _, Result};
use decom_common::{Account, AttemptKey, DestructionAttempt, ResourceRecord, RunSummary};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// External collaborators the scheduler drives
pub struct Collaborators {
    pub inventory: Arc<dyn InventorySource>,
    pub tags: Arc<dyn TagLookup>,
    pub primitive: Arc<dyn DeletePrimitive>,
    pub probe: Arc<dyn ResidueProbe>,
}

/// Scheduler state, logged at each transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Planning,
    Executing(u8),
    Barrier(u8),
    Verifying,
    Done,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Planning => write!(f, "planning"),
            RunState::Executing(i) => write!(f, "executing(phase {i})"),
            RunState::Barrier(i) => write!(f, "barrier(phase {i})"),
            RunState::Verifying => write!(f, "verifying"),
            RunState::Done => write!(f, "done"),
        }
    }
}

/// Final report for one account sweep
#[derive(Debug)]
pub struct SweepReport {
    pub account: Account,
    pub run_id: String,
    /// Set when the whole account was skipped without executing phases
    pub skipped: Option<String>,
    pub summary: RunSummary,
    pub attempts: Vec<DestructionAttempt>,
    pub residue: Vec<ResidueCount>,
}

impl SweepReport {
    fn skipped(account: Account, run_id: String, reason: String) -> Self {
        Self {
            account,
            run_id,
            skipped: Some(reason),
            summary: RunSummary::default(),
            attempts: Vec::new(),
            residue: Vec::new(),
        }
    }
}

/// Drives classification, planning, fan-out, and verification for
/// whole-account sweeps
pub struct DestructionScheduler {
    config: SweepConfig,
    inventory: Arc<dyn InventorySource>,
    classifier: PreservationClassifier,
    destroyer: DestroyerUnit,
    fanout: RegionFanOut,
    verifier: VerificationPass,
    tagger: Option<PreservationTagger>,
    store: Option<Arc<dyn JournalStore>>,
}

impl DestructionScheduler {
    pub fn new(config: SweepConfig, collaborators: Collaborators) -> Self {
        let destroyer = DestroyerUnit::new(collaborators.primitive, &config);
        let fanout = RegionFanOut::new(config.concurrency.max_workers);
        let verifier = VerificationPass::new(collaborators.probe, config.verify_region.clone());
        Self {
            classifier: PreservationClassifier::new(collaborators.tags),
            inventory: collaborators.inventory,
            destroyer,
            fanout,
            verifier,
            tagger: None,
            store: None,
            config,
        }
    }

    /// Persist terminal attempts and resume from prior runs
    pub fn with_journal_store(mut self, store: Arc<dyn JournalStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Write preservation markers onto preserved resources (live runs only)
    pub fn with_tag_writer(mut self, writer: Arc<dyn TagWriter>) -> Self {
        self.tagger = Some(PreservationTagger::new(writer));
        self
    }

    /// Sweep one account to completion.
    pub async fn run(&self, account: &Account, cancel: &CancellationToken) -> Result<SweepReport> {
        let run_id = Uuid::new_v4().to_string();

        if self.config.is_restricted(&account.profile) {
            info!(
                account = %account.id,
                profile = %account.profile,
                "Account is policy-restricted, skipping sweep"
            );
            return Ok(SweepReport::skipped(
                account.clone(),
                run_id,
                "service control policies prevent deletions".to_string(),
            ));
        }

        info!(
            account = %account.id,
            profile = %account.profile,
            run_id = %run_id,
            dry_run = self.config.dry_run,
            "Starting account sweep"
        );

        self.transition(RunState::Planning);

        let journal = RunJournal::new(run_id.clone(), account.id.clone(), self.store.clone());
        self.load_prior_attempts(account, &journal).await;

        // The only fatal path: no inventory means no plan, and no
        // destructive call has been issued yet.
        let snapshot = self
            .inventory
            .snapshot(account)
            .await
            .with_context(|| format!("Failed to read inventory for account {}", account.id))?;

        info!(resources = snapshot.len(), "Inventory loaded");

        let (preserved, delete_set) = self.classify_snapshot(snapshot, &journal).await;

        if let (Some(tagger), false) = (&self.tagger, self.config.dry_run) {
            tagger.tag_preserved(&preserved).await;
        }

        let plan = planner::plan(delete_set, self.config.barrier_delay);
        info!(
            phases = plan.phases.len(),
            resources = plan.total_resources(),
            preserved = preserved.len(),
            "Destruction plan ready"
        );

        let last_index = plan.phases.last().map(|p| p.index);
        for phase in &plan.phases {
            if cancel.is_cancelled() {
                warn!("Cancellation requested, not scheduling further phases");
                break;
            }

            self.transition(RunState::Executing(phase.index));
            self.execute_phase(phase, &journal, cancel).await;

            if Some(phase.index) != last_index && phase.barrier_after > Duration::ZERO {
                self.transition(RunState::Barrier(phase.index));
                if !sleep_cancellable(phase.barrier_after, cancel).await {
                    warn!("Cancellation requested during barrier");
                    break;
                }
            }
        }

        self.transition(RunState::Verifying);
        let residue = self.verifier.verify(account).await;

        self.transition(RunState::Done);
        let summary = journal.summary().await;
        info!(
            account = %account.id,
            deleted = summary.totals.deleted,
            preserved = summary.totals.preserved,
            failed = summary.totals.failed,
            timed_out = summary.totals.timed_out,
            "Sweep complete"
        );

        Ok(SweepReport {
            account: account.clone(),
            run_id,
            skipped: None,
            summary,
            attempts: journal.attempts().await,
            residue,
        })
    }

    /// Sweep several independently-scoped accounts sequentially.
    ///
    /// A failing account never stops the loop; its error is returned in
    /// place of a report.
    pub async fn sweep_accounts(
        &self,
        accounts: &[Account],
        cancel: &CancellationToken,
    ) -> Vec<Result<SweepReport>> {
        let mut reports = Vec::with_capacity(accounts.len());
        for account in accounts {
            if cancel.is_cancelled() {
                break;
            }
            let result = self.run(account, cancel).await;
            if let Err(e) = &result {
                warn!(account = %account.id, error = %e, "Account sweep failed");
            }
            reports.push(result);
        }
        reports
    }

    /// Seed the journal with settled attempts from prior runs.
    async fn load_prior_attempts(&self, account: &Account, journal: &RunJournal) {
        let Some(store) = &self.store else {
            return;
        };
        match store.load_prior(&account.id).await {
            Ok(prior) => {
                if !prior.is_empty() {
                    info!(entries = prior.len(), "Resuming from prior journal");
                }
                journal.preload(prior).await;
            }
            Err(e) => {
                // Resuming is an optimization; re-running settled
                // deletions is safe because every unit is idempotent.
                warn!(error = %e, "Failed to load prior journal, starting fresh");
            }
        }
    }

    /// Classify the snapshot into a preserve-set and a delete-set,
    /// journaling a Skipped attempt for every newly preserved resource.
    async fn classify_snapshot(
        &self,
        snapshot: Vec<ResourceRecord>,
        journal: &RunJournal,
    ) -> (
        Vec<(ResourceRecord, crate::classifier::PreservationDecision)>,
        Vec<ResourceRecord>,
    ) {
        let mut preserved = Vec::new();
        let mut delete_set = Vec::new();

        for record in snapshot {
            let key = AttemptKey::for_record(&record);
            let decision = self.classifier.classify(&record).await;

            if decision.is_preserve() {
                if !journal.is_settled(&key).await {
                    journal
                        .record(DestructionAttempt::preserved(key, decision.reason.clone()))
                        .await;
                }
                preserved.push((record, decision));
            } else if journal.is_settled(&key).await {
                // Already succeeded in a prior run; no duplicate entry.
                continue;
            } else {
                delete_set.push(record);
            }
        }

        (preserved, delete_set)
    }

    /// Run one phase under the optional phase ceiling.
    async fn execute_phase(
        &self,
        phase: &planner::PlannedPhase,
        journal: &RunJournal,
        cancel: &CancellationToken,
    ) {
        let work = self.fanout.run(phase, &self.destroyer, journal, cancel);

        match self.config.timeouts.phase_timeout {
            Some(limit) => {
                if tokio::time::timeout(limit, work).await.is_err() {
                    // Unfinished attempts stay Pending for the next run.
                    warn!(
                        phase = phase.index,
                        timeout_secs = limit.as_secs(),
                        "Phase timed out, continuing with remaining phases"
                    );
                }
            }
            None => {
                work.await;
            }
        }
    }

    fn transition(&self, state: RunState) {
        info!(state = %state, "Scheduler state");
    }
}
