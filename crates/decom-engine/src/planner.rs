//! Phase planning
//!
//! Orders the delete-set into destruction phases from the static
//! dependency table on [`ResourceKind`], so adding a kind never touches
//! scheduler control flow. Phases execute strictly in order with a
//! barrier delay between them; kinds within one phase are
//! dependency-independent of each other.

use decom_common::{ResourceKind, ResourceRecord};
use std::collections::BTreeMap;
use std::time::Duration;

/// One ordered stage of destruction
#[derive(Debug)]
pub struct PlannedPhase {
    /// Phase index from the dependency table
    pub index: u8,
    /// Records scheduled in this phase, in execution order
    pub records: Vec<ResourceRecord>,
    /// Pause after this phase completes (zero after the final phase)
    pub barrier_after: Duration,
}

impl PlannedPhase {
    /// Kinds present in this phase, deduplicated
    pub fn kinds(&self) -> Vec<ResourceKind> {
        let mut kinds: Vec<ResourceKind> = self.records.iter().map(|r| r.kind).collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds.dedup();
        kinds
    }
}

/// Ordered destruction plan for one account
#[derive(Debug, Default)]
pub struct DestructionPlan {
    pub phases: Vec<PlannedPhase>,
}

impl DestructionPlan {
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn total_resources(&self) -> usize {
        self.phases.iter().map(|p| p.records.len()).sum()
    }
}

/// Tier for ordering stacks within a partition.
///
/// Plain application stacks go first, `stackset-` composites second, and
/// landing-zone / Control Tower stacks last so their removal never races
/// ahead of their children.
pub fn stack_tier(stack_name: &str) -> u8 {
    let name = stack_name.to_lowercase();
    if name.contains("controltower") || name.contains("landing-zone") {
        2
    } else if name.starts_with("stackset-") {
        1
    } else {
        0
    }
}

/// Build the phase plan for a delete-set.
///
/// Records whose kind has no destruction phase (the protected catalogue)
/// are ignored; classification must have filtered them already, and the
/// planner refuses to schedule them regardless.
pub fn plan(delete_set: Vec<ResourceRecord>, barrier_delay: Duration) -> DestructionPlan {
    let mut by_phase: BTreeMap<u8, Vec<ResourceRecord>> = BTreeMap::new();

    for record in delete_set {
        let Some(phase) = record.kind.destruction_phase() else {
            continue;
        };
        by_phase.entry(phase).or_default().push(record);
    }

    let mut phases: Vec<PlannedPhase> = by_phase
        .into_iter()
        .map(|(index, mut records)| {
            // Stable execution order inside the phase: stacks by tier,
            // everything by (region, kind, id) so runs are reproducible.
            records.sort_by(|a, b| {
                let tier_a = intra_phase_rank(a);
                let tier_b = intra_phase_rank(b);
                tier_a
                    .cmp(&tier_b)
                    .then_with(|| a.region_key().cmp(b.region_key()))
                    .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
                    .then_with(|| a.id.cmp(&b.id))
            });
            PlannedPhase {
                index,
                records,
                barrier_after: barrier_delay,
            }
        })
        .collect();

    if let Some(last) = phases.last_mut() {
        last.barrier_after = Duration::ZERO;
    }

    DestructionPlan { phases }
}

fn intra_phase_rank(record: &ResourceRecord) -> u8 {
    match record.kind {
        ResourceKind::CloudFormationStack => stack_tier(&record.id),
        _ => 0,
    }
}
