//! Bounded fan-out of a phase across regions and resource kinds
//!
//! Work is partitioned by `(region, kind)` so a slow or stuck region
//! cannot starve the others; partitions run concurrently on a bounded
//! pool while the resources inside one partition run strictly
//! sequentially in planner order.

use crate::destroyer::DestroyerUnit;
use crate::journal::RunJournal;
use crate::planner::PlannedPhase;
use decom_common::{AttemptKey, DestructionAttempt, ResourceKind, ResourceRecord};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One unit of concurrent work: all records of one kind in one region
struct Partition {
    region: String,
    kind: ResourceKind,
    records: Vec<ResourceRecord>,
}

/// Runs destruction phases on a bounded worker pool
pub struct RegionFanOut {
    max_workers: usize,
}

impl RegionFanOut {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Execute one phase to completion.
    ///
    /// Every partition is awaited before returning; a failing partition
    /// never cancels its siblings. Returns the number of resources that
    /// were actually attempted (settled resources are skipped).
    pub async fn run(
        &self,
        phase: &PlannedPhase,
        destroyer: &DestroyerUnit,
        journal: &RunJournal,
        cancel: &CancellationToken,
    ) -> usize {
        let partitions = partition_phase(phase);
        info!(
            phase = phase.index,
            partitions = partitions.len(),
            resources = phase.records.len(),
            "Executing phase"
        );

        let attempted: Vec<usize> = stream::iter(partitions)
            .map(|partition| async move {
                self.run_partition(partition, phase.index, destroyer, journal, cancel)
                    .await
            })
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        attempted.into_iter().sum()
    }

    /// Destroy one partition's resources sequentially, in planner order.
    async fn run_partition(
        &self,
        partition: Partition,
        phase: u8,
        destroyer: &DestroyerUnit,
        journal: &RunJournal,
        cancel: &CancellationToken,
    ) -> usize {
        let mut attempted = 0;

        for record in &partition.records {
            if cancel.is_cancelled() {
                debug!(
                    region = %partition.region,
                    kind = %partition.kind,
                    "Cancellation requested, stopping partition"
                );
                break;
            }

            let key = AttemptKey::for_record(record);
            if journal.is_settled(&key).await {
                debug!(resource = %key, "Already settled in a prior run, skipping");
                continue;
            }

            // Mark in-flight before the provider call so cancellation
            // leaves a Pending entry rather than a gap.
            journal
                .record(DestructionAttempt::begin(key, phase))
                .await;

            let attempt = destroyer.destroy(record, phase, cancel).await;
            attempted += 1;
            journal.record(attempt).await;
        }

        attempted
    }
}

/// Split a phase's records into `(region, kind)` partitions, preserving
/// the planner's record order inside each partition.
fn partition_phase(phase: &PlannedPhase) -> Vec<Partition> {
    let mut map: BTreeMap<(String, &'static str), Partition> = BTreeMap::new();

    for record in &phase.records {
        let key = (record.region_key().to_string(), record.kind.as_str());
        map.entry(key)
            .or_insert_with(|| Partition {
                region: record.region_key().to_string(),
                kind: record.kind,
                records: Vec::new(),
            })
            .records
            .push(record.clone());
    }

    map.into_values().collect()
}
