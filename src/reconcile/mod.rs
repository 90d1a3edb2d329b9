// Cross-store consistency module
// The keyword store and the vector index are written without a shared
// transaction, so they can drift apart; this module detects the drift and
// repairs it idempotently.


use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::database::lancedb::vector_store::VectorStore;
use crate::database::sqlite::Database;

/// Consistency check results between the keyword store and the vector index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Number of canonical records in the keyword store
    pub canonical_records: usize,
    /// Number of embeddings in the vector index
    pub indexed_embeddings: usize,
    /// Record ids present in the keyword store but absent from the vector index
    pub missing_in_vector: Vec<String>,
    /// Ids present in the vector index with no canonical record
    pub orphaned_in_vector: Vec<String>,
    /// Overall consistency status
    pub is_consistent: bool,
}

/// Outcome of a repair pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RepairOutcome {
    /// Records re-embedded into the vector index
    pub reindexed: usize,
    /// Orphaned vector entries removed
    pub removed: usize,
    /// Records that could not be repaired
    pub failed: usize,
}

/// Detects and repairs drift between the two stores
pub struct Reconciler<'a> {
    database: &'a Database,
    vector_store: &'a VectorStore,
}

impl<'a> Reconciler<'a> {
    #[inline]
    pub fn new(database: &'a Database, vector_store: &'a VectorStore) -> Self {
        Self {
            database,
            vector_store,
        }
    }

    /// Compare the id sets of both stores
    #[inline]
    pub async fn check(&self) -> Result<ConsistencyReport> {
        info!("Starting cross-store consistency check");

        let canonical_ids: HashSet<String> =
            self.database.list_solution_ids().await?.into_iter().collect();
        debug!("Found {} canonical records", canonical_ids.len());

        let vector_ids: HashSet<String> = self.vector_store.list_ids().await?.into_iter().collect();
        debug!("Found {} indexed embeddings", vector_ids.len());

        let mut missing_in_vector: Vec<String> =
            canonical_ids.difference(&vector_ids).cloned().collect();
        let mut orphaned_in_vector: Vec<String> =
            vector_ids.difference(&canonical_ids).cloned().collect();
        missing_in_vector.sort();
        orphaned_in_vector.sort();

        let is_consistent = missing_in_vector.is_empty() && orphaned_in_vector.is_empty();

        let report = ConsistencyReport {
            canonical_records: canonical_ids.len(),
            indexed_embeddings: vector_ids.len(),
            missing_in_vector,
            orphaned_in_vector,
            is_consistent,
        };

        if report.is_consistent {
            info!("Consistency check passed");
        } else {
            warn!(
                "Consistency check found issues: {} missing, {} orphaned",
                report.missing_in_vector.len(),
                report.orphaned_in_vector.len()
            );
        }

        Ok(report)
    }

    /// Re-embed records missing from the vector index and drop orphaned
    /// vector entries. Safe to run repeatedly; a consistent pair is a no-op.
    #[inline]
    pub async fn repair(&self) -> Result<RepairOutcome> {
        let report = self.check().await?;
        let mut outcome = RepairOutcome::default();

        for id in &report.missing_in_vector {
            match self.reindex_record(id).await {
                Ok(true) => {
                    outcome.reindexed += 1;
                    debug!("Re-embedded record {}", id);
                }
                Ok(false) => {
                    // Vanished between check and repair; nothing to do.
                    debug!("Record {} no longer exists, skipping", id);
                }
                Err(e) => {
                    outcome.failed += 1;
                    error!("Failed to re-embed record {}: {}", id, e);
                }
            }
        }

        for id in &report.orphaned_in_vector {
            if self.vector_store.delete(id).await {
                outcome.removed += 1;
                debug!("Removed orphaned embedding {}", id);
            } else {
                outcome.failed += 1;
                error!("Failed to remove orphaned embedding {}", id);
            }
        }

        info!(
            "Repair complete: {} re-embedded, {} removed, {} failed",
            outcome.reindexed, outcome.removed, outcome.failed
        );
        Ok(outcome)
    }

    async fn reindex_record(&self, id: &str) -> Result<bool> {
        let Some(solution) = self.database.get_solution(id).await? else {
            return Ok(false);
        };

        self.vector_store
            .update(
                &solution.id,
                &solution.problem,
                &solution.error_messages,
                &solution.title,
            )
            .await?;

        Ok(true)
    }
}

impl ConsistencyReport {
    /// Human-readable summary of the report
    #[inline]
    pub fn summary(&self) -> String {
        if self.is_consistent {
            format!(
                "Stores are consistent: {} records, {} embeddings",
                self.canonical_records, self.indexed_embeddings
            )
        } else {
            format!(
                "Store drift found: {} records missing from the vector index, {} orphaned embeddings",
                self.missing_in_vector.len(),
                self.orphaned_in_vector.len()
            )
        }
    }

    /// Total number of consistency issues
    #[inline]
    pub fn total_issues(&self) -> usize {
        self.missing_in_vector.len() + self.orphaned_in_vector.len()
    }
}
