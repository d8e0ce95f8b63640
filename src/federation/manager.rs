// SPDX-License-Identifier: Apache-2.0

//! Federation execution manager.
//!
//! Orchestrates the federation pipeline:
//! candidate query → join keys → fetch tables and describe datasets → pair.

use std::time::Instant;

use futures::future::join_all;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, instrument, warn};

use gldb_core::error::{StoreError, StoreResult};
use gldb_core::namespaces::Namespaces;
use gldb_core::traits::{DataStore, MetadataStore};
use gldb_core::types::Table;

use super::document::build_metadata_document;
use super::planner::extract_candidates;
use super::types::{
    Candidate, FederatedQueryResult, FederationConfig, FederationReport, FederationRequest,
    MissingDataPolicy, SkippedBinding,
};

/// Outcome of one candidate's fetch
enum CandidateOutcome {
    Joined(FederatedQueryResult),
    Missing(SkippedBinding),
}

/// Executes a federation request end-to-end.
#[instrument(skip_all, fields(metadata_store = meta.store_type(), data_store = data.store_type()))]
pub async fn execute_federation(
    meta: &dyn MetadataStore,
    data: &dyn DataStore,
    request: &FederationRequest,
    config: &FederationConfig,
) -> StoreResult<FederationReport> {
    let total_start = Instant::now();
    let policy = request.missing_data.unwrap_or(config.missing_data);

    // Step 1: Candidate datasets
    let bindings = meta.select(&request.candidate_query).await?;
    let candidates = extract_candidates(bindings, request)?;
    let candidate_count = candidates.len();
    debug!(candidates = candidate_count, "Candidate query executed");

    // Step 2: Fetch every candidate concurrently, keep binding order
    let context = meta.namespaces().subset(&config.context_prefixes);
    let context = &context;
    let timeout_ms = config.fetch_timeout_ms;
    let fetches = candidates.iter().map(|candidate| async move {
        match timeout(
            Duration::from_millis(timeout_ms),
            fetch_candidate(meta, data, candidate, context),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(StoreError::Timeout { timeout_ms }),
        }
    });
    let outcomes = join_all(fetches).await;

    // Step 3: Apply the missing-data policy in binding order
    let mut results = Vec::with_capacity(candidate_count);
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome? {
            CandidateOutcome::Joined(result) => results.push(result),
            CandidateOutcome::Missing(missing) => match policy {
                MissingDataPolicy::Strict => {
                    return Err(StoreError::missing_data(missing.dataset, missing.key));
                }
                MissingDataPolicy::Skip => {
                    warn!(
                        dataset = %missing.dataset,
                        key = %missing.key,
                        reason = %missing.reason,
                        "Skipping candidate without data"
                    );
                    skipped.push(missing);
                }
            },
        }
    }

    let total_time_ms = total_start.elapsed().as_secs_f64() * 1000.0;
    info!(
        candidates = candidate_count,
        joined = results.len(),
        skipped = skipped.len(),
        time_ms = total_time_ms,
        "Federation completed"
    );

    Ok(FederationReport {
        results,
        skipped,
        candidates: candidate_count,
        total_time_ms,
    })
}

/// Fetches the table and the metadata document for one candidate.
async fn fetch_candidate(
    meta: &dyn MetadataStore,
    data: &dyn DataStore,
    candidate: &Candidate,
    context: &Namespaces,
) -> StoreResult<CandidateOutcome> {
    let dataset = candidate.dataset.value().to_string();

    let Some(key) = candidate.key.as_deref() else {
        return Ok(CandidateOutcome::Missing(SkippedBinding {
            dataset,
            key: candidate.pointer.value().to_string(),
            reason: "no data key can be derived from the pointer".to_string(),
        }));
    };

    let table: Table = match data.get_table(key).await? {
        Some(table) => table,
        None => {
            return Ok(CandidateOutcome::Missing(SkippedBinding {
                dataset,
                key: key.to_string(),
                reason: format!("data store '{}' holds no table '{key}'", data.store_type()),
            }))
        }
    };

    let pairs = meta.describe(&candidate.dataset).await?;
    let metadata = build_metadata_document(&candidate.dataset, &pairs, context);
    debug!(dataset = %dataset, key, rows = table.len(), "Candidate joined");

    Ok(CandidateOutcome::Joined(FederatedQueryResult::new(table, metadata)))
}
