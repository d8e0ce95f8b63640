// SPDX-License-Identifier: Apache-2.0

//! Types for the metadata/data federation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use gldb_core::error::StoreError;
use gldb_core::types::{Table, Term};

use super::planner::created_on_query;

/// Default timeout per candidate fetch (30 seconds).
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;

/// Prefixes placed in the `@context` of federated metadata documents.
pub const DEFAULT_CONTEXT_PREFIXES: &[&str] = &["dcterms", "dcat", "ex"];

/// What to do when a candidate's data key is absent from the data store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingDataPolicy {
    /// Fail the whole federation with `MissingData`
    #[default]
    Strict,
    /// Leave the candidate out and report it in `FederationReport::skipped`
    Skip,
}

impl fmt::Display for MissingDataPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

impl FromStr for MissingDataPolicy {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "skip" | "lenient" => Ok(Self::Skip),
            other => Err(StoreError::configuration(format!(
                "unknown missing-data policy '{other}' (expected 'strict' or 'skip')"
            ))),
        }
    }
}

/// Database-wide federation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederationConfig {
    pub missing_data: MissingDataPolicy,
    /// Timeout per candidate (data fetch + metadata fetch) in milliseconds
    pub fetch_timeout_ms: u64,
    /// Prefixes of the metadata store's namespace table used as `@context`
    pub context_prefixes: Vec<String>,
    /// Metadata store used when a request names none (default: first registered)
    pub metadata_store: Option<String>,
    /// Data store used when a request names none (default: first registered)
    pub data_store: Option<String>,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            missing_data: MissingDataPolicy::default(),
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            context_prefixes: DEFAULT_CONTEXT_PREFIXES.iter().map(|p| p.to_string()).collect(),
            metadata_store: None,
            data_store: None,
        }
    }
}

/// One federation run: a candidate query plus how to read its bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct FederationRequest {
    /// SPARQL SELECT yielding one binding per candidate dataset
    pub candidate_query: String,
    /// Variable holding the dataset identifier
    pub dataset_var: String,
    /// Variable holding the pointer (download URL) to the data-store resource
    pub pointer_var: String,
    pub metadata_store: Option<String>,
    pub data_store: Option<String>,
    /// Overrides the database's configured policy
    pub missing_data: Option<MissingDataPolicy>,
}

impl FederationRequest {
    pub fn new(candidate_query: impl Into<String>) -> Self {
        Self {
            candidate_query: candidate_query.into(),
            dataset_var: "dataset".to_string(),
            pointer_var: "url".to_string(),
            metadata_store: None,
            data_store: None,
            missing_data: None,
        }
    }

    /// Datasets whose `dcterms:created` literal equals `date`.
    pub fn created_on(date: &str) -> Self {
        Self::new(created_on_query(date))
    }

    pub fn with_variables(mut self, dataset_var: impl Into<String>, pointer_var: impl Into<String>) -> Self {
        self.dataset_var = dataset_var.into();
        self.pointer_var = pointer_var.into();
        self
    }

    pub fn with_metadata_store(mut self, name: impl Into<String>) -> Self {
        self.metadata_store = Some(name.into());
        self
    }

    pub fn with_data_store(mut self, name: impl Into<String>) -> Self {
        self.data_store = Some(name.into());
        self
    }

    pub fn with_missing_data(mut self, policy: MissingDataPolicy) -> Self {
        self.missing_data = Some(policy);
        self
    }
}

/// A candidate dataset found by the candidate query.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub dataset: Term,
    pub pointer: Term,
    /// Data-store key derived from the pointer, `None` if none could be derived
    pub key: Option<String>,
}

/// One joined record: a data payload with the metadata describing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FederatedQueryResult {
    data: Table,
    metadata: serde_json::Map<String, serde_json::Value>,
}

impl FederatedQueryResult {
    pub fn new(data: Table, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { data, metadata }
    }

    pub fn data(&self) -> &Table {
        &self.data
    }

    pub fn metadata(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata
    }

    pub fn into_parts(self) -> (Table, serde_json::Map<String, serde_json::Value>) {
        (self.data, self.metadata)
    }
}

/// A candidate left out under [`MissingDataPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedBinding {
    pub dataset: String,
    pub key: String,
    pub reason: String,
}

/// Outcome of a federation run.
#[derive(Debug, Clone, Serialize)]
pub struct FederationReport {
    /// Joined records, in candidate order
    pub results: Vec<FederatedQueryResult>,
    /// Candidates dropped for missing data
    pub skipped: Vec<SkippedBinding>,
    /// Number of bindings returned by the candidate query
    pub candidates: usize,
    /// Total pipeline time in milliseconds
    pub total_time_ms: f64,
}

impl FederationReport {
    /// True when every candidate produced a record.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_from_text() {
        assert_eq!("strict".parse::<MissingDataPolicy>().unwrap(), MissingDataPolicy::Strict);
        assert_eq!(" SKIP ".parse::<MissingDataPolicy>().unwrap(), MissingDataPolicy::Skip);
        assert!(matches!(
            "maybe".parse::<MissingDataPolicy>(),
            Err(StoreError::Configuration { .. })
        ));
    }

    #[test]
    fn config_defaults_are_strict() {
        let config = FederationConfig::default();
        assert_eq!(config.missing_data, MissingDataPolicy::Strict);
        assert_eq!(config.fetch_timeout_ms, DEFAULT_FETCH_TIMEOUT_MS);
        assert_eq!(config.context_prefixes, vec!["dcterms", "dcat", "ex"]);
    }

    #[test]
    fn request_builder() {
        let request = FederationRequest::created_on("2024-01-01")
            .with_variables("d", "u")
            .with_metadata_store("rdf")
            .with_data_store("csv")
            .with_missing_data(MissingDataPolicy::Skip);
        assert!(request.candidate_query.contains("\"2024-01-01\""));
        assert_eq!(request.dataset_var, "d");
        assert_eq!(request.pointer_var, "u");
        assert_eq!(request.metadata_store.as_deref(), Some("rdf"));
        assert_eq!(request.data_store.as_deref(), Some("csv"));
        assert_eq!(request.missing_data, Some(MissingDataPolicy::Skip));
    }
}
