// SPDX-License-Identifier: Apache-2.0

//! Remote SPARQL Endpoint Store
//!
//! A metadata store whose data lives behind a SPARQL 1.1 protocol endpoint
//! (GraphDB, Fuseki, ...). Queries are POSTed as
//! `application/x-www-form-urlencoded` and answered as SPARQL JSON results.
//!
//! The store is query-only: it declares no file extensions and rejects uploads.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use gldb_core::error::{StoreError, StoreResult};
use gldb_core::namespaces::Namespaces;
use gldb_core::query::{ensure_dialect, Query, QueryResult, ResultData};
use gldb_core::sensitive::Sensitive;
use gldb_core::traits::{MetadataStore, Store};
use gldb_core::types::{Binding, QueryLanguage, Term};

const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// Default request timeout (30 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Credentials for endpoints behind basic auth
#[derive(Debug, Clone)]
pub struct EndpointCredentials {
    pub username: String,
    pub password: Sensitive<String>,
}

/// Metadata store backed by a remote SPARQL endpoint
pub struct SparqlEndpointStore {
    endpoint: Url,
    client: Client,
    credentials: Option<EndpointCredentials>,
    namespaces: Namespaces,
    timeout_ms: u64,
}

impl SparqlEndpointStore {
    pub fn new(endpoint: &str) -> StoreResult<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT_MS)
    }

    pub fn with_timeout(endpoint: &str, timeout_ms: u64) -> StoreResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StoreError::configuration(format!("invalid endpoint URL '{endpoint}': {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| StoreError::configuration(e.to_string()))?;

        Ok(Self {
            endpoint,
            client,
            credentials: None,
            namespaces: Namespaces::default_vocabulary(),
            timeout_ms,
        })
    }

    pub fn with_credentials(mut self, credentials: EndpointCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_namespaces(mut self, namespaces: Namespaces) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, sparql: &str) -> StoreResult<String> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(ACCEPT, SPARQL_RESULTS_JSON)
            .form(&[("query", sparql)]);
        if let Some(creds) = &self.credentials {
            request = request.basic_auth(&creds.username, Some(creds.password.expose()));
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else {
                StoreError::execution_error(format!("request to {} failed: {e}", self.endpoint))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::execution_error(e.to_string()))?;

        match status {
            s if s.is_success() => Ok(body),
            StatusCode::BAD_REQUEST => Err(StoreError::syntax_error(body)),
            s => Err(StoreError::execution_error(format!(
                "endpoint {} answered {s}: {body}",
                self.endpoint
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SparqlJsonResults {
    #[serde(default)]
    head: SparqlJsonHead,
    results: Option<SparqlJsonBindings>,
    boolean: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct SparqlJsonHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SparqlJsonBindings {
    bindings: Vec<BTreeMap<String, SparqlJsonTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlJsonTerm {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(rename = "xml:lang")]
    lang: Option<String>,
    datatype: Option<String>,
}

impl SparqlJsonTerm {
    fn into_term(self) -> StoreResult<Term> {
        match self.kind.as_str() {
            "uri" => Ok(Term::iri(self.value)),
            "bnode" => Ok(Term::blank(self.value)),
            "literal" | "typed-literal" => Ok(match (self.lang, self.datatype) {
                (Some(lang), _) => Term::lang_literal(self.value, lang),
                (None, Some(dt)) if dt != "http://www.w3.org/2001/XMLSchema#string" => {
                    Term::typed_literal(self.value, dt)
                }
                _ => Term::literal(self.value),
            }),
            other => Err(StoreError::execution_error(format!(
                "unknown term type '{other}' in SPARQL results"
            ))),
        }
    }
}

/// Parses a SPARQL 1.1 JSON results document
pub fn parse_sparql_json(body: &str) -> StoreResult<ResultData> {
    let parsed: SparqlJsonResults = serde_json::from_str(body)
        .map_err(|e| StoreError::execution_error(format!("invalid SPARQL JSON results: {e}")))?;

    if let Some(value) = parsed.boolean {
        return Ok(ResultData::Boolean { value });
    }

    let rows = parsed
        .results
        .ok_or_else(|| StoreError::execution_error("SPARQL JSON results without bindings"))?
        .bindings;
    let bindings = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(var, term)| term.into_term().map(|term| (var, term)))
                .collect::<StoreResult<Binding>>()
        })
        .collect::<StoreResult<Vec<_>>>()?;

    Ok(ResultData::Solutions {
        variables: parsed.head.vars,
        bindings,
    })
}

#[async_trait]
impl Store for SparqlEndpointStore {
    fn store_type(&self) -> &'static str {
        "sparql_endpoint"
    }

    fn display_name(&self) -> &'static str {
        "Remote SPARQL Endpoint"
    }

    fn query_language(&self) -> QueryLanguage {
        QueryLanguage::Sparql
    }

    fn expected_file_extensions(&self) -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[instrument(skip(self, query), fields(endpoint = %self.endpoint, query_id = %query.id().0))]
    async fn execute_query(&self, query: &Query) -> StoreResult<QueryResult> {
        ensure_dialect(query, self)?;
        let start = Instant::now();
        let body = self.post(query.expression()).await?;
        let data = parse_sparql_json(&body)?;
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        debug!(time_ms = elapsed, "Remote SPARQL query executed");
        Ok(QueryResult::new(query, data).with_execution_time(elapsed))
    }

    async fn upload_file(&self, path: &Path) -> StoreResult<bool> {
        if !path.exists() {
            return Err(StoreError::file_not_found(path));
        }
        Err(StoreError::unsupported(format!(
            "{} does not ingest files",
            self.display_name()
        )))
    }

    fn as_metadata_store(&self) -> Option<&dyn MetadataStore> {
        Some(self)
    }
}

impl MetadataStore for SparqlEndpointStore {
    fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }
}
