// SPDX-License-Identifier: Apache-2.0

//! Store trait definitions
//!
//! [`Store`] is the core abstraction every repository implements. The two
//! capability traits, [`DataStore`] and [`MetadataStore`], are layered on
//! top; a store advertises them through `as_data_store` / `as_metadata_store`
//! so the manager can partition stores without inspecting concrete types.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::namespaces::Namespaces;
use crate::query::{Query, QueryResult};
use crate::types::{file_extension, Binding, QueryLanguage, Table, Term};

/// Core trait that all stores must implement
#[async_trait]
pub trait Store: Send + Sync {
    /// Returns the identifier for this kind of store (e.g., "in_memory_rdf", "csv")
    fn store_type(&self) -> &'static str;

    /// Returns a human-readable name for this kind of store
    fn display_name(&self) -> &'static str;

    /// The dialect this store executes
    fn query_language(&self) -> QueryLanguage;

    /// File suffixes (lower case, leading dot) this store can ingest
    fn expected_file_extensions(&self) -> BTreeSet<String>;

    /// Executes a query against the store's native data
    ///
    /// Stores that cannot be queried return `UnsupportedOperation`.
    async fn execute_query(&self, query: &Query) -> StoreResult<QueryResult>;

    /// Ingests the file at `path`
    ///
    /// Returns whether ingestion succeeded. Fails with `NotFound` if the
    /// path does not exist.
    async fn upload_file(&self, path: &Path) -> StoreResult<bool>;

    /// Builds a query already bound to this store's dialect
    fn query(&self, expression: &str) -> Query {
        Query::new(self.query_language(), expression)
    }

    /// Whether the file's suffix is one this store ingests
    fn accepts(&self, path: &Path) -> bool {
        file_extension(path)
            .map(|ext| self.expected_file_extensions().contains(&ext))
            .unwrap_or(false)
    }

    fn as_data_store(&self) -> Option<&dyn DataStore> {
        None
    }

    fn as_metadata_store(&self) -> Option<&dyn MetadataStore> {
        None
    }
}

/// Tabular capability: bulk ingestion and retrieval of whole tables
#[async_trait]
pub trait DataStore: Store {
    /// Fetches a table by key, `None` if the store does not hold it
    async fn get_table(&self, key: &str) -> StoreResult<Option<Table>>;

    /// Keys of all tables currently held
    async fn table_names(&self) -> StoreResult<Vec<String>>;
}

/// Graph capability: SPARQL-queryable metadata with a fixed vocabulary table
#[async_trait]
pub trait MetadataStore: Store {
    /// Prefix table used when serializing metadata documents
    fn namespaces(&self) -> &Namespaces;

    /// Runs a SELECT query and returns its bindings
    async fn select(&self, sparql: &str) -> StoreResult<Vec<Binding>> {
        let query = Query::sparql(sparql);
        self.execute_query(&query).await?.into_bindings()
    }

    /// Every (predicate, object) pair describing `subject`
    async fn describe(&self, subject: &Term) -> StoreResult<Vec<(Term, Term)>> {
        let iri = match subject {
            Term::Iri { value } => value,
            other => {
                return Err(StoreError::unsupported(format!(
                    "only IRIs can be described, got {other}"
                )))
            }
        };
        if !is_safe_iri(iri) {
            return Err(StoreError::syntax_error(format!("invalid IRI <{iri}>")));
        }

        let sparql = format!("SELECT ?p ?o WHERE {{ <{iri}> ?p ?o . }}");
        let bindings = self.select(&sparql).await?;

        Ok(bindings
            .into_iter()
            .filter_map(|mut b| Some((b.remove("p")?, b.remove("o")?)))
            .collect())
    }
}

/// True when `iri` can be embedded between angle brackets in SPARQL.
pub fn is_safe_iri(iri: &str) -> bool {
    !iri.is_empty()
        && !iri
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\'))
}
