// SPDX-License-Identifier: Apache-2.0

//! Query and query result model
//!
//! A [`Query`] is an immutable request tagged with the dialect it is written
//! in. Executing it against a store yields a fresh [`QueryResult`]; the query
//! itself caches nothing, so it can be executed any number of times.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::traits::Store;
use crate::types::{Binding, QueryId, QueryLanguage, Table, Triple};

/// A dialect-tagged query expression with optional description and parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    id: QueryId,
    language: QueryLanguage,
    expression: String,
    description: Option<String>,
    args: Vec<serde_json::Value>,
    params: BTreeMap<String, serde_json::Value>,
    target: Option<String>,
}

impl Query {
    pub fn new(language: QueryLanguage, expression: impl Into<String>) -> Self {
        Self {
            id: QueryId::new(),
            language,
            expression: expression.into(),
            description: None,
            args: Vec::new(),
            params: BTreeMap::new(),
            target: None,
        }
    }

    pub fn sparql(expression: impl Into<String>) -> Self {
        Self::new(QueryLanguage::Sparql, expression)
    }

    pub fn table(name: impl Into<String>) -> Self {
        Self::new(QueryLanguage::Table, name)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a positional argument passed through to the store.
    pub fn with_arg(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Sets a keyword parameter passed through to the store.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Pins the query to a named store when routed through the database.
    pub fn on(mut self, store_name: impl Into<String>) -> Self {
        self.target = Some(store_name.into());
        self
    }

    pub fn id(&self) -> QueryId {
        self.id
    }

    pub fn language(&self) -> QueryLanguage {
        self.language
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn args(&self) -> &[serde_json::Value] {
        &self.args
    }

    pub fn params(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Executes this query against `store`.
    ///
    /// Fails with `UnsupportedOperation` when the store speaks another dialect.
    pub async fn execute(&self, store: &dyn Store) -> StoreResult<QueryResult> {
        ensure_dialect(self, store)?;
        store.execute_query(self).await
    }
}

/// Rejects a query whose dialect tag does not match the store's.
pub fn ensure_dialect(query: &Query, store: &dyn Store) -> StoreResult<()> {
    if query.language() != store.query_language() {
        return Err(StoreError::unsupported(format!(
            "{} store cannot execute a {} query",
            store.store_type(),
            query.language()
        )));
    }
    Ok(())
}

/// Payload produced by a store for one execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultData {
    /// SELECT-style solutions
    Solutions {
        variables: Vec<String>,
        bindings: Vec<Binding>,
    },
    /// CONSTRUCT/DESCRIBE-style graph
    Triples { triples: Vec<Triple> },
    /// ASK-style answer
    Boolean { value: bool },
    /// Tabular payload from a data store
    Table { table: Table },
    /// Anything else a store wants to hand back
    Json { value: serde_json::Value },
}

impl ResultData {
    /// Number of items in the payload, if the payload has one.
    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Solutions { bindings, .. } => Some(bindings.len()),
            Self::Triples { triples } => Some(triples.len()),
            Self::Table { table } => Some(table.len()),
            Self::Json { value } => match value {
                serde_json::Value::Array(items) => Some(items.len()),
                serde_json::Value::Object(map) => Some(map.len()),
                _ => None,
            },
            Self::Boolean { .. } => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Solutions { .. } => "solutions",
            Self::Triples { .. } => "triples",
            Self::Boolean { .. } => "boolean",
            Self::Table { .. } => "table",
            Self::Json { .. } => "json",
        }
    }
}

/// The outcome of executing a [`Query`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    query: Query,
    data: ResultData,
    description: Option<String>,
    /// Execution time in milliseconds
    pub execution_time_ms: f64,
}

impl QueryResult {
    /// Wraps a payload, taking the description from the originating query.
    pub fn new(query: &Query, data: ResultData) -> Self {
        Self {
            description: query.description.clone(),
            query: query.clone(),
            data,
            execution_time_ms: 0.0,
        }
    }

    pub fn with_execution_time(mut self, time_ms: f64) -> Self {
        self.execution_time_ms = time_ms;
        self
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn data(&self) -> &ResultData {
        &self.data
    }

    pub fn into_data(self) -> ResultData {
        self.data
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Length of the underlying payload.
    ///
    /// Fails with `UnsupportedOperation` for payloads without a length
    /// (ASK answers, scalar JSON).
    pub fn len(&self) -> StoreResult<usize> {
        self.data.len().ok_or_else(|| {
            StoreError::unsupported(format!("a {} payload has no defined length", self.data.kind()))
        })
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// Solution bindings, or an error if the payload is not a solution sequence.
    pub fn bindings(&self) -> StoreResult<&[Binding]> {
        match &self.data {
            ResultData::Solutions { bindings, .. } => Ok(bindings),
            other => Err(StoreError::unsupported(format!(
                "expected solutions, got a {} payload",
                other.kind()
            ))),
        }
    }

    /// Consumes the result and returns its solution bindings.
    pub fn into_bindings(self) -> StoreResult<Vec<Binding>> {
        match self.data {
            ResultData::Solutions { bindings, .. } => Ok(bindings),
            other => Err(StoreError::unsupported(format!(
                "expected solutions, got a {} payload",
                other.kind()
            ))),
        }
    }

    /// Consumes the result and returns its table.
    pub fn into_table(self) -> StoreResult<Table> {
        match self.data {
            ResultData::Table { table } => Ok(table),
            other => Err(StoreError::unsupported(format!(
                "expected a table, got a {} payload",
                other.kind()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Term;
    use serde_json::json;

    #[test]
    fn builder_sets_fields() {
        let q = Query::table("SELECT * FROM Customers;")
            .with_description("Get all customers")
            .with_arg(1)
            .with_param("limit", 10)
            .on("csv");

        assert_eq!(q.expression(), "SELECT * FROM Customers;");
        assert_eq!(q.description(), Some("Get all customers"));
        assert_eq!(q.language(), QueryLanguage::Table);
        assert_eq!(q.args(), &[json!(1)]);
        assert_eq!(q.param("limit"), Some(&json!(10)));
        assert_eq!(q.target(), Some("csv"));
    }

    #[test]
    fn each_query_gets_its_own_id() {
        assert_ne!(Query::sparql("ASK {}").id(), Query::sparql("ASK {}").id());
    }

    #[test]
    fn result_keeps_query_and_description() {
        let q = Query::sparql("SELECT * WHERE { ?s ?p ?o }").with_description("all triples");
        let res = QueryResult::new(
            &q,
            ResultData::Solutions {
                variables: vec!["s".to_string()],
                bindings: vec![Binding::from([("s".to_string(), Term::iri("urn:a"))])],
            },
        );

        assert_eq!(res.query().id(), q.id());
        assert_eq!(res.description(), Some("all triples"));
        assert_eq!(res.len(), Ok(1));
        assert_eq!(res.bindings().map(|b| b.len()), Ok(1));
    }

    #[test]
    fn boolean_payload_has_no_length() {
        let q = Query::sparql("ASK { ?s ?p ?o }");
        let res = QueryResult::new(&q, ResultData::Boolean { value: true });
        assert!(matches!(res.len(), Err(StoreError::UnsupportedOperation { .. })));
        assert!(res.into_table().is_err());
    }

    #[test]
    fn json_payload_length_follows_container() {
        let q = Query::table("t");
        let arr = QueryResult::new(&q, ResultData::Json { value: json!([1, 2, 3]) });
        assert_eq!(arr.len(), Ok(3));
        let scalar = QueryResult::new(&q, ResultData::Json { value: json!("x") });
        assert!(scalar.len().is_err());
    }
}
