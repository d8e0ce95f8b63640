// SPDX-License-Identifier: Apache-2.0

//! gldb - Generic Linked Database
//!
//! One logical view over heterogeneous stores: graph-shaped metadata stores
//! queried with SPARQL and tabular data stores, composed under unique names.
//! Files are routed to stores by suffix and a federation joins metadata
//! candidates with the tables their download URLs point to.

pub mod config;
pub mod database;
pub mod federation;
pub mod observability;

pub use config::{DatabaseConfig, StoreConfig};
pub use database::GenericLinkedDatabase;
pub use federation::{
    FederatedQueryResult, FederationConfig, FederationReport, FederationRequest,
    MissingDataPolicy, SkippedBinding,
};

pub use gldb_core::{
    Binding, DataStore, MetadataStore, Namespaces, Query, QueryLanguage, QueryResult, ResultData,
    Store, StoreError, StoreManager, StoreResult, Table, Term,
};
pub use gldb_stores::{CsvStore, InMemoryRdfStore, SparqlEndpointStore};
