// SPDX-License-Identifier: Apache-2.0

//! Generic Linked Database
//!
//! The orchestrator: owns one [`StoreManager`], routes files and queries to
//! the registered stores and runs the metadata/data federation.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use gldb_core::error::{StoreError, StoreResult};
use gldb_core::manager::{NamedStore, StoreManager};
use gldb_core::query::{Query, QueryResult};
use gldb_core::traits::Store;
use gldb_core::types::file_extension;

use crate::config::DatabaseConfig;
use crate::federation::{
    execute_federation, FederatedQueryResult, FederationConfig, FederationReport,
    FederationRequest,
};

/// One logical view over a set of named stores
pub struct GenericLinkedDatabase {
    manager: StoreManager,
    federation: FederationConfig,
}

impl GenericLinkedDatabase {
    pub fn new() -> Self {
        Self {
            manager: StoreManager::new(),
            federation: FederationConfig::default(),
        }
    }

    /// Composes a database from `(name, store)` pairs, in registration order.
    pub fn from_stores<I, S>(stores: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = (S, Arc<dyn Store>)>,
        S: Into<String>,
    {
        Ok(Self {
            manager: StoreManager::from_stores(stores)?,
            federation: FederationConfig::default(),
        })
    }

    /// Instantiates every configured store.
    pub fn from_config(config: &DatabaseConfig) -> StoreResult<Self> {
        let manager = StoreManager::new();
        for store_config in &config.stores {
            manager.add_store(store_config.name(), store_config.build()?)?;
        }
        info!(stores = manager.len(), "Linked database composed from config");
        Ok(Self {
            manager,
            federation: config.federation.clone(),
        })
    }

    pub fn with_federation_config(mut self, federation: FederationConfig) -> Self {
        self.federation = federation;
        self
    }

    pub fn federation_config(&self) -> &FederationConfig {
        &self.federation
    }

    pub fn manager(&self) -> &StoreManager {
        &self.manager
    }

    pub fn add_store(&self, name: impl Into<String>, store: Arc<dyn Store>) -> StoreResult<()> {
        self.manager.add_store(name, store)
    }

    /// Looks up a store by name (`NotFound` when unregistered)
    pub fn get(&self, name: &str) -> StoreResult<Arc<dyn Store>> {
        self.manager.get_store(name)
    }

    pub fn store(&self, name: &str) -> StoreResult<Arc<dyn Store>> {
        self.get(name)
    }

    pub fn data_stores(&self) -> Vec<NamedStore> {
        self.manager.data_stores()
    }

    pub fn metadata_stores(&self) -> Vec<NamedStore> {
        self.manager.metadata_stores()
    }

    /// Ingests `path` into every store whose extensions match its suffix.
    ///
    /// Returns `Ok(false)` with a warning when no store claims the file, and
    /// `Ok(true)` only when every claiming store ingested it. A store error
    /// does not stop the remaining stores from receiving the file; the first
    /// error is returned once every claimant has been tried.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn linked_upload(&self, path: &Path) -> StoreResult<bool> {
        if !path.exists() {
            return Err(StoreError::file_not_found(path));
        }

        let claimants: Vec<NamedStore> = self
            .manager
            .stores()
            .into_iter()
            .filter(|(_, store)| store.accepts(path))
            .collect();

        if claimants.is_empty() {
            let extension = file_extension(path).unwrap_or_default();
            warn!(extension = %extension, "No store accepts this file type");
            return Ok(false);
        }

        let mut all_ok = true;
        let mut first_error = None;
        for (name, store) in &claimants {
            match store.upload_file(path).await {
                Ok(true) => info!(store = %name, "File ingested"),
                Ok(false) => {
                    warn!(store = %name, "Store failed to ingest file");
                    all_ok = false;
                }
                Err(e) => {
                    warn!(store = %name, error = %e, "Store rejected file");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(all_ok),
        }
    }

    /// Runs `query` on the named store.
    pub async fn execute_query(&self, store_name: &str, query: &Query) -> StoreResult<QueryResult> {
        let store = self.get(store_name)?;
        debug!(store = store_name, language = %query.language(), "Dispatching query");
        query.execute(store.as_ref()).await
    }

    /// Runs `query` on its target store, or on the first store speaking its dialect.
    pub async fn route(&self, query: &Query) -> StoreResult<QueryResult> {
        if let Some(target) = query.target() {
            return self.execute_query(target, query).await;
        }

        let (name, store) = self
            .manager
            .stores()
            .into_iter()
            .find(|(_, store)| store.query_language() == query.language())
            .ok_or_else(|| {
                StoreError::not_found(format!("no registered store executes {} queries", query.language()))
            })?;
        debug!(store = %name, language = %query.language(), "Routing query");
        query.execute(store.as_ref()).await
    }

    /// Runs a SPARQL query on the first metadata store.
    pub async fn sparql(&self, expression: &str) -> StoreResult<QueryResult> {
        let (name, store) = self
            .metadata_stores()
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found("no metadata store registered"))?;
        debug!(store = %name, "Running SPARQL on default metadata store");
        Query::sparql(expression).execute(store.as_ref()).await
    }

    /// Joins metadata-store candidates with their data-store tables.
    #[instrument(skip(self, request), fields(policy = ?request.missing_data))]
    pub async fn federate(&self, request: &FederationRequest) -> StoreResult<FederationReport> {
        let meta_name = request
            .metadata_store
            .as_ref()
            .or(self.federation.metadata_store.as_ref());
        let data_name = request
            .data_store
            .as_ref()
            .or(self.federation.data_store.as_ref());

        let meta_store = self.pick_store(meta_name.map(String::as_str), true)?;
        let data_store = self.pick_store(data_name.map(String::as_str), false)?;

        let meta = meta_store.as_metadata_store().ok_or_else(|| {
            StoreError::unsupported(format!("store type {} is not a metadata store", meta_store.store_type()))
        })?;
        let data = data_store.as_data_store().ok_or_else(|| {
            StoreError::unsupported(format!("store type {} is not a data store", data_store.store_type()))
        })?;

        execute_federation(meta, data, request, &self.federation).await
    }

    /// Datasets created on `date`, each paired with its table and metadata document.
    pub async fn datasets_created_on(&self, date: &str) -> StoreResult<Vec<FederatedQueryResult>> {
        let report = self.federate(&FederationRequest::created_on(date)).await?;
        Ok(report.results)
    }

    /// One-line description of the registered stores
    pub fn info(&self) -> String {
        let stores: Vec<String> = self
            .manager
            .stores()
            .iter()
            .map(|(name, store)| format!("{name}: {}", store.store_type()))
            .collect();
        format!("GenericLinkedDatabase(stores=[{}])", stores.join(", "))
    }

    fn pick_store(&self, name: Option<&str>, metadata: bool) -> StoreResult<Arc<dyn Store>> {
        if let Some(name) = name {
            return self.get(name);
        }
        let candidates = if metadata {
            self.metadata_stores()
        } else {
            self.data_stores()
        };
        candidates
            .into_iter()
            .next()
            .map(|(_, store)| store)
            .ok_or_else(|| {
                StoreError::not_found(if metadata {
                    "no metadata store registered"
                } else {
                    "no data store registered"
                })
            })
    }
}

impl Default for GenericLinkedDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GenericLinkedDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.info())
    }
}
