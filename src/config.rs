// SPDX-License-Identifier: Apache-2.0

//! Database configuration
//!
//! A JSON file listing the stores to register (in order) and the federation
//! settings. Environment variables override the federation settings:
//!
//! - `GLDB_MISSING_DATA_POLICY`: `strict` or `skip`
//! - `GLDB_FETCH_TIMEOUT_MS`: per-candidate timeout in milliseconds

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use gldb_core::error::{StoreError, StoreResult};
use gldb_core::namespaces::Namespaces;
use gldb_core::sensitive::Sensitive;
use gldb_core::traits::Store;
use gldb_stores::{CsvStore, EndpointCredentials, InMemoryRdfStore, SparqlEndpointStore};

use crate::federation::FederationConfig;

pub const ENV_MISSING_DATA_POLICY: &str = "GLDB_MISSING_DATA_POLICY";
pub const ENV_FETCH_TIMEOUT_MS: &str = "GLDB_FETCH_TIMEOUT_MS";

/// One store to register, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    InMemoryRdf {
        name: String,
        /// Replaces the default vocabulary when set
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespaces: Option<BTreeMap<String, String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        skolem_base: Option<String>,
    },
    Csv {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delimiter: Option<char>,
    },
    SparqlEndpoint {
        name: String,
        endpoint: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        /// Serialized as `***`; saved configs never carry the secret
        #[serde(default, skip_serializing_if = "Option::is_none")]
        password: Option<Sensitive<String>>,
    },
}

impl StoreConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::InMemoryRdf { name, .. } | Self::Csv { name, .. } | Self::SparqlEndpoint { name, .. } => name,
        }
    }

    /// Instantiates the configured store.
    pub fn build(&self) -> StoreResult<Arc<dyn Store>> {
        match self {
            Self::InMemoryRdf {
                namespaces,
                skolem_base,
                ..
            } => {
                let mut store = InMemoryRdfStore::new()?;
                if let Some(namespaces) = namespaces {
                    store = store.with_namespaces(Namespaces::new(namespaces.clone()));
                }
                if let Some(base) = skolem_base {
                    store = store.with_skolem_base(base.clone());
                }
                Ok(Arc::new(store))
            }
            Self::Csv { delimiter, .. } => {
                let mut store = CsvStore::new();
                if let Some(delimiter) = delimiter {
                    let byte = u8::try_from(*delimiter)
                        .ok()
                        .filter(u8::is_ascii)
                        .ok_or_else(|| {
                            StoreError::configuration(format!(
                                "CSV delimiter must be a single ASCII character, got '{delimiter}'"
                            ))
                        })?;
                    store = store.with_delimiter(byte);
                }
                Ok(Arc::new(store))
            }
            Self::SparqlEndpoint {
                endpoint,
                timeout_ms,
                username,
                password,
                ..
            } => {
                let mut store = match timeout_ms {
                    Some(ms) => SparqlEndpointStore::with_timeout(endpoint, *ms)?,
                    None => SparqlEndpointStore::new(endpoint)?,
                };
                match (username, password) {
                    (Some(_), Some(password)) if password.is_mask() => {
                        return Err(StoreError::configuration(format!(
                            "endpoint '{}' has a masked password; saved configs do not keep secrets",
                            self.name()
                        )))
                    }
                    (Some(username), Some(password)) => {
                        store = store.with_credentials(EndpointCredentials {
                            username: username.clone(),
                            password: password.clone(),
                        });
                    }
                    (None, None) => {}
                    _ => {
                        return Err(StoreError::configuration(format!(
                            "endpoint '{}' needs both username and password",
                            self.name()
                        )))
                    }
                }
                Ok(Arc::new(store))
            }
        }
    }
}

/// Stores to register plus federation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub stores: Vec<StoreConfig>,
    pub federation: FederationConfig,
}

impl DatabaseConfig {
    /// Loads the config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::configuration(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> StoreResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| StoreError::configuration(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::configuration(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| {
            StoreError::configuration(format!("Failed to write config {}: {}", path.display(), e))
        })
    }

    /// Applies `GLDB_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> StoreResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> StoreResult<()> {
        if let Some(policy) = lookup(ENV_MISSING_DATA_POLICY) {
            self.federation.missing_data = policy.parse()?;
        }
        if let Some(timeout) = lookup(ENV_FETCH_TIMEOUT_MS) {
            self.federation.fetch_timeout_ms = timeout.trim().parse().map_err(|_| {
                StoreError::configuration(format!(
                    "{ENV_FETCH_TIMEOUT_MS} must be a number of milliseconds, got '{timeout}'"
                ))
            })?;
        }
        Ok(())
    }
}
