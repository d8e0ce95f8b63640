// SPDX-License-Identifier: Apache-2.0

//! Store Manager
//!
//! Central registry of the stores composing a linked database. Names are
//! unique and entries are never removed; lookups hand out `Arc` clones so
//! the lock is only held for the duration of the map access.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::Store;

/// A registered store together with its name
pub type NamedStore = (String, Arc<dyn Store>);

/// Registry that holds all stores of a linked database, in insertion order
pub struct StoreManager {
    stores: RwLock<Vec<NamedStore>>,
}

impl StoreManager {
    /// Creates a new empty manager
    pub fn new() -> Self {
        Self {
            stores: RwLock::new(Vec::new()),
        }
    }

    /// Builds a manager from `(name, store)` pairs, failing on the first duplicate name
    pub fn from_stores<I, S>(stores: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = (S, Arc<dyn Store>)>,
        S: Into<String>,
    {
        let manager = Self::new();
        for (name, store) in stores {
            manager.add_store(name, store)?;
        }
        Ok(manager)
    }

    /// Registers `store` under `name`
    ///
    /// Fails with `DuplicateName` if the name is taken; the registry is left unchanged.
    pub fn add_store(&self, name: impl Into<String>, store: Arc<dyn Store>) -> StoreResult<()> {
        let name = name.into();
        let mut stores = self.stores.write();
        if stores.iter().any(|(n, _)| *n == name) {
            return Err(StoreError::duplicate_name(name));
        }
        debug!(store = %name, store_type = store.store_type(), "Registering store");
        stores.push((name, store));
        Ok(())
    }

    /// Gets a store by name
    pub fn get_store(&self, name: &str) -> StoreResult<Arc<dyn Store>> {
        self.stores
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| Arc::clone(s))
            .ok_or_else(|| StoreError::store_not_found(name))
    }

    /// Alias of [`StoreManager::get_store`]
    pub fn get(&self, name: &str) -> StoreResult<Arc<dyn Store>> {
        self.get_store(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stores.read().iter().any(|(n, _)| n == name)
    }

    /// Lists all registered store names
    pub fn names(&self) -> Vec<String> {
        self.stores.read().iter().map(|(n, _)| n.clone()).collect()
    }

    /// All stores
    pub fn stores(&self) -> Vec<NamedStore> {
        self.stores.read().clone()
    }

    /// Stores exposing the tabular capability
    pub fn data_stores(&self) -> Vec<NamedStore> {
        self.filtered(|s| s.as_data_store().is_some())
    }

    /// Stores exposing the graph metadata capability
    pub fn metadata_stores(&self) -> Vec<NamedStore> {
        self.filtered(|s| s.as_metadata_store().is_some())
    }

    fn filtered(&self, keep: impl Fn(&dyn Store) -> bool) -> Vec<NamedStore> {
        self.stores
            .read()
            .iter()
            .filter(|(_, s)| keep(s.as_ref()))
            .map(|(n, s)| (n.clone(), Arc::clone(s)))
            .collect()
    }

    /// Returns the number of registered stores
    pub fn len(&self) -> usize {
        self.stores.read().len()
    }

    /// Returns true if no stores are registered
    pub fn is_empty(&self) -> bool {
        self.stores.read().is_empty()
    }
}

impl Default for StoreManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoreManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreManager(stores=[{}])", self.names().join(", "))
    }
}

impl fmt::Debug for StoreManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreManager")
            .field("stores", &self.names())
            .finish()
    }
}
