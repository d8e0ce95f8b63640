// SPDX-License-Identifier: Apache-2.0

//! Generic linked database abstraction layer
//!
//! The store contract every repository implements, the dialect-tagged query
//! model, the store registry and the normalized error type.

pub mod error;
pub mod manager;
pub mod namespaces;
pub mod query;
pub mod sensitive;
pub mod traits;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use manager::{NamedStore, StoreManager};
pub use namespaces::Namespaces;
pub use query::{Query, QueryResult, ResultData};
pub use sensitive::Sensitive;
pub use traits::{DataStore, MetadataStore, Store};
pub use types::*;
