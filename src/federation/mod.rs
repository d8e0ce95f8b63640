// SPDX-License-Identifier: Apache-2.0

//! Metadata/Data Federation
//!
//! Joins records across a metadata store and a data store: a SPARQL
//! candidate query finds datasets, each dataset's download pointer names a
//! table in the data store, and the dataset's description becomes a
//! JSON-LD-shaped metadata document paired with that table.

pub mod document;
pub mod manager;
pub mod planner;
pub mod types;

pub use manager::execute_federation;
pub use types::{
    FederatedQueryResult, FederationConfig, FederationReport, FederationRequest,
    MissingDataPolicy, SkippedBinding,
};
