// SPDX-License-Identifier: Apache-2.0

// Store implementations module

pub mod csv_store;
pub mod memory_rdf;
pub mod sparql_endpoint;

pub use csv_store::CsvStore;
pub use memory_rdf::InMemoryRdfStore;
pub use sparql_endpoint::{EndpointCredentials, SparqlEndpointStore};
