// SPDX-License-Identifier: Apache-2.0

//! In-memory RDF Store
//!
//! Implements the Store and MetadataStore traits on top of an in-memory
//! oxigraph store.
//!
//! ## Ingestion
//!
//! - The RDF syntax is chosen from the file suffix (Turtle, N-Triples, N-Quads, TriG, RDF/XML, N3)
//! - Every statement lands in the default graph, named graphs are merged
//! - Blank nodes are renamed per file, then skolemised to IRIs under a
//!   configurable base so that follow-up queries can address them by IRI.
//!   Two files reusing the label `_:b0` never collapse into one node
//! - Uploading the same file twice is a no-op that still reports success

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{BlankNode, GraphName, NamedNode, Quad, Subject, Term as OxTerm};
use oxigraph::sparql::{Query as SparqlQuery, QueryResults};
use oxigraph::store::Store as OxStore;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use gldb_core::error::{StoreError, StoreResult};
use gldb_core::namespaces::Namespaces;
use gldb_core::query::{ensure_dialect, Query, QueryResult, ResultData};
use gldb_core::traits::{MetadataStore, Store};
use gldb_core::types::{Binding, QueryLanguage, Term, Triple};

/// Base IRI for skolemised blank nodes unless configured otherwise
pub const DEFAULT_SKOLEM_BASE: &str = "https://example.org/.well-known/genid/";

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

const EXTENSIONS: &[(&str, RdfFormat)] = &[
    (".ttl", RdfFormat::Turtle),
    (".nt", RdfFormat::NTriples),
    (".nq", RdfFormat::NQuads),
    (".trig", RdfFormat::TriG),
    (".rdf", RdfFormat::RdfXml),
    (".owl", RdfFormat::RdfXml),
    (".n3", RdfFormat::N3),
];

/// Metadata store backed by an in-memory oxigraph graph
pub struct InMemoryRdfStore {
    graph: OxStore,
    namespaces: Namespaces,
    skolem_base: String,
    loaded_files: Mutex<BTreeSet<PathBuf>>,
}

impl InMemoryRdfStore {
    pub fn new() -> StoreResult<Self> {
        let graph = OxStore::new().map_err(|e| StoreError::execution_error(e.to_string()))?;
        Ok(Self {
            graph,
            namespaces: Namespaces::default_vocabulary(),
            skolem_base: DEFAULT_SKOLEM_BASE.to_string(),
            loaded_files: Mutex::new(BTreeSet::new()),
        })
    }

    pub fn with_namespaces(mut self, namespaces: Namespaces) -> Self {
        self.namespaces = namespaces;
        self
    }

    pub fn with_skolem_base(mut self, base: impl Into<String>) -> Self {
        self.skolem_base = base.into();
        self
    }

    /// The underlying graph handle
    pub fn graph(&self) -> &OxStore {
        &self.graph
    }

    /// Number of triples currently held
    pub fn triple_count(&self) -> StoreResult<usize> {
        self.graph
            .len()
            .map_err(|e| StoreError::execution_error(e.to_string()))
    }

    /// Files ingested so far (canonical paths)
    pub fn loaded_files(&self) -> Vec<PathBuf> {
        self.loaded_files.lock().iter().cloned().collect()
    }

    fn format_for(path: &Path) -> Option<RdfFormat> {
        let ext = gldb_core::types::file_extension(path)?;
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, format)| *format)
    }

    fn skolemize(&self, node: &BlankNode) -> StoreResult<NamedNode> {
        NamedNode::new(format!("{}{}", self.skolem_base, node.as_str()))
            .map_err(|e| StoreError::configuration(format!("invalid skolem base IRI: {e}")))
    }

    /// Parses the whole file, returning `None` when the content is malformed.
    fn parse_file(&self, path: &Path, format: RdfFormat) -> StoreResult<Option<Vec<Quad>>> {
        let reader = BufReader::new(File::open(path)?);
        let mut quads = Vec::new();

        let parser = RdfParser::from_format(format).rename_blank_nodes();
        for quad in parser.for_reader(reader) {
            let quad = match quad {
                Ok(quad) => quad,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse RDF file");
                    return Ok(None);
                }
            };

            let subject = match quad.subject {
                Subject::BlankNode(b) => Subject::NamedNode(self.skolemize(&b)?),
                other => other,
            };
            let object = match quad.object {
                OxTerm::BlankNode(b) => OxTerm::NamedNode(self.skolemize(&b)?),
                other => other,
            };
            quads.push(Quad::new(subject, quad.predicate, object, GraphName::DefaultGraph));
        }

        Ok(Some(quads))
    }

    fn ingest(&self, path: &Path, format: RdfFormat) -> StoreResult<bool> {
        let Some(quads) = self.parse_file(path, format)? else {
            return Ok(false);
        };
        for quad in &quads {
            self.graph
                .insert(quad)
                .map_err(|e| StoreError::execution_error(e.to_string()))?;
        }
        info!(path = %path.display(), triples = quads.len(), "Loaded RDF file");
        Ok(true)
    }

    fn run(&self, query: &Query) -> StoreResult<ResultData> {
        let parsed = SparqlQuery::parse(query.expression(), None)
            .map_err(|e| StoreError::syntax_error(e.to_string()))?;

        let results = self
            .graph
            .query(parsed)
            .map_err(|e| StoreError::execution_error(e.to_string()))?;

        match results {
            QueryResults::Solutions(solutions) => {
                let variables: Vec<String> = solutions
                    .variables()
                    .iter()
                    .map(|v| v.as_str().to_string())
                    .collect();
                let mut bindings = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| StoreError::execution_error(e.to_string()))?;
                    let binding: Binding = solution
                        .iter()
                        .map(|(var, term)| (var.as_str().to_string(), convert_term(term)))
                        .collect();
                    bindings.push(binding);
                }
                Ok(ResultData::Solutions { variables, bindings })
            }
            QueryResults::Boolean(value) => Ok(ResultData::Boolean { value }),
            QueryResults::Graph(triples) => {
                let mut out = Vec::new();
                for triple in triples {
                    let triple = triple.map_err(|e| StoreError::execution_error(e.to_string()))?;
                    out.push(Triple {
                        subject: convert_subject(&triple.subject),
                        predicate: Term::iri(triple.predicate.as_str()),
                        object: convert_term(&triple.object),
                    });
                }
                Ok(ResultData::Triples { triples: out })
            }
        }
    }
}

/// Converts an oxigraph term into the store-independent representation
pub fn convert_term(term: &OxTerm) -> Term {
    match term {
        OxTerm::NamedNode(n) => Term::iri(n.as_str()),
        OxTerm::BlankNode(b) => Term::blank(b.as_str()),
        OxTerm::Literal(l) => {
            if let Some(lang) = l.language() {
                Term::lang_literal(l.value(), lang)
            } else if l.datatype().as_str() == XSD_STRING {
                Term::literal(l.value())
            } else {
                Term::typed_literal(l.value(), l.datatype().as_str())
            }
        }
        #[allow(unreachable_patterns)]
        other => Term::literal(other.to_string()),
    }
}

fn convert_subject(subject: &Subject) -> Term {
    match subject {
        Subject::NamedNode(n) => Term::iri(n.as_str()),
        Subject::BlankNode(b) => Term::blank(b.as_str()),
        #[allow(unreachable_patterns)]
        other => Term::literal(other.to_string()),
    }
}

#[async_trait]
impl Store for InMemoryRdfStore {
    fn store_type(&self) -> &'static str {
        "in_memory_rdf"
    }

    fn display_name(&self) -> &'static str {
        "In-memory RDF Store"
    }

    fn query_language(&self) -> QueryLanguage {
        QueryLanguage::Sparql
    }

    fn expected_file_extensions(&self) -> BTreeSet<String> {
        EXTENSIONS.iter().map(|(ext, _)| ext.to_string()).collect()
    }

    async fn execute_query(&self, query: &Query) -> StoreResult<QueryResult> {
        ensure_dialect(query, self)?;
        let start = Instant::now();
        let data = self.run(query)?;
        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        debug!(query_id = %query.id().0, time_ms = elapsed, "SPARQL query executed");
        Ok(QueryResult::new(query, data).with_execution_time(elapsed))
    }

    async fn upload_file(&self, path: &Path) -> StoreResult<bool> {
        if !path.exists() {
            return Err(StoreError::file_not_found(path));
        }
        let format = Self::format_for(path).ok_or_else(|| StoreError::unsupported_file_type(path))?;

        let canonical = path.canonicalize()?;
        // reserve the path so concurrent uploads of one file ingest it once
        if !self.loaded_files.lock().insert(canonical.clone()) {
            debug!(path = %canonical.display(), "RDF file already loaded");
            return Ok(true);
        }

        let loaded = self.ingest(&canonical, format);
        if !matches!(loaded, Ok(true)) {
            self.loaded_files.lock().remove(&canonical);
        }
        loaded
    }

    fn as_metadata_store(&self) -> Option<&dyn MetadataStore> {
        Some(self)
    }
}

impl MetadataStore for InMemoryRdfStore {
    fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }
}
