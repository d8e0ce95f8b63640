// SPDX-License-Identifier: Apache-2.0

//! Vocabulary prefix table
//!
//! An immutable prefix → namespace IRI mapping handed to metadata stores at
//! construction. Cloning is cheap; the table is shared.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Default vocabulary known to every metadata store unless overridden
const DEFAULT_VOCABULARY: &[(&str, &str)] = &[
    ("ex", "https://example.org/"),
    ("afn", "http://jena.apache.org/ARQ/function#"),
    ("agg", "http://jena.apache.org/ARQ/function/aggregate#"),
    ("apf", "http://jena.apache.org/ARQ/property#"),
    ("array", "http://www.w3.org/2005/xpath-functions/array"),
    ("dcat", "http://www.w3.org/ns/dcat#"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("fn", "http://www.w3.org/2005/xpath-functions"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("geoext", "http://rdf.useekm.com/ext#"),
    ("geof", "http://www.opengis.net/def/function/geosparql/"),
    ("gn", "http://www.geonames.org/ontology#"),
    ("graphdb", "http://www.ontotext.com/config/graphdb#"),
    ("list", "http://jena.apache.org/ARQ/list#"),
    ("local", "https://doi.org/10.5281/zenodo.14175299/"),
    ("m4i", "http://w3id.org/nfdi4ing/metadata4ing#"),
    ("map", "http://www.w3.org/2005/xpath-functions/map"),
    ("math", "http://www.w3.org/2005/xpath-functions/math"),
    ("ofn", "http://www.ontotext.com/sparql/functions/"),
    ("omgeo", "http://www.ontotext.com/owlim/geo#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("path", "http://www.ontotext.com/path#"),
    ("prov", "http://www.w3.org/ns/prov#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("rep", "http://www.openrdf.org/config/repository#"),
    ("sail", "http://www.openrdf.org/config/sail#"),
    ("schema", "https://schema.org/"),
    ("spif", "http://spinrdf.org/spif#"),
    ("sr", "http://www.openrdf.org/config/repository/sail#"),
    ("ssno", "https://matthiasprobst.github.io/ssno#"),
    ("wgs", "http://www.w3.org/2003/01/geo/wgs84_pos#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// Immutable prefix → namespace table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespaces {
    prefixes: Arc<BTreeMap<String, String>>,
}

impl Namespaces {
    pub fn new<I, P, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, N)>,
        P: Into<String>,
        N: Into<String>,
    {
        Self {
            prefixes: Arc::new(
                entries
                    .into_iter()
                    .map(|(p, n)| (p.into(), n.into()))
                    .collect(),
            ),
        }
    }

    /// The vocabulary table metadata stores use by default
    pub fn default_vocabulary() -> Self {
        Self::new(DEFAULT_VOCABULARY.iter().copied())
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, n)| (p.as_str(), n.as_str()))
    }

    /// Shortens `iri` to `prefix:local` using the longest matching namespace.
    ///
    /// IRIs outside every namespace are returned unchanged.
    pub fn compact(&self, iri: &str) -> String {
        self.prefixes
            .iter()
            .filter(|(_, ns)| iri.len() > ns.len() && iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len())
            .map(|(prefix, ns)| format!("{prefix}:{}", &iri[ns.len()..]))
            .unwrap_or_else(|| iri.to_string())
    }

    /// Expands `prefix:local` into a full IRI, if the prefix is known.
    pub fn expand(&self, curie: &str) -> Option<String> {
        let (prefix, local) = curie.split_once(':')?;
        self.get(prefix).map(|ns| format!("{ns}{local}"))
    }

    /// A table restricted to `prefixes`; unknown prefixes are ignored.
    pub fn subset<S: AsRef<str>>(&self, prefixes: &[S]) -> Self {
        Self::new(prefixes.iter().filter_map(|p| {
            let p = p.as_ref();
            self.get(p).map(|ns| (p.to_string(), ns.to_string()))
        }))
    }

    /// JSON object suitable for an `@context` entry
    pub fn to_context(&self) -> serde_json::Map<String, serde_json::Value> {
        self.prefixes
            .iter()
            .map(|(p, n)| (p.clone(), serde_json::Value::String(n.clone())))
            .collect()
    }

    /// `PREFIX` declarations for a SPARQL prologue
    pub fn sparql_prologue(&self) -> String {
        self.prefixes
            .iter()
            .map(|(p, n)| format!("PREFIX {p}: <{n}>\n"))
            .collect()
    }
}
