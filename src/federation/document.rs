// SPDX-License-Identifier: Apache-2.0

//! JSON-LD-shaped metadata documents.
//!
//! The federation describes each candidate dataset as a compacted JSON-LD
//! node object: `@context`, `@id`, `@type`, then one entry per predicate in
//! lexical order of the compact key.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value as JsonValue};

use gldb_core::namespaces::Namespaces;
use gldb_core::types::Term;

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

/// Builds the metadata document for `subject` from its (predicate, object) pairs.
///
/// `context` doubles as the compaction table: IRIs outside it stay absolute.
pub fn build_metadata_document(
    subject: &Term,
    pairs: &[(Term, Term)],
    context: &Namespaces,
) -> Map<String, JsonValue> {
    let mut types: Vec<String> = Vec::new();
    let mut properties: BTreeMap<String, Vec<JsonValue>> = BTreeMap::new();

    for (predicate, object) in pairs {
        if predicate.value() == RDF_TYPE {
            if let Term::Iri { value } = object {
                types.push(context.compact(value));
                continue;
            }
        }
        properties
            .entry(context.compact(predicate.value()))
            .or_default()
            .push(object_to_json(object, context));
    }

    let mut doc = Map::new();
    doc.insert("@context".to_string(), JsonValue::Object(context.to_context()));
    doc.insert("@id".to_string(), JsonValue::String(node_id(subject, context)));

    types.sort();
    types.dedup();
    match types.len() {
        0 => {}
        1 => {
            doc.insert("@type".to_string(), JsonValue::String(types.remove(0)));
        }
        _ => {
            doc.insert(
                "@type".to_string(),
                JsonValue::Array(types.into_iter().map(JsonValue::String).collect()),
            );
        }
    }

    for (key, mut values) in properties {
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            values.sort_by_key(|v| v.to_string());
            JsonValue::Array(values)
        };
        doc.insert(key, value);
    }

    flatten_node_references(&mut doc);
    doc
}

fn node_id(term: &Term, context: &Namespaces) -> String {
    match term {
        Term::Iri { value } => context.compact(value),
        Term::BlankNode { value } => format!("_:{value}"),
        Term::Literal { value, .. } => value.clone(),
    }
}

fn object_to_json(object: &Term, context: &Namespaces) -> JsonValue {
    match object {
        Term::Iri { .. } | Term::BlankNode { .. } => json!({ "@id": node_id(object, context) }),
        Term::Literal {
            value,
            language: Some(language),
            ..
        } => json!({ "@value": value, "@language": language }),
        Term::Literal {
            value,
            datatype: None,
            ..
        } => JsonValue::String(value.clone()),
        Term::Literal {
            value,
            datatype: Some(datatype),
            ..
        } => match datatype.as_str() {
            XSD_STRING => JsonValue::String(value.clone()),
            XSD_INTEGER => match value.trim().parse::<i64>() {
                Ok(n) => JsonValue::from(n),
                Err(_) => typed_value(value, datatype, context),
            },
            XSD_BOOLEAN => match value.trim() {
                "true" | "1" => JsonValue::Bool(true),
                "false" | "0" => JsonValue::Bool(false),
                _ => typed_value(value, datatype, context),
            },
            _ => typed_value(value, datatype, context),
        },
    }
}

fn typed_value(value: &str, datatype: &str, context: &Namespaces) -> JsonValue {
    json!({ "@value": value, "@type": context.compact(datatype) })
}

/// Replaces top-level `{"@id": x}` objects by `x`.
fn flatten_node_references(doc: &mut Map<String, JsonValue>) {
    for (key, value) in doc.iter_mut() {
        if key == "@context" {
            continue;
        }
        let id = match value {
            JsonValue::Object(obj) if obj.len() == 1 => obj.get("@id").cloned(),
            _ => None,
        };
        if let Some(id) = id {
            *value = id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Namespaces {
        Namespaces::default_vocabulary().subset(&["dcterms", "dcat", "ex"])
    }

    fn dcat(local: &str) -> Term {
        Term::iri(format!("http://www.w3.org/ns/dcat#{local}"))
    }

    fn dcterms(local: &str) -> Term {
        Term::iri(format!("http://purl.org/dc/terms/{local}"))
    }

    #[test]
    fn builds_compacted_document() {
        let subject = Term::iri("https://example.org/dataset1");
        let pairs = vec![
            (Term::iri(RDF_TYPE), dcat("Dataset")),
            (dcterms("title"), Term::literal("Temperature")),
            (dcterms("created"), Term::literal("2024-01-01")),
            (dcat("distribution"), Term::iri("https://example.org/dist1")),
        ];

        let doc = build_metadata_document(&subject, &pairs, &context());
        let keys: Vec<&str> = doc.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["@context", "@id", "@type", "dcat:distribution", "dcterms:created", "dcterms:title"]
        );
        assert_eq!(doc["@id"], json!("ex:dataset1"));
        assert_eq!(doc["@type"], json!("dcat:Dataset"));
        assert_eq!(doc["dcat:distribution"], json!("ex:dist1"));
        assert_eq!(doc["dcterms:title"], json!("Temperature"));
        assert_eq!(doc["@context"]["dcat"], json!("http://www.w3.org/ns/dcat#"));
    }

    #[test]
    fn literal_shapes() {
        let subject = Term::iri("https://example.org/d");
        let pairs = vec![
            (Term::iri("https://example.org/count"), Term::typed_literal("42", XSD_INTEGER)),
            (Term::iri("https://example.org/open"), Term::typed_literal("true", XSD_BOOLEAN)),
            (dcterms("title"), Term::lang_literal("Temperatur", "de")),
            (
                dcterms("issued"),
                Term::typed_literal("2024-01-01", "http://www.w3.org/2001/XMLSchema#date"),
            ),
        ];

        let doc = build_metadata_document(&subject, &pairs, &context());
        assert_eq!(doc["ex:count"], json!(42));
        assert_eq!(doc["ex:open"], json!(true));
        assert_eq!(doc["dcterms:title"], json!({ "@value": "Temperatur", "@language": "de" }));
        assert_eq!(
            doc["dcterms:issued"],
            json!({ "@value": "2024-01-01", "@type": "http://www.w3.org/2001/XMLSchema#date" })
        );
    }

    #[test]
    fn repeated_predicates_become_arrays() {
        let subject = Term::iri("https://example.org/d");
        let pairs = vec![
            (dcat("keyword"), Term::literal("weather")),
            (dcat("keyword"), Term::literal("air")),
            (dcat("distribution"), Term::iri("https://example.org/b")),
            (dcat("distribution"), Term::iri("https://example.org/a")),
        ];

        let doc = build_metadata_document(&subject, &pairs, &context());
        assert_eq!(doc["dcat:keyword"], json!(["air", "weather"]));
        // arrays of references are not flattened
        assert_eq!(
            doc["dcat:distribution"],
            json!([{ "@id": "ex:a" }, { "@id": "ex:b" }])
        );
        assert!(!doc.contains_key("@type"));
    }

    #[test]
    fn absolute_iris_outside_context() {
        let subject = Term::iri("http://other.org/d");
        let pairs = vec![(
            Term::iri("http://xmlns.com/foaf/0.1/page"),
            Term::iri("http://other.org/page"),
        )];

        let doc = build_metadata_document(&subject, &pairs, &context());
        assert_eq!(doc["@id"], json!("http://other.org/d"));
        assert_eq!(doc["http://xmlns.com/foaf/0.1/page"], json!("http://other.org/page"));
    }
}
