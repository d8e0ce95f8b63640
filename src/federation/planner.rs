// SPDX-License-Identifier: Apache-2.0

//! Federation planner.
//!
//! Turns the candidate query's bindings into [`Candidate`]s: one dataset
//! identifier plus the data-store key derived from its download pointer.

use percent_encoding::percent_decode_str;
use url::Url;

use gldb_core::error::{StoreError, StoreResult};
use gldb_core::types::{escape_literal, Binding};

use super::types::{Candidate, FederationRequest};

/// Candidate query selecting datasets created on `date`.
pub fn created_on_query(date: &str) -> String {
    format!(
        r#"PREFIX dcterms: <http://purl.org/dc/terms/>
PREFIX dcat: <http://www.w3.org/ns/dcat#>

SELECT ?dataset ?url
WHERE {{
  ?dataset a dcat:Dataset .
  ?dataset dcterms:created "{date}" .
  ?dataset dcat:distribution ?distribution .
  ?distribution dcat:downloadURL ?url .
}}"#,
        date = escape_literal(date)
    )
}

/// Derives the data-store key from a download pointer.
///
/// For URLs this is the last path segment, percent-decoded. A pointer whose
/// last segment is empty (`https://host/dir/`) has no key.
pub fn join_key(pointer: &str) -> Option<String> {
    let segment = match Url::parse(pointer) {
        Ok(url) if !url.cannot_be_a_base() => {
            let last = url.path_segments()?.next_back()?.to_string();
            percent_decode_str(&last).decode_utf8().ok()?.into_owned()
        }
        _ => pointer.rsplit('/').next()?.to_string(),
    };

    let segment = segment.trim();
    if segment.is_empty() {
        None
    } else {
        Some(segment.to_string())
    }
}

/// Reads the dataset and pointer of every binding, in binding order.
pub fn extract_candidates(
    bindings: Vec<Binding>,
    request: &FederationRequest,
) -> StoreResult<Vec<Candidate>> {
    bindings
        .into_iter()
        .enumerate()
        .map(|(idx, mut binding)| {
            let dataset = binding.remove(&request.dataset_var);
            let pointer = binding.remove(&request.pointer_var);
            match (dataset, pointer) {
                (Some(dataset), Some(pointer)) => {
                    let key = join_key(pointer.value());
                    Ok(Candidate {
                        dataset,
                        pointer,
                        key,
                    })
                }
                _ => Err(StoreError::execution_error(format!(
                    "malformed candidate binding #{idx}: expected variables '{}' and '{}'",
                    request.dataset_var, request.pointer_var
                ))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gldb_core::types::Term;

    #[test]
    fn created_on_query_escapes_the_date() {
        let sparql = created_on_query("2024-01-01");
        assert!(sparql.contains(r#"?dataset dcterms:created "2024-01-01" ."#));
        assert!(sparql.contains("SELECT ?dataset ?url"));

        let sparql = created_on_query(r#"2024" . ?x ?y ?z . "#);
        assert!(sparql.contains(r#""2024\" . ?x ?y ?z . ""#));
    }

    #[test]
    fn join_key_takes_last_segment() {
        assert_eq!(
            join_key("https://example.org/data/temperature.csv").as_deref(),
            Some("temperature.csv")
        );
        assert_eq!(
            join_key("https://example.org/data/my%20file.csv?x=1").as_deref(),
            Some("my file.csv")
        );
        assert_eq!(join_key("files/users.csv").as_deref(), Some("users.csv"));
        assert_eq!(join_key("users.csv").as_deref(), Some("users.csv"));
    }

    #[test]
    fn join_key_rejects_empty_segments() {
        assert_eq!(join_key("https://example.org/data/"), None);
        assert_eq!(join_key("https://example.org"), None);
        assert_eq!(join_key("dir/"), None);
        assert_eq!(join_key(""), None);
    }

    #[test]
    fn extracts_candidates_in_order() {
        let request = FederationRequest::new("SELECT ...");
        let bindings = vec![
            Binding::from([
                ("dataset".to_string(), Term::iri("https://example.org/a")),
                ("url".to_string(), Term::literal("https://example.org/a.csv")),
            ]),
            Binding::from([
                ("dataset".to_string(), Term::iri("https://example.org/b")),
                ("url".to_string(), Term::iri("https://example.org/dir/")),
            ]),
        ];

        let candidates = extract_candidates(bindings, &request).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].dataset, Term::iri("https://example.org/a"));
        assert_eq!(candidates[0].key.as_deref(), Some("a.csv"));
        assert_eq!(candidates[1].key, None);
    }

    #[test]
    fn binding_without_pointer_is_malformed() {
        let request = FederationRequest::new("SELECT ...");
        let bindings = vec![Binding::from([(
            "dataset".to_string(),
            Term::iri("https://example.org/a"),
        )])];

        let err = extract_candidates(bindings, &request).unwrap_err();
        assert!(matches!(err, StoreError::ExecutionError { ref message } if message.contains("malformed")));
    }
}
