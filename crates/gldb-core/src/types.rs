// SPDX-License-Identifier: Apache-2.0

//! Universal data types shared by every store
//!
//! These types provide a store-independent representation of tabular
//! payloads (tables, rows, values) and graph payloads (terms, bindings,
//! triples).

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a query value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryId(pub Uuid);

impl QueryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QueryId {
    fn default() -> Self {
        Self::new()
    }
}

/// The dialect a query is written in.
///
/// Every query carries one of these tags and every store declares the one
/// it executes, so routing is an explicit comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryLanguage {
    /// SPARQL 1.1 against a graph store
    Sparql,
    /// Table lookup against a tabular store (expression is the table name)
    Table,
}

impl fmt::Display for QueryLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sparql => f.write_str("sparql"),
            Self::Table => f.write_str("table"),
        }
    }
}

/// Universal value representation for table cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Infers the narrowest value for a raw text cell.
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Null;
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return Self::Int(i);
        }
        // "NaN" and "inf" parse as f64 but are labels in tabular data
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Self::Float(f);
            }
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => Self::Text(raw.to_string()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }
}

/// Column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// A single row of data (indexed by column order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

/// A named table held by a data store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// All values of the named column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.values.get(idx).unwrap_or(&Value::Null))
                .collect(),
        )
    }
}

/// An RDF term, detached from any particular graph engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Term {
    Iri {
        value: String,
    },
    BlankNode {
        value: String,
    },
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Self::Iri {
            value: value.into(),
        }
    }

    pub fn blank(value: impl Into<String>) -> Self {
        Self::BlankNode {
            value: value.into(),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    /// The lexical value: the IRI, the blank node label or the literal text.
    pub fn value(&self) -> &str {
        match self {
            Self::Iri { value } | Self::BlankNode { value } | Self::Literal { value, .. } => value,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Self::Iri { .. })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal { .. })
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri { value } => write!(f, "<{value}>"),
            Self::BlankNode { value } => write!(f, "_:{value}"),
            Self::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "\"{}\"", escape_literal(value))?;
                if let Some(lang) = language {
                    write!(f, "@{lang}")
                } else if let Some(dt) = datatype {
                    write!(f, "^^<{dt}>")
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// One solution row of a graph query: variable name → bound term
pub type Binding = BTreeMap<String, Term>;

/// A subject/predicate/object statement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

/// Escapes a string for use inside a double-quoted SPARQL/Turtle literal.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

/// Lower-cased file suffix including the leading dot (`data.CSV` → `.csv`).
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_inference_prefers_narrowest_type() {
        assert_eq!(Value::infer("42"), Value::Int(42));
        assert_eq!(Value::infer("4.5"), Value::Float(4.5));
        assert_eq!(Value::infer("TRUE"), Value::Bool(true));
        assert_eq!(Value::infer(" "), Value::Null);
        assert_eq!(
            Value::infer("2024-01-01T00:00:00"),
            Value::Text("2024-01-01T00:00:00".to_string())
        );
    }

    #[test]
    fn test_non_finite_numbers_stay_text() {
        for raw in ["NaN", "nan", "inf", "-inf", "Infinity", "infinity"] {
            assert_eq!(Value::infer(raw), Value::Text(raw.to_string()), "{raw}");
        }
        assert_eq!(Value::infer("1e3"), Value::Float(1000.0));
    }

    #[test]
    fn term_display_uses_sparql_syntax() {
        assert_eq!(Term::iri("https://example.org/a").to_string(), "<https://example.org/a>");
        assert_eq!(Term::literal("say \"hi\"").to_string(), "\"say \\\"hi\\\"\"");
        assert_eq!(Term::lang_literal("Hallo", "de").to_string(), "\"Hallo\"@de");
        assert_eq!(
            Term::typed_literal("1", "http://www.w3.org/2001/XMLSchema#integer").to_string(),
            "\"1\"^^<http://www.w3.org/2001/XMLSchema#integer>"
        );
    }

    #[test]
    fn table_column_lookup() {
        let table = Table::new(
            "t.csv",
            vec![
                ColumnInfo {
                    name: "a".to_string(),
                    data_type: "int".to_string(),
                    nullable: false,
                },
                ColumnInfo {
                    name: "b".to_string(),
                    data_type: "text".to_string(),
                    nullable: true,
                },
            ],
            vec![Row {
                values: vec![Value::Int(1)],
            }],
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.column("a"), Some(vec![&Value::Int(1)]));
        assert_eq!(table.column("b"), Some(vec![&Value::Null]));
        assert!(table.column("c").is_none());
    }

    #[test]
    fn file_extension_is_lowercased_with_dot() {
        assert_eq!(file_extension(Path::new("x/Data.TTL")), Some(".ttl".to_string()));
        assert_eq!(file_extension(Path::new("x/README")), None);
    }
}
