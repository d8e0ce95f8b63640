// SPDX-License-Identifier: Apache-2.0

//! CSV Table Store
//!
//! Implements the Store and DataStore traits over CSV files loaded into
//! memory. Each file becomes one table keyed by its file name
//! (`temperature.csv`), which is also the key federation derives from a
//! dataset's download URL.
//!
//! The query dialect is a plain table lookup: the expression is the table
//! key. An optional `limit` parameter truncates the returned rows.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use gldb_core::error::{StoreError, StoreResult};
use gldb_core::query::{ensure_dialect, Query, QueryResult, ResultData};
use gldb_core::traits::{DataStore, Store};
use gldb_core::types::{ColumnInfo, QueryLanguage, Row, Table, Value};

#[derive(Default)]
struct CsvState {
    files: BTreeSet<PathBuf>,
    tables: BTreeMap<String, Table>,
}

/// Data store holding CSV files as in-memory tables
pub struct CsvStore {
    delimiter: u8,
    state: RwLock<CsvState>,
}

impl CsvStore {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            state: RwLock::new(CsvState::default()),
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Keys of the tables currently held, sorted
    pub fn tables(&self) -> Vec<String> {
        self.state.read().tables.keys().cloned().collect()
    }

    pub fn table(&self, key: &str) -> Option<Table> {
        self.state.read().tables.get(key).cloned()
    }

    fn read_table(&self, path: &Path, name: &str) -> Result<Table, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect();

        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            raw_rows.push(record.iter().map(str::to_string).collect());
        }

        let column_types: Vec<ColumnType> = (0..headers.len())
            .map(|idx| ColumnType::infer(raw_rows.iter().map(|r| r.get(idx).map(String::as_str))))
            .collect();

        let columns = headers
            .iter()
            .zip(&column_types)
            .map(|(name, ty)| ColumnInfo {
                name: name.clone(),
                data_type: ty.kind.to_string(),
                nullable: ty.nullable,
            })
            .collect();

        let rows = raw_rows
            .iter()
            .map(|raw| Row {
                values: column_types
                    .iter()
                    .enumerate()
                    .map(|(idx, ty)| ty.convert(raw.get(idx).map(String::as_str)))
                    .collect(),
            })
            .collect();

        Ok(Table::new(name, columns, rows))
    }
}

impl Default for CsvStore {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_error(err: csv::Error) -> StoreError {
    StoreError::execution_error(format!("CSV error: {err}"))
}

/// Resolved type of a CSV column
struct ColumnType {
    kind: &'static str,
    nullable: bool,
}

impl ColumnType {
    /// Ints widen to floats; anything mixed or textual falls back to text.
    fn infer<'a>(cells: impl Iterator<Item = Option<&'a str>>) -> Self {
        let mut kind: Option<&'static str> = None;
        let mut nullable = false;

        for cell in cells {
            let value = cell.map(Value::infer).unwrap_or(Value::Null);
            let cell_kind = match value {
                Value::Null => {
                    nullable = true;
                    continue;
                }
                other => other.type_name(),
            };
            kind = Some(match (kind, cell_kind) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some("int"), "float") | (Some("float"), "int") => "float",
                _ => "text",
            });
        }

        Self {
            kind: kind.unwrap_or("text"),
            nullable,
        }
    }

    fn convert(&self, cell: Option<&str>) -> Value {
        let raw = match cell {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Value::Null,
        };
        let trimmed = raw.trim();
        match self.kind {
            "int" => trimmed.parse().map(Value::Int).unwrap_or_else(|_| Value::Text(raw.to_string())),
            "float" => trimmed.parse().map(Value::Float).unwrap_or_else(|_| Value::Text(raw.to_string())),
            "bool" => Value::Bool(trimmed.eq_ignore_ascii_case("true")),
            _ => Value::Text(raw.to_string()),
        }
    }
}

#[async_trait]
impl Store for CsvStore {
    fn store_type(&self) -> &'static str {
        "csv"
    }

    fn display_name(&self) -> &'static str {
        "CSV Table Store"
    }

    fn query_language(&self) -> QueryLanguage {
        QueryLanguage::Table
    }

    fn expected_file_extensions(&self) -> BTreeSet<String> {
        BTreeSet::from([".csv".to_string()])
    }

    async fn execute_query(&self, query: &Query) -> StoreResult<QueryResult> {
        ensure_dialect(query, self)?;
        let start = Instant::now();

        let key = query.expression().trim();
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(StoreError::syntax_error(format!(
                "expected a table name, got '{}'",
                query.expression()
            )));
        }

        let mut table = self
            .table(key)
            .ok_or_else(|| StoreError::not_found(format!("table '{key}'")))?;

        if let Some(limit) = query.param("limit") {
            let limit = limit
                .as_u64()
                .ok_or_else(|| StoreError::syntax_error("'limit' must be a non-negative integer"))?;
            table.rows.truncate(limit as usize);
        }

        let elapsed = start.elapsed().as_secs_f64() * 1000.0;
        debug!(table = key, rows = table.len(), "Table query executed");
        Ok(QueryResult::new(query, ResultData::Table { table }).with_execution_time(elapsed))
    }

    async fn upload_file(&self, path: &Path) -> StoreResult<bool> {
        if !path.exists() {
            return Err(StoreError::file_not_found(path));
        }
        if !self.accepts(path) {
            return Err(StoreError::unsupported_file_type(path));
        }

        let canonical = path.canonicalize()?;
        if self.state.read().files.contains(&canonical) {
            debug!(path = %canonical.display(), "CSV file already loaded");
            return Ok(true);
        }

        let name = canonical
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StoreError::unsupported_file_type(path))?
            .to_string();
        let table = match self.read_table(&canonical, &name) {
            Ok(table) => table,
            Err(e) if e.is_io_error() => return Err(csv_error(e)),
            Err(e) => {
                warn!(path = %canonical.display(), error = %e, "Failed to parse CSV file");
                return Ok(false);
            }
        };
        let rows = table.len();

        let mut state = self.state.write();
        if state.tables.insert(name.clone(), table).is_some() {
            warn!(table = %name, path = %canonical.display(), "Replaced a table loaded from another file");
        }
        state.files.insert(canonical);
        info!(table = %name, rows, "Loaded CSV file");
        Ok(true)
    }

    fn as_data_store(&self) -> Option<&dyn DataStore> {
        Some(self)
    }
}

#[async_trait]
impl DataStore for CsvStore {
    async fn get_table(&self, key: &str) -> StoreResult<Option<Table>> {
        Ok(self.table(key))
    }

    async fn table_names(&self) -> StoreResult<Vec<String>> {
        Ok(self.tables())
    }
}
