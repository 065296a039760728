//! SQLite target with an in-process stand-in for `COPY ... JSON`.
//!
//! Source resolution mirrors a storage prefix on the local filesystem:
//! a file path loads that file, a directory loads every `*.json` below it in sorted
//! order, and a missing path loads nothing.
//!
//! Each file may hold several JSON objects back to back (newline-delimited logs) or a
//! single object (catalog records). Values are mapped onto columns the way the cluster
//! maps them: `auto` matches top-level keys against lowercased column names, a jsonpaths
//! file maps expressions positionally. Rows are inserted as literal `VALUES` batches inside
//! one transaction per load.

use std::path::{Path, PathBuf};

use diesel::{Connection, ConnectionResult, RunQueryDsl, SqliteConnection, sql_query};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{Warehouse, execute_committed, jsonpath::{JsonPath, load_jsonpaths}};
use crate::db::connection::connect_sqlite;
use crate::error::WarehouseError;
use crate::sql::{
    Dialect,
    copy::{CopyJson, JsonFormat},
    tables::{Column, ColumnType, TableDef},
};

/// Rows per `INSERT ... VALUES` statement.
const BATCH_ROWS: usize = 200;

/// A SQLite database acting as the warehouse.
pub struct LocalWarehouse {
    conn: SqliteConnection,
}

impl LocalWarehouse {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> ConnectionResult<Self> {
        let path = path.as_ref().to_string_lossy();
        connect_sqlite(&path).map(Self::from_connection)
    }

    /// Wrap an established connection.
    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self { conn }
    }

    /// The underlying connection, for ad-hoc queries.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }
}

impl Warehouse for LocalWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, sql: &str) -> Result<usize, WarehouseError> {
        execute_committed(&mut self.conn, sql)
    }

    fn copy_json(&mut self, copy: &CopyJson) -> Result<usize, WarehouseError> {
        let files = source_files(Path::new(&copy.source))?;
        if files.is_empty() {
            warn!(table = copy.table.name, source = %copy.source, "no source files matched");
        }
        let mapping = match &copy.format {
            JsonFormat::Auto => Mapping::Auto,
            JsonFormat::JsonPaths(p) => Mapping::Paths(load_jsonpaths(Path::new(p), copy.table)?),
        };

        let rows = self
            .conn
            .transaction::<_, WarehouseError, _>(|conn| {
                let mut rows = 0;
                for file in &files {
                    let records = read_records(file)?;
                    debug!(file = %file.display(), records = records.len(), "read source file");
                    for chunk in records.chunks(BATCH_ROWS) {
                        let sql = insert_values_sql(copy.table, &mapping, chunk, file)?;
                        rows += sql_query(sql).execute(conn)?;
                    }
                }
                Ok(rows)
            })?;

        info!(
            table = copy.table.name,
            files = files.len(),
            rows,
            "loaded local JSON"
        );
        Ok(rows)
    }
}

enum Mapping {
    Auto,
    Paths(Vec<JsonPath>),
}

/// Files a source path stands for, sorted.
fn source_files(source: &Path) -> Result<Vec<PathBuf>, WarehouseError> {
    if source.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }
    if !source.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/**/*.json",
        glob::Pattern::escape(&source.to_string_lossy())
    );
    let mut files = glob::glob(&pattern)?.collect::<Result<Vec<_>, _>>()?;
    files.retain(|p| p.is_file());
    files.sort();
    Ok(files)
}

/// All top-level JSON objects in a file.
fn read_records(path: &Path) -> Result<Vec<Value>, WarehouseError> {
    let text = std::fs::read_to_string(path).map_err(|source| WarehouseError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for value in serde_json::Deserializer::from_str(&text).into_iter::<Value>() {
        let value = value.map_err(|source| WarehouseError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if !value.is_object() {
            return Err(WarehouseError::NotAnObject {
                path: path.to_path_buf(),
                found: json_type(&value),
            });
        }
        records.push(value);
    }
    Ok(records)
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn insert_values_sql(
    table: &TableDef,
    mapping: &Mapping,
    records: &[Value],
    file: &Path,
) -> Result<String, WarehouseError> {
    let columns: Vec<&Column> = table.load_columns().collect();
    let names = columns.iter().map(|c| c.name).collect::<Vec<_>>().join(", ");

    let mut tuples = Vec::with_capacity(records.len());
    for record in records {
        let mut values = Vec::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            let value = match mapping {
                Mapping::Auto => record.get(column.name.to_ascii_lowercase()),
                Mapping::Paths(paths) => paths[i].resolve(record),
            };
            let literal = sql_value(column, value).map_err(|e| match e {
                ValueError::Literal(e) => WarehouseError::Literal(e),
                ValueError::Type => WarehouseError::Coerce {
                    path: file.to_path_buf(),
                    table: table.name,
                    column: column.name,
                    value: value.map(Value::to_string).unwrap_or_default(),
                },
            })?;
            values.push(literal);
        }
        tuples.push(format!("({})", values.join(", ")));
    }

    Ok(format!(
        "INSERT INTO {} ({names}) VALUES\n{}",
        table.name,
        tuples.join(",\n")
    ))
}

enum ValueError {
    Literal(crate::sql::LiteralError),
    Type,
}

/// Render one JSON value as a SQLite literal for `column`.
fn sql_value(column: &Column, value: Option<&Value>) -> Result<String, ValueError> {
    let quote = |s: &str| Dialect::Sqlite.quote_literal(s).map_err(ValueError::Literal);

    let Some(value) = value else {
        return Ok("NULL".into());
    };
    if value.is_null() {
        return Ok("NULL".into());
    }

    if column.ty.is_numeric() {
        return match value {
            Value::Number(n) => numeric_value(column.ty, n).ok_or(ValueError::Type),
            Value::String(s) => numeric_text(column.ty, s.trim()).ok_or(ValueError::Type),
            _ => Err(ValueError::Type),
        };
    }

    match value {
        Value::String(s) => quote(s),
        other => quote(&other.to_string()),
    }
}

/// Integer columns take only integral JSON numbers.
fn numeric_value(ty: ColumnType, n: &serde_json::Number) -> Option<String> {
    if ty.is_integer() && !(n.is_i64() || n.is_u64()) {
        return None;
    }
    Some(n.to_string())
}

/// Numeric columns accept numeric strings; an empty string loads NULL.
///
/// Decimal text is checked but passed through as written, so no digits are lost to
/// a float round trip.
fn numeric_text(ty: ColumnType, s: &str) -> Option<String> {
    if s.is_empty() {
        return Some("NULL".into());
    }
    if ty.is_integer() {
        return s.parse::<i64>().ok().map(|n| n.to_string());
    }
    s.parse::<f64>()
        .is_ok_and(f64::is_finite)
        .then(|| s.to_string())
}
