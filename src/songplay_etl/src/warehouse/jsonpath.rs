//! The JSONPath subset accepted by Redshift jsonpaths files.
//!
//! An expression is `$` followed by any number of segments:
//! - `.name` or `['name']` / `["name"]` selects an object member
//! - `[n]` selects an array element
//!
//! Expressions that do not resolve yield `None`, which loads as NULL.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::error::WarehouseError;
use crate::sql::tables::TableDef;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Object member.
    Key(String),
    /// Array element.
    Index(usize),
}

/// A parsed JSONPath expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Segments after the root.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Follow the path from `root`.
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments.iter().try_fold(root, |v, seg| match seg {
            Segment::Key(k) => v.get(k.as_str()),
            Segment::Index(i) => v.get(*i),
        })
    }
}

impl FromStr for JsonPath {
    type Err = WarehouseError;

    fn from_str(expr: &str) -> Result<Self, Self::Err> {
        let bad = || WarehouseError::JsonPath(expr.to_string());
        let mut chars = expr.trim().chars().peekable();
        if chars.next() != Some('$') {
            return Err(bad());
        }

        let mut segments = Vec::new();
        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    let mut name = String::new();
                    while let Some(&n) = chars.peek() {
                        if n == '.' || n == '[' {
                            break;
                        }
                        name.push(n);
                        chars.next();
                    }
                    if name.is_empty() {
                        return Err(bad());
                    }
                    segments.push(Segment::Key(name));
                }
                '[' => match chars.next() {
                    Some(q @ ('\'' | '"')) => {
                        let mut name = String::new();
                        loop {
                            match chars.next() {
                                Some(n) if n == q => break,
                                Some(n) => name.push(n),
                                None => return Err(bad()),
                            }
                        }
                        if chars.next() != Some(']') {
                            return Err(bad());
                        }
                        segments.push(Segment::Key(name));
                    }
                    Some(d) if d.is_ascii_digit() => {
                        let mut digits = String::from(d);
                        loop {
                            match chars.next() {
                                Some(']') => break,
                                Some(n) if n.is_ascii_digit() => digits.push(n),
                                _ => return Err(bad()),
                            }
                        }
                        segments.push(Segment::Index(digits.parse().map_err(|_| bad())?));
                    }
                    _ => return Err(bad()),
                },
                _ => return Err(bad()),
            }
        }
        Ok(JsonPath { segments })
    }
}

#[derive(Deserialize)]
struct JsonPathsFile {
    jsonpaths: Vec<String>,
}

/// Read a jsonpaths file and check it has one expression per loadable column of `table`.
pub fn load_jsonpaths(path: &Path, table: &TableDef) -> Result<Vec<JsonPath>, WarehouseError> {
    let text = std::fs::read_to_string(path).map_err(|source| WarehouseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: JsonPathsFile =
        serde_json::from_str(&text).map_err(|source| WarehouseError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let expected = table.load_columns().count();
    if file.jsonpaths.len() != expected {
        return Err(WarehouseError::JsonPathArity {
            path: path.to_path_buf(),
            table: table.name,
            expected,
            found: file.jsonpaths.len(),
        });
    }
    file.jsonpaths.iter().map(|e| e.parse()).collect()
}
