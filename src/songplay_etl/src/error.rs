//! Error types.
//!
//! Nothing here retries or translates driver errors: a failing statement becomes
//! [`EtlError::Step`] carrying the driver's error as its source, and the run stops.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::pipeline::{PipelineError, StageName};
use crate::sql::LiteralError;

/// Failure of a single statement or local bulk load.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// The warehouse rejected the statement.
    #[error(transparent)]
    Query(#[from] diesel::result::Error),
    /// A value could not be embedded in the statement text.
    #[error(transparent)]
    Literal(#[from] LiteralError),
    /// A local source file could not be read.
    #[error("failed to read {path}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A local source file holds malformed JSON.
    #[error("malformed JSON in {path}")]
    Json {
        /// File being parsed.
        path: PathBuf,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },
    /// A local source file holds a top-level value that is not an object.
    #[error("expected a JSON object in {path}, found {found}")]
    NotAnObject {
        /// File being parsed.
        path: PathBuf,
        /// JSON type actually found.
        found: &'static str,
    },
    /// A jsonpaths expression is not in the supported subset.
    #[error("invalid JSONPath expression {0:?}")]
    JsonPath(String),
    /// The jsonpaths file does not have one expression per column.
    #[error("jsonpaths file {path} has {found} expressions but {table} has {expected} columns")]
    JsonPathArity {
        /// The jsonpaths file.
        path: PathBuf,
        /// Target table.
        table: &'static str,
        /// Column count.
        expected: usize,
        /// Expression count.
        found: usize,
    },
    /// A JSON value does not fit the column's type.
    #[error("cannot load {value} into {table}.{column} in {path}")]
    Coerce {
        /// File being loaded.
        path: PathBuf,
        /// Target table.
        table: &'static str,
        /// Target column.
        column: &'static str,
        /// Offending JSON value.
        value: String,
    },
    /// The local source pattern is not a valid glob.
    #[error("invalid source pattern")]
    Pattern(#[from] glob::PatternError),
    /// A matched source path could not be inspected.
    #[error("failed to list source files")]
    Glob(#[from] glob::GlobError),
}

/// Top-level error for a pipeline run.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The warehouse could not be reached or refused the login.
    #[error("failed to connect to warehouse")]
    Connection(#[from] diesel::ConnectionError),
    /// The stage list is inconsistent.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// A statement failed; earlier statements stay committed.
    #[error("stage {stage} failed at step {step}")]
    Step {
        /// Stage being run.
        stage: StageName,
        /// Step label within the stage.
        step: String,
        /// The statement's error.
        #[source]
        source: WarehouseError,
    },
}
