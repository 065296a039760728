//! Redshift `COPY ... JSON` bulk-load statements.

use std::fmt::Write as _;

use super::{Dialect, LiteralError, tables::TableDef};

/// How JSON fields are mapped onto the target table's columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
    /// `JSON 'auto'`: top-level keys matched against column names.
    Auto,
    /// `JSON '<uri>'`: a jsonpaths file mapping expressions positionally onto columns.
    JsonPaths(String),
}

/// One bulk load of JSON objects into a staging table.
#[derive(Debug, Clone)]
pub struct CopyJson {
    /// Target table.
    pub table: &'static TableDef,
    /// Storage prefix, manifest or (local target) filesystem path.
    pub source: String,
    /// Field-to-column mapping.
    pub format: JsonFormat,
    /// IAM role ARN used as load credentials. The local target ignores it.
    pub iam_role: Option<String>,
    /// Region of the source bucket.
    pub region: String,
}

impl CopyJson {
    /// Render the Redshift statement. Every interpolated value is quoted with
    /// [`Dialect::quote_literal`], which rejects values that cannot be quoted safely.
    pub fn to_redshift_sql(&self) -> Result<String, LiteralError> {
        let q = |v: &str| Dialect::Redshift.quote_literal(v);

        let mut sql = format!("COPY {} FROM {}", self.table.name, q(&self.source)?);
        match &self.format {
            JsonFormat::Auto => sql.push_str("\nJSON 'auto'"),
            JsonFormat::JsonPaths(uri) => {
                let _ = write!(sql, "\nJSON {}", q(uri)?);
            }
        }
        if let Some(arn) = &self.iam_role {
            let _ = write!(sql, "\nCREDENTIALS {}", q(&format!("aws_iam_role={arn}"))?);
        }
        let _ = write!(sql, "\nREGION {}", q(&self.region)?);
        Ok(sql)
    }

    /// Human-readable description of the load, used in logs and plans.
    pub fn describe(&self) -> String {
        match &self.format {
            JsonFormat::Auto => format!("{} <- {} (json auto)", self.table.name, self.source),
            JsonFormat::JsonPaths(p) => {
                format!("{} <- {} (jsonpaths {p})", self.table.name, self.source)
            }
        }
    }
}
