//! Destructive schema reset.
//!
//! `drop_all` is idempotent. `create_all` uses plain `CREATE TABLE`, so running it twice
//! without a drop in between fails with the warehouse's "already exists" error instead of
//! silently keeping stale tables.

use crate::error::EtlError;
use crate::pipeline::{Stage, StageName, StageReport, Step, ensure_dialect};
use crate::sql::{Dialect, tables::ALL_TABLES};
use crate::warehouse::Warehouse;

/// Drops and creates the staging and star-schema tables.
#[derive(Debug, Clone, Copy)]
pub struct SchemaManager {
    dialect: Dialect,
}

impl SchemaManager {
    /// DDL will be rendered for `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// `DROP TABLE IF EXISTS` for every table. No table references another, so the order
    /// carries no meaning.
    pub fn drop_stage(&self) -> Stage {
        Stage {
            name: StageName::DropTables,
            depends_on: Vec::new(),
            steps: ALL_TABLES
                .iter()
                .map(|t| Step::Sql {
                    label: t.name.to_string(),
                    sql: t.drop_sql(),
                })
                .collect(),
        }
    }

    /// `CREATE TABLE` for every table.
    pub fn create_stage(&self) -> Stage {
        Stage {
            name: StageName::CreateTables,
            depends_on: vec![StageName::DropTables],
            steps: ALL_TABLES
                .iter()
                .map(|t| Step::Sql {
                    label: t.name.to_string(),
                    sql: t.create_sql(self.dialect),
                })
                .collect(),
        }
    }

    /// Drop all tables.
    pub fn drop_all<W: Warehouse + ?Sized>(
        &self,
        warehouse: &mut W,
    ) -> Result<StageReport, EtlError> {
        ensure_dialect(self.dialect, warehouse)?;
        self.drop_stage().run(warehouse)
    }

    /// Create all tables. Fails if any already exists.
    pub fn create_all<W: Warehouse + ?Sized>(
        &self,
        warehouse: &mut W,
    ) -> Result<StageReport, EtlError> {
        ensure_dialect(self.dialect, warehouse)?;
        self.create_stage().run(warehouse)
    }
}
