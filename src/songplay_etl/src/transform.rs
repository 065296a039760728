//! Star-schema population from the staging tables.

use crate::error::EtlError;
use crate::pipeline::{Stage, StageName, StageReport, Step, ensure_dialect};
use crate::sql::{Dialect, insert::insert_statements};
use crate::warehouse::Warehouse;

/// Runs the five INSERT...SELECT statements: fact first, then users, songs, artists,
/// and time. The order is fixed; none of the statements reads another's output.
#[derive(Debug, Clone, Copy)]
pub struct TransformEngine {
    dialect: Dialect,
}

impl TransformEngine {
    /// Statements will be rendered for `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// The `insert-tables` stage.
    pub fn stage(&self) -> Stage {
        Stage {
            name: StageName::InsertTables,
            depends_on: vec![StageName::LoadStaging],
            steps: insert_statements(self.dialect)
                .into_iter()
                .map(|(label, sql)| Step::Sql {
                    label: label.to_string(),
                    sql,
                })
                .collect(),
        }
    }

    /// Run all five inserts against `warehouse`.
    pub fn transform_and_insert<W: Warehouse + ?Sized>(
        &self,
        warehouse: &mut W,
    ) -> Result<StageReport, EtlError> {
        ensure_dialect(self.dialect, warehouse)?;
        self.stage().run(warehouse)
    }
}
