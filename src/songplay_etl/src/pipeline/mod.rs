//! Ordered stage list.
//!
//! ## Shape
//! A [`Pipeline`] is a list of [`Stage`]s. Each stage has a [`StageName`], the stages it
//! depends on, and an ordered batch of [`Step`]s (a SQL statement or a JSON bulk load).
//!
//! ## Validation
//! [`Pipeline::new`] rejects duplicate stage names and any stage that depends on a stage
//! scheduled after it. A dependency on a stage that is not in the pipeline at all is taken
//! as satisfied by an earlier run: the default run loads and transforms without
//! recreating tables.
//!
//! ## Execution
//! Steps run one at a time, each committed before the next starts. The first failure
//! stops the run and is returned as [`EtlError::Step`]; nothing already committed is
//! rolled back.

mod plan;

use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, info_span};

use crate::error::{EtlError, WarehouseError};
use crate::sql::{Dialect, LiteralError, copy::CopyJson};
use crate::warehouse::Warehouse;

/// Name of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum StageName {
    /// Drop all seven tables if present.
    DropTables,
    /// Create all seven tables.
    CreateTables,
    /// Bulk-load the staging tables.
    LoadStaging,
    /// Build the fact and dimension tables from staging.
    InsertTables,
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StageName::DropTables => "drop-tables",
            StageName::CreateTables => "create-tables",
            StageName::LoadStaging => "load-staging",
            StageName::InsertTables => "insert-tables",
        })
    }
}

/// Inconsistent stage list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// The same stage was scheduled twice.
    #[error("stage {0} is scheduled more than once")]
    Duplicate(StageName),
    /// A stage depends on one scheduled after it.
    #[error("stage {stage} depends on {dependency}, which is scheduled after it")]
    OutOfOrder {
        /// The dependent stage.
        stage: StageName,
        /// Its dependency.
        dependency: StageName,
    },
    /// A resume point names a stage the pipeline does not contain.
    #[error("stage {0} is not part of this pipeline")]
    UnknownStage(StageName),
    /// Statements were rendered for a different engine than the one connected.
    #[error("statements were rendered for {expected} but the warehouse speaks {found}")]
    DialectMismatch {
        /// Dialect the statements were rendered in.
        expected: Dialect,
        /// Dialect of the connected warehouse.
        found: Dialect,
    },
}

/// Fail unless `warehouse` speaks `expected`.
pub fn ensure_dialect<W: Warehouse + ?Sized>(
    expected: Dialect,
    warehouse: &W,
) -> Result<(), PipelineError> {
    let found = warehouse.dialect();
    if found != expected {
        return Err(PipelineError::DialectMismatch { expected, found });
    }
    Ok(())
}

/// One unit of work, committed on its own.
#[derive(Debug, Clone)]
pub enum Step {
    /// A SQL statement.
    Sql {
        /// Short name for logs and errors, usually the affected table.
        label: String,
        /// Statement text.
        sql: String,
    },
    /// A JSON bulk load into a staging table.
    CopyJson(CopyJson),
}

impl Step {
    /// Short name for logs and errors.
    pub fn label(&self) -> &str {
        match self {
            Step::Sql { label, .. } => label,
            Step::CopyJson(copy) => copy.table.name,
        }
    }

    /// Text of the step as it would be sent to a warehouse speaking `dialect`.
    pub fn render(&self, dialect: Dialect) -> Result<String, LiteralError> {
        match (self, dialect) {
            (Step::Sql { sql, .. }, _) => Ok(sql.clone()),
            (Step::CopyJson(copy), Dialect::Redshift) => copy.to_redshift_sql(),
            (Step::CopyJson(copy), Dialect::Sqlite) => {
                Ok(format!("-- local JSON load: {}", copy.describe()))
            }
        }
    }

    fn run<W: Warehouse + ?Sized>(&self, warehouse: &mut W) -> Result<usize, WarehouseError> {
        match self {
            Step::Sql { sql, .. } => {
                debug!(sql = %sql, "executing");
                warehouse.execute(sql)
            }
            Step::CopyJson(copy) => {
                debug!(copy = %copy.describe(), "bulk loading");
                warehouse.copy_json(copy)
            }
        }
    }
}

/// Outcome of one committed step.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Step label.
    pub label: String,
    /// Rows affected as reported by the warehouse.
    pub rows: usize,
    /// Wall time including the commit.
    pub elapsed: Duration,
}

/// Outcome of one stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    /// Stage that ran.
    pub stage: StageName,
    /// Per-step outcomes in run order.
    pub steps: Vec<StepReport>,
}

impl StageReport {
    /// Rows reported by the step labelled `label`, if it ran.
    pub fn rows(&self, label: &str) -> Option<usize> {
        self.steps.iter().find(|s| s.label == label).map(|s| s.rows)
    }
}

/// A named batch of steps with declared dependencies.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Stage name.
    pub name: StageName,
    /// Stages whose effects this one reads.
    pub depends_on: Vec<StageName>,
    /// Steps in run order.
    pub steps: Vec<Step>,
}

impl Stage {
    /// Run every step in order, committing each.
    pub fn run<W: Warehouse + ?Sized>(&self, warehouse: &mut W) -> Result<StageReport, EtlError> {
        let _span = info_span!("stage", name = %self.name).entered();
        info!(steps = self.steps.len(), "stage started");

        let mut steps = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let started = Instant::now();
            let rows = step.run(warehouse).map_err(|source| EtlError::Step {
                stage: self.name,
                step: step.label().to_string(),
                source,
            })?;
            let elapsed = started.elapsed();
            info!(
                step = step.label(),
                rows,
                elapsed_ms = elapsed.as_millis() as u64,
                "step committed"
            );
            steps.push(StepReport {
                label: step.label().to_string(),
                rows,
                elapsed,
            });
        }
        Ok(StageReport {
            stage: self.name,
            steps,
        })
    }
}

/// A validated, ordered list of stages rendered for one dialect.
#[derive(Debug, Clone)]
pub struct Pipeline {
    dialect: Dialect,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Validate and build a pipeline.
    pub fn new(dialect: Dialect, stages: Vec<Stage>) -> Result<Self, PipelineError> {
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].iter().any(|s| s.name == stage.name) {
                return Err(PipelineError::Duplicate(stage.name));
            }
            for dep in &stage.depends_on {
                if stages[i + 1..].iter().any(|s| s.name == *dep) || *dep == stage.name {
                    return Err(PipelineError::OutOfOrder {
                        stage: stage.name,
                        dependency: *dep,
                    });
                }
            }
        }
        Ok(Self { dialect, stages })
    }

    /// Dialect the steps were rendered in.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Stages in run order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Drop every stage before `name`, resuming the run there.
    pub fn starting_at(mut self, name: StageName) -> Result<Self, PipelineError> {
        let pos = self
            .stages
            .iter()
            .position(|s| s.name == name)
            .ok_or(PipelineError::UnknownStage(name))?;
        self.stages.drain(..pos);
        Ok(self)
    }

    /// Every step rendered as text, labelled `stage/step`.
    pub fn render(&self) -> Result<Vec<(String, String)>, LiteralError> {
        let mut out = Vec::new();
        for stage in &self.stages {
            for step in &stage.steps {
                out.push((
                    format!("{}/{}", stage.name, step.label()),
                    step.render(self.dialect)?,
                ));
            }
        }
        Ok(out)
    }

    /// Run all stages in order against `warehouse`.
    pub fn run<W: Warehouse + ?Sized>(
        &self,
        warehouse: &mut W,
    ) -> Result<Vec<StageReport>, EtlError> {
        ensure_dialect(self.dialect, warehouse)?;
        let started = Instant::now();
        let mut reports = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            reports.push(stage.run(warehouse)?);
        }
        info!(
            stages = reports.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline finished"
        );
        Ok(reports)
    }
}
