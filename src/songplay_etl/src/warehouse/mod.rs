//! Warehouse targets.
//!
//! [`Warehouse`] is the seam between the pipeline and a concrete engine: run one committed
//! statement, or bulk-load JSON into a staging table. Two implementations:
//! - [`RedshiftWarehouse`]: a cluster over `PgConnection`; loads are `COPY` statements.
//! - [`local::LocalWarehouse`]: SQLite; loads read local JSON files in-process.

pub mod jsonpath;
pub mod local;

use diesel::query_dsl::methods::ExecuteDsl;
use diesel::query_builder::SqlQuery;
use diesel::{Connection, ConnectionResult, PgConnection, RunQueryDsl, sql_query};

use crate::config::{ClusterConfig, Config, Target};
use crate::db::connection::connect_redshift;
use crate::error::{EtlError, WarehouseError};
use crate::sql::{Dialect, copy::CopyJson};

pub use local::LocalWarehouse;

/// A connection the pipeline sends statements to, one at a time.
pub trait Warehouse {
    /// Dialect statements for this warehouse must be rendered in.
    fn dialect(&self) -> Dialect;

    /// Run one statement in its own transaction and commit it. Returns rows affected.
    fn execute(&mut self, sql: &str) -> Result<usize, WarehouseError>;

    /// Bulk-load JSON objects into a staging table and commit. Returns rows loaded.
    fn copy_json(&mut self, copy: &CopyJson) -> Result<usize, WarehouseError>;
}

/// Run `sql` inside a transaction that commits on success.
pub(crate) fn execute_committed<C>(conn: &mut C, sql: &str) -> Result<usize, WarehouseError>
where
    C: Connection,
    SqlQuery: ExecuteDsl<C>,
{
    conn.transaction::<_, WarehouseError, _>(|conn| Ok(sql_query(sql).execute(conn)?))
}

/// A Redshift cluster.
pub struct RedshiftWarehouse {
    conn: PgConnection,
}

impl RedshiftWarehouse {
    /// Wrap an established connection.
    pub fn new(conn: PgConnection) -> Self {
        Self { conn }
    }

    /// Connect using the cluster section of the config.
    pub fn connect(cfg: &ClusterConfig) -> ConnectionResult<Self> {
        connect_redshift(cfg).map(Self::new)
    }
}

impl Warehouse for RedshiftWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Redshift
    }

    fn execute(&mut self, sql: &str) -> Result<usize, WarehouseError> {
        execute_committed(&mut self.conn, sql)
    }

    fn copy_json(&mut self, copy: &CopyJson) -> Result<usize, WarehouseError> {
        let sql = copy.to_redshift_sql()?;
        self.execute(&sql)
    }
}

/// Open the warehouse named by the config's target.
pub fn open_warehouse(config: &Config) -> Result<Box<dyn Warehouse>, EtlError> {
    Ok(match &config.target {
        Target::Cluster(cluster) => Box::new(RedshiftWarehouse::connect(cluster)?),
        Target::Local(local) => Box::new(LocalWarehouse::open(&local.database)?),
    })
}
