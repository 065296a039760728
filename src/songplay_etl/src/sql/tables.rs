//! Staging and star-schema table definitions.
//!
//! Tables are typed column lists; DDL is rendered from them per [`Dialect`]. The local
//! bulk-load emulation reads the same descriptors to map JSON values onto columns.
//!
//! Key handling differs by engine:
//! - Redshift declares `PRIMARY KEY` on dimension keys. The constraint is informational
//!   (never enforced) but implies NOT NULL.
//! - SQLite renders those keys as `NOT NULL` only, so duplicate keys behave the way they
//!   do on the cluster instead of failing the insert.

use super::Dialect;
use ColumnType::*;

/// Column storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// `VARCHAR(n)`.
    Varchar(u16),
    /// `SMALLINT`.
    SmallInt,
    /// `INTEGER`.
    Integer,
    /// `BIGINT`.
    BigInt,
    /// `DECIMAL(precision, scale)`.
    Decimal(u8, u8),
    /// `DOUBLE PRECISION`.
    DoublePrecision,
    /// `TIMESTAMP`.
    Timestamp,
}

impl ColumnType {
    fn sql(self) -> String {
        match self {
            ColumnType::Varchar(n) => format!("VARCHAR({n})"),
            ColumnType::SmallInt => "SMALLINT".into(),
            ColumnType::Integer => "INTEGER".into(),
            ColumnType::BigInt => "BIGINT".into(),
            ColumnType::Decimal(p, s) => format!("DECIMAL({p}, {s})"),
            ColumnType::DoublePrecision => "DOUBLE PRECISION".into(),
            ColumnType::Timestamp => "TIMESTAMP".into(),
        }
    }

    /// True for the integer family.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ColumnType::SmallInt | ColumnType::Integer | ColumnType::BigInt
        )
    }

    /// True for every numeric type, integer or not.
    pub fn is_numeric(self) -> bool {
        self.is_integer() || matches!(self, ColumnType::Decimal(..) | ColumnType::DoublePrecision)
    }
}

/// Column-level constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// No constraint.
    Nullable,
    /// `NOT NULL`.
    NotNull,
    /// Dimension key; see the module docs for per-dialect rendering.
    PrimaryKey,
    /// Warehouse-generated surrogate key, never supplied by inserts or loads.
    Identity,
}

/// One column of a table.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Column name as written in DDL; both engines fold unquoted names to lowercase.
    pub name: &'static str,
    /// Storage type.
    pub ty: ColumnType,
    /// Constraint.
    pub constraint: Constraint,
}

impl Column {
    fn render(&self, dialect: Dialect) -> String {
        let ty = self.ty.sql();
        let tail = match (self.constraint, dialect) {
            (Constraint::Nullable, _) => String::new(),
            (Constraint::NotNull, _) => " NOT NULL".into(),
            (Constraint::PrimaryKey, Dialect::Redshift) => " PRIMARY KEY".into(),
            (Constraint::PrimaryKey, Dialect::Sqlite) => " NOT NULL".into(),
            (Constraint::Identity, Dialect::Redshift) => " IDENTITY(0,1)".into(),
            (Constraint::Identity, Dialect::Sqlite) => {
                return format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", self.name);
            }
        };
        format!("{} {ty}{tail}", self.name)
    }
}

/// A table: name plus ordered columns.
#[derive(Debug)]
pub struct TableDef {
    /// Table name.
    pub name: &'static str,
    /// Columns in DDL order.
    pub columns: &'static [Column],
}

impl TableDef {
    /// `DROP TABLE IF EXISTS`; identical in both dialects.
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }

    /// Plain `CREATE TABLE`. Fails if the table already exists.
    pub fn create_sql(&self, dialect: Dialect) -> String {
        let cols = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.render(dialect)))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("CREATE TABLE {} (\n{cols}\n)", self.name)
    }

    /// Columns a bulk load writes to, in order. Identity columns are skipped.
    pub fn load_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| c.constraint != Constraint::Identity)
    }
}

const fn col(name: &'static str, ty: ColumnType) -> Column {
    Column {
        name,
        ty,
        constraint: Constraint::Nullable,
    }
}

const fn not_null(name: &'static str, ty: ColumnType) -> Column {
    Column {
        name,
        ty,
        constraint: Constraint::NotNull,
    }
}

const fn key(name: &'static str, ty: ColumnType) -> Column {
    Column {
        name,
        ty,
        constraint: Constraint::PrimaryKey,
    }
}

/// Raw activity-log records, one per JSON event.
pub const STAGING_EVENTS: TableDef = TableDef {
    name: "staging_events",
    columns: &[
        col("artist", Varchar(255)),
        col("auth", Varchar(40)),
        col("firstName", Varchar(255)),
        col("gender", Varchar(1)),
        col("itemInSession", SmallInt),
        col("lastName", Varchar(255)),
        col("length", Decimal(10, 5)),
        col("level", Varchar(40)),
        col("location", Varchar(255)),
        col("method", Varchar(20)),
        col("page", Varchar(40)),
        col("registration", Varchar(40)),
        col("sessionId", Integer),
        col("song", Varchar(255)),
        col("status", SmallInt),
        col("ts", BigInt),
        col("user_agent", Varchar(255)),
        col("userId", Integer),
    ],
};

/// Raw song-catalog records.
pub const STAGING_SONGS: TableDef = TableDef {
    name: "staging_songs",
    columns: &[
        col("artist_id", Varchar(100)),
        col("artist_latitude", Decimal(9, 6)),
        col("artist_longitude", Decimal(9, 6)),
        col("artist_location", Varchar(255)),
        col("artist_name", Varchar(255)),
        col("duration", DoublePrecision),
        col("num_songs", SmallInt),
        col("song_id", Varchar(255)),
        col("title", Varchar(255)),
        col("year", SmallInt),
    ],
};

/// Fact table: one row per matched `NextSong` event.
pub const FACT_SONGPLAY: TableDef = TableDef {
    name: "factsongplay",
    columns: &[
        Column {
            name: "songplay_id",
            ty: Integer,
            constraint: Constraint::Identity,
        },
        not_null("start_time", Timestamp),
        not_null("user_id", Varchar(100)),
        col("level", Varchar(10)),
        not_null("song_id", Varchar(100)),
        not_null("artist_id", Varchar(100)),
        not_null("session_id", Varchar(100)),
        col("location", Varchar(200)),
        col("user_agent", Varchar(200)),
    ],
};

/// Distinct users.
pub const DIM_USER: TableDef = TableDef {
    name: "dimuser",
    columns: &[
        key("user_id", Varchar(100)),
        col("first_name", Varchar(100)),
        col("last_name", Varchar(100)),
        col("gender", Varchar(1)),
        col("level", Varchar(10)),
    ],
};

/// Distinct songs.
pub const DIM_SONG: TableDef = TableDef {
    name: "dimsong",
    columns: &[
        key("song_id", Varchar(100)),
        col("title", Varchar(255)),
        not_null("artist_id", Varchar(100)),
        col("year", SmallInt),
        col("duration", SmallInt),
    ],
};

/// Distinct artists.
pub const DIM_ARTIST: TableDef = TableDef {
    name: "dimartist",
    columns: &[
        key("artist_id", Varchar(100)),
        col("name", Varchar(100)),
        col("location", Varchar(200)),
        col("latitude", Decimal(9, 6)),
        col("longitude", Decimal(9, 6)),
    ],
};

/// Distinct play timestamps exploded into calendar parts.
pub const DIM_TIME: TableDef = TableDef {
    name: "dimtime",
    columns: &[
        key("start_time", Timestamp),
        col("hour", SmallInt),
        col("day", SmallInt),
        col("week", SmallInt),
        col("month", SmallInt),
        col("year", SmallInt),
        col("weekday", SmallInt),
    ],
};

/// Every table, staging first, in creation order.
pub const ALL_TABLES: [&TableDef; 7] = [
    &STAGING_EVENTS,
    &STAGING_SONGS,
    &FACT_SONGPLAY,
    &DIM_USER,
    &DIM_SONG,
    &DIM_ARTIST,
    &DIM_TIME,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redshift_fact_ddl() {
        insta::assert_snapshot!(FACT_SONGPLAY.create_sql(Dialect::Redshift), @r"
        CREATE TABLE factsongplay (
            songplay_id INTEGER IDENTITY(0,1),
            start_time TIMESTAMP NOT NULL,
            user_id VARCHAR(100) NOT NULL,
            level VARCHAR(10),
            song_id VARCHAR(100) NOT NULL,
            artist_id VARCHAR(100) NOT NULL,
            session_id VARCHAR(100) NOT NULL,
            location VARCHAR(200),
            user_agent VARCHAR(200)
        )
        ");
    }

    #[test]
    fn sqlite_keys_are_not_unique() {
        let ddl = DIM_USER.create_sql(Dialect::Sqlite);
        assert!(ddl.contains("user_id VARCHAR(100) NOT NULL,"));
        assert!(!ddl.contains("PRIMARY KEY"));

        let ddl = FACT_SONGPLAY.create_sql(Dialect::Sqlite);
        assert!(ddl.contains("songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,"));
    }

    #[test]
    fn redshift_keys_are_declared() {
        let ddl = DIM_TIME.create_sql(Dialect::Redshift);
        assert!(ddl.contains("start_time TIMESTAMP PRIMARY KEY,"));
        let ddl = STAGING_SONGS.create_sql(Dialect::Redshift);
        assert!(ddl.contains("artist_latitude DECIMAL(9, 6),"));
    }

    #[test]
    fn load_columns_skip_identity() {
        assert_eq!(STAGING_EVENTS.load_columns().count(), 18);
        assert_eq!(FACT_SONGPLAY.load_columns().count(), 8);
        assert!(FACT_SONGPLAY.load_columns().all(|c| c.name != "songplay_id"));
    }

    #[test]
    fn table_names_are_unique() {
        let mut names: Vec<_> = ALL_TABLES.iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ALL_TABLES.len());
    }
}
