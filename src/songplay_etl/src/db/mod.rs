//! Database connection helpers.
//!
//! This module provides:
//! - [`connection::connect_sqlite`]: opens the local target with WAL and a 5000ms busy_timeout.
//! - [`connection::connect_redshift`]: opens a cluster connection over the Postgres protocol.
//!
//! Example:
//! ```no_run
//! use songplay_etl::db::connection::connect_sqlite;
//!
//! let path = std::env::temp_dir().join("songplay_etl_example.db");
//! let _conn = connect_sqlite(path.to_str().unwrap()).expect("open sqlite");
//! ```
//!
//! Note: Building with PostgreSQL support requires the system libpq (e.g., libpq-dev on
//! Debian/Ubuntu).

pub mod connection;
