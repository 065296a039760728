//! Load song-play event logs and the song catalog into a star schema.
//!
//! The crate is a sequencer: it renders SQL for a target [`sql::Dialect`] and runs it,
//! one committed statement at a time, against a [`warehouse::Warehouse`]. Joins,
//! deduplication and calendar extraction all happen inside the warehouse engine.
//!
//! Components:
//! - [`schema_manager::SchemaManager`]: drop and create the seven tables.
//! - [`stage_loader::StageLoader`]: bulk-load raw JSON into the staging tables.
//! - [`transform::TransformEngine`]: populate the fact and dimension tables.
//! - [`pipeline::Pipeline`]: the ordered stage list tying the three together.

#![deny(missing_docs)]

pub mod config;
pub mod db;
pub mod error;
pub mod pipeline;
pub mod schema_manager;
pub mod sql;
pub mod stage_loader;
pub mod transform;
pub mod warehouse;

pub use error::{EtlError, WarehouseError};
