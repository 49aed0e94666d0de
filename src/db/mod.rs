//! SQLite-backed entity store.
//!
//! This module provides:
//! - Database initialization and migrations
//! - The `Repository` load-by-key / upsert-by-key layer for pools

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{ProcessedEvent, Repository};
