//! Storage backends for player analytics
//!
//! This module provides a trait-based abstraction over the two SQL engines
//! the system can persist to, plus the batch-migration machinery that moves
//! all data from one to the other during a hotswap.
//!
//! ## Design
//!
//! - **Trait-based**: the [`Database`] contract decouples every caller from
//!   the concrete engine; the two drivers share no base state.
//! - **Async**: all operations are async for compatibility with tokio tasks.
//! - **One module per table**: each record kind has its own typed handle
//!   under [`tables`]; handles borrow the connection pool per call.
//!
//! ## Backends
//!
//! - **SQLite** ([`SqliteDb`]): embedded single-file engine, serialized
//!   access, cheap throwaway instances.
//! - **MySQL** ([`MySqlDb`]): pooled networked engine with a background
//!   reconnect probe.
//!
//! Both speak identical schema and query semantics; the handful of
//! statements whose syntax differs are selected by dialect inside the table
//! modules.

pub mod connection;
pub mod database;
pub mod error;
pub mod migration;
pub mod mysql;
pub mod schema;
pub mod sqlite;
pub mod tables;

pub use connection::Dialect;
pub use database::Database;
pub use error::{StorageError, StorageResult};
pub use migration::{BatchCopy, CopyStep};
pub use mysql::{MySqlDb, MySqlSettings};
pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteDb;
