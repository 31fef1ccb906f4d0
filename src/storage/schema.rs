//! Table structure shared by both backend drivers
//!
//! The DDL is written in the dialect intersection: `VARCHAR`/`BIGINT`/
//! `INTEGER`/`DOUBLE` columns, composite natural keys, no auto-increment
//! columns. `CREATE TABLE IF NOT EXISTS` keeps schema creation idempotent so
//! `open()` can run it unconditionally. Booleans are stored as `INTEGER`
//! 0/1, timestamps as epoch-millisecond `BIGINT`.

use sqlx::AnyPool;
use tracing::debug;

use super::error::{StorageError, StorageResult};

/// Version written into `schema_version` when the tables are first created.
pub const SCHEMA_VERSION: i32 = 10;

/// Creation order satisfies every foreign key: principals (servers, users,
/// worlds) come before the tables that reference them.
const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS servers (
        id VARCHAR(36) PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        web_address VARCHAR(100) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS users (
        uuid VARCHAR(36) PRIMARY KEY,
        name VARCHAR(16) NOT NULL,
        registered BIGINT NOT NULL,
        times_kicked INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS worlds (
        name VARCHAR(100) PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS tps (
        server_id VARCHAR(36) NOT NULL,
        date BIGINT NOT NULL,
        tps DOUBLE NOT NULL,
        players INTEGER NOT NULL,
        cpu_usage DOUBLE NOT NULL,
        ram_usage BIGINT NOT NULL,
        entities INTEGER NOT NULL,
        chunks INTEGER NOT NULL,
        PRIMARY KEY (server_id, date),
        FOREIGN KEY (server_id) REFERENCES servers(id)
    )",
    "CREATE TABLE IF NOT EXISTS web_users (
        username VARCHAR(100) PRIMARY KEY,
        password_hash VARCHAR(300) NOT NULL,
        permission_level INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS commands (
        command VARCHAR(190) PRIMARY KEY,
        times_used INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS actions (
        user_id VARCHAR(36) NOT NULL,
        server_id VARCHAR(36) NOT NULL,
        action_id INTEGER NOT NULL,
        date BIGINT NOT NULL,
        additional_info VARCHAR(300) NOT NULL,
        FOREIGN KEY (user_id) REFERENCES users(uuid),
        FOREIGN KEY (server_id) REFERENCES servers(id)
    )",
    "CREATE TABLE IF NOT EXISTS geolocations (
        user_id VARCHAR(36) NOT NULL,
        ip_hash VARCHAR(200) NOT NULL,
        geolocation VARCHAR(50) NOT NULL,
        last_used BIGINT NOT NULL,
        PRIMARY KEY (user_id, ip_hash),
        FOREIGN KEY (user_id) REFERENCES users(uuid)
    )",
    "CREATE TABLE IF NOT EXISTS nicknames (
        user_id VARCHAR(36) NOT NULL,
        nickname VARCHAR(75) NOT NULL,
        first_seen BIGINT NOT NULL,
        PRIMARY KEY (user_id, nickname),
        FOREIGN KEY (user_id) REFERENCES users(uuid)
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        user_id VARCHAR(36) NOT NULL,
        session_start BIGINT NOT NULL,
        session_end BIGINT NOT NULL,
        PRIMARY KEY (user_id, session_start),
        FOREIGN KEY (user_id) REFERENCES users(uuid)
    )",
    "CREATE TABLE IF NOT EXISTS session_world_times (
        user_id VARCHAR(36) NOT NULL,
        session_start BIGINT NOT NULL,
        world VARCHAR(100) NOT NULL,
        survival BIGINT NOT NULL,
        creative BIGINT NOT NULL,
        adventure BIGINT NOT NULL,
        spectator BIGINT NOT NULL,
        last_state_change BIGINT NOT NULL,
        PRIMARY KEY (user_id, session_start, world),
        FOREIGN KEY (user_id) REFERENCES users(uuid),
        FOREIGN KEY (world) REFERENCES worlds(name)
    )",
    "CREATE TABLE IF NOT EXISTS kills (
        killer_id VARCHAR(36) NOT NULL,
        victim_id VARCHAR(36) NOT NULL,
        session_start BIGINT NOT NULL,
        weapon VARCHAR(30) NOT NULL,
        kill_count INTEGER NOT NULL,
        date BIGINT NOT NULL,
        PRIMARY KEY (killer_id, victim_id, date),
        FOREIGN KEY (killer_id) REFERENCES users(uuid)
    )",
    "CREATE TABLE IF NOT EXISTS user_info (
        user_id VARCHAR(36) NOT NULL,
        server_id VARCHAR(36) NOT NULL,
        registered BIGINT NOT NULL,
        opped INTEGER NOT NULL DEFAULT 0,
        banned INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (user_id, server_id),
        FOREIGN KEY (user_id) REFERENCES users(uuid),
        FOREIGN KEY (server_id) REFERENCES servers(id)
    )",
    "CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    )",
];

/// Create any missing tables and seed the schema version. Idempotent.
pub(crate) async fn create_tables(pool: &AnyPool) -> StorageResult<()> {
    for ddl in CREATE_TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| StorageError::Schema(e.to_string()))?;
    }

    let seeded: Option<(i32,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .map_err(|e| StorageError::Schema(e.to_string()))?;

    if seeded.is_none() {
        debug!("seeding schema version {}", SCHEMA_VERSION);
        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(SCHEMA_VERSION)
            .execute(pool)
            .await
            .map_err(|e| StorageError::Schema(e.to_string()))?;
    }

    Ok(())
}

/// Read the stored schema version; the canonical connection-viability probe.
pub(crate) async fn schema_version(pool: &AnyPool) -> StorageResult<i32> {
    let row: (i32,) = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_one(pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
    Ok(row.0)
}
