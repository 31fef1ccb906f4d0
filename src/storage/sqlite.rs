//! Embedded SQLite backend
//!
//! Stores everything in a single local file. The pool is capped at one
//! connection, so concurrent callers serialize on pool checkout; that keeps
//! SQLite's single-writer model invisible to callers. Instances are cheap to
//! create, which is what makes throwaway backup/migration targets practical.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::connection::{DbHandle, Dialect};
use super::database::Database;
use super::error::{StorageError, StorageResult};
use super::schema;
use super::tables::{
    ActionTable, CommandUsageTable, GeoTable, NicknameTable, ServerTable, SessionTable, TpsTable,
    UserInfoTable, UserTable, WebUserTable, WorldTable,
};

/// How long a caller waits for the single connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SqliteDb {
    handle: Arc<DbHandle>,
    file: PathBuf,
}

impl SqliteDb {
    /// Create an unopened backend for the given database file. The file is
    /// created on `open()` if missing.
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            handle: Arc::new(DbHandle::new(Dialect::Sqlite)),
            file: file.into(),
        }
    }

    fn url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.file.display())
    }
}

#[async_trait]
impl Database for SqliteDb {
    #[instrument(skip(self), fields(file = %self.file.display()))]
    async fn open(&self) -> StorageResult<bool> {
        if self.handle.is_open().await {
            debug!("backend already open");
            return Ok(false);
        }

        sqlx::any::install_default_drivers();

        info!("opening SQLite backend");
        let pool = AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(&self.url())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        schema::create_tables(&pool).await?;

        // Lost the race against a concurrent open; keep the winner's pool.
        if let Some(extra) = self.handle.set_open(pool).await {
            extra.close().await;
            return Ok(false);
        }

        Ok(true)
    }

    async fn close(&self) {
        if let Some(pool) = self.handle.set_closed().await {
            info!("closing SQLite backend");
            pool.close().await;
        }
    }

    async fn get_version(&self) -> StorageResult<String> {
        let pool = self.handle.pool().await?;
        let version = schema::schema_version(&pool).await?;
        Ok(version.to_string())
    }

    fn config_name(&self) -> &'static str {
        "sqlite"
    }

    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn instance_id(&self) -> Uuid {
        self.handle.instance_id()
    }

    fn servers(&self) -> ServerTable {
        ServerTable::new(self.handle.clone())
    }

    fn users(&self) -> UserTable {
        UserTable::new(self.handle.clone())
    }

    fn worlds(&self) -> WorldTable {
        WorldTable::new(self.handle.clone())
    }

    fn tps(&self) -> TpsTable {
        TpsTable::new(self.handle.clone())
    }

    fn web_users(&self) -> WebUserTable {
        WebUserTable::new(self.handle.clone())
    }

    fn commands(&self) -> CommandUsageTable {
        CommandUsageTable::new(self.handle.clone())
    }

    fn actions(&self) -> ActionTable {
        ActionTable::new(self.handle.clone())
    }

    fn geolocations(&self) -> GeoTable {
        GeoTable::new(self.handle.clone())
    }

    fn nicknames(&self) -> NicknameTable {
        NicknameTable::new(self.handle.clone())
    }

    fn sessions(&self) -> SessionTable {
        SessionTable::new(self.handle.clone())
    }

    fn user_info(&self) -> UserInfoTable {
        UserInfoTable::new(self.handle.clone())
    }
}
