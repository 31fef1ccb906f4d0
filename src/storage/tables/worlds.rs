//! World name registry

use std::sync::Arc;

use sqlx::Row;
use tracing::instrument;

use crate::storage::connection::{DbHandle, Dialect};
use crate::storage::error::StorageResult;

pub struct WorldTable {
    db: Arc<DbHandle>,
}

impl WorldTable {
    pub(crate) fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    /// Register world names, skipping ones already present.
    #[instrument(skip_all, fields(count = worlds.len()))]
    pub async fn save_all(&self, worlds: &[String]) -> StorageResult<()> {
        if worlds.is_empty() {
            return Ok(());
        }

        let sql = match self.db.dialect() {
            Dialect::Sqlite => "INSERT OR IGNORE INTO worlds (name) VALUES (?)",
            Dialect::MySql => "INSERT IGNORE INTO worlds (name) VALUES (?)",
        };

        let pool = self.db.pool().await?;
        let mut tx = pool.begin().await?;
        for world in worlds {
            sqlx::query(sql).bind(world).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn all(&self) -> StorageResult<Vec<String>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query("SELECT name FROM worlds ORDER BY name")
            .fetch_all(&pool)
            .await?;

        rows.into_iter()
            .map(|row| Ok(row.try_get("name")?))
            .collect()
    }

    pub async fn remove_all(&self) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM worlds").execute(&pool).await?;
        Ok(())
    }
}
