//! Game-server registry table

use std::sync::Arc;

use sqlx::Row;
use tracing::{debug, instrument};

use super::parse_uuid;
use crate::data::ServerRecord;
use crate::storage::connection::{DbHandle, Dialect};
use crate::storage::error::StorageResult;

pub struct ServerTable {
    db: Arc<DbHandle>,
}

impl ServerTable {
    pub(crate) fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    /// Insert or update every given server.
    #[instrument(skip_all, fields(count = servers.len()))]
    pub async fn save_all(&self, servers: &[ServerRecord]) -> StorageResult<()> {
        if servers.is_empty() {
            return Ok(());
        }

        let sql = match self.db.dialect() {
            Dialect::Sqlite => {
                "INSERT INTO servers (id, name, web_address) VALUES (?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     web_address = excluded.web_address"
            }
            Dialect::MySql => {
                "INSERT INTO servers (id, name, web_address) VALUES (?, ?, ?)
                 ON DUPLICATE KEY UPDATE
                     name = VALUES(name),
                     web_address = VALUES(web_address)"
            }
        };

        let pool = self.db.pool().await?;
        let mut tx = pool.begin().await?;
        for server in servers {
            sqlx::query(sql)
                .bind(server.id.to_string())
                .bind(&server.name)
                .bind(&server.web_address)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!("saved {} servers", servers.len());
        Ok(())
    }

    pub async fn all(&self) -> StorageResult<Vec<ServerRecord>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query("SELECT id, name, web_address FROM servers ORDER BY name")
            .fetch_all(&pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let id: String = row.try_get("id")?;
                Ok(ServerRecord {
                    id: parse_uuid(&id)?,
                    name: row.try_get("name")?,
                    web_address: row.try_get("web_address")?,
                })
            })
            .collect()
    }

    pub async fn remove_all(&self) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM servers").execute(&pool).await?;
        Ok(())
    }
}
