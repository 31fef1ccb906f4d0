//! Canonical per-player rows

use std::sync::Arc;

use sqlx::Row;
use tracing::{debug, instrument};

use super::parse_uuid;
use crate::data::UserRecord;
use crate::storage::connection::{DbHandle, Dialect};
use crate::storage::error::StorageResult;
use uuid::Uuid;

pub struct UserTable {
    db: Arc<DbHandle>,
}

impl UserTable {
    pub(crate) fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    /// Insert or update every given user.
    ///
    /// Registration keeps the earliest stored value and the kick counter
    /// never decreases, so replaying an older snapshot cannot lose ground.
    #[instrument(skip_all, fields(count = users.len()))]
    pub async fn save_all(&self, users: &[UserRecord]) -> StorageResult<()> {
        if users.is_empty() {
            return Ok(());
        }

        let sql = match self.db.dialect() {
            Dialect::Sqlite => {
                "INSERT INTO users (uuid, name, registered, times_kicked) VALUES (?, ?, ?, ?)
                 ON CONFLICT(uuid) DO UPDATE SET
                     name = excluded.name,
                     registered = MIN(registered, excluded.registered),
                     times_kicked = MAX(times_kicked, excluded.times_kicked)"
            }
            Dialect::MySql => {
                "INSERT INTO users (uuid, name, registered, times_kicked) VALUES (?, ?, ?, ?)
                 ON DUPLICATE KEY UPDATE
                     name = VALUES(name),
                     registered = LEAST(registered, VALUES(registered)),
                     times_kicked = GREATEST(times_kicked, VALUES(times_kicked))"
            }
        };

        let pool = self.db.pool().await?;
        let mut tx = pool.begin().await?;
        for user in users {
            sqlx::query(sql)
                .bind(user.uuid.to_string())
                .bind(&user.name)
                .bind(user.registered)
                .bind(user.times_kicked)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!("saved {} users", users.len());
        Ok(())
    }

    pub async fn get(&self, uuid: Uuid) -> StorageResult<Option<UserRecord>> {
        let pool = self.db.pool().await?;
        let row = sqlx::query(
            "SELECT uuid, name, registered, times_kicked FROM users WHERE uuid = ?",
        )
        .bind(uuid.to_string())
        .fetch_optional(&pool)
        .await?;

        row.map(Self::decode).transpose()
    }

    pub async fn all(&self) -> StorageResult<Vec<UserRecord>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query("SELECT uuid, name, registered, times_kicked FROM users")
            .fetch_all(&pool)
            .await?;

        rows.into_iter().map(Self::decode).collect()
    }

    /// Whether this player has ever been stored.
    pub async fn exists(&self, uuid: Uuid) -> StorageResult<bool> {
        let pool = self.db.pool().await?;
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE uuid = ?")
            .bind(uuid.to_string())
            .fetch_one(&pool)
            .await?;
        Ok(row.0 > 0)
    }

    /// Delete the canonical row only; dependent rows are the caller's
    /// responsibility (see [`Database::remove_account`](crate::storage::Database::remove_account)).
    pub async fn remove(&self, uuid: Uuid) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM users WHERE uuid = ?")
            .bind(uuid.to_string())
            .execute(&pool)
            .await?;
        Ok(())
    }

    pub async fn remove_all(&self) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM users").execute(&pool).await?;
        Ok(())
    }

    fn decode(row: sqlx::any::AnyRow) -> StorageResult<UserRecord> {
        let uuid: String = row.try_get("uuid")?;
        Ok(UserRecord {
            uuid: parse_uuid(&uuid)?,
            name: row.try_get("name")?,
            registered: row.try_get("registered")?,
            times_kicked: row.try_get("times_kicked")?,
        })
    }
}
