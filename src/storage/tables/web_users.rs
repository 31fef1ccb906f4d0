//! Web-panel credentials

use std::sync::Arc;

use sqlx::Row;
use tracing::instrument;

use crate::data::WebUser;
use crate::storage::connection::DbHandle;
use crate::storage::error::StorageResult;

pub struct WebUserTable {
    db: Arc<DbHandle>,
}

impl WebUserTable {
    pub(crate) fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(count = users.len()))]
    pub async fn save_all(&self, users: &[WebUser]) -> StorageResult<()> {
        if users.is_empty() {
            return Ok(());
        }

        let pool = self.db.pool().await?;
        let mut tx = pool.begin().await?;
        for user in users {
            sqlx::query(
                "REPLACE INTO web_users (username, password_hash, permission_level)
                 VALUES (?, ?, ?)",
            )
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.permission_level)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, username: &str) -> StorageResult<Option<WebUser>> {
        let pool = self.db.pool().await?;
        let row = sqlx::query(
            "SELECT username, password_hash, permission_level FROM web_users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&pool)
        .await?;

        row.map(Self::decode).transpose()
    }

    pub async fn all(&self) -> StorageResult<Vec<WebUser>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query(
            "SELECT username, password_hash, permission_level FROM web_users ORDER BY username",
        )
        .fetch_all(&pool)
        .await?;

        rows.into_iter().map(Self::decode).collect()
    }

    pub async fn remove(&self, username: &str) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM web_users WHERE username = ?")
            .bind(username)
            .execute(&pool)
            .await?;
        Ok(())
    }

    pub async fn remove_all(&self) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM web_users").execute(&pool).await?;
        Ok(())
    }

    fn decode(row: sqlx::any::AnyRow) -> StorageResult<WebUser> {
        Ok(WebUser {
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            permission_level: row.try_get("permission_level")?,
        })
    }
}
