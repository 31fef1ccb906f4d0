//! Per-user aggregate info, scoped per server

use std::sync::Arc;

use sqlx::Row;
use tracing::instrument;

use super::parse_uuid;
use crate::data::UserInfo;
use crate::storage::connection::DbHandle;
use crate::storage::error::StorageResult;
use uuid::Uuid;

pub struct UserInfoTable {
    db: Arc<DbHandle>,
}

impl UserInfoTable {
    pub(crate) fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(count = info.len()))]
    pub async fn save_all(&self, info: &[UserInfo]) -> StorageResult<()> {
        if info.is_empty() {
            return Ok(());
        }

        let pool = self.db.pool().await?;
        let mut tx = pool.begin().await?;
        for entry in info {
            sqlx::query(
                "REPLACE INTO user_info (user_id, server_id, registered, opped, banned)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(entry.user.to_string())
            .bind(entry.server.to_string())
            .bind(entry.registered)
            .bind(entry.opped as i32)
            .bind(entry.banned as i32)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn all(&self) -> StorageResult<Vec<UserInfo>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query(
            "SELECT user_id, server_id, registered, opped, banned FROM user_info",
        )
        .fetch_all(&pool)
        .await?;

        rows.into_iter().map(Self::decode).collect()
    }

    pub async fn for_server(&self, server: Uuid) -> StorageResult<Vec<UserInfo>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query(
            "SELECT user_id, server_id, registered, opped, banned FROM user_info
             WHERE server_id = ?",
        )
        .bind(server.to_string())
        .fetch_all(&pool)
        .await?;

        rows.into_iter().map(Self::decode).collect()
    }

    pub async fn remove_player(&self, user: Uuid) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM user_info WHERE user_id = ?")
            .bind(user.to_string())
            .execute(&pool)
            .await?;
        Ok(())
    }

    pub async fn remove_all(&self) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM user_info").execute(&pool).await?;
        Ok(())
    }

    fn decode(row: sqlx::any::AnyRow) -> StorageResult<UserInfo> {
        let user: String = row.try_get("user_id")?;
        let server: String = row.try_get("server_id")?;
        let opped: i32 = row.try_get("opped")?;
        let banned: i32 = row.try_get("banned")?;
        Ok(UserInfo {
            user: parse_uuid(&user)?,
            server: parse_uuid(&server)?,
            registered: row.try_get("registered")?,
            opped: opped != 0,
            banned: banned != 0,
        })
    }
}
