//! Nicknames players have used
//!
//! Nickname text is attacker-controlled; it is always bound as a parameter
//! and stored verbatim.

use std::sync::Arc;

use sqlx::Row;
use tracing::instrument;

use super::parse_uuid;
use crate::data::Nickname;
use crate::storage::connection::{DbHandle, Dialect};
use crate::storage::error::StorageResult;
use uuid::Uuid;

pub struct NicknameTable {
    db: Arc<DbHandle>,
}

impl NicknameTable {
    pub(crate) fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    /// Upsert nicknames; on conflict the earlier first-seen timestamp wins.
    #[instrument(skip_all, fields(count = nicknames.len()))]
    pub async fn save_all(&self, nicknames: &[Nickname]) -> StorageResult<()> {
        if nicknames.is_empty() {
            return Ok(());
        }

        let sql = match self.db.dialect() {
            Dialect::Sqlite => {
                "INSERT INTO nicknames (user_id, nickname, first_seen) VALUES (?, ?, ?)
                 ON CONFLICT(user_id, nickname) DO UPDATE SET
                     first_seen = MIN(first_seen, excluded.first_seen)"
            }
            Dialect::MySql => {
                "INSERT INTO nicknames (user_id, nickname, first_seen) VALUES (?, ?, ?)
                 ON DUPLICATE KEY UPDATE
                     first_seen = LEAST(first_seen, VALUES(first_seen))"
            }
        };

        let pool = self.db.pool().await?;
        let mut tx = pool.begin().await?;
        for nickname in nicknames {
            sqlx::query(sql)
                .bind(nickname.user.to_string())
                .bind(&nickname.nickname)
                .bind(nickname.first_seen)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn all(&self) -> StorageResult<Vec<Nickname>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query("SELECT user_id, nickname, first_seen FROM nicknames")
            .fetch_all(&pool)
            .await?;

        rows.into_iter().map(Self::decode).collect()
    }

    pub async fn for_player(&self, user: Uuid) -> StorageResult<Vec<Nickname>> {
        let pool = self.db.pool().await?;
        let rows =
            sqlx::query("SELECT user_id, nickname, first_seen FROM nicknames WHERE user_id = ?")
                .bind(user.to_string())
                .fetch_all(&pool)
                .await?;

        rows.into_iter().map(Self::decode).collect()
    }

    pub async fn remove_player(&self, user: Uuid) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM nicknames WHERE user_id = ?")
            .bind(user.to_string())
            .execute(&pool)
            .await?;
        Ok(())
    }

    pub async fn remove_all(&self) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM nicknames").execute(&pool).await?;
        Ok(())
    }

    fn decode(row: sqlx::any::AnyRow) -> StorageResult<Nickname> {
        let user: String = row.try_get("user_id")?;
        Ok(Nickname {
            user: parse_uuid(&user)?,
            nickname: row.try_get("nickname")?,
            first_seen: row.try_get("first_seen")?,
        })
    }
}
