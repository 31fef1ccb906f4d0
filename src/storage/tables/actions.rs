//! Append-only audit trail of tracked player actions

use std::sync::Arc;

use sqlx::Row;
use tracing::instrument;

use super::parse_uuid;
use crate::data::{ActionLogEntry, ActionType};
use crate::storage::connection::DbHandle;
use crate::storage::error::StorageResult;
use uuid::Uuid;

pub struct ActionTable {
    db: Arc<DbHandle>,
}

impl ActionTable {
    pub(crate) fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(count = actions.len()))]
    pub async fn save_all(&self, actions: &[ActionLogEntry]) -> StorageResult<()> {
        if actions.is_empty() {
            return Ok(());
        }

        let pool = self.db.pool().await?;
        let mut tx = pool.begin().await?;
        for action in actions {
            sqlx::query(
                "INSERT INTO actions (user_id, server_id, action_id, date, additional_info)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(action.user.to_string())
            .bind(action.server.to_string())
            .bind(action.action.id())
            .bind(action.date)
            .bind(&action.extra_info)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn all(&self) -> StorageResult<Vec<ActionLogEntry>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query(
            "SELECT user_id, server_id, action_id, date, additional_info FROM actions
             ORDER BY date",
        )
        .fetch_all(&pool)
        .await?;

        rows.into_iter().map(Self::decode).collect()
    }

    /// Newest first, the order an inspect page shows them.
    pub async fn for_player(&self, user: Uuid) -> StorageResult<Vec<ActionLogEntry>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query(
            "SELECT user_id, server_id, action_id, date, additional_info FROM actions
             WHERE user_id = ? ORDER BY date DESC",
        )
        .bind(user.to_string())
        .fetch_all(&pool)
        .await?;

        rows.into_iter().map(Self::decode).collect()
    }

    pub async fn remove_player(&self, user: Uuid) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM actions WHERE user_id = ?")
            .bind(user.to_string())
            .execute(&pool)
            .await?;
        Ok(())
    }

    pub async fn remove_all(&self) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM actions").execute(&pool).await?;
        Ok(())
    }

    fn decode(row: sqlx::any::AnyRow) -> StorageResult<ActionLogEntry> {
        let user: String = row.try_get("user_id")?;
        let server: String = row.try_get("server_id")?;
        let action_id: i32 = row.try_get("action_id")?;
        Ok(ActionLogEntry {
            user: parse_uuid(&user)?,
            server: parse_uuid(&server)?,
            action: ActionType::from_id(action_id),
            date: row.try_get("date")?,
            extra_info: row.try_get("additional_info")?,
        })
    }
}
