//! Command usage counters
//!
//! One row per command label. Counts are monotonically non-decreasing: the
//! stored value is the maximum of the existing and incoming counts, so a
//! stale writer replaying an older, smaller count can never shrink a
//! counter.

use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::Row;
use tracing::{debug, instrument};

use crate::storage::connection::{DbHandle, Dialect};
use crate::storage::error::StorageResult;

pub struct CommandUsageTable {
    db: Arc<DbHandle>,
}

impl CommandUsageTable {
    pub(crate) fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    /// Upsert the given label → count map.
    #[instrument(skip_all, fields(count = usage.len()))]
    pub async fn save_usage(&self, usage: &BTreeMap<String, i32>) -> StorageResult<()> {
        if usage.is_empty() {
            return Ok(());
        }

        let sql = match self.db.dialect() {
            Dialect::Sqlite => {
                "INSERT INTO commands (command, times_used) VALUES (?, ?)
                 ON CONFLICT(command) DO UPDATE SET
                     times_used = MAX(times_used, excluded.times_used)"
            }
            Dialect::MySql => {
                "INSERT INTO commands (command, times_used) VALUES (?, ?)
                 ON DUPLICATE KEY UPDATE
                     times_used = GREATEST(times_used, VALUES(times_used))"
            }
        };

        let pool = self.db.pool().await?;
        let mut tx = pool.begin().await?;
        for (command, times_used) in usage {
            sqlx::query(sql)
                .bind(command)
                .bind(*times_used)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!("saved usage for {} commands", usage.len());
        Ok(())
    }

    pub async fn all(&self) -> StorageResult<BTreeMap<String, i32>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query("SELECT command, times_used FROM commands")
            .fetch_all(&pool)
            .await?;

        let mut usage = BTreeMap::new();
        for row in rows {
            let command: String = row.try_get("command")?;
            let times_used: i32 = row.try_get("times_used")?;
            usage.insert(command, times_used);
        }
        Ok(usage)
    }

    pub async fn remove_all(&self) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM commands").execute(&pool).await?;
        Ok(())
    }
}
