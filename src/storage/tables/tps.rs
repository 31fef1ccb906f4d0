//! Performance-sample time series

use std::sync::Arc;

use chrono::Utc;
use sqlx::Row;
use tracing::{debug, info, instrument};

use super::parse_uuid;
use crate::data::TpsSample;
use crate::storage::connection::DbHandle;
use crate::storage::error::StorageResult;

/// Samples older than this are eligible for retention pruning.
pub const RETENTION_MILLIS: i64 = 690_000 * 1000;

pub struct TpsTable {
    db: Arc<DbHandle>,
}

impl TpsTable {
    pub(crate) fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    /// Append samples. Re-saving a (server, timestamp) pair replaces it.
    #[instrument(skip_all, fields(count = samples.len()))]
    pub async fn save_all(&self, samples: &[TpsSample]) -> StorageResult<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let pool = self.db.pool().await?;
        let mut tx = pool.begin().await?;
        for sample in samples {
            sqlx::query(
                "REPLACE INTO tps
                     (server_id, date, tps, players, cpu_usage, ram_usage, entities, chunks)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(sample.server.to_string())
            .bind(sample.date)
            .bind(sample.tps)
            .bind(sample.players)
            .bind(sample.cpu_usage)
            .bind(sample.ram_usage)
            .bind(sample.entities)
            .bind(sample.chunks)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("saved {} performance samples", samples.len());
        Ok(())
    }

    pub async fn all(&self) -> StorageResult<Vec<TpsSample>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query(
            "SELECT server_id, date, tps, players, cpu_usage, ram_usage, entities, chunks
             FROM tps ORDER BY date",
        )
        .fetch_all(&pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let server: String = row.try_get("server_id")?;
                Ok(TpsSample {
                    server: parse_uuid(&server)?,
                    date: row.try_get("date")?,
                    tps: row.try_get("tps")?,
                    players: row.try_get("players")?,
                    cpu_usage: row.try_get("cpu_usage")?,
                    ram_usage: row.try_get("ram_usage")?,
                    entities: row.try_get("entities")?,
                    chunks: row.try_get("chunks")?,
                })
            })
            .collect()
    }

    /// Prune samples older than the retention window. Returns how many rows
    /// were removed.
    pub async fn clean(&self) -> StorageResult<u64> {
        self.clean_before(Utc::now().timestamp_millis() - RETENTION_MILLIS)
            .await
    }

    /// Prune samples strictly older than the given epoch millisecond.
    #[instrument(skip(self))]
    pub async fn clean_before(&self, cutoff: i64) -> StorageResult<u64> {
        let pool = self.db.pool().await?;
        let result = sqlx::query("DELETE FROM tps WHERE date < ?")
            .bind(cutoff)
            .execute(&pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!("pruned {} performance samples older than {}", removed, cutoff);
        }
        Ok(removed)
    }

    pub async fn remove_all(&self) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM tps").execute(&pool).await?;
        Ok(())
    }
}
