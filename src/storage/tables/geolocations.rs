//! IP-hash to geolocation records

use std::sync::Arc;

use sqlx::Row;
use tracing::instrument;

use super::parse_uuid;
use crate::data::GeoInfo;
use crate::storage::connection::DbHandle;
use crate::storage::error::StorageResult;
use uuid::Uuid;

pub struct GeoTable {
    db: Arc<DbHandle>,
}

impl GeoTable {
    pub(crate) fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    /// Upsert keyed by (player, ip-hash); saving again refreshes the
    /// geolocation and last-used timestamp.
    #[instrument(skip_all, fields(count = geolocations.len()))]
    pub async fn save_all(&self, geolocations: &[GeoInfo]) -> StorageResult<()> {
        if geolocations.is_empty() {
            return Ok(());
        }

        let pool = self.db.pool().await?;
        let mut tx = pool.begin().await?;
        for geo in geolocations {
            sqlx::query(
                "REPLACE INTO geolocations (user_id, ip_hash, geolocation, last_used)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(geo.user.to_string())
            .bind(&geo.ip_hash)
            .bind(&geo.geolocation)
            .bind(geo.last_used)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn all(&self) -> StorageResult<Vec<GeoInfo>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query("SELECT user_id, ip_hash, geolocation, last_used FROM geolocations")
            .fetch_all(&pool)
            .await?;

        rows.into_iter().map(Self::decode).collect()
    }

    pub async fn for_player(&self, user: Uuid) -> StorageResult<Vec<GeoInfo>> {
        let pool = self.db.pool().await?;
        let rows = sqlx::query(
            "SELECT user_id, ip_hash, geolocation, last_used FROM geolocations WHERE user_id = ?",
        )
        .bind(user.to_string())
        .fetch_all(&pool)
        .await?;

        rows.into_iter().map(Self::decode).collect()
    }

    pub async fn remove_player(&self, user: Uuid) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM geolocations WHERE user_id = ?")
            .bind(user.to_string())
            .execute(&pool)
            .await?;
        Ok(())
    }

    pub async fn remove_all(&self) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        sqlx::query("DELETE FROM geolocations")
            .execute(&pool)
            .await?;
        Ok(())
    }

    fn decode(row: sqlx::any::AnyRow) -> StorageResult<GeoInfo> {
        let user: String = row.try_get("user_id")?;
        Ok(GeoInfo {
            user: parse_uuid(&user)?,
            ip_hash: row.try_get("ip_hash")?,
            geolocation: row.try_get("geolocation")?,
            last_used: row.try_get("last_used")?,
        })
    }
}
