//! Play sessions with their nested world times and kills
//!
//! A session is physically three tables (`sessions`, `session_world_times`,
//! `kills`) stitched back together on load. The session row must exist
//! before its children are written; `save_all` keeps all three writes in one
//! transaction per batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use sqlx::Row;
use tracing::{debug, instrument};

use super::parse_uuid;
use crate::data::time::GameModeTimes;
use crate::data::{Kill, Session};
use crate::storage::connection::{DbHandle, Dialect};
use crate::storage::error::StorageResult;
use uuid::Uuid;

pub struct SessionTable {
    db: Arc<DbHandle>,
}

impl SessionTable {
    pub(crate) fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    /// Save sessions with their world times and kills. Worlds named by the
    /// sessions are registered on the fly so the world reference never
    /// dangles.
    #[instrument(skip_all, fields(count = sessions.len()))]
    pub async fn save_all(&self, sessions: &[Session]) -> StorageResult<()> {
        if sessions.is_empty() {
            return Ok(());
        }

        let world_sql = match self.db.dialect() {
            Dialect::Sqlite => "INSERT OR IGNORE INTO worlds (name) VALUES (?)",
            Dialect::MySql => "INSERT IGNORE INTO worlds (name) VALUES (?)",
        };

        let pool = self.db.pool().await?;
        let mut tx = pool.begin().await?;

        for session in sessions {
            let user = session.user.to_string();

            for world in session.world_times.worlds.keys() {
                sqlx::query(world_sql).bind(world).execute(&mut *tx).await?;
            }

            sqlx::query(
                "REPLACE INTO sessions (user_id, session_start, session_end) VALUES (?, ?, ?)",
            )
            .bind(&user)
            .bind(session.start)
            .bind(session.end)
            .execute(&mut *tx)
            .await?;

            for (world, times) in &session.world_times.worlds {
                sqlx::query(
                    "REPLACE INTO session_world_times
                         (user_id, session_start, world,
                          survival, creative, adventure, spectator, last_state_change)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&user)
                .bind(session.start)
                .bind(world)
                .bind(times.survival)
                .bind(times.creative)
                .bind(times.adventure)
                .bind(times.spectator)
                .bind(times.last_state_change)
                .execute(&mut *tx)
                .await?;
            }

            for kill in session.kills.values() {
                sqlx::query(
                    "REPLACE INTO kills
                         (killer_id, victim_id, session_start, weapon, kill_count, date)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(&user)
                .bind(kill.victim.to_string())
                .bind(session.start)
                .bind(&kill.weapon)
                .bind(kill.count as i32)
                .bind(kill.date)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        debug!("saved {} sessions", sessions.len());
        Ok(())
    }

    pub async fn all(&self) -> StorageResult<Vec<Session>> {
        self.fetch(None).await
    }

    pub async fn for_player(&self, user: Uuid) -> StorageResult<Vec<Session>> {
        self.fetch(Some(user)).await
    }

    pub async fn remove_player(&self, user: Uuid) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        let id = user.to_string();
        for sql in [
            "DELETE FROM kills WHERE killer_id = ?",
            "DELETE FROM session_world_times WHERE user_id = ?",
            "DELETE FROM sessions WHERE user_id = ?",
        ] {
            sqlx::query(sql).bind(&id).execute(&pool).await?;
        }
        Ok(())
    }

    /// Wipe kills and world times before their parent sessions.
    pub async fn remove_all(&self) -> StorageResult<()> {
        let pool = self.db.pool().await?;
        for sql in [
            "DELETE FROM kills",
            "DELETE FROM session_world_times",
            "DELETE FROM sessions",
        ] {
            sqlx::query(sql).execute(&pool).await?;
        }
        Ok(())
    }

    async fn fetch(&self, filter: Option<Uuid>) -> StorageResult<Vec<Session>> {
        let pool = self.db.pool().await?;
        let filter_id = filter.map(|user| user.to_string());

        let session_rows = match &filter_id {
            Some(id) => {
                sqlx::query(
                    "SELECT user_id, session_start, session_end FROM sessions WHERE user_id = ?",
                )
                .bind(id)
                .fetch_all(&pool)
                .await?
            }
            None => {
                sqlx::query("SELECT user_id, session_start, session_end FROM sessions")
                    .fetch_all(&pool)
                    .await?
            }
        };

        let mut sessions: BTreeMap<(Uuid, i64), Session> = BTreeMap::new();
        for row in session_rows {
            let user: String = row.try_get("user_id")?;
            let user = parse_uuid(&user)?;
            let start: i64 = row.try_get("session_start")?;
            let end: i64 = row.try_get("session_end")?;
            sessions.insert((user, start), Session::new(user, start, end));
        }

        let time_rows = match &filter_id {
            Some(id) => {
                sqlx::query(
                    "SELECT user_id, session_start, world,
                            survival, creative, adventure, spectator, last_state_change
                     FROM session_world_times WHERE user_id = ?",
                )
                .bind(id)
                .fetch_all(&pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT user_id, session_start, world,
                            survival, creative, adventure, spectator, last_state_change
                     FROM session_world_times",
                )
                .fetch_all(&pool)
                .await?
            }
        };

        for row in time_rows {
            let user: String = row.try_get("user_id")?;
            let user = parse_uuid(&user)?;
            let start: i64 = row.try_get("session_start")?;
            let world: String = row.try_get("world")?;
            let times = GameModeTimes {
                survival: row.try_get("survival")?,
                creative: row.try_get("creative")?,
                adventure: row.try_get("adventure")?,
                spectator: row.try_get("spectator")?,
                last_state_change: row.try_get("last_state_change")?,
            };

            if let Some(session) = sessions.get_mut(&(user, start)) {
                session.world_times.set(world, times);
            }
        }

        let kill_rows = match &filter_id {
            Some(id) => {
                sqlx::query(
                    "SELECT killer_id, victim_id, session_start, weapon, kill_count, date
                     FROM kills WHERE killer_id = ?",
                )
                .bind(id)
                .fetch_all(&pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT killer_id, victim_id, session_start, weapon, kill_count, date
                     FROM kills",
                )
                .fetch_all(&pool)
                .await?
            }
        };

        for row in kill_rows {
            let killer: String = row.try_get("killer_id")?;
            let killer = parse_uuid(&killer)?;
            let victim: String = row.try_get("victim_id")?;
            let start: i64 = row.try_get("session_start")?;
            let count: i32 = row.try_get("kill_count")?;

            if let Some(session) = sessions.get_mut(&(killer, start)) {
                session.add_kill(Kill {
                    victim: parse_uuid(&victim)?,
                    count: count as u32,
                    weapon: row.try_get("weapon")?,
                    date: row.try_get("date")?,
                });
            }
        }

        Ok(sessions.into_values().collect())
    }
}
