//! Storage contract definition
//!
//! This module defines the `Database` trait that both backend drivers
//! implement. Entity tables and the migration orchestrator program against
//! this trait only; nothing outside the drivers depends on a concrete
//! backend type.
//!
//! ## Lifecycle
//!
//! `Closed → Opening → Open` on `open()`, `Open → Closed` on `close()`.
//! A networked backend that loses connectivity is degraded until its
//! background probe restores the pool; operations issued while degraded
//! block on pool checkout up to the configured acquire timeout and then
//! fail with [`StorageError::Connection`]. This fail-fast-after-timeout
//! behavior is the one consistent choice for every driver.
//!
//! ## Thread safety
//!
//! Implementations must be `Send + Sync`; foreground gameplay handlers and
//! scheduled background tasks call into the same instance concurrently.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::StorageResult;
use super::tables::{
    ActionTable, CommandUsageTable, GeoTable, NicknameTable, ServerTable, SessionTable, TpsTable,
    UserInfoTable, UserTable, WebUserTable, WorldTable,
};
use crate::data::{Nickname, Session, UserData};

/// Trait for persistent analytics backends
///
/// All operations are async and blocking from the caller's perspective;
/// callers on latency-sensitive tasks must offload them to a worker.
#[async_trait]
pub trait Database: Send + Sync {
    /// Establish the connection or pool and create any missing tables.
    ///
    /// Idempotent: returns `Ok(true)` on a fresh open and `Ok(false)` if the
    /// backend was already open. Fails with [`StorageError::Connection`]
    /// when the backend is unreachable or credentials are invalid, and with
    /// [`StorageError::Schema`] when table creation fails.
    ///
    /// [`StorageError::Connection`]: super::StorageError::Connection
    /// [`StorageError::Schema`]: super::StorageError::Schema
    async fn open(&self) -> StorageResult<bool>;

    /// Release all resources. Safe to call multiple times; operations after
    /// close fail with [`StorageError::Closed`](super::StorageError::Closed).
    async fn close(&self);

    /// Lightweight round-trip used as a health probe and for diagnostics.
    ///
    /// Succeeds only when the connection is genuinely usable; this is the
    /// canonical "is this backend viable" check run before a hotswap.
    async fn get_version(&self) -> StorageResult<String>;

    /// Identifier used in configuration (`"sqlite"` / `"mysql"`).
    ///
    /// For reporting only; no caller branches on it.
    fn config_name(&self) -> &'static str;

    /// Human-readable engine name, for reporting only.
    fn name(&self) -> &'static str;

    /// Identity of this backend instance. Two instances with identical
    /// configuration still have distinct ids; the migration's same-instance
    /// guard compares these, never configuration names.
    fn instance_id(&self) -> Uuid;

    fn servers(&self) -> ServerTable;
    fn users(&self) -> UserTable;
    fn worlds(&self) -> WorldTable;
    fn tps(&self) -> TpsTable;
    fn web_users(&self) -> WebUserTable;
    fn commands(&self) -> CommandUsageTable;
    fn actions(&self) -> ActionTable;
    fn geolocations(&self) -> GeoTable;
    fn nicknames(&self) -> NicknameTable;
    fn sessions(&self) -> SessionTable;
    fn user_info(&self) -> UserInfoTable;

    /// Destructive wipe of every entity table, dependents before principals
    /// (the reverse of the batch-copy order).
    async fn remove_all_data(&self) -> StorageResult<()> {
        self.user_info().remove_all().await?;
        self.sessions().remove_all().await?;
        self.nicknames().remove_all().await?;
        self.geolocations().remove_all().await?;
        self.actions().remove_all().await?;
        self.commands().remove_all().await?;
        self.web_users().remove_all().await?;
        self.tps().remove_all().await?;
        self.worlds().remove_all().await?;
        self.users().remove_all().await?;
        self.servers().remove_all().await?;
        Ok(())
    }

    /// Persist a player aggregate.
    ///
    /// The stored copy is loaded and merged with the given snapshot first,
    /// so concurrent writers reconcile instead of overwriting each other.
    async fn save_user_data(&self, data: &UserData) -> StorageResult<()> {
        let merged = match self.fetch_user_data(data.uuid()).await? {
            Some(existing) => existing.merge(data.clone()),
            None => data.clone(),
        };

        self.users()
            .save_all(std::slice::from_ref(&merged.record))
            .await?;

        let sessions: Vec<Session> = merged.sessions.values().cloned().collect();
        self.sessions().save_all(&sessions).await?;

        let nicknames: Vec<Nickname> = merged
            .nicknames
            .iter()
            .map(|(nickname, first_seen)| Nickname {
                user: merged.uuid(),
                nickname: nickname.clone(),
                first_seen: *first_seen,
            })
            .collect();
        self.nicknames().save_all(&nicknames).await?;

        Ok(())
    }

    /// Load a player aggregate, or `None` if the player was never stored.
    async fn fetch_user_data(&self, uuid: Uuid) -> StorageResult<Option<UserData>> {
        let Some(record) = self.users().get(uuid).await? else {
            return Ok(None);
        };

        let mut data = UserData::new(record);
        for session in self.sessions().for_player(uuid).await? {
            data.add_session(session);
        }
        for nickname in self.nicknames().for_player(uuid).await? {
            data.add_nickname(nickname.nickname, nickname.first_seen);
        }
        Ok(Some(data))
    }

    /// Explicit account removal: deletes every row belonging to the player,
    /// dependents first.
    async fn remove_account(&self, uuid: Uuid) -> StorageResult<()> {
        self.sessions().remove_player(uuid).await?;
        self.nicknames().remove_player(uuid).await?;
        self.geolocations().remove_player(uuid).await?;
        self.actions().remove_player(uuid).await?;
        self.user_info().remove_player(uuid).await?;
        self.users().remove(uuid).await?;
        Ok(())
    }
}
