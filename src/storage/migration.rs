//! Batch copy of every entity table between two backend instances
//!
//! Used by the hotswap flow to move all data onto the newly selected
//! backend. The copy is a fixed sequence of independently callable steps;
//! the order is a hard invariant because later tables reference rows the
//! earlier steps create.
//!
//! There is deliberately **no cross-step transaction**: if step *k* fails,
//! steps 1..k−1 stay committed in the destination and steps k+1.. are never
//! attempted. The failure surfaces as
//! [`StorageError::MigrationAborted`] naming the step; both backends remain
//! open, the destination partially populated. This reproduces the source
//! system's sequential, no-rollback behavior rather than guessing at a
//! transactional intent it never had.

use std::fmt;

use tracing::{debug, info, instrument};

use super::database::Database;
use super::error::{StorageError, StorageResult};

/// One step of the full copy, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStep {
    /// Preparatory wipe of the destination, run only by [`BatchCopy::copy_everything`].
    ClearDestination,
    Servers,
    Users,
    Worlds,
    Tps,
    WebUsers,
    Commands,
    Actions,
    Geolocations,
    Nicknames,
    Sessions,
    UserInfo,
}

impl CopyStep {
    /// The eleven copy steps in their mandatory order.
    pub const ORDER: [CopyStep; 11] = [
        CopyStep::Servers,
        CopyStep::Users,
        CopyStep::Worlds,
        CopyStep::Tps,
        CopyStep::WebUsers,
        CopyStep::Commands,
        CopyStep::Actions,
        CopyStep::Geolocations,
        CopyStep::Nicknames,
        CopyStep::Sessions,
        CopyStep::UserInfo,
    ];
}

impl fmt::Display for CopyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CopyStep::ClearDestination => "clear destination",
            CopyStep::Servers => "servers",
            CopyStep::Users => "users",
            CopyStep::Worlds => "worlds",
            CopyStep::Tps => "tps",
            CopyStep::WebUsers => "web users",
            CopyStep::Commands => "commands",
            CopyStep::Actions => "actions",
            CopyStep::Geolocations => "geolocations",
            CopyStep::Nicknames => "nicknames",
            CopyStep::Sessions => "sessions",
            CopyStep::UserInfo => "user info",
        };
        write!(f, "{}", name)
    }
}

/// Copies the entire contents of one open backend into another.
///
/// Both instances must already be open. The orchestrator borrows the two
/// handles and mutates only the destination. When source and destination
/// are the same instance (by identity, not configuration name), every step
/// is a no-op; the guard runs at the start of each step because the steps
/// are independently callable.
pub struct BatchCopy<'a> {
    source: &'a dyn Database,
    destination: &'a dyn Database,
}

impl<'a> BatchCopy<'a> {
    pub fn new(source: &'a dyn Database, destination: &'a dyn Database) -> Self {
        Self {
            source,
            destination,
        }
    }

    fn same_instance(&self) -> bool {
        self.source.instance_id() == self.destination.instance_id()
    }

    /// Clear the destination and run all eleven steps in order.
    ///
    /// A failing step aborts the remainder; whatever the earlier steps
    /// committed stays committed.
    #[instrument(skip(self), fields(
        source = self.source.config_name(),
        destination = self.destination.config_name(),
    ))]
    pub async fn copy_everything(&self) -> StorageResult<()> {
        if self.same_instance() {
            debug!("source and destination are the same instance, nothing to copy");
            return Ok(());
        }

        info!("starting full batch copy");

        self.destination
            .remove_all_data()
            .await
            .map_err(|cause| abort(CopyStep::ClearDestination, cause))?;

        for step in CopyStep::ORDER {
            self.run_step(step).await.map_err(|cause| abort(step, cause))?;
        }

        info!("full batch copy complete");
        Ok(())
    }

    async fn run_step(&self, step: CopyStep) -> StorageResult<()> {
        match step {
            CopyStep::ClearDestination => self.destination.remove_all_data().await,
            CopyStep::Servers => self.copy_servers().await,
            CopyStep::Users => self.copy_users().await,
            CopyStep::Worlds => self.copy_worlds().await,
            CopyStep::Tps => self.copy_tps().await,
            CopyStep::WebUsers => self.copy_web_users().await,
            CopyStep::Commands => self.copy_command_usage().await,
            CopyStep::Actions => self.copy_actions().await,
            CopyStep::Geolocations => self.copy_geolocations().await,
            CopyStep::Nicknames => self.copy_nicknames().await,
            CopyStep::Sessions => self.copy_sessions().await,
            CopyStep::UserInfo => self.copy_user_info().await,
        }
    }

    pub async fn copy_servers(&self) -> StorageResult<()> {
        if self.same_instance() {
            return Ok(());
        }
        debug!("batch copy servers");
        let servers = self.source.servers().all().await?;
        self.destination.servers().save_all(&servers).await
    }

    pub async fn copy_users(&self) -> StorageResult<()> {
        if self.same_instance() {
            return Ok(());
        }
        debug!("batch copy users");
        let users = self.source.users().all().await?;
        self.destination.users().save_all(&users).await
    }

    pub async fn copy_worlds(&self) -> StorageResult<()> {
        if self.same_instance() {
            return Ok(());
        }
        debug!("batch copy worlds");
        let worlds = self.source.worlds().all().await?;
        self.destination.worlds().save_all(&worlds).await
    }

    pub async fn copy_tps(&self) -> StorageResult<()> {
        if self.same_instance() {
            return Ok(());
        }
        debug!("batch copy tps");
        let samples = self.source.tps().all().await?;
        self.destination.tps().save_all(&samples).await
    }

    pub async fn copy_web_users(&self) -> StorageResult<()> {
        if self.same_instance() {
            return Ok(());
        }
        debug!("batch copy web users");
        let users = self.source.web_users().all().await?;
        self.destination.web_users().save_all(&users).await
    }

    pub async fn copy_command_usage(&self) -> StorageResult<()> {
        if self.same_instance() {
            return Ok(());
        }
        debug!("batch copy command usage");
        let usage = self.source.commands().all().await?;
        self.destination.commands().save_usage(&usage).await
    }

    pub async fn copy_actions(&self) -> StorageResult<()> {
        if self.same_instance() {
            return Ok(());
        }
        debug!("batch copy actions");
        let actions = self.source.actions().all().await?;
        self.destination.actions().save_all(&actions).await
    }

    pub async fn copy_geolocations(&self) -> StorageResult<()> {
        if self.same_instance() {
            return Ok(());
        }
        debug!("batch copy geolocations");
        let geolocations = self.source.geolocations().all().await?;
        self.destination.geolocations().save_all(&geolocations).await
    }

    pub async fn copy_nicknames(&self) -> StorageResult<()> {
        if self.same_instance() {
            return Ok(());
        }
        debug!("batch copy nicknames");
        let nicknames = self.source.nicknames().all().await?;
        self.destination.nicknames().save_all(&nicknames).await
    }

    pub async fn copy_sessions(&self) -> StorageResult<()> {
        if self.same_instance() {
            return Ok(());
        }
        debug!("batch copy sessions");
        let sessions = self.source.sessions().all().await?;
        self.destination.sessions().save_all(&sessions).await
    }

    pub async fn copy_user_info(&self) -> StorageResult<()> {
        if self.same_instance() {
            return Ok(());
        }
        debug!("batch copy user info");
        let info = self.source.user_info().all().await?;
        self.destination.user_info().save_all(&info).await
    }
}

fn abort(step: CopyStep, cause: StorageError) -> StorageError {
    StorageError::MigrationAborted {
        step,
        cause: Box::new(cause),
    }
}
