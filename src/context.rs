//! Explicit application context
//!
//! Everything that used to be ambient state lives here: the parsed
//! configuration, the active backend handle, the reload channel and the
//! hotswap guard. The context is constructed once at startup and passed to
//! every component that needs it; there is no global lookup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use crate::config::{self, BackendKind, Config};
use crate::storage::Database;

/// Broadcast to the surrounding application when it must reopen backends
/// and restart dependent schedulers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadSignal {
    BackendChanged,
}

pub struct AppContext {
    config_path: PathBuf,
    config: RwLock<Config>,
    active: RwLock<Arc<dyn Database>>,
    reload_tx: broadcast::Sender<ReloadSignal>,
    hotswap_running: AtomicBool,
}

impl AppContext {
    /// Build a context from an already parsed configuration. The selected
    /// backend is constructed but not opened.
    pub fn new(config_path: impl Into<PathBuf>, config: Config) -> anyhow::Result<Self> {
        let active = config.database.active_backend()?;
        let (reload_tx, _) = broadcast::channel(4);

        Ok(Self {
            config_path: config_path.into(),
            config: RwLock::new(config),
            active: RwLock::new(active),
            reload_tx,
            hotswap_running: AtomicBool::new(false),
        })
    }

    /// Read the configuration file at `path` and build the context from it.
    pub fn from_config_file(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let config = config::read_config_file(&path)?;
        Self::new(path, config)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }

    /// The currently active backend handle.
    pub async fn database(&self) -> Arc<dyn Database> {
        self.active.read().await.clone()
    }

    pub fn subscribe_reload(&self) -> broadcast::Receiver<ReloadSignal> {
        self.reload_tx.subscribe()
    }

    pub(crate) fn send_reload(&self) {
        // No receivers is fine; the signal is advisory.
        let _ = self.reload_tx.send(ReloadSignal::BackendChanged);
    }

    /// Persist the new backend selection to the configuration file and only
    /// then mutate the in-memory copy.
    pub(crate) async fn persist_backend_selection(&self, kind: BackendKind) -> anyhow::Result<()> {
        let mut config = self.config.write().await;
        let mut updated = config.clone();
        updated.database.backend = kind;
        config::write_config_file(&self.config_path, &updated)?;
        *config = updated;
        debug!("persisted backend selection '{}'", kind);
        Ok(())
    }

    /// Swap the active backend handle.
    pub(crate) async fn set_active(&self, database: Arc<dyn Database>) -> Arc<dyn Database> {
        let mut active = self.active.write().await;
        std::mem::replace(&mut *active, database)
    }

    /// Claim the hotswap-in-progress guard. Returns false if another
    /// hotswap is already running.
    pub(crate) fn try_begin_hotswap(&self) -> bool {
        self.hotswap_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn end_hotswap(&self) {
        self.hotswap_running.store(false, Ordering::SeqCst);
    }
}
