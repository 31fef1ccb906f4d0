//! Administrative operations: hotswap and debug helpers
//!
//! The hotswap flow validates the requested backend, probes it, migrates
//! every table onto it, persists the new selection and signals the
//! application to reload. Ordinary validation failures are outcome values,
//! not errors; only the storage layer produces typed errors, and those are
//! carried inside the outcome so the caller can report them.
//!
//! A full copy is long-running (proportional to total row count) and must
//! not share a thread with time-sensitive scheduled work; use
//! [`spawn_hotswap`] from anything latency-sensitive.

use std::fmt;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::config::BackendKind;
use crate::context::AppContext;
use crate::storage::{BatchCopy, Database, StorageError};

/// Result of a hotswap request.
#[derive(Debug)]
pub enum HotswapOutcome {
    /// Data migrated, configuration persisted, reload signalled.
    Swapped { backend: BackendKind },

    /// The identifier is not in the closed set of known backends.
    UnknownBackend { requested: String },

    /// The requested backend is already the active one.
    AlreadyActive { backend: BackendKind },

    /// Another hotswap is still running; this request was rejected.
    AlreadyRunning,

    /// The target backend is selected but not fully configured.
    NotConfigured { backend: BackendKind, reason: String },

    /// Opening or probing the target backend failed; nothing was mutated.
    ProbeFailed {
        backend: BackendKind,
        error: StorageError,
    },

    /// A copy step failed. The destination may be partially populated; the
    /// configuration was left untouched.
    CopyFailed {
        backend: BackendKind,
        error: StorageError,
    },

    /// The copy finished but the new selection could not be persisted; the
    /// running application keeps its previous backend.
    PersistFailed {
        backend: BackendKind,
        reason: String,
    },
}

impl fmt::Display for HotswapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotswapOutcome::Swapped { backend } => {
                write!(f, "now using {}, reload in progress", backend)
            }
            HotswapOutcome::UnknownBackend { requested } => {
                write!(f, "unrecognized backend '{}'", requested)
            }
            HotswapOutcome::AlreadyActive { backend } => {
                write!(f, "{} is already the active backend", backend)
            }
            HotswapOutcome::AlreadyRunning => {
                write!(f, "another hotswap is already in progress")
            }
            HotswapOutcome::NotConfigured { backend, reason } => {
                write!(f, "{} is not configured: {}", backend, reason)
            }
            HotswapOutcome::ProbeFailed { backend, error } => {
                write!(f, "could not reach {}: {}", backend, error)
            }
            HotswapOutcome::CopyFailed { backend, error } => {
                write!(f, "data migration to {} failed: {}", backend, error)
            }
            HotswapOutcome::PersistFailed { backend, reason } => {
                write!(
                    f,
                    "migrated to {} but could not persist the selection: {}",
                    backend, reason
                )
            }
        }
    }
}

impl HotswapOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, HotswapOutcome::Swapped { .. })
    }
}

/// Switch the active storage backend, migrating all data to it.
///
/// On success the new selection is persisted and a reload signal is
/// broadcast; on any failure the configuration is untouched and the
/// previous backend stays active.
#[instrument(skip(ctx))]
pub async fn hotswap(ctx: &AppContext, target: &str) -> HotswapOutcome {
    let Some(kind) = BackendKind::parse(target) else {
        return HotswapOutcome::UnknownBackend {
            requested: target.to_string(),
        };
    };

    let config = ctx.config().await;
    if config.database.backend == kind {
        return HotswapOutcome::AlreadyActive { backend: kind };
    }

    if !ctx.try_begin_hotswap() {
        warn!("rejected hotswap to {}: another one is running", kind);
        return HotswapOutcome::AlreadyRunning;
    }

    let outcome = run_hotswap(ctx, kind).await;
    ctx.end_hotswap();

    match &outcome {
        HotswapOutcome::Swapped { backend } => info!("hotswap to {} complete", backend),
        rejected @ (HotswapOutcome::UnknownBackend { .. }
        | HotswapOutcome::AlreadyActive { .. }
        | HotswapOutcome::AlreadyRunning) => warn!("hotswap rejected: {}", rejected),
        failed => error!("hotswap failed: {}", failed),
    }
    outcome
}

/// Run [`hotswap`] on its own task, returning immediately.
pub fn spawn_hotswap(ctx: Arc<AppContext>, target: String) -> JoinHandle<HotswapOutcome> {
    tokio::spawn(async move { hotswap(&ctx, &target).await })
}

async fn run_hotswap(ctx: &AppContext, kind: BackendKind) -> HotswapOutcome {
    // Re-check under the guard; a hotswap that just finished may have
    // already selected this backend.
    let config = ctx.config().await;
    if config.database.backend == kind {
        return HotswapOutcome::AlreadyActive { backend: kind };
    }

    let target = match config.database.build_backend(kind) {
        Ok(target) => target,
        Err(e) => {
            return HotswapOutcome::NotConfigured {
                backend: kind,
                reason: e.to_string(),
            };
        }
    };

    // Isolated instance of the target; the active backend keeps serving.
    if let Err(error) = target.open().await {
        return HotswapOutcome::ProbeFailed {
            backend: kind,
            error,
        };
    }

    if let Err(error) = target.get_version().await {
        target.close().await;
        return HotswapOutcome::ProbeFailed {
            backend: kind,
            error,
        };
    }

    let source = ctx.database().await;
    let copy = BatchCopy::new(source.as_ref(), target.as_ref());
    if let Err(error) = copy.copy_everything().await {
        target.close().await;
        return HotswapOutcome::CopyFailed {
            backend: kind,
            error,
        };
    }

    if let Err(e) = ctx.persist_backend_selection(kind).await {
        target.close().await;
        return HotswapOutcome::PersistFailed {
            backend: kind,
            reason: e.to_string(),
        };
    }

    let previous = ctx.set_active(target).await;
    previous.close().await;
    ctx.send_reload();

    HotswapOutcome::Swapped { backend: kind }
}

/// Debug-only entry point for exercising integration paths that are hard to
/// reach from unit tests. Not part of the durable contract.
#[cfg(debug_assertions)]
pub async fn test_feature(ctx: &AppContext, feature: &str) -> anyhow::Result<String> {
    match feature {
        "probe" => {
            let version = ctx.database().await.get_version().await?;
            Ok(format!("backend version {}", version))
        }
        "reload" => {
            ctx.send_reload();
            Ok("reload signal sent".to_string())
        }
        other => anyhow::bail!("unknown test feature '{}'", other),
    }
}
