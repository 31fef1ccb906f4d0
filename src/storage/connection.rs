//! Shared connection-pool handle used by both backend drivers
//!
//! Entity tables borrow the pool for the duration of one call through
//! [`DbHandle::pool`] and never cache a connection beyond it. The handle also
//! carries the instance identity used by the migration's same-instance guard
//! and the SQL dialect marker for the few statements whose syntax differs
//! between engines.

use sqlx::AnyPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{StorageError, StorageResult};

/// The SQL dialect spoken by a backend. Only consulted where the engines
/// genuinely diverge (upsert clauses); everything else is shared SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    MySql,
}

enum PoolState {
    Closed,
    Open(AnyPool),
}

/// Connection state shared between a backend driver and its table handles.
pub struct DbHandle {
    state: RwLock<PoolState>,
    dialect: Dialect,
    instance_id: Uuid,
}

impl DbHandle {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            state: RwLock::new(PoolState::Closed),
            dialect,
            instance_id: Uuid::new_v4(),
        }
    }

    pub(crate) fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub(crate) async fn is_open(&self) -> bool {
        matches!(*self.state.read().await, PoolState::Open(_))
    }

    /// Check out the pool for one call.
    pub(crate) async fn pool(&self) -> StorageResult<AnyPool> {
        match &*self.state.read().await {
            PoolState::Open(pool) => Ok(pool.clone()),
            PoolState::Closed => Err(StorageError::Closed),
        }
    }

    /// Install a freshly connected pool. Returns the new pool back to the
    /// caller if the handle was already open (the caller should close it and
    /// treat the open as a no-op).
    pub(crate) async fn set_open(&self, pool: AnyPool) -> Option<AnyPool> {
        let mut state = self.state.write().await;
        match *state {
            PoolState::Open(_) => Some(pool),
            PoolState::Closed => {
                *state = PoolState::Open(pool);
                None
            }
        }
    }

    /// Transition to closed; returns the pool so the caller can drain it.
    /// Safe to call repeatedly.
    pub(crate) async fn set_closed(&self) -> Option<AnyPool> {
        let mut state = self.state.write().await;
        match std::mem::replace(&mut *state, PoolState::Closed) {
            PoolState::Open(pool) => Some(pool),
            PoolState::Closed => None,
        }
    }
}
