//! Periodic performance sampler
//!
//! Collects one [`TpsSample`](crate::data::TpsSample) per interval through
//! the active backend and runs retention pruning on a slower cadence. Runs
//! on its own tokio task; storage failures are logged and the sampler keeps
//! going, so a transient backend outage never kills the time series.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sysinfo::System;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::context::AppContext;
use crate::data::TpsSample;
use crate::storage::Database;

/// Game-side counters the host process cannot observe itself. Implemented
/// by the surrounding application (tick loop, world registry).
pub trait GameStats: Send + Sync {
    /// Current ticks per second.
    fn tick_rate(&self) -> f64;

    fn player_count(&self) -> i32;

    fn entity_count(&self) -> i32;

    fn loaded_chunks(&self) -> i32;
}

/// Spawn the sampler for one server. The task runs until aborted.
pub fn spawn_sampler(
    ctx: Arc<AppContext>,
    server: Uuid,
    stats: Arc<dyn GameStats>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let sampling = ctx.config().await.sampling;

        let mut sample_interval = time::interval(Duration::from_secs(sampling.interval_secs));
        sample_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cleanup_interval =
            time::interval(Duration::from_secs(sampling.cleanup_interval_secs));
        cleanup_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut system = System::new_all();

        loop {
            tokio::select! {
                _ = sample_interval.tick() => {
                    system.refresh_cpu_usage();
                    system.refresh_memory();

                    let sample = TpsSample {
                        server,
                        date: Utc::now().timestamp_millis(),
                        tps: stats.tick_rate(),
                        players: stats.player_count(),
                        cpu_usage: system.global_cpu_usage() as f64,
                        ram_usage: system.used_memory() as i64,
                        entities: stats.entity_count(),
                        chunks: stats.loaded_chunks(),
                    };

                    let db = ctx.database().await;
                    match db.tps().save_all(std::slice::from_ref(&sample)).await {
                        Ok(()) => debug!("stored performance sample for {}", server),
                        Err(e) => warn!("failed to store performance sample: {}", e),
                    }
                }

                _ = cleanup_interval.tick() => {
                    let db = ctx.database().await;
                    if let Err(e) = db.tps().clean().await {
                        warn!("retention pruning failed: {}", e);
                    }
                }
            }
        }
    })
}
