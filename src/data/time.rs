//! Play-time accounting per game mode and per world
//!
//! Durations are accumulated milliseconds; `last_state_change` is the epoch
//! millisecond of the most recent mode transition. The sum of the per-mode
//! durations always equals the total time tracked up to that transition.
//!
//! Two distinct combinators exist and must not be confused:
//!
//! - [`GameModeTimes::merge`] reconciles two *snapshots of the same
//!   accounting period* (the same session seen by two writers). Durations
//!   are monotonic counters, so the larger value is the more recent one and
//!   reconciliation never double-counts. Idempotent and commutative.
//! - [`GameModeTimes::add`] accumulates *different* periods, e.g. folding
//!   every session of a player into lifetime totals. Not idempotent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accumulated play time in each of the fixed game modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameModeTimes {
    pub survival: i64,
    pub creative: i64,
    pub adventure: i64,
    pub spectator: i64,

    /// Epoch millis of the last mode transition covered by the durations.
    pub last_state_change: i64,
}

impl GameModeTimes {
    pub fn new(survival: i64, creative: i64, adventure: i64, spectator: i64) -> Self {
        Self {
            survival,
            creative,
            adventure,
            spectator,
            last_state_change: 0,
        }
    }

    /// Total tracked duration across all modes.
    pub fn total(&self) -> i64 {
        self.survival + self.creative + self.adventure + self.spectator
    }

    /// Reconcile two snapshots of the same accounting period.
    ///
    /// Per-mode durations take the maximum (the counter only ever grows, so
    /// the larger snapshot is the later one); the later state change wins.
    pub fn merge(self, other: GameModeTimes) -> GameModeTimes {
        GameModeTimes {
            survival: self.survival.max(other.survival),
            creative: self.creative.max(other.creative),
            adventure: self.adventure.max(other.adventure),
            spectator: self.spectator.max(other.spectator),
            last_state_change: self.last_state_change.max(other.last_state_change),
        }
    }

    /// Accumulate a different accounting period into this one.
    pub fn add(self, other: GameModeTimes) -> GameModeTimes {
        GameModeTimes {
            survival: self.survival + other.survival,
            creative: self.creative + other.creative,
            adventure: self.adventure + other.adventure,
            spectator: self.spectator + other.spectator,
            last_state_change: self.last_state_change.max(other.last_state_change),
        }
    }
}

/// Per-world breakdown of [`GameModeTimes`] for one session or one player's
/// lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldTimes {
    pub worlds: BTreeMap<String, GameModeTimes>,
}

impl WorldTimes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, world: impl Into<String>, times: GameModeTimes) {
        self.worlds.insert(world.into(), times);
    }

    pub fn get(&self, world: &str) -> Option<&GameModeTimes> {
        self.worlds.get(world)
    }

    pub fn is_empty(&self) -> bool {
        self.worlds.is_empty()
    }

    /// Total play time across every world and mode.
    pub fn total(&self) -> i64 {
        self.worlds.values().map(GameModeTimes::total).sum()
    }

    /// Union of world names; shared worlds reconcile their mode times.
    pub fn merge(mut self, other: WorldTimes) -> WorldTimes {
        for (world, times) in other.worlds {
            self.worlds
                .entry(world)
                .and_modify(|existing| *existing = existing.merge(times))
                .or_insert(times);
        }
        self
    }

    /// Union of world names; shared worlds sum their mode times.
    pub fn add(mut self, other: WorldTimes) -> WorldTimes {
        for (world, times) in other.worlds {
            self.worlds
                .entry(world)
                .and_modify(|existing| *existing = existing.add(times))
                .or_insert(times);
        }
        self
    }
}
