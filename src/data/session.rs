//! Play sessions and the kills recorded during them

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::time::WorldTimes;

/// A player kill: who was killed, with what, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kill {
    pub victim: Uuid,
    pub count: u32,
    pub weapon: String,

    /// Epoch millis of the kill.
    pub date: i64,
}

/// One play session of one player. Append-only once closed.
///
/// Two sessions of the same player with the same start are the same session;
/// the start timestamp is the union key everywhere sessions are reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The owning player.
    pub user: Uuid,

    /// Epoch millis when the session started.
    pub start: i64,

    /// Epoch millis when the session ended.
    pub end: i64,

    /// Time spent per world and game mode during this session.
    pub world_times: WorldTimes,

    /// Kills during this session, keyed by (victim, timestamp).
    pub kills: BTreeMap<(Uuid, i64), Kill>,
}

impl Session {
    pub fn new(user: Uuid, start: i64, end: i64) -> Self {
        Self {
            user,
            start,
            end,
            world_times: WorldTimes::new(),
            kills: BTreeMap::new(),
        }
    }

    pub fn add_kill(&mut self, kill: Kill) {
        self.kills.insert((kill.victim, kill.date), kill);
    }

    pub fn length(&self) -> i64 {
        self.end - self.start
    }

    /// Reconcile two records of the same session (same owner, same start).
    ///
    /// The later end wins, world times reconcile per world, kills union by
    /// key. Idempotent: merging a session with itself changes nothing.
    pub fn merge(mut self, other: Session) -> Session {
        debug_assert_eq!(self.user, other.user);
        debug_assert_eq!(self.start, other.start);

        self.end = self.end.max(other.end);
        self.world_times = self.world_times.merge(other.world_times);
        for (key, kill) in other.kills {
            self.kills.entry(key).or_insert(kill);
        }
        self
    }
}
