//! The per-player aggregate and its reconciliation logic
//!
//! A player's data is physically normalized into several tables but treated
//! as one unit here: the canonical row ([`UserRecord`]) plus sessions and
//! nicknames. Two partial representations of the same player (a live
//! in-memory snapshot and the persisted copy, or rows from two sources) are
//! combined with [`UserData::merge`], which never loses or duplicates data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::session::Session;
use super::time::WorldTimes;

/// Canonical per-player row. The UUID is the global join key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uuid: Uuid,
    pub name: String,

    /// Epoch millis of first registration.
    pub registered: i64,

    pub times_kicked: i32,
}

impl UserRecord {
    pub fn new(uuid: Uuid, name: impl Into<String>, registered: i64) -> Self {
        Self {
            uuid,
            name: name.into(),
            registered,
            times_kicked: 0,
        }
    }

    /// Reconcile two rows for the same player.
    ///
    /// Registration keeps the earlier timestamp, the kick counter takes the
    /// maximum (never the sum, which would double-count across merges), and
    /// a name conflict resolves to the lexicographically greater non-empty
    /// name so that the operation stays commutative.
    pub fn merge(self, other: UserRecord) -> UserRecord {
        debug_assert_eq!(self.uuid, other.uuid);

        let name = match (self.name.is_empty(), other.name.is_empty()) {
            (true, _) => other.name,
            (_, true) => self.name,
            _ => self.name.max(other.name),
        };

        UserRecord {
            uuid: self.uuid,
            name,
            registered: self.registered.min(other.registered),
            times_kicked: self.times_kicked.max(other.times_kicked),
        }
    }
}

/// The full logical record for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub record: UserRecord,

    /// Sessions keyed by start timestamp; identical starts are the same
    /// session.
    pub sessions: BTreeMap<i64, Session>,

    /// Nickname text to first-seen epoch millis.
    pub nicknames: BTreeMap<String, i64>,
}

impl UserData {
    pub fn new(record: UserRecord) -> Self {
        Self {
            record,
            sessions: BTreeMap::new(),
            nicknames: BTreeMap::new(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        self.record.uuid
    }

    pub fn add_session(&mut self, session: Session) {
        debug_assert_eq!(session.user, self.record.uuid);
        match self.sessions.remove(&session.start) {
            Some(existing) => {
                let start = session.start;
                self.sessions.insert(start, existing.merge(session));
            }
            None => {
                self.sessions.insert(session.start, session);
            }
        }
    }

    pub fn add_nickname(&mut self, nickname: impl Into<String>, first_seen: i64) {
        let entry = self.nicknames.entry(nickname.into()).or_insert(first_seen);
        *entry = (*entry).min(first_seen);
    }

    /// Lifetime per-world play time, derived by summing every session.
    pub fn lifetime_world_times(&self) -> WorldTimes {
        self.sessions
            .values()
            .fold(WorldTimes::new(), |acc, session| {
                acc.add(session.world_times.clone())
            })
    }

    /// Combine two representations of the same player without data loss or
    /// duplication. Commutative and idempotent.
    pub fn merge(mut self, other: UserData) -> UserData {
        debug_assert_eq!(self.record.uuid, other.record.uuid);

        self.record = self.record.merge(other.record);

        for (start, session) in other.sessions {
            match self.sessions.remove(&start) {
                Some(existing) => {
                    self.sessions.insert(start, existing.merge(session));
                }
                None => {
                    self.sessions.insert(start, session);
                }
            }
        }

        for (nickname, first_seen) in other.nicknames {
            let entry = self.nicknames.entry(nickname).or_insert(first_seen);
            *entry = (*entry).min(first_seen);
        }

        self
    }
}
