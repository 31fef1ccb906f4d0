//! Standalone row types stored by the entity tables

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One game-server or proxy instance known to the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: Uuid,
    pub name: String,
    pub web_address: String,
}

/// A single performance sample of a running game server.
///
/// Append-only time series, subject to retention pruning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TpsSample {
    pub server: Uuid,

    /// Epoch millis when the sample was taken.
    pub date: i64,

    /// Ticks per second at sampling time.
    pub tps: f64,

    pub players: i32,
    pub cpu_usage: f64,
    pub ram_usage: i64,
    pub entities: i32,
    pub chunks: i32,
}

/// Resolved geolocation for one (player, ip-hash) pair.
///
/// Saving the same pair again refreshes `last_used`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub user: Uuid,
    pub ip_hash: String,
    pub geolocation: String,
    pub last_used: i64,
}

/// A web-panel login, independent of game-player identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebUser {
    pub username: String,
    pub password_hash: String,
    pub permission_level: i32,
}

/// A nickname a player has used. Unique per (player, nickname), not globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nickname {
    pub user: Uuid,
    pub nickname: String,

    /// Epoch millis the nickname was first seen; the earlier value wins on
    /// conflict.
    pub first_seen: i64,
}

/// Kinds of tracked player actions in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    FirstLogin,
    NewNickname,
    KilledPlayer,
    Punished,
    Unknown,
}

impl ActionType {
    pub fn id(self) -> i32 {
        match self {
            ActionType::FirstLogin => 1,
            ActionType::NewNickname => 2,
            ActionType::KilledPlayer => 3,
            ActionType::Punished => 4,
            ActionType::Unknown => 0,
        }
    }

    pub fn from_id(id: i32) -> ActionType {
        match id {
            1 => ActionType::FirstLogin,
            2 => ActionType::NewNickname,
            3 => ActionType::KilledPlayer,
            4 => ActionType::Punished,
            _ => ActionType::Unknown,
        }
    }
}

/// One append-only audit trail entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub user: Uuid,
    pub server: Uuid,
    pub action: ActionType,

    /// Epoch millis when the action happened.
    pub date: i64,

    pub extra_info: String,
}

/// Per-user aggregate info scoped to one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user: Uuid,
    pub server: Uuid,
    pub registered: i64,
    pub opped: bool,
    pub banned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_ids_round_trip() {
        for action in [
            ActionType::FirstLogin,
            ActionType::NewNickname,
            ActionType::KilledPlayer,
            ActionType::Punished,
        ] {
            assert_eq!(ActionType::from_id(action.id()), action);
        }
        assert_eq!(ActionType::from_id(99), ActionType::Unknown);
    }
}
