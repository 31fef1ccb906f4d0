//! Domain data types for player analytics
//!
//! Everything a game server tracks about its players lives here: the
//! per-player aggregate ([`user::UserData`]), play sessions with their
//! world/game-mode time breakdowns and kills, and the standalone row types
//! (servers, performance samples, geolocations, web-panel users, action log).
//!
//! The merge logic for reconciling two snapshots of the same player is
//! implemented on these types directly; it is commutative and idempotent so
//! that repeated reconciliation (e.g. before every save) never double-counts.

pub mod records;
pub mod session;
pub mod time;
pub mod user;

pub use records::{
    ActionLogEntry, ActionType, GeoInfo, Nickname, ServerRecord, TpsSample, UserInfo, WebUser,
};
pub use session::{Kill, Session};
pub use time::{GameModeTimes, WorldTimes};
pub use user::{UserData, UserRecord};
