//! One module per record kind
//!
//! Every table handle holds the shared [`DbHandle`](super::connection::DbHandle)
//! and checks the pool out per call; no handle caches a connection. All text
//! parameters are bound, never spliced, so adversarial content (nicknames,
//! command labels) cannot reach the statement text.

pub mod actions;
pub mod commands;
pub mod geolocations;
pub mod nicknames;
pub mod servers;
pub mod sessions;
pub mod tps;
pub mod user_info;
pub mod users;
pub mod web_users;
pub mod worlds;

pub use actions::ActionTable;
pub use commands::CommandUsageTable;
pub use geolocations::GeoTable;
pub use nicknames::NicknameTable;
pub use servers::ServerTable;
pub use sessions::SessionTable;
pub use tps::TpsTable;
pub use user_info::UserInfoTable;
pub use users::UserTable;
pub use web_users::WebUserTable;
pub use worlds::WorldTable;

use uuid::Uuid;

use super::error::{StorageError, StorageResult};

pub(crate) fn parse_uuid(value: &str) -> StorageResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| StorageError::Serialization(format!("invalid uuid '{}': {}", value, e)))
}
