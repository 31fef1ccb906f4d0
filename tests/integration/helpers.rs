//! Helper functions for integration tests

use playtrack::data::time::GameModeTimes;
use playtrack::data::{Kill, ServerRecord, Session, TpsSample, UserData, UserRecord};
use playtrack::storage::{Database, SqliteDb};
use tempfile::TempDir;
use uuid::Uuid;

pub fn player_uuid() -> Uuid {
    Uuid::parse_str("45b0dfcd-39f2-4a05-9ec9-0fdd747a8b52").unwrap()
}

pub fn player2_uuid() -> Uuid {
    Uuid::parse_str("ab969f85-e8c9-43b7-9502-7adb8f6c49ef").unwrap()
}

pub fn server_uuid() -> Uuid {
    Uuid::parse_str("e4ec2edd-e0ed-4c4f-b1e4-6ba026c5ff28").unwrap()
}

/// Open a fresh SQLite backend in the given directory.
pub async fn open_db(dir: &TempDir, name: &str) -> SqliteDb {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let db = SqliteDb::new(dir.path().join(name));
    db.open().await.expect("backend failed to open");
    db
}

pub fn test_server() -> ServerRecord {
    ServerRecord {
        id: server_uuid(),
        name: "Test Server".to_string(),
        web_address: "http://localhost:8804".to_string(),
    }
}

/// A player with one session (world times + a kill) and a nickname, the
/// smallest aggregate that touches every table the aggregate spans.
pub fn mock_user() -> UserData {
    let mut data = UserData::new(UserRecord::new(player_uuid(), "TestPlayer", 1_234_567));

    let mut session = Session::new(player_uuid(), 1_286_349, 2_342_978);
    session
        .world_times
        .set("World", GameModeTimes::new(5, 10, 15, 20));
    session.add_kill(Kill {
        victim: player2_uuid(),
        count: 2,
        weapon: "DiamondSword".to_string(),
        date: 75_843_759,
    });
    data.add_session(session);
    data.add_nickname("TestNick", 1_300_000);

    data
}

pub fn mock_user2() -> UserData {
    let mut data = UserData::new(UserRecord::new(player2_uuid(), "OtherPlayer", 2_345_678));
    data.add_session(Session::new(player2_uuid(), 2_348_743, 4_839_673));
    data.add_nickname("Alright", 2_400_000);
    data
}

pub fn sample_at(date: i64) -> TpsSample {
    TpsSample {
        server: server_uuid(),
        date,
        tps: 19.7,
        players: 12,
        cpu_usage: 31.5,
        ram_usage: 51_231_251_254,
        entities: 6_123,
        chunks: 2_134,
    }
}

/// Register the players and server that the mock aggregates reference, so
/// foreign keys hold.
pub async fn seed_principals(db: &dyn Database) {
    db.servers()
        .save_all(std::slice::from_ref(&test_server()))
        .await
        .unwrap();
    db.users()
        .save_all(&[mock_user().record, mock_user2().record])
        .await
        .unwrap();
}
