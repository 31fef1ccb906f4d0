//! Backend lifecycle: open/close idempotence, version probe, full wipe,
//! account removal

use assert_matches::assert_matches;
use playtrack::storage::{Database, SqliteDb, StorageError};
use tempfile::tempdir;

use crate::helpers::{mock_user, open_db, player_uuid, player2_uuid, seed_principals};

#[tokio::test]
async fn test_open_close_open_succeeds() {
    let dir = tempdir().unwrap();
    let db = SqliteDb::new(dir.path().join("lifecycle.db"));

    assert!(db.open().await.unwrap());
    db.close().await;
    assert!(db.open().await.unwrap());
    db.close().await;
}

#[tokio::test]
async fn test_version_probe_succeeds_only_while_open() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "probe.db").await;

    let version = db.get_version().await.unwrap();
    assert!(!version.is_empty());

    db.close().await;
    assert_matches!(db.get_version().await, Err(StorageError::Closed));
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "persist.db").await;

    seed_principals(&db).await;
    db.save_user_data(&mock_user()).await.unwrap();
    db.close().await;

    db.open().await.unwrap();
    let loaded = db.fetch_user_data(player_uuid()).await.unwrap();
    assert_eq!(loaded, Some(mock_user()));
    db.close().await;
}

#[tokio::test]
async fn test_remove_all_data_empties_every_table() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "wipe.db").await;

    seed_principals(&db).await;
    db.save_user_data(&mock_user()).await.unwrap();

    let mut usage = std::collections::BTreeMap::new();
    usage.insert("/plan".to_string(), 1);
    usage.insert("/tp".to_string(), 4);
    usage.insert("/help".to_string(), 21);
    db.commands().save_usage(&usage).await.unwrap();

    db.remove_all_data().await.unwrap();

    assert!(db.fetch_user_data(player_uuid()).await.unwrap().is_none());
    assert!(db.commands().all().await.unwrap().is_empty());
    assert!(db.servers().all().await.unwrap().is_empty());
    assert!(db.sessions().all().await.unwrap().is_empty());

    // The wipe clears data, not the schema; the backend stays usable.
    let version = db.get_version().await.unwrap();
    assert!(!version.is_empty());
    db.close().await;
}

#[tokio::test]
async fn test_remove_account_deletes_one_player_only() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "remove.db").await;

    seed_principals(&db).await;
    db.save_user_data(&mock_user()).await.unwrap();
    db.save_user_data(&crate::helpers::mock_user2()).await.unwrap();

    db.remove_account(player_uuid()).await.unwrap();

    assert!(!db.users().exists(player_uuid()).await.unwrap());
    assert!(db.fetch_user_data(player_uuid()).await.unwrap().is_none());
    assert!(db.users().exists(player2_uuid()).await.unwrap());
    db.close().await;
}
