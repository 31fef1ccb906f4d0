//! Batch copy between two backend instances

use std::collections::BTreeMap;

use assert_matches::assert_matches;
use playtrack::data::{GeoInfo, UserInfo, WebUser};
use playtrack::storage::{BatchCopy, CopyStep, Database, StorageError};
use tempfile::tempdir;

use crate::helpers::{
    mock_user, mock_user2, open_db, player_uuid, sample_at, seed_principals, server_uuid,
};

/// Fill a backend with at least one row in every entity table.
async fn populate(db: &dyn Database) {
    seed_principals(db).await;
    db.save_user_data(&mock_user()).await.unwrap();
    db.save_user_data(&mock_user2()).await.unwrap();

    db.tps()
        .save_all(&[sample_at(1_000), sample_at(2_000)])
        .await
        .unwrap();

    let mut usage = BTreeMap::new();
    usage.insert("/plan".to_string(), 1);
    usage.insert("/help".to_string(), 21);
    db.commands().save_usage(&usage).await.unwrap();

    db.web_users()
        .save_all(&[WebUser {
            username: "admin".to_string(),
            password_hash: "$2a$10$abcdefghijklmnopqrstuv".to_string(),
            permission_level: 0,
        }])
        .await
        .unwrap();

    db.geolocations()
        .save_all(&[GeoInfo {
            user: player_uuid(),
            ip_hash: "2f6c57fe".to_string(),
            geolocation: "Germany".to_string(),
            last_used: 1_000,
        }])
        .await
        .unwrap();

    db.user_info()
        .save_all(&[UserInfo {
            user: player_uuid(),
            server: server_uuid(),
            registered: 1_234_567,
            opped: false,
            banned: false,
        }])
        .await
        .unwrap();
}

#[tokio::test]
async fn test_full_copy_equalizes_every_table() {
    let dir = tempdir().unwrap();
    let source = open_db(&dir, "source.db").await;
    let destination = open_db(&dir, "destination.db").await;

    populate(&source).await;
    BatchCopy::new(&source, &destination)
        .copy_everything()
        .await
        .unwrap();

    assert_eq!(
        source.servers().all().await.unwrap(),
        destination.servers().all().await.unwrap()
    );
    assert_eq!(
        source.users().all().await.unwrap().len(),
        destination.users().all().await.unwrap().len()
    );
    assert_eq!(
        source.worlds().all().await.unwrap(),
        destination.worlds().all().await.unwrap()
    );
    assert_eq!(
        source.tps().all().await.unwrap(),
        destination.tps().all().await.unwrap()
    );
    assert_eq!(
        source.web_users().all().await.unwrap(),
        destination.web_users().all().await.unwrap()
    );
    assert_eq!(
        source.commands().all().await.unwrap(),
        destination.commands().all().await.unwrap()
    );
    assert_eq!(
        source.actions().all().await.unwrap(),
        destination.actions().all().await.unwrap()
    );
    assert_eq!(
        source.geolocations().all().await.unwrap(),
        destination.geolocations().all().await.unwrap()
    );
    assert_eq!(
        source.nicknames().all().await.unwrap().len(),
        destination.nicknames().all().await.unwrap().len()
    );
    assert_eq!(
        source.sessions().all().await.unwrap(),
        destination.sessions().all().await.unwrap()
    );
    assert_eq!(
        source.user_info().all().await.unwrap(),
        destination.user_info().all().await.unwrap()
    );

    // Every session owner resolves to a user present in the destination.
    for session in destination.sessions().all().await.unwrap() {
        assert!(destination.users().exists(session.user).await.unwrap());
    }

    source.close().await;
    destination.close().await;
}

#[tokio::test]
async fn test_copy_overwrites_previous_destination_contents() {
    let dir = tempdir().unwrap();
    let source = open_db(&dir, "source.db").await;
    let destination = open_db(&dir, "destination.db").await;

    populate(&source).await;

    // Pre-existing destination data is cleared, not merged.
    let mut stale = BTreeMap::new();
    stale.insert("/stale".to_string(), 99);
    destination.commands().save_usage(&stale).await.unwrap();

    BatchCopy::new(&source, &destination)
        .copy_everything()
        .await
        .unwrap();

    let commands = destination.commands().all().await.unwrap();
    assert!(!commands.contains_key("/stale"));
    assert_eq!(commands["/help"], 21);

    source.close().await;
    destination.close().await;
}

#[tokio::test]
async fn test_copy_to_same_instance_is_a_no_op() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "same.db").await;

    populate(&db).await;
    let users_before = db.users().all().await.unwrap().len();
    let sessions_before = db.sessions().all().await.unwrap().len();
    let tps_before = db.tps().all().await.unwrap().len();

    let copy = BatchCopy::new(&db, &db);
    copy.copy_everything().await.unwrap();
    // Individually callable steps carry their own guard.
    copy.copy_users().await.unwrap();
    copy.copy_sessions().await.unwrap();

    assert_eq!(db.users().all().await.unwrap().len(), users_before);
    assert_eq!(db.sessions().all().await.unwrap().len(), sessions_before);
    assert_eq!(db.tps().all().await.unwrap().len(), tps_before);
    db.close().await;
}

#[tokio::test]
async fn test_closed_destination_aborts_at_the_clear_step() {
    let dir = tempdir().unwrap();
    let source = open_db(&dir, "source.db").await;
    let destination = open_db(&dir, "destination.db").await;

    populate(&source).await;
    destination.close().await;

    let err = BatchCopy::new(&source, &destination)
        .copy_everything()
        .await
        .unwrap_err();
    assert_matches!(
        err,
        StorageError::MigrationAborted {
            step: CopyStep::ClearDestination,
            ..
        }
    );

    // The source is untouched by the failed copy.
    assert!(!source.users().all().await.unwrap().is_empty());
    source.close().await;
}

#[tokio::test]
async fn test_mid_sequence_failure_leaves_earlier_steps_committed() {
    let dir = tempdir().unwrap();
    let source = open_db(&dir, "source.db").await;
    let destination = open_db(&dir, "destination.db").await;

    populate(&source).await;
    populate(&destination).await;

    // The destination clear succeeds, then the first read from the closed
    // source fails: the wipe stays committed, later steps never run.
    source.close().await;

    let err = BatchCopy::new(&source, &destination)
        .copy_everything()
        .await
        .unwrap_err();
    assert_matches!(
        err,
        StorageError::MigrationAborted {
            step: CopyStep::Servers,
            ..
        }
    );

    assert!(destination.users().all().await.unwrap().is_empty());
    assert!(destination.sessions().all().await.unwrap().is_empty());
    destination.close().await;
}
