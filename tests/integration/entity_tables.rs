//! Per-table semantics: upsert rules, injection resistance, retention

use std::collections::BTreeMap;

use chrono::Utc;
use playtrack::data::{GeoInfo, UserInfo, WebUser};
use playtrack::storage::Database;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use crate::helpers::{
    mock_user, mock_user2, open_db, player_uuid, player2_uuid, sample_at, seed_principals,
    server_uuid,
};

#[tokio::test]
async fn test_command_usage_counts_never_decrease() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "commands.db").await;

    let mut first = BTreeMap::new();
    first.insert("/plan".to_string(), 1);
    first.insert("/tp".to_string(), 4);
    first.insert("/pla".to_string(), 7);
    db.commands().save_usage(&first).await.unwrap();

    // A later save with a smaller count must not shrink the stored value.
    let mut second = BTreeMap::new();
    second.insert("/tp".to_string(), 6);
    second.insert("/pla".to_string(), 4);
    second.insert("/test".to_string(), 3);
    db.commands().save_usage(&second).await.unwrap();

    let stored = db.commands().all().await.unwrap();
    assert_eq!(stored["/plan"], 1);
    assert_eq!(stored["/tp"], 6);
    assert_eq!(stored["/pla"], 7);
    assert_eq!(stored["/test"], 3);
    db.close().await;
}

#[tokio::test]
async fn test_command_usage_upsert_overwrites_with_latest_larger_count() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "commands2.db").await;

    let mut first = BTreeMap::new();
    first.insert("/a".to_string(), 1);
    db.commands().save_usage(&first).await.unwrap();

    let mut second = BTreeMap::new();
    second.insert("/a".to_string(), 2);
    second.insert("/b".to_string(), 5);
    db.commands().save_usage(&second).await.unwrap();

    let mut expected = BTreeMap::new();
    expected.insert("/a".to_string(), 2);
    expected.insert("/b".to_string(), 5);
    assert_eq!(db.commands().all().await.unwrap(), expected);
    db.close().await;
}

#[tokio::test]
async fn test_nickname_injection_payload_is_stored_verbatim() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "injection.db").await;

    seed_principals(&db).await;
    db.save_user_data(&mock_user2()).await.unwrap();

    let mut data = mock_user();
    data.add_nickname("s); DROP TABLE users;--", 1_400_000);
    db.save_user_data(&data).await.unwrap();

    // The other player's row still exists, so no statement escaped.
    assert!(db.users().exists(player2_uuid()).await.unwrap());

    let loaded = db.fetch_user_data(player_uuid()).await.unwrap().unwrap();
    assert!(loaded.nicknames.contains_key("s); DROP TABLE users;--"));
    db.close().await;
}

#[tokio::test]
async fn test_tps_samples_round_trip_in_time_order() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "tps.db").await;

    seed_principals(&db).await;
    let samples = vec![sample_at(1_000), sample_at(2_000), sample_at(3_000)];
    db.tps().save_all(&samples).await.unwrap();

    assert_eq!(db.tps().all().await.unwrap(), samples);
    db.close().await;
}

#[tokio::test]
async fn test_tps_retention_prunes_exactly_the_expired_sample() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "retention.db").await;

    seed_principals(&db).await;
    let now = Utc::now().timestamp_millis();
    let mut expected = vec![
        sample_at(now),
        sample_at(now - 1_000),
        sample_at(now - 3_000),
        sample_at(now - 690_000 * 1_000),
    ];
    let too_old = sample_at(now - 691_400 * 1_000);

    let mut all = expected.clone();
    all.push(too_old);
    db.tps().save_all(&all).await.unwrap();

    // The sample sitting exactly on the threshold is retained.
    let removed = db
        .tps()
        .clean_before(now - playtrack::storage::tables::tps::RETENTION_MILLIS)
        .await
        .unwrap();
    assert_eq!(removed, 1);

    expected.sort_by_key(|sample| sample.date);
    assert_eq!(db.tps().all().await.unwrap(), expected);
    db.close().await;
}

#[tokio::test]
async fn test_user_data_round_trips_through_save_and_fetch() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "roundtrip.db").await;

    seed_principals(&db).await;
    let data = mock_user();
    db.save_user_data(&data).await.unwrap();

    let loaded = db.fetch_user_data(player_uuid()).await.unwrap().unwrap();
    assert_eq!(loaded, data);

    // Saving again is a merge with the stored copy, so nothing doubles.
    db.save_user_data(&data).await.unwrap();
    let reloaded = db.fetch_user_data(player_uuid()).await.unwrap().unwrap();
    assert_eq!(reloaded, data);
    db.close().await;
}

#[tokio::test]
async fn test_saving_multiple_users_keeps_them_apart() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "multi.db").await;

    seed_principals(&db).await;
    db.save_user_data(&mock_user()).await.unwrap();
    db.save_user_data(&mock_user2()).await.unwrap();

    assert_eq!(
        db.fetch_user_data(player_uuid()).await.unwrap().unwrap(),
        mock_user()
    );
    assert_eq!(
        db.fetch_user_data(player2_uuid()).await.unwrap().unwrap(),
        mock_user2()
    );
    db.close().await;
}

#[tokio::test]
async fn test_geolocation_save_refreshes_last_used() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "geo.db").await;

    seed_principals(&db).await;
    let geo = GeoInfo {
        user: player_uuid(),
        ip_hash: "2f6c57fe".to_string(),
        geolocation: "Germany".to_string(),
        last_used: 1_000,
    };
    db.geolocations().save_all(std::slice::from_ref(&geo)).await.unwrap();

    let refreshed = GeoInfo {
        last_used: 2_000,
        ..geo.clone()
    };
    db.geolocations()
        .save_all(std::slice::from_ref(&refreshed))
        .await
        .unwrap();

    let stored = db.geolocations().for_player(player_uuid()).await.unwrap();
    assert_eq!(stored, vec![refreshed]);
    db.close().await;
}

#[tokio::test]
async fn test_web_users_are_independent_of_players() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "web.db").await;

    let admin = WebUser {
        username: "admin".to_string(),
        password_hash: "$2a$10$abcdefghijklmnopqrstuv".to_string(),
        permission_level: 0,
    };
    db.web_users().save_all(std::slice::from_ref(&admin)).await.unwrap();

    assert_eq!(db.web_users().get("admin").await.unwrap(), Some(admin));
    assert_eq!(db.web_users().get("nobody").await.unwrap(), None);

    db.web_users().remove("admin").await.unwrap();
    assert_eq!(db.web_users().get("admin").await.unwrap(), None);
    db.close().await;
}

#[tokio::test]
async fn test_user_info_is_scoped_per_server() {
    let dir = tempdir().unwrap();
    let db = open_db(&dir, "info.db").await;

    seed_principals(&db).await;
    let info = UserInfo {
        user: player_uuid(),
        server: server_uuid(),
        registered: 1_234_567,
        opped: true,
        banned: false,
    };
    db.user_info().save_all(std::slice::from_ref(&info)).await.unwrap();

    assert_eq!(db.user_info().for_server(server_uuid()).await.unwrap(), vec![info]);
    db.close().await;
}
