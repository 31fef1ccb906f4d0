//! Hotswap validation and failure paths
//!
//! The success path needs a reachable MySQL server, which the test
//! environment does not have; validation, probe-failure and copy-failure
//! paths are covered end to end instead.

use std::sync::Arc;

use assert_matches::assert_matches;
use playtrack::admin::{self, HotswapOutcome};
use playtrack::config::{BackendKind, Config};
use playtrack::context::{AppContext, ReloadSignal};
use playtrack::storage::MySqlSettings;
use tempfile::tempdir;

fn sqlite_config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.database.sqlite_file = dir.path().join("analytics.db");
    config
}

fn unreachable_mysql() -> MySqlSettings {
    serde_json::from_str(
        r#"{
            "host": "127.0.0.1",
            "port": 1,
            "database": "analytics",
            "username": "tracker",
            "password": "secret",
            "acquire_timeout_secs": 1
        }"#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_unknown_backend_is_rejected_without_state_change() {
    let dir = tempdir().unwrap();
    let ctx = AppContext::new(dir.path().join("config.json"), sqlite_config(&dir)).unwrap();

    let outcome = admin::hotswap(&ctx, "postgres").await;
    assert_matches!(outcome, HotswapOutcome::UnknownBackend { .. });
    assert_eq!(ctx.config().await.database.backend, BackendKind::Sqlite);
}

#[tokio::test]
async fn test_swapping_to_the_active_backend_is_rejected() {
    let dir = tempdir().unwrap();
    let ctx = AppContext::new(dir.path().join("config.json"), sqlite_config(&dir)).unwrap();

    let outcome = admin::hotswap(&ctx, "sqlite").await;
    assert_matches!(
        outcome,
        HotswapOutcome::AlreadyActive {
            backend: BackendKind::Sqlite
        }
    );
}

#[tokio::test]
async fn test_unconfigured_target_is_reported_not_swapped() {
    let dir = tempdir().unwrap();
    let ctx = AppContext::new(dir.path().join("config.json"), sqlite_config(&dir)).unwrap();

    // No mysql section in the configuration.
    let outcome = admin::hotswap(&ctx, "mysql").await;
    assert_matches!(outcome, HotswapOutcome::NotConfigured { .. });
    assert_eq!(ctx.config().await.database.backend, BackendKind::Sqlite);
}

#[tokio::test]
async fn test_unreachable_target_fails_the_probe() {
    let dir = tempdir().unwrap();
    let mut config = sqlite_config(&dir);
    config.database.mysql = Some(unreachable_mysql());
    let ctx = AppContext::new(dir.path().join("config.json"), config).unwrap();

    let outcome = admin::hotswap(&ctx, "mysql").await;
    assert_matches!(
        outcome,
        HotswapOutcome::ProbeFailed {
            backend: BackendKind::Mysql,
            ..
        }
    );
    assert!(!outcome.is_success());
    assert_eq!(ctx.config().await.database.backend, BackendKind::Sqlite);
}

#[tokio::test]
async fn test_failed_copy_leaves_configuration_untouched() {
    let dir = tempdir().unwrap();
    let mut config = sqlite_config(&dir);
    config.database.backend = BackendKind::Mysql;
    config.database.mysql = Some(unreachable_mysql());
    let ctx = AppContext::new(dir.path().join("config.json"), config).unwrap();

    // The active (mysql) source was never opened, so the copy's first read
    // fails after the destination wipe; the selection must stay mysql.
    let outcome = admin::hotswap(&ctx, "sqlite").await;
    assert_matches!(
        outcome,
        HotswapOutcome::CopyFailed {
            backend: BackendKind::Sqlite,
            ..
        }
    );
    assert_eq!(ctx.config().await.database.backend, BackendKind::Mysql);
}

#[cfg(debug_assertions)]
#[tokio::test]
async fn test_debug_probe_and_reload_features() {
    use playtrack::storage::Database;

    let dir = tempdir().unwrap();
    let ctx = Arc::new(
        AppContext::new(dir.path().join("config.json"), sqlite_config(&dir)).unwrap(),
    );

    ctx.database().await.open().await.unwrap();
    let mut reload_rx = ctx.subscribe_reload();

    let report = admin::test_feature(&ctx, "probe").await.unwrap();
    assert!(report.contains("version"));

    admin::test_feature(&ctx, "reload").await.unwrap();
    assert_eq!(reload_rx.recv().await.unwrap(), ReloadSignal::BackendChanged);

    assert!(admin::test_feature(&ctx, "bogus").await.is_err());
    ctx.database().await.close().await;
}
