//! Connection Gate and Rule File Tests
//!
//! 1. Connection refusal through the host's authentication hook
//! 2. Rule file persistence and use by the engine

use std::sync::Arc;

use simula::config::{GlobalSettings, SimulaConfig};
use simula::core::{CoreError, ErrorLevel};
use simula::gate::{AuthStatus, ConnectionInfo};
use simula::host::Host;
use simula::rules::{FileRuleStore, MemRuleStore, RuleAdmin, RuleRow, RuleStore};
use tempfile::TempDir;

fn refusing_host() -> Host {
    let settings = Arc::new(GlobalSettings::new());
    settings.set_connections_refused(true);
    Host::builder(Arc::new(MemRuleStore::new()))
        .settings(settings)
        .build()
}

// =============================================================================
// CONNECTION GATE
// =============================================================================

/// Test: every connection is refused while refusal is on.
#[test]
fn test_refused_connection_reports_simula() {
    let host = refusing_host();

    for status in [AuthStatus::Ok, AuthStatus::Failed] {
        let err = host
            .connect(ConnectionInfo::new("alice"), status)
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::ConnectionRefused(_)));
        assert_eq!(err.to_string(), "authentication failed by simula");
        assert_eq!(err.level(), ErrorLevel::Fatal);
    }
    assert_eq!(host.metrics().snapshot().connections_refused, 2);
}

/// Test: a client that went away before authenticating is closed silently.
#[test]
fn test_eof_connection_closed_silently() {
    let host = refusing_host();
    let err = host
        .connect(ConnectionInfo::new("alice"), AuthStatus::Eof)
        .err()
        .unwrap();

    assert!(matches!(err, CoreError::ConnectionClosed));
    assert_eq!(host.metrics().snapshot().connections_refused, 0);
}

/// Test: turning refusal off lets new connections through; open sessions are
/// never affected.
#[test]
fn test_refusal_applies_to_new_connections_only() {
    let host = Host::builder(Arc::new(MemRuleStore::new())).build();
    let session = host
        .connect(ConnectionInfo::new("alice"), AuthStatus::Ok)
        .unwrap();

    host.settings().set_connections_refused(true);
    assert!(host
        .connect(ConnectionInfo::new("bob"), AuthStatus::Ok)
        .is_err());
    assert!(!session.is_closed());

    host.settings().set_connections_refused(false);
    assert!(host
        .connect(ConnectionInfo::new("bob"), AuthStatus::Ok)
        .is_ok());
}

// =============================================================================
// RULE FILE
// =============================================================================

/// Test: rules written by one store instance are read back by another.
#[test]
fn test_rule_file_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rules.json");

    {
        let store = FileRuleStore::new(&path);
        let admin = RuleAdmin::new(&store);
        admin.add_rule("DROP TABLE", "fail", 0).unwrap();
        admin.add_rule("COMMIT", "wait", 5).unwrap();
    }

    let store = FileRuleStore::new(&path);
    assert_eq!(
        store.list_all().unwrap(),
        vec![
            RuleRow::new("DROP TABLE", "fail", 0),
            RuleRow::new("COMMIT", "delay", 5),
        ]
    );
}

/// Test: a host built from configuration reads its rules from the rule file.
#[tokio::test]
async fn test_host_from_config_uses_rule_file() {
    let dir = TempDir::new().unwrap();
    let rules_path = dir.path().join("rules.json");
    RuleAdmin::new(&FileRuleStore::new(&rules_path))
        .add_rule("DELETE", "fail", 0)
        .unwrap();

    let config = SimulaConfig::from_json(
        &serde_json::json!({
            "simulation_enabled": true,
            "rules_path": rules_path,
        })
        .to_string(),
    )
    .unwrap();

    let host = Host::from_config(&config);
    let mut session = host
        .connect(ConnectionInfo::new("alice"), AuthStatus::Ok)
        .unwrap();

    assert!(session.execute("DELETE FROM t").await.unwrap_err().is_injected());
    assert!(session.execute("SELECT 1").await.is_ok());
}

/// Test: a missing rule directory means the feature is not installed.
#[tokio::test]
async fn test_missing_rule_directory_is_uninstalled() {
    let dir = TempDir::new().unwrap();
    let store = FileRuleStore::new(dir.path().join("absent").join("rules.json"));
    assert!(!store.is_installed());

    let settings = Arc::new(GlobalSettings::new());
    settings.set_simulation_enabled(true);
    let host = Host::builder(Arc::new(store)).settings(settings).build();
    let mut session = host
        .connect(ConnectionInfo::new("alice"), AuthStatus::Ok)
        .unwrap();

    assert!(session.execute("DROP TABLE x").await.is_ok());
}
