//! Server liveness checks against the in-memory backend.

use firebird_sync::testing::fixtures::{source_config, target_config, SOURCE_HOST, TARGET_HOST};
use firebird_sync::testing::{MemoryConnector, MemoryServer};
use firebird_sync::{ErrorKind, ServerConfig, StatusChecker};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_online_server() {
    let server = MemoryServer::new();
    let connector = MemoryConnector::new().with_server(SOURCE_HOST, server.clone());
    let checker = StatusChecker::new(Arc::new(connector));

    let status = checker.check(&source_config()).await;

    assert!(status.online);
    assert_eq!(status.host, "fb-source:3050");
    assert_eq!(status.error, None);
    assert_eq!(status.error_kind, None);
    assert_eq!(server.statements(), vec!["SELECT 1 FROM RDB$DATABASE"]);
    assert_eq!(server.open_connections(), 0);
}

#[tokio::test]
async fn test_response_time_excludes_close() {
    let server = MemoryServer::new();
    server.set_close_delay(Duration::from_millis(500));
    let connector = MemoryConnector::new().with_server(SOURCE_HOST, server.clone());
    let checker = StatusChecker::new(Arc::new(connector));

    let status = checker.check(&source_config()).await;

    assert!(status.online);
    assert!(status.response_time < 500, "took {}ms", status.response_time);
    assert_eq!(server.open_connections(), 0);
}

#[tokio::test]
async fn test_unreachable_host_is_offline() {
    let checker = StatusChecker::new(Arc::new(MemoryConnector::new()));
    let config = ServerConfig::new("nowhere", "/dbs/a.fdb", "SYSDBA", "masterkey").with_port(3051);

    let status = checker.check(&config).await;

    assert!(!status.online);
    assert_eq!(status.host, "nowhere:3051");
    assert_eq!(
        status.error.as_deref(),
        Some("Unable to complete network request to host \"nowhere\"")
    );
    assert_eq!(status.error_kind, Some(ErrorKind::Connection));
}

#[tokio::test]
async fn test_refused_login_is_offline() {
    let server = MemoryServer::new();
    server.set_unreachable("Your user name and password are not defined");
    let connector = MemoryConnector::new().with_server(SOURCE_HOST, server.clone());
    let checker = StatusChecker::new(Arc::new(connector));

    let status = checker.check(&source_config()).await;

    assert!(!status.online);
    assert_eq!(
        status.error.as_deref(),
        Some("Your user name and password are not defined")
    );
    assert_eq!(server.opened_total(), 0);
}

#[tokio::test]
async fn test_failing_probe_is_offline() {
    let server = MemoryServer::new();
    server.fail_statement("SELECT 1", "I/O error during read");
    let connector = MemoryConnector::new().with_server(SOURCE_HOST, server.clone());
    let checker = StatusChecker::new(Arc::new(connector));

    let status = checker.check(&source_config()).await;

    assert!(!status.online);
    assert_eq!(status.error.as_deref(), Some("I/O error during read"));
    assert_eq!(status.error_kind, Some(ErrorKind::CatalogQuery));
    assert_eq!(server.open_connections(), 0);
}

#[tokio::test]
async fn test_pair_reports_each_server() {
    let connector = MemoryConnector::new().with_server(SOURCE_HOST, MemoryServer::new());
    let checker = StatusChecker::new(Arc::new(connector));

    let response = checker.check_pair(&source_config(), &target_config()).await;

    assert!(response.success);
    assert!(response.server_a.online);
    assert!(!response.server_b.online);
    assert!(response.server_b.error.as_deref().unwrap().contains(TARGET_HOST));
    assert_eq!(response.offline_servers(), vec!["Server B"]);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["serverA"]["online"], true);
    assert!(json["serverB"]["responseTime"].is_u64());
}
