//! Result records produced by the engine.
//!
//! Field names serialize in camelCase (`responseTime`, `tableName`,
//! `recordsSynced`) since consumers read these records as plain JSON.

use crate::error::{EngineError, ErrorKind};
use chrono::{DateTime, Utc};
use firebird_client::ServerConfig;
use firebird_types::TableInfo;
use serde::{Deserialize, Serialize};

/// Liveness of one server, produced fresh on every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    /// `host:port`
    pub host: String,
    pub online: bool,
    /// Milliseconds until success or until the failure point
    pub response_time: u64,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

/// Status of the two configured servers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatusResponse {
    pub server_a: ServerStatus,
    pub server_b: ServerStatus,
    pub success: bool,
    pub message: Option<String>,
}

impl ServerStatusResponse {
    /// Display labels of the servers that are offline.
    pub fn offline_servers(&self) -> Vec<&'static str> {
        let mut offline = Vec::new();
        if !self.server_a.online {
            offline.push("Server A");
        }
        if !self.server_b.online {
            offline.push("Server B");
        }
        offline
    }
}

/// Outcome of schema introspection. Never holds a partial table list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablesResult {
    pub success: bool,
    pub tables: Vec<TableInfo>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl TablesResult {
    pub fn ok(tables: Vec<TableInfo>) -> Self {
        Self {
            success: true,
            tables,
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(err: &EngineError) -> Self {
        Self {
            success: false,
            tables: Vec::new(),
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }
}

/// Introspection result labelled with the server host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTables {
    pub host: String,
    #[serde(flatten)]
    pub result: TablesResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablesPairResponse {
    pub server_a: ServerTables,
    pub server_b: ServerTables,
}

/// Outcome of one table's sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub table_name: String,
    pub success: bool,
    /// Rows inserted into the target that remain there
    pub records_synced: u64,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl SyncResult {
    pub fn ok(table_name: impl Into<String>, records_synced: u64) -> Self {
        Self {
            table_name: table_name.into(),
            success: true,
            records_synced,
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(table_name: impl Into<String>, records_synced: u64, err: &EngineError) -> Self {
        Self {
            table_name: table_name.into(),
            success: false,
            records_synced,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }
}

/// Aggregated outcome of a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    /// True iff every table result succeeded
    pub success: bool,
    pub message: String,
    pub results: Vec<SyncResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl SyncResponse {
    pub const COMPLETED: &'static str = "Sync completed successfully";
    pub const COMPLETED_WITH_ERRORS: &'static str = "Sync completed with errors";

    /// Response for a run that went through every table.
    pub fn completed(results: Vec<SyncResult>) -> Self {
        let success = results.iter().all(|r| r.success);
        let message = if success {
            Self::COMPLETED
        } else {
            Self::COMPLETED_WITH_ERRORS
        };
        Self {
            success,
            message: message.to_string(),
            results,
            error_kind: None,
        }
    }

    /// Response for a run aborted by `err`, keeping the results collected so far.
    pub fn aborted(err: &EngineError, results: Vec<SyncResult>) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            results,
            error_kind: Some(err.kind()),
        }
    }

    pub fn total_records(&self) -> u64 {
        self.results.iter().map(|r| r.records_synced).sum()
    }
}

/// A sync invocation: source, target and an optional table list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub source_config: ServerConfig,
    pub target_config: ServerConfig,
    /// Empty or absent means every user table of the source
    #[serde(default)]
    pub table_names: Option<Vec<String>>,
}

impl SyncRequest {
    pub fn new(source_config: ServerConfig, target_config: ServerConfig) -> Self {
        Self {
            source_config,
            target_config,
            table_names: None,
        }
    }

    pub fn with_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table_names = Some(tables.into_iter().map(Into::into).collect());
        self
    }
}

/// Trivial liveness payload of the process itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn now() -> Self {
        Self {
            status: "Healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}
