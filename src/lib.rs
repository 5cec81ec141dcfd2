//! firebird-sync library
//!
//! Mirrors tables from a source Firebird server to a target one by full
//! replacement, and reports server liveness and schema on the way.
//!
//! # Components
//!
//! - [`StatusChecker`] - Per-server liveness with response time
//! - [`SchemaIntrospector`] - User tables and columns from the system catalog
//! - [`TableSyncer`] - Clear-and-reload of one table
//! - [`SyncOrchestrator`] - Batch of tables with per-table outcomes
//!
//! All operations return result records; failures travel inside them as a
//! message and an [`ErrorKind`] instead of escaping as errors.
//!
//! # CLI Usage
//!
//! ```bash
//! # Liveness of both servers
//! firebird-sync status --a-host fb1 --a-database /dbs/a.fdb --b-host fb2 --b-database /dbs/b.fdb
//!
//! # Mirror two tables from A to B
//! firebird-sync --config servers.toml sync --tables ORDERS,CUSTOMERS
//! ```

pub mod config;
pub mod error;
pub mod schema;
pub mod status;
pub mod sync;
pub mod table_sync;
pub mod testing;
pub mod types;

pub use config::{ServerAOpts, ServerBOpts, Settings};
pub use error::{EngineError, ErrorKind};
pub use schema::SchemaIntrospector;
pub use status::StatusChecker;
pub use sync::{SyncGate, SyncOrchestrator};
pub use table_sync::{SyncOptions, TableSyncer};
pub use types::{
    HealthStatus, ServerStatus, ServerStatusResponse, ServerTables, SyncRequest, SyncResponse,
    SyncResult, TablesPairResponse, TablesResult,
};

pub use firebird_client::{FirebirdConnector, ServerConfig};
pub use firebird_types::{ColumnInfo, TableInfo};
