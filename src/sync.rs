//! Orchestration of a full-replace sync between two servers.
//!
//! A run opens one connection per side, resolves the table set (explicit
//! list, or every user table of the source), syncs the tables in order and
//! aggregates the per-table results. Runs keep no state between
//! invocations; the only shared piece is the [`SyncGate`], which rejects a
//! second run over the same source/target pair while one is in flight.
//!
//! # Failure handling
//!
//! - A table failure is recorded in its [`SyncResult`] and the run moves on.
//! - Failing to open a connection or to list the source tables aborts the
//!   run before any table is touched.
//! - After a table failure both connections are probed; a dead connection
//!   aborts the remaining tables. Results collected so far are returned.

use crate::error::EngineError;
use crate::schema::SchemaIntrospector;
use crate::status::PROBE_SQL;
use crate::table_sync::{SyncOptions, TableSyncer};
use crate::types::{SyncRequest, SyncResponse, SyncResult};
use firebird_client::{Connection, Connector, ServerConfig};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Single-flight gate keyed by source/target pair.
#[derive(Debug, Default)]
pub struct SyncGate {
    running: Mutex<HashSet<String>>,
}

impl SyncGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` when a run holding it is still in flight.
    pub fn try_acquire(self: &Arc<Self>, key: impl Into<String>) -> Option<SyncPermit> {
        let key = key.into();
        let mut running = self.running.lock();
        if !running.insert(key.clone()) {
            return None;
        }
        Some(SyncPermit {
            gate: Arc::clone(self),
            key,
        })
    }

    pub fn is_running(&self, key: &str) -> bool {
        self.running.lock().contains(key)
    }
}

/// Held for the duration of a run; releases its key when dropped.
#[derive(Debug)]
pub struct SyncPermit {
    gate: Arc<SyncGate>,
    key: String,
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.gate.running.lock().remove(&self.key);
    }
}

/// Gate key of a source/target pair.
pub fn pair_key(source: &ServerConfig, target: &ServerConfig) -> String {
    format!(
        "{}/{} -> {}/{}",
        source.label(),
        source.database,
        target.label(),
        target.database
    )
}

pub struct SyncOrchestrator<C> {
    connector: Arc<C>,
    syncer: TableSyncer,
    gate: Arc<SyncGate>,
}

impl<C: Connector> SyncOrchestrator<C> {
    pub fn new(connector: Arc<C>, options: SyncOptions) -> Self {
        Self {
            connector,
            syncer: TableSyncer::new(options),
            gate: Arc::new(SyncGate::new()),
        }
    }

    /// Share a gate between orchestrators that may target the same servers.
    pub fn with_gate(mut self, gate: Arc<SyncGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn gate(&self) -> &Arc<SyncGate> {
        &self.gate
    }

    /// Run a sync and report per-table outcomes.
    pub async fn sync(&self, request: &SyncRequest) -> SyncResponse {
        info!(
            "Starting sync from {} to {}",
            request.source_config.label(),
            request.target_config.label()
        );

        let mut results = Vec::new();
        let response = match self.run(request, &mut results).await {
            Ok(()) => SyncResponse::completed(results),
            Err(err) => {
                error!("Sync failed: {}", err);
                SyncResponse::aborted(&err, results)
            }
        };

        info!(
            "Sync completed. Success: {}, Tables: {}, Records: {}",
            response.success,
            response.results.len(),
            response.total_records()
        );
        response
    }

    async fn run(
        &self,
        request: &SyncRequest,
        results: &mut Vec<SyncResult>,
    ) -> Result<(), EngineError> {
        let source_config = &request.source_config;
        let target_config = &request.target_config;

        let _permit = self
            .gate
            .try_acquire(pair_key(source_config, target_config))
            .ok_or_else(|| {
                EngineError::Orchestration(format!(
                    "A sync from {} to {} is already in progress",
                    source_config.label(),
                    target_config.label()
                ))
            })?;

        let mut source = self.connector.open(source_config).await?;
        let mut target = self.connector.open(target_config).await?;

        let tables = self.resolve_tables(request).await?;
        info!("Found {} tables to sync", tables.len());

        for table in &tables {
            let result = self
                .syncer
                .sync_table(&mut *source, &mut *target, table)
                .await;
            let failed = !result.success;
            results.push(result);

            if failed {
                ensure_alive(&mut *source).await?;
                ensure_alive(&mut *target).await?;
            }
        }
        Ok(())
    }

    async fn resolve_tables(&self, request: &SyncRequest) -> Result<Vec<String>, EngineError> {
        if let Some(tables) = request.table_names.as_ref().filter(|t| !t.is_empty()) {
            return Ok(tables.clone());
        }

        let listed = SchemaIntrospector::new(Arc::clone(&self.connector))
            .list_tables(&request.source_config)
            .await;
        if !listed.success {
            let message = listed
                .error
                .unwrap_or_else(|| "Failed to get tables list".to_string());
            return Err(EngineError::Orchestration(message));
        }
        Ok(listed.table_names())
    }
}

/// Probe a connection after a table failure; a dead one aborts the run.
async fn ensure_alive(conn: &mut dyn Connection) -> Result<(), EngineError> {
    if let Err(err) = conn.query(PROBE_SQL, Vec::new()).await {
        warn!("Connection probe failed after table error: {:#}", err);
        return Err(EngineError::Orchestration(format!("{err:#}")));
    }
    Ok(())
}
