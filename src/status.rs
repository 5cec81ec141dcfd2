//! Server liveness checks.
//!
//! A check opens a connection, runs a catalog round-trip that touches no
//! user data and reports the elapsed time. Failures are captured in the
//! returned [`ServerStatus`]; checking never fails.

use crate::error::EngineError;
use crate::types::{ServerStatus, ServerStatusResponse};
use firebird_client::{Connector, ServerConfig};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Round-trip query valid on any reachable, authenticated server.
pub const PROBE_SQL: &str = "SELECT 1 FROM RDB$DATABASE";

pub struct StatusChecker<C> {
    connector: Arc<C>,
}

impl<C: Connector> StatusChecker<C> {
    pub fn new(connector: Arc<C>) -> Self {
        Self { connector }
    }

    /// Check one server.
    pub async fn check(&self, config: &ServerConfig) -> ServerStatus {
        let host = config.label();
        info!("Checking server status for {}", host);

        let (response_time, outcome) = self.probe(config).await;

        match outcome {
            Ok(()) => {
                info!("Server {} is online (Response: {}ms)", host, response_time);
                ServerStatus {
                    host,
                    online: true,
                    response_time,
                    error: None,
                    error_kind: None,
                }
            }
            Err(err) => {
                error!("Server {} check failed: {}", host, err);
                ServerStatus {
                    host,
                    online: false,
                    response_time,
                    error: Some(err.to_string()),
                    error_kind: Some(err.kind()),
                }
            }
        }
    }

    /// Check both servers concurrently and return once both have finished.
    pub async fn check_pair(
        &self,
        server_a: &ServerConfig,
        server_b: &ServerConfig,
    ) -> ServerStatusResponse {
        info!(
            "Checking status for servers: {} and {}",
            server_a.host, server_b.host
        );
        let (server_a, server_b) = tokio::join!(self.check(server_a), self.check(server_b));
        ServerStatusResponse {
            server_a,
            server_b,
            success: true,
            message: None,
        }
    }

    /// Open and query, timing up to the result. The connection is closed
    /// after the clock stops.
    async fn probe(&self, config: &ServerConfig) -> (u64, Result<(), EngineError>) {
        let started = Instant::now();
        let elapsed = || started.elapsed().as_millis() as u64;

        let mut conn = match self.connector.open(config).await {
            Ok(conn) => conn,
            Err(err) => return (elapsed(), Err(err.into())),
        };
        let outcome = conn
            .query(PROBE_SQL, Vec::new())
            .await
            .map(|_| ())
            .map_err(|e| EngineError::CatalogQuery(format!("{e:#}")));
        let response_time = elapsed();
        drop(conn);
        (response_time, outcome)
    }
}
