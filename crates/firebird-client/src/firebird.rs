//! Connector backed by the pure Rust Firebird wire client.
//!
//! The wire client is blocking, so every call runs on tokio's blocking pool
//! while holding the connection lock. Statements with identical SQL text
//! reuse the client's prepared statement cache, which is what makes the
//! per-row INSERT loop of a table sync a prepare-once, execute-many cycle.

use crate::config::ServerConfig;
use crate::connection::{ConnectError, Connection, Connector, ResultSet};
use anyhow::Result;
use async_trait::async_trait;
use firebird_types::FbValue;
use parking_lot::Mutex;
use rsfbclient::prelude::*;
use rsfbclient::{FbError, Row, SqlType};
use std::sync::Arc;
use tracing::debug;

type FbConnection = rsfbclient::Connection<rsfbclient_rust::RustFbClient>;

/// Opens connections over TCP with the UTF-8 charset.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirebirdConnector;

impl FirebirdConnector {
    pub fn new() -> Self {
        Self
    }
}

fn connect_blocking(config: &ServerConfig) -> Result<FbConnection, FbError> {
    rsfbclient::builder_pure_rust()
        .host(config.host.as_str())
        .port(config.port)
        .db_name(config.database.as_str())
        .user(config.user.as_str())
        .pass(config.password.as_str())
        .charset(rsfbclient::charset::UTF_8)
        .connect()
}

#[async_trait]
impl Connector for FirebirdConnector {
    async fn open(&self, config: &ServerConfig) -> Result<Box<dyn Connection>, ConnectError> {
        debug!(
            "Connecting to {} database {}",
            config.label(),
            config.database
        );

        let settings = config.clone();
        let conn = tokio::task::spawn_blocking(move || connect_blocking(&settings))
            .await
            .map_err(|e| ConnectError::Task {
                target: config.label(),
                message: e.to_string(),
            })?
            .map_err(|e| ConnectError::failed(config, e))?;

        Ok(Box::new(FirebirdConnection {
            inner: Arc::new(Mutex::new(conn)),
            label: config.label(),
        }))
    }
}

struct FirebirdConnection {
    inner: Arc<Mutex<FbConnection>>,
    label: String,
}

impl FirebirdConnection {
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut FbConnection) -> Result<T, FbError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let out = tokio::task::spawn_blocking(move || {
            let mut conn = inner.lock();
            f(&mut conn)
        })
        .await?;
        Ok(out?)
    }
}

#[async_trait]
impl Connection for FirebirdConnection {
    async fn query(&mut self, sql: &str, params: Vec<FbValue>) -> Result<ResultSet> {
        let sql = sql.to_string();
        let params: Vec<SqlType> = params.into_iter().map(to_sql_type).collect();
        let rows: Vec<Row> = self
            .run(move |conn| conn.query::<_, Row>(&sql, params))
            .await?;
        Ok(rows_to_result_set(rows))
    }

    async fn execute(&mut self, sql: &str, params: Vec<FbValue>) -> Result<()> {
        let sql = sql.to_string();
        let params: Vec<SqlType> = params.into_iter().map(to_sql_type).collect();
        self.run(move |conn| conn.execute(&sql, params).map(|_| ()))
            .await
    }

    async fn begin_transaction(&mut self) -> Result<()> {
        self.run(|conn| conn.begin_transaction()).await
    }

    async fn commit(&mut self) -> Result<()> {
        self.run(|conn| conn.commit()).await
    }

    async fn rollback(&mut self) -> Result<()> {
        self.run(|conn| conn.rollback()).await
    }
}

impl Drop for FirebirdConnection {
    fn drop(&mut self) {
        debug!("Releasing connection to {}", self.label);
    }
}

/// Column names come from the first row; an empty result carries none.
fn rows_to_result_set(rows: Vec<Row>) -> ResultSet {
    let columns = rows
        .first()
        .map(|row| row.cols.iter().map(|c| c.name.clone()).collect())
        .unwrap_or_default();

    let rows = rows
        .into_iter()
        .map(|row| {
            row.cols
                .into_iter()
                .map(|c| from_sql_type(c.value))
                .collect()
        })
        .collect();

    ResultSet { columns, rows }
}

fn to_sql_type(value: FbValue) -> SqlType {
    match value {
        FbValue::Null => SqlType::Null,
        FbValue::Integer(i) => SqlType::Integer(i),
        FbValue::Float(f) => SqlType::Floating(f),
        FbValue::Text(s) => SqlType::Text(s),
        FbValue::Timestamp(ts) => SqlType::Timestamp(ts),
        FbValue::Binary(b) => SqlType::Binary(b),
        FbValue::Boolean(b) => SqlType::Boolean(b),
    }
}

#[allow(unreachable_patterns)]
fn from_sql_type(value: SqlType) -> FbValue {
    match value {
        SqlType::Null => FbValue::Null,
        SqlType::Integer(i) => FbValue::Integer(i),
        SqlType::Floating(f) => FbValue::Float(f),
        SqlType::Text(s) => FbValue::Text(s),
        SqlType::Timestamp(ts) => FbValue::Timestamp(ts),
        SqlType::Binary(b) => FbValue::Binary(b),
        SqlType::Boolean(b) => FbValue::Boolean(b),
        other => FbValue::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_value_conversion_preserves_variant() {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let values = vec![
            FbValue::Null,
            FbValue::Integer(-7),
            FbValue::Float(1.25),
            FbValue::Text("abc".into()),
            FbValue::Timestamp(ts),
            FbValue::Binary(vec![0, 1, 2]),
            FbValue::Boolean(true),
        ];
        for value in values {
            assert_eq!(from_sql_type(to_sql_type(value.clone())), value);
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_fails_to_connect() {
        let config = ServerConfig::new("127.0.0.1", "/nonexistent.fdb", "SYSDBA", "masterkey")
            .with_port(1);
        let result = FirebirdConnector::new().open(&config).await;
        match result {
            Err(ConnectError::Failed { target, message }) => {
                assert_eq!(target, "127.0.0.1:1");
                assert!(!message.is_empty());
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connection to a closed port succeeded"),
        }
    }
}
