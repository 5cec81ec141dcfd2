//! Connection traits shared by all backends.
//!
//! [`Connector`] is the single place where network and authentication
//! failures surface. It keeps no state between calls, so independent
//! connections can be opened concurrently. A [`Connection`] is released
//! when it is dropped, which gives every caller scoped release on all exit
//! paths without explicit cleanup.

use crate::config::ServerConfig;
use anyhow::Result;
use async_trait::async_trait;
use firebird_types::FbValue;

/// Failure to acquire a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Network, authentication or database-path failure reported by the server
    #[error("{message}")]
    Failed { target: String, message: String },

    /// The blocking connect task did not finish
    #[error("connection task for {target} failed: {message}")]
    Task { target: String, message: String },
}

impl ConnectError {
    pub fn failed(config: &ServerConfig, err: impl std::fmt::Display) -> Self {
        ConnectError::Failed {
            target: config.label(),
            message: err.to_string(),
        }
    }

    /// `host:port` of the server the failure belongs to.
    pub fn target(&self) -> &str {
        match self {
            ConnectError::Failed { target, .. } | ConnectError::Task { target, .. } => target,
        }
    }
}

/// Rows returned by a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names from the result's positional field metadata
    pub columns: Vec<String>,
    /// Rows in server order; each row has one value per column
    pub rows: Vec<Vec<FbValue>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// An open connection to one server.
///
/// Parameters are positional (`?` placeholders) and bound in order.
/// Without an explicit transaction every statement commits on its own.
#[async_trait]
pub trait Connection: Send {
    /// Run a statement that returns rows.
    async fn query(&mut self, sql: &str, params: Vec<FbValue>) -> Result<ResultSet>;

    /// Run a statement that returns no rows.
    async fn execute(&mut self, sql: &str, params: Vec<FbValue>) -> Result<()>;

    /// Start an explicit transaction covering the following statements.
    async fn begin_transaction(&mut self) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}

/// Opens connections from a [`ServerConfig`].
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, config: &ServerConfig) -> Result<Box<dyn Connection>, ConnectError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_message_is_underlying_text() {
        let config = ServerConfig::new("fb1", "/dbs/bell.fdb", "SYSDBA", "x");
        let err = ConnectError::failed(&config, "Your user name and password are not defined");
        assert_eq!(
            err.to_string(),
            "Your user name and password are not defined"
        );
        assert_eq!(err.target(), "fb1:3050");
    }

    #[test]
    fn test_result_set_column_index() {
        let rs = ResultSet {
            columns: vec!["ID".into(), "AMOUNT".into()],
            rows: vec![vec![FbValue::Integer(1), FbValue::Float(2.5)]],
        };
        assert_eq!(rs.column_index("AMOUNT"), Some(1));
        assert_eq!(rs.column_index("NOPE"), None);
        assert_eq!(rs.len(), 1);
        assert!(!rs.is_empty());
    }
}
