//! Error taxonomy of the engine.
//!
//! Public operations never return these errors directly: every failure is
//! folded into the result record as a message plus an [`ErrorKind`] tag.

use firebird_client::ConnectError;
use serde::{Deserialize, Serialize};

/// Kind of failure carried next to the message in every result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Authentication or network failure while opening a connection
    Connection,
    /// A catalog query failed or returned rows that could not be read
    CatalogQuery,
    /// A step of one table's extract/replace/load failed
    TableSync,
    /// The table list could not be obtained or the batch lost a connection
    Orchestration,
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Connection(#[from] ConnectError),

    #[error("{0}")]
    CatalogQuery(String),

    #[error("{message}")]
    TableSync { table: String, message: String },

    #[error("{0}")]
    Orchestration(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Connection(_) => ErrorKind::Connection,
            EngineError::CatalogQuery(_) => ErrorKind::CatalogQuery,
            EngineError::TableSync { .. } => ErrorKind::TableSync,
            EngineError::Orchestration(_) => ErrorKind::Orchestration,
        }
    }

    /// Catalog failure from any error, keeping the full context chain.
    pub fn catalog(err: anyhow::Error) -> Self {
        EngineError::CatalogQuery(format!("{err:#}"))
    }

    pub fn table_sync(table: &str, err: anyhow::Error) -> Self {
        EngineError::TableSync {
            table: table.to_string(),
            message: format!("{err:#}"),
        }
    }
}
