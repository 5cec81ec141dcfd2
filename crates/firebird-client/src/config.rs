//! Server connection settings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Firebird listener port.
pub const DEFAULT_PORT: u16 = 3050;

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Address and credentials of one Firebird server.
///
/// Treated as opaque by the engine: it is never validated or persisted,
/// only handed to a [`crate::Connector`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database path or alias on the server
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ServerConfig {
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            database: database.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `host:port`, used as the host label of status results.
    pub fn label(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Password-free view for display and logging.
    pub fn summary(&self) -> ServerSummary {
        ServerSummary {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            user: self.user.clone(),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Server settings without the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSummary {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
}
