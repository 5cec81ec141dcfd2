//! Configuration loading for the CLI.
//!
//! Server settings come from three layers, later ones winning field by
//! field:
//!
//! 1. an optional TOML file (`--config`),
//! 2. `FIREBIRD_A_*` / `FIREBIRD_B_*` environment variables,
//! 3. command-line flags.
//!
//! clap merges layers 2 and 3 itself, so only the file needs merging here.
//!
//! ```toml
//! [server_a]
//! host = "fb-primary"
//! database = "/dbs/fdb/bell.fdb"
//! user = "SYSDBA"
//! password = "masterkey"
//!
//! [server_b]
//! host = "fb-replica"
//! port = 3051
//! database = "/dbs/fdb/bell.fdb"
//! user = "SYSDBA"
//! password = "masterkey"
//!
//! [sync]
//! tables = ["ORDERS", "CUSTOMERS"]
//! transactional = true
//! ```

use anyhow::{Context, Result};
use clap::Args;
use firebird_client::{ServerConfig, DEFAULT_PORT};
use serde::Deserialize;
use std::path::Path;

/// Server settings where every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialServer {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl PartialServer {
    /// Fields set in `other` replace the ones in `self`.
    pub fn merge(self, other: PartialServer) -> PartialServer {
        PartialServer {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            database: other.database.or(self.database),
            user: other.user.or(self.user),
            password: other.password.or(self.password),
        }
    }

    /// Build a [`ServerConfig`]. Host and database are required.
    pub fn resolve(self, name: &str) -> Result<ServerConfig> {
        let host = self
            .host
            .filter(|h| !h.trim().is_empty())
            .with_context(|| format!("{name}: host is not configured"))?;
        let database = self
            .database
            .filter(|d| !d.trim().is_empty())
            .with_context(|| format!("{name}: database is not configured"))?;

        Ok(ServerConfig {
            host,
            port: self.port.unwrap_or(DEFAULT_PORT),
            database,
            user: self.user.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyncSection {
    pub tables: Option<Vec<String>>,
    pub transactional: Option<bool>,
}

/// Contents of the `--config` TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub server_a: PartialServer,
    #[serde(default)]
    pub server_b: PartialServer,
    #[serde(default)]
    pub sync: SyncSection,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Source server (A) connection options
#[derive(Args, Clone, Debug, Default)]
pub struct ServerAOpts {
    /// Server A host
    #[arg(long = "a-host", env = "FIREBIRD_A_HOST")]
    pub host: Option<String>,

    /// Server A port (default: 3050)
    #[arg(long = "a-port", env = "FIREBIRD_A_PORT")]
    pub port: Option<u16>,

    /// Server A database path or alias
    #[arg(long = "a-database", env = "FIREBIRD_A_DATABASE")]
    pub database: Option<String>,

    /// Server A user
    #[arg(long = "a-user", env = "FIREBIRD_A_USER")]
    pub user: Option<String>,

    /// Server A password
    #[arg(long = "a-password", env = "FIREBIRD_A_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Target server (B) connection options
#[derive(Args, Clone, Debug, Default)]
pub struct ServerBOpts {
    /// Server B host
    #[arg(long = "b-host", env = "FIREBIRD_B_HOST")]
    pub host: Option<String>,

    /// Server B port (default: 3050)
    #[arg(long = "b-port", env = "FIREBIRD_B_PORT")]
    pub port: Option<u16>,

    /// Server B database path or alias
    #[arg(long = "b-database", env = "FIREBIRD_B_DATABASE")]
    pub database: Option<String>,

    /// Server B user
    #[arg(long = "b-user", env = "FIREBIRD_B_USER")]
    pub user: Option<String>,

    /// Server B password
    #[arg(long = "b-password", env = "FIREBIRD_B_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl From<&ServerAOpts> for PartialServer {
    fn from(opts: &ServerAOpts) -> Self {
        PartialServer {
            host: opts.host.clone(),
            port: opts.port,
            database: opts.database.clone(),
            user: opts.user.clone(),
            password: opts.password.clone(),
        }
    }
}

impl From<&ServerBOpts> for PartialServer {
    fn from(opts: &ServerBOpts) -> Self {
        PartialServer {
            host: opts.host.clone(),
            port: opts.port,
            database: opts.database.clone(),
            user: opts.user.clone(),
            password: opts.password.clone(),
        }
    }
}

/// Merged settings of one CLI invocation.
///
/// Servers stay unresolved until a command asks for them, so a command
/// that only touches one server does not need the other configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    server_a: PartialServer,
    server_b: PartialServer,
    /// Tables to sync; empty means every user table of server A
    pub tables: Vec<String>,
    pub transactional: bool,
}

impl Settings {
    pub fn load(
        config_path: Option<&Path>,
        server_a: &ServerAOpts,
        server_b: &ServerBOpts,
    ) -> Result<Self> {
        let file = match config_path {
            Some(path) => FileConfig::from_file(path)?,
            None => FileConfig::default(),
        };
        Ok(Self::from_layers(file, server_a.into(), server_b.into()))
    }

    pub fn from_layers(file: FileConfig, server_a: PartialServer, server_b: PartialServer) -> Self {
        Settings {
            server_a: file.server_a.merge(server_a),
            server_b: file.server_b.merge(server_b),
            tables: file.sync.tables.unwrap_or_default(),
            transactional: file.sync.transactional.unwrap_or(true),
        }
    }

    /// Source of a sync
    pub fn server_a(&self) -> Result<ServerConfig> {
        self.server_a.clone().resolve("server A")
    }

    /// Target of a sync
    pub fn server_b(&self) -> Result<ServerConfig> {
        self.server_b.clone().resolve("server B")
    }
}
