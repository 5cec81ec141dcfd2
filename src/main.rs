//! Command-line interface for firebird-sync
//!
//! Server A is the sync source and server B the target. Connection settings
//! come from `--config`, `FIREBIRD_A_*` / `FIREBIRD_B_*` environment
//! variables and `--a-*` / `--b-*` flags, later layers winning.
//!
//! # Usage Examples
//!
//! ```bash
//! # Liveness of both servers
//! firebird-sync --config servers.toml status
//!
//! # Catalog of the target only
//! firebird-sync --config servers.toml tables --server b
//!
//! # Mirror every user table of A onto B
//! firebird-sync --config servers.toml sync
//!
//! # Mirror two tables, one statement at a time
//! firebird-sync --config servers.toml sync --tables ORDERS,CUSTOMERS --no-transaction
//! ```
//!
//! Every command prints its result record as pretty JSON on stdout.

use clap::{Parser, Subcommand, ValueEnum};
use firebird_sync::{
    FirebirdConnector, HealthStatus, SchemaIntrospector, ServerAOpts, ServerBOpts, Settings,
    StatusChecker, SyncOptions, SyncOrchestrator, SyncRequest,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "firebird-sync")]
#[command(about = "Mirror tables between two Firebird servers")]
#[command(long_about = None)]
struct Cli {
    /// TOML file with [server_a], [server_b] and [sync] sections
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    server_a: ServerAOpts,

    #[command(flatten)]
    server_b: ServerBOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check liveness and response time of both servers
    Status,

    /// List user tables and their columns
    Tables {
        /// Which server to introspect
        #[arg(long, value_enum, default_value = "both")]
        server: ServerChoice,
    },

    /// Replace target tables with the source rows
    Sync {
        /// Comma-separated tables to sync (default: [sync].tables, else every user table of A)
        #[arg(long, value_delimiter = ',')]
        tables: Vec<String>,

        /// Apply each statement on its own instead of one transaction per table
        #[arg(long)]
        no_transaction: bool,
    },

    /// Print the resolved server settings without passwords
    Config,

    /// Print the health payload of this process
    Health,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ServerChoice {
    #[value(name = "a")]
    A,
    #[value(name = "b")]
    B,
    #[value(name = "both")]
    Both,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigSummary {
    server_a: Option<firebird_client::ServerSummary>,
    server_b: Option<firebird_client::ServerSummary>,
    tables: Vec<String>,
    transactional: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Health = cli.command {
        return print_json(&HealthStatus::now());
    }

    let settings = Settings::load(cli.config.as_deref(), &cli.server_a, &cli.server_b)?;
    let connector = Arc::new(FirebirdConnector::new());

    match cli.command {
        Commands::Status => {
            let (server_a, server_b) = (settings.server_a()?, settings.server_b()?);
            let response = StatusChecker::new(connector)
                .check_pair(&server_a, &server_b)
                .await;
            let offline = response.offline_servers();
            if !offline.is_empty() {
                warn!("Offline servers: {}", offline.join(", "));
            }
            print_json(&response)
        }
        Commands::Tables { server } => {
            let introspector = SchemaIntrospector::new(connector);
            match server {
                ServerChoice::A => {
                    print_json(&introspector.list_tables(&settings.server_a()?).await)
                }
                ServerChoice::B => {
                    print_json(&introspector.list_tables(&settings.server_b()?).await)
                }
                ServerChoice::Both => print_json(
                    &introspector
                        .list_tables_pair(&settings.server_a()?, &settings.server_b()?)
                        .await,
                ),
            }
        }
        Commands::Sync {
            tables,
            no_transaction,
        } => {
            let tables = if tables.is_empty() {
                settings.tables.clone()
            } else {
                tables
            };
            let options = SyncOptions {
                transactional: settings.transactional && !no_transaction,
            };
            let (source, target) = (settings.server_a()?, settings.server_b()?);
            info!(
                "Syncing {} -> {} (transactional: {})",
                source.label(),
                target.label(),
                options.transactional
            );

            let request = SyncRequest::new(source, target).with_tables(tables);
            let response = SyncOrchestrator::new(connector, options)
                .sync(&request)
                .await;
            print_json(&response)?;
            if !response.success {
                anyhow::bail!("{}", response.message);
            }
            Ok(())
        }
        Commands::Config => print_json(&ConfigSummary {
            server_a: summary(settings.server_a()),
            server_b: summary(settings.server_b()),
            tables: settings.tables.clone(),
            transactional: settings.transactional,
        }),
        Commands::Health => print_json(&HealthStatus::now()),
    }
}

/// Summary of a resolved server; an unconfigured one prints as null.
fn summary(
    config: anyhow::Result<firebird_sync::ServerConfig>,
) -> Option<firebird_client::ServerSummary> {
    match config {
        Ok(config) => Some(config.summary()),
        Err(e) => {
            warn!("{e:#}");
            None
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
