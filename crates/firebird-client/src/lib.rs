//! Firebird connection handling for firebird-sync.
//!
//! This crate owns everything that touches a server connection:
//!
//! - [`ServerConfig`] - Credentials and address of one server
//! - [`Connector`] / [`Connection`] - Storage-agnostic connection traits
//! - [`FirebirdConnector`] - Production connector on the pure Rust wire client
//!
//! The engine only ever talks to the traits, so the same sync logic runs
//! against a real server or against an in-memory one in tests.

mod config;
mod connection;
mod firebird;

pub use config::{ServerConfig, ServerSummary, DEFAULT_PORT};
pub use connection::{ConnectError, Connection, Connector, ResultSet};
pub use firebird::FirebirdConnector;
