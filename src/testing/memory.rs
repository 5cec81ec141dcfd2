//! In-memory stand-in for a Firebird server
//!
//! [`MemoryServer`] holds a set of [`TestTable`]s and answers the exact
//! statements the engine issues: the liveness probe, the two catalog
//! queries, `SELECT *`, `DELETE FROM` and positional `INSERT`. It counts
//! open connections so tests can assert scoped release, and supports
//! failure injection for the error paths.

use crate::status::PROBE_SQL;
use crate::testing::table::TestTable;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use firebird_client::{ConnectError, Connection, Connector, ResultSet, ServerConfig};
use firebird_types::FbValue;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Width of blank-padded catalog name columns.
const CATALOG_NAME_WIDTH: usize = 31;

type Snapshot = BTreeMap<String, Vec<Vec<FbValue>>>;

#[derive(Debug, Clone)]
struct InsertFailure {
    table: String,
    /// Inserts that still succeed before the failure
    remaining: usize,
    message: String,
    disconnect: bool,
}

#[derive(Debug, Default)]
struct ServerState {
    tables: BTreeMap<String, TestTable>,
    open_connections: usize,
    opened_total: usize,
    unreachable: Option<String>,
    catalog_error: Option<String>,
    statement_errors: Vec<(String, String)>,
    insert_failure: Option<InsertFailure>,
    /// Connections from older generations are dead
    generation: u64,
    /// Row snapshots of open transactions by connection id
    transactions: HashMap<u64, Snapshot>,
    catalog_order: Option<Vec<String>>,
    latency: Option<Duration>,
    close_delay: Option<Duration>,
    statements: Vec<String>,
}

/// A shared, cloneable in-memory server.
#[derive(Debug, Clone, Default)]
pub struct MemoryServer {
    state: Arc<Mutex<ServerState>>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, table: TestTable) -> Self {
        self.put_table(table);
        self
    }

    /// Report relations in `names` order instead of by name. Tables not
    /// listed are left out of the relations query.
    pub fn with_catalog_order(self, names: &[&str]) -> Self {
        self.state.lock().catalog_order = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    pub fn put_table(&self, table: TestTable) {
        self.state.lock().tables.insert(table.name.clone(), table);
    }

    pub fn table(&self, name: &str) -> Option<TestTable> {
        self.state.lock().tables.get(name).cloned()
    }

    /// Current rows of `name` in field-position order.
    pub fn rows(&self, name: &str) -> Vec<Vec<FbValue>> {
        let state = self.state.lock();
        match state.tables.get(name) {
            Some(table) => {
                let order = table.position_order();
                table
                    .rows
                    .iter()
                    .map(|row| order.iter().map(|&i| row[i].clone()).collect())
                    .collect()
            }
            None => Vec::new(),
        }
    }

    pub fn open_connections(&self) -> usize {
        self.state.lock().open_connections
    }

    pub fn opened_total(&self) -> usize {
        self.state.lock().opened_total
    }

    /// Every statement executed so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state.lock().statements.clone()
    }

    /// Refuse new connections with `message`.
    pub fn set_unreachable(&self, message: &str) {
        self.state.lock().unreachable = Some(message.to_string());
    }

    /// Fail every catalog query with `message`.
    pub fn deny_catalog(&self, message: &str) {
        self.state.lock().catalog_error = Some(message.to_string());
    }

    /// Fail every statement starting with `prefix`.
    pub fn fail_statement(&self, prefix: &str, message: &str) {
        self.state
            .lock()
            .statement_errors
            .push((prefix.to_string(), message.to_string()));
    }

    /// Let `after` inserts into `table` succeed, then fail the next one.
    pub fn fail_insert_after(&self, table: &str, after: usize, message: &str) {
        self.arm_insert_failure(table, after, message, false);
    }

    /// Like [`Self::fail_insert_after`], but the failure also kills every
    /// open connection.
    pub fn disconnect_on_insert(&self, table: &str, after: usize, message: &str) {
        self.arm_insert_failure(table, after, message, true);
    }

    fn arm_insert_failure(&self, table: &str, after: usize, message: &str, disconnect: bool) {
        self.state.lock().insert_failure = Some(InsertFailure {
            table: table.to_string(),
            remaining: after,
            message: message.to_string(),
            disconnect,
        });
    }

    /// Delay every statement by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = Some(latency);
    }

    /// Block for `delay` whenever a connection is closed.
    pub fn set_close_delay(&self, delay: Duration) {
        self.state.lock().close_delay = Some(delay);
    }

    fn connect(&self) -> Result<MemoryConnection, String> {
        let mut state = self.state.lock();
        if let Some(message) = &state.unreachable {
            return Err(message.clone());
        }
        state.open_connections += 1;
        state.opened_total += 1;
        Ok(MemoryConnection {
            server: self.clone(),
            id: state.opened_total as u64,
            generation: state.generation,
        })
    }
}

/// Resolves servers by host name.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    servers: HashMap<String, MemoryServer>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, host: &str, server: MemoryServer) -> Self {
        self.servers.insert(host.to_string(), server);
        self
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self, config: &ServerConfig) -> Result<Box<dyn Connection>, ConnectError> {
        let server = self.servers.get(&config.host).ok_or_else(|| {
            ConnectError::failed(
                config,
                format!(
                    "Unable to complete network request to host \"{}\"",
                    config.host
                ),
            )
        })?;
        let conn = server
            .connect()
            .map_err(|message| ConnectError::failed(config, message))?;
        Ok(Box::new(conn))
    }
}

struct MemoryConnection {
    server: MemoryServer,
    id: u64,
    generation: u64,
}

impl MemoryConnection {
    async fn run(&mut self, sql: &str, params: Vec<FbValue>) -> Result<ResultSet> {
        let latency = self.server.state.lock().latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.server.state.lock();
        if state.generation != self.generation {
            bail!("Error writing data to the connection");
        }
        let sql = sql.trim();
        state.statements.push(sql.to_string());

        if let Some((_, message)) = state
            .statement_errors
            .iter()
            .find(|(prefix, _)| sql.starts_with(prefix.as_str()))
        {
            bail!("{message}");
        }

        if sql == PROBE_SQL {
            return Ok(ResultSet {
                columns: vec!["CONSTANT".to_string()],
                rows: vec![vec![FbValue::Integer(1)]],
            });
        }
        if sql.contains("RDB$RELATION_FIELDS") {
            check_catalog(&state)?;
            return Ok(fields_query(&state, &params));
        }
        if sql.contains("RDB$RELATIONS") {
            check_catalog(&state)?;
            return Ok(tables_query(&state));
        }
        if let Some(table) = sql.strip_prefix("SELECT * FROM ") {
            return select_all(&state, table.trim());
        }
        if let Some(table) = sql.strip_prefix("DELETE FROM ") {
            let table = lookup_mut(&mut state, table.trim())?;
            table.rows.clear();
            return Ok(ResultSet::default());
        }
        if sql.starts_with("INSERT INTO ") {
            insert(&mut state, sql, params)?;
            return Ok(ResultSet::default());
        }
        Err(anyhow!("Unsupported statement: {sql}"))
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn query(&mut self, sql: &str, params: Vec<FbValue>) -> Result<ResultSet> {
        self.run(sql, params).await
    }

    async fn execute(&mut self, sql: &str, params: Vec<FbValue>) -> Result<()> {
        self.run(sql, params).await.map(|_| ())
    }

    async fn begin_transaction(&mut self) -> Result<()> {
        let mut state = self.server.state.lock();
        if state.generation != self.generation {
            bail!("Error writing data to the connection");
        }
        if state.transactions.contains_key(&self.id) {
            bail!("transaction is already active");
        }
        let snapshot = state
            .tables
            .iter()
            .map(|(name, table)| (name.clone(), table.rows.clone()))
            .collect();
        state.transactions.insert(self.id, snapshot);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let mut state = self.server.state.lock();
        if state.generation != self.generation {
            bail!("Error writing data to the connection");
        }
        state
            .transactions
            .remove(&self.id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("no active transaction"))
    }

    async fn rollback(&mut self) -> Result<()> {
        let mut state = self.server.state.lock();
        if state.generation != self.generation {
            bail!("Error writing data to the connection");
        }
        let snapshot = state
            .transactions
            .remove(&self.id)
            .ok_or_else(|| anyhow!("no active transaction"))?;
        restore(&mut state, snapshot);
        Ok(())
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        let mut state = self.server.state.lock();
        // Detaching rolls back whatever the connection left uncommitted
        if let Some(snapshot) = state.transactions.remove(&self.id) {
            restore(&mut state, snapshot);
        }
        state.open_connections = state.open_connections.saturating_sub(1);
        let close_delay = state.close_delay;
        drop(state);
        if let Some(delay) = close_delay {
            std::thread::sleep(delay);
        }
    }
}

fn restore(state: &mut ServerState, snapshot: Snapshot) {
    for (name, rows) in snapshot {
        if let Some(table) = state.tables.get_mut(&name) {
            table.rows = rows;
        }
    }
}

/// Kill every open connection and discard their open transactions.
fn disconnect_all(state: &mut ServerState) {
    state.generation += 1;
    let transactions: Vec<Snapshot> = state.transactions.drain().map(|(_, s)| s).collect();
    for snapshot in transactions {
        restore(state, snapshot);
    }
}

fn check_catalog(state: &ServerState) -> Result<()> {
    match &state.catalog_error {
        Some(message) => bail!("{message}"),
        None => Ok(()),
    }
}

fn padded(name: &str) -> FbValue {
    FbValue::Text(format!("{:<width$}", name, width = CATALOG_NAME_WIDTH))
}

fn tables_query(state: &ServerState) -> ResultSet {
    let names: Vec<&str> = match &state.catalog_order {
        Some(order) => order.iter().map(String::as_str).collect(),
        None => state.tables.keys().map(String::as_str).collect(),
    };
    let rows = names
        .into_iter()
        .filter_map(|name| state.tables.get(name))
        .filter(|t| !t.system && !t.view)
        .map(|t| vec![padded(&t.name)])
        .collect();
    ResultSet {
        columns: vec!["TABLE_NAME".to_string()],
        rows,
    }
}

fn fields_query(state: &ServerState, params: &[FbValue]) -> ResultSet {
    let columns = [
        "COLUMN_NAME",
        "FIELD_TYPE",
        "FIELD_LENGTH",
        "FIELD_SCALE",
        "NULL_FLAG",
        "FIELD_SUB_TYPE",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();

    let table = params
        .first()
        .and_then(FbValue::as_str)
        .and_then(|name| state.tables.get(name));
    let rows = match table {
        Some(table) => table
            .position_order()
            .into_iter()
            .map(|i| {
                let c = &table.columns[i];
                vec![
                    padded(&c.name),
                    FbValue::Integer(c.field_type.code() as i64),
                    FbValue::from(c.length.map(i64::from)),
                    FbValue::Integer(c.scale as i64),
                    if c.not_null {
                        FbValue::Integer(1)
                    } else {
                        FbValue::Null
                    },
                    FbValue::from(c.sub_type.map(i64::from)),
                ]
            })
            .collect(),
        None => Vec::new(),
    };
    ResultSet { columns, rows }
}

fn lookup<'a>(state: &'a ServerState, name: &str) -> Result<&'a TestTable> {
    state
        .tables
        .get(name)
        .ok_or_else(|| anyhow!("Table unknown {name}"))
}

fn lookup_mut<'a>(state: &'a mut ServerState, name: &str) -> Result<&'a mut TestTable> {
    state
        .tables
        .get_mut(name)
        .ok_or_else(|| anyhow!("Table unknown {name}"))
}

fn select_all(state: &ServerState, name: &str) -> Result<ResultSet> {
    let table = lookup(state, name)?;
    let order = table.position_order();
    Ok(ResultSet {
        columns: table.column_names(),
        rows: table
            .rows
            .iter()
            .map(|row| order.iter().map(|&i| row[i].clone()).collect())
            .collect(),
    })
}

/// Parse `INSERT INTO t (a, b) VALUES (?, ?)`.
fn parse_insert(sql: &str) -> Result<(String, Vec<String>)> {
    let rest = sql
        .strip_prefix("INSERT INTO ")
        .ok_or_else(|| anyhow!("malformed INSERT: {sql}"))?;
    let open = rest
        .find('(')
        .ok_or_else(|| anyhow!("malformed INSERT: {sql}"))?;
    let close = rest
        .find(')')
        .ok_or_else(|| anyhow!("malformed INSERT: {sql}"))?;
    let table = rest[..open].trim().to_string();
    let columns = rest[open + 1..close]
        .split(',')
        .map(|c| c.trim().to_string())
        .collect();
    Ok((table, columns))
}

fn insert(state: &mut ServerState, sql: &str, params: Vec<FbValue>) -> Result<()> {
    let (name, columns) = parse_insert(sql)?;
    if columns.len() != params.len() {
        bail!(
            "Count of column list and value list don't match ({} vs {})",
            columns.len(),
            params.len()
        );
    }

    if let Some(failure) = state.insert_failure.as_mut() {
        if failure.table == name {
            if failure.remaining == 0 {
                let failure = failure.clone();
                state.insert_failure = None;
                if failure.disconnect {
                    disconnect_all(state);
                }
                bail!("{}", failure.message);
            }
            failure.remaining -= 1;
        }
    }

    let table = lookup_mut(state, &name)?;
    let mut row = vec![FbValue::Null; table.columns.len()];
    for (column, value) in columns.iter().zip(params) {
        let index = table
            .columns
            .iter()
            .position(|c| &c.name == column)
            .ok_or_else(|| anyhow!("Column unknown {column}"))?;
        row[index] = value;
    }
    if let Some(c) = table
        .columns
        .iter()
        .zip(&row)
        .find(|(c, v)| c.not_null && v.is_null())
        .map(|(c, _)| c)
    {
        bail!(
            "validation error for column \"{}\".\"{}\", value \"*** null ***\"",
            name,
            c.name
        );
    }
    table.rows.push(row);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::table::TestColumn;

    fn server() -> MemoryServer {
        MemoryServer::new().with_table(
            TestTable::new("ORDERS")
                .column(TestColumn::integer("ID").not_null())
                .column(TestColumn::double("AMOUNT"))
                .row([FbValue::Integer(1), FbValue::Float(9.5)]),
        )
    }

    fn config(host: &str) -> ServerConfig {
        ServerConfig::new(host, "/db.fdb", "SYSDBA", "masterkey")
    }

    #[tokio::test]
    async fn test_connection_count_tracks_drop() {
        let server = server();
        let connector = MemoryConnector::new().with_server("fb1", server.clone());
        let conn = connector.open(&config("fb1")).await.unwrap();
        assert_eq!(server.open_connections(), 1);
        drop(conn);
        assert_eq!(server.open_connections(), 0);
        assert_eq!(server.opened_total(), 1);
    }

    #[tokio::test]
    async fn test_unknown_host_is_unreachable() {
        let connector = MemoryConnector::new();
        let err = connector.open(&config("nowhere")).await.err().unwrap();
        assert!(err.to_string().contains("nowhere"));
    }

    #[tokio::test]
    async fn test_insert_and_rollback() {
        let server = server();
        let connector = MemoryConnector::new().with_server("fb1", server.clone());
        let mut conn = connector.open(&config("fb1")).await.unwrap();

        conn.begin_transaction().await.unwrap();
        conn.execute("DELETE FROM ORDERS", Vec::new()).await.unwrap();
        conn.execute(
            "INSERT INTO ORDERS (ID, AMOUNT) VALUES (?, ?)",
            vec![FbValue::Integer(2), FbValue::Null],
        )
        .await
        .unwrap();
        assert_eq!(server.rows("ORDERS").len(), 1);
        assert_eq!(server.rows("ORDERS")[0][0], FbValue::Integer(2));

        conn.rollback().await.unwrap();
        assert_eq!(
            server.rows("ORDERS"),
            vec![vec![FbValue::Integer(1), FbValue::Float(9.5)]]
        );
    }

    #[tokio::test]
    async fn test_close_discards_uncommitted_rows() {
        let server = server();
        let connector = MemoryConnector::new().with_server("fb1", server.clone());
        let mut conn = connector.open(&config("fb1")).await.unwrap();

        conn.begin_transaction().await.unwrap();
        conn.execute("DELETE FROM ORDERS", Vec::new()).await.unwrap();
        assert!(server.rows("ORDERS").is_empty());

        drop(conn);
        assert_eq!(server.rows("ORDERS").len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_discards_uncommitted_rows() {
        let server = server();
        server.disconnect_on_insert("ORDERS", 1, "connection lost");
        let connector = MemoryConnector::new().with_server("fb1", server.clone());
        let mut conn = connector.open(&config("fb1")).await.unwrap();
        let insert = "INSERT INTO ORDERS (ID, AMOUNT) VALUES (?, ?)";

        conn.begin_transaction().await.unwrap();
        conn.execute(insert, vec![FbValue::Integer(2), FbValue::Null])
            .await
            .unwrap();
        let err = conn
            .execute(insert, vec![FbValue::Integer(3), FbValue::Null])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection lost");

        assert_eq!(
            server.rows("ORDERS"),
            vec![vec![FbValue::Integer(1), FbValue::Float(9.5)]]
        );
        assert!(conn.rollback().await.is_err());
    }

    #[tokio::test]
    async fn test_not_null_violation() {
        let server = server();
        let connector = MemoryConnector::new().with_server("fb1", server);
        let mut conn = connector.open(&config("fb1")).await.unwrap();
        let err = conn
            .execute(
                "INSERT INTO ORDERS (ID, AMOUNT) VALUES (?, ?)",
                vec![FbValue::Null, FbValue::Float(1.0)],
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("validation error"));
    }

    #[test]
    fn test_parse_insert() {
        let (table, columns) =
            parse_insert("INSERT INTO ORDERS (ID, AMOUNT) VALUES (?, ?)").unwrap();
        assert_eq!(table, "ORDERS");
        assert_eq!(columns, vec!["ID", "AMOUNT"]);
    }
}
