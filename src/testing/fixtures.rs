//! Canned datasets shared by unit and integration tests.

use crate::testing::memory::{MemoryConnector, MemoryServer};
use crate::testing::table::{TestColumn, TestTable};
use chrono::NaiveDate;
use firebird_client::ServerConfig;
use firebird_types::FbValue;

pub const SOURCE_HOST: &str = "fb-source";
pub const TARGET_HOST: &str = "fb-target";

pub fn source_config() -> ServerConfig {
    ServerConfig::new(SOURCE_HOST, "/dbs/fdb/bell.fdb", "SYSDBA", "masterkey")
}

pub fn target_config() -> ServerConfig {
    ServerConfig::new(TARGET_HOST, "/dbs/fdb/bell.fdb", "SYSDBA", "masterkey")
}

fn ordered_at(day: u32) -> FbValue {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .map(FbValue::Timestamp)
        .unwrap_or(FbValue::Null)
}

/// `ORDERS` without rows.
pub fn orders_table() -> TestTable {
    TestTable::new("ORDERS")
        .column(TestColumn::integer("ID").not_null())
        .column(TestColumn::varchar("CUSTOMER", 50))
        .column(TestColumn::double("AMOUNT"))
        .column(TestColumn::timestamp("ORDERED_AT"))
}

/// Three source orders, one of them with a NULL amount.
pub fn source_orders() -> TestTable {
    orders_table()
        .row([
            FbValue::Integer(1),
            FbValue::from("ACME"),
            FbValue::Float(120.5),
            ordered_at(1),
        ])
        .row([
            FbValue::Integer(2),
            FbValue::from("Globex"),
            FbValue::Null,
            ordered_at(2),
        ])
        .row([
            FbValue::Integer(3),
            FbValue::from("Initech"),
            FbValue::Float(9.99),
            ordered_at(3),
        ])
}

/// Five stale target orders that a sync must replace.
pub fn stale_orders() -> TestTable {
    (10..15).fold(orders_table(), |table, id| {
        table.row([
            FbValue::Integer(id),
            FbValue::from("stale"),
            FbValue::Float(0.0),
            FbValue::Null,
        ])
    })
}

/// `CUSTOMERS` with two rows.
pub fn customers() -> TestTable {
    TestTable::new("CUSTOMERS")
        .column(TestColumn::integer("ID").not_null())
        .column(TestColumn::varchar("NAME", 80).not_null())
        .row([FbValue::Integer(1), FbValue::from("ACME")])
        .row([FbValue::Integer(2), FbValue::from("Globex")])
}

/// Source and target servers wired into one connector.
pub struct Pair {
    pub source: MemoryServer,
    pub target: MemoryServer,
    pub connector: MemoryConnector,
}

impl Pair {
    pub fn new(source: MemoryServer, target: MemoryServer) -> Self {
        let connector = MemoryConnector::new()
            .with_server(SOURCE_HOST, source.clone())
            .with_server(TARGET_HOST, target.clone());
        Pair {
            source,
            target,
            connector,
        }
    }

    /// Source with `ORDERS` and `CUSTOMERS`; target with stale `ORDERS` and
    /// an empty `CUSTOMERS`.
    pub fn orders() -> Self {
        Self::new(
            MemoryServer::new()
                .with_table(source_orders())
                .with_table(customers()),
            MemoryServer::new()
                .with_table(stale_orders())
                .with_table(TestTable {
                    rows: Vec::new(),
                    ..customers()
                }),
        )
    }

    pub fn open_connections(&self) -> usize {
        self.source.open_connections() + self.target.open_connections()
    }
}
