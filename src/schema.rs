//! Schema introspection from the Firebird system catalog.
//!
//! User tables come from `RDB$RELATIONS`; their fields come from
//! `RDB$RELATION_FIELDS` joined to the shared domain catalog `RDB$FIELDS`.
//! Any failure while walking the catalog discards the whole table list.

use crate::error::EngineError;
use crate::types::{ServerTables, TablesPairResponse, TablesResult};
use anyhow::{anyhow, Result};
use firebird_client::{Connection, Connector, ServerConfig};
use firebird_types::{CatalogField, FbValue, FieldType, TableInfo};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Ordinary tables (relation type 0) that are not system objects.
const TABLES_SQL: &str = "
    SELECT DISTINCT r.RDB$RELATION_NAME AS TABLE_NAME
    FROM RDB$RELATIONS r
    WHERE (r.RDB$SYSTEM_FLAG = 0 OR r.RDB$SYSTEM_FLAG IS NULL)
    AND r.RDB$RELATION_TYPE = 0
    ORDER BY r.RDB$RELATION_NAME";

/// Fields of one relation in field-position order.
const COLUMNS_SQL: &str = "
    SELECT
        rf.RDB$FIELD_NAME AS COLUMN_NAME,
        f.RDB$FIELD_TYPE AS FIELD_TYPE,
        f.RDB$FIELD_LENGTH AS FIELD_LENGTH,
        f.RDB$FIELD_SCALE AS FIELD_SCALE,
        rf.RDB$NULL_FLAG AS NULL_FLAG,
        f.RDB$FIELD_SUB_TYPE AS FIELD_SUB_TYPE
    FROM RDB$RELATION_FIELDS rf
    JOIN RDB$FIELDS f ON rf.RDB$FIELD_SOURCE = f.RDB$FIELD_NAME
    WHERE rf.RDB$RELATION_NAME = ?
    ORDER BY rf.RDB$FIELD_POSITION";

pub struct SchemaIntrospector<C> {
    connector: Arc<C>,
}

impl<C: Connector> SchemaIntrospector<C> {
    pub fn new(connector: Arc<C>) -> Self {
        Self { connector }
    }

    /// List the user tables of a server with their columns.
    pub async fn list_tables(&self, config: &ServerConfig) -> TablesResult {
        info!("Getting tables from {}", config.label());

        match self.collect(config).await {
            Ok(tables) => {
                info!(
                    "Successfully retrieved {} tables from {}",
                    tables.len(),
                    config.label()
                );
                TablesResult::ok(tables)
            }
            Err(err) => {
                error!("Failed to get tables from {}: {}", config.label(), err);
                TablesResult::failed(&err)
            }
        }
    }

    /// Introspect both servers. Each side fails independently.
    pub async fn list_tables_pair(
        &self,
        server_a: &ServerConfig,
        server_b: &ServerConfig,
    ) -> TablesPairResponse {
        let (a, b) = tokio::join!(self.list_tables(server_a), self.list_tables(server_b));
        TablesPairResponse {
            server_a: ServerTables {
                host: server_a.host.clone(),
                result: a,
            },
            server_b: ServerTables {
                host: server_b.host.clone(),
                result: b,
            },
        }
    }

    async fn collect(&self, config: &ServerConfig) -> Result<Vec<TableInfo>, EngineError> {
        let mut conn = self.connector.open(config).await?;
        collect_tables(&mut *conn)
            .await
            .map_err(EngineError::catalog)
    }
}

/// Walk the catalog on an open connection.
pub async fn collect_tables(conn: &mut dyn Connection) -> Result<Vec<TableInfo>> {
    let mut names = list_table_names(conn).await?;
    names.sort();

    let mut tables = Vec::with_capacity(names.len());
    for name in names {
        let mut table = TableInfo::new(name);
        for field in list_fields(conn, &table.name).await? {
            table.columns.push(field.into_column_info());
        }
        debug!(
            "Table {} has {} columns",
            table.name,
            table.columns.len()
        );
        tables.push(table);
    }
    Ok(tables)
}

/// Trimmed, non-empty user table names in catalog order.
pub async fn list_table_names(conn: &mut dyn Connection) -> Result<Vec<String>> {
    let rs = conn.query(TABLES_SQL, Vec::new()).await?;

    let mut names = Vec::with_capacity(rs.len());
    for row in &rs.rows {
        let name = cell(row, 0)?.to_trimmed_text()?;
        if name.is_empty() {
            continue;
        }
        names.push(name);
    }
    Ok(names)
}

/// Catalog fields of `table` in field-position order.
pub async fn list_fields(conn: &mut dyn Connection, table: &str) -> Result<Vec<CatalogField>> {
    let rs = conn
        .query(COLUMNS_SQL, vec![FbValue::Text(table.to_string())])
        .await?;

    let mut fields = Vec::with_capacity(rs.len());
    for row in &rs.rows {
        let name = cell(row, 0)?.to_trimmed_text()?;
        if name.is_empty() {
            continue;
        }
        fields.push(read_field(name, row).map_err(|e| anyhow!("{table}.{e}"))?);
    }
    Ok(fields)
}

fn read_field(name: String, row: &[FbValue]) -> Result<CatalogField> {
    let code = cell(row, 1)?
        .to_opt_i32()
        .map_err(|e| anyhow!("{name}: field type: {e}"))?
        .ok_or_else(|| anyhow!("{name}: field type is missing"))?;
    let field_type = i16::try_from(code)
        .map(FieldType)
        .map_err(|_| anyhow!("{name}: field type {code} is out of range"))?;

    let length = cell(row, 2)?
        .to_opt_i32()
        .map_err(|e| anyhow!("{name}: field length: {e}"))?
        .unwrap_or(0);
    let scale = cell(row, 3)?
        .to_opt_i32()
        .map_err(|e| anyhow!("{name}: field scale: {e}"))?
        .unwrap_or(0);
    let null_flag = cell(row, 4)?
        .to_opt_i32()
        .map_err(|e| anyhow!("{name}: null flag: {e}"))?;
    let sub_type = cell(row, 5)?
        .to_opt_i32()
        .map_err(|e| anyhow!("{name}: field sub-type: {e}"))?
        .unwrap_or(0);

    Ok(CatalogField {
        name,
        field_type,
        length,
        scale,
        null_flag,
        sub_type,
    })
}

fn cell(row: &[FbValue], index: usize) -> Result<&FbValue> {
    row.get(index)
        .ok_or_else(|| anyhow!("catalog row has no column at index {index}"))
}
