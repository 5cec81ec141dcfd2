//! Full-replace sync of a single table.
//!
//! The target table is cleared and reloaded from every source row. Table and
//! column names are interpolated into the SQL text; only values are bound.
//! A failure is reported in the returned [`SyncResult`] and never escapes,
//! so one table can not abort its siblings.

use crate::error::EngineError;
use crate::types::SyncResult;
use anyhow::Result;
use firebird_client::Connection;
use tracing::{debug, error, info, warn};

/// How a table's DELETE and INSERTs are applied on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Wrap the DELETE and all INSERTs of a table in one transaction and
    /// roll back on failure, reporting no rows synced. When false each
    /// statement commits on its own and a failure leaves the target table
    /// cleared and partially loaded.
    pub transactional: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            transactional: true,
        }
    }
}

pub fn select_all_sql(table: &str) -> String {
    format!("SELECT * FROM {table}")
}

pub fn delete_all_sql(table: &str) -> String {
    format!("DELETE FROM {table}")
}

/// `INSERT INTO t (a, b) VALUES (?, ?)` with one placeholder per column.
pub fn insert_sql(table: &str, columns: &[String]) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
    )
}

pub struct TableSyncer {
    options: SyncOptions,
}

impl TableSyncer {
    pub fn new(options: SyncOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> SyncOptions {
        self.options
    }

    /// Replace the contents of `table` on the target with the source rows.
    pub async fn sync_table(
        &self,
        source: &mut dyn Connection,
        target: &mut dyn Connection,
        table: &str,
    ) -> SyncResult {
        info!("Syncing table: {}", table);

        let mut inserted = 0u64;
        let outcome = if self.options.transactional {
            self.replace_in_transaction(source, target, table, &mut inserted)
                .await
        } else {
            replace(source, target, table, &mut inserted).await
        };

        match outcome {
            Ok(()) => {
                info!(
                    "Successfully synced {} records for table {}",
                    inserted, table
                );
                SyncResult::ok(table, inserted)
            }
            Err(err) => {
                let err = EngineError::table_sync(table, err);
                error!("Failed to sync table {}: {}", table, err);
                SyncResult::failed(table, inserted, &err)
            }
        }
    }

    async fn replace_in_transaction(
        &self,
        source: &mut dyn Connection,
        target: &mut dyn Connection,
        table: &str,
        inserted: &mut u64,
    ) -> Result<()> {
        target.begin_transaction().await?;

        let loaded = match replace(source, target, table, inserted).await {
            Ok(()) => target.commit().await,
            Err(err) => Err(err),
        };

        if let Err(err) = loaded {
            match target.rollback().await {
                Ok(()) => debug!("Rolled back {} inserted rows of {}", inserted, table),
                // The server discards an uncommitted transaction with its attachment
                Err(rollback_err) => warn!(
                    "Rollback of table {} failed, {} uncommitted rows are discarded with the connection: {:#}",
                    table, inserted, rollback_err
                ),
            }
            *inserted = 0;
            return Err(err);
        }
        Ok(())
    }
}

impl Default for TableSyncer {
    fn default() -> Self {
        Self::new(SyncOptions::default())
    }
}

/// Read, clear, reload. `inserted` counts rows as they are written.
async fn replace(
    source: &mut dyn Connection,
    target: &mut dyn Connection,
    table: &str,
    inserted: &mut u64,
) -> Result<()> {
    let rows = source.query(&select_all_sql(table), Vec::new()).await?;
    debug!(
        "Read {} rows with {} columns from {}",
        rows.len(),
        rows.columns.len(),
        table
    );

    target.execute(&delete_all_sql(table), Vec::new()).await?;

    if rows.is_empty() {
        return Ok(());
    }

    let insert = insert_sql(table, &rows.columns);
    for row in rows.rows {
        target.execute(&insert, row).await?;
        *inserted += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql_has_one_placeholder_per_column() {
        let columns = vec!["ID".to_string(), "AMOUNT".to_string(), "NOTE".to_string()];
        assert_eq!(
            insert_sql("ORDERS", &columns),
            "INSERT INTO ORDERS (ID, AMOUNT, NOTE) VALUES (?, ?, ?)"
        );
    }

    #[test]
    fn test_statement_text() {
        assert_eq!(select_all_sql("ORDERS"), "SELECT * FROM ORDERS");
        assert_eq!(delete_all_sql("ORDERS"), "DELETE FROM ORDERS");
    }

    #[test]
    fn test_transactional_by_default() {
        assert!(TableSyncer::default().options().transactional);
    }
}
