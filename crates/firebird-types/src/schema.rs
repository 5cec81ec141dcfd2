//! Introspected table metadata.
//!
//! [`CatalogField`] is one row of the field catalog as read from the
//! server. [`ColumnInfo`] and [`TableInfo`] are the derived, read-only
//! records returned to callers.

use crate::types::{CanonicalType, FieldType};
use serde::{Deserialize, Serialize};

/// A column of a user table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,

    /// Canonical type string, e.g. `INTEGER` or `VARCHAR(255)`
    #[serde(rename = "type")]
    pub column_type: String,

    /// True when the catalog carries no NOT NULL marker for the column
    pub nullable: bool,
}

/// A user table with its columns in catalog field-position order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Column names in field-position order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn get_column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Raw field description joined from `RDB$RELATION_FIELDS` and `RDB$FIELDS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogField {
    /// Trimmed field name
    pub name: String,
    pub field_type: FieldType,
    /// `RDB$FIELD_LENGTH`, 0 when absent
    pub length: i32,
    /// `RDB$FIELD_SCALE`, 0 when absent
    pub scale: i32,
    /// `RDB$NULL_FLAG`; any value marks the column NOT NULL
    pub null_flag: Option<i32>,
    /// `RDB$FIELD_SUB_TYPE`, 0 when absent
    pub sub_type: i32,
}

impl CatalogField {
    pub fn canonical_type(&self) -> CanonicalType {
        CanonicalType::from_field(self.field_type, self.length, self.sub_type)
    }

    /// Nullability follows the absence of the null flag, not its value.
    pub fn is_nullable(&self) -> bool {
        self.null_flag.is_none()
    }

    pub fn into_column_info(self) -> ColumnInfo {
        let column_type = self.canonical_type().to_string();
        let nullable = self.is_nullable();
        ColumnInfo {
            name: self.name,
            column_type,
            nullable,
        }
    }
}
