//! Core types for the firebird-sync engine.
//!
//! This crate provides the foundational types shared by the connection
//! layer and the sync engine:
//!
//! - [`FieldType`] / [`CanonicalType`] - Firebird field type codes and their canonical names
//! - [`FbValue`] - Tagged cell value moved between servers
//! - [`ColumnInfo`] / [`TableInfo`] - Introspected table metadata
//! - [`CatalogField`] - A raw row of the field catalog before mapping
//!
//! # Example
//!
//! ```rust
//! use firebird_types::{canonical_type_name, CanonicalType, FieldType};
//!
//! assert_eq!(canonical_type_name(37, 50, 0), "VARCHAR(50)");
//! assert_eq!(
//!     CanonicalType::from_field(FieldType::LONG, 4, 0),
//!     CanonicalType::Integer
//! );
//! ```

pub mod schema;
pub mod types;
pub mod values;

pub use schema::{CatalogField, ColumnInfo, TableInfo};
pub use types::{canonical_type_name, CanonicalType, FieldType};
pub use values::{FbValue, ValueError};
