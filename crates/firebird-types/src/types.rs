//! Firebird field types and their canonical names.
//!
//! `RDB$FIELDS.RDB$FIELD_TYPE` stores a small integer code per domain. The
//! engine reports columns with a canonical, vendor-independent type string
//! derived from that code, the field length and the field sub-type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw field type code as stored in `RDB$FIELDS.RDB$FIELD_TYPE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldType(pub i16);

impl FieldType {
    pub const SHORT: FieldType = FieldType(7);
    pub const LONG: FieldType = FieldType(8);
    pub const FLOAT: FieldType = FieldType(10);
    pub const DATE: FieldType = FieldType(12);
    pub const TIME: FieldType = FieldType(13);
    pub const TEXT: FieldType = FieldType(14);
    pub const INT64: FieldType = FieldType(16);
    pub const DOUBLE: FieldType = FieldType(27);
    pub const TIMESTAMP: FieldType = FieldType(35);
    pub const VARYING: FieldType = FieldType(37);
    pub const BLOB: FieldType = FieldType(261);

    /// The numeric code.
    pub fn code(self) -> i16 {
        self.0
    }
}

impl From<i16> for FieldType {
    fn from(code: i16) -> Self {
        FieldType(code)
    }
}

/// Canonical column type reported by schema introspection.
///
/// The rendered strings are compared and displayed by consumers, so the
/// mapping from `(code, length, sub_type)` is fixed:
///
/// | code | sub-type | canonical |
/// |---|---|---|
/// | 7 | any | `SMALLINT` |
/// | 8 | any | `INTEGER` |
/// | 16 | any | `BIGINT` |
/// | 10 | any | `FLOAT` |
/// | 27 | any | `DOUBLE` |
/// | 12 | any | `DATE` |
/// | 13 | any | `TIME` |
/// | 35 | any | `TIMESTAMP` |
/// | 14, 37 | 1 | `CHAR` |
/// | 14, 37 | not 1 | `VARCHAR(length)` |
/// | 261 | any | `BLOB` |
/// | other | any | `TYPE_<code>`, plus `(length)` when length > 0 |
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalType {
    SmallInt,
    Integer,
    BigInt,
    Float,
    Double,
    Date,
    Time,
    Timestamp,
    Char,
    VarChar {
        /// Byte length from `RDB$FIELD_LENGTH`
        length: i32,
    },
    Blob,
    /// Any code without a dedicated name
    Other { code: i16, length: i32 },
}

impl CanonicalType {
    /// Map a catalog field description to its canonical type.
    pub fn from_field(field_type: FieldType, length: i32, sub_type: i32) -> Self {
        match field_type {
            FieldType::SHORT => CanonicalType::SmallInt,
            FieldType::LONG => CanonicalType::Integer,
            FieldType::INT64 => CanonicalType::BigInt,
            FieldType::FLOAT => CanonicalType::Float,
            FieldType::DOUBLE => CanonicalType::Double,
            FieldType::DATE => CanonicalType::Date,
            FieldType::TIME => CanonicalType::Time,
            FieldType::TIMESTAMP => CanonicalType::Timestamp,
            FieldType::TEXT | FieldType::VARYING => {
                if sub_type == 1 {
                    CanonicalType::Char
                } else {
                    CanonicalType::VarChar { length }
                }
            }
            FieldType::BLOB => CanonicalType::Blob,
            FieldType(code) => CanonicalType::Other { code, length },
        }
    }
}

impl fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonicalType::SmallInt => f.write_str("SMALLINT"),
            CanonicalType::Integer => f.write_str("INTEGER"),
            CanonicalType::BigInt => f.write_str("BIGINT"),
            CanonicalType::Float => f.write_str("FLOAT"),
            CanonicalType::Double => f.write_str("DOUBLE"),
            CanonicalType::Date => f.write_str("DATE"),
            CanonicalType::Time => f.write_str("TIME"),
            CanonicalType::Timestamp => f.write_str("TIMESTAMP"),
            CanonicalType::Char => f.write_str("CHAR"),
            CanonicalType::VarChar { length } => write!(f, "VARCHAR({length})"),
            CanonicalType::Blob => f.write_str("BLOB"),
            CanonicalType::Other { code, length } if *length > 0 => {
                write!(f, "TYPE_{code}({length})")
            }
            CanonicalType::Other { code, .. } => write!(f, "TYPE_{code}"),
        }
    }
}

/// Canonical type name for a raw `(code, length, sub_type)` triple.
pub fn canonical_type_name(code: i16, length: i32, sub_type: i32) -> String {
    CanonicalType::from_field(FieldType(code), length, sub_type).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_types() {
        assert_eq!(canonical_type_name(7, 2, 0), "SMALLINT");
        assert_eq!(canonical_type_name(8, 4, 0), "INTEGER");
        assert_eq!(canonical_type_name(16, 8, 0), "BIGINT");
        assert_eq!(canonical_type_name(10, 4, 0), "FLOAT");
        assert_eq!(canonical_type_name(27, 8, 0), "DOUBLE");
        assert_eq!(canonical_type_name(12, 4, 0), "DATE");
        assert_eq!(canonical_type_name(13, 4, 0), "TIME");
        assert_eq!(canonical_type_name(35, 8, 0), "TIMESTAMP");
        assert_eq!(canonical_type_name(261, 8, 1), "BLOB");
    }

    #[test]
    fn test_sub_type_does_not_affect_numeric_codes() {
        // Sub-type 1 marks NUMERIC, 2 marks DECIMAL on integer storage
        assert_eq!(canonical_type_name(8, 4, 1), "INTEGER");
        assert_eq!(canonical_type_name(16, 8, 2), "BIGINT");
        assert_eq!(canonical_type_name(7, 2, 1), "SMALLINT");
    }

    #[test]
    fn test_character_types() {
        assert_eq!(canonical_type_name(14, 10, 1), "CHAR");
        assert_eq!(canonical_type_name(14, 50, 0), "VARCHAR(50)");
        assert_eq!(canonical_type_name(37, 1, 1), "CHAR");
        assert_eq!(canonical_type_name(37, 255, 0), "VARCHAR(255)");
        assert_eq!(canonical_type_name(37, 400, 4), "VARCHAR(400)");
    }

    #[test]
    fn test_unknown_codes() {
        assert_eq!(canonical_type_name(999, 10, 0), "TYPE_999(10)");
        assert_eq!(canonical_type_name(23, 1, 0), "TYPE_23(1)");
        assert_eq!(canonical_type_name(999, 0, 0), "TYPE_999");
        assert_eq!(canonical_type_name(45, -1, 0), "TYPE_45");
    }

    #[test]
    fn test_from_field_variants() {
        assert_eq!(
            CanonicalType::from_field(FieldType::VARYING, 80, 0),
            CanonicalType::VarChar { length: 80 }
        );
        assert_eq!(
            CanonicalType::from_field(FieldType(24), 16, 0),
            CanonicalType::Other {
                code: 24,
                length: 16
            }
        );
    }
}
