//! Table definitions for the in-memory server
//!
//! A [`TestTable`] describes one relation as the catalog would report it:
//! its columns with field type codes and its current rows.

use firebird_types::{FbValue, FieldType};

/// A column as stored in `RDB$RELATION_FIELDS` / `RDB$FIELDS`.
#[derive(Debug, Clone, PartialEq)]
pub struct TestColumn {
    pub name: String,
    pub field_type: FieldType,
    /// `None` is reported as a NULL `RDB$FIELD_LENGTH`
    pub length: Option<i32>,
    pub scale: i32,
    /// `None` is reported as a NULL `RDB$FIELD_SUB_TYPE`
    pub sub_type: Option<i32>,
    pub not_null: bool,
    /// `RDB$FIELD_POSITION`
    pub position: i16,
}

impl TestColumn {
    fn new(name: &str, field_type: FieldType, length: i32) -> Self {
        TestColumn {
            name: name.to_string(),
            field_type,
            length: Some(length),
            scale: 0,
            sub_type: Some(0),
            not_null: false,
            position: 0,
        }
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, FieldType::LONG, 4)
    }

    pub fn bigint(name: &str) -> Self {
        Self::new(name, FieldType::INT64, 8)
    }

    pub fn double(name: &str) -> Self {
        Self::new(name, FieldType::DOUBLE, 8)
    }

    pub fn varchar(name: &str, length: i32) -> Self {
        Self::new(name, FieldType::VARYING, length)
    }

    pub fn timestamp(name: &str) -> Self {
        Self::new(name, FieldType::TIMESTAMP, 8)
    }

    pub fn blob(name: &str) -> Self {
        Self::new(name, FieldType::BLOB, 8)
    }

    /// Column with an arbitrary type code.
    pub fn raw(name: &str, code: i16, length: Option<i32>, sub_type: Option<i32>) -> Self {
        TestColumn {
            length,
            sub_type,
            ..Self::new(name, FieldType(code), 0)
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn sub_type(mut self, sub_type: i32) -> Self {
        self.sub_type = Some(sub_type);
        self
    }

    pub fn at_position(mut self, position: i16) -> Self {
        self.position = position;
        self
    }
}

/// A relation with its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TestTable {
    pub name: String,
    pub columns: Vec<TestColumn>,
    pub rows: Vec<Vec<FbValue>>,
    /// `RDB$SYSTEM_FLAG` set
    pub system: bool,
    /// `RDB$RELATION_TYPE` other than 0
    pub view: bool,
}

impl TestTable {
    pub fn new(name: &str) -> Self {
        TestTable {
            name: name.to_string(),
            columns: Vec::new(),
            rows: Vec::new(),
            system: false,
            view: false,
        }
    }

    /// Append a column; its position follows the columns added before it
    /// unless one was set explicitly.
    pub fn column(mut self, column: TestColumn) -> Self {
        let column = if column.position == 0 {
            let position = self.columns.len() as i16;
            column.at_position(position)
        } else {
            column
        };
        self.columns.push(column);
        self
    }

    /// Append a row given in column declaration order.
    pub fn row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FbValue>,
    {
        self.rows.push(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }

    pub fn view(mut self) -> Self {
        self.view = true;
        self
    }

    /// Column indices sorted by field position.
    pub fn position_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.columns.len()).collect();
        order.sort_by_key(|&i| self.columns[i].position);
        order
    }

    pub fn column_names(&self) -> Vec<String> {
        self.position_order()
            .into_iter()
            .map(|i| self.columns[i].name.clone())
            .collect()
    }
}
