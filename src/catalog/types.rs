//! Table, column and foreign-key descriptors
//!
//! Descriptors are plain data discovered from the live schema on every
//! invocation. They are never cached across runs.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Storage interpretation of a column, derived from its declared SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// INTEGER affinity
    Integer,
    /// REAL affinity
    Real,
    /// TEXT affinity
    Text,
    /// BLOB affinity (also columns with no declared type)
    Blob,
    /// Declared BOOLEAN, stored as 0/1
    Boolean,
    /// Declared DATETIME or TIMESTAMP
    Timestamp,
    /// NUMERIC affinity (everything else)
    Numeric,
}

impl ColumnKind {
    /// Derives the kind from a declared SQL type.
    ///
    /// Follows SQLite's affinity rules, with boolean and date-time
    /// declarations split out so they can be serialized explicitly.
    pub fn from_declared_type(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();

        if upper.contains("BOOL") {
            ColumnKind::Boolean
        } else if upper.contains("DATETIME") || upper.contains("TIMESTAMP") {
            ColumnKind::Timestamp
        } else if upper.contains("INT") {
            ColumnKind::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            ColumnKind::Text
        } else if upper.trim().is_empty() || upper.contains("BLOB") {
            ColumnKind::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            ColumnKind::Real
        } else {
            ColumnKind::Numeric
        }
    }
}

/// One column of a table, in live column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Declared SQL type, verbatim
    pub declared_type: String,
    /// Derived storage interpretation
    pub kind: ColumnKind,
    /// NOT NULL constraint present
    pub not_null: bool,
    /// 1-based position within the primary key, 0 if not part of it
    pub primary_key_position: u32,
}

impl ColumnDescriptor {
    /// Create a column from its name and declared type
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        let declared_type = declared_type.into();
        Self {
            name: name.into(),
            kind: ColumnKind::from_declared_type(&declared_type),
            declared_type,
            not_null: false,
            primary_key_position: 0,
        }
    }
}

/// (owning table, owning columns) → (referenced table, referenced columns)
///
/// Multi-column keys are parallel lists: `columns[i]` references
/// `referenced_columns[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    /// Owning (referencing) table
    pub table: String,
    /// Owning columns
    pub columns: Vec<String>,
    /// Referenced (parent) table
    pub referenced_table: String,
    /// Referenced columns
    pub referenced_columns: Vec<String>,
}

impl ForeignKeyDescriptor {
    /// Returns true if the key points back at its own table
    pub fn is_self_reference(&self) -> bool {
        self.table == self.referenced_table
    }
}

/// Structural description of one relational table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name (unique within a catalog)
    pub name: String,
    /// Columns in live order
    pub columns: Vec<ColumnDescriptor>,
    /// Primary-key column names in key order; empty for rowid tables
    pub primary_key: Vec<String>,
    /// Outgoing foreign keys
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl TableDescriptor {
    /// Create an empty descriptor
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Builder: append a column
    pub fn with_column(mut self, name: &str, declared_type: &str) -> Self {
        self.columns.push(ColumnDescriptor::new(name, declared_type));
        self
    }

    /// Builder: set the primary key
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        for (position, name) in self.primary_key.iter().enumerate() {
            if let Some(column) = self.columns.iter_mut().find(|c| &c.name == name) {
                column.primary_key_position = position as u32 + 1;
            }
        }
        self
    }

    /// Builder: add a foreign key
    pub fn with_foreign_key(
        mut self,
        columns: &[&str],
        referenced_table: &str,
        referenced_columns: &[&str],
    ) -> Self {
        self.foreign_keys.push(ForeignKeyDescriptor {
            table: self.name.clone(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            referenced_table: referenced_table.to_string(),
            referenced_columns: referenced_columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns true if the table has a column with this name
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in live order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Tables this table references, excluding itself
    pub fn dependencies(&self) -> BTreeSet<&str> {
        self.foreign_keys
            .iter()
            .filter(|fk| !fk.is_self_reference())
            .map(|fk| fk.referenced_table.as_str())
            .collect()
    }

    /// Foreign keys pointing back at this table
    pub fn self_references(&self) -> impl Iterator<Item = &ForeignKeyDescriptor> {
        self.foreign_keys.iter().filter(|fk| fk.is_self_reference())
    }

    /// Returns true if any foreign key points back at this table
    pub fn is_self_referencing(&self) -> bool {
        self.self_references().next().is_some()
    }
}
