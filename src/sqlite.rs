//! SQLite row source and sink
//!
//! Implemented on `rusqlite::Connection`, so a `Transaction` works too
//! through deref. Identifiers are always quoted; values are always bound.

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};

use crate::catalog::TableDescriptor;
use crate::snapshot::{Row, RowSink, RowSource, SourceError, SourceResult, Value};

/// Quote an identifier for use in SQL text
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_list<'a>(columns: impl Iterator<Item = &'a str>) -> String {
    columns.map(quote_ident).collect::<Vec<_>>().join(", ")
}

/// `ORDER BY` keeping exports byte-stable: primary key, else rowid
fn order_clause(table: &TableDescriptor) -> String {
    if table.primary_key.is_empty() {
        "rowid".to_string()
    } else {
        column_list(table.primary_key.iter().map(String::as_str))
    }
}

fn read_value(table: &str, column: &str, value: ValueRef<'_>) -> SourceResult<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) if r.is_finite() => Value::Real(r),
        ValueRef::Real(r) => {
            return Err(SourceError::conversion(
                table,
                column,
                format!("real value {} has no JSON representation", r),
            ))
        }
        ValueRef::Text(bytes) => Value::Text(
            std::str::from_utf8(bytes)
                .map_err(|e| SourceError::conversion(table, column, e.to_string()))?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::blob(bytes),
    })
}

fn bind_value(table: &str, column: &str, value: &Value) -> SourceResult<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Literal(literal) => SqlValue::Text(literal.text.clone()),
        Value::Blob(blob) => SqlValue::Blob(
            blob.decode()
                .map_err(|e| SourceError::conversion(table, column, e.to_string()))?,
        ),
    })
}

impl RowSource for Connection {
    fn read_rows(&self, table: &TableDescriptor) -> SourceResult<Vec<Row>> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            column_list(table.column_names()),
            quote_ident(&table.name),
            order_clause(table)
        );

        let mut stmt = self
            .prepare(&sql)
            .map_err(|e| SourceError::database(&table.name, e))?;
        let mut rows = stmt
            .query([])
            .map_err(|e| SourceError::database(&table.name, e))?;

        let mut out = Vec::new();
        while let Some(sql_row) = rows
            .next()
            .map_err(|e| SourceError::database(&table.name, e))?
        {
            let mut row = Row::new();
            for (index, column) in table.columns.iter().enumerate() {
                let raw = sql_row
                    .get_ref(index)
                    .map_err(|e| SourceError::database(&table.name, e))?;
                row.push(&column.name, read_value(&table.name, &column.name, raw)?);
            }
            out.push(row);
        }

        Ok(out)
    }
}

impl RowSink for Connection {
    fn clear_table(&self, table: &TableDescriptor) -> SourceResult<usize> {
        self.execute(&format!("DELETE FROM {}", quote_ident(&table.name)), [])
            .map_err(|e| SourceError::database(&table.name, e))
    }

    fn insert_row(&self, table: &TableDescriptor, row: &Row) -> SourceResult<()> {
        if row.is_empty() {
            self.execute(
                &format!("INSERT INTO {} DEFAULT VALUES", quote_ident(&table.name)),
                [],
            )
            .map_err(|e| SourceError::database(&table.name, e))?;
            return Ok(());
        }

        let placeholders = (1..=row.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&table.name),
            column_list(row.columns()),
            placeholders
        );

        let values = row
            .iter()
            .map(|(column, value)| bind_value(&table.name, column, value))
            .collect::<SourceResult<Vec<_>>>()?;

        let mut stmt = self
            .prepare_cached(&sql)
            .map_err(|e| SourceError::database(&table.name, e))?;
        stmt.execute(params_from_iter(values))
            .map_err(|e| SourceError::database(&table.name, e))?;

        Ok(())
    }
}
