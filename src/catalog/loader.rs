//! Live-schema introspection
//!
//! Columns come from `pragma_table_info`, foreign keys from
//! `pragma_foreign_key_list`. Only allow-listed tables are described;
//! bookkeeping tables in the same file are never touched.

use std::collections::BTreeMap;

use rusqlite::{params, Connection, OptionalExtension};

use super::errors::{CatalogError, CatalogResult};
use super::types::{ColumnDescriptor, ColumnKind, ForeignKeyDescriptor, TableDescriptor};

/// Reads table descriptors for an explicit allow-list of tables.
pub struct SchemaCatalog<'c> {
    conn: &'c Connection,
    tables: Vec<String>,
}

/// One row of `pragma_foreign_key_list`
struct ForeignKeyPart {
    seq: i64,
    referenced_table: String,
    from: String,
    to: Option<String>,
}

impl<'c> SchemaCatalog<'c> {
    /// Create a catalog over `conn` restricted to `tables`.
    pub fn new(conn: &'c Connection, tables: &[String]) -> Self {
        Self {
            conn,
            tables: tables.to_vec(),
        }
    }

    /// Allow-listed table names, in configuration order
    pub fn table_names(&self) -> &[String] {
        &self.tables
    }

    /// Describe every allow-listed table, in allow-list order.
    ///
    /// Fails if a table is missing, cannot be introspected, or has a
    /// foreign key pointing outside the allow-list.
    pub fn load(&self) -> CatalogResult<Vec<TableDescriptor>> {
        let mut descriptors = Vec::with_capacity(self.tables.len());

        for name in &self.tables {
            descriptors.push(self.load_table(name)?);
        }

        Ok(descriptors)
    }

    fn load_table(&self, name: &str) -> CatalogResult<TableDescriptor> {
        if !self.table_exists(name)? {
            return Err(CatalogError::MissingTable(name.to_string()));
        }

        let columns = self.load_columns(name)?;

        let mut keyed: Vec<&ColumnDescriptor> =
            columns.iter().filter(|c| c.primary_key_position > 0).collect();
        keyed.sort_by_key(|c| c.primary_key_position);
        let primary_key = keyed.iter().map(|c| c.name.clone()).collect();

        let foreign_keys = self.load_foreign_keys(name)?;

        Ok(TableDescriptor {
            name: name.to_string(),
            columns,
            primary_key,
            foreign_keys,
        })
    }

    fn table_exists(&self, name: &str) -> CatalogResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| introspection(name, e))?;
        Ok(found.is_some())
    }

    fn load_columns(&self, table: &str) -> CatalogResult<Vec<ColumnDescriptor>> {
        let mut stmt = self
            .conn
            .prepare(r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?1) ORDER BY cid"#)
            .map_err(|e| introspection(table, e))?;

        let rows = stmt
            .query_map(params![table], |row| {
                let declared_type: String = row.get(1)?;
                Ok(ColumnDescriptor {
                    name: row.get(0)?,
                    kind: ColumnKind::from_declared_type(&declared_type),
                    declared_type,
                    not_null: row.get::<_, i64>(2)? != 0,
                    primary_key_position: row.get::<_, i64>(3)? as u32,
                })
            })
            .map_err(|e| introspection(table, e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| introspection(table, e))
    }

    fn load_foreign_keys(&self, table: &str) -> CatalogResult<Vec<ForeignKeyDescriptor>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"SELECT id, seq, "table", "from", "to" FROM pragma_foreign_key_list(?1) ORDER BY id, seq"#,
            )
            .map_err(|e| introspection(table, e))?;

        let rows = stmt
            .query_map(params![table], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    ForeignKeyPart {
                        seq: row.get(1)?,
                        referenced_table: row.get(2)?,
                        from: row.get(3)?,
                        to: row.get(4)?,
                    },
                ))
            })
            .map_err(|e| introspection(table, e))?;

        // Multi-column keys arrive as several rows sharing an id
        let mut grouped: BTreeMap<i64, Vec<ForeignKeyPart>> = BTreeMap::new();
        for row in rows {
            let (id, part) = row.map_err(|e| introspection(table, e))?;
            grouped.entry(id).or_default().push(part);
        }

        let mut foreign_keys = Vec::with_capacity(grouped.len());
        for (id, mut parts) in grouped {
            parts.sort_by_key(|p| p.seq);
            foreign_keys.push(self.resolve_foreign_key(table, id, parts)?);
        }

        Ok(foreign_keys)
    }

    fn resolve_foreign_key(
        &self,
        table: &str,
        id: i64,
        parts: Vec<ForeignKeyPart>,
    ) -> CatalogResult<ForeignKeyDescriptor> {
        let declared_parent = parts
            .first()
            .map(|p| p.referenced_table.clone())
            .ok_or_else(|| CatalogError::UnresolvedForeignKey {
                table: table.to_string(),
                id,
                reason: "no columns".to_string(),
            })?;

        // SQLite table names are case-insensitive; use the allow-list spelling
        let referenced_table = self
            .tables
            .iter()
            .find(|t| t.eq_ignore_ascii_case(&declared_parent))
            .cloned()
            .ok_or_else(|| CatalogError::ExternalReference {
                table: table.to_string(),
                referenced: declared_parent.clone(),
            })?;

        let columns: Vec<String> = parts.iter().map(|p| p.from.clone()).collect();

        let referenced_columns = if parts.iter().all(|p| p.to.is_some()) {
            parts.into_iter().filter_map(|p| p.to).collect()
        } else {
            // REFERENCES parent without a column list targets the parent key
            self.primary_key_of(&referenced_table)?
        };

        if referenced_columns.len() != columns.len() {
            return Err(CatalogError::UnresolvedForeignKey {
                table: table.to_string(),
                id,
                reason: format!(
                    "{} column(s) reference {} column(s) of '{}'",
                    columns.len(),
                    referenced_columns.len(),
                    referenced_table
                ),
            });
        }

        Ok(ForeignKeyDescriptor {
            table: table.to_string(),
            columns,
            referenced_table,
            referenced_columns,
        })
    }

    fn primary_key_of(&self, table: &str) -> CatalogResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk")
            .map_err(|e| introspection(table, e))?;
        let names = stmt
            .query_map(params![table], |row| row.get::<_, String>(0))
            .map_err(|e| introspection(table, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| introspection(table, e))?;
        Ok(names)
    }
}

fn introspection(table: &str, source: rusqlite::Error) -> CatalogError {
    CatalogError::Introspection {
        table: table.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tables: &[&str]) -> Vec<String> {
        tables.iter().map(|t| t.to_string()).collect()
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE "group" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR NOT NULL UNIQUE
            );
            CREATE TABLE "user" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR NOT NULL,
                email VARCHAR NOT NULL,
                age INTEGER,
                createdAt DATETIME,
                groupId INTEGER REFERENCES "group"(id)
            );
            CREATE TABLE migrations (id INTEGER PRIMARY KEY, name TEXT);
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_load_columns_in_live_order() {
        let conn = setup();
        let catalog = SchemaCatalog::new(&conn, &names(&["group", "user"]));
        let tables = catalog.load().unwrap();

        assert_eq!(tables.len(), 2);
        let user = &tables[1];
        let columns: Vec<&str> = user.column_names().collect();
        assert_eq!(columns, vec!["id", "name", "email", "age", "createdAt", "groupId"]);
        assert_eq!(user.primary_key, vec!["id"]);
        assert_eq!(user.column("createdAt").unwrap().kind, ColumnKind::Timestamp);
        assert!(user.column("name").unwrap().not_null);
    }

    #[test]
    fn test_load_discovers_foreign_keys() {
        let conn = setup();
        let tables = SchemaCatalog::new(&conn, &names(&["group", "user"]))
            .load()
            .unwrap();

        let user = &tables[1];
        assert_eq!(user.foreign_keys.len(), 1);
        let fk = &user.foreign_keys[0];
        assert_eq!(fk.table, "user");
        assert_eq!(fk.columns, vec!["groupId"]);
        assert_eq!(fk.referenced_table, "group");
        assert_eq!(fk.referenced_columns, vec!["id"]);
        assert!(tables[0].foreign_keys.is_empty());
    }

    #[test]
    fn test_allow_list_excludes_bookkeeping_tables() {
        let conn = setup();
        let tables = SchemaCatalog::new(&conn, &names(&["group"])).load().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "group");
    }

    #[test]
    fn test_missing_table_fails() {
        let conn = setup();
        let err = SchemaCatalog::new(&conn, &names(&["group", "ghost"]))
            .load()
            .unwrap_err();
        assert!(matches!(err, CatalogError::MissingTable(ref t) if t == "ghost"));
    }

    #[test]
    fn test_table_names_match_case_insensitively() {
        let conn = setup();
        let tables = SchemaCatalog::new(&conn, &names(&["Group", "USER"]))
            .load()
            .unwrap();

        assert_eq!(tables[0].name, "Group");
        assert_eq!(tables[1].columns.len(), 6);
        assert_eq!(tables[1].foreign_keys[0].referenced_table, "Group");
    }

    #[test]
    fn test_reference_outside_allow_list_fails() {
        let conn = setup();
        let err = SchemaCatalog::new(&conn, &names(&["user"])).load().unwrap_err();
        assert!(matches!(err, CatalogError::ExternalReference { .. }));
    }

    #[test]
    fn test_implicit_parent_key_and_composite_keys() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE region (country TEXT, code TEXT, PRIMARY KEY (country, code));
             CREATE TABLE office (
                 id INTEGER PRIMARY KEY,
                 country TEXT,
                 code TEXT,
                 FOREIGN KEY (country, code) REFERENCES region
             );
             CREATE TABLE category (
                 id INTEGER PRIMARY KEY,
                 parentId INTEGER REFERENCES category(id)
             );",
        )
        .unwrap();

        let tables = SchemaCatalog::new(&conn, &names(&["region", "office", "category"]))
            .load()
            .unwrap();

        assert_eq!(tables[0].primary_key, vec!["country", "code"]);
        let fk = &tables[1].foreign_keys[0];
        assert_eq!(fk.columns, vec!["country", "code"]);
        assert_eq!(fk.referenced_columns, vec!["country", "code"]);
        assert!(tables[2].is_self_referencing());
    }
}
