//! Structural checks against catalog metadata.
//!
//! Table names coming from the submission are bound as query parameters for
//! every catalog lookup. Statements that need a table as an identifier go
//! through [`Verifier::resolve`] first, which only succeeds for tables and
//! views that exist in the checked schema.

use std::fmt;

use crate::sql::quote_ident;
use crate::traced::{Connection, TracedConn};
use crate::value::{Record, from_row};
use crate::{Error, Result};

/// Every table and view in a schema.
const TABLES_SQL: &str = r#"
SELECT table_name::text
FROM information_schema.tables
WHERE table_schema::text = $1
ORDER BY table_name
"#;

const TABLE_EXISTS_SQL: &str = r#"
SELECT table_name::text
FROM information_schema.tables
WHERE table_schema::text = $1
  AND table_name::text = $2
"#;

const COLUMNS_SQL: &str = r#"
SELECT column_name::text
FROM information_schema.columns
WHERE table_schema::text = $1
  AND table_name::text = $2
ORDER BY ordinal_position
"#;

const PRIMARY_KEY_SQL: &str = r#"
SELECT kcu.column_name::text
FROM information_schema.table_constraints AS tc
JOIN information_schema.key_column_usage AS kcu
  ON kcu.constraint_schema = tc.constraint_schema
 AND kcu.constraint_name = tc.constraint_name
 AND kcu.table_name = tc.table_name
WHERE tc.constraint_type = 'PRIMARY KEY'
  AND tc.table_schema::text = $1
  AND tc.table_name::text = $2
ORDER BY kcu.ordinal_position
"#;

/// Columns of `$2` whose foreign key references the primary-key column of
/// `$3`. The referenced key is looked up per constraint and must be a single
/// column; a composite key on the referenced side never matches.
const FOREIGN_KEY_SQL: &str = r#"
SELECT att.attname::text
FROM pg_catalog.pg_constraint AS fk
JOIN pg_catalog.pg_class AS src ON src.oid = fk.conrelid
JOIN pg_catalog.pg_namespace AS ns ON ns.oid = src.relnamespace
JOIN pg_catalog.pg_class AS dst ON dst.oid = fk.confrelid
CROSS JOIN LATERAL unnest(fk.conkey, fk.confkey) AS k(src_col, dst_col)
JOIN pg_catalog.pg_attribute AS att
  ON att.attrelid = fk.conrelid
 AND att.attnum = k.src_col
WHERE fk.contype = 'f'
  AND ns.nspname = $1
  AND src.relname = $2
  AND dst.relname = $3
  AND dst.relnamespace = src.relnamespace
  AND k.dst_col = (
      SELECT pk.conkey[1]
      FROM pg_catalog.pg_constraint AS pk
      WHERE pk.conrelid = fk.confrelid
        AND pk.contype = 'p'
        AND cardinality(pk.conkey) = 1
  )
ORDER BY att.attnum
"#;

/// A table or view that was found in the catalog.
///
/// Only [`Verifier::resolve`] builds these, so its `Display` form is safe to
/// splice into SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    schema: String,
    name: String,
}

impl TableRef {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }
}

/// Answers structural questions about one schema.
///
/// Holds no state besides the borrowed connection; every call is a fresh
/// round trip.
pub struct Verifier<'a, C: Connection> {
    conn: TracedConn<'a, C>,
    schema: &'a str,
}

impl<'a, C: Connection> Verifier<'a, C> {
    pub fn new(conn: &'a C, schema: &'a str) -> Self {
        Self {
            conn: TracedConn::new(conn),
            schema,
        }
    }

    /// Names of all tables and views in the schema.
    pub async fn tables(&self) -> Result<Vec<String>> {
        let rows = self.conn.query(TABLES_SQL, &[&self.schema]).await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    /// Look `table` up in the catalog.
    pub async fn resolve(&self, table: &str) -> Result<TableRef> {
        let rows = self
            .conn
            .query(TABLE_EXISTS_SQL, &[&self.schema, &table])
            .await?;
        match rows.first() {
            Some(row) => Ok(TableRef {
                schema: self.schema.to_string(),
                name: row.get(0),
            }),
            None => Err(Error::UnknownTable {
                schema: self.schema.to_string(),
                table: table.to_string(),
            }),
        }
    }

    /// Number of rows in `table`.
    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        let table = self.resolve(table).await?;
        let sql = format!("SELECT COUNT(*) FROM {table}");
        let row = self.conn.query_one(&sql, &[]).await?;
        Ok(row.get(0))
    }

    /// Column names of a table or view, in ordinal order.
    pub async fn columns(&self, table: &str) -> Result<Vec<String>> {
        let table = self.resolve(table).await?;
        let rows = self
            .conn
            .query(COLUMNS_SQL, &[&self.schema, &table.name()])
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    /// Columns of `table` with a foreign key to the primary key of
    /// `referenced`.
    pub async fn foreign_key_columns(&self, table: &str, referenced: &str) -> Result<Vec<String>> {
        let table = self.resolve(table).await?;
        let referenced = self.resolve(referenced).await?;
        let rows = self
            .conn
            .query(
                FOREIGN_KEY_SQL,
                &[&self.schema, &table.name(), &referenced.name()],
            )
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    /// Whether exactly one column of `table` references the primary key of
    /// `referenced`.
    ///
    /// No such column and several such columns both count as `false`.
    pub async fn has_foreign_key(&self, table: &str, referenced: &str) -> Result<bool> {
        let columns = self.foreign_key_columns(table, referenced).await?;
        Ok(columns.len() == 1)
    }

    /// Primary-key columns of `table`, in key order. Empty without a key.
    pub async fn primary_key_columns(&self, table: &str) -> Result<Vec<String>> {
        let table = self.resolve(table).await?;
        let rows = self
            .conn
            .query(PRIMARY_KEY_SQL, &[&self.schema, &table.name()])
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    /// Whether the primary key of `table` spans more than one column.
    pub async fn has_composite_primary_key(&self, table: &str) -> Result<bool> {
        Ok(self.primary_key_columns(table).await?.len() > 1)
    }

    /// Run an analytical script, typically one that creates a view.
    ///
    /// On error any transaction the script left open is rolled back, so later
    /// calls on the same connection keep working.
    pub async fn run_script(&self, sql: &str) -> Result<()> {
        self.conn.batch_execute_or_rollback(sql).await?;
        Ok(())
    }

    /// Every row of a table or view, in the order the server returns them.
    pub async fn fetch_rows(&self, table: &str) -> Result<Vec<Record>> {
        let table = self.resolve(table).await?;
        let sql = format!("SELECT * FROM {table}");
        let rows = self.conn.query(&sql, &[]).await?;
        rows.iter().map(from_row).collect()
    }
}
