use super::{CatalogColumn, CatalogError, CatalogFuture, SchemaCatalog};
use crate::traced::{Connection, TracedConn};

/// Tables and partitioned tables visible on the current `search_path`.
const TABLE_EXISTS_SQL: &str = r#"
SELECT EXISTS (
    SELECT 1
    FROM pg_catalog.pg_class c
    JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
    WHERE c.relname::text = $1
      AND c.relkind IN ('r', 'p')
      AND n.nspname = ANY (current_schemas(false))
)
"#;

const PRIMARY_KEY_SQL: &str = r#"
SELECT a.attname::text
FROM pg_catalog.pg_index i
JOIN pg_catalog.pg_attribute a
  ON a.attrelid = i.indrelid
 AND a.attnum = ANY (i.indkey)
WHERE i.indrelid = to_regclass(quote_ident($1::text))
  AND i.indisprimary
"#;

const COLUMNS_SQL: &str = r#"
SELECT a.attname::text, format_type(a.atttypid, a.atttypmod)
FROM pg_catalog.pg_attribute a
WHERE a.attrelid = to_regclass(quote_ident($1::text))
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY a.attnum
"#;

/// A [`SchemaCatalog`] backed by `pg_catalog`.
///
/// Declared types come from `format_type`, so a `varchar(36)` column is
/// reported as `character varying(36)`.
pub struct PgCatalog<'c, C: Connection + ?Sized + 'c> {
    conn: TracedConn<'c, C>,
}

impl<'c, C: Connection + ?Sized + 'c> PgCatalog<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self {
            conn: TracedConn::new(conn),
        }
    }

    async fn fetch_table_exists(&self, table: &str) -> Result<bool, CatalogError> {
        let row = self.conn.query_one(TABLE_EXISTS_SQL, &[&table]).await?;
        Ok(row.try_get(0)?)
    }

    async fn fetch_primary_key_name(&self, table: &str) -> Result<Option<String>, CatalogError> {
        let rows = self.conn.query(PRIMARY_KEY_SQL, &[&table]).await?;
        // Composite keys have no single column to point at.
        match rows.as_slice() {
            [row] => Ok(Some(row.try_get(0)?)),
            _ => Ok(None),
        }
    }

    async fn fetch_columns(&self, table: &str) -> Result<Vec<CatalogColumn>, CatalogError> {
        let rows = self.conn.query(COLUMNS_SQL, &[&table]).await?;
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            columns.push(CatalogColumn {
                name: row.try_get(0)?,
                declared_type: row.try_get(1)?,
            });
        }
        Ok(columns)
    }
}

impl<'c, C: Connection + ?Sized + 'c> SchemaCatalog for PgCatalog<'c, C> {
    fn table_exists<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, bool> {
        Box::pin(self.fetch_table_exists(table))
    }

    fn primary_key_name<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, Option<String>> {
        Box::pin(self.fetch_primary_key_name(table))
    }

    fn columns<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, Vec<CatalogColumn>> {
        Box::pin(self.fetch_columns(table))
    }
}
