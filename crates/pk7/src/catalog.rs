//! Read-only schema catalogs.
//!
//! The resolver only ever asks three questions: does this table exist, what
//! is its primary key called, and what are its columns' declared types.
//! [`SchemaCatalog`] is that contract; [`PgCatalog`] answers it from a live
//! Postgres connection and [`Schema`] answers it from memory.

use pk7_db_schema::Schema;
use std::future::Future;
use std::pin::Pin;

mod postgres;

pub use postgres::PgCatalog;

/// Boxed future returned by [`SchemaCatalog`] methods.
pub type CatalogFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CatalogError>> + Send + 'a>>;

/// A column as the catalog reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumn {
    pub name: String,
    /// The declared SQL type, e.g. `uuid`, `bigint`, `character varying(36)`.
    pub declared_type: String,
}

impl CatalogColumn {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// The catalog couldn't answer.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Read-only schema introspection.
///
/// Implementations must be safe to call repeatedly and must not mutate the
/// schema.
pub trait SchemaCatalog: Send + Sync {
    /// Whether a table with this name exists.
    fn table_exists<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, bool>;

    /// The name of the table's primary key column, if it has exactly one.
    fn primary_key_name<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, Option<String>>;

    /// The table's columns, in ordinal order.
    fn columns<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, Vec<CatalogColumn>>;
}

impl SchemaCatalog for Schema {
    fn table_exists<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, bool> {
        Box::pin(std::future::ready(Ok(self.get_table(table).is_some())))
    }

    fn primary_key_name<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, Option<String>> {
        let name = self
            .get_table(table)
            .and_then(|t| t.primary_key())
            .map(|c| c.name.clone());
        Box::pin(std::future::ready(Ok(name)))
    }

    fn columns<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, Vec<CatalogColumn>> {
        let columns = self
            .get_table(table)
            .map(|t| {
                t.columns
                    .iter()
                    .map(|c| CatalogColumn::new(c.name.clone(), c.pg_type.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        Box::pin(std::future::ready(Ok(columns)))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Catalog doubles shared by the cache and resolver tests.

    use super::*;
    use pk7_db_schema::{Column, PgType, Table};
    use std::sync::Mutex;

    /// A table whose primary key `id` has the given type.
    pub fn keyed_table(name: &str, pk_type: PgType) -> Table {
        Table::new(name)
            .with_column(Column::new("id", pk_type).primary_key())
            .with_column(Column::new("name", PgType::Varchar(Some(255))))
    }

    /// Wraps a [`Schema`] and records every call made against it.
    pub struct CountingCatalog {
        pub schema: Schema,
        calls: Mutex<Vec<(&'static str, String)>>,
    }

    impl CountingCatalog {
        pub fn new(schema: Schema) -> Self {
            Self {
                schema,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// How many times `op` was called for `table`.
        pub fn calls(&self, op: &str, table: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(o, t)| *o == op && t == table)
                .count()
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn record(&self, op: &'static str, table: &str) {
            self.calls.lock().unwrap().push((op, table.to_string()));
        }
    }

    impl SchemaCatalog for CountingCatalog {
        fn table_exists<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, bool> {
            self.record("table_exists", table);
            self.schema.table_exists(table)
        }

        fn primary_key_name<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, Option<String>> {
            self.record("primary_key_name", table);
            self.schema.primary_key_name(table)
        }

        fn columns<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, Vec<CatalogColumn>> {
            self.record("columns", table);
            self.schema.columns(table)
        }
    }

    /// The catalog call a [`FailingCatalog`] errors on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FailAt {
        TableExists,
        PrimaryKeyName,
        Columns,
    }

    /// Answers as if every table had a `UUID` key named `id`, except that the
    /// call at `fail_at` errors. Records every call like [`CountingCatalog`].
    pub struct FailingCatalog {
        fail_at: FailAt,
        calls: Mutex<Vec<(&'static str, String)>>,
    }

    impl FailingCatalog {
        pub fn new(fail_at: FailAt) -> Self {
            Self {
                fail_at,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self, op: &str, table: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(o, t)| *o == op && t == table)
                .count()
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn answer<'a, T: Send + 'a>(
            &self,
            op: &'static str,
            table: &str,
            stage: FailAt,
            value: T,
        ) -> CatalogFuture<'a, T> {
            self.calls.lock().unwrap().push((op, table.to_string()));
            let result = if stage == self.fail_at {
                Err(CatalogError::Unavailable(format!("{op} failed: connection reset")))
            } else {
                Ok(value)
            };
            Box::pin(std::future::ready(result))
        }
    }

    impl SchemaCatalog for FailingCatalog {
        fn table_exists<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, bool> {
            self.answer("table_exists", table, FailAt::TableExists, true)
        }

        fn primary_key_name<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, Option<String>> {
            let pk = Some("id".to_string());
            self.answer("primary_key_name", table, FailAt::PrimaryKeyName, pk)
        }

        fn columns<'a>(&'a self, table: &'a str) -> CatalogFuture<'a, Vec<CatalogColumn>> {
            let columns = vec![CatalogColumn::new("id", "uuid")];
            self.answer("columns", table, FailAt::Columns, columns)
        }
    }
}
