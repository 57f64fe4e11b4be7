//! Bookkeeping tables.

use pk7_sql::quote_ident;

/// Name of the table recording applied migrations.
pub const MIGRATIONS_TABLE: &str = "__pk7_migrations";

/// Create the bookkeeping tables if they don't exist yet.
pub fn create_meta_tables_sql() -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    \
             \"version\" TEXT PRIMARY KEY,\n    \
             \"name\" TEXT NOT NULL,\n    \
             \"applied_at\" TIMESTAMPTZ NOT NULL DEFAULT now(),\n    \
             \"duration_ms\" BIGINT NOT NULL\n\
         );",
        quote_ident(MIGRATIONS_TABLE)
    )
}

/// Insert one applied migration. Parameters: version, name, duration in ms.
pub fn record_migration_sql() -> String {
    format!(
        "INSERT INTO {} (\"version\", \"name\", \"duration_ms\") VALUES ($1, $2, $3)",
        quote_ident(MIGRATIONS_TABLE)
    )
}

/// Applied migrations, oldest version first.
pub fn applied_migrations_sql() -> String {
    format!(
        "SELECT \"version\", \"name\", \"applied_at\" FROM {} ORDER BY \"version\"",
        quote_ident(MIGRATIONS_TABLE)
    )
}
