//! Migration registration and execution.

use crate::cache::SchemaTypeCache;
use crate::catalog::PgCatalog;
use crate::classify::PrimaryKeyKind;
use crate::dsl::{ReferenceDeclaration, TableDefinition};
use crate::meta::{applied_migrations_sql, create_meta_tables_sql, record_migration_sql};
use crate::resolver::{ForeignKeyTypeResolver, ReferenceTyping, Resolution};
use crate::settings::ResolverSettings;
use crate::statements::{ConnectionStatements, SchemaStatements};
use crate::traced::{Connection, TracedConn};
use crate::{Error, MigrationFn, Result};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// A registered migration.
#[derive(Clone, Copy)]
pub struct Migration {
    /// Sort key, e.g. `2026_01_18_120000`.
    pub version: &'static str,
    pub name: &'static str,
    pub run: MigrationFn,
}

impl Migration {
    pub const fn new(version: &'static str, name: &'static str, run: MigrationFn) -> Self {
        Self { version, name, run }
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A row of the migrations table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: String,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

/// A registered migration and whether it has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: String,
    pub name: String,
    pub applied_at: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// A migration applied by [`MigrationRunner::migrate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RanMigration {
    pub version: String,
    pub name: String,
    pub duration: Duration,
}

/// What a migration function gets to work with.
///
/// Reference declarations made through the context are typed against the
/// live schema; see [`ForeignKeyTypeResolver`].
pub struct MigrationContext<'a> {
    conn: TracedConn<'a, dyn Connection + 'a>,
    catalog: PgCatalog<'a, dyn Connection + 'a>,
    cache: &'a mut SchemaTypeCache,
    settings: ResolverSettings,
}

impl<'a> MigrationContext<'a> {
    pub fn new(
        conn: &'a (dyn Connection + 'a),
        cache: &'a mut SchemaTypeCache,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            conn: TracedConn::new(conn),
            catalog: PgCatalog::new(conn),
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Run raw SQL, returning the number of rows affected.
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        Ok(self.conn.execute(sql, &[]).await?)
    }

    /// Create a table with the configured default primary key.
    pub async fn create_table<F>(&mut self, name: &str, build: F) -> Result<()>
    where
        F: FnOnce(&mut TableDefinition),
    {
        let mut table = TableDefinition::new(name, self.settings.default_primary_key());
        build(&mut table);
        self.create_table_with(table).await
    }

    /// Create a table from a full definition.
    pub async fn create_table_with(&mut self, table: TableDefinition) -> Result<()> {
        self.statements().create_table(table).await
    }

    pub async fn add_reference(
        &mut self,
        table: &str,
        reference: impl Into<ReferenceDeclaration>,
    ) -> Result<()> {
        self.statements().add_reference(table, reference.into()).await
    }

    pub async fn add_belongs_to(
        &mut self,
        table: &str,
        reference: impl Into<ReferenceDeclaration>,
    ) -> Result<()> {
        self.statements().add_belongs_to(table, reference.into()).await
    }

    /// Resolve a reference without running anything.
    pub async fn resolve(
        &mut self,
        reference: impl Into<ReferenceDeclaration>,
    ) -> (ReferenceDeclaration, Resolution) {
        let mut reference = reference.into();
        let resolution = self.resolver().resolve(&mut reference).await;
        (reference, resolution)
    }

    pub async fn primary_key_kind(&mut self, table: &str) -> PrimaryKeyKind {
        self.resolver().primary_key_kind(table).await
    }

    fn resolver(&mut self) -> ForeignKeyTypeResolver<'_> {
        ForeignKeyTypeResolver::new(&self.catalog, self.cache, &self.settings)
    }

    fn statements(&mut self) -> ReferenceTyping<'_, ConnectionStatements<'a, dyn Connection + 'a>> {
        let inner = ConnectionStatements::new(self.conn.inner());
        ReferenceTyping::new(inner, self.resolver())
    }
}

/// Applies registered migrations in version order.
pub struct MigrationRunner<'a> {
    conn: &'a (dyn Connection + 'a),
    settings: ResolverSettings,
    migrations: Vec<Migration>,
}

impl<'a> MigrationRunner<'a> {
    /// A runner over every migration registered with [`migration!`](crate::migration).
    pub fn new(conn: &'a (dyn Connection + 'a), settings: ResolverSettings) -> Self {
        let migrations = inventory::iter::<Migration>.into_iter().copied().collect();
        Self::with_migrations(conn, settings, migrations)
    }

    /// A runner over an explicit list of migrations.
    pub fn with_migrations(
        conn: &'a (dyn Connection + 'a),
        settings: ResolverSettings,
        mut migrations: Vec<Migration>,
    ) -> Self {
        migrations.sort_by_key(|m| m.version);
        Self {
            conn,
            settings,
            migrations,
        }
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Apply every pending migration.
    ///
    /// All migrations of one call share a single [`SchemaTypeCache`]. Each
    /// migration runs in its own transaction together with its bookkeeping
    /// row; the first failure rolls that migration back and stops the run.
    pub async fn migrate(&self) -> Result<Vec<RanMigration>> {
        self.check_duplicates()?;

        let conn = TracedConn::new(self.conn);
        conn.batch_execute(&create_meta_tables_sql()).await?;

        let applied: HashSet<String> = self
            .applied()
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect();

        let mut cache = SchemaTypeCache::new();
        let mut ran = Vec::new();

        for migration in &self.migrations {
            if applied.contains(migration.version) {
                continue;
            }

            let span = tracing::info_span!(
                "migration",
                version = migration.version,
                migration = migration.name
            );
            let started = Instant::now();

            conn.batch_execute("BEGIN").await?;
            let outcome = self
                .apply(migration, &mut cache, started)
                .instrument(span)
                .await;

            if let Err(error) = outcome {
                if let Err(rollback) = conn.batch_execute("ROLLBACK").await {
                    tracing::warn!(
                        version = migration.version,
                        error = %rollback,
                        "rollback failed"
                    );
                }
                return Err(error);
            }
            conn.batch_execute("COMMIT").await?;

            let duration = started.elapsed();
            tracing::info!(
                version = migration.version,
                migration = migration.name,
                ?duration,
                "applied migration"
            );
            ran.push(RanMigration {
                version: migration.version.to_string(),
                name: migration.name.to_string(),
                duration,
            });
        }

        Ok(ran)
    }

    /// Every registered migration, with when it was applied if it was.
    pub async fn status(&self) -> Result<Vec<MigrationStatus>> {
        let conn = TracedConn::new(self.conn);
        conn.batch_execute(&create_meta_tables_sql()).await?;

        let applied: HashMap<String, DateTime<Utc>> = self
            .applied()
            .await?
            .into_iter()
            .map(|m| (m.version, m.applied_at))
            .collect();

        Ok(self
            .migrations
            .iter()
            .map(|m| MigrationStatus {
                version: m.version.to_string(),
                name: m.name.to_string(),
                applied_at: applied.get(m.version).copied(),
            })
            .collect())
    }

    /// Rows of the migrations table. The table must exist.
    pub async fn applied(&self) -> Result<Vec<AppliedMigration>> {
        let rows = TracedConn::new(self.conn)
            .query(&applied_migrations_sql(), &[])
            .await?;

        let mut applied = Vec::with_capacity(rows.len());
        for row in &rows {
            applied.push(AppliedMigration {
                version: row.try_get(0)?,
                name: row.try_get(1)?,
                applied_at: row.try_get(2)?,
            });
        }
        Ok(applied)
    }

    fn check_duplicates(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for migration in &self.migrations {
            if !seen.insert(migration.version) {
                return Err(Error::DuplicateVersion {
                    version: migration.version.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn apply(
        &self,
        migration: &Migration,
        cache: &mut SchemaTypeCache,
        started: Instant,
    ) -> Result<()> {
        let mut ctx = MigrationContext::new(self.conn, cache, self.settings);
        (migration.run)(&mut ctx)
            .await
            .map_err(|e| Error::Migration(format!("{}: {}", migration.version, e)))?;

        let duration_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
        TracedConn::new(self.conn)
            .execute(
                &record_migration_sql(),
                &[&migration.version, &migration.name, &duration_ms],
            )
            .await?;
        Ok(())
    }
}
