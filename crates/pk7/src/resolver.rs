//! Foreign key type resolution.
//!
//! A reference column has to match the primary key it points at: a
//! `user_id BIGINT` can't hold a UUID. [`ForeignKeyTypeResolver`] looks at
//! the referenced table and switches the column to `UUID` when the target's
//! key is UUID-shaped. Anything it can't figure out is left alone.
//!
//! The order of precedence:
//!
//! 1. An explicit type (anything but the `bigint` placeholder) always wins.
//! 2. Polymorphic references follow the [`PolymorphicPolicy`].
//! 3. A reference from a table being created back to itself follows that
//!    table's own primary key.
//! 4. Everything else is classified from the catalog, once per table per run.

use crate::cache::SchemaTypeCache;
use crate::catalog::SchemaCatalog;
use crate::classify::PrimaryKeyKind;
use crate::dsl::{PrimaryKey, ReferenceDeclaration, TableDefinition};
use crate::polymorphic::PolymorphicPolicy;
use crate::settings::ResolverSettings;
use crate::statements::{SchemaStatements, StatementFuture};
use pk7_db_schema::PgType;
use std::fmt;

/// Where a reference's type came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The author gave a type; it was forwarded untouched.
    Explicit(PgType),
    /// The type was inferred from the target's primary key.
    Inferred { target: Target, kind: PrimaryKeyKind },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Table(String),
    Polymorphic,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Table(table) => write!(f, "{}", table),
            Target::Polymorphic => write!(f, "(polymorphic)"),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Explicit(pg_type) => write!(f, "explicit {}", pg_type),
            Resolution::Inferred { target, kind } => {
                write!(f, "{} primary key on {}", kind, target)
            }
        }
    }
}

/// Types reference columns for one migration run.
pub struct ForeignKeyTypeResolver<'run> {
    catalog: &'run dyn SchemaCatalog,
    cache: &'run mut SchemaTypeCache,
    polymorphic: PolymorphicPolicy,
}

impl<'run> ForeignKeyTypeResolver<'run> {
    pub fn new(
        catalog: &'run dyn SchemaCatalog,
        cache: &'run mut SchemaTypeCache,
        settings: &ResolverSettings,
    ) -> Self {
        Self {
            catalog,
            cache,
            polymorphic: settings.polymorphic_policy(),
        }
    }

    /// Decide the type of `reference`'s `_id` column, setting
    /// [`column_type`](ReferenceDeclaration::column_type) to `UUID` when the
    /// target is UUID-keyed.
    ///
    /// Never fails. When the target is missing, has no single primary key,
    /// or can't be introspected, the declaration is forwarded unchanged.
    pub async fn resolve(&mut self, reference: &mut ReferenceDeclaration) -> Resolution {
        if let Some(explicit) = reference.explicit_type() {
            tracing::debug!(
                reference = %reference.name,
                column_type = %explicit,
                "keeping explicit reference type"
            );
            return Resolution::Explicit(explicit);
        }

        let (target, kind) = if reference.polymorphic {
            (Target::Polymorphic, self.polymorphic.resolve(self.cache))
        } else {
            let table = reference.target_table();
            let kind = self.cache.lookup_or_compute(&table, self.catalog).await;
            (Target::Table(table), kind)
        };

        if kind.is_uuid() {
            reference.column_type = Some(PgType::Uuid);
        }

        tracing::debug!(
            reference = %reference.name,
            %target,
            %kind,
            column_type = %reference.effective_type(),
            "resolved reference type"
        );

        Resolution::Inferred { target, kind }
    }

    /// [`resolve`](Self::resolve) for a reference declared inside the
    /// `CREATE TABLE` of `table`, whose key is `own_key`.
    ///
    /// The table doesn't exist yet, so a reference back to it is typed from
    /// `own_key` instead of the catalog, and nothing is cached for it.
    pub async fn resolve_in_table(
        &mut self,
        reference: &mut ReferenceDeclaration,
        table: &str,
        own_key: PrimaryKey,
    ) -> Resolution {
        if reference.explicit_type().is_some()
            || reference.polymorphic
            || reference.target_table() != table
        {
            return self.resolve(reference).await;
        }

        let kind = own_key.kind();
        if kind.is_uuid() {
            reference.column_type = Some(PgType::Uuid);
        }

        tracing::debug!(
            reference = %reference.name,
            table,
            %kind,
            column_type = %reference.effective_type(),
            "resolved self reference type"
        );

        Resolution::Inferred {
            target: Target::Table(table.to_string()),
            kind,
        }
    }

    /// The primary key kind of `table`, through the run's cache.
    pub async fn primary_key_kind(&mut self, table: &str) -> PrimaryKeyKind {
        self.cache.lookup_or_compute(table, self.catalog).await
    }
}

/// Wraps a [`SchemaStatements`] executor so every reference it sees is
/// resolved first.
pub struct ReferenceTyping<'run, S> {
    inner: S,
    resolver: ForeignKeyTypeResolver<'run>,
}

impl<'run, S: SchemaStatements> ReferenceTyping<'run, S> {
    pub fn new(inner: S, resolver: ForeignKeyTypeResolver<'run>) -> Self {
        Self { inner, resolver }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<'run, S: SchemaStatements> SchemaStatements for ReferenceTyping<'run, S> {
    fn create_table<'a>(&'a mut self, mut table: TableDefinition) -> StatementFuture<'a> {
        Box::pin(async move {
            let name = table.name().to_string();
            let own_key = table.primary_key();
            for reference in table.reference_declarations_mut() {
                self.resolver.resolve_in_table(reference, &name, own_key).await;
            }
            self.inner.create_table(table).await
        })
    }

    fn add_reference<'a>(
        &'a mut self,
        table: &'a str,
        mut reference: ReferenceDeclaration,
    ) -> StatementFuture<'a> {
        Box::pin(async move {
            self.resolver.resolve(&mut reference).await;
            self.inner.add_reference(table, reference).await
        })
    }

    fn add_belongs_to<'a>(
        &'a mut self,
        table: &'a str,
        mut reference: ReferenceDeclaration,
    ) -> StatementFuture<'a> {
        Box::pin(async move {
            self.resolver.resolve(&mut reference).await;
            self.inner.add_belongs_to(table, reference).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{CountingCatalog, FailAt, FailingCatalog, keyed_table};
    use crate::statements::SqlScript;
    use pk7_config::PrimaryKeyPolicy;
    use pk7_db_schema::{Column, Schema, Table};

    fn schema() -> Schema {
        Schema::new()
            .with_table(keyed_table("users", PgType::Uuid))
            .with_table(keyed_table("categories", PgType::Uuid))
            .with_table(keyed_table("tokens", PgType::Varchar(Some(36))))
            .with_table(keyed_table("legacy_items", PgType::BigSerial))
            .with_table(keyed_table("accounts", PgType::Integer))
            .with_table(keyed_table("slugs", PgType::Varchar(Some(255))))
            .with_table(keyed_table("notes", PgType::Text))
            .with_table(Table::new("audit_log").with_column(Column::new("line", PgType::Text)))
    }

    async fn resolve_with(
        catalog: &dyn SchemaCatalog,
        settings: ResolverSettings,
        mut reference: ReferenceDeclaration,
    ) -> (ReferenceDeclaration, Resolution) {
        let mut cache = SchemaTypeCache::new();
        let mut resolver = ForeignKeyTypeResolver::new(catalog, &mut cache, &settings);
        let resolution = resolver.resolve(&mut reference).await;
        (reference, resolution)
    }

    async fn resolve(reference: impl Into<ReferenceDeclaration>) -> ReferenceDeclaration {
        resolve_with(&schema(), ResolverSettings::default(), reference.into())
            .await
            .0
    }

    #[tokio::test]
    async fn test_uuid_shaped_targets_get_uuid() {
        assert_eq!(resolve("user").await.column_type, Some(PgType::Uuid));
        assert_eq!(
            resolve(ReferenceDeclaration::new("token")).await.column_type,
            Some(PgType::Uuid)
        );
    }

    #[tokio::test]
    async fn test_other_targets_keep_the_default() {
        for name in ["legacy_item", "account", "slug", "note"] {
            let reference = resolve(name).await;
            assert_eq!(reference.column_type, None, "{name}");
            assert_eq!(reference.effective_type(), PgType::BigInt, "{name}");
        }
    }

    #[tokio::test]
    async fn test_explicit_type_is_never_overridden() {
        for explicit in [PgType::Varchar(None), PgType::Integer, PgType::Text] {
            for target in ["user", "legacy_item", "ghost"] {
                let (reference, resolution) = resolve_with(
                    &schema(),
                    ResolverSettings::default(),
                    ReferenceDeclaration::new(target).column_type(explicit),
                )
                .await;
                assert_eq!(reference.column_type, Some(explicit));
                assert_eq!(resolution, Resolution::Explicit(explicit));
            }
        }
    }

    #[tokio::test]
    async fn test_bigint_placeholder_is_still_inferred() {
        let reference = resolve(ReferenceDeclaration::new("user").column_type(PgType::BigInt)).await;
        assert_eq!(reference.column_type, Some(PgType::Uuid));
    }

    #[tokio::test]
    async fn test_missing_or_keyless_targets_are_not_errors() {
        let (reference, resolution) = resolve_with(
            &schema(),
            ResolverSettings::default(),
            ReferenceDeclaration::new("ghost"),
        )
        .await;
        assert_eq!(reference.column_type, None);
        assert_eq!(
            resolution,
            Resolution::Inferred {
                target: Target::Table("ghosts".to_string()),
                kind: PrimaryKeyKind::Unknown,
            }
        );

        let reference = resolve(ReferenceDeclaration::new("log").to_table("audit_log")).await;
        assert_eq!(reference.column_type, None);
    }

    #[tokio::test]
    async fn test_introspection_failure_forwards_unchanged() {
        let (reference, resolution) = resolve_with(
            &FailingCatalog::new(FailAt::TableExists),
            ResolverSettings::default(),
            ReferenceDeclaration::new("user"),
        )
        .await;
        assert_eq!(reference, ReferenceDeclaration::new("user"));
        assert!(matches!(
            resolution,
            Resolution::Inferred {
                kind: PrimaryKeyKind::Unknown,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_same_table_is_introspected_once_per_run() {
        let catalog = CountingCatalog::new(schema());
        let settings = ResolverSettings::default();
        let mut cache = SchemaTypeCache::new();
        let mut resolver = ForeignKeyTypeResolver::new(&catalog, &mut cache, &settings);

        let mut author = ReferenceDeclaration::new("author").to_table("users");
        let mut user = ReferenceDeclaration::new("user");
        let first = resolver.resolve(&mut author).await;
        let second = resolver.resolve(&mut user).await;

        assert_eq!(author.column_type, user.column_type);
        assert_eq!(first, second);
        assert_eq!(catalog.calls("primary_key_name", "users"), 1);
        assert_eq!(catalog.calls("columns", "users"), 1);
    }

    #[tokio::test]
    async fn test_polymorphic_follows_policy() {
        let uuid = ResolverSettings::new(PrimaryKeyPolicy::Uuid);
        let (reference, resolution) = resolve_with(
            &schema(),
            uuid,
            ReferenceDeclaration::new("commentable").polymorphic(),
        )
        .await;
        assert_eq!(reference.column_type, Some(PgType::Uuid));
        assert_eq!(
            resolution,
            Resolution::Inferred {
                target: Target::Polymorphic,
                kind: PrimaryKeyKind::Uuid,
            }
        );

        let integer = ResolverSettings::new(PrimaryKeyPolicy::Integer);
        let (reference, _) = resolve_with(
            &schema(),
            integer,
            ReferenceDeclaration::new("commentable").polymorphic(),
        )
        .await;
        assert_eq!(reference.column_type, None);
    }

    #[tokio::test]
    async fn test_polymorphic_never_touches_the_catalog() {
        let catalog = CountingCatalog::new(schema());
        resolve_with(
            &catalog,
            ResolverSettings::default(),
            ReferenceDeclaration::new("commentable").polymorphic(),
        )
        .await;
        assert_eq!(catalog.total_calls(), 0);
    }

    /// The observed-UUID heuristic is off unless asked for.
    #[tokio::test]
    async fn test_observed_uuid_heuristic_is_opt_in() {
        let catalog = schema();

        for (observe, expected) in [(false, None), (true, Some(PgType::Uuid))] {
            let settings =
                ResolverSettings::new(PrimaryKeyPolicy::Integer).observe_uuid_tables(observe);
            let mut cache = SchemaTypeCache::new();
            let mut resolver = ForeignKeyTypeResolver::new(&catalog, &mut cache, &settings);

            resolver.resolve(&mut ReferenceDeclaration::new("user")).await;

            let mut taggable = ReferenceDeclaration::new("taggable").polymorphic();
            resolver.resolve(&mut taggable).await;
            assert_eq!(taggable.column_type, expected, "observe = {observe}");
        }
    }

    #[tokio::test]
    async fn test_decorator_scenarios() {
        let catalog = schema();
        let settings = ResolverSettings::default();
        let mut cache = SchemaTypeCache::new();
        let resolver = ForeignKeyTypeResolver::new(&catalog, &mut cache, &settings);
        let mut statements = ReferenceTyping::new(SqlScript::new(), resolver);

        let mut posts = TableDefinition::new("posts", PrimaryKey::Uuid);
        posts.references("user");
        statements.create_table(posts).await.unwrap();

        statements
            .add_reference("orders", ReferenceDeclaration::new("legacy_item").index(false))
            .await
            .unwrap();

        statements
            .add_belongs_to(
                "comments",
                ReferenceDeclaration::new("commentable")
                    .polymorphic()
                    .index(false),
            )
            .await
            .unwrap();

        let mut tags = TableDefinition::new("tags", PrimaryKey::Uuid);
        tags.belongs_to(
            ReferenceDeclaration::new("category")
                .type_named("string")
                .unwrap()
                .index(false),
        );
        statements.create_table(tags).await.unwrap();

        insta::assert_snapshot!(statements.into_inner().to_sql(), @r#"
        CREATE TABLE "posts" (
            "id" UUID PRIMARY KEY,
            "user_id" UUID
        );
        CREATE INDEX "idx_posts_user_id" ON "posts" ("user_id");
        ALTER TABLE "orders" ADD COLUMN "legacy_item_id" BIGINT;
        ALTER TABLE "comments" ADD COLUMN "commentable_id" UUID;
        ALTER TABLE "comments" ADD COLUMN "commentable_type" VARCHAR;
        CREATE TABLE "tags" (
            "id" UUID PRIMARY KEY,
            "category_id" VARCHAR
        );
        "#);
    }

    #[tokio::test]
    async fn test_self_reference_follows_own_primary_key() {
        let catalog = CountingCatalog::new(schema());
        let settings = ResolverSettings::default();
        let mut cache = SchemaTypeCache::new();
        let resolver = ForeignKeyTypeResolver::new(&catalog, &mut cache, &settings);
        let mut statements = ReferenceTyping::new(SqlScript::new(), resolver);

        let mut nodes = TableDefinition::new("nodes", PrimaryKey::Uuid);
        nodes
            .references(
                ReferenceDeclaration::new("parent")
                    .to_table("nodes")
                    .foreign_key(true)
                    .index(false),
            )
            .references(ReferenceDeclaration::new("owner").to_table("users").index(false));
        statements.create_table(nodes).await.unwrap();

        let mut legacy = TableDefinition::new("legacy_nodes", PrimaryKey::BigSerial);
        legacy.references(
            ReferenceDeclaration::new("parent")
                .to_table("legacy_nodes")
                .index(false),
        );
        statements.create_table(legacy).await.unwrap();

        insta::assert_snapshot!(statements.into_inner().to_sql(), @r#"
        CREATE TABLE "nodes" (
            "id" UUID PRIMARY KEY,
            "parent_id" UUID,
            "owner_id" UUID
        );
        ALTER TABLE "nodes" ADD CONSTRAINT "fk_nodes_parent_id" FOREIGN KEY ("parent_id") REFERENCES "nodes" ("id");
        CREATE TABLE "legacy_nodes" (
            "id" BIGSERIAL PRIMARY KEY,
            "parent_id" BIGINT
        );
        "#);

        // Only the other table went through the catalog.
        assert_eq!(catalog.calls("table_exists", "nodes"), 0);
        assert_eq!(catalog.calls("table_exists", "legacy_nodes"), 0);
        assert_eq!(catalog.calls("table_exists", "users"), 1);
        assert_eq!(cache.get("nodes"), None);
        assert_eq!(cache.get("users"), Some(PrimaryKeyKind::Uuid));
    }

    #[tokio::test]
    async fn test_self_reference_keeps_explicit_type() {
        let catalog = schema();
        let settings = ResolverSettings::default();
        let mut cache = SchemaTypeCache::new();
        let mut resolver = ForeignKeyTypeResolver::new(&catalog, &mut cache, &settings);

        let mut reference = ReferenceDeclaration::new("parent")
            .to_table("nodes")
            .column_type(PgType::Text);
        let resolution = resolver
            .resolve_in_table(&mut reference, "nodes", PrimaryKey::Uuid)
            .await;
        assert_eq!(resolution, Resolution::Explicit(PgType::Text));
        assert_eq!(reference.column_type, Some(PgType::Text));

        let mut keyless = ReferenceDeclaration::new("parent").to_table("nodes");
        let resolution = resolver
            .resolve_in_table(&mut keyless, "nodes", PrimaryKey::None)
            .await;
        assert_eq!(
            resolution,
            Resolution::Inferred {
                target: Target::Table("nodes".to_string()),
                kind: PrimaryKeyKind::Unknown,
            }
        );
        assert_eq!(keyless.column_type, None);
    }
}
