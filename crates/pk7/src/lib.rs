//! UUIDv7 primary keys for Postgres, with foreign keys typed to match.
//!
//! Tables created through pk7 get an `id UUID PRIMARY KEY` whose values are
//! time-ordered UUIDv7s generated by the application (see [`id`]). That only
//! works if every column pointing at such a table is a `UUID` too, so the
//! migration DSL resolves each reference's storage type from the primary key
//! of the table it points at:
//!
//! - `references("user")` against a `users.id uuid` becomes `user_id UUID`;
//! - against a `bigserial` key it stays `user_id BIGINT`;
//! - an explicit type is never second-guessed;
//! - polymorphic references follow the configured primary key policy.
//!
//! Lookups are cached for the duration of one migration run, and a table
//! that is missing or can't be introspected leaves the reference untouched.
//!
//! # Migrations
//!
//! ```ignore
//! use pk7::{MigrationContext, MigrationResult, ReferenceDeclaration};
//!
//! async fn create_posts(ctx: &mut MigrationContext<'_>) -> MigrationResult<()> {
//!     let category = ReferenceDeclaration::new("category").type_named("string")?;
//!     ctx.create_table("posts", |t| {
//!         t.string("title")
//!             .references("user")
//!             .references(category)
//!             .timestamps();
//!     })
//!     .await?;
//!     Ok(())
//! }
//!
//! pk7::migration!("2026_01_18_120000", "create_posts", create_posts);
//! ```
//!
//! Use `MigrationResult` instead of `Result` to enable `#[track_caller]` - when an
//! error occurs, the exact source location (file:line:column) is captured.
//!
//! Run them with [`MigrationRunner`]:
//!
//! ```ignore
//! let runner = MigrationRunner::new(&client, ResolverSettings::default());
//! runner.migrate().await?;
//! ```

use std::future::Future;
use std::pin::Pin;

mod cache;
pub mod catalog;
mod classify;
pub mod dsl;
mod error;
pub mod id;
pub mod inflect;
pub mod meta;
mod migrate;
mod polymorphic;
mod resolver;
mod settings;
pub mod statements;
mod traced;

pub use cache::SchemaTypeCache;
pub use catalog::{CatalogColumn, CatalogError, PgCatalog, SchemaCatalog};
pub use classify::{PrimaryKeyKind, classify_declared_type};
pub use dsl::{PrimaryKey, ReferenceDeclaration, TableDefinition};
pub use error::{Error, MigrationError};
pub use migrate::{
    AppliedMigration, Migration, MigrationContext, MigrationRunner, MigrationStatus, RanMigration,
};
pub use polymorphic::PolymorphicPolicy;
pub use resolver::{ForeignKeyTypeResolver, ReferenceTyping, Resolution, Target};
pub use settings::ResolverSettings;
pub use statements::{ConnectionStatements, SchemaStatements, SqlScript};
pub use traced::{Connection, ConnectionExt, TracedConn};

pub use pk7_config::{Config, PrimaryKeyPolicy};
pub use pk7_db_schema::{Column, PgType, Schema, Table, UnknownType};

// Re-export inventory for the registration macro
pub use inventory;
pub use uuid;

/// Result type for pk7 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for migration functions, captures caller location on error.
pub type MigrationResult<T> = std::result::Result<T, MigrationError>;

/// Type alias for migration functions.
///
/// Migration functions are async functions that take a mutable reference to a
/// `MigrationContext` and return a `MigrationResult<()>`.
pub type MigrationFn = for<'a> fn(
    &'a mut MigrationContext<'a>,
)
    -> Pin<Box<dyn Future<Output = MigrationResult<()>> + Send + 'a>>;

// Register Migration with inventory
inventory::collect!(Migration);

/// Register an async migration function.
///
/// ```ignore
/// async fn create_users(ctx: &mut pk7::MigrationContext<'_>) -> pk7::MigrationResult<()> {
///     ctx.create_table("users", |t| {
///         t.string("email");
///     })
///     .await?;
///     Ok(())
/// }
///
/// pk7::migration!("2026_01_17_120000", "create_users", create_users);
/// ```
#[macro_export]
macro_rules! migration {
    ($version:literal, $name:literal, $func:path $(,)?) => {
        const _: () = {
            fn __pk7_migration<'a>(
                ctx: &'a mut $crate::MigrationContext<'a>,
            ) -> ::std::pin::Pin<
                ::std::boxed::Box<
                    dyn ::std::future::Future<Output = $crate::MigrationResult<()>>
                        + ::std::marker::Send
                        + 'a,
                >,
            > {
                ::std::boxed::Box::pin($func(ctx))
            }

            $crate::inventory::submit! {
                $crate::Migration::new($version, $name, __pk7_migration)
            }
        };
    };
}
