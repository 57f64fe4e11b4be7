//! The migration DSL: table definitions and reference declarations.
//!
//! ```
//! use pk7::dsl::{PrimaryKey, ReferenceDeclaration, TableDefinition};
//!
//! let mut posts = TableDefinition::new("posts", PrimaryKey::Uuid);
//! posts
//!     .string("title")
//!     .text("body")
//!     .references("user")
//!     .references(ReferenceDeclaration::new("commentable").polymorphic())
//!     .timestamps();
//!
//! let table = posts.into_table();
//! assert!(table.column("user_id").is_some());
//! assert!(table.column("commentable_type").is_some());
//! ```

pub mod render;

use crate::classify::PrimaryKeyKind;
use crate::inflect::pluralize;
use pk7_config::PrimaryKeyPolicy;
use pk7_db_schema::{Column, ForeignKey, Index, PgType, Table, UnknownType};
use pk7_sql::{foreign_key_name, index_name};

/// Primary key a new table is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKey {
    /// `id UUID PRIMARY KEY`. Values are UUIDv7s assigned by the application.
    Uuid,
    /// `id BIGSERIAL PRIMARY KEY`.
    BigSerial,
    /// No primary key column.
    None,
}

impl PrimaryKey {
    /// The `id` column this primary key adds, if any.
    pub fn column(self) -> Option<Column> {
        match self {
            PrimaryKey::Uuid => Some(Column::new("id", PgType::Uuid).primary_key()),
            PrimaryKey::BigSerial => Some(Column::new("id", PgType::BigSerial).primary_key()),
            PrimaryKey::None => None,
        }
    }

    /// How the table's own key classifies, for references back to it.
    pub fn kind(self) -> PrimaryKeyKind {
        match self {
            PrimaryKey::Uuid => PrimaryKeyKind::Uuid,
            PrimaryKey::BigSerial => PrimaryKeyKind::Integer,
            PrimaryKey::None => PrimaryKeyKind::Unknown,
        }
    }
}

impl From<PrimaryKeyPolicy> for PrimaryKey {
    fn from(policy: PrimaryKeyPolicy) -> Self {
        match policy {
            PrimaryKeyPolicy::Uuid => PrimaryKey::Uuid,
            PrimaryKeyPolicy::Integer => PrimaryKey::BigSerial,
        }
    }
}

/// An association column being declared: `references(:user)`,
/// `belongs_to(:commentable, polymorphic: true)`, `add_reference(...)`.
///
/// Lives only while the statement is being built; the resolver may fill in
/// [`column_type`](Self::column_type) before it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDeclaration {
    /// Base name; the column is `{name}_id`.
    pub name: String,
    /// Referenced table. Defaults to the pluralized base name.
    pub to_table: Option<String>,
    /// Whether this reference can point at rows of any table.
    pub polymorphic: bool,
    /// Storage type of the `_id` column. `None` means the DSL default.
    pub column_type: Option<PgType>,
    pub null: bool,
    pub index: bool,
    /// Add a foreign key constraint. Ignored for polymorphic references.
    pub foreign_key: bool,
    pub default: Option<String>,
    pub comment: Option<String>,
}

impl ReferenceDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            to_table: None,
            polymorphic: false,
            column_type: None,
            null: true,
            index: true,
            foreign_key: false,
            default: None,
            comment: None,
        }
    }

    pub fn to_table(mut self, table: impl Into<String>) -> Self {
        self.to_table = Some(table.into());
        self
    }

    pub fn polymorphic(mut self) -> Self {
        self.polymorphic = true;
        self
    }

    pub fn column_type(mut self, pg_type: PgType) -> Self {
        self.column_type = Some(pg_type);
        self
    }

    /// [`column_type`](Self::column_type) from a DSL type name such as
    /// `"string"` or `"uuid"`.
    pub fn type_named(self, name: &str) -> Result<Self, UnknownType> {
        Ok(self.column_type(name.parse()?))
    }

    pub fn null(mut self, null: bool) -> Self {
        self.null = null;
        self
    }

    pub fn index(mut self, index: bool) -> Self {
        self.index = index;
        self
    }

    pub fn foreign_key(mut self, foreign_key: bool) -> Self {
        self.foreign_key = foreign_key;
        self
    }

    pub fn default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// The author-supplied type, unless it is just the default placeholder.
    ///
    /// A `bigint` here is indistinguishable from "nothing given", so it does
    /// not count as explicit.
    pub fn explicit_type(&self) -> Option<PgType> {
        self.column_type.filter(|t| *t != PgType::DEFAULT_REFERENCE)
    }

    /// The type the `_id` column will be rendered with.
    pub fn effective_type(&self) -> PgType {
        self.column_type.unwrap_or(PgType::DEFAULT_REFERENCE)
    }

    /// The referenced table: `to_table`, or the pluralized base name.
    pub fn target_table(&self) -> String {
        match &self.to_table {
            Some(table) => table.clone(),
            None => pluralize(&self.name),
        }
    }

    pub fn id_column_name(&self) -> String {
        format!("{}_id", self.name)
    }

    pub fn type_column_name(&self) -> String {
        format!("{}_type", self.name)
    }

    /// `{name}_id`, followed by `{name}_type` for polymorphic references.
    pub fn columns(&self) -> Vec<Column> {
        let mut id = Column::new(self.id_column_name(), self.effective_type()).nullable(self.null);
        if let Some(default) = &self.default {
            id = id.default(default.clone());
        }
        if let Some(comment) = &self.comment {
            id = id.comment(comment.clone());
        }

        let mut columns = vec![id];
        if self.polymorphic {
            columns.push(
                Column::new(self.type_column_name(), PgType::Varchar(None)).nullable(self.null),
            );
        }
        columns
    }

    /// The index this reference adds to `table`, unless `index(false)`.
    pub fn index_for(&self, table: &str) -> Option<Index> {
        if !self.index {
            return None;
        }

        let columns = if self.polymorphic {
            vec![self.type_column_name(), self.id_column_name()]
        } else {
            vec![self.id_column_name()]
        };

        Some(Index {
            name: index_name(table, &columns),
            columns,
            unique: false,
        })
    }

    /// The foreign key constraint this reference adds to `table`, if requested.
    pub fn foreign_key_for(&self, table: &str) -> Option<ForeignKey> {
        if !self.foreign_key || self.polymorphic {
            return None;
        }

        let column = self.id_column_name();
        Some(ForeignKey {
            name: foreign_key_name(table, &column),
            columns: vec![column],
            references_table: self.target_table(),
            references_columns: vec!["id".to_string()],
        })
    }
}

impl From<&str> for ReferenceDeclaration {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ReferenceDeclaration {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// A `CREATE TABLE` being built.
#[derive(Debug, Clone)]
pub struct TableDefinition {
    name: String,
    primary_key: PrimaryKey,
    columns: Vec<Column>,
    references: Vec<ReferenceDeclaration>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, primary_key: PrimaryKey) -> Self {
        Self {
            name: name.into(),
            primary_key,
            columns: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> PrimaryKey {
        self.primary_key
    }

    pub fn column(&mut self, column: Column) -> &mut Self {
        self.columns.push(column);
        self
    }

    pub fn string(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(Column::new(name, PgType::Varchar(None)))
    }

    pub fn text(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(Column::new(name, PgType::Text))
    }

    pub fn integer(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(Column::new(name, PgType::Integer))
    }

    pub fn bigint(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(Column::new(name, PgType::BigInt))
    }

    pub fn boolean(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(Column::new(name, PgType::Boolean))
    }

    pub fn uuid(&mut self, name: impl Into<String>) -> &mut Self {
        self.column(Column::new(name, PgType::Uuid))
    }

    /// `created_at` and `updated_at`, both defaulting to `now()`.
    pub fn timestamps(&mut self) -> &mut Self {
        self.column(Column::new("created_at", PgType::Timestamptz).default("now()"))
            .column(Column::new("updated_at", PgType::Timestamptz).default("now()"))
    }

    pub fn references(&mut self, reference: impl Into<ReferenceDeclaration>) -> &mut Self {
        self.references.push(reference.into());
        self
    }

    /// Alias for [`references`](Self::references).
    pub fn belongs_to(&mut self, reference: impl Into<ReferenceDeclaration>) -> &mut Self {
        self.references(reference)
    }

    pub fn reference_declarations(&self) -> &[ReferenceDeclaration] {
        &self.references
    }

    pub fn reference_declarations_mut(&mut self) -> &mut [ReferenceDeclaration] {
        &mut self.references
    }

    /// Expand into a [`Table`]: primary key, plain columns, then each
    /// reference's columns, indices and foreign keys.
    pub fn into_table(self) -> Table {
        let mut table = Table::new(self.name);

        table.columns.extend(self.primary_key.column());
        table.columns.extend(self.columns);

        for reference in &self.references {
            table.columns.extend(reference.columns());
            table.indices.extend(reference.index_for(&table.name));
            table.foreign_keys.extend(reference.foreign_key_for(&table.name));
        }

        table
    }
}
