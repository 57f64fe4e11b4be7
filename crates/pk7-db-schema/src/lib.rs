//! Database schema types for pk7.
//!
//! These types describe tables the way the migration DSL and the in-memory
//! catalog see them. They are deliberately small: a column knows its name,
//! its Postgres type, and the handful of flags needed to render DDL.

use indexmap::IndexMap;
use pk7_sql::quote_ident;
use std::fmt;
use std::str::FromStr;

/// Postgres column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PgType {
    /// SMALLINT (2 bytes)
    SmallInt,
    /// INTEGER (4 bytes)
    Integer,
    /// BIGINT (8 bytes)
    BigInt,
    /// BIGSERIAL (auto-incrementing BIGINT)
    BigSerial,
    /// BOOLEAN
    Boolean,
    /// TEXT
    Text,
    /// VARCHAR, with an optional length limit
    Varchar(Option<u32>),
    /// TIMESTAMPTZ
    Timestamptz,
    /// UUID
    Uuid,
    /// JSONB
    Jsonb,
}

impl PgType {
    /// The type reference columns get when nothing overrides them.
    pub const DEFAULT_REFERENCE: PgType = PgType::BigInt;
}

impl fmt::Display for PgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgType::SmallInt => write!(f, "SMALLINT"),
            PgType::Integer => write!(f, "INTEGER"),
            PgType::BigInt => write!(f, "BIGINT"),
            PgType::BigSerial => write!(f, "BIGSERIAL"),
            PgType::Boolean => write!(f, "BOOLEAN"),
            PgType::Text => write!(f, "TEXT"),
            PgType::Varchar(None) => write!(f, "VARCHAR"),
            PgType::Varchar(Some(len)) => write!(f, "VARCHAR({})", len),
            PgType::Timestamptz => write!(f, "TIMESTAMPTZ"),
            PgType::Uuid => write!(f, "UUID"),
            PgType::Jsonb => write!(f, "JSONB"),
        }
    }
}

/// Error returned when a type name isn't one the DSL knows about.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown column type `{0}`")]
pub struct UnknownType(pub String);

/// Parses DSL type names (`string`, `uuid`, `bigint`, ...) as well as the
/// SQL spellings produced by [`PgType`]'s `Display` impl.
impl FromStr for PgType {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();

        if let Some(len) = lower
            .strip_prefix("varchar(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let len = len
                .trim()
                .parse::<u32>()
                .map_err(|_| UnknownType(s.to_string()))?;
            return Ok(PgType::Varchar(Some(len)));
        }

        let ty = match lower.as_str() {
            "smallint" | "int2" => PgType::SmallInt,
            "integer" | "int" | "int4" => PgType::Integer,
            "bigint" | "int8" => PgType::BigInt,
            "bigserial" => PgType::BigSerial,
            "boolean" | "bool" => PgType::Boolean,
            "text" => PgType::Text,
            "string" | "varchar" => PgType::Varchar(None),
            "timestamptz" | "datetime" | "timestamp" => PgType::Timestamptz,
            "uuid" => PgType::Uuid,
            "jsonb" | "json" => PgType::Jsonb,
            _ => return Err(UnknownType(s.to_string())),
        };
        Ok(ty)
    }
}

/// A database column definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Postgres type
    pub pg_type: PgType,
    /// Whether the column allows NULL
    pub nullable: bool,
    /// Default value expression (if any)
    pub default: Option<String>,
    /// Whether this is a primary key
    pub primary_key: bool,
    /// Column comment (if any)
    pub comment: Option<String>,
}

impl Column {
    /// A NOT NULL column with no default.
    pub fn new(name: impl Into<String>, pg_type: PgType) -> Self {
        Self {
            name: name.into(),
            pg_type,
            nullable: false,
            default: None,
            primary_key: false,
            comment: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
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

    /// Column definition as it appears inside `CREATE TABLE` / `ADD COLUMN`.
    pub fn to_sql(&self) -> String {
        let mut def = format!("{} {}", quote_ident(&self.name), self.pg_type);

        if self.primary_key {
            def.push_str(" PRIMARY KEY");
        } else if !self.nullable {
            def.push_str(" NOT NULL");
        }

        if let Some(default) = &self.default {
            def.push_str(&format!(" DEFAULT {}", default));
        }

        def
    }
}

/// A foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKey {
    /// Constraint name
    pub name: String,
    /// Column(s) in this table
    pub columns: Vec<String>,
    /// Referenced table
    pub references_table: String,
    /// Referenced column(s)
    pub references_columns: Vec<String>,
}

/// A database index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// Index name
    pub name: String,
    /// Column(s) in the index, in order
    pub columns: Vec<String>,
    /// Whether this is a unique index
    pub unique: bool,
}

/// A database table definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Columns, in declaration order
    pub columns: Vec<Column>,
    /// Foreign keys
    pub foreign_keys: Vec<ForeignKey>,
    /// Indices
    pub indices: Vec<Index>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Builder-style column append.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The primary key column, if the table has exactly one.
    ///
    /// Composite primary keys return `None`: there is no single column a
    /// reference could point at.
    pub fn primary_key(&self) -> Option<&Column> {
        let mut pks = self.columns.iter().filter(|c| c.primary_key);
        let first = pks.next()?;
        if pks.next().is_some() {
            return None;
        }
        Some(first)
    }
}

/// A complete database schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Tables in the schema, indexed by name
    pub tables: IndexMap<String, Table>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table.
    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Builder-style [`Schema::add_table`].
    pub fn with_table(mut self, table: Table) -> Self {
        self.add_table(table);
        self
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Iterate over all tables.
    pub fn iter_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }
}

#[cfg(test)]
mod tests;
