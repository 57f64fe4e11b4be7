//! Storage-type classification of primary key columns.

use std::fmt;

/// What a table's primary key looks like, as far as foreign keys care.
///
/// Derived from the catalog on demand and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimaryKeyKind {
    /// `uuid`, or a 36-character string column holding a hyphenated UUID.
    Uuid,
    /// Any other declared type. References get the DSL's default type.
    Integer,
    /// The table doesn't exist, has no single primary key, or couldn't be
    /// introspected.
    Unknown,
}

impl PrimaryKeyKind {
    pub fn is_uuid(self) -> bool {
        matches!(self, PrimaryKeyKind::Uuid)
    }
}

impl fmt::Display for PrimaryKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKeyKind::Uuid => write!(f, "uuid"),
            PrimaryKeyKind::Integer => write!(f, "integer"),
            PrimaryKeyKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Width of a hyphenated UUID rendered as text.
const UUID_TEXT_WIDTH: &str = "36";

/// Classify a declared SQL type.
///
/// Case-insensitive. `uuid` and `varchar(36)` are UUID-shaped; Postgres
/// reports the latter as `character varying(36)`, which is accepted too.
/// Every other type, including `varchar` of any other width, is not.
pub fn classify_declared_type(declared: &str) -> PrimaryKeyKind {
    let lower = declared.trim().to_ascii_lowercase();

    if lower == "uuid" {
        return PrimaryKeyKind::Uuid;
    }

    let width = lower
        .strip_prefix("varchar")
        .or_else(|| lower.strip_prefix("character varying"))
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix('('))
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim);

    if width == Some(UUID_TEXT_WIDTH) {
        PrimaryKeyKind::Uuid
    } else {
        PrimaryKeyKind::Integer
    }
}
