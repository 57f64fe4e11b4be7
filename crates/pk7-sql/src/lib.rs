//! SQL quoting and naming helpers.
//!
//! Everything pk7 renders goes through [`quote_ident`] / [`Lit`], so table and
//! column names never need to dodge reserved words like `user` or `order`.

use strid::braid;

/// The name of a table.
#[braid]
pub struct TableName;

/// Postgres truncates identifiers longer than this (NAMEDATALEN - 1).
pub const PG_IDENT_MAX: usize = 63;

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes.
///
/// # Example
/// ```
/// use pk7_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use pk7_sql::Ident;
/// assert_eq!(format!("{}", Ident("user")), "\"user\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// Quote a PostgreSQL identifier.
///
/// Always quotes, and doubles any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("{}", Ident(name))
}

/// Index name for a table and columns: `idx_{table}_{columns}`.
///
/// Falls back to a hashed suffix when the name would exceed [`PG_IDENT_MAX`].
///
/// ```
/// assert_eq!(pk7_sql::index_name("posts", &["user_id"]), "idx_posts_user_id");
/// assert_eq!(
///     pk7_sql::index_name("comments", &["commentable_type", "commentable_id"]),
///     "idx_comments_commentable_type_commentable_id"
/// );
/// ```
pub fn index_name(table: &str, columns: &[impl AsRef<str>]) -> String {
    let cols: Vec<&str> = columns.iter().map(|c| c.as_ref()).collect();
    bounded_name("idx", table, &cols.join("_"))
}

/// Foreign key constraint name: `fk_{table}_{column}`.
///
/// ```
/// assert_eq!(pk7_sql::foreign_key_name("posts", "user_id"), "fk_posts_user_id");
/// ```
pub fn foreign_key_name(table: &str, column: &str) -> String {
    bounded_name("fk", table, column)
}

/// `{prefix}_{table}_{rest}`, or `{prefix}_{table}_{hash}` when that is too long.
fn bounded_name(prefix: &str, table: &str, rest: &str) -> String {
    let full = format!("{}_{}_{}", prefix, table, rest);
    if full.len() <= PG_IDENT_MAX {
        return full;
    }

    let hex = blake3::hash(full.as_bytes()).to_hex().to_string();
    let suffix = &hex[..16];

    let overhead = prefix.len() + 2; // two underscores
    let max_table_len = PG_IDENT_MAX.saturating_sub(overhead + suffix.len());

    let table_part = if table.len() <= max_table_len {
        table
    } else {
        let mut len = max_table_len.min(table.len());
        while len > 0 && !table.is_char_boundary(len) {
            len -= 1;
        }
        &table[..len]
    };

    format!("{}_{}_{}", prefix, table_part, suffix)
}
