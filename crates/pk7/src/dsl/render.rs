//! DDL rendering.
//!
//! Each function returns one statement per entry, terminated with `;`, in
//! the order they must run.

use super::ReferenceDeclaration;
use pk7_db_schema::{Column, ForeignKey, Index, Table};
use pk7_sql::{Lit, quote_ident};

/// `CREATE TABLE`, then its indices, foreign keys, and column comments.
pub fn create_table_sql(table: &Table) -> Vec<String> {
    let pk_columns: Vec<&str> = table
        .columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name.as_str())
        .collect();

    // Composite keys need a table constraint instead of inline PRIMARY KEY
    let composite = pk_columns.len() > 1;

    let mut parts: Vec<String> = table
        .columns
        .iter()
        .map(|col| {
            let mut col = col.clone();
            if composite && col.primary_key {
                col.primary_key = false;
                col.nullable = false;
            }
            format!("    {}", col.to_sql())
        })
        .collect();

    if composite {
        let quoted: Vec<_> = pk_columns.iter().map(|c| quote_ident(c)).collect();
        parts.push(format!("    PRIMARY KEY ({})", quoted.join(", ")));
    }

    let mut statements = vec![format!(
        "CREATE TABLE {} (\n{}\n);",
        quote_ident(&table.name),
        parts.join(",\n")
    )];

    statements.extend(table.indices.iter().map(|idx| create_index_sql(&table.name, idx)));
    statements.extend(
        table
            .foreign_keys
            .iter()
            .map(|fk| add_foreign_key_sql(&table.name, fk)),
    );
    statements.extend(
        table
            .columns
            .iter()
            .filter_map(|col| comment_sql(&table.name, col)),
    );

    statements
}

/// `ALTER TABLE ... ADD COLUMN` for each of the reference's columns, then its
/// index, foreign key, and comment.
pub fn add_reference_sql(table: &str, reference: &ReferenceDeclaration) -> Vec<String> {
    let columns = reference.columns();

    let mut statements: Vec<String> = columns
        .iter()
        .map(|col| {
            format!(
                "ALTER TABLE {} ADD COLUMN {};",
                quote_ident(table),
                col.to_sql()
            )
        })
        .collect();

    if let Some(idx) = reference.index_for(table) {
        statements.push(create_index_sql(table, &idx));
    }
    if let Some(fk) = reference.foreign_key_for(table) {
        statements.push(add_foreign_key_sql(table, &fk));
    }
    statements.extend(columns.iter().filter_map(|col| comment_sql(table, col)));

    statements
}

pub fn create_index_sql(table: &str, idx: &Index) -> String {
    let unique = if idx.unique { "UNIQUE " } else { "" };
    let quoted: Vec<_> = idx.columns.iter().map(|c| quote_ident(c)).collect();
    format!(
        "CREATE {}INDEX {} ON {} ({});",
        unique,
        quote_ident(&idx.name),
        quote_ident(table),
        quoted.join(", ")
    )
}

pub fn add_foreign_key_sql(table: &str, fk: &ForeignKey) -> String {
    let quoted_cols: Vec<_> = fk.columns.iter().map(|c| quote_ident(c)).collect();
    let quoted_ref_cols: Vec<_> = fk
        .references_columns
        .iter()
        .map(|c| quote_ident(c))
        .collect();
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({});",
        quote_ident(table),
        quote_ident(&fk.name),
        quoted_cols.join(", "),
        quote_ident(&fk.references_table),
        quoted_ref_cols.join(", ")
    )
}

fn comment_sql(table: &str, col: &Column) -> Option<String> {
    let comment = col.comment.as_ref()?;
    Some(format!(
        "COMMENT ON COLUMN {}.{} IS {};",
        quote_ident(table),
        quote_ident(&col.name),
        Lit(comment)
    ))
}
