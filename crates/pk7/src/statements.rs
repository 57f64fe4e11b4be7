//! Schema statement executors.
//!
//! [`SchemaStatements`] is the seam the reference resolver decorates: the
//! resolver wraps any executor, fixes up reference types, and forwards.

use crate::Error;
use crate::dsl::render::{add_reference_sql, create_table_sql};
use crate::dsl::{ReferenceDeclaration, TableDefinition};
use crate::traced::{Connection, TracedConn};
use std::future::Future;
use std::pin::Pin;

pub type StatementFuture<'a> = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'a>>;

/// Something that can run the DSL's schema statements.
pub trait SchemaStatements: Send {
    fn create_table<'a>(&'a mut self, table: TableDefinition) -> StatementFuture<'a>;

    fn add_reference<'a>(
        &'a mut self,
        table: &'a str,
        reference: ReferenceDeclaration,
    ) -> StatementFuture<'a>;

    /// Alias for [`add_reference`](Self::add_reference).
    fn add_belongs_to<'a>(
        &'a mut self,
        table: &'a str,
        reference: ReferenceDeclaration,
    ) -> StatementFuture<'a> {
        self.add_reference(table, reference)
    }
}

/// Collects rendered SQL instead of running it.
#[derive(Debug, Default)]
pub struct SqlScript {
    statements: Vec<String>,
}

impl SqlScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    /// All statements, one per line.
    pub fn to_sql(&self) -> String {
        self.statements.join("\n")
    }
}

impl SchemaStatements for SqlScript {
    fn create_table<'a>(&'a mut self, table: TableDefinition) -> StatementFuture<'a> {
        self.statements.extend(create_table_sql(&table.into_table()));
        Box::pin(std::future::ready(Ok(())))
    }

    fn add_reference<'a>(
        &'a mut self,
        table: &'a str,
        reference: ReferenceDeclaration,
    ) -> StatementFuture<'a> {
        self.statements.extend(add_reference_sql(table, &reference));
        Box::pin(std::future::ready(Ok(())))
    }
}

/// Runs rendered SQL on a connection, one statement at a time.
pub struct ConnectionStatements<'c, C: Connection + ?Sized + 'c> {
    conn: TracedConn<'c, C>,
}

impl<'c, C: Connection + ?Sized + 'c> ConnectionStatements<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self {
            conn: TracedConn::new(conn),
        }
    }

    async fn run_all(&self, statements: Vec<String>) -> Result<(), Error> {
        for sql in &statements {
            self.conn.execute(sql, &[]).await?;
        }
        Ok(())
    }
}

impl<'c, C: Connection + ?Sized + 'c> SchemaStatements for ConnectionStatements<'c, C> {
    fn create_table<'a>(&'a mut self, table: TableDefinition) -> StatementFuture<'a> {
        let statements = create_table_sql(&table.into_table());
        Box::pin(self.run_all(statements))
    }

    fn add_reference<'a>(
        &'a mut self,
        table: &'a str,
        reference: ReferenceDeclaration,
    ) -> StatementFuture<'a> {
        let statements = add_reference_sql(table, &reference);
        Box::pin(self.run_all(statements))
    }
}
