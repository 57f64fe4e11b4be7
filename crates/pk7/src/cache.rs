//! Per-run memo of primary key kinds.

use crate::catalog::{CatalogError, SchemaCatalog};
use crate::classify::{PrimaryKeyKind, classify_declared_type};
use indexmap::IndexMap;
use pk7_sql::{TableName, TableNameRef};

/// Maps table names to the kind of primary key they have.
///
/// One cache lives for exactly one migration run. Entries are written once
/// and never overwritten, so every reference to a table within a run sees
/// the same answer, even if the table changes shape halfway through.
#[derive(Debug, Default)]
pub struct SchemaTypeCache {
    entries: IndexMap<TableName, PrimaryKeyKind>,
}

impl SchemaTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The memoized kind for `table`, without touching the catalog.
    pub fn get(&self, table: &str) -> Option<PrimaryKeyKind> {
        self.entries.get(TableNameRef::from_str(table)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any table seen so far has a UUID primary key.
    pub fn has_uuid_table(&self) -> bool {
        self.entries.values().any(|kind| kind.is_uuid())
    }

    /// Entries in the order they were first classified.
    pub fn iter(&self) -> impl Iterator<Item = (&TableName, PrimaryKeyKind)> {
        self.entries.iter().map(|(name, kind)| (name, *kind))
    }

    /// Classify `table`'s primary key, asking the catalog only the first time.
    ///
    /// Never fails: a missing table, a table without a single primary key,
    /// and a catalog error all come back as [`PrimaryKeyKind::Unknown`].
    pub async fn lookup_or_compute(
        &mut self,
        table: &str,
        catalog: &dyn SchemaCatalog,
    ) -> PrimaryKeyKind {
        if let Some(kind) = self.get(table) {
            return kind;
        }

        let kind = match introspect(table, catalog).await {
            Ok(kind) => kind,
            Err(error) => {
                tracing::warn!(
                    table,
                    %error,
                    "could not introspect primary key, leaving reference type alone"
                );
                PrimaryKeyKind::Unknown
            }
        };

        self.memoize(table, kind)
    }

    fn memoize(&mut self, table: &str, kind: PrimaryKeyKind) -> PrimaryKeyKind {
        let stored = *self.entries.entry(TableName::from(table)).or_insert(kind);
        debug_assert_eq!(stored, kind, "cache entry for `{table}` was overwritten");
        stored
    }
}

async fn introspect(
    table: &str,
    catalog: &dyn SchemaCatalog,
) -> Result<PrimaryKeyKind, CatalogError> {
    if !catalog.table_exists(table).await? {
        return Ok(PrimaryKeyKind::Unknown);
    }

    let Some(pk) = catalog.primary_key_name(table).await? else {
        return Ok(PrimaryKeyKind::Unknown);
    };

    let columns = catalog.columns(table).await?;
    let kind = columns
        .iter()
        .find(|c| c.name == pk)
        .map(|c| classify_declared_type(&c.declared_type))
        .unwrap_or(PrimaryKeyKind::Unknown);

    Ok(kind)
}
