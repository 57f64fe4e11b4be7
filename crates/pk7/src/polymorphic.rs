//! Typing for polymorphic references.
//!
//! A polymorphic `commentable` reference can point at `posts` in one row and
//! `photos` in the next, so there is no single table to introspect. The
//! configured primary key policy decides instead.

use crate::cache::SchemaTypeCache;
use crate::classify::PrimaryKeyKind;
use pk7_config::PrimaryKeyPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolymorphicPolicy {
    pub primary_keys: PrimaryKeyPolicy,
    /// When the policy is integer, still go UUID once the run has classified
    /// any table as UUID-keyed. Depends on statement order, hence opt-in.
    pub observe_uuid_tables: bool,
}

impl PolymorphicPolicy {
    /// [`PrimaryKeyKind::Uuid`] or [`PrimaryKeyKind::Integer`]; never unknown.
    pub fn resolve(&self, cache: &SchemaTypeCache) -> PrimaryKeyKind {
        if self.primary_keys.is_uuid() {
            return PrimaryKeyKind::Uuid;
        }

        if self.observe_uuid_tables && cache.has_uuid_table() {
            return PrimaryKeyKind::Uuid;
        }

        PrimaryKeyKind::Integer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::keyed_table;
    use pk7_db_schema::{PgType, Schema};

    #[test]
    fn test_uuid_policy() {
        let policy = PolymorphicPolicy {
            primary_keys: PrimaryKeyPolicy::Uuid,
            observe_uuid_tables: false,
        };
        assert_eq!(
            policy.resolve(&SchemaTypeCache::new()),
            PrimaryKeyKind::Uuid
        );
    }

    #[tokio::test]
    async fn test_integer_policy_ignores_observed_tables_by_default() {
        let schema = Schema::new().with_table(keyed_table("users", PgType::Uuid));
        let mut cache = SchemaTypeCache::new();
        cache.lookup_or_compute("users", &schema).await;

        let policy = PolymorphicPolicy {
            primary_keys: PrimaryKeyPolicy::Integer,
            observe_uuid_tables: false,
        };
        assert_eq!(policy.resolve(&cache), PrimaryKeyKind::Integer);
    }

    #[tokio::test]
    async fn test_opt_in_heuristic_follows_observed_tables() {
        let schema = Schema::new()
            .with_table(keyed_table("users", PgType::Uuid))
            .with_table(keyed_table("legacy_items", PgType::BigSerial));
        let policy = PolymorphicPolicy {
            primary_keys: PrimaryKeyPolicy::Integer,
            observe_uuid_tables: true,
        };

        let mut cache = SchemaTypeCache::new();
        assert_eq!(policy.resolve(&cache), PrimaryKeyKind::Integer);

        cache.lookup_or_compute("legacy_items", &schema).await;
        assert_eq!(policy.resolve(&cache), PrimaryKeyKind::Integer);

        cache.lookup_or_compute("users", &schema).await;
        assert_eq!(policy.resolve(&cache), PrimaryKeyKind::Uuid);
    }
}
