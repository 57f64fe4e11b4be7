use crate::dsl::PrimaryKey;
use crate::polymorphic::PolymorphicPolicy;
use pk7_config::{Config, InvalidPolicy, PrimaryKeyPolicy};

/// Resolver configuration, fixed for the lifetime of a migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverSettings {
    /// Primary key type newly created tables get.
    pub primary_keys: PrimaryKeyPolicy,
    /// Opt-in: type polymorphic references as UUID once a UUID-keyed table
    /// has been seen during the run.
    pub observe_uuid_tables: bool,
}

impl ResolverSettings {
    pub fn new(primary_keys: PrimaryKeyPolicy) -> Self {
        Self {
            primary_keys,
            observe_uuid_tables: false,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, InvalidPolicy> {
        Ok(Self {
            primary_keys: config.primary_key_policy()?,
            observe_uuid_tables: config.observe_uuid_tables,
        })
    }

    pub fn observe_uuid_tables(mut self, observe: bool) -> Self {
        self.observe_uuid_tables = observe;
        self
    }

    pub fn polymorphic_policy(&self) -> PolymorphicPolicy {
        PolymorphicPolicy {
            primary_keys: self.primary_keys,
            observe_uuid_tables: self.observe_uuid_tables,
        }
    }

    /// The primary key `create_table` uses when none is given.
    pub fn default_primary_key(&self) -> PrimaryKey {
        self.primary_keys.into()
    }
}
