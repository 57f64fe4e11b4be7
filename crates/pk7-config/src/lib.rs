//! Facet types for the pk7 configuration schema.
//!
//! The configuration lives in `.config/pk7.styx`:
//!
//! ```text
//! primary_key_type uuid
//! observe_uuid_tables false
//! ```

use facet::Facet;
use std::fmt;
use std::str::FromStr;

/// Top-level pk7 configuration.
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    /// Primary key type for newly generated tables: `uuid` (default) or `integer`.
    #[facet(default)]
    pub primary_key_type: Option<String>,

    /// Let polymorphic references become UUID-typed as soon as any UUID-keyed
    /// table has been seen during the current migration run.
    ///
    /// Off by default: the answer then depends on statement order.
    #[facet(default)]
    pub observe_uuid_tables: bool,
}

impl Config {
    /// The configured primary key policy, [`PrimaryKeyPolicy::Uuid`] when unset.
    pub fn primary_key_policy(&self) -> Result<PrimaryKeyPolicy, InvalidPolicy> {
        match &self.primary_key_type {
            Some(value) => value.parse(),
            None => Ok(PrimaryKeyPolicy::default()),
        }
    }
}

/// What primary key newly generated tables get unless they opt out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PrimaryKeyPolicy {
    /// `id UUID PRIMARY KEY`, filled with a UUIDv7 by the application.
    #[default]
    Uuid,
    /// `id BIGSERIAL PRIMARY KEY`, assigned by the database.
    Integer,
}

impl PrimaryKeyPolicy {
    pub fn is_uuid(self) -> bool {
        matches!(self, PrimaryKeyPolicy::Uuid)
    }
}

impl fmt::Display for PrimaryKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKeyPolicy::Uuid => write!(f, "uuid"),
            PrimaryKeyPolicy::Integer => write!(f, "integer"),
        }
    }
}

/// A `primary_key_type` value that isn't `uuid` or `integer`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid primary_key_type `{0}` (expected `uuid` or `integer`)")]
pub struct InvalidPolicy(pub String);

impl FromStr for PrimaryKeyPolicy {
    type Err = InvalidPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uuid" | "uuid7" | "uuidv7" => Ok(PrimaryKeyPolicy::Uuid),
            "integer" | "bigint" | "bigserial" | "serial" => Ok(PrimaryKeyPolicy::Integer),
            _ => Err(InvalidPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults_to_uuid() {
        let config = Config::default();
        assert_eq!(config.primary_key_policy(), Ok(PrimaryKeyPolicy::Uuid));
        assert!(!config.observe_uuid_tables);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("UUID".parse(), Ok(PrimaryKeyPolicy::Uuid));
        assert_eq!("bigint".parse(), Ok(PrimaryKeyPolicy::Integer));
        assert_eq!(
            "snowflake".parse::<PrimaryKeyPolicy>(),
            Err(InvalidPolicy("snowflake".to_string()))
        );
    }

    #[test]
    fn test_invalid_policy_in_config() {
        let config = Config {
            primary_key_type: Some("nope".to_string()),
            observe_uuid_tables: false,
        };
        assert!(config.primary_key_policy().is_err());
    }
}
