use std::fmt;
use std::panic::Location;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("migration version {version} is registered more than once")]
    DuplicateVersion { version: String },

    #[error(transparent)]
    UnknownType(#[from] pk7_db_schema::UnknownType),
}

/// An error raised inside a migration function, with the source location of
/// the `?` that produced it.
#[derive(Debug)]
pub struct MigrationError {
    pub error: Error,
    pub location: &'static Location<'static>,
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at {}:{}:{})",
            self.error,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )
    }
}

impl std::error::Error for MigrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<E: Into<Error>> From<E> for MigrationError {
    #[track_caller]
    fn from(error: E) -> Self {
        Self {
            error: error.into(),
            location: Location::caller(),
        }
    }
}
