use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Policy(#[from] pk7_config::InvalidPolicy),

    #[error(transparent)]
    Migration(#[from] pk7::Error),

    #[error(transparent)]
    UnknownType(#[from] pk7::UnknownType),

    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("failed to create connection pool: {0}")]
    CreatePool(#[from] deadpool_postgres::CreatePoolError),

    #[error("failed to get a connection: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("no database URL (pass --database-url or set DATABASE_URL)")]
    MissingDatabaseUrl,
}
