use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::filter::FilterError;

/// Errors from the document store and its connection management
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Duplicate value for unique key {0}")]
    Duplicate(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        let unique_key = err
            .as_database_error()
            .filter(|db| db.is_unique_violation())
            .map(|db| db.constraint().unwrap_or("unknown").to_string());
        match unique_key {
            Some(key) => DatabaseError::Duplicate(key),
            None => DatabaseError::Sqlx(err),
        }
    }
}

/// Opens the single process-wide Postgres pool
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected to document database at {}", Self::redact(url)?);
        Ok(pool)
    }

    /// Connection string safe for logs: credentials are dropped
    pub fn redact(url: &str) -> Result<String, DatabaseError> {
        let mut parsed = url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        parsed.set_password(None).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        parsed.set_username("").map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        parsed.set_query(None);
        Ok(parsed.into())
    }
}
