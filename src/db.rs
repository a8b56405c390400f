pub mod applicationdb;
pub mod chatdb;
pub mod jobdb;
pub mod memory;
pub mod reviewdb;
pub mod userdb;

use sqlx::{Pool, Postgres};
use thiserror::Error;

use applicationdb::ApplicationExt;
use chatdb::ChatExt;
use jobdb::JobExt;
use reviewdb::ReviewExt;
use userdb::UserExt;

const SCHEMA: &str = include_str!("../migrations/20251018000000_init.sql");

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Referenced record does not exist: {0}")]
    MissingReference(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if let Some(db_error) = error.as_database_error() {
            let constraint = db_error.constraint().unwrap_or_default().to_string();
            if db_error.is_unique_violation() {
                return StoreError::UniqueViolation(constraint);
            }
            if db_error.is_foreign_key_violation() {
                return StoreError::MissingReference(constraint);
            }
        }
        StoreError::Database(error)
    }
}

/// Everything the services need from persistence. Implemented by the Postgres
/// client and by the in-memory store.
pub trait Store:
    UserExt + JobExt + ApplicationExt + ChatExt + ReviewExt + std::fmt::Debug + Send + Sync
{
}

impl<T> Store for T where
    T: UserExt + JobExt + ApplicationExt + ChatExt + ReviewExt + std::fmt::Debug + Send + Sync
{
}

#[derive(Clone)]
pub struct DBClient {
    pub pool: Pool<Postgres>,
}

impl std::fmt::Debug for DBClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DBClient")
            .field("pool", &"Pool<Postgres>")
            .finish()
    }
}

impl DBClient {
    pub fn new(pool: Pool<Postgres>) -> Self {
        DBClient { pool }
    }

    /// Applies the bundled schema. Every statement is idempotent.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }
}
