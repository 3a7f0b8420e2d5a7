mod ledger_provider;

use std::ops::Deref;
use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

/// SQLite-backed ledger
#[derive(Clone, Debug)]
pub struct Database(SqlitePool);

impl Database {
    pub async fn connect(path: &Path) -> Result<Self, DatabaseSetupError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(DatabaseSetupError::Unavailable)?;

        let db = Database::new(pool);
        db.migrate().await?;
        Ok(db)
    }

    /// Single-connection in-memory database, for tests
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, DatabaseSetupError> {
        let options = SqliteConnectOptions::new().filename(":memory:");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(DatabaseSetupError::Unavailable)?;

        let db = Database::new(pool);
        db.migrate().await?;
        Ok(db)
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self(pool)
    }

    async fn migrate(&self) -> Result<(), DatabaseSetupError> {
        sqlx::migrate!("./migrations")
            .run(&self.0)
            .await
            .map_err(DatabaseSetupError::MigrationFailed)
    }
}

impl Deref for Database {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseSetupError {
    #[error("error occurred while attempting database migration: {0}")]
    MigrationFailed(sqlx::migrate::MigrateError),

    #[error("unable to perform initial connection and check of the database: {0}")]
    Unavailable(sqlx::Error),
}
