//! Persistence of completion logs and text snapshots.
//!
//! The SQL store runs on PostgreSQL in deployment and on an embedded SQLite
//! file when no `DATABASE_URL` is configured, through sqlx's `Any` driver.
//! Table and column names follow the schema the front-end deployment already
//! migrated (`completion_log`, `text_snapshot`, quoted `"userId"`).

use crate::models::{CompletionLog, TextSnapshot};
use crate::services::metrics::{db_timer, record_db_error};
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::AnyPool;
use std::time::Duration;
use tracing::{info, instrument};

/// Write side of the completion log store.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Appends one completion record. Called off the response path.
    async fn record_completion(&self, entry: &CompletionLog) -> Result<(), AppError>;

    /// Appends one immutable snapshot.
    async fn record_snapshot(&self, snapshot: &TextSnapshot) -> Result<(), AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

/// SQL flavour behind a connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn from_url(url: &str) -> Result<Self, AppError> {
        if url.starts_with("postgresql://") || url.starts_with("postgres://") {
            Ok(Dialect::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Dialect::Sqlite)
        } else {
            Err(AppError::ConfigError(anyhow::anyhow!(
                "Unsupported database URL scheme (expected postgresql:// or sqlite:)"
            )))
        }
    }

    fn schema(self) -> &'static [&'static str] {
        match self {
            Dialect::Postgres => &[
                r#"CREATE TABLE IF NOT EXISTS completion_log (
                    id SERIAL PRIMARY KEY,
                    "userId" VARCHAR(50) NOT NULL,
                    timestamp TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
                    input_text TEXT NOT NULL,
                    response_text TEXT NOT NULL
                )"#,
                r#"CREATE TABLE IF NOT EXISTS text_snapshot (
                    id SERIAL PRIMARY KEY,
                    "userId" VARCHAR(50) NOT NULL,
                    timestamp TIMESTAMP NOT NULL DEFAULT (NOW() AT TIME ZONE 'utc'),
                    text TEXT NOT NULL
                )"#,
            ],
            Dialect::Sqlite => &[
                r#"CREATE TABLE IF NOT EXISTS completion_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    "userId" VARCHAR(50) NOT NULL,
                    timestamp DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    input_text TEXT NOT NULL,
                    response_text TEXT NOT NULL
                )"#,
                r#"CREATE TABLE IF NOT EXISTS text_snapshot (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    "userId" VARCHAR(50) NOT NULL,
                    timestamp DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    text TEXT NOT NULL
                )"#,
            ],
        }
    }
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct CompletionDb {
    pool: AnyPool,
    dialect: Dialect,
}

impl CompletionDb {
    /// Create a new database connection pool.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        install_default_drivers();
        let dialect = Dialect::from_url(database_url)?;

        info!(?dialect, max_connections, "Connecting to database");

        let mut options = AnyPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30));

        // An in-memory SQLite database lives and dies with its connection.
        if database_url.contains(":memory:") {
            options = options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!(?dialect, "Database connection pool established");

        Ok(Self { pool, dialect })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Creates the two tables when they do not exist yet.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        for statement in self.dialect.schema() {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Schema setup failed: {}", e))
                })?;
        }
        info!("Database schema ready");
        Ok(())
    }
}

#[async_trait]
impl LogStore for CompletionDb {
    #[instrument(skip(self, entry), fields(user_id = %entry.user_id))]
    async fn record_completion(&self, entry: &CompletionLog) -> Result<(), AppError> {
        let _timer = db_timer("record_completion");

        sqlx::query(
            r#"INSERT INTO completion_log ("userId", input_text, response_text) VALUES ($1, $2, $3)"#,
        )
        .bind(entry.user_id.as_str())
        .bind(entry.input_text.as_str())
        .bind(entry.response_text.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            record_db_error("record_completion");
            AppError::DatabaseError(anyhow::anyhow!("Failed to record completion: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self, snapshot), fields(user_id = %snapshot.user_id))]
    async fn record_snapshot(&self, snapshot: &TextSnapshot) -> Result<(), AppError> {
        let _timer = db_timer("record_snapshot");

        sqlx::query(r#"INSERT INTO text_snapshot ("userId", text) VALUES ($1, $2)"#)
            .bind(snapshot.user_id.as_str())
            .bind(snapshot.text.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                record_db_error("record_snapshot");
                AppError::DatabaseError(anyhow::anyhow!("Failed to record snapshot: {}", e))
            })?;

        info!(text_len = snapshot.text.len(), "Snapshot recorded");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
