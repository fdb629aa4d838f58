//! Pipeline database access
//!
//! The workflow entry point receives a reference to the pipeline
//! database: a SQLite file, populated by the upstream sample loader,
//! that defines runs and their samples. The engine treats it as
//! read-only; sample filter state is updated by the external filter
//! task, never by the engine itself.
//!
//! Expected schema (owned by the loader):
//!
//! ```sql
//! CREATE TABLE run    (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
//! CREATE TABLE sample (id INTEGER PRIMARY KEY,
//!                      run_id INTEGER NOT NULL REFERENCES run(id),
//!                      name TEXT NOT NULL,
//!                      included INTEGER NOT NULL DEFAULT 1);
//! ```

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Connection to an existing pipeline database
pub struct PipelineDb {
    pool: SqlitePool,
}

impl PipelineDb {
    /// Open an existing pipeline database.
    ///
    /// The file must already exist and be populated; a missing database
    /// is a deployment problem, not something the engine creates on the
    /// fly.
    pub async fn open(db_path: &Path) -> Result<Self> {
        info!("Opening pipeline database at: {}", db_path.display());

        let connection_string = format!("sqlite:{}", db_path.display());
        let options = SqliteConnectOptions::from_str(&connection_string)?
            .create_if_missing(false)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .context("Failed to open pipeline database")?;

        debug!("Pipeline database connection established");
        Ok(Self { pool })
    }

    /// Whether the named run is defined in the database
    pub async fn run_exists(&self, run_name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM run WHERE name = ?1")
            .bind(run_name)
            .fetch_one(&self.pool)
            .await
            .context("Failed to query run table")?;
        Ok(count > 0)
    }

    /// Total number of samples registered for the named run
    pub async fn sample_count(&self, run_name: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sample \
             JOIN run ON sample.run_id = run.id \
             WHERE run.name = ?1",
        )
        .bind(run_name)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count samples")?;
        Ok(count)
    }

    /// Number of samples still included after filtering
    pub async fn included_sample_count(&self, run_name: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sample \
             JOIN run ON sample.run_id = run.id \
             WHERE run.name = ?1 AND sample.included = 1",
        )
        .bind(run_name)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count included samples")?;
        Ok(count)
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }
}
